//! ESP-IDF backend for the station collaborators.
//!
//! Driver initialisation goes through `esp-idf-svc`'s [`WifiDriver`], which
//! applies the default `wifi_init_config_t`. Everything the controller drives
//! afterwards maps one-to-one onto the C API: the station interface comes
//! from `esp_netif_create_default_wifi_sta`, and event callbacks are
//! registered with `esp_event_handler_instance_register` on the default loop.

use super::config::{Ssid, StationConfig};
use super::event::{EventClass, ANY_EVENT_ID};
use super::platform::{
    ApRecord, AuthMode, DriverError, EventCallback, EventDispatch, MacAddressSource, MacKind,
    NetifService, RadioDriver, WifiMode,
};
use crate::LOG_TARGET;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::WifiDriver;
use esp_idf_sys::{self as sys, esp};
use log::warn;
use std::ffi::{c_void, CString};
use std::ptr::NonNull;
use std::sync::{Mutex, PoisonError};
use zeroize::Zeroize;

/// Station network interface created by `esp_netif_create_default_wifi_sta`.
///
/// Destroyed with `esp_netif_destroy_default_wifi` on drop.
pub struct EspNetifHandle(NonNull<sys::esp_netif_t>);

// The handle is only dereferenced by ESP-IDF, which locks internally.
unsafe impl Send for EspNetifHandle {}
unsafe impl Sync for EspNetifHandle {}

impl EspNetifHandle {
    pub fn as_ptr(&self) -> *mut sys::esp_netif_t {
        self.0.as_ptr()
    }
}

impl Drop for EspNetifHandle {
    fn drop(&mut self) {
        unsafe { sys::esp_netif_destroy_default_wifi(self.0.as_ptr() as *mut c_void) };
    }
}

/// Context pointer handed to the event loop for one subscription.
struct Registration {
    class: EventClass,
    callback: EventCallback,
}

/// Handler instance registered on the default event loop.
pub struct EspSubscription {
    class: EventClass,
    instance: sys::esp_event_handler_instance_t,
    registration: NonNull<Registration>,
}

// The instance is an opaque token and the registration is only read by the
// event loop task until `unsubscribe` reclaims it.
unsafe impl Send for EspSubscription {}

unsafe extern "C" fn dispatch_event(
    arg: *mut c_void,
    _base: sys::esp_event_base_t,
    id: i32,
    _data: *mut c_void,
) {
    // SAFETY: `arg` is the `Registration` leaked in `subscribe`, kept alive
    // until the handler is unregistered.
    let registration = unsafe { &*(arg as *const Registration) };
    (registration.callback)(registration.class, id);
}

fn event_base(class: EventClass) -> sys::esp_event_base_t {
    unsafe {
        match class {
            EventClass::Wifi => sys::WIFI_EVENT,
            EventClass::Ip => sys::IP_EVENT,
        }
    }
}

/// Peripherals consumed by driver initialisation.
struct DriverParts {
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: Option<EspDefaultNvsPartition>,
}

/// ESP-IDF implementation of every station collaborator.
///
/// The modem is `Send` but not `Sync`, so it and the driver built from it
/// only live behind a `Mutex`.
pub struct EspStation {
    parts: Mutex<Option<DriverParts>>,
    /// Owns the initialised radio; dropping it deinitialises the driver.
    _driver: Mutex<Option<WifiDriver<'static>>>,
}

impl EspStation {
    /// Prepare the backend. The radio is not touched until the controller
    /// runs its setup.
    ///
    /// `nvs` lets the driver keep calibration data across reboots.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, DriverError> {
        esp!(unsafe { sys::esp_netif_init() })?;
        Ok(Self {
            parts: Mutex::new(Some(DriverParts {
                modem,
                sysloop,
                nvs,
            })),
            _driver: Mutex::new(None),
        })
    }
}

impl RadioDriver for EspStation {
    fn init(&mut self) -> Result<(), DriverError> {
        let parts = self
            .parts
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(DriverError::new(sys::ESP_ERR_INVALID_STATE as i32))?;
        let driver = WifiDriver::new(parts.modem, parts.sysloop, parts.nvs)?;
        *self._driver.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(driver);
        Ok(())
    }

    fn set_mode(&self, mode: WifiMode) -> Result<(), DriverError> {
        let raw = match mode {
            WifiMode::Station => sys::wifi_mode_t_WIFI_MODE_STA,
        };
        esp!(unsafe { sys::esp_wifi_set_mode(raw) })?;
        Ok(())
    }

    fn set_config(&self, config: &StationConfig) -> Result<(), DriverError> {
        // SAFETY: wifi_config_t is plain C data; all-zero is its documented
        // "unset" state.
        let mut raw: sys::wifi_config_t = unsafe { core::mem::zeroed() };
        let sta = unsafe { &mut raw.sta };

        sta.ssid.copy_from_slice(config.ssid().as_padded());
        sta.password.copy_from_slice(config.passphrase().as_padded());
        if let Some(bssid) = config.bssid() {
            sta.bssid_set = true;
            sta.bssid = bssid;
        }
        sta.channel = config.channel();
        sta.pmf_cfg.capable = config.pmf().capable;
        sta.pmf_cfg.required = config.pmf().required;

        let result = esp!(unsafe {
            sys::esp_wifi_set_config(sys::wifi_interface_t_WIFI_IF_STA, &mut raw)
        });
        unsafe { raw.sta.password.zeroize() };
        result?;
        Ok(())
    }

    fn start(&self) -> Result<(), DriverError> {
        esp!(unsafe { sys::esp_wifi_start() })?;
        Ok(())
    }

    fn connect(&self) -> Result<(), DriverError> {
        esp!(unsafe { sys::esp_wifi_connect() })?;
        Ok(())
    }

    fn query_associated_ap(&self) -> Result<ApRecord, DriverError> {
        let mut info: sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
        esp!(unsafe { sys::esp_wifi_sta_get_ap_info(&mut info) })?;

        let ssid_len = info
            .ssid
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(info.ssid.len());

        Ok(ApRecord {
            bssid: info.bssid,
            ssid: Ssid::from_truncating(&info.ssid[..ssid_len]),
            channel: info.primary,
            rssi: info.rssi,
            auth_mode: AuthMode::from_raw(info.authmode as u32),
        })
    }
}

impl NetifService for EspStation {
    type Netif = EspNetifHandle;

    fn create_default_station(&mut self) -> Option<EspNetifHandle> {
        let netif = unsafe { sys::esp_netif_create_default_wifi_sta() };
        NonNull::new(netif).map(EspNetifHandle)
    }

    fn set_hostname(&self, netif: &EspNetifHandle, hostname: &str) -> Result<(), DriverError> {
        let hostname = CString::new(hostname)
            .map_err(|_| DriverError::new(sys::ESP_ERR_INVALID_ARG as i32))?;
        esp!(unsafe { sys::esp_netif_set_hostname(netif.as_ptr(), hostname.as_ptr()) })?;
        Ok(())
    }
}

impl EventDispatch for EspStation {
    type Subscription = EspSubscription;

    fn subscribe(
        &self,
        class: EventClass,
        callback: EventCallback,
    ) -> Result<EspSubscription, DriverError> {
        let registration = NonNull::from(Box::leak(Box::new(Registration { class, callback })));
        let mut instance: sys::esp_event_handler_instance_t = core::ptr::null_mut();

        let result = esp!(unsafe {
            sys::esp_event_handler_instance_register(
                event_base(class),
                ANY_EVENT_ID,
                Some(dispatch_event),
                registration.as_ptr() as *mut c_void,
                &mut instance,
            )
        });

        if let Err(e) = result {
            // SAFETY: registration failed, so the event loop never saw the pointer.
            drop(unsafe { Box::from_raw(registration.as_ptr()) });
            return Err(e.into());
        }

        Ok(EspSubscription {
            class,
            instance,
            registration,
        })
    }

    fn unsubscribe(&self, subscription: EspSubscription) -> Result<(), DriverError> {
        esp!(unsafe {
            sys::esp_event_handler_instance_unregister(
                event_base(subscription.class),
                ANY_EVENT_ID,
                subscription.instance,
            )
        })?;

        // SAFETY: the handler is unregistered, nothing else references it.
        drop(unsafe { Box::from_raw(subscription.registration.as_ptr()) });
        Ok(())
    }
}

impl MacAddressSource for EspStation {
    fn read_mac(&self, kind: MacKind) -> [u8; 6] {
        let raw = match kind {
            MacKind::WifiStation => sys::esp_mac_type_t_ESP_MAC_WIFI_STA,
        };
        let mut mac = [0u8; 6];
        if let Err(e) = esp!(unsafe { sys::esp_read_mac(mac.as_mut_ptr(), raw) }) {
            warn!(target: LOG_TARGET, "Failed to read MAC address: {:?}", e);
        }
        mac
    }
}
