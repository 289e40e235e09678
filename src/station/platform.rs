//! Collaborator services consumed by the station controller.
//!
//! The controller never talks to hardware directly. It drives four services:
//! the radio driver, the network-interface layer, the event-dispatch service
//! and the hardware-address accessor. On the device all four are backed by
//! ESP-IDF (`esp::EspStation`); on the host by
//! [`super::sim::SimPlatform`].
//!
//! Only the first two setup steps (interface creation and driver init) take
//! `&mut self`. Everything after that runs while the event callback may
//! already be firing, so it takes `&self`.

use super::config::{Ssid, StationConfig};
use super::event::EventClass;
use std::fmt;

/// Callback registered with the event-dispatch service.
///
/// Receives the event class and the numeric event ID. Event payloads are not
/// forwarded.
pub type EventCallback = Box<dyn Fn(EventClass, i32) + Send + Sync + 'static>;

/// Radio operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiMode {
    /// Client of an access point.
    Station,
}

/// Which hardware address to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacKind {
    WifiStation,
}

/// Raw status code returned by a driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverError {
    code: i32,
}

impl DriverError {
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver error 0x{:x}", self.code)
    }
}

impl std::error::Error for DriverError {}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for DriverError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::new(e.code())
    }
}

/// Authentication mode reported for an access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    WpaWpa2Psk,
    Wpa2Enterprise,
    Wpa3Psk,
    Wpa2Wpa3Psk,
    WapiPsk,
    Other(u32),
}

impl AuthMode {
    /// Decode ESP-IDF's `wifi_auth_mode_t`.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Open,
            1 => Self::Wep,
            2 => Self::WpaPsk,
            3 => Self::Wpa2Psk,
            4 => Self::WpaWpa2Psk,
            5 => Self::Wpa2Enterprise,
            6 => Self::Wpa3Psk,
            7 => Self::Wpa2Wpa3Psk,
            8 => Self::WapiPsk,
            other => Self::Other(other),
        }
    }
}

/// Snapshot of the access point the station is associated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApRecord {
    pub bssid: [u8; 6],
    pub ssid: Ssid,
    /// Primary channel.
    pub channel: u8,
    /// Signal strength in dBm.
    pub rssi: i8,
    pub auth_mode: AuthMode,
}

/// Radio driver service.
pub trait RadioDriver {
    /// Initialise the driver with default tuning parameters.
    fn init(&mut self) -> Result<(), DriverError>;

    fn set_mode(&self, mode: WifiMode) -> Result<(), DriverError>;

    /// Apply the station configuration to the station interface.
    fn set_config(&self, config: &StationConfig) -> Result<(), DriverError>;

    fn start(&self) -> Result<(), DriverError>;

    /// Request a connection attempt. The outcome arrives later as an event.
    fn connect(&self) -> Result<(), DriverError>;

    /// Record of the currently associated access point.
    fn query_associated_ap(&self) -> Result<ApRecord, DriverError>;
}

/// Network-interface service.
pub trait NetifService {
    /// Handle to a created interface. Owned by the controller.
    type Netif: Send + Sync + 'static;

    /// Create the default station interface. `None` if creation failed.
    fn create_default_station(&mut self) -> Option<Self::Netif>;

    fn set_hostname(&self, netif: &Self::Netif, hostname: &str) -> Result<(), DriverError>;
}

/// Event-dispatch service.
pub trait EventDispatch {
    /// Token returned by `subscribe`, consumed by `unsubscribe`.
    type Subscription: Send + 'static;

    /// Register `callback` for every event ID of `class`.
    fn subscribe(
        &self,
        class: EventClass,
        callback: EventCallback,
    ) -> Result<Self::Subscription, DriverError>;

    fn unsubscribe(&self, subscription: Self::Subscription) -> Result<(), DriverError>;
}

/// Hardware-address accessor.
pub trait MacAddressSource {
    fn read_mac(&self, kind: MacKind) -> [u8; 6];
}

/// Everything the station controller needs from its environment.
pub trait StationPlatform:
    RadioDriver + NetifService + EventDispatch + MacAddressSource + Send + Sync + 'static
{
}

impl<T> StationPlatform for T where
    T: RadioDriver + NetifService + EventDispatch + MacAddressSource + Send + Sync + 'static
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mode_decode() {
        assert_eq!(AuthMode::from_raw(0), AuthMode::Open);
        assert_eq!(AuthMode::from_raw(3), AuthMode::Wpa2Psk);
        assert_eq!(AuthMode::from_raw(7), AuthMode::Wpa2Wpa3Psk);
        assert_eq!(AuthMode::from_raw(200), AuthMode::Other(200));
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::new(0x3001);
        assert_eq!(err.code(), 0x3001);
        assert_eq!(err.to_string(), "driver error 0x3001");
    }
}
