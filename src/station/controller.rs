//! Station controller.
//!
//! Brings the radio up in station mode and keeps it connected. Construction
//! performs the whole driver bring-up synchronously; afterwards all behaviour
//! is driven by events delivered to one callback per controller.
//!
//! # Example
//!
//! ```
//! use esp32_wifi_station::station::{sim::SimPlatform, StationController, StationOptions};
//! use esp32_wifi_station::station::{EventClass, LinkState, WifiEvent};
//!
//! let platform = SimPlatform::new([0x24, 0x0a, 0xc4, 0x00, 0x11, 0x22]);
//! let station = StationController::with_credentials(
//!     platform.clone(),
//!     b"MyNetwork",
//!     b"MyPassword",
//!     None,
//!     StationOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(station.hostname(), "esp32-240a.c400.1122");
//!
//! platform.deliver(EventClass::Wifi, WifiEvent::STA_START);
//! assert_eq!(station.link_state(), LinkState::Starting);
//! ```

use super::config::StationConfig;
use super::error::{AbortOnFailure, FailureHandler, SetupStep, StationError};
use super::event::{EventClass, IpEvent, StationEvent, WifiEvent};
use super::hostname::resolve_hostname;
use super::platform::{ApRecord, DriverError, MacKind, StationPlatform, WifiMode};
use super::state::{LinkState, StationAction};
use crate::LOG_TARGET;
use log::{debug, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

/// Runtime options for a [`StationController`].
#[derive(Clone)]
pub struct StationOptions {
    verbose: bool,
    failure_handler: Arc<dyn FailureHandler>,
}

impl StationOptions {
    pub fn new() -> Self {
        Self {
            verbose: false,
            failure_handler: Arc::new(AbortOnFailure),
        }
    }

    /// Log every lifecycle event at `info` level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replace the default abort-on-failure policy.
    pub fn failure_handler(mut self, handler: impl FailureHandler + 'static) -> Self {
        self.failure_handler = Arc::new(handler);
        self
    }
}

impl Default for StationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationOptions")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

fn failed_at(step: SetupStep) -> impl FnOnce(DriverError) -> StationError {
    move |source| StationError::Setup { step, source }
}

/// State shared between the controller and its event callback.
///
/// `netif` is declared before `platform` so the interface is destroyed while
/// the driver is still initialised.
struct Shared<P: StationPlatform> {
    netif: P::Netif,
    platform: P,
    hostname: String,
    verbose: bool,
    state: AtomicU8,
    failure_handler: Arc<dyn FailureHandler>,
}

impl<P: StationPlatform> Shared<P> {
    fn log_event(&self, args: fmt::Arguments<'_>) {
        if self.verbose {
            info!(target: LOG_TARGET, "{}", args);
        }
    }

    fn link_state(&self) -> LinkState {
        LinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_link_state(&self, state: LinkState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn handle_event(&self, class: EventClass, id: i32) {
        match StationEvent::decode(class, id) {
            StationEvent::Wifi(event) => self.handle_wifi_event(event),
            StationEvent::Ip(event) => self.handle_ip_event(event),
        }
    }

    fn handle_wifi_event(&self, event: WifiEvent) {
        match event {
            WifiEvent::Other(id) => {
                self.log_event(format_args!("{} (id {})", event.description(), id))
            }
            _ => self.log_event(format_args!("{}", event.description())),
        }

        let (next, action) = self.link_state().on_wifi_event(event);

        match action {
            Some(StationAction::SetHostnameAndConnect) => {
                self.set_link_state(next);
                if let Err(e) = self.platform.set_hostname(&self.netif, &self.hostname) {
                    self.failure_handler.fatal(&StationError::Hostname(e));
                }
                self.request_connect();
            }
            Some(StationAction::Reconnect) => {
                self.set_link_state(LinkState::Disconnected);
                self.request_connect();
                self.set_link_state(next);
            }
            None => self.set_link_state(next),
        }
    }

    fn handle_ip_event(&self, event: IpEvent) {
        match event {
            // Always logged, independent of the verbose flag.
            IpEvent::GotIp6 => info!(target: LOG_TARGET, "{}", event.description()),
            IpEvent::Other(id) => {
                self.log_event(format_args!("{} (id {})", event.description(), id))
            }
            _ => self.log_event(format_args!("{}", event.description())),
        }
    }

    fn request_connect(&self) {
        // Outcome is reported later as a connected or disconnected event.
        if let Err(e) = self.platform.connect() {
            warn!(target: LOG_TARGET, "Connection request failed: {}", e);
        }
    }
}

/// WiFi station controller.
///
/// Owns the station network interface and the hostname, and holds one
/// subscription for each event class. Dropping the controller unsubscribes
/// both; a failure there is passed to the configured [`FailureHandler`].
pub struct StationController<P: StationPlatform> {
    shared: Arc<Shared<P>>,
    /// WiFi and IP subscriptions. Both present until teardown.
    subscriptions: Option<(P::Subscription, P::Subscription)>,
}

impl<P: StationPlatform> StationController<P> {
    /// Bring up a station from raw credentials.
    ///
    /// SSID and passphrase longer than the driver fields are truncated. The
    /// hostname defaults to one derived from the station MAC address.
    pub fn with_credentials(
        platform: P,
        ssid: &[u8],
        passphrase: &[u8],
        hostname: Option<&str>,
        options: StationOptions,
    ) -> Result<Self, StationError> {
        let config = StationConfig::from_credentials(ssid, passphrase);
        Self::setup(platform, config, hostname, options)
    }

    /// Bring up a station from a prepared configuration.
    pub fn with_config(
        platform: P,
        config: StationConfig,
        hostname: Option<&str>,
        options: StationOptions,
    ) -> Result<Self, StationError> {
        Self::setup(platform, config, hostname, options)
    }

    /// Like [`with_credentials`](Self::with_credentials), passing any error to
    /// the options' failure handler (abort by default).
    pub fn with_credentials_or_fatal(
        platform: P,
        ssid: &[u8],
        passphrase: &[u8],
        hostname: Option<&str>,
        options: StationOptions,
    ) -> Self {
        let handler = options.failure_handler.clone();
        Self::with_credentials(platform, ssid, passphrase, hostname, options)
            .unwrap_or_else(|e| handler.fatal(&e))
    }

    /// Like [`with_config`](Self::with_config), passing any error to the
    /// options' failure handler (abort by default).
    pub fn with_config_or_fatal(
        platform: P,
        config: StationConfig,
        hostname: Option<&str>,
        options: StationOptions,
    ) -> Self {
        let handler = options.failure_handler.clone();
        Self::with_config(platform, config, hostname, options)
            .unwrap_or_else(|e| handler.fatal(&e))
    }

    fn setup(
        mut platform: P,
        config: StationConfig,
        hostname: Option<&str>,
        options: StationOptions,
    ) -> Result<Self, StationError> {
        let hostname = resolve_hostname(hostname, || platform.read_mac(MacKind::WifiStation));

        let netif = platform
            .create_default_station()
            .ok_or(StationError::NetifUnavailable)?;

        platform.init().map_err(failed_at(SetupStep::InitDriver))?;

        let shared = Arc::new(Shared {
            netif,
            platform,
            hostname,
            verbose: options.verbose,
            state: AtomicU8::new(LinkState::Idle as u8),
            failure_handler: options.failure_handler,
        });

        let wifi = Self::subscribe(&shared, EventClass::Wifi)?;
        let ip = match Self::subscribe(&shared, EventClass::Ip) {
            Ok(ip) => ip,
            Err(e) => {
                Self::rollback(&shared, [(EventClass::Wifi, wifi)]);
                return Err(e);
            }
        };

        if let Err(e) = Self::configure_and_start(&shared.platform, &config) {
            Self::rollback(&shared, [(EventClass::Wifi, wifi), (EventClass::Ip, ip)]);
            return Err(e);
        }

        debug!(
            target: LOG_TARGET,
            "Station started for SSID {:?} as {}", config.ssid(), shared.hostname
        );

        Ok(Self {
            shared,
            subscriptions: Some((wifi, ip)),
        })
    }

    fn subscribe(
        shared: &Arc<Shared<P>>,
        class: EventClass,
    ) -> Result<P::Subscription, StationError> {
        let weak: Weak<Shared<P>> = Arc::downgrade(shared);
        let callback = Box::new(move |class: EventClass, id: i32| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_event(class, id);
            }
        });

        shared
            .platform
            .subscribe(class, callback)
            .map_err(failed_at(SetupStep::Subscribe(class)))
    }

    fn configure_and_start(platform: &P, config: &StationConfig) -> Result<(), StationError> {
        platform
            .set_mode(WifiMode::Station)
            .map_err(failed_at(SetupStep::SetMode))?;
        platform
            .set_config(config)
            .map_err(failed_at(SetupStep::SetConfig))?;
        platform.start().map_err(failed_at(SetupStep::Start))?;
        Ok(())
    }

    /// Undo subscriptions made by a setup that failed part-way.
    ///
    /// A registration that cannot be removed leaves the dispatch table in an
    /// unknown state, so it goes to the failure handler like at teardown.
    fn rollback<const N: usize>(
        shared: &Shared<P>,
        subscriptions: [(EventClass, P::Subscription); N],
    ) {
        for (class, subscription) in subscriptions {
            if let Err(source) = shared.platform.unsubscribe(subscription) {
                shared
                    .failure_handler
                    .fatal(&StationError::Unsubscribe { class, source });
            }
        }
    }

    /// Record of the access point the station is associated with.
    ///
    /// Returns `None` when the driver cannot report one, which is the case
    /// whenever the station is not associated. Query errors are logged, not
    /// returned.
    pub fn ap_info(&self) -> Option<ApRecord> {
        match self.shared.platform.query_associated_ap() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(target: LOG_TARGET, "Failed to query associated AP: {}", e);
                None
            }
        }
    }

    /// The station network interface. Stays owned by the controller.
    pub fn netif(&self) -> &P::Netif {
        &self.shared.netif
    }

    pub fn hostname(&self) -> &str {
        &self.shared.hostname
    }

    pub fn is_verbose(&self) -> bool {
        self.shared.verbose
    }

    /// Current position in the connect/reconnect cycle.
    pub fn link_state(&self) -> LinkState {
        self.shared.link_state()
    }

    /// Unsubscribe from both event classes and report failures to the caller
    /// instead of the failure handler.
    ///
    /// Both unsubscriptions are attempted; the first error is returned.
    pub fn shutdown(mut self) -> Result<(), StationError> {
        match self.subscriptions.take() {
            Some((wifi, ip)) => {
                let wifi = self.unsubscribe(EventClass::Wifi, wifi);
                let ip = self.unsubscribe(EventClass::Ip, ip);
                wifi.and(ip)
            }
            None => Ok(()),
        }
    }

    fn unsubscribe(
        &self,
        class: EventClass,
        subscription: P::Subscription,
    ) -> Result<(), StationError> {
        self.shared
            .platform
            .unsubscribe(subscription)
            .map_err(|source| StationError::Unsubscribe { class, source })
    }
}

impl<P: StationPlatform> Drop for StationController<P> {
    fn drop(&mut self) {
        if let Some((wifi, ip)) = self.subscriptions.take() {
            for (class, subscription) in [(EventClass::Wifi, wifi), (EventClass::Ip, ip)] {
                if let Err(e) = self.unsubscribe(class, subscription) {
                    self.shared.failure_handler.fatal(&e);
                }
            }
        }
    }
}

impl<P: StationPlatform> fmt::Debug for StationController<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationController")
            .field("hostname", &self.shared.hostname)
            .field("verbose", &self.shared.verbose)
            .field("link_state", &self.link_state())
            .field("subscribed", &self.subscriptions.is_some())
            .finish()
    }
}
