//! WiFi station bring-up and reconnect handling.
//!
//! # Components
//!
//! - [`config`] - SSID/passphrase fields with explicit truncation (host-testable)
//! - [`hostname`] - hostname derivation from the station MAC (host-testable)
//! - [`event`] / [`state`] - event decoding and the reconnect state machine
//! - [`platform`] - collaborator traits the controller drives
//! - [`controller`] - the station controller itself
//! - [`sim`] - in-memory platform for host builds and tests
//! - `esp` - ESP-IDF platform (ESP32 only)

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod hostname;
pub mod platform;
pub mod sim;
pub mod state;

#[cfg(feature = "esp32")]
pub mod esp;

pub use config::{
    BoundedBytes, ConfigError, Passphrase, PmfConfig, Ssid, StationConfig, MAX_PASSWORD_LEN,
    MAX_SSID_LEN,
};
pub use controller::{StationController, StationOptions};
pub use error::{AbortOnFailure, FailureHandler, PanicOnFailure, SetupStep, StationError};
pub use event::{EventClass, IpEvent, StationEvent, WifiEvent, ANY_EVENT_ID};
pub use hostname::hostname_from_mac;
pub use platform::{ApRecord, AuthMode, DriverError, StationPlatform};
pub use state::LinkState;

#[cfg(feature = "esp32")]
pub use esp::EspStation;
