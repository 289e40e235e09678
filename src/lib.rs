//! ESP32 WiFi station library.
//!
//! Brings up the radio in station mode, keeps the station connected by
//! reacting to driver events, and reports the associated access point.
//!
//! Everything except the ESP-IDF backend (`esp32` feature) is
//! platform-independent and tested on the host.

pub mod station;

/// `log` target used by every message from this crate.
pub const LOG_TARGET: &str = "wifi_station";

// Re-export commonly used items
pub use station::{
    ApRecord, EventClass, LinkState, StationConfig, StationController, StationError,
    StationOptions,
};

#[cfg(feature = "esp32")]
pub use station::EspStation;
