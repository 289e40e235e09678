//! ESP32 WiFi station firmware.
//!
//! Credentials are baked in at compile time:
//!
//! ```bash
//! WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret" \
//!     cargo espflash flash --bin station --features esp32 --release --monitor
//! ```
//!
//! `WIFI_HOSTNAME` optionally overrides the MAC-derived hostname and
//! `WIFI_VERBOSE=1` logs every lifecycle event.

/// WiFi SSID - set via WIFI_SSID environment variable at compile time.
#[cfg(feature = "esp32")]
const WIFI_SSID: Option<&str> = option_env!("WIFI_SSID");

/// WiFi password - set via WIFI_PASSWORD environment variable at compile time.
/// Empty string for open networks.
#[cfg(feature = "esp32")]
const WIFI_PASSWORD: Option<&str> = option_env!("WIFI_PASSWORD");

#[cfg(feature = "esp32")]
const WIFI_HOSTNAME: Option<&str> = option_env!("WIFI_HOSTNAME");

#[cfg(feature = "esp32")]
const WIFI_VERBOSE: Option<&str> = option_env!("WIFI_VERBOSE");

/// How often the associated AP is logged.
#[cfg(feature = "esp32")]
const STATUS_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);

#[cfg(feature = "esp32")]
fn main() {
    use esp32_wifi_station::{EspStation, StationController, StationOptions};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{error, info};

    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== WiFi station starting ===");

    let ssid = match WIFI_SSID {
        Some(s) if !s.is_empty() => s,
        _ => {
            error!("WIFI_SSID was not set at compile time");
            return;
        }
    };
    let password = WIFI_PASSWORD.unwrap_or("");
    let hostname = WIFI_HOSTNAME.filter(|h| !h.is_empty());
    let verbose = matches!(WIFI_VERBOSE, Some("1") | Some("true"));

    let platform = match (|| -> Result<EspStation, Box<dyn std::error::Error>> {
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take().ok();
        Ok(EspStation::new(peripherals.modem, sysloop, nvs)?)
    })() {
        Ok(platform) => platform,
        Err(e) => {
            error!("Failed to acquire WiFi peripherals: {}", e);
            return;
        }
    };

    let station = StationController::with_credentials_or_fatal(
        platform,
        ssid.as_bytes(),
        password.as_bytes(),
        hostname,
        StationOptions::default().verbose(verbose),
    );

    info!("Station {} configured for {:?}", station.hostname(), ssid);

    loop {
        std::thread::sleep(STATUS_INTERVAL);
        let state = station.link_state();
        if !state.is_connected() {
            info!("Not associated ({})", state);
            continue;
        }
        match station.ap_info() {
            Some(ap) => info!(
                "Associated with {:?} on channel {} ({} dBm)",
                ap.ssid, ap.channel, ap.rssi
            ),
            None => info!("Connected, AP record unavailable"),
        }
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo run --bin host-station' for a simulated station on the host.");
}
