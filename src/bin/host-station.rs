//! Host-based station demo.
//!
//! Runs the station controller against the simulated platform, replays a
//! typical connection lifecycle and prints the driver calls it produced.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin host-station
//! RUST_LOG=debug cargo run --bin host-station
//! ```

use esp32_wifi_station::station::sim::{sample_ap, SimPlatform};
use esp32_wifi_station::station::{IpEvent, PanicOnFailure, WifiEvent};
use esp32_wifi_station::{StationController, StationOptions};
use log::{error, info};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== Host station starting ===");

    let platform = SimPlatform::new([0x24, 0x0a, 0xc4, 0x5e, 0x11, 0x7a]);
    let station = match StationController::with_credentials(
        platform.clone(),
        b"HomeNetwork",
        b"correct horse battery",
        None,
        StationOptions::default()
            .verbose(true)
            .failure_handler(PanicOnFailure),
    ) {
        Ok(station) => station,
        Err(e) => {
            error!("Station setup failed: {}", e);
            std::process::exit(1);
        }
    };

    info!("Hostname: {}", station.hostname());

    let lifecycle = [
        WifiEvent::Ready,
        WifiEvent::StaStart,
        WifiEvent::StaConnected,
        WifiEvent::StaDisconnected,
        WifiEvent::StaConnected,
    ];

    for event in lifecycle {
        if event == WifiEvent::StaConnected {
            platform.set_associated(Some(sample_ap("HomeNetwork")));
        } else {
            platform.set_associated(None);
        }
        platform.deliver_wifi(event);
        let state = station.link_state();
        info!(
            "After {:?}: {} ({})",
            event,
            state,
            if state.is_connected() { "up" } else { "down" }
        );
    }

    platform.deliver_ip(IpEvent::StaGotIp);
    platform.deliver_ip(IpEvent::GotIp6);

    match station.ap_info() {
        Some(ap) => info!("Associated with {:?} ({} dBm)", ap.ssid, ap.rssi),
        None => info!("Not associated"),
    }

    println!("\nDriver calls:");
    for (i, call) in platform.calls().iter().enumerate() {
        println!("  {:2}. {:?}", i + 1, call);
    }

    if let Err(e) = station.shutdown() {
        error!("Shutdown failed: {}", e);
        std::process::exit(1);
    }
    info!("Station shut down, {} subscriptions left", platform.subscription_count());
}
