//! Station hostname resolution.

use crate::LOG_TARGET;
use log::warn;

/// Prefix of hostnames synthesized from the hardware address.
pub const HOSTNAME_PREFIX: &str = "esp32";

/// Format a hostname from the station MAC address.
///
/// The six bytes are written as lowercase hex, two bytes per group:
/// `esp32-0123.4567.89ab`.
pub fn hostname_from_mac(mac: &[u8; 6]) -> String {
    format!(
        "{}-{:02x}{:02x}.{:02x}{:02x}.{:02x}{:02x}",
        HOSTNAME_PREFIX, mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

/// Resolve the hostname the station will announce.
///
/// A supplied name is copied up to its first NUL byte, which the network
/// stack would treat as the end of the string. Otherwise `read_mac` is called
/// once and the name is synthesized from its result.
pub fn resolve_hostname<F>(supplied: Option<&str>, read_mac: F) -> String
where
    F: FnOnce() -> [u8; 6],
{
    match supplied {
        Some(name) => match name.split_once('\0') {
            Some((head, _)) => {
                warn!(target: LOG_TARGET, "Hostname {:?} cut at NUL byte", name);
                head.to_owned()
            }
            None => name.to_owned(),
        },
        None => hostname_from_mac(&read_mac()),
    }
}
