//! Event taxonomy delivered by the event-dispatch service.
//!
//! Events are addressed by a class (the ESP-IDF "event base") and a numeric
//! ID within that class. The numeric values follow ESP-IDF's `wifi_event_t`
//! and `ip_event_t` so the device backend can pass IDs through unchanged.

use std::fmt;

/// Wildcard ID: subscribe to every event of a class.
pub const ANY_EVENT_ID: i32 = -1;

/// Event class a callback is subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    /// Radio and connection lifecycle (`WIFI_EVENT`).
    Wifi,
    /// IP lifecycle (`IP_EVENT`).
    Ip,
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wifi => write!(f, "WIFI_EVENT"),
            Self::Ip => write!(f, "IP_EVENT"),
        }
    }
}

/// Radio/connection lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiEvent {
    Ready,
    ScanDone,
    StaStart,
    StaStop,
    StaConnected,
    StaDisconnected,
    StaAuthModeChange,
    /// Any ID the station does not act on.
    Other(i32),
}

impl WifiEvent {
    pub const READY: i32 = 0;
    pub const SCAN_DONE: i32 = 1;
    pub const STA_START: i32 = 2;
    pub const STA_STOP: i32 = 3;
    pub const STA_CONNECTED: i32 = 4;
    pub const STA_DISCONNECTED: i32 = 5;
    pub const STA_AUTHMODE_CHANGE: i32 = 6;

    pub fn from_id(id: i32) -> Self {
        match id {
            Self::READY => Self::Ready,
            Self::SCAN_DONE => Self::ScanDone,
            Self::STA_START => Self::StaStart,
            Self::STA_STOP => Self::StaStop,
            Self::STA_CONNECTED => Self::StaConnected,
            Self::STA_DISCONNECTED => Self::StaDisconnected,
            Self::STA_AUTHMODE_CHANGE => Self::StaAuthModeChange,
            other => Self::Other(other),
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Self::Ready => Self::READY,
            Self::ScanDone => Self::SCAN_DONE,
            Self::StaStart => Self::STA_START,
            Self::StaStop => Self::STA_STOP,
            Self::StaConnected => Self::STA_CONNECTED,
            Self::StaDisconnected => Self::STA_DISCONNECTED,
            Self::StaAuthModeChange => Self::STA_AUTHMODE_CHANGE,
            Self::Other(id) => *id,
        }
    }

    /// Log line for this event.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ready => "WiFi ready",
            Self::ScanDone => "Finished scanning for access points",
            Self::StaStart => "Station started",
            Self::StaStop => "Station stopped",
            Self::StaConnected => "Connected to access point",
            Self::StaDisconnected => "Disconnected from access point",
            Self::StaAuthModeChange => "Auth mode of connected access point changed",
            Self::Other(_) => "Unhandled WiFi event",
        }
    }
}

/// IP lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpEvent {
    StaGotIp,
    StaLostIp,
    GotIp6,
    Other(i32),
}

impl IpEvent {
    pub const STA_GOT_IP: i32 = 0;
    pub const STA_LOST_IP: i32 = 1;
    // 2 is IP_EVENT_AP_STAIPASSIGNED, which only fires in AP mode.
    pub const GOT_IP6: i32 = 3;

    pub fn from_id(id: i32) -> Self {
        match id {
            Self::STA_GOT_IP => Self::StaGotIp,
            Self::STA_LOST_IP => Self::StaLostIp,
            Self::GOT_IP6 => Self::GotIp6,
            other => Self::Other(other),
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Self::StaGotIp => Self::STA_GOT_IP,
            Self::StaLostIp => Self::STA_LOST_IP,
            Self::GotIp6 => Self::GOT_IP6,
            Self::Other(id) => *id,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::StaGotIp => "Station got IP from connected access point",
            Self::StaLostIp => "Station lost IP",
            Self::GotIp6 => "Station interface IPv6 address is preferred",
            Self::Other(_) => "Unhandled IP event",
        }
    }
}

/// A decoded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEvent {
    Wifi(WifiEvent),
    Ip(IpEvent),
}

impl StationEvent {
    pub fn decode(class: EventClass, id: i32) -> Self {
        match class {
            EventClass::Wifi => Self::Wifi(WifiEvent::from_id(id)),
            EventClass::Ip => Self::Ip(IpEvent::from_id(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_ids_match_idf() {
        assert_eq!(WifiEvent::from_id(0), WifiEvent::Ready);
        assert_eq!(WifiEvent::from_id(1), WifiEvent::ScanDone);
        assert_eq!(WifiEvent::from_id(2), WifiEvent::StaStart);
        assert_eq!(WifiEvent::from_id(3), WifiEvent::StaStop);
        assert_eq!(WifiEvent::from_id(4), WifiEvent::StaConnected);
        assert_eq!(WifiEvent::from_id(5), WifiEvent::StaDisconnected);
        assert_eq!(WifiEvent::from_id(6), WifiEvent::StaAuthModeChange);
    }

    #[test]
    fn test_unknown_wifi_id() {
        assert_eq!(WifiEvent::from_id(42), WifiEvent::Other(42));
        assert_eq!(WifiEvent::Other(42).id(), 42);
        assert_eq!(WifiEvent::Other(42).description(), "Unhandled WiFi event");
    }

    #[test]
    fn test_ip_ids_match_idf() {
        assert_eq!(IpEvent::from_id(0), IpEvent::StaGotIp);
        assert_eq!(IpEvent::from_id(1), IpEvent::StaLostIp);
        assert_eq!(IpEvent::from_id(3), IpEvent::GotIp6);
        // AP-mode assignment is not a station event
        assert_eq!(IpEvent::from_id(2), IpEvent::Other(2));
    }

    #[test]
    fn test_decode_by_class() {
        assert_eq!(
            StationEvent::decode(EventClass::Wifi, 5),
            StationEvent::Wifi(WifiEvent::StaDisconnected)
        );
        assert_eq!(
            StationEvent::decode(EventClass::Ip, 0),
            StationEvent::Ip(IpEvent::StaGotIp)
        );
    }

    #[test]
    fn test_decode_keeps_unknown_id() {
        assert_eq!(
            StationEvent::decode(EventClass::Ip, 99),
            StationEvent::Ip(IpEvent::Other(99))
        );
    }

    #[test]
    fn test_class_display() {
        assert_eq!(EventClass::Wifi.to_string(), "WIFI_EVENT");
        assert_eq!(EventClass::Ip.to_string(), "IP_EVENT");
    }
}
