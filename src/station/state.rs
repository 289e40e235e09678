//! Station link state machine.
//!
//! Radio events move the station through `Idle -> Starting -> Connected`,
//! and every disconnection sends it straight back to `Starting` with a new
//! connection request. There is no attempt counter and no backoff: a
//! disconnected station always retries.
//!
//! IP events carry no state; they are only logged.

use super::event::WifiEvent;
use std::fmt;

/// Conceptual connection state of the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkState {
    /// Driver up (or stopped), no connection requested.
    Idle = 0,
    /// Connection attempt requested, outcome not yet known.
    Starting = 1,
    /// Associated with an access point.
    Connected = 2,
    /// Association lost. Transient: the reconnect request moves on to `Starting`.
    Disconnected = 3,
}

/// Driver request that a radio event calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationAction {
    /// Apply the hostname to the interface, then request a connection.
    SetHostnameAndConnect,
    /// Request a new connection attempt.
    Reconnect,
}

impl LinkState {
    /// Next state and required action for a radio event.
    pub fn on_wifi_event(self, event: WifiEvent) -> (LinkState, Option<StationAction>) {
        match event {
            WifiEvent::Ready | WifiEvent::ScanDone | WifiEvent::StaStop => (LinkState::Idle, None),
            WifiEvent::StaStart => (
                LinkState::Starting,
                Some(StationAction::SetHostnameAndConnect),
            ),
            WifiEvent::StaConnected => (LinkState::Connected, None),
            WifiEvent::StaDisconnected => (LinkState::Starting, Some(StationAction::Reconnect)),
            WifiEvent::StaAuthModeChange | WifiEvent::Other(_) => (self, None),
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Connected,
            3 => Self::Disconnected,
            _ => Self::Idle,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [LinkState; 4] = [
        LinkState::Idle,
        LinkState::Starting,
        LinkState::Connected,
        LinkState::Disconnected,
    ];

    #[test]
    fn test_start_requests_hostname_and_connect() {
        let (next, action) = LinkState::Idle.on_wifi_event(WifiEvent::StaStart);
        assert_eq!(next, LinkState::Starting);
        assert_eq!(action, Some(StationAction::SetHostnameAndConnect));
    }

    #[test]
    fn test_connected() {
        let (next, action) = LinkState::Starting.on_wifi_event(WifiEvent::StaConnected);
        assert_eq!(next, LinkState::Connected);
        assert_eq!(action, None);
    }

    #[test]
    fn test_disconnect_always_reconnects() {
        for state in ALL_STATES {
            let (next, action) = state.on_wifi_event(WifiEvent::StaDisconnected);
            assert_eq!(next, LinkState::Starting);
            assert_eq!(action, Some(StationAction::Reconnect));
        }
    }

    #[test]
    fn test_repeated_disconnects_keep_retrying() {
        let mut state = LinkState::Connected;
        for _ in 0..100 {
            let (next, action) = state.on_wifi_event(WifiEvent::StaDisconnected);
            assert_eq!(action, Some(StationAction::Reconnect));
            state = next;
        }
    }

    #[test]
    fn test_log_only_events_return_to_idle() {
        for event in [WifiEvent::Ready, WifiEvent::ScanDone, WifiEvent::StaStop] {
            let (next, action) = LinkState::Starting.on_wifi_event(event);
            assert_eq!(next, LinkState::Idle);
            assert_eq!(action, None);
        }
    }

    #[test]
    fn test_auth_mode_change_keeps_state() {
        let (next, action) = LinkState::Connected.on_wifi_event(WifiEvent::StaAuthModeChange);
        assert_eq!(next, LinkState::Connected);
        assert_eq!(action, None);
    }

    #[test]
    fn test_unknown_event_keeps_state() {
        for state in ALL_STATES {
            let (next, action) = state.on_wifi_event(WifiEvent::Other(99));
            assert_eq!(next, state);
            assert_eq!(action, None);
        }
    }

    #[test]
    fn test_u8_round_trip() {
        for state in ALL_STATES {
            assert_eq!(LinkState::from_u8(state as u8), state);
        }
    }
}
