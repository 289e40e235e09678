//! Station errors and the fatal-failure policy.
//!
//! Setup and teardown failures leave the station with no coherent state to
//! fall back to. They are reported as [`StationError`] and handed to a
//! [`FailureHandler`]. The default handler, [`AbortOnFailure`], logs the error
//! and aborts so the device restarts.

use super::event::EventClass;
use super::platform::DriverError;
use log::error;
use std::fmt;

/// Setup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    InitDriver,
    Subscribe(EventClass),
    SetMode,
    SetConfig,
    Start,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitDriver => write!(f, "driver init"),
            Self::Subscribe(class) => write!(f, "subscribe to {}", class),
            Self::SetMode => write!(f, "set station mode"),
            Self::SetConfig => write!(f, "set station config"),
            Self::Start => write!(f, "driver start"),
        }
    }
}

/// Errors raised by the station controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationError {
    /// The default station network interface could not be created.
    NetifUnavailable,
    /// A driver call during setup failed.
    Setup { step: SetupStep, source: DriverError },
    /// Setting the interface hostname on station start failed.
    Hostname(DriverError),
    /// Unregistering an event callback at teardown failed.
    Unsubscribe {
        class: EventClass,
        source: DriverError,
    },
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetifUnavailable => write!(f, "failed to create station network interface"),
            Self::Setup { step, source } => write!(f, "{} failed: {}", step, source),
            Self::Hostname(e) => write!(f, "failed to set hostname: {}", e),
            Self::Unsubscribe { class, source } => {
                write!(f, "failed to unsubscribe from {}: {}", class, source)
            }
        }
    }
}

impl std::error::Error for StationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NetifUnavailable => None,
            Self::Setup { source, .. } | Self::Unsubscribe { source, .. } => Some(source),
            Self::Hostname(e) => Some(e),
        }
    }
}

/// Policy applied to unrecoverable station errors.
pub trait FailureHandler: Send + Sync {
    fn fatal(&self, error: &StationError) -> !;
}

/// Log the error and abort the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnFailure;

impl FailureHandler for AbortOnFailure {
    fn fatal(&self, err: &StationError) -> ! {
        error!(target: crate::LOG_TARGET, "Fatal station error: {}", err);
        std::process::abort();
    }
}

/// Panic with the error. Unwinds instead of aborting, which suits host
/// applications and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicOnFailure;

impl FailureHandler for PanicOnFailure {
    fn fatal(&self, err: &StationError) -> ! {
        panic!("fatal station error: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_setup_error_display() {
        let err = StationError::Setup {
            step: SetupStep::Subscribe(EventClass::Ip),
            source: DriverError::new(0x102),
        };
        assert_eq!(
            err.to_string(),
            "subscribe to IP_EVENT failed: driver error 0x102"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_netif_error_has_no_source() {
        assert!(StationError::NetifUnavailable.source().is_none());
    }

    #[test]
    #[should_panic(expected = "fatal station error: failed to set hostname")]
    fn test_panic_handler_panics() {
        PanicOnFailure.fatal(&StationError::Hostname(DriverError::new(1)));
    }
}
