//! Serial channel errors

use core::fmt;

use embedded_io::ErrorKind;
use wifilink_hal::DriverError;

/// Errors returned by [`SerialChannel`](crate::SerialChannel) operations
///
/// Each variant names the step that failed. Nothing is rolled back, so the
/// channel state after a failure is whatever the preceding steps left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// Channel has not been initialized
    NotInitialized,
    /// Driver bring-up failed
    Initialize(DriverError),
    /// Driver rejected the power state change
    Power(DriverError),
    /// Driver rejected the mode configuration
    Configure(DriverError),
    /// Driver failed to enable the transmitter or receiver
    Enable(DriverError),
    /// Driver failed to arm a receive
    ArmReceive(DriverError),
    /// Driver failed to abort the active receive
    AbortReceive(DriverError),
    /// Driver rejected the transmit
    Send(DriverError),
}

impl SerialError {
    /// Underlying driver error, if any
    pub fn driver_error(&self) -> Option<DriverError> {
        match *self {
            SerialError::NotInitialized => None,
            SerialError::Initialize(e)
            | SerialError::Power(e)
            | SerialError::Configure(e)
            | SerialError::Enable(e)
            | SerialError::ArmReceive(e)
            | SerialError::AbortReceive(e)
            | SerialError::Send(e) => Some(e),
        }
    }
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialError::NotInitialized => f.write_str("serial channel not initialized"),
            SerialError::Initialize(e) => write!(f, "driver initialize failed: {e:?}"),
            SerialError::Power(e) => write!(f, "power control failed: {e:?}"),
            SerialError::Configure(e) => write!(f, "mode configuration failed: {e:?}"),
            SerialError::Enable(e) => write!(f, "tx/rx enable failed: {e:?}"),
            SerialError::ArmReceive(e) => write!(f, "arming receive failed: {e:?}"),
            SerialError::AbortReceive(e) => write!(f, "abort receive failed: {e:?}"),
            SerialError::Send(e) => write!(f, "send failed: {e:?}"),
        }
    }
}

impl embedded_io::Error for SerialError {
    fn kind(&self) -> ErrorKind {
        match self.driver_error() {
            None => ErrorKind::NotConnected,
            Some(DriverError::Timeout) => ErrorKind::TimedOut,
            Some(DriverError::Unsupported) => ErrorKind::Unsupported,
            Some(
                DriverError::Parameter
                | DriverError::Mode
                | DriverError::BaudRate
                | DriverError::DataBits
                | DriverError::Parity
                | DriverError::StopBits
                | DriverError::FlowControl,
            ) => ErrorKind::InvalidInput,
            Some(DriverError::Generic | DriverError::Busy) => ErrorKind::Other,
        }
    }
}
