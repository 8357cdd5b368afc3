//! USART peripheral abstractions
//!
//! Describes the peripheral capability a serial channel drives: bring-up,
//! power and mode control, DMA/interrupt driven transfers, progress counters
//! and the event bitmask the peripheral reports from its interrupt path.

use portable_atomic::AtomicU8;

/// Baud rate used until the link is reconfigured
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Errors reported by a USART driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Unspecified failure
    Generic,
    /// Driver is busy with a previous operation
    Busy,
    /// Operation timed out
    Timeout,
    /// Operation or option not supported by this peripheral
    Unsupported,
    /// Invalid parameter
    Parameter,
    /// Requested USART mode is not supported
    Mode,
    /// Requested baud rate cannot be generated
    BaudRate,
    /// Requested number of data bits is not supported
    DataBits,
    /// Requested parity is not supported
    Parity,
    /// Requested number of stop bits is not supported
    StopBits,
    /// Requested flow control is not supported
    FlowControl,
}

/// Peripheral power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Peripheral powered down, interrupts disabled
    Off,
    /// Low-power mode (may still wake on receive)
    Low,
    /// Fully operational
    Full,
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// Hardware flow control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowControl {
    None,
    Rts,
    Cts,
    RtsCts,
}

/// Asynchronous USART mode configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Hardware flow control
    pub flow_control: FlowControl,
}

impl Default for UartConfig {
    /// 9600 baud, 8N1, no flow control
    fn default() -> Self {
        Self {
            baudrate: DEFAULT_BAUDRATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

impl UartConfig {
    /// Same framing, different baud rate
    pub const fn with_baudrate(self, baudrate: u32) -> Self {
        Self { baudrate, ..self }
    }
}

/// Control commands accepted by [`UsartDriver::control`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    /// Switch to asynchronous mode with the given framing and baud rate
    Configure(UartConfig),
    /// Enable or disable the transmitter
    EnableTx(bool),
    /// Enable or disable the receiver
    EnableRx(bool),
    /// Abort the active send operation
    AbortSend,
    /// Abort the active receive operation
    AbortReceive,
}

bitflags::bitflags! {
    /// Events a USART driver reports from its interrupt path
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UsartEvents: u32 {
        /// Send operation completed
        const SEND_COMPLETE = 1 << 0;
        /// Receive operation completed (buffer filled)
        const RECEIVE_COMPLETE = 1 << 1;
        /// Transfer operation completed (synchronous modes)
        const TRANSFER_COMPLETE = 1 << 2;
        /// Transmit shift register empty
        const TX_COMPLETE = 1 << 3;
        /// Transmit data not available
        const TX_UNDERFLOW = 1 << 4;
        /// Receive data overflow
        const RX_OVERFLOW = 1 << 5;
        /// Receive character timeout (line idle with data pending)
        const RX_TIMEOUT = 1 << 6;
        /// Break detected on receive
        const RX_BREAK = 1 << 7;
        /// Framing error detected on receive
        const RX_FRAMING_ERROR = 1 << 8;
        /// Parity error detected on receive
        const RX_PARITY_ERROR = 1 << 9;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for UsartEvents {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "UsartEvents({=u32:#x})", self.bits());
    }
}

/// USART peripheral capability
///
/// Transfers are asynchronous: [`send`](UsartDriver::send) and
/// [`receive`](UsartDriver::receive) only start an operation, and the
/// peripheral keeps the buffer until it reports completion through its
/// interrupt path. Buffers are therefore `'static`, typically placed in a
/// `static` by the application.
///
/// Implementations must not invoke the event path synchronously from inside
/// one of these methods; events are delivered from the interrupt handler.
pub trait UsartDriver {
    /// Bring the driver up (resources, interrupt routing)
    fn initialize(&mut self) -> Result<(), DriverError>;

    /// Release the driver
    fn uninitialize(&mut self) -> Result<(), DriverError>;

    /// Change the peripheral power state
    fn power_control(&mut self, state: PowerState) -> Result<(), DriverError>;

    /// Apply a control command
    fn control(&mut self, control: Control) -> Result<(), DriverError>;

    /// Start transmitting `data`
    fn send(&mut self, data: &'static [AtomicU8]) -> Result<(), DriverError>;

    /// Start receiving into `buf`, completing once `buf.len()` bytes arrived
    fn receive(&mut self, buf: &'static [AtomicU8]) -> Result<(), DriverError>;

    /// Bytes received so far by the active (or most recent) receive
    fn rx_count(&self) -> usize;

    /// Bytes transmitted so far by the active (or most recent) send
    fn tx_count(&self) -> usize;
}
