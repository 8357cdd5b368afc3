//! Serial channel
//!
//! Sits between a [`UsartDriver`] and polling code that cannot run in
//! interrupt context. Receive data lands in a power-of-two ring that the
//! driver fills one full-capacity receive at a time; transmit data goes
//! through a single slot that is busy until the driver reports completion.
//!
//! # Concurrency
//!
//! Two contexts touch the channel: the caller (every method except
//! [`on_event`](SerialChannel::on_event)) and the driver's interrupt path
//! ([`on_event`](SerialChannel::on_event)). Each counter has one writer:
//!
//! | field            | written by                                   |
//! |------------------|----------------------------------------------|
//! | `received_total` | `on_event` (reset by `initialize`/`set_baudrate` after the receive is stopped) |
//! | `read_cursor`    | `read` (reset by `initialize`/`set_baudrate`) |
//! | `tx_busy`        | set by `send`, cleared by `on_event`          |
//!
//! Driver access goes through a blocking mutex, locked once per driver call
//! so interrupts are only held off for the duration of that call. With a
//! critical-section raw mutex the same short sections keep the notification
//! out of the `received_total + rx_count` snapshot, the send/busy-set pair,
//! the re-arm/total-update pair and the abort/counter-reset pair.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use wifilink_hal::{Control, PowerState, UartConfig, UsartDriver, UsartEvents};

use crate::buffer::{SerialBuffers, DEFAULT_RX_CAPACITY, DEFAULT_TX_CAPACITY};
use crate::error::SerialError;
use crate::events::SerialEvents;
use crate::handler::{EventHandler, NoopHandler};

/// Channel lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Not brought up, or torn down
    Uninitialized,
    /// Driver configured and a receive armed
    ///
    /// After a failed [`SerialChannel::set_baudrate`] the channel stays in
    /// this state but may have no receive armed.
    Ready,
}

/// Driver plus the configuration it was last given
struct Link<D> {
    driver: D,
    config: UartConfig,
}

/// Byte-stream transport over one USART
///
/// `RX` and `TX` are the receive ring and transmit slot capacities; `RX`
/// must be a power of two.
///
/// [`on_event`](Self::on_event) locks `M` from interrupt context, so `M`
/// must be usable there: use `CriticalSectionRawMutex`. `ThreadModeRawMutex`
/// panics when locked from an interrupt, and `NoopRawMutex` gives no
/// exclusion against the interrupt at all.
pub struct SerialChannel<
    M,
    D,
    H = NoopHandler,
    const RX: usize = DEFAULT_RX_CAPACITY,
    const TX: usize = DEFAULT_TX_CAPACITY,
> where
    M: RawMutex,
    D: UsartDriver,
    H: EventHandler,
{
    link: Mutex<M, RefCell<Link<D>>>,
    buffers: &'static SerialBuffers<RX, TX>,
    handler: H,
    received_total: AtomicU32,
    read_cursor: AtomicU32,
    tx_busy: AtomicBool,
    ready: AtomicBool,
}

impl<M, D, H, const RX: usize, const TX: usize> SerialChannel<M, D, H, RX, TX>
where
    M: RawMutex,
    D: UsartDriver,
    H: EventHandler,
{
    /// Bind a driver, buffers and event handler
    ///
    /// Nothing is sent to the driver until [`initialize`](Self::initialize).
    pub const fn new(driver: D, buffers: &'static SerialBuffers<RX, TX>, handler: H) -> Self {
        Self {
            link: Mutex::new(RefCell::new(Link {
                driver,
                config: UartConfig {
                    baudrate: wifilink_hal::DEFAULT_BAUDRATE,
                    data_bits: wifilink_hal::DataBits::Eight,
                    parity: wifilink_hal::Parity::None,
                    stop_bits: wifilink_hal::StopBits::One,
                    flow_control: wifilink_hal::FlowControl::None,
                },
            })),
            buffers,
            handler,
            received_total: AtomicU32::new(0),
            read_cursor: AtomicU32::new(0),
            tx_busy: AtomicBool::new(false),
            ready: AtomicBool::new(false),
        }
    }

    /// Bring the driver up and arm the first receive
    ///
    /// Runs driver initialize, full power, 9600-8N1 mode configuration,
    /// TX/RX enable and a full-capacity receive. The first failing step
    /// aborts the sequence; the channel is then uninitialized and this may
    /// be called again.
    pub fn initialize(&self) -> Result<(), SerialError> {
        match self.bring_up() {
            Ok(()) => {
                self.ready.store(true, Ordering::Release);
                #[cfg(feature = "defmt")]
                defmt::debug!("serial: initialized, rx={} tx={}", RX, TX);
                Ok(())
            }
            Err(e) => {
                self.ready.store(false, Ordering::Release);
                #[cfg(feature = "defmt")]
                defmt::warn!("serial: initialize failed: {:?}", e);
                Err(e)
            }
        }
    }

    /// Power the driver down, release it and zero both buffers
    ///
    /// Driver failures are ignored.
    pub fn uninitialize(&self) {
        self.ready.store(false, Ordering::Release);

        if let Err(_e) = self.with_link(|link| link.driver.power_control(PowerState::Off)) {
            #[cfg(feature = "defmt")]
            defmt::warn!("serial: power off failed: {:?}", _e);
        }
        if let Err(_e) = self.with_link(|link| link.driver.uninitialize()) {
            #[cfg(feature = "defmt")]
            defmt::warn!("serial: driver uninitialize failed: {:?}", _e);
        }

        self.buffers.clear();

        #[cfg(feature = "defmt")]
        defmt::debug!("serial: uninitialized");
    }

    /// Switch to a new baud rate
    ///
    /// Aborts the active receive and resets all counters and the busy flag,
    /// even if the abort fails. If the abort succeeded, reconfigures the mode
    /// at `baudrate`, re-enables TX/RX and arms a fresh receive. The first
    /// failing step aborts the sequence; the counters stay reset and no
    /// receive may be armed. Recovering from that (calling this again, or
    /// uninitialize + initialize) is up to the caller.
    pub fn set_baudrate(&self, baudrate: u32) -> Result<(), SerialError> {
        if !self.is_ready() {
            return Err(SerialError::NotInitialized);
        }

        let result = self.reconfigure(baudrate);

        #[cfg(feature = "defmt")]
        match &result {
            Ok(()) => defmt::info!("serial: baudrate set to {}", baudrate),
            Err(e) => defmt::warn!("serial: set baudrate {} failed: {:?}", baudrate, e),
        }

        result
    }

    /// Free space in the transmit slot
    ///
    /// All or nothing: `TX` when idle, 0 while a transmit is in flight.
    pub fn tx_free(&self) -> usize {
        if self.tx_busy.load(Ordering::Acquire) {
            0
        } else {
            TX
        }
    }

    /// Submit up to `TX` bytes of `data` for transmission
    ///
    /// Bytes beyond the slot capacity are dropped; check
    /// [`tx_free`](Self::tx_free) first. Returns the number of bytes
    /// submitted. A send while the slot is busy overwrites the slot the
    /// driver may still be reading from.
    pub fn send(&self, data: &[u8]) -> Result<usize, SerialError> {
        if !self.is_ready() {
            return Err(SerialError::NotInitialized);
        }

        let chunk = self.buffers.fill_tx(data);

        let result = self.link.lock(|link| {
            let submitted = link.borrow_mut().driver.send(chunk);
            self.tx_busy.store(submitted.is_ok(), Ordering::Release);
            submitted
        });

        match result {
            Ok(()) => Ok(chunk.len()),
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("serial: send of {} bytes rejected: {:?}", chunk.len(), e);
                Err(SerialError::Send(e))
            }
        }
    }

    /// Copy unread bytes into `buf`
    ///
    /// Returns how many bytes were copied, which is 0 when nothing is
    /// pending. Never blocks.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        let count = self.rx_count().min(buf.len());

        let mut cursor = self.read_cursor.load(Ordering::Acquire);
        for byte in &mut buf[..count] {
            *byte = self.buffers.rx_byte(cursor);
            cursor = cursor.wrapping_add(1);
        }
        self.read_cursor.store(cursor, Ordering::Release);

        count
    }

    /// Number of unread bytes, without consuming them
    pub fn rx_count(&self) -> usize {
        self.link.lock(|link| {
            let in_flight = link.borrow().driver.rx_count() as u32;
            let produced = self
                .received_total
                .load(Ordering::Acquire)
                .wrapping_add(in_flight);
            produced.wrapping_sub(self.read_cursor.load(Ordering::Acquire)) as usize
        })
    }

    /// Bytes the driver has transmitted from the current or last send
    pub fn tx_count(&self) -> usize {
        self.link.lock(|link| link.borrow().driver.tx_count())
    }

    /// Driver notification entry point
    ///
    /// Call from the driver's interrupt path, never concurrently with itself.
    /// A completed receive is re-armed immediately so the driver always has a
    /// buffer; the forwarded events go to the handler exactly once.
    pub fn on_event(&self, events: UsartEvents) {
        let mut flags = SerialEvents::empty();

        if events.intersects(UsartEvents::RX_TIMEOUT | UsartEvents::RECEIVE_COMPLETE) {
            flags |= SerialEvents::RX_DATA_AVAILABLE;

            if events.contains(UsartEvents::RECEIVE_COMPLETE) {
                let rearmed = self.link.lock(|link| {
                    let rearmed = link.borrow_mut().driver.receive(self.buffers.rx_region());
                    let total = self.received_total.load(Ordering::Relaxed);
                    self.received_total
                        .store(total.wrapping_add(RX as u32), Ordering::Release);
                    rearmed
                });

                if let Err(_e) = rearmed {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("serial: receive re-arm failed: {:?}", _e);
                    flags |= SerialEvents::RX_ERROR;
                }
            }
        }

        if events.contains(UsartEvents::SEND_COMPLETE) {
            flags |= SerialEvents::TX_COMPLETED;
            self.tx_busy.store(false, Ordering::Release);
        }

        self.handler.on_event(flags);
    }

    /// Current lifecycle state
    pub fn state(&self) -> ChannelState {
        if self.is_ready() {
            ChannelState::Ready
        } else {
            ChannelState::Uninitialized
        }
    }

    /// Whether a transmit is in flight
    pub fn is_tx_busy(&self) -> bool {
        self.tx_busy.load(Ordering::Acquire)
    }

    /// Mode configuration last applied to the driver
    pub fn config(&self) -> UartConfig {
        self.link.lock(|link| link.borrow().config)
    }

    /// Event handler this channel forwards to
    pub fn handler(&self) -> &H {
        &self.handler
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn reset_counters(&self) {
        self.received_total.store(0, Ordering::Release);
        self.read_cursor.store(0, Ordering::Release);
        self.tx_busy.store(false, Ordering::Release);
    }

    fn with_link<R>(&self, f: impl FnOnce(&mut Link<D>) -> R) -> R {
        self.link.lock(|link| f(&mut link.borrow_mut()))
    }

    fn bring_up(&self) -> Result<(), SerialError> {
        self.reset_counters();

        self.with_link(|link| link.driver.initialize())
            .map_err(SerialError::Initialize)?;
        self.with_link(|link| link.driver.power_control(PowerState::Full))
            .map_err(SerialError::Power)?;
        self.apply_mode(UartConfig::default())?;
        self.arm_receive()
    }

    fn reconfigure(&self, baudrate: u32) -> Result<(), SerialError> {
        // No receive may complete between the abort and the counter reset
        let aborted = self.with_link(|link| {
            let aborted = link.driver.control(Control::AbortReceive);
            self.reset_counters();
            aborted
        });
        aborted.map_err(SerialError::AbortReceive)?;

        self.apply_mode(self.config().with_baudrate(baudrate))?;
        self.arm_receive()
    }

    fn apply_mode(&self, mode: UartConfig) -> Result<(), SerialError> {
        self.with_link(|link| {
            let configured = link.driver.control(Control::Configure(mode));
            if configured.is_ok() {
                link.config = mode;
            }
            configured
        })
        .map_err(SerialError::Configure)?;
        self.with_link(|link| link.driver.control(Control::EnableTx(true)))
            .map_err(SerialError::Enable)?;
        self.with_link(|link| link.driver.control(Control::EnableRx(true)))
            .map_err(SerialError::Enable)
    }

    fn arm_receive(&self) -> Result<(), SerialError> {
        self.with_link(|link| link.driver.receive(self.buffers.rx_region()))
            .map_err(SerialError::ArmReceive)
    }
}
