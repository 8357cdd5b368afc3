//! Scriptable USART driver for host tests
//!
//! Records every command, simulates DMA writes into the armed receive
//! buffer and fails selected commands on request. Clones share state, so a
//! test keeps one handle while the channel owns another.
//!
//! [`SectionCounter`] numbers every locked section so tests can tell which
//! driver commands ran inside the same critical section.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::RawMutex;
use portable_atomic::{AtomicU8, Ordering};
use wifilink_hal::{Control, DriverError, PowerState, UsartDriver, UsartEvents};

use crate::events::SerialEvents;
use crate::handler::EventHandler;

/// Command seen by the mock driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Initialize,
    Uninitialize,
    Power(PowerState),
    Control(Control),
    Send(usize),
    Receive(usize),
}

std::thread_local! {
    static SECTION: Cell<u32> = const { Cell::new(0) };
}

/// Raw mutex that counts the sections it locks on the current thread
pub struct SectionCounter;

#[allow(unsafe_code)]
unsafe impl RawMutex for SectionCounter {
    const INIT: Self = SectionCounter;

    fn lock<R>(&self, f: impl FnOnce() -> R) -> R {
        SECTION.with(|section| section.set(section.get() + 1));
        f()
    }
}

fn current_section() -> u32 {
    SECTION.with(Cell::get)
}

#[derive(Default)]
struct Failures {
    initialize: bool,
    power: bool,
    configure: bool,
    enable: bool,
    abort: bool,
    receive: bool,
    send: bool,
}

#[derive(Default)]
struct MockState {
    commands: Vec<Command>,
    sections: Vec<u32>,
    failures: Failures,
    rx_target: Option<&'static [AtomicU8]>,
    rx_count: usize,
    tx_chunk: Option<&'static [AtomicU8]>,
    tx_count: usize,
}

impl MockState {
    fn record(&mut self, command: Command) {
        self.commands.push(command);
        self.sections.push(current_section());
    }
}

fn fail_if(fail: bool) -> Result<(), DriverError> {
    if fail {
        Err(DriverError::Generic)
    } else {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockUsart {
    state: Rc<RefCell<MockState>>,
}

impl MockUsart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    /// Locked section each recorded command ran in
    pub fn sections(&self) -> Vec<u32> {
        self.state.borrow().sections.clone()
    }

    pub fn clear_commands(&self) {
        let mut state = self.state.borrow_mut();
        state.commands.clear();
        state.sections.clear();
    }

    pub fn fail_initialize(&self, fail: bool) {
        self.state.borrow_mut().failures.initialize = fail;
    }

    pub fn fail_power(&self, fail: bool) {
        self.state.borrow_mut().failures.power = fail;
    }

    pub fn fail_configure(&self, fail: bool) {
        self.state.borrow_mut().failures.configure = fail;
    }

    pub fn fail_enable(&self, fail: bool) {
        self.state.borrow_mut().failures.enable = fail;
    }

    pub fn fail_abort(&self, fail: bool) {
        self.state.borrow_mut().failures.abort = fail;
    }

    pub fn fail_receive(&self, fail: bool) {
        self.state.borrow_mut().failures.receive = fail;
    }

    pub fn fail_send(&self, fail: bool) {
        self.state.borrow_mut().failures.send = fail;
    }

    pub fn set_tx_count(&self, count: usize) {
        self.state.borrow_mut().tx_count = count;
    }

    /// Bytes written by the active receive so far
    pub fn rx_count_now(&self) -> usize {
        self.state.borrow().rx_count
    }

    /// Write bytes into the armed receive buffer as the hardware would
    ///
    /// Stops when the buffer is full. Returns the bytes taken and the event
    /// the driver would raise (RECEIVE_COMPLETE once full, nothing before).
    pub fn deliver(&self, data: &[u8]) -> (usize, UsartEvents) {
        let mut state = self.state.borrow_mut();
        let target = state.rx_target.expect("no receive armed");

        let used = data.len().min(target.len() - state.rx_count);
        for (slot, &byte) in target[state.rx_count..].iter().zip(&data[..used]) {
            slot.store(byte, Ordering::Release);
        }
        state.rx_count += used;

        let events = if state.rx_count == target.len() {
            UsartEvents::RECEIVE_COMPLETE
        } else {
            UsartEvents::empty()
        };
        (used, events)
    }

    /// Contents of the last submitted transmit chunk
    pub fn sent(&self) -> Vec<u8> {
        load_all(self.state.borrow().tx_chunk.unwrap_or(&[]))
    }

    /// Contents of the last armed receive buffer
    pub fn rx_snapshot(&self) -> Vec<u8> {
        load_all(self.state.borrow().rx_target.unwrap_or(&[]))
    }
}

fn load_all(bytes: &[AtomicU8]) -> Vec<u8> {
    bytes.iter().map(|b| b.load(Ordering::Acquire)).collect()
}

impl UsartDriver for MockUsart {
    fn initialize(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.record(Command::Initialize);
        fail_if(state.failures.initialize)
    }

    fn uninitialize(&mut self) -> Result<(), DriverError> {
        self.state.borrow_mut().record(Command::Uninitialize);
        Ok(())
    }

    fn power_control(&mut self, power: PowerState) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.record(Command::Power(power));
        fail_if(state.failures.power)
    }

    fn control(&mut self, control: Control) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.record(Command::Control(control));
        match control {
            Control::Configure(_) => fail_if(state.failures.configure),
            Control::EnableTx(_) | Control::EnableRx(_) => fail_if(state.failures.enable),
            Control::AbortReceive => {
                fail_if(state.failures.abort)?;
                state.rx_target = None;
                state.rx_count = 0;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn send(&mut self, data: &'static [AtomicU8]) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.record(Command::Send(data.len()));
        fail_if(state.failures.send)?;
        state.tx_chunk = Some(data);
        state.tx_count = 0;
        Ok(())
    }

    fn receive(&mut self, buf: &'static [AtomicU8]) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.record(Command::Receive(buf.len()));
        fail_if(state.failures.receive)?;
        state.rx_target = Some(buf);
        state.rx_count = 0;
        Ok(())
    }

    fn rx_count(&self) -> usize {
        self.state.borrow().rx_count
    }

    fn tx_count(&self) -> usize {
        self.state.borrow().tx_count
    }
}

/// Handler that records every forwarded event set
#[derive(Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<SerialEvents>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SerialEvents> {
        self.events.borrow().clone()
    }
}

impl EventHandler for EventLog {
    fn on_event(&self, events: SerialEvents) {
        self.events.borrow_mut().push(events);
    }
}
