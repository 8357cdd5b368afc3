//! Serial channel for a WiFi co-processor link
//!
//! Byte-stream transport over one USART: a single-slot transmit buffer, a
//! power-of-two receive ring the driver fills from its interrupt path, and
//! non-blocking operations for the polling code above it.
//!
//! # Data flow
//!
//! ```text
//!              send / read / rx_count                 control / send / receive
//! ┌──────────┐ ───────────────────▶ ┌───────────────┐ ─────────────────────▶ ┌─────────────┐
//! │  caller  │                      │ SerialChannel │                        │ UsartDriver │
//! └──────────┘ ◀─────────────────── └───────────────┘ ◀───────────────────── └─────────────┘
//!               EventHandler (SerialEvents)              on_event (UsartEvents, IRQ)
//! ```
//!
//! # Usage
//!
//! The driver keeps `'static` references into the buffers, and its
//! interrupt handler needs to reach the channel, so both usually live in
//! statics:
//!
//! ```ignore
//! static BUFFERS: SerialBuffers = SerialBuffers::new();
//! static ESP_LINK: StaticCell<SerialChannel<CriticalSectionRawMutex, Usart1, EspEvents>> =
//!     StaticCell::new();
//!
//! let link = ESP_LINK.init(SerialChannel::new(usart1, &BUFFERS, EspEvents::new()));
//! link.initialize()?;
//! link.set_baudrate(115_200)?;
//!
//! // USART1 interrupt:
//! link.on_event(events);
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod buffer;
pub mod channel;
pub mod error;
pub mod events;
pub mod handler;

#[cfg(test)]
mod mock;

pub use buffer::{SerialBuffers, DEFAULT_RX_CAPACITY, DEFAULT_TX_CAPACITY};
pub use channel::{ChannelState, SerialChannel};
pub use error::SerialError;
pub use events::SerialEvents;
pub use handler::{EventHandler, NoopHandler, SignalHandler};
