//! Wifilink Hardware Abstraction Layer
//!
//! This crate defines the peripheral capability the serial channel is built
//! on. Chip-specific HALs implement [`usart::UsartDriver`] for their UART
//! instances, and the same channel code runs on any of them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  WiFi co-processor protocol layer       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  wifilink-serial (channel + buffers)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  wifilink-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  chip USART0  │       │  chip USART1  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`usart::UsartDriver`] - USART peripheral capability

#![no_std]
#![deny(unsafe_code)]

pub mod usart;

// Re-export key types at crate root for convenience
pub use usart::{
    Control, DataBits, DriverError, FlowControl, Parity, PowerState, StopBits, UartConfig,
    UsartDriver, UsartEvents, DEFAULT_BAUDRATE,
};
