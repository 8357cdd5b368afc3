//! Receive ring and transmit slot storage
//!
//! The USART driver keeps `'static` references into these buffers while a
//! transfer is active, so the pair is meant to live in a `static`:
//!
//! ```
//! use wifilink_serial::SerialBuffers;
//!
//! static BUFFERS: SerialBuffers = SerialBuffers::new();
//! assert_eq!(BUFFERS.rx_region().len(), 512);
//! ```
//!
//! The receive capacity must be a power of two; anything else fails to
//! build:
//!
//! ```compile_fail
//! use wifilink_serial::SerialBuffers;
//!
//! static BUFFERS: SerialBuffers<500, 64> = SerialBuffers::new();
//! ```

use portable_atomic::{AtomicU8, Ordering};

/// Default receive ring capacity in bytes
pub const DEFAULT_RX_CAPACITY: usize = 512;

/// Default transmit slot capacity in bytes
pub const DEFAULT_TX_CAPACITY: usize = 512;

/// Receive ring and transmit slot for one serial channel
///
/// Bytes are stored as atomics because the peripheral (DMA or interrupt
/// handler) and the caller access the same memory concurrently.
pub struct SerialBuffers<
    const RX: usize = DEFAULT_RX_CAPACITY,
    const TX: usize = DEFAULT_TX_CAPACITY,
> {
    rx: [AtomicU8; RX],
    tx: [AtomicU8; TX],
}

impl<const RX: usize, const TX: usize> Default for SerialBuffers<RX, TX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const RX: usize, const TX: usize> SerialBuffers<RX, TX> {
    /// Ring index mask
    pub const RX_MASK: usize = RX - 1;

    const CAPACITY_CHECK: () = {
        assert!(RX.is_power_of_two(), "receive capacity must be a power of two");
        assert!(RX <= u32::MAX as usize, "receive capacity must fit the u32 counters");
        assert!(TX > 0, "transmit capacity must be non-zero");
    };

    /// Create zeroed buffers
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;

        Self {
            rx: [const { AtomicU8::new(0) }; RX],
            tx: [const { AtomicU8::new(0) }; TX],
        }
    }

    /// Receive capacity in bytes
    pub const fn rx_capacity(&self) -> usize {
        RX
    }

    /// Transmit capacity in bytes
    pub const fn tx_capacity(&self) -> usize {
        TX
    }

    /// Whole receive region, handed to the driver when arming a receive
    pub fn rx_region(&'static self) -> &'static [AtomicU8] {
        &self.rx
    }

    /// Read the ring byte at logical position `cursor`
    pub fn rx_byte(&self, cursor: u32) -> u8 {
        self.rx[cursor as usize & Self::RX_MASK].load(Ordering::Acquire)
    }

    /// Copy `data` into the transmit slot and return the filled prefix
    ///
    /// At most `TX` bytes are copied; the rest of `data` is ignored.
    pub fn fill_tx(&'static self, data: &[u8]) -> &'static [AtomicU8] {
        let len = data.len().min(TX);
        for (slot, &byte) in self.tx.iter().zip(&data[..len]) {
            slot.store(byte, Ordering::Relaxed);
        }
        portable_atomic::fence(Ordering::Release);
        &self.tx[..len]
    }

    /// Zero both buffers
    pub fn clear(&self) {
        for byte in self.rx.iter().chain(self.tx.iter()) {
            byte.store(0, Ordering::Relaxed);
        }
    }
}
