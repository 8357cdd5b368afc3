//! Events forwarded to the application

bitflags::bitflags! {
    /// Events the channel forwards to its [`EventHandler`](crate::EventHandler)
    ///
    /// Any combination may be set in a single notification, including none.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SerialEvents: u32 {
        /// Unread bytes are available
        const RX_DATA_AVAILABLE = 1 << 0;
        /// Re-arming the receive failed; incoming data may be lost
        const RX_ERROR = 1 << 1;
        /// The transmit slot is free again
        const TX_COMPLETED = 1 << 2;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SerialEvents {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "SerialEvents(rx={=bool}, rx_err={=bool}, tx={=bool})",
            self.contains(SerialEvents::RX_DATA_AVAILABLE),
            self.contains(SerialEvents::RX_ERROR),
            self.contains(SerialEvents::TX_COMPLETED),
        );
    }
}
