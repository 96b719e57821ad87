//! Interrupt sources. The same bit layout is used by RIS, MIS, IM and IC.

bitflags! {
    pub struct InterruptFlags: u32 {
        /// Transmit FIFO is empty.
        const TXE = 1 << 0;
        /// Transmit FIFO level is below the TX threshold.
        const TXB = 1 << 1;
        /// Receive FIFO is full.
        const RXF = 1 << 2;
        /// Receive FIFO level is above the RX threshold.
        const RXA = 1 << 3;
        /// Line break, 13 consecutive zeros on the line.
        const BRK = 1 << 4;
        /// Received data equals MATCH.
        const MATCH = 1 << 5;
        /// Framing error, no stop bit where one was expected.
        const FE = 1 << 6;
        /// Parity error.
        const PRE = 1 << 7;
        /// Overrun, data arrived while the RX FIFO was full.
        const OR = 1 << 8;
        /// Receiver timeout.
        const RTO = 1 << 9;

        const LINE_ERRORS = Self::FE.bits | Self::PRE.bits | Self::OR.bits;
    }
}

impl InterruptFlags {
    /// Keeps the defined flags of a raw status word, dropping reserved bits.
    #[inline]
    pub fn from_register(value: u32) -> Self {
        Self::from_bits_truncate(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_positions() {
        assert_eq!(InterruptFlags::TXE.bits(), 0x001);
        assert_eq!(InterruptFlags::TXB.bits(), 0x002);
        assert_eq!(InterruptFlags::RXF.bits(), 0x004);
        assert_eq!(InterruptFlags::RXA.bits(), 0x008);
        assert_eq!(InterruptFlags::RTO.bits(), 0x200);
        assert_eq!(InterruptFlags::all().bits(), 0x3FF);
    }

    #[test]
    fn line_errors_composite() {
        let errors = InterruptFlags::LINE_ERRORS;
        assert!(errors.contains(InterruptFlags::FE | InterruptFlags::PRE | InterruptFlags::OR));
        assert!(!errors.intersects(InterruptFlags::RXA | InterruptFlags::BRK));
    }

    #[test]
    fn reserved_bits_are_dropped() {
        assert_eq!(
            InterruptFlags::from_register(0xFFFF_FC08),
            InterruptFlags::RXA
        );
    }
}
