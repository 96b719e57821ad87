//! `embedded-hal` serial traits and `core::fmt::Write`.
//!
//! The non-blocking calls check RIS once and report `WouldBlock` instead of
//! waiting; otherwise they move data exactly like the blocking ones.

use core::fmt;

use embedded_hal::serial::{Read, Write};

use crate::error::Error;
use crate::interrupt::InterruptFlags;
use crate::regs::RegisterIo;
use crate::uart::Uart;
use crate::wait::Wait;

impl<R: RegisterIo, W: Wait> Write<u8> for Uart<R, W> {
    type Error = Error;

    fn try_write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if !self.raw_interrupt_status().contains(InterruptFlags::TXB) {
            return Err(nb::Error::WouldBlock);
        }
        self.transmit(word as u16, InterruptFlags::TXB);
        Ok(())
    }

    fn try_flush(&mut self) -> nb::Result<(), Self::Error> {
        if self.raw_interrupt_status().contains(InterruptFlags::TXE) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<R: RegisterIo, W: Wait> Read<u8> for Uart<R, W> {
    type Error = Error;

    fn try_read(&mut self) -> nb::Result<u8, Self::Error> {
        let status = self.raw_interrupt_status();
        if !status.contains(InterruptFlags::RXA) {
            return Err(nb::Error::WouldBlock);
        }
        self.receive(status)
            .map(|w| w as u8)
            .map_err(nb::Error::Other)
    }
}

impl<R: RegisterIo, W: Wait> fmt::Write for Uart<R, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Uart::write_str(self, s).map_err(|_| fmt::Error)
    }
}
