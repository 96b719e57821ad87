use core::fmt;

use crate::interrupt::InterruptFlags;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The wait strategy gave up before the flag was raised.
    Timeout { waiting_for: InterruptFlags },
    /// Framing, parity or overrun reported alongside received data. `word`
    /// is what RXDATA held; after an overrun alone it is usually intact.
    LineError { flags: InterruptFlags, word: u16 },
    /// Value does not fit the width of a register field.
    FieldOverflow { field: &'static str, value: u32 },
    /// No prescaler brings `clock_hz` within tolerance of `baud`.
    InvalidBaudRate { clock_hz: u32, baud: u32 },
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Timeout { waiting_for } => {
                write!(f, "timed out waiting for {:?}", waiting_for)
            }
            Error::LineError { flags, word } => {
                write!(f, "line error {:?} on word {:#x}", flags, word)
            }
            Error::FieldOverflow { field, value } => {
                write!(f, "value {:#x} does not fit field {}", value, field)
            }
            Error::InvalidBaudRate { clock_hz, baud } => {
                write!(f, "cannot derive {} baud from a {} Hz clock", baud, clock_hz)
            }
        }
    }
}
