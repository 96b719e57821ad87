use crate::error::{Error, Result};
use crate::regs::cfg;

/// Placeholder address; boards override it with the real location of the block.
pub const DEFAULT_BASE_ADDRESS: usize = 0x1000_0000;
pub const REGISTER_BLOCK_SIZE: usize = 0x1_0000;
pub const FIFO_DEPTH: usize = 16;
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_WORD_LENGTH: u32 = 8;

/// Each bit period is sampled 16 times.
pub const OVERSAMPLING: u32 = 16;

/// Largest deviation, in percent, between the requested baud rate and the one
/// the prescaler actually produces that [`LineConfig::validate`] accepts.
pub const BAUD_TOLERANCE_PERCENT: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
    Sticky0 = 4,
    Sticky1 = 5,
}

impl Parity {
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Codes 3, 6 and 7 are not defined by the hardware.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Parity::None),
            1 => Some(Parity::Odd),
            2 => Some(Parity::Even),
            4 => Some(Parity::Sticky0),
            5 => Some(Parity::Sticky1),
            _ => None,
        }
    }
}

impl Default for Parity {
    fn default() -> Self {
        Parity::None
    }
}

/// `baud = clock / ((prescaler + 1) * 16)`, solved for the prescaler and
/// rounded to the nearest divisor. Fails only when even prescaler 0 is too slow.
pub fn prescaler_for(clock_hz: u32, baud: u32) -> Result<u32> {
    let invalid = Error::InvalidBaudRate { clock_hz, baud };
    let divisor = baud.checked_mul(OVERSAMPLING).ok_or(invalid)?;
    if divisor == 0 || clock_hz < divisor {
        return Err(invalid);
    }
    let divisor = divisor as u64;
    let rounded = (clock_hz as u64 + divisor / 2) / divisor;
    Ok((rounded - 1) as u32)
}

pub const fn baud_rate_for(clock_hz: u32, prescaler: u32) -> u32 {
    let divisor = (prescaler as u64 + 1) * OVERSAMPLING as u64;
    (clock_hz as u64 / divisor) as u32
}

/// Line parameters applied together by [`Uart::init`](crate::Uart::init).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineConfig {
    pub clock_hz: u32,
    pub baud: u32,
    pub word_length: u32,
    pub two_stop_bits: bool,
    pub parity: Parity,
    pub timeout_bits: u32,
}

impl LineConfig {
    /// 8N1, no receiver timeout.
    pub const fn new(clock_hz: u32, baud: u32) -> Self {
        LineConfig {
            clock_hz,
            baud,
            word_length: DEFAULT_WORD_LENGTH,
            two_stop_bits: false,
            parity: Parity::None,
            timeout_bits: 0,
        }
    }

    pub const fn word_length(mut self, word_length: u32) -> Self {
        self.word_length = word_length;
        self
    }

    pub const fn two_stop_bits(mut self, two_stop_bits: bool) -> Self {
        self.two_stop_bits = two_stop_bits;
        self
    }

    pub const fn parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub const fn timeout_bits(mut self, timeout_bits: u32) -> Self {
        self.timeout_bits = timeout_bits;
        self
    }

    pub fn prescaler(&self) -> Result<u32> {
        prescaler_for(self.clock_hz, self.baud)
    }

    /// Baud rate the line actually runs at once the prescaler is programmed.
    pub fn actual_baud(&self) -> Result<u32> {
        Ok(baud_rate_for(self.clock_hz, self.prescaler()?))
    }

    /// Checks every field against its register width, and the baud rate
    /// against [`BAUD_TOLERANCE_PERCENT`].
    pub fn validate(&self) -> Result<()> {
        cfg::WLEN.checked(self.word_length)?;
        cfg::TIMEOUT.checked(self.timeout_bits)?;
        let actual = self.actual_baud()? as u64;
        let wanted = self.baud as u64;
        let deviation = if actual > wanted {
            actual - wanted
        } else {
            wanted - actual
        };
        if deviation * 100 > wanted * BAUD_TOLERANCE_PERCENT as u64 {
            return Err(Error::InvalidBaudRate {
                clock_hz: self.clock_hz,
                baud: self.baud,
            });
        }
        Ok(())
    }

    /// CFG contents for these parameters, truncated to each field.
    pub const fn cfg_bits(&self) -> u32 {
        let mut reg = cfg::WLEN.insert(0, self.word_length);
        reg = cfg::STP2.insert(reg, self.two_stop_bits as u32);
        reg = cfg::PARITY.insert(reg, self.parity.bits());
        cfg::TIMEOUT.insert(reg, self.timeout_bits)
    }
}
