//! Register map of the UART block and the bit fields packed into it.
//!
//! | Offset | Name              | Access |
//! |--------|-------------------|--------|
//! | 0x0000 | RXDATA            | ro     |
//! | 0x0004 | TXDATA            | wo     |
//! | 0x0008 | PR                | rw     |
//! | 0x000C | CTRL              | rw     |
//! | 0x0010 | CFG               | rw     |
//! | 0x001C | MATCH             | rw     |
//! | 0xFE00 | RX_FIFO_LEVEL     | ro     |
//! | 0xFE04 | RX_FIFO_THRESHOLD | rw     |
//! | 0xFE10 | TX_FIFO_LEVEL     | ro     |
//! | 0xFE14 | TX_FIFO_THRESHOLD | rw     |
//! | 0xFF00 | IM                | rw     |
//! | 0xFF04 | MIS               | ro     |
//! | 0xFF08 | RIS               | ro     |
//! | 0xFF0C | IC                | wo     |
//! | 0xFF10 | GCLK              | rw     |

use core::ptr::{read_volatile, write_volatile};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    RxData,
    TxData,
    Prescaler,
    Ctrl,
    Cfg,
    Match,
    RxFifoLevel,
    RxFifoThreshold,
    TxFifoLevel,
    TxFifoThreshold,
    Im,
    Mis,
    Ris,
    Ic,
    Gclk,
}

impl Register {
    pub const COUNT: usize = 15;

    pub const ALL: [Register; Register::COUNT] = [
        Register::RxData,
        Register::TxData,
        Register::Prescaler,
        Register::Ctrl,
        Register::Cfg,
        Register::Match,
        Register::RxFifoLevel,
        Register::RxFifoThreshold,
        Register::TxFifoLevel,
        Register::TxFifoThreshold,
        Register::Im,
        Register::Mis,
        Register::Ris,
        Register::Ic,
        Register::Gclk,
    ];

    /// Position in [`Register::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Byte offset from the block base.
    pub const fn offset(self) -> usize {
        match self {
            Register::RxData => 0x0000,
            Register::TxData => 0x0004,
            Register::Prescaler => 0x0008,
            Register::Ctrl => 0x000C,
            Register::Cfg => 0x0010,
            Register::Match => 0x001C,
            Register::RxFifoLevel => 0xFE00,
            Register::RxFifoThreshold => 0xFE04,
            Register::TxFifoLevel => 0xFE10,
            Register::TxFifoThreshold => 0xFE14,
            Register::Im => 0xFF00,
            Register::Mis => 0xFF04,
            Register::Ris => 0xFF08,
            Register::Ic => 0xFF0C,
            Register::Gclk => 0xFF10,
        }
    }

    /// Hardware ignores driver writes to these.
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Register::RxData
                | Register::RxFifoLevel
                | Register::TxFifoLevel
                | Register::Mis
                | Register::Ris
        )
    }

    /// Reads carry no meaningful value.
    pub const fn is_write_only(self) -> bool {
        matches!(self, Register::TxData | Register::Ic)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::RxData => "RXDATA",
            Register::TxData => "TXDATA",
            Register::Prescaler => "PR",
            Register::Ctrl => "CTRL",
            Register::Cfg => "CFG",
            Register::Match => "MATCH",
            Register::RxFifoLevel => "RX_FIFO_LEVEL",
            Register::RxFifoThreshold => "RX_FIFO_THRESHOLD",
            Register::TxFifoLevel => "TX_FIFO_LEVEL",
            Register::TxFifoThreshold => "TX_FIFO_THRESHOLD",
            Register::Im => "IM",
            Register::Mis => "MIS",
            Register::Ris => "RIS",
            Register::Ic => "IC",
            Register::Gclk => "GCLK",
        }
    }
}

/// 32-bit access to the UART register block.
///
/// Takes `&self`: device registers are shared state, implementations
/// provide their own interior mutability.
pub trait RegisterIo {
    fn read(&self, reg: Register) -> u32;
    fn write(&self, reg: Register, value: u32);

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&self, reg: Register, f: F)
    where
        Self: Sized,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

impl<T: RegisterIo + ?Sized> RegisterIo for &T {
    #[inline]
    fn read(&self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }
}

/// Volatile access to a register block mapped at `base_address`.
#[derive(Clone, Copy, Debug)]
pub struct MmioRegisters {
    base_address: usize,
}

impl MmioRegisters {
    /// # Safety
    ///
    /// `base_address` must be 4-byte aligned and map a UART register block of
    /// [`REGISTER_BLOCK_SIZE`](crate::config::REGISTER_BLOCK_SIZE) bytes with
    /// device memory attributes for as long as the returned value is used.
    pub const unsafe fn new(base_address: usize) -> Self {
        MmioRegisters { base_address }
    }

    pub const fn base_address(&self) -> usize {
        self.base_address
    }
}

impl RegisterIo for MmioRegisters {
    #[inline]
    fn read(&self, reg: Register) -> u32 {
        unsafe { read_volatile((self.base_address + reg.offset()) as *const u32) }
    }

    #[inline]
    fn write(&self, reg: Register, value: u32) {
        unsafe { write_volatile((self.base_address + reg.offset()) as *mut u32, value) }
    }
}

/// A logical value packed into a register at `bit`, confined to `mask`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub bit: u32,
    pub mask: u32,
}

impl Field {
    pub const fn new(name: &'static str, bit: u32, mask: u32) -> Self {
        Field { name, bit, mask }
    }

    /// Largest value the field can hold.
    pub const fn max_value(&self) -> u32 {
        self.mask >> self.bit
    }

    /// Replaces the field in `reg`, leaving every bit outside `mask` alone.
    /// Bits of `value` beyond the field width are dropped.
    #[inline]
    pub const fn insert(&self, reg: u32, value: u32) -> u32 {
        (reg & !self.mask) | ((value << self.bit) & self.mask)
    }

    #[inline]
    pub const fn extract(&self, reg: u32) -> u32 {
        (reg & self.mask) >> self.bit
    }

    /// Single-bit set, as `reg | (1 << bit)`.
    #[inline]
    pub const fn set(&self, reg: u32) -> u32 {
        reg | (1 << self.bit)
    }

    /// Clears the whole mask, not only `bit`.
    #[inline]
    pub const fn clear(&self, reg: u32) -> u32 {
        reg & !self.mask
    }

    pub fn checked(&self, value: u32) -> Result<u32> {
        if value > self.max_value() {
            Err(Error::FieldOverflow {
                field: self.name,
                value,
            })
        } else {
            Ok(value)
        }
    }
}

pub mod ctrl {
    use super::Field;

    pub const EN: Field = Field::new("ctrl.en", 0, 0x0000_0001);
    pub const TXEN: Field = Field::new("ctrl.txen", 1, 0x0000_0002);
    pub const RXEN: Field = Field::new("ctrl.rxen", 2, 0x0000_0004);
    pub const LPEN: Field = Field::new("ctrl.lpen", 3, 0x0000_0008);
    pub const GFEN: Field = Field::new("ctrl.gfen", 4, 0x0000_0010);
}

pub mod cfg {
    use super::Field;

    pub const WLEN: Field = Field::new("cfg.wlen", 0, 0x0000_000F);
    pub const STP2: Field = Field::new("cfg.stp2", 4, 0x0000_0010);
    pub const PARITY: Field = Field::new("cfg.parity", 5, 0x0000_00E0);
    pub const TIMEOUT: Field = Field::new("cfg.timeout", 8, 0x0000_3F00);
}

pub mod gclk {
    use super::Field;

    pub const GCLK_EN: Field = Field::new("gclk.gclk_en", 0, 0x0000_0001);
}
