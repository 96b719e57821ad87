//! Driver for the EF_UART memory-mapped UART peripheral.
//!
//! The register block is reached through [`RegisterIo`], so the same driver runs
//! on real hardware ([`MmioRegisters`]) and against [`sim::SimRegisters`].
//!
//! ```ignore
//! use ef_uart::{LineConfig, Uart};
//!
//! let mut uart = unsafe { Uart::from_base_address(0x1000_0000) };
//! uart.init(&LineConfig::new(18_432_000, 115_200))?;
//! uart.write_str("hello\n")?;
//! let ch = uart.read_char()?;
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod interrupt;
pub mod regs;
pub mod serial;
pub mod sim;
pub mod trace;
pub mod uart;
pub mod version;
pub mod wait;

pub use config::{LineConfig, Parity};
pub use error::{Error, Result};
pub use interrupt::InterruptFlags;
pub use regs::{MmioRegisters, Register, RegisterIo};
pub use uart::Uart;
pub use version::DriverVersion;
pub use wait::{Bounded, Spin, Wait};
