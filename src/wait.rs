//! How the driver behaves while a status flag is not yet raised.

use core::hint::spin_loop;

use crate::error::{Error, Result};
use crate::interrupt::InterruptFlags;

pub trait Wait {
    /// Called before the first status read of every wait.
    fn start(&mut self) {}

    /// Called after each status read that did not show `flag`.
    /// Returning an error abandons the wait.
    fn poll(&mut self, flag: InterruptFlags) -> Result<()>;
}

/// Busy-waits forever. A stalled line blocks the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct Spin;

impl Wait for Spin {
    #[inline]
    fn poll(&mut self, _flag: InterruptFlags) -> Result<()> {
        spin_loop();
        Ok(())
    }
}

/// Busy-waits for at most `max_polls` unsuccessful status reads.
#[derive(Clone, Copy, Debug)]
pub struct Bounded {
    max_polls: usize,
    remaining: usize,
}

impl Bounded {
    pub const fn new(max_polls: usize) -> Self {
        Bounded {
            max_polls,
            remaining: max_polls,
        }
    }

    pub const fn max_polls(&self) -> usize {
        self.max_polls
    }
}

impl Wait for Bounded {
    fn start(&mut self) {
        self.remaining = self.max_polls;
    }

    fn poll(&mut self, flag: InterruptFlags) -> Result<()> {
        if self.remaining == 0 {
            return Err(Error::Timeout { waiting_for: flag });
        }
        self.remaining -= 1;
        spin_loop();
        Ok(())
    }
}

impl<W: Wait + ?Sized> Wait for &mut W {
    fn start(&mut self) {
        (**self).start()
    }

    fn poll(&mut self, flag: InterruptFlags) -> Result<()> {
        (**self).poll(flag)
    }
}
