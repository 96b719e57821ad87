//! A register block backed by memory, for tests and hosted bring-up.
//!
//! Models the parts of the hardware the driver depends on:
//! - MIS reads as `RIS & IM`.
//! - Writing 1s to IC clears those bits of RIS; IC and TXDATA read as 0.
//! - Writes to read-only registers are ignored (but still logged).
//! - Bytes queued with [`SimRegisters::push_rx`] are returned by RXDATA in
//!   order. RXA stays raised while any remain and RX_FIFO_LEVEL tracks them.
//! - With [`SimRegisters::idle_line`] the transmitter drains instantly, so TXE
//!   and TXB come back as soon as the driver clears them.
//!
//! The write and TX logs hold [`LOG_DEPTH`] entries; overflowing them panics,
//! so call [`SimRegisters::clear_log`] between long phases of a test.
//!
//! The state sits behind a `spin::Mutex`, so one thread may block in the
//! driver while another raises flags.

use heapless::{Deque, Vec};
use spin::Mutex;

use crate::interrupt::InterruptFlags;
use crate::regs::{Register, RegisterIo};

pub const LOG_DEPTH: usize = 256;
pub const RX_DEPTH: usize = 64;

pub type WriteLog = Vec<(Register, u32), LOG_DEPTH>;

struct SimState {
    regs: [u32; Register::COUNT],
    rx: Deque<u8, RX_DEPTH>,
    tx: Vec<u8, LOG_DEPTH>,
    writes: WriteLog,
    tx_drains: bool,
    ris_reads: usize,
    pending: Option<(InterruptFlags, usize)>,
}

impl SimState {
    fn log_write(&mut self, reg: Register, value: u32) {
        if self.writes.push((reg, value)).is_err() {
            panic!("sim: write log full ({} entries)", LOG_DEPTH);
        }
        if reg == Register::TxData && self.tx.push(value as u8).is_err() {
            panic!("sim: TX log full ({} bytes)", LOG_DEPTH);
        }
    }

    /// Re-derives the flags and levels that follow from the queues.
    fn refresh(&mut self) {
        let mut ris = InterruptFlags::from_register(self.regs[Register::Ris.index()]);
        if !self.rx.is_empty() {
            ris.insert(InterruptFlags::RXA);
        }
        if self.tx_drains {
            ris.insert(InterruptFlags::TXE | InterruptFlags::TXB);
        }
        self.regs[Register::Ris.index()] = ris.bits();
        self.regs[Register::RxFifoLevel.index()] = self.rx.len() as u32;
    }
}

pub struct SimRegisters {
    state: Mutex<SimState>,
}

impl SimRegisters {
    /// Every register zero, no flag raised.
    pub fn new() -> Self {
        SimRegisters {
            state: Mutex::new(SimState {
                regs: [0; Register::COUNT],
                rx: Deque::new(),
                tx: Vec::new(),
                writes: Vec::new(),
                tx_drains: false,
                ris_reads: 0,
                pending: None,
            }),
        }
    }

    /// A connected line whose transmitter never backs up.
    pub fn idle_line() -> Self {
        let sim = Self::new();
        {
            let mut state = sim.state.lock();
            state.tx_drains = true;
            state.refresh();
        }
        sim
    }

    /// Raises status flags as the hardware would.
    pub fn raise(&self, flags: InterruptFlags) {
        let mut state = self.state.lock();
        state.regs[Register::Ris.index()] |= flags.bits();
    }

    /// Raises `flags` once RIS has been read `polls` more times.
    pub fn raise_after(&self, flags: InterruptFlags, polls: usize) {
        let mut state = self.state.lock();
        let at = state.ris_reads + polls;
        state.pending = Some((flags, at));
    }

    /// Queues received bytes. Returns false if the RX queue filled up, in
    /// which case the bytes that did not fit are dropped.
    pub fn push_rx(&self, bytes: &[u8]) -> bool {
        let mut state = self.state.lock();
        let mut accepted = true;
        for &b in bytes {
            if state.rx.push_back(b).is_err() {
                accepted = false;
                break;
            }
        }
        state.refresh();
        accepted
    }

    /// Places a raw word in RXDATA without raising RXA.
    pub fn set_rx_data(&self, value: u32) {
        self.state.lock().regs[Register::RxData.index()] = value;
    }

    pub fn set_tx_level(&self, level: u32) {
        self.state.lock().regs[Register::TxFifoLevel.index()] = level;
    }

    /// Stored value of `reg`, with no read side effects.
    pub fn peek(&self, reg: Register) -> u32 {
        self.state.lock().regs[reg.index()]
    }

    /// Overwrites the stored value of `reg`, bypassing access rules.
    pub fn poke(&self, reg: Register, value: u32) {
        self.state.lock().regs[reg.index()] = value;
    }

    /// Bytes written to TXDATA so far.
    pub fn transmitted(&self) -> Vec<u8, LOG_DEPTH> {
        self.state.lock().tx.clone()
    }

    /// Every driver write in order, including ignored ones.
    pub fn writes(&self) -> WriteLog {
        self.state.lock().writes.clone()
    }

    pub fn writes_to(&self, reg: Register) -> Vec<u32, LOG_DEPTH> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|&(_, v)| v)
            .collect()
    }

    pub fn clear_log(&self) {
        let mut state = self.state.lock();
        state.writes.clear();
        state.tx.clear();
    }

    /// Number of RIS reads performed by the driver.
    pub fn ris_reads(&self) -> usize {
        self.state.lock().ris_reads
    }
}

impl Default for SimRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterIo for SimRegisters {
    fn read(&self, reg: Register) -> u32 {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match reg {
            Register::Ris => {
                state.ris_reads += 1;
                if let Some((flags, at)) = state.pending {
                    if state.ris_reads > at {
                        state.regs[Register::Ris.index()] |= flags.bits();
                        state.pending = None;
                    }
                }
                state.regs[Register::Ris.index()]
            }
            Register::Mis => state.regs[Register::Ris.index()] & state.regs[Register::Im.index()],
            Register::RxData => {
                if let Some(b) = state.rx.pop_front() {
                    state.regs[Register::RxData.index()] = b as u32;
                    state.regs[Register::RxFifoLevel.index()] = state.rx.len() as u32;
                }
                state.regs[Register::RxData.index()]
            }
            _ if reg.is_write_only() => 0,
            _ => state.regs[reg.index()],
        }
    }

    fn write(&self, reg: Register, value: u32) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.log_write(reg, value);
        match reg {
            Register::TxData => {}
            Register::Ic => {
                state.regs[Register::Ris.index()] &= !value;
                state.refresh();
            }
            _ if reg.is_read_only() => {}
            _ => state.regs[reg.index()] = value,
        }
    }
}
