//! The UART driver: line configuration, FIFO/interrupt control and polled
//! character transfer over one register block.
//!
//! Every transfer follows the same discipline: wait for the status flag in RIS,
//! move the data, then clear that flag through IC. How the wait behaves is up
//! to the [`Wait`] strategy; the default [`Spin`] never gives up.

use crate::config::{baud_rate_for, LineConfig, Parity};
use crate::error::{Error, Result};
use crate::interrupt::InterruptFlags;
use crate::regs::{cfg, ctrl, gclk, Field, MmioRegisters, Register, RegisterIo};
use crate::trace::{push_trace, SERIAL_LINE_ERROR, SERIAL_RX, SERIAL_TX, SERIAL_WAIT};
use crate::version::{DriverVersion, DRIVER_VERSION};
use crate::wait::{Spin, Wait};

/// Data bits of RXDATA/TXDATA; frames are at most 9 bits wide.
const DATA_MASK: u32 = 0x1FF;

pub struct Uart<R: RegisterIo, W: Wait = Spin> {
    regs: R,
    wait: W,
}

impl<R: RegisterIo> Uart<R, Spin> {
    pub fn new(regs: R) -> Self {
        Uart { regs, wait: Spin }
    }
}

impl Uart<MmioRegisters, Spin> {
    /// # Safety
    ///
    /// See [`MmioRegisters::new`].
    pub unsafe fn from_base_address(base_address: usize) -> Self {
        Uart::new(MmioRegisters::new(base_address))
    }
}

impl<R: RegisterIo, W: Wait> Uart<R, W> {
    pub fn with_wait(regs: R, wait: W) -> Self {
        Uart { regs, wait }
    }

    #[inline]
    pub fn regs(&self) -> &R {
        &self.regs
    }

    pub fn wait_mut(&mut self) -> &mut W {
        &mut self.wait
    }

    pub fn release(self) -> (R, W) {
        (self.regs, self.wait)
    }

    pub fn version(&self) -> DriverVersion {
        DRIVER_VERSION
    }

    // ---- CTRL ----

    #[inline]
    fn set_ctrl(&self, field: Field) {
        self.regs.modify(Register::Ctrl, |v| field.set(v));
    }

    #[inline]
    fn clear_ctrl(&self, field: Field) {
        self.regs.modify(Register::Ctrl, |v| field.clear(v));
    }

    pub fn enable(&self) {
        self.set_ctrl(ctrl::EN);
    }

    pub fn disable(&self) {
        self.clear_ctrl(ctrl::EN);
    }

    pub fn enable_rx(&self) {
        self.set_ctrl(ctrl::RXEN);
    }

    pub fn disable_rx(&self) {
        self.clear_ctrl(ctrl::RXEN);
    }

    pub fn enable_tx(&self) {
        self.set_ctrl(ctrl::TXEN);
    }

    pub fn disable_tx(&self) {
        self.clear_ctrl(ctrl::TXEN);
    }

    /// Connects TX to RX internally.
    pub fn enable_loopback(&self) {
        self.set_ctrl(ctrl::LPEN);
    }

    pub fn disable_loopback(&self) {
        self.clear_ctrl(ctrl::LPEN);
    }

    /// The filter needs a clean 0 -> 1 edge: the field is cleared by its own
    /// write before the bit is set.
    pub fn enable_glitch_filter(&self) {
        self.clear_ctrl(ctrl::GFEN);
        self.set_ctrl(ctrl::GFEN);
    }

    pub fn disable_glitch_filter(&self) {
        self.clear_ctrl(ctrl::GFEN);
    }

    pub fn set_clock_gate_enable(&self, value: u32) {
        self.regs.write(Register::Gclk, value);
    }

    /// Whether the peripheral clock is running.
    pub fn clock_gate_enabled(&self) -> bool {
        gclk::GCLK_EN.extract(self.regs.read(Register::Gclk)) != 0
    }

    pub fn set_control_register(&self, value: u32) {
        self.regs.write(Register::Ctrl, value);
    }

    pub fn control_register(&self) -> u32 {
        self.regs.read(Register::Ctrl)
    }

    // ---- CFG ----

    #[inline]
    fn set_cfg_field(&self, field: Field, value: u32) {
        self.regs.modify(Register::Cfg, |v| field.insert(v, value));
    }

    #[inline]
    fn cfg_field(&self, field: Field) -> u32 {
        field.extract(self.regs.read(Register::Cfg))
    }

    pub fn set_config_register(&self, value: u32) {
        self.regs.write(Register::Cfg, value);
    }

    pub fn config_register(&self) -> u32 {
        self.regs.read(Register::Cfg)
    }

    /// Data bits per frame (5 to 9). Bits beyond the 4-bit field are dropped.
    pub fn set_word_length(&self, value: u32) {
        self.set_cfg_field(cfg::WLEN, value);
    }

    pub fn word_length(&self) -> u32 {
        self.cfg_field(cfg::WLEN)
    }

    pub fn set_two_stop_bits(&self, two_stop_bits: bool) {
        if two_stop_bits {
            self.regs.modify(Register::Cfg, |v| cfg::STP2.set(v));
        } else {
            self.regs.modify(Register::Cfg, |v| cfg::STP2.clear(v));
        }
    }

    pub fn two_stop_bits(&self) -> bool {
        self.cfg_field(cfg::STP2) != 0
    }

    pub fn set_parity(&self, parity: Parity) {
        self.set_parity_bits(parity.bits());
    }

    /// Raw parity code, truncated to the 3-bit field. Undefined codes are
    /// written as given.
    pub fn set_parity_bits(&self, bits: u32) {
        self.set_cfg_field(cfg::PARITY, bits);
    }

    /// `None` when the field holds an undefined code.
    pub fn parity(&self) -> Option<Parity> {
        Parity::from_bits(self.cfg_field(cfg::PARITY))
    }

    /// Receiver timeout in bit periods, truncated to 6 bits.
    pub fn set_timeout_bits(&self, value: u32) {
        self.set_cfg_field(cfg::TIMEOUT, value);
    }

    pub fn timeout_bits(&self) -> u32 {
        self.cfg_field(cfg::TIMEOUT)
    }

    // ---- PR ----

    /// `baud = clock / ((prescaler + 1) * 16)`. Not checked against any clock.
    pub fn set_prescaler(&self, prescaler: u32) {
        self.regs.write(Register::Prescaler, prescaler);
    }

    pub fn prescaler(&self) -> u32 {
        self.regs.read(Register::Prescaler)
    }

    pub fn baud_rate(&self, clock_hz: u32) -> u32 {
        baud_rate_for(clock_hz, self.prescaler())
    }

    /// Programs the line and brings the peripheral up. Nothing is written if
    /// `config` does not validate.
    pub fn init(&self, config: &LineConfig) -> Result<()> {
        config.validate()?;
        let prescaler = config.prescaler()?;

        self.disable();
        self.set_prescaler(prescaler);
        self.set_word_length(config.word_length);
        self.set_two_stop_bits(config.two_stop_bits);
        self.set_parity(config.parity);
        self.set_timeout_bits(config.timeout_bits);
        self.enable_tx();
        self.enable_rx();
        self.enable();

        debug!(
            "[uart] init: {} baud (prescaler {}), {} data bits, {:?} parity, {} stop bits",
            config.baud,
            prescaler,
            config.word_length,
            config.parity,
            if config.two_stop_bits { 2 } else { 1 }
        );
        Ok(())
    }

    // ---- FIFO and match ----

    pub fn set_rx_fifo_threshold(&self, value: u32) {
        self.regs.write(Register::RxFifoThreshold, value);
    }

    pub fn rx_fifo_threshold(&self) -> u32 {
        self.regs.read(Register::RxFifoThreshold)
    }

    pub fn set_tx_fifo_threshold(&self, value: u32) {
        self.regs.write(Register::TxFifoThreshold, value);
    }

    pub fn tx_fifo_threshold(&self) -> u32 {
        self.regs.read(Register::TxFifoThreshold)
    }

    /// Bytes waiting in the TX FIFO.
    pub fn tx_count(&self) -> u32 {
        self.regs.read(Register::TxFifoLevel)
    }

    /// Bytes waiting in the RX FIFO.
    pub fn rx_count(&self) -> u32 {
        self.regs.read(Register::RxFifoLevel)
    }

    pub fn set_match_data(&self, value: u32) {
        self.regs.write(Register::Match, value);
    }

    pub fn match_data(&self) -> u32 {
        self.regs.read(Register::Match)
    }

    // ---- interrupts ----

    pub fn raw_interrupt_status(&self) -> InterruptFlags {
        InterruptFlags::from_register(self.regs.read(Register::Ris))
    }

    pub fn masked_interrupt_status(&self) -> InterruptFlags {
        InterruptFlags::from_register(self.regs.read(Register::Mis))
    }

    /// Enables `flags` on top of whatever is already enabled.
    pub fn set_interrupt_mask(&self, flags: InterruptFlags) {
        self.regs.modify(Register::Im, |v| v | flags.bits());
    }

    /// Disables `flags`, leaving the other sources as they are.
    pub fn disable_interrupts(&self, flags: InterruptFlags) {
        self.regs.modify(Register::Im, |v| v & !flags.bits());
    }

    pub fn interrupt_mask(&self) -> InterruptFlags {
        InterruptFlags::from_register(self.regs.read(Register::Im))
    }

    /// IC is write-1-to-clear; zero bits leave their flags untouched.
    pub fn clear_interrupt_flags(&self, flags: InterruptFlags) {
        self.regs.write(Register::Ic, flags.bits());
    }

    // ---- transfer ----

    /// Polls RIS until `flag` is raised and returns the status that showed it.
    fn wait_for(&mut self, flag: InterruptFlags) -> Result<InterruptFlags> {
        self.wait.start();
        let mut status = self.raw_interrupt_status();
        if !status.contains(flag) {
            push_trace(SERIAL_WAIT | flag.bits() as usize);
            while !status.contains(flag) {
                self.wait.poll(flag)?;
                status = self.raw_interrupt_status();
            }
        }
        Ok(status)
    }

    /// Writes one word to TXDATA and acknowledges `flag`.
    pub(crate) fn transmit(&self, word: u16, flag: InterruptFlags) {
        push_trace(SERIAL_TX | word as usize);
        self.regs.write(Register::TxData, word as u32 & DATA_MASK);
        self.clear_interrupt_flags(flag);
    }

    /// Pops one word from RXDATA and acknowledges RXA. Line errors present
    /// in `status` are cleared and reported together with the drained word.
    pub(crate) fn receive(&self, status: InterruptFlags) -> Result<u16> {
        let word = (self.regs.read(Register::RxData) & DATA_MASK) as u16;
        self.clear_interrupt_flags(InterruptFlags::RXA);

        let errors = status & InterruptFlags::LINE_ERRORS;
        if !errors.is_empty() {
            self.clear_interrupt_flags(errors);
            push_trace(SERIAL_LINE_ERROR | errors.bits() as usize);
            warn!("[uart] line error {:?} on word {:#x}", errors, word);
            return Err(Error::LineError {
                flags: errors,
                word,
            });
        }
        push_trace(SERIAL_RX | word as usize);
        Ok(word)
    }

    /// Waits for an empty TX FIFO, then sends `data`.
    pub fn write_char(&mut self, data: u8) -> Result<()> {
        self.write_word(data as u16)
    }

    /// As [`write_char`](Self::write_char), for frames wider than 8 bits.
    pub fn write_word(&mut self, word: u16) -> Result<()> {
        self.wait_for(InterruptFlags::TXE)?;
        self.transmit(word, InterruptFlags::TXE);
        Ok(())
    }

    /// Sends `bytes` up to the first NUL, or all of them if there is none.
    ///
    /// Each byte only waits for the TX FIFO to drop below its threshold, so
    /// several can be queued back to back.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &b in bytes.iter().take_while(|&&b| b != 0) {
            self.wait_for(InterruptFlags::TXB)?;
            self.transmit(b as u16, InterruptFlags::TXB);
        }
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Waits until the RX FIFO is above its threshold and takes one byte.
    /// Frames wider than 8 bits are truncated; use [`read_word`](Self::read_word).
    pub fn read_char(&mut self) -> Result<u8> {
        self.read_word().map(|w| w as u8)
    }

    pub fn read_word(&mut self) -> Result<u16> {
        let status = self.wait_for(InterruptFlags::RXA)?;
        self.receive(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimRegisters;

    type CtrlOp = fn(&Uart<&SimRegisters>);

    fn ctrl_fields() -> [(Field, CtrlOp, CtrlOp); 5] {
        [
            (ctrl::EN, |u| u.enable(), |u| u.disable()),
            (ctrl::RXEN, |u| u.enable_rx(), |u| u.disable_rx()),
            (ctrl::TXEN, |u| u.enable_tx(), |u| u.disable_tx()),
            (ctrl::LPEN, |u| u.enable_loopback(), |u| u.disable_loopback()),
            (
                ctrl::GFEN,
                |u| u.enable_glitch_filter(),
                |u| u.disable_glitch_filter(),
            ),
        ]
    }

    #[test]
    fn ctrl_fields_are_isolated() {
        for &initial in [0u32, 0xFFFF_FFE0, 0x0000_0015, 0xA5A5_A5A5].iter() {
            for (field, set, clear) in ctrl_fields().iter() {
                let sim = SimRegisters::new();
                let uart = Uart::new(&sim);
                uart.set_control_register(initial);

                set(&uart);
                assert_eq!(uart.control_register(), initial | field.mask, "{}", field.name);
                clear(&uart);
                assert_eq!(uart.control_register(), initial & !field.mask, "{}", field.name);
            }
        }
    }

    #[test]
    fn glitch_filter_clears_before_setting() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        uart.set_control_register(0x1F);
        sim.clear_log();

        uart.enable_glitch_filter();
        let writes = sim.writes_to(Register::Ctrl);
        assert_eq!(&writes[..], &[0x0F, 0x1F]);
    }

    #[test]
    fn word_length_preserves_other_cfg_fields() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        let others = !cfg::WLEN.mask;
        for &initial in [0u32, 0xFFFF_FFFF, 0x0000_2AB0].iter() {
            for value in 0..=0x1F {
                uart.set_config_register(initial);
                uart.set_word_length(value);
                let reg = uart.config_register();
                assert_eq!(reg & cfg::WLEN.mask, value & 0xF);
                assert_eq!(reg & others, initial & others);
            }
        }
    }

    #[test]
    fn timeout_and_stop_bits_preserve_neighbours() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        uart.set_config_register(0xFFFF_FFFF);
        uart.set_timeout_bits(0);
        assert_eq!(uart.config_register(), 0xFFFF_C0FF);
        uart.set_two_stop_bits(false);
        assert_eq!(uart.config_register(), 0xFFFF_C0EF);
        assert!(!uart.two_stop_bits());
        uart.set_two_stop_bits(true);
        assert!(uart.two_stop_bits());
        uart.set_timeout_bits(0x41);
        assert_eq!(uart.timeout_bits(), 0x01);
    }

    #[test]
    fn parity_round_trips() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        uart.set_config_register(0x3F1F);
        for parity in [
            Parity::None,
            Parity::Odd,
            Parity::Even,
            Parity::Sticky0,
            Parity::Sticky1,
        ]
        .iter()
        {
            uart.set_parity(*parity);
            assert_eq!(uart.parity(), Some(*parity));
            assert_eq!(uart.config_register() & !cfg::PARITY.mask, 0x3F1F);
        }
    }

    #[test]
    fn parity_out_of_range_is_truncated_silently() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        // 0b1001: only the low three bits fit, which is Odd.
        uart.set_parity_bits(0b1001);
        assert_eq!(uart.parity(), Some(Parity::Odd));
        assert_eq!(uart.config_register(), 1 << 5);
        // Undefined but in range: stored, not decodable.
        uart.set_parity_bits(6);
        assert_eq!(uart.parity(), None);
        assert_eq!(uart.config_register(), 6 << 5);
    }

    #[test]
    fn whole_register_accessors() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        uart.set_prescaler(0xDEAD_BEEF);
        uart.set_rx_fifo_threshold(0xFFFF_FFFF);
        uart.set_tx_fifo_threshold(0x8000_0001);
        uart.set_match_data(0x1234_5678);
        uart.set_clock_gate_enable(1);
        assert_eq!(uart.prescaler(), 0xDEAD_BEEF);
        assert_eq!(uart.rx_fifo_threshold(), 0xFFFF_FFFF);
        assert_eq!(uart.tx_fifo_threshold(), 0x8000_0001);
        assert_eq!(uart.match_data(), 0x1234_5678);
        assert_eq!(sim.peek(Register::Gclk), 1);
        assert!(uart.clock_gate_enabled());
        uart.set_clock_gate_enable(0xFFFF_FFFE);
        assert!(!uart.clock_gate_enabled());
    }

    #[test]
    fn fifo_levels_are_only_read() {
        let sim = SimRegisters::new();
        sim.push_rx(b"abc");
        sim.set_tx_level(5);
        let uart = Uart::new(&sim);
        assert_eq!(uart.rx_count(), 3);
        assert_eq!(uart.tx_count(), 5);
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn interrupt_mask_accumulates_and_disables() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        uart.set_interrupt_mask(InterruptFlags::RXA | InterruptFlags::FE);
        uart.set_interrupt_mask(InterruptFlags::TXB);
        assert_eq!(
            uart.interrupt_mask(),
            InterruptFlags::RXA | InterruptFlags::FE | InterruptFlags::TXB
        );
        uart.disable_interrupts(InterruptFlags::FE | InterruptFlags::OR);
        assert_eq!(uart.interrupt_mask(), InterruptFlags::RXA | InterruptFlags::TXB);
    }

    #[test]
    fn masked_status_follows_mask() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        sim.raise(InterruptFlags::BRK | InterruptFlags::MATCH);
        assert!(uart.masked_interrupt_status().is_empty());
        uart.set_interrupt_mask(InterruptFlags::MATCH);
        assert_eq!(uart.masked_interrupt_status(), InterruptFlags::MATCH);
        assert_eq!(
            uart.raw_interrupt_status(),
            InterruptFlags::BRK | InterruptFlags::MATCH
        );
    }

    #[test]
    fn init_programs_line_then_enables() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        let config = LineConfig::new(16_000_000, 9_600)
            .parity(Parity::Odd)
            .timeout_bits(10);
        uart.init(&config).unwrap();

        assert_eq!(uart.prescaler(), 103);
        assert_eq!(uart.config_register(), config.cfg_bits());
        assert_eq!(uart.control_register(), 0b111);
        let ctrl_writes = sim.writes_to(Register::Ctrl);
        assert_eq!(ctrl_writes.last(), Some(&0b111));
        assert_eq!(ctrl_writes[ctrl_writes.len() - 2], 0b110);
        assert_eq!(uart.baud_rate(16_000_000), 9_615);
    }

    #[test]
    fn init_rejects_bad_config_without_writing() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        let config = LineConfig::new(18_432_000, 115_200).word_length(16);
        assert!(matches!(
            uart.init(&config),
            Err(Error::FieldOverflow { .. })
        ));
        let config = LineConfig::new(16_000_000, 115_200);
        assert!(matches!(
            uart.init(&config),
            Err(Error::InvalidBaudRate { .. })
        ));
        assert!(sim.writes().is_empty());
    }

    #[test]
    fn version() {
        let sim = SimRegisters::new();
        let uart = Uart::new(&sim);
        assert_eq!(uart.version(), DriverVersion { api: 1, drv: 1 });
    }

    #[test]
    fn mmio_register_layout() {
        use crate::config::REGISTER_BLOCK_SIZE;

        let mut block = vec![0u32; REGISTER_BLOCK_SIZE / 4];
        let base = block.as_mut_ptr();
        let uart = Uart::new(unsafe { MmioRegisters::new(base as usize) });

        uart.set_prescaler(103);
        uart.set_word_length(8);
        uart.enable_tx();
        uart.enable();
        uart.set_match_data(0x5A);
        uart.set_rx_fifo_threshold(4);
        uart.set_interrupt_mask(InterruptFlags::RXA);
        uart.clear_interrupt_flags(InterruptFlags::TXE | InterruptFlags::OR);
        uart.set_clock_gate_enable(1);

        unsafe {
            *base.add(0x3FC2) = (InterruptFlags::TXE | InterruptFlags::BRK).bits();
            *base.add(0x3F80) = 3;
            *base.add(0x3F84) = 9;
        }
        assert_eq!(
            uart.raw_interrupt_status(),
            InterruptFlags::TXE | InterruptFlags::BRK
        );
        assert_eq!(uart.rx_count(), 3);
        assert_eq!(uart.tx_count(), 9);

        assert_eq!(block[2], 103);
        assert_eq!(block[3], 0b11);
        assert_eq!(block[4], 8);
        assert_eq!(block[7], 0x5A);
        assert_eq!(block[0x3F81], 4);
        assert_eq!(block[0x3FC0], InterruptFlags::RXA.bits());
        assert_eq!(block[0x3FC3], (InterruptFlags::TXE | InterruptFlags::OR).bits());
        assert_eq!(block[0x3FC4], 1);
    }
}
