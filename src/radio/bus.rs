//! # Register Access Layer
//!
//! Single-register and burst transactions over the [`Hal`]. The first byte
//! of every transaction is the register address with bit 7 set for a write
//! and cleared for a read; burst transfers keep chip select asserted while
//! the chip auto-increments the address (the FIFO address does not advance).
//!
//! The bus is owned by the driver's interrupt-shared state and is only
//! reachable while holding a critical-section token, so a register sequence
//! started in caller context is never interleaved with the interrupt handler.

use super::hal::{Hal, HalError};

/// Bit 7 of the address byte selects a write access
pub const SPI_WRITE_MASK: u8 = 0x80;

/// Address byte for a write access
pub const fn write_address(addr: u8) -> u8 {
    addr | SPI_WRITE_MASK
}

/// Address byte for a read access
pub const fn read_address(addr: u8) -> u8 {
    addr & !SPI_WRITE_MASK
}

/// Register-level view of the chip
#[derive(Debug)]
pub struct RegisterBus<H> {
    hal: H,
}

impl<H: Hal> RegisterBus<H> {
    pub fn new(hal: H) -> Self {
        Self { hal }
    }

    pub fn read_register(&mut self, addr: u8) -> Result<u8, HalError> {
        let mut value = [0u8; 1];
        self.hal.spi_read(read_address(addr), &mut value)?;
        Ok(value[0])
    }

    pub fn write_register(&mut self, addr: u8, value: u8) -> Result<(), HalError> {
        self.hal.spi_write(write_address(addr), &[value])
    }

    /// Read `dest.len()` bytes starting at `addr` in one transaction
    pub fn burst_read(&mut self, addr: u8, dest: &mut [u8]) -> Result<(), HalError> {
        if dest.is_empty() {
            return Ok(());
        }
        self.hal.spi_read(read_address(addr), dest)
    }

    /// Write all of `src` starting at `addr` in one transaction
    pub fn burst_write(&mut self, addr: u8, src: &[u8]) -> Result<(), HalError> {
        if src.is_empty() {
            return Ok(());
        }
        self.hal.spi_write(write_address(addr), src)
    }

    /// Replace the bits selected by `mask` with `bits`, leaving the rest intact
    pub fn modify_register(&mut self, addr: u8, mask: u8, bits: u8) -> Result<(), HalError> {
        let current = self.read_register(addr)?;
        self.write_register(addr, (current & !mask) | (bits & mask))
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn into_inner(self) -> H {
        self.hal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::hal::{SimulatedRfm69, SpiTransaction};
    use crate::radio::registers::*;

    #[test]
    fn address_encoding() {
        assert_eq!(write_address(REG_OPMODE), 0x81);
        assert_eq!(write_address(REG_FIFO), 0x80);
        assert_eq!(read_address(REG_VERSION), 0x10);
        assert_eq!(read_address(0x90), 0x10);
        assert_eq!(write_address(0x7F), 0xFF);
    }

    #[test]
    fn single_register_roundtrip() {
        let chip = SimulatedRfm69::new();
        let mut bus = RegisterBus::new(chip.clone());

        assert_eq!(bus.read_register(REG_VERSION).unwrap(), 0x24);
        bus.write_register(REG_PALEVEL, 0x9F).unwrap();
        assert_eq!(chip.register(REG_PALEVEL), 0x9F);
    }

    #[test]
    fn burst_write_uses_one_transaction() {
        let chip = SimulatedRfm69::new();
        let mut bus = RegisterBus::new(chip.clone());

        bus.burst_write(REG_FRFMSB, &[0xD9, 0x60, 0x00]).unwrap();
        assert_eq!(chip.transactions().len(), 1);
        assert_eq!(chip.register(REG_FRFMSB), 0xD9);
        assert_eq!(chip.register(REG_FRFMID), 0x60);
        assert_eq!(chip.register(REG_FRFLSB), 0x00);
    }

    #[test]
    fn empty_burst_is_skipped() {
        let chip = SimulatedRfm69::new();
        let mut bus = RegisterBus::new(chip.clone());

        bus.burst_write(REG_FIFO, &[]).unwrap();
        bus.burst_read(REG_FIFO, &mut []).unwrap();
        assert!(chip.transactions().is_empty());
    }

    #[test]
    fn burst_read_drains_fifo() {
        let chip = SimulatedRfm69::new();
        chip.push_rx_bytes(&[1, 2, 3, 4]);
        let mut bus = RegisterBus::new(chip.clone());

        let mut buf = [0u8; 3];
        bus.burst_read(REG_FIFO, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(chip.rx_fifo_len(), 1);
        assert_eq!(
            chip.transactions(),
            vec![SpiTransaction::Read { address: REG_FIFO, len: 3 }]
        );
    }

    #[test]
    fn modify_keeps_unmasked_bits() {
        let chip = SimulatedRfm69::new();
        chip.set_register(REG_OPMODE, 0xC4);
        let mut bus = RegisterBus::new(chip.clone());

        bus.modify_register(REG_OPMODE, RF_OPMODE_MODE_MASK, RF_OPMODE_RECEIVER)
            .unwrap();
        assert_eq!(chip.register(REG_OPMODE), 0xD0);
    }

    #[test]
    fn transport_errors_propagate() {
        let chip = SimulatedRfm69::new();
        chip.fail_next(1);
        let mut bus = RegisterBus::new(chip);

        assert_eq!(bus.read_register(REG_VERSION), Err(HalError::Spi));
        assert_eq!(bus.read_register(REG_VERSION), Ok(0x24));
    }
}
