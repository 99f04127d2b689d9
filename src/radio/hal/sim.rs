//! # Simulated RFM69
//!
//! Register-level model of the chip behind the [`Hal`] trait, used by the
//! test suite, the benches and the `rfm69-tool` CLI. Cloning a
//! `SimulatedRfm69` yields a second handle onto the same chip, so a test can
//! hand one clone to the driver and keep the other to inject received bytes,
//! raise IRQ flags and inspect the bus traffic.
//!
//! What the model does:
//! - FIFO reads pop from a receive queue (0x00 once empty) and draining it
//!   clears the receive flags; FIFO writes are captured in a transmit log
//! - burst access to other registers auto-increments the address
//! - writing FifoOverrun to RegIrqFlags2 flushes the FIFO and clears its flags
//! - RssiStart and TempMeasStart complete immediately unless told otherwise
//!
//! Everything else (IRQ flags, RSSI value, temperature) is set by the test.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Hal, HalError};
use crate::radio::irq::{IrqFlags1, IrqFlags2};
use crate::radio::registers::*;

/// One SPI transaction as seen by the chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpiTransaction {
    Read { address: u8, len: usize },
    Write { address: u8, data: Vec<u8> },
}

impl SpiTransaction {
    pub fn address(&self) -> u8 {
        match self {
            SpiTransaction::Read { address, .. } | SpiTransaction::Write { address, .. } => *address,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, SpiTransaction::Write { .. })
    }
}

#[derive(Debug)]
struct ChipState {
    registers: [u8; REGISTER_COUNT],
    rx_fifo: VecDeque<u8>,
    tx_fifo: Vec<u8>,
    transactions: Vec<SpiTransaction>,
    rssi_ready: bool,
    fail_remaining: usize,
    reset_asserted: bool,
    reset_pulses: u32,
}

impl ChipState {
    fn new() -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[REG_OPMODE as usize] = RF_OPMODE_STANDBY;
        registers[REG_VERSION as usize] = 0x24;
        registers[REG_IRQFLAGS1 as usize] = IrqFlags1::MODE_READY.bits();
        registers[REG_RSSICONFIG as usize] = RF_RSSI_DONE;
        registers[REG_FIFOTHRESH as usize] = 0x8F;

        Self {
            registers,
            rx_fifo: VecDeque::new(),
            tx_fifo: Vec::new(),
            transactions: Vec::new(),
            rssi_ready: true,
            fail_remaining: 0,
            reset_asserted: false,
            reset_pulses: 0,
        }
    }

    fn take_failure(&mut self) -> bool {
        if self.fail_remaining > 0 {
            self.fail_remaining -= 1;
            true
        } else {
            false
        }
    }

    fn write_one(&mut self, address: u8, value: u8) {
        match address {
            REG_IRQFLAGS2 => {
                if value & IrqFlags2::FIFO_OVERRUN.bits() != 0 {
                    self.rx_fifo.clear();
                    let flushed = IrqFlags2::FIFO_FULL
                        | IrqFlags2::FIFO_NOT_EMPTY
                        | IrqFlags2::FIFO_LEVEL
                        | IrqFlags2::FIFO_OVERRUN
                        | IrqFlags2::PAYLOAD_READY
                        | IrqFlags2::CRC_OK;
                    self.registers[REG_IRQFLAGS2 as usize] &= !flushed.bits();
                }
            }
            REG_RSSICONFIG => {
                if value & RF_RSSI_START != 0 {
                    self.registers[REG_RSSICONFIG as usize] =
                        if self.rssi_ready { RF_RSSI_DONE } else { 0 };
                }
            }
            REG_TEMP1 => {
                if value & RF_TEMP1_MEAS_START != 0 {
                    self.registers[REG_TEMP1 as usize] = 0;
                }
            }
            REG_VERSION => {}
            _ => self.registers[address as usize] = value,
        }
    }
}

/// Shared handle onto a simulated chip
#[derive(Debug, Clone)]
pub struct SimulatedRfm69 {
    state: Arc<Mutex<ChipState>>,
}

impl Default for SimulatedRfm69 {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRfm69 {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChipState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChipState> {
        // A panicking test thread must not take the other handles down with it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, address: u8) -> u8 {
        self.state().registers[(address & 0x7F) as usize]
    }

    /// Set a register directly, bypassing the write side effects
    pub fn set_register(&self, address: u8, value: u8) {
        self.state().registers[(address & 0x7F) as usize] = value;
    }

    pub fn set_irq_flags2(&self, flags: IrqFlags2) {
        self.set_register(REG_IRQFLAGS2, flags.bits());
    }

    pub fn set_rssi_value(&self, raw: u8) {
        self.set_register(REG_RSSIVALUE, raw);
    }

    /// Whether a triggered RSSI measurement completes
    pub fn set_rssi_ready(&self, ready: bool) {
        let mut state = self.state();
        state.rssi_ready = ready;
        if !ready {
            state.registers[REG_RSSICONFIG as usize] = 0;
        }
    }

    /// Queue raw bytes in the receive FIFO
    pub fn push_rx_bytes(&self, bytes: &[u8]) {
        let mut state = self.state();
        state.rx_fifo.extend(bytes.iter().copied());
        state.registers[REG_IRQFLAGS2 as usize] |= IrqFlags2::FIFO_NOT_EMPTY.bits();
    }

    /// Queue a length-prefixed frame and raise PayloadReady and CrcOk
    pub fn receive_frame(&self, payload: &[u8]) {
        let mut state = self.state();
        state.rx_fifo.push_back(payload.len() as u8);
        state.rx_fifo.extend(payload.iter().copied());
        let ready = IrqFlags2::FIFO_NOT_EMPTY | IrqFlags2::PAYLOAD_READY | IrqFlags2::CRC_OK;
        state.registers[REG_IRQFLAGS2 as usize] |= ready.bits();
    }

    pub fn rx_fifo_len(&self) -> usize {
        self.state().rx_fifo.len()
    }

    /// Every byte written to the FIFO since the last `take_tx_fifo`
    pub fn tx_fifo(&self) -> Vec<u8> {
        self.state().tx_fifo.clone()
    }

    pub fn take_tx_fifo(&self) -> Vec<u8> {
        std::mem::take(&mut self.state().tx_fifo)
    }

    pub fn transactions(&self) -> Vec<SpiTransaction> {
        self.state().transactions.clone()
    }

    pub fn clear_transactions(&self) {
        self.state().transactions.clear();
    }

    /// Values written to one register, in order
    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        self.state()
            .transactions
            .iter()
            .filter_map(|t| match t {
                SpiTransaction::Write { address: a, data } if *a == address => data.first().copied(),
                _ => None,
            })
            .collect()
    }

    /// Fail the next `count` SPI transactions with [`HalError::Spi`]
    pub fn fail_next(&self, count: usize) {
        self.state().fail_remaining = count;
    }

    pub fn reset_pulses(&self) -> u32 {
        self.state().reset_pulses
    }
}

impl Hal for SimulatedRfm69 {
    fn spi_write(&mut self, header: u8, data: &[u8]) -> Result<(), HalError> {
        let mut state = self.state();
        if state.take_failure() {
            return Err(HalError::Spi);
        }

        let address = header & 0x7F;
        state.transactions.push(SpiTransaction::Write {
            address,
            data: data.to_vec(),
        });

        if address == REG_FIFO {
            state.tx_fifo.extend_from_slice(data);
        } else {
            for (offset, &value) in data.iter().enumerate() {
                let reg = (address as usize + offset) & 0x7F;
                state.write_one(reg as u8, value);
            }
        }
        Ok(())
    }

    fn spi_read(&mut self, header: u8, buf: &mut [u8]) -> Result<(), HalError> {
        let mut state = self.state();
        if state.take_failure() {
            return Err(HalError::Spi);
        }

        let address = header & 0x7F;
        state.transactions.push(SpiTransaction::Read {
            address,
            len: buf.len(),
        });

        if address == REG_FIFO {
            for byte in buf.iter_mut() {
                *byte = state.rx_fifo.pop_front().unwrap_or(0);
            }
            if state.rx_fifo.is_empty() {
                let drained = IrqFlags2::FIFO_NOT_EMPTY
                    | IrqFlags2::FIFO_LEVEL
                    | IrqFlags2::PAYLOAD_READY
                    | IrqFlags2::CRC_OK;
                state.registers[REG_IRQFLAGS2 as usize] &= !drained.bits();
            }
        } else {
            for (offset, byte) in buf.iter_mut().enumerate() {
                *byte = state.registers[(address as usize + offset) & 0x7F];
            }
        }
        Ok(())
    }

    fn set_reset(&mut self, asserted: bool) -> Result<(), HalError> {
        let mut state = self.state();
        if state.reset_asserted && !asserted {
            state.reset_pulses += 1;
            *state = ChipState {
                transactions: std::mem::take(&mut state.transactions),
                reset_pulses: state.reset_pulses,
                ..ChipState::new()
            };
            return Ok(());
        }
        state.reset_asserted = asserted;
        Ok(())
    }
}
