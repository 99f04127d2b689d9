//! Interrupt-shared driver state.
//!
//! [`RadioCore`] owns everything the interrupt handler and the caller both
//! touch: the register bus, the mode controller, both packet buffers, the
//! counters and the latched RSSI. The driver keeps it in a
//! `critical_section::Mutex<RefCell<_>>`; every method here runs with the
//! critical section held and never blocks.

use log::debug;

use super::bus::RegisterBus;
use super::config::{frf_bytes, pa_settings, PaSettings};
use super::hal::{Hal, HalError};
use super::irq::IrqFlags2;
use super::mode::{ModeController, OperatingMode};
use super::modem::ModemConfig;
use super::packet::{RadioStats, ReceiveBuffer, TransmitBuffer};
use super::registers::*;
use crate::error::RadioError;
use crate::logging::LogThrottle;

/// Frame handling parameters fixed at construction
#[derive(Debug, Clone, Copy)]
pub(crate) struct FramePolicy {
    pub(crate) max_message_len: usize,
    pub(crate) fifo_threshold: usize,
    pub(crate) crc: bool,
    pub(crate) idle_mode: OperatingMode,
    pub(crate) after_tx_mode: OperatingMode,
}

impl FramePolicy {
    /// Bytes that fit in the FIFO on top of a threshold's worth still queued
    pub(crate) fn refill_chunk(&self) -> usize {
        FIFO_SIZE - self.fifo_threshold - 1
    }
}

#[derive(Debug)]
pub(crate) struct RadioCore<H> {
    pub(crate) bus: RegisterBus<H>,
    pub(crate) mode: ModeController,
    pub(crate) rx: ReceiveBuffer,
    pub(crate) tx: TransmitBuffer,
    pub(crate) stats: RadioStats,
    pub(crate) last_rssi: u8,
    pub(crate) policy: FramePolicy,
    pub(crate) fault_log: LogThrottle,
}

impl<H: Hal> RadioCore<H> {
    pub(crate) fn new(hal: H, policy: FramePolicy) -> Self {
        Self {
            bus: RegisterBus::new(hal),
            mode: ModeController::new(),
            rx: ReceiveBuffer::new(policy.max_message_len),
            tx: TransmitBuffer::new(policy.max_message_len),
            stats: RadioStats::default(),
            last_rssi: 0,
            policy,
            fault_log: LogThrottle::new(1000, 5),
        }
    }

    /// Switch modes, dropping any frame still being assembled.
    ///
    /// A completed frame survives until `recv`; a partial one cannot be
    /// resumed once the receiver has stopped, and its leftover bytes would
    /// otherwise be read as the start of the next frame.
    pub(crate) fn set_mode(&mut self, mode: OperatingMode) -> Result<(), HalError> {
        if self.mode.current() != mode && self.rx.in_progress() {
            debug!(
                "RFM69 dropping partial frame {}/{:?} bytes on mode change",
                self.rx.len(),
                self.rx.expected_len()
            );
            self.rx.clear();
            self.flush_fifo()?;
        }
        self.mode.set_mode(&mut self.bus, mode)
    }

    /// Empty the chip FIFO and clear its flags
    pub(crate) fn flush_fifo(&mut self) -> Result<(), HalError> {
        self.bus.write_register(REG_IRQFLAGS2, IrqFlags2::FIFO_OVERRUN.bits())
    }

    /// Load `data` and start transmitting it.
    ///
    /// The caller has already checked the length and waited out any previous
    /// transmission. The length byte and as much payload as fits go into the
    /// FIFO from Standby; the interrupt handler refills the rest.
    pub(crate) fn start_transmit(&mut self, data: &[u8]) -> Result<(), RadioError> {
        self.tx.clear();
        self.tx.append(data)?;

        self.set_mode(OperatingMode::Standby)?;
        self.flush_fifo()?;
        self.bus.write_register(REG_FIFO, data.len() as u8)?;
        self.push_fragment(FIFO_SIZE - 1)?;

        debug!(
            "RFM69 transmit {} bytes, {} queued in FIFO",
            self.tx.len(),
            self.tx.sent()
        );
        self.set_mode(OperatingMode::Transmit)?;
        Ok(())
    }

    /// Write up to `limit` unsent bytes into the FIFO
    pub(crate) fn push_fragment(&mut self, limit: usize) -> Result<usize, HalError> {
        let chunk = self.tx.next_chunk(limit);
        let count = chunk.len();
        self.bus.burst_write(REG_FIFO, chunk)?;
        self.tx.advance(count);
        Ok(count)
    }

    pub(crate) fn write_chip_profile(&mut self, profile: &[(u8, u8)]) -> Result<(), HalError> {
        for &(reg, value) in profile {
            self.bus.write_register(reg, value)?;
        }
        Ok(())
    }

    /// Program modulation, bandwidths and packet format from `modem`
    pub(crate) fn write_modem_config(&mut self, modem: &ModemConfig) -> Result<(), HalError> {
        self.bus.burst_write(REG_DATAMODUL, &modem.modulation_block())?;
        self.bus.write_register(REG_RXBW, modem.rx_bw)?;
        self.bus.write_register(REG_AFCBW, modem.afc_bw)?;
        self.write_packet_config(modem.packet_config1)
    }

    /// RegPacketConfig1 with the CRC policy applied.
    ///
    /// CRC auto-clear stays off so frames failing the check still raise
    /// PayloadReady and are counted.
    pub(crate) fn write_packet_config(&mut self, packet_config1: u8) -> Result<(), HalError> {
        let mut value = (packet_config1 & !RF_PACKET1_CRC_ON) | RF_PACKET1_CRCAUTOCLEAR_OFF;
        if self.policy.crc {
            value |= RF_PACKET1_CRC_ON;
        }
        self.bus.write_register(REG_PACKETCONFIG1, value)
    }

    pub(crate) fn write_frequency(&mut self, frf: u32, afc_auto: bool) -> Result<(), HalError> {
        self.bus.burst_write(REG_FRFMSB, &frf_bytes(frf))?;
        let afc = if afc_auto { RF_AFCFEI_AFCAUTO_ON } else { 0 };
        self.bus.modify_register(REG_AFCFEI, RF_AFCFEI_AFCAUTO_ON, afc)
    }

    pub(crate) fn write_tx_power(&mut self, dbm: i8, high_power: bool) -> Result<PaSettings, HalError> {
        let pa = pa_settings(dbm, high_power);
        self.bus.write_register(REG_PALEVEL, pa.pa_level)?;
        self.bus.write_register(REG_OCP, pa.ocp)?;
        self.mode.set_pa_boost(pa.boost);
        Ok(pa)
    }

    /// Empty `words` turns sync detection off
    pub(crate) fn write_sync_words(&mut self, words: &[u8]) -> Result<(), HalError> {
        if words.is_empty() {
            return self.bus.write_register(REG_SYNCCONFIG, 0);
        }
        let size = (words.len() as u8 - 1) << RF_SYNC_SIZE_SHIFT;
        self.bus.write_register(REG_SYNCCONFIG, RF_SYNC_ON | size)?;
        self.bus.burst_write(REG_SYNCVALUE1, words)
    }

    pub(crate) fn write_preamble_length(&mut self, bytes: u16) -> Result<(), HalError> {
        self.bus.burst_write(REG_PREAMBLEMSB, &bytes.to_be_bytes())
    }

    pub(crate) fn write_payload_limits(&mut self) -> Result<(), HalError> {
        self.bus
            .write_register(REG_PAYLOADLENGTH, self.policy.max_message_len as u8)?;
        let threshold = self.policy.fifo_threshold as u8 & RF_FIFOTHRESH_VALUE_MASK;
        self.bus
            .write_register(REG_FIFOTHRESH, RF_FIFOTHRESH_TXSTART_FIFONOTEMPTY | threshold)
    }

    pub(crate) fn write_aes_key(&mut self, key: Option<&[u8; 16]>) -> Result<(), HalError> {
        match key {
            Some(key) => {
                self.bus.burst_write(REG_AESKEY1, key)?;
                self.bus
                    .modify_register(REG_PACKETCONFIG2, RF_PACKET2_AES_ON, RF_PACKET2_AES_ON)
            }
            None => self.bus.modify_register(REG_PACKETCONFIG2, RF_PACKET2_AES_ON, 0),
        }
    }
}
