//! # RFM69 Interrupt Handling
//!
//! The radio signals events on DIO0 (PayloadReady in Receive, PacketSent in
//! Transmit) and DIO1 (FifoLevel). The platform calls
//! [`Rfm69::handle_interrupt`](super::driver::Rfm69::handle_interrupt) from
//! whichever edge it sees; the handler reads RegIrqFlags2 and works out what
//! happened from the flags and the current mode.
//!
//! ## Framing
//!
//! Frames are variable length with a leading length byte. Anything longer
//! than the FIFO moves in fragments paced by the FIFO threshold:
//!
//! - **Receive**: each FifoLevel event drains a threshold's worth of bytes
//!   (the first one starts with the length byte); PayloadReady drains the
//!   rest and completes the frame.
//! - **Transmit**: the FIFO is primed before entering Transmit; whenever it
//!   drains below the threshold the next chunk is written, until PacketSent.
//!
//! A frame is discarded (counted in `rx_bad`, buffer cleared, FIFO flushed,
//! receiver restarted) when its length byte exceeds the configured maximum
//! or disagrees with what was already buffered, when CRC fails, when the
//! chip overran its FIFO, or when the previous frame has not been consumed.

use bitflags::bitflags;
use log::{debug, error, warn};

use super::shared::RadioCore;
use super::hal::{Hal, HalError};
use super::mode::OperatingMode;
use super::registers::*;

bitflags! {
    /// RegIrqFlags1
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IrqFlags1: u8 {
        const MODE_READY = 0x80;
        const RX_READY = 0x40;
        const TX_READY = 0x20;
        const PLL_LOCK = 0x10;
        const RSSI = 0x08;
        const TIMEOUT = 0x04;
        const AUTO_MODE = 0x02;
        const SYNC_ADDRESS_MATCH = 0x01;
    }
}

bitflags! {
    /// RegIrqFlags2
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IrqFlags2: u8 {
        const FIFO_FULL = 0x80;
        const FIFO_NOT_EMPTY = 0x40;
        /// FIFO holds more than the threshold
        const FIFO_LEVEL = 0x20;
        /// Write 1 to flush the FIFO
        const FIFO_OVERRUN = 0x10;
        const PACKET_SENT = 0x08;
        const PAYLOAD_READY = 0x04;
        const CRC_OK = 0x02;
        const LOW_BAT = 0x01;
    }
}

/// Why a received frame was thrown away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Length byte above the maximum, or below what was already buffered
    LengthOutOfRange(u8),
    /// A complete frame was still waiting for `recv`
    Unconsumed,
    CrcMismatch,
    /// The chip's FIFO overflowed before it was drained
    FifoOverrun,
}

/// What a call to the interrupt handler did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    FrameReceived { len: usize },
    FragmentReceived { buffered: usize },
    FrameDiscarded(DiscardReason),
    FragmentSent { remaining: usize },
    PacketSent,
    /// Nothing to do for the current mode and flags
    Spurious,
    /// A register access failed; state is unchanged past the failure
    BusFault,
}

/// Notifications from the interrupt handler.
///
/// Supplied once at construction. Runs in interrupt context after the
/// shared state has been released, so implementations may call back into
/// the driver but must not block. Every method defaults to a no-op.
pub trait RadioEvents {
    fn frame_received(&self, _len: usize) {}

    fn frame_discarded(&self, _reason: DiscardReason) {}

    fn packet_sent(&self) {}

    fn bus_fault(&self) {}
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl RadioEvents for NoEvents {}

impl<T: RadioEvents + ?Sized> RadioEvents for &T {
    fn frame_received(&self, len: usize) {
        (**self).frame_received(len)
    }

    fn frame_discarded(&self, reason: DiscardReason) {
        (**self).frame_discarded(reason)
    }

    fn packet_sent(&self) {
        (**self).packet_sent()
    }

    fn bus_fault(&self) {
        (**self).bus_fault()
    }
}

impl<T: RadioEvents + ?Sized> RadioEvents for std::sync::Arc<T> {
    fn frame_received(&self, len: usize) {
        (**self).frame_received(len)
    }

    fn frame_discarded(&self, reason: DiscardReason) {
        (**self).frame_discarded(reason)
    }

    fn packet_sent(&self) {
        (**self).packet_sent()
    }

    fn bus_fault(&self) {
        (**self).bus_fault()
    }
}

impl InterruptOutcome {
    pub(crate) fn notify<E: RadioEvents + ?Sized>(&self, events: &E) {
        match *self {
            InterruptOutcome::FrameReceived { len } => events.frame_received(len),
            InterruptOutcome::FrameDiscarded(reason) => events.frame_discarded(reason),
            InterruptOutcome::PacketSent => events.packet_sent(),
            InterruptOutcome::BusFault => events.bus_fault(),
            InterruptOutcome::FragmentReceived { .. }
            | InterruptOutcome::FragmentSent { .. }
            | InterruptOutcome::Spurious => {}
        }
    }
}

impl<H: Hal> RadioCore<H> {
    /// Service one interrupt. Never fails; bus errors become `BusFault`.
    pub(crate) fn service_interrupt(&mut self) -> InterruptOutcome {
        let result = match self.mode.current() {
            OperatingMode::Receive => self.service_receive(),
            OperatingMode::Transmit => self.service_transmit(),
            OperatingMode::Sleep | OperatingMode::Standby => Ok(InterruptOutcome::Spurious),
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                if self.fault_log.allow() {
                    error!("RFM69 interrupt in {} mode failed: {}", self.mode.current(), err);
                }
                InterruptOutcome::BusFault
            }
        }
    }

    fn service_receive(&mut self) -> Result<InterruptOutcome, HalError> {
        let flags = IrqFlags2::from_bits_retain(self.bus.read_register(REG_IRQFLAGS2)?);

        if flags.contains(IrqFlags2::FIFO_OVERRUN) {
            return self.discard_frame(DiscardReason::FifoOverrun);
        }
        if flags.contains(IrqFlags2::PAYLOAD_READY) {
            return self.finish_frame(flags);
        }
        if flags.contains(IrqFlags2::FIFO_LEVEL) {
            return self.drain_fragment();
        }
        Ok(InterruptOutcome::Spurious)
    }

    /// Length of the frame in progress, reading the length byte if this is
    /// its first event. `Err` carries a rejected length byte.
    fn frame_length(&mut self) -> Result<Result<usize, u8>, HalError> {
        if let Some(len) = self.rx.expected_len() {
            return Ok(Ok(len));
        }
        let len = self.bus.read_register(REG_FIFO)?;
        if usize::from(len) > self.policy.max_message_len {
            return Ok(Err(len));
        }
        self.rx.begin_frame(usize::from(len));
        Ok(Ok(usize::from(len)))
    }

    fn drain_fragment(&mut self) -> Result<InterruptOutcome, HalError> {
        if self.rx.is_valid() {
            return self.discard_frame(DiscardReason::Unconsumed);
        }

        // The length byte counts against the first fragment
        let budget = match self.rx.expected_len() {
            Some(_) => self.policy.fifo_threshold,
            None => self.policy.fifo_threshold - 1,
        };
        let expected = match self.frame_length()? {
            Ok(len) => len,
            Err(len) => return self.discard_frame(DiscardReason::LengthOutOfRange(len)),
        };

        let end = (self.rx.len() + budget).min(expected);
        let dest = self.rx.spare_to(end);
        let count = dest.len();
        self.bus.burst_read(REG_FIFO, dest)?;
        self.rx.advance(count);

        debug!("RFM69 rx fragment {}/{} bytes", self.rx.len(), expected);
        Ok(InterruptOutcome::FragmentReceived {
            buffered: self.rx.len(),
        })
    }

    fn finish_frame(&mut self, flags: IrqFlags2) -> Result<InterruptOutcome, HalError> {
        if self.rx.is_valid() {
            return self.discard_frame(DiscardReason::Unconsumed);
        }

        let expected = match self.frame_length()? {
            Ok(len) => len,
            Err(len) => return self.discard_frame(DiscardReason::LengthOutOfRange(len)),
        };
        if self.policy.crc && !flags.contains(IrqFlags2::CRC_OK) {
            return self.discard_frame(DiscardReason::CrcMismatch);
        }

        let dest = self.rx.spare_to(expected);
        let count = dest.len();
        self.bus.burst_read(REG_FIFO, dest)?;
        self.rx.advance(count);
        self.rx.complete();

        self.last_rssi = self.bus.read_register(REG_RSSIVALUE)?;
        self.stats.rx_good = self.stats.rx_good.wrapping_add(1);

        // Hold the frame until recv: no further reception in idle
        let idle = self.policy.idle_mode;
        self.set_mode(idle)?;

        debug!("RFM69 rx frame {} bytes, rssi raw {}", expected, self.last_rssi);
        Ok(InterruptOutcome::FrameReceived { len: expected })
    }

    fn discard_frame(&mut self, reason: DiscardReason) -> Result<InterruptOutcome, HalError> {
        self.stats.rx_bad = self.stats.rx_bad.wrapping_add(1);
        self.rx.clear();
        self.flush_fifo()?;
        self.set_mode(OperatingMode::Receive)?;

        if self.fault_log.allow() {
            warn!("RFM69 discarded frame: {:?}", reason);
        }
        Ok(InterruptOutcome::FrameDiscarded(reason))
    }

    fn service_transmit(&mut self) -> Result<InterruptOutcome, HalError> {
        let flags = IrqFlags2::from_bits_retain(self.bus.read_register(REG_IRQFLAGS2)?);

        if flags.contains(IrqFlags2::PACKET_SENT) {
            self.stats.tx_good = self.stats.tx_good.wrapping_add(1);
            self.tx.mark_sent();
            let next = self.policy.after_tx_mode;
            self.set_mode(next)?;
            debug!("RFM69 packet sent, now {}", next);
            return Ok(InterruptOutcome::PacketSent);
        }

        if !flags.contains(IrqFlags2::FIFO_LEVEL) && self.tx.remaining() > 0 {
            let chunk = self.policy.refill_chunk();
            self.push_fragment(chunk)?;
            return Ok(InterruptOutcome::FragmentSent {
                remaining: self.tx.remaining(),
            });
        }

        Ok(InterruptOutcome::Spurious)
    }
}
