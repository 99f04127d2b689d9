//! # Packet Buffers
//!
//! Fixed-capacity storage between the hardware FIFO and the caller. The
//! receive side assembles a frame fragment by fragment and flags it valid
//! once complete; the transmit side holds the outgoing frame and a cursor
//! over the bytes already pushed into the FIFO.
//!
//! Nothing here allocates, so the interrupt path can use these freely.

use thiserror::Error;

use super::registers::MAX_PACKET_SIZE;

/// Buffer-level errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    #[error("message of {requested} bytes exceeds maximum of {max}")]
    Capacity { requested: usize, max: usize },
}

/// Byte buffer bounded by a configured maximum message length
#[derive(Debug, Clone)]
pub struct PacketBuffer {
    data: [u8; MAX_PACKET_SIZE],
    len: usize,
    max_len: usize,
}

impl PacketBuffer {
    /// `max_len` is clamped to [`MAX_PACKET_SIZE`].
    pub fn new(max_len: usize) -> Self {
        Self {
            data: [0; MAX_PACKET_SIZE],
            len: 0,
            max_len: max_len.min(MAX_PACKET_SIZE),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append `bytes`, or fail without touching the buffer
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), PacketError> {
        let requested = self.len + bytes.len();
        if requested > self.max_len {
            return Err(PacketError::Capacity {
                requested,
                max: self.max_len,
            });
        }
        self.data[self.len..requested].copy_from_slice(bytes);
        self.len = requested;
        Ok(())
    }

    /// Writable region from the current length up to `end`
    pub(crate) fn spare_to(&mut self, end: usize) -> &mut [u8] {
        let end = end.clamp(self.len, self.max_len);
        &mut self.data[self.len..end]
    }

    /// Mark `count` bytes of the spare region as filled
    pub(crate) fn advance(&mut self, count: usize) {
        self.len = (self.len + count).min(self.max_len);
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.data[start.min(self.len)..end.min(self.len)]
    }
}

/// Receive-assembly role
#[derive(Debug, Clone)]
pub struct ReceiveBuffer {
    buf: PacketBuffer,
    expected: Option<usize>,
    valid: bool,
}

impl ReceiveBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: PacketBuffer::new(max_len),
            expected: None,
            valid: false,
        }
    }

    /// Drop any partial or complete frame
    pub fn clear(&mut self) {
        self.buf.clear();
        self.expected = None;
        self.valid = false;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.buf.max_len()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Frame length announced by the length byte, once it has been read
    pub fn expected_len(&self) -> Option<usize> {
        self.expected
    }

    /// A length byte has been read but the frame is not complete yet
    pub fn in_progress(&self) -> bool {
        self.expected.is_some() && !self.valid
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub(crate) fn begin_frame(&mut self, len: usize) {
        self.buf.clear();
        self.valid = false;
        self.expected = Some(len);
    }

    /// Region still to be filled for a frame of `end` bytes
    pub(crate) fn spare_to(&mut self, end: usize) -> &mut [u8] {
        self.buf.spare_to(end)
    }

    pub(crate) fn advance(&mut self, count: usize) {
        self.buf.advance(count);
    }

    pub(crate) fn complete(&mut self) {
        self.expected = None;
        self.valid = true;
    }

    /// Copy out at most `dest.len()` bytes of the frame, then clear.
    ///
    /// Returns the number of bytes copied. Bytes beyond `dest.len()` are lost.
    pub fn copy_out(&mut self, dest: &mut [u8]) -> usize {
        let count = dest.len().min(self.buf.len());
        dest[..count].copy_from_slice(&self.buf.as_slice()[..count]);
        self.clear();
        count
    }
}

/// Transmit-drain role
#[derive(Debug, Clone)]
pub struct TransmitBuffer {
    buf: PacketBuffer,
    sent: usize,
    packet_sent: bool,
}

impl TransmitBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: PacketBuffer::new(max_len),
            sent: 0,
            packet_sent: false,
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.sent = 0;
        self.packet_sent = false;
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<(), PacketError> {
        self.buf.append(bytes)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.buf.max_len()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Bytes already handed to the FIFO
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.sent
    }

    pub fn packet_sent(&self) -> bool {
        self.packet_sent
    }

    /// Next unsent bytes, at most `limit` of them
    pub(crate) fn next_chunk(&self, limit: usize) -> &[u8] {
        let end = self.sent + limit.min(self.remaining());
        self.buf.slice(self.sent, end)
    }

    pub(crate) fn advance(&mut self, count: usize) {
        self.sent = (self.sent + count).min(self.buf.len());
    }

    pub(crate) fn mark_sent(&mut self) {
        self.packet_sent = true;
    }
}

/// Diagnostic counters, only ever incremented by the interrupt handler
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RadioStats {
    /// Frames received intact
    pub rx_good: u32,
    /// Frames discarded (bad length, CRC, overrun)
    pub rx_bad: u32,
    /// Packets the chip reported as sent
    pub tx_good: u32,
}
