//! # RFM69 Error Handling
//!
//! This module defines the RadioError enum, returned by every caller-facing
//! driver operation. The interrupt path never returns errors; it reports
//! failures through its outcome and the log.

use thiserror::Error;

use crate::radio::hal::HalError;
use crate::radio::packet::PacketError;

/// Errors surfaced by the RFM69 driver
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RadioError {
    /// Indicates a failed SPI or GPIO transaction.
    #[error("HAL error: {0}")]
    Hal(#[from] HalError),

    /// Indicates that RegVersion did not identify an RFM69.
    #[error("Unsupported chip version 0x{version:02X}")]
    UnknownDevice { version: u8 },

    #[error("Refusing to send an empty payload")]
    EmptyPayload,

    #[error("Payload of {len} bytes exceeds maximum of {max}")]
    PayloadTooLong { len: usize, max: usize },

    /// Indicates that a bounded poll ran out of time.
    #[error("Timeout waiting for {0}")]
    Timeout(&'static str),

    #[error("Frequency {0} MHz out of range")]
    FrequencyOutOfRange(f32),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<PacketError> for RadioError {
    fn from(err: PacketError) -> Self {
        match err {
            PacketError::Capacity { requested, max } => RadioError::PayloadTooLong {
                len: requested,
                max,
            },
        }
    }
}

impl From<serde_json::Error> for RadioError {
    fn from(err: serde_json::Error) -> Self {
        RadioError::Config(err.to_string())
    }
}

impl From<hex::FromHexError> for RadioError {
    fn from(err: hex::FromHexError) -> Self {
        RadioError::Config(format!("AES key: {err}"))
    }
}
