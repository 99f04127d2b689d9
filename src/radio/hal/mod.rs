//! # Hardware Abstraction Layer for the RFM69
//!
//! The driver talks to the chip through the [`Hal`] trait: one SPI
//! transaction per call with chip select held for the header byte and the
//! data that follows it, plus the optional reset line.
//!
//! Two implementations ship with the crate:
//! - [`EmbeddedHal`]: any `embedded-hal` 1.0 `SpiDevice` plus an optional
//!   reset `OutputPin`
//! - [`SimulatedRfm69`]: a register-level chip model for tests and tooling

use thiserror::Error;

/// Errors that can occur during HAL operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HalError {
    #[error("SPI communication error")]
    Spi,

    #[error("GPIO operation error")]
    Gpio,
}

/// Hardware Abstraction Layer trait for RFM69 radio control
pub trait Hal {
    /// Clock out `header` followed by `data` in a single transaction.
    fn spi_write(&mut self, header: u8, data: &[u8]) -> Result<(), HalError>;

    /// Clock out `header`, then clock `buf.len()` bytes in.
    fn spi_read(&mut self, header: u8, buf: &mut [u8]) -> Result<(), HalError>;

    /// Drive the reset line. The RFM69 reset is active high.
    ///
    /// Boards without a reset line keep the default no-op.
    fn set_reset(&mut self, _asserted: bool) -> Result<(), HalError> {
        Ok(())
    }
}

pub mod embedded;
pub mod sim;

pub use embedded::{EmbeddedHal, NoResetPin};
pub use sim::{SimulatedRfm69, SpiTransaction};
