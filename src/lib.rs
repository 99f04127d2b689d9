//! # rfm69-radio - Interrupt-driven driver for the HopeRF RFM69 packet radio
//!
//! Sends and receives variable-length datagrams through the RFM69 / RFM69H(W)
//! (Semtech SX1231) over SPI. The chip's 66-byte FIFO is fed and drained from
//! the interrupt handler, so messages up to 255 bytes go out and come in as
//! fragments without the caller noticing.
//!
//! ## Features
//!
//! - Fragmented transmit and receive paced by the FIFO threshold
//! - Mode tracking with DIO routing and RFM69H(W) high-power PA handling
//! - FSK, GFSK and OOK modem presets, carrier and power configuration
//! - Hardware CRC, sync words and AES-128
//! - Critical-section protected state shared with the interrupt routine
//! - `embedded-hal` 1.0 adapter and a simulated chip for tests and tooling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rfm69_radio::{Rfm69, Rfm69Config, SimulatedRfm69};
//!
//! let config = Rfm69Config::from_json(r#"{ "frequency_mhz": 868.3 }"#)?;
//! let radio = Rfm69::new(SimulatedRfm69::new(), config)?;
//! radio.init()?;
//! radio.send(&[0x01, 0x02, 0x03])?;
//! # Ok::<(), rfm69_radio::RadioError>(())
//! ```

pub mod error;
pub mod logging;
pub mod radio;

pub use crate::error::RadioError;
pub use crate::logging::{init_logger, LogThrottle};

pub use radio::hal::{EmbeddedHal, Hal, HalError, NoResetPin, SimulatedRfm69};
pub use radio::{
    DiscardReason, InterruptOutcome, IrqFlags2, ModemConfig, ModemPreset, NoEvents,
    OperatingMode, RadioEvents, RadioStats, Rfm69, Rfm69Config,
};
