//! # RFM69 Radio
//!
//! Layers, leaf to root: [`hal`] (SPI and reset line), [`bus`] (register
//! access), [`mode`] (operating mode), [`packet`] (buffers and counters),
//! [`irq`] (interrupt handling), [`driver`] (caller API). [`config`],
//! [`modem`] and [`registers`] hold the static configuration data.

pub mod bus;
pub mod config;
pub mod driver;
pub mod hal;
pub mod irq;
pub mod mode;
pub mod modem;
pub mod packet;
pub mod registers;
mod shared;

pub use config::{frequency_to_frf, pa_settings, PaSettings, Rfm69Config};
pub use driver::{rssi_dbm, Rfm69};
pub use irq::{DiscardReason, InterruptOutcome, IrqFlags1, IrqFlags2, NoEvents, RadioEvents};
pub use mode::OperatingMode;
pub use modem::{ModemConfig, ModemPreset};
pub use packet::{PacketError, RadioStats};
