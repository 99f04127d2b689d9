//! # RFM69 Configuration
//!
//! Serde-backed driver configuration plus the static data `init` writes:
//! the chip profile table, carrier-frequency encoding and PA level encoding.
//!
//! Every field has a default, so a JSON file only needs the settings that
//! differ:
//!
//! ```json
//! { "frequency_mhz": 915.0, "tx_power_dbm": 17, "high_power": true }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::modem::ModemPreset;
use super::mode::OperatingMode;
use super::registers::*;
use crate::error::RadioError;

/// Lowest carrier frequency the synthesizer covers
pub const MIN_FREQUENCY_MHZ: f32 = 290.0;
/// Highest carrier frequency the synthesizer covers
pub const MAX_FREQUENCY_MHZ: f32 = 1020.0;
/// Widest accepted AFC pull-in range
pub const MAX_AFC_PULL_IN_MHZ: f32 = 0.31875;

/// Static register settings applied by `init` before the configurable ones.
///
/// Modulation, frequency, PA, sync, packet format, payload length and FIFO
/// threshold are written afterwards from [`Rfm69Config`].
pub const CHIP_PROFILE: &[(u8, u8)] = &[
    (REG_OCP, RF_OCP_ON_95MA),
    (REG_LNA, RF_LNA_ZIN_200),
    (REG_DIOMAPPING1, RF_DIOMAPPING1_DIO0_01),
    // ClkOut off
    (REG_DIOMAPPING2, 0x07),
    // -114 dBm
    (REG_RSSITHRESH, 0xE4),
    (REG_PACKETCONFIG2, RF_PACKET2_RXRESTARTDELAY_2BITS | RF_PACKET2_AUTORXRESTART_ON),
    (REG_TESTDAGC, RF_DAGC_IMPROVED_LOWBETA0),
];

/// Configuration for the RFM69 driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rfm69Config {
    /// Carrier frequency in MHz
    pub frequency_mhz: f32,
    /// AFC pull-in range in MHz; zero disables automatic AFC
    pub afc_pull_in_mhz: f32,
    pub modem: ModemPreset,
    pub tx_power_dbm: i8,
    /// RFM69H(W) module with PA1/PA2 on PA_BOOST
    pub high_power: bool,
    /// Largest payload accepted or received, excluding the length byte
    pub max_message_len: u8,
    /// FIFO level that raises FifoLevel and paces fragmentation
    pub fifo_threshold: u8,
    /// Mode entered after init and after a frame has been received
    pub idle_mode: OperatingMode,
    /// Mode entered once a packet has been sent
    pub after_tx_mode: OperatingMode,
    /// Empty disables sync word detection
    pub sync_words: Vec<u8>,
    /// Preamble length in bytes
    pub preamble_len: u16,
    pub crc: bool,
    /// 16-byte AES-128 key as hex
    pub aes_key: Option<String>,
    pub poll_timeout_ms: u64,
    pub poll_interval_us: u64,
    /// Pulse the reset line at the start of init
    pub reset_on_init: bool,
}

impl Default for Rfm69Config {
    fn default() -> Self {
        Self {
            frequency_mhz: 869.5,
            afc_pull_in_mhz: 0.05,
            modem: ModemPreset::default(),
            tx_power_dbm: 10,
            high_power: false,
            max_message_len: 65,
            fifo_threshold: 15,
            idle_mode: OperatingMode::Standby,
            after_tx_mode: OperatingMode::Receive,
            sync_words: vec![0x2D, 0xD4],
            preamble_len: 4,
            crc: true,
            aes_key: None,
            poll_timeout_ms: 500,
            poll_interval_us: 200,
            reset_on_init: true,
        }
    }
}

impl Rfm69Config {
    pub fn from_json(json: &str) -> Result<Self, RadioError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RadioError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RadioError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), RadioError> {
        if self.max_message_len == 0 {
            return Err(RadioError::Config("max_message_len must be at least 1".into()));
        }
        if self.fifo_threshold == 0 || usize::from(self.fifo_threshold) >= FIFO_SIZE - 1 {
            return Err(RadioError::Config(format!(
                "fifo_threshold must be between 1 and {}",
                FIFO_SIZE - 2
            )));
        }
        if self.idle_mode == OperatingMode::Transmit || self.after_tx_mode == OperatingMode::Transmit {
            return Err(RadioError::Config(
                "idle_mode and after_tx_mode cannot be transmit".into(),
            ));
        }
        if self.sync_words.len() > 8 {
            return Err(RadioError::Config(format!(
                "at most 8 sync bytes, got {}",
                self.sync_words.len()
            )));
        }
        if !(0.0..=MAX_AFC_PULL_IN_MHZ).contains(&self.afc_pull_in_mhz) {
            return Err(RadioError::Config(format!(
                "afc_pull_in_mhz must be between 0 and {MAX_AFC_PULL_IN_MHZ}"
            )));
        }
        if self.poll_timeout_ms == 0 {
            return Err(RadioError::Config("poll_timeout_ms must be positive".into()));
        }
        if self.aes_key_bytes()?.is_some() && usize::from(self.max_message_len) > MAX_AES_PAYLOAD {
            return Err(RadioError::Config(format!(
                "AES limits max_message_len to {MAX_AES_PAYLOAD}"
            )));
        }
        frequency_to_frf(self.frequency_mhz)?;
        Ok(())
    }

    /// Decoded AES key, if one is configured
    pub fn aes_key_bytes(&self) -> Result<Option<Zeroizing<[u8; 16]>>, RadioError> {
        let Some(key_hex) = &self.aes_key else {
            return Ok(None);
        };
        let mut key = Zeroizing::new([0u8; 16]);
        hex::decode_to_slice(key_hex, &mut key[..])?;
        Ok(Some(key))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }
}

/// Carrier frequency register value for `mhz`
pub fn frequency_to_frf(mhz: f32) -> Result<u32, RadioError> {
    if !(MIN_FREQUENCY_MHZ..=MAX_FREQUENCY_MHZ).contains(&mhz) {
        return Err(RadioError::FrequencyOutOfRange(mhz));
    }
    Ok((f64::from(mhz) * 1_000_000.0 / FSTEP).round() as u32)
}

/// RegFrfMsb, RegFrfMid, RegFrfLsb
pub fn frf_bytes(frf: u32) -> [u8; 3] {
    let [_, msb, mid, lsb] = frf.to_be_bytes();
    [msb, mid, lsb]
}

/// PA register settings for an output power
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaSettings {
    /// Power actually programmed after clamping
    pub dbm: i8,
    /// RegPaLevel
    pub pa_level: u8,
    /// RegOcp
    pub ocp: u8,
    /// High-power test registers needed in Transmit
    pub boost: bool,
}

/// Encode `dbm` for an RFM69 (PA0, -18..=13 dBm) or RFM69H(W)
/// (PA1/PA2, -2..=20 dBm). Out-of-range requests are clamped.
pub fn pa_settings(dbm: i8, high_power: bool) -> PaSettings {
    if !high_power {
        let dbm = dbm.clamp(-18, 13);
        return PaSettings {
            dbm,
            pa_level: RF_PALEVEL_PA0_ON | pa_output(dbm + 18),
            ocp: RF_OCP_ON_95MA,
            boost: false,
        };
    }

    let dbm = dbm.clamp(-2, 20);
    let (pa_level, boost) = match dbm {
        -2..=13 => (RF_PALEVEL_PA1_ON | pa_output(dbm + 18), false),
        14..=17 => (RF_PALEVEL_PA1_ON | RF_PALEVEL_PA2_ON | pa_output(dbm + 14), false),
        _ => (RF_PALEVEL_PA1_ON | RF_PALEVEL_PA2_ON | pa_output(dbm + 11), true),
    };
    PaSettings {
        dbm,
        pa_level,
        ocp: if boost { RF_OCP_OFF } else { RF_OCP_ON_95MA },
        boost,
    }
}

fn pa_output(level: i8) -> u8 {
    (level.max(0) as u8) & RF_PALEVEL_OUTPUT_MASK
}
