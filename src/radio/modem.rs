//! # Modem Presets
//!
//! Canned modulation settings: bit rate, frequency deviation, receiver and
//! AFC bandwidth, and the DC-free encoding in RegPacketConfig1. FSK presets
//! use no shaping, GFSK presets use Gaussian BT = 1.0, OOK presets use a
//! fixed receiver bandwidth and no deviation.

use serde::{Deserialize, Serialize};

use super::registers::*;

const FSK: u8 = RF_DATAMODUL_PACKET | RF_DATAMODUL_FSK;
const GFSK: u8 = RF_DATAMODUL_PACKET | RF_DATAMODUL_FSK | RF_DATAMODUL_SHAPING_BT_1_0;
const OOK: u8 = RF_DATAMODUL_PACKET | RF_DATAMODUL_OOK;
const WHITE: u8 = RF_PACKET1_FORMAT_VARIABLE | RF_PACKET1_DCFREE_WHITENING | RF_PACKET1_CRC_ON;

/// Raw modem register values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModemConfig {
    /// RegDataModul
    pub data_modul: u8,
    /// RegBitrateMsb/Lsb
    pub bitrate: u16,
    /// RegFdevMsb/Lsb
    pub fdev: u16,
    /// RegRxBw
    pub rx_bw: u8,
    /// RegAfcBw
    pub afc_bw: u8,
    /// RegPacketConfig1 (format and DC-free bits are taken from here)
    pub packet_config1: u8,
}

impl ModemConfig {
    const fn new(data_modul: u8, bitrate: u16, fdev: u16, bw: u8, packet_config1: u8) -> Self {
        Self {
            data_modul,
            bitrate,
            fdev,
            rx_bw: bw,
            afc_bw: bw,
            packet_config1,
        }
    }

    pub fn bit_rate_bps(&self) -> u32 {
        if self.bitrate == 0 {
            return 0;
        }
        (FXOSC / f64::from(self.bitrate)).round() as u32
    }

    pub fn deviation_hz(&self) -> u32 {
        (f64::from(self.fdev) * FSTEP).round() as u32
    }

    /// RegDataModul through RegFdevLsb, in register order for one burst write
    pub fn modulation_block(&self) -> [u8; 5] {
        let [br_msb, br_lsb] = self.bitrate.to_be_bytes();
        let [fd_msb, fd_lsb] = self.fdev.to_be_bytes();
        [self.data_modul, br_msb, br_lsb, fd_msb, fd_lsb]
    }
}

/// Named modem presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModemPreset {
    FskRb2Fd5,
    FskRb2_4Fd4_8,
    FskRb4_8Fd9_6,
    FskRb9_6Fd19_2,
    FskRb19_2Fd38_4,
    FskRb38_4Fd76_8,
    FskRb57_6Fd120,
    FskRb125Fd125,
    FskRb250Fd250,
    FskRb55555Fd50,

    GfskRb2Fd5,
    GfskRb2_4Fd4_8,
    GfskRb4_8Fd9_6,
    GfskRb9_6Fd19_2,
    GfskRb19_2Fd38_4,
    GfskRb38_4Fd76_8,
    GfskRb57_6Fd120,
    GfskRb125Fd125,
    GfskRb250Fd250,
    GfskRb55555Fd50,

    OokRb1Bw1,
    OokRb1_2Bw75,
    OokRb2_4Bw4_8,
    OokRb4_8Bw9_6,
    OokRb9_6Bw19_2,
    OokRb19_2Bw38_4,
    OokRb32Bw64,
}

impl Default for ModemPreset {
    fn default() -> Self {
        ModemPreset::FskRb2Fd5
    }
}

impl ModemPreset {
    pub const ALL: [ModemPreset; 27] = [
        ModemPreset::FskRb2Fd5,
        ModemPreset::FskRb2_4Fd4_8,
        ModemPreset::FskRb4_8Fd9_6,
        ModemPreset::FskRb9_6Fd19_2,
        ModemPreset::FskRb19_2Fd38_4,
        ModemPreset::FskRb38_4Fd76_8,
        ModemPreset::FskRb57_6Fd120,
        ModemPreset::FskRb125Fd125,
        ModemPreset::FskRb250Fd250,
        ModemPreset::FskRb55555Fd50,
        ModemPreset::GfskRb2Fd5,
        ModemPreset::GfskRb2_4Fd4_8,
        ModemPreset::GfskRb4_8Fd9_6,
        ModemPreset::GfskRb9_6Fd19_2,
        ModemPreset::GfskRb19_2Fd38_4,
        ModemPreset::GfskRb38_4Fd76_8,
        ModemPreset::GfskRb57_6Fd120,
        ModemPreset::GfskRb125Fd125,
        ModemPreset::GfskRb250Fd250,
        ModemPreset::GfskRb55555Fd50,
        ModemPreset::OokRb1Bw1,
        ModemPreset::OokRb1_2Bw75,
        ModemPreset::OokRb2_4Bw4_8,
        ModemPreset::OokRb4_8Bw9_6,
        ModemPreset::OokRb9_6Bw19_2,
        ModemPreset::OokRb19_2Bw38_4,
        ModemPreset::OokRb32Bw64,
    ];

    pub const fn config(self) -> ModemConfig {
        use ModemPreset::*;
        match self {
            FskRb2Fd5 => ModemConfig::new(FSK, 0x3E80, 0x0052, 0xF4, WHITE),
            FskRb2_4Fd4_8 => ModemConfig::new(FSK, 0x3415, 0x004F, 0xF4, WHITE),
            FskRb4_8Fd9_6 => ModemConfig::new(FSK, 0x1A0B, 0x009D, 0xF4, WHITE),
            FskRb9_6Fd19_2 => ModemConfig::new(FSK, 0x0D05, 0x013B, 0xF4, WHITE),
            FskRb19_2Fd38_4 => ModemConfig::new(FSK, 0x0683, 0x0275, 0xF3, WHITE),
            FskRb38_4Fd76_8 => ModemConfig::new(FSK, 0x0341, 0x04EA, 0xF2, WHITE),
            FskRb57_6Fd120 => ModemConfig::new(FSK, 0x022C, 0x07AE, 0xE2, WHITE),
            FskRb125Fd125 => ModemConfig::new(FSK, 0x0100, 0x0800, 0xE1, WHITE),
            FskRb250Fd250 => ModemConfig::new(FSK, 0x0080, 0x1000, 0xE0, WHITE),
            FskRb55555Fd50 => ModemConfig::new(FSK, 0x0240, 0x0333, 0x42, WHITE),

            GfskRb2Fd5 => ModemConfig::new(GFSK, 0x3E80, 0x0052, 0xF4, WHITE),
            GfskRb2_4Fd4_8 => ModemConfig::new(GFSK, 0x3415, 0x004F, 0xF4, WHITE),
            GfskRb4_8Fd9_6 => ModemConfig::new(GFSK, 0x1A0B, 0x009D, 0xF4, WHITE),
            GfskRb9_6Fd19_2 => ModemConfig::new(GFSK, 0x0D05, 0x013B, 0xF4, WHITE),
            GfskRb19_2Fd38_4 => ModemConfig::new(GFSK, 0x0683, 0x0275, 0xF3, WHITE),
            GfskRb38_4Fd76_8 => ModemConfig::new(GFSK, 0x0341, 0x04EA, 0xF2, WHITE),
            GfskRb57_6Fd120 => ModemConfig::new(GFSK, 0x022C, 0x07AE, 0xE2, WHITE),
            GfskRb125Fd125 => ModemConfig::new(GFSK, 0x0100, 0x0800, 0xE1, WHITE),
            GfskRb250Fd250 => ModemConfig::new(GFSK, 0x0080, 0x1000, 0xE0, WHITE),
            GfskRb55555Fd50 => ModemConfig::new(GFSK, 0x0240, 0x0333, 0x42, WHITE),

            OokRb1Bw1 => ModemConfig::new(OOK, 0x7D00, 0x0010, 0x88, WHITE),
            OokRb1_2Bw75 => ModemConfig::new(OOK, 0x682B, 0x0010, 0xF1, WHITE),
            OokRb2_4Bw4_8 => ModemConfig::new(OOK, 0x3415, 0x0010, 0xF5, WHITE),
            OokRb4_8Bw9_6 => ModemConfig::new(OOK, 0x1A0B, 0x0010, 0xF4, WHITE),
            OokRb9_6Bw19_2 => ModemConfig::new(OOK, 0x0D05, 0x0010, 0xF3, WHITE),
            OokRb19_2Bw38_4 => ModemConfig::new(OOK, 0x0683, 0x0010, 0xF2, WHITE),
            OokRb32Bw64 => ModemConfig::new(OOK, 0x03E8, 0x0010, 0xE2, WHITE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_is_2kbps() {
        let cfg = ModemPreset::default().config();
        assert_eq!(cfg.bit_rate_bps(), 2000);
        assert_eq!(cfg.deviation_hz(), 5005);
        assert_eq!(cfg.modulation_block(), [0x00, 0x3E, 0x80, 0x00, 0x52]);
    }

    #[test]
    fn families_differ_only_in_modulation() {
        let fsk = ModemPreset::FskRb9_6Fd19_2.config();
        let gfsk = ModemPreset::GfskRb9_6Fd19_2.config();
        assert_eq!(fsk.bitrate, gfsk.bitrate);
        assert_eq!(fsk.fdev, gfsk.fdev);
        assert_eq!(gfsk.data_modul, 0x01);

        let ook = ModemPreset::OokRb9_6Bw19_2.config();
        assert_eq!(ook.data_modul, 0x08);
    }

    #[test]
    fn every_preset_uses_variable_length_packets() {
        for preset in ModemPreset::ALL {
            let cfg = preset.config();
            assert_ne!(cfg.packet_config1 & RF_PACKET1_FORMAT_VARIABLE, 0, "{preset:?}");
            assert!(cfg.bit_rate_bps() >= 1000, "{preset:?}");
        }
    }

    #[test]
    fn high_rate_presets() {
        assert_eq!(ModemPreset::FskRb250Fd250.config().bit_rate_bps(), 250_000);
        assert_eq!(ModemPreset::FskRb125Fd125.config().deviation_hz(), 125_000);
    }
}
