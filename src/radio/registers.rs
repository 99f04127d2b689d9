//! # RFM69 Register Definitions and Constants
//!
//! Register addresses and bit fields for the HopeRF RFM69 / RFM69H(W)
//! transceiver (Semtech SX1231 core).
//!
//! ## Register Map
//!
//! - 0x00-0x0F: FIFO, operating mode, modulation, bit rate, carrier frequency
//! - 0x10-0x24: version, PA, receiver bandwidth, AFC/FEI, RSSI
//! - 0x25-0x3D: DIO mapping, IRQ flags, preamble, sync word, packet engine
//! - 0x3E-0x4F: AES key and temperature sensor
//! - 0x5A-0x6F: test registers (high-power PA, DAGC)

// =============================================================================
// Register Addresses
// =============================================================================

/// FIFO read/write access register
pub const REG_FIFO: u8 = 0x00;

/// Operating mode, sequencer and listen control
pub const REG_OPMODE: u8 = 0x01;

/// Data processing mode and modulation scheme
pub const REG_DATAMODUL: u8 = 0x02;

pub const REG_BITRATEMSB: u8 = 0x03;
pub const REG_BITRATELSB: u8 = 0x04;
pub const REG_FDEVMSB: u8 = 0x05;
pub const REG_FDEVLSB: u8 = 0x06;

/// Carrier frequency (MSB, MID, LSB follow at consecutive addresses)
pub const REG_FRFMSB: u8 = 0x07;
pub const REG_FRFMID: u8 = 0x08;
pub const REG_FRFLSB: u8 = 0x09;

/// Silicon revision
pub const REG_VERSION: u8 = 0x10;

/// PA selection and output power
pub const REG_PALEVEL: u8 = 0x11;

/// Over-current protection
pub const REG_OCP: u8 = 0x13;

pub const REG_LNA: u8 = 0x18;
pub const REG_RXBW: u8 = 0x19;
pub const REG_AFCBW: u8 = 0x1A;
pub const REG_AFCFEI: u8 = 0x1E;
pub const REG_RSSICONFIG: u8 = 0x23;
pub const REG_RSSIVALUE: u8 = 0x24;
pub const REG_DIOMAPPING1: u8 = 0x25;
pub const REG_DIOMAPPING2: u8 = 0x26;
pub const REG_IRQFLAGS1: u8 = 0x27;
pub const REG_IRQFLAGS2: u8 = 0x28;
pub const REG_RSSITHRESH: u8 = 0x29;
pub const REG_PREAMBLEMSB: u8 = 0x2C;
pub const REG_PREAMBLELSB: u8 = 0x2D;
pub const REG_SYNCCONFIG: u8 = 0x2E;

/// First of eight sync word bytes
pub const REG_SYNCVALUE1: u8 = 0x2F;

pub const REG_PACKETCONFIG1: u8 = 0x37;
pub const REG_PAYLOADLENGTH: u8 = 0x38;
pub const REG_FIFOTHRESH: u8 = 0x3C;
pub const REG_PACKETCONFIG2: u8 = 0x3D;

/// First of sixteen AES key bytes
pub const REG_AESKEY1: u8 = 0x3E;

pub const REG_TEMP1: u8 = 0x4E;
pub const REG_TEMP2: u8 = 0x4F;

/// High-power PA test registers (RFM69H(W) only)
pub const REG_TESTPA1: u8 = 0x5A;
pub const REG_TESTPA2: u8 = 0x5C;

pub const REG_TESTDAGC: u8 = 0x6F;

// =============================================================================
// RegOpMode
// =============================================================================

/// Mode bits within RegOpMode
pub const RF_OPMODE_MODE_MASK: u8 = 0x1C;

pub const RF_OPMODE_SEQUENCER_OFF: u8 = 0x80;
pub const RF_OPMODE_LISTEN_ON: u8 = 0x40;

pub const RF_OPMODE_SLEEP: u8 = 0x00;
pub const RF_OPMODE_STANDBY: u8 = 0x04;
pub const RF_OPMODE_TRANSMITTER: u8 = 0x0C;
pub const RF_OPMODE_RECEIVER: u8 = 0x10;

// =============================================================================
// RegDataModul
// =============================================================================

pub const RF_DATAMODUL_PACKET: u8 = 0x00;
pub const RF_DATAMODUL_FSK: u8 = 0x00;
pub const RF_DATAMODUL_OOK: u8 = 0x08;
pub const RF_DATAMODUL_SHAPING_BT_1_0: u8 = 0x01;

// =============================================================================
// RegPaLevel / RegOcp / test registers
// =============================================================================

pub const RF_PALEVEL_PA0_ON: u8 = 0x80;
pub const RF_PALEVEL_PA1_ON: u8 = 0x40;
pub const RF_PALEVEL_PA2_ON: u8 = 0x20;
pub const RF_PALEVEL_OUTPUT_MASK: u8 = 0x1F;

pub const RF_OCP_ON_95MA: u8 = 0x1A;
pub const RF_OCP_OFF: u8 = 0x0F;

pub const RF_TESTPA1_NORMAL: u8 = 0x55;
pub const RF_TESTPA1_BOOST: u8 = 0x5D;
pub const RF_TESTPA2_NORMAL: u8 = 0x70;
pub const RF_TESTPA2_BOOST: u8 = 0x7C;

/// Improved margin for low modulation index (AfcLowBetaOn = 0)
pub const RF_DAGC_IMPROVED_LOWBETA0: u8 = 0x30;

pub const RF_LNA_ZIN_200: u8 = 0x88;

// =============================================================================
// RegAfcFei / RegRssiConfig
// =============================================================================

pub const RF_AFCFEI_AFCAUTO_ON: u8 = 0x04;

pub const RF_RSSI_START: u8 = 0x01;
pub const RF_RSSI_DONE: u8 = 0x02;

// =============================================================================
// RegDioMapping1
// =============================================================================

/// DIO0 field within RegDioMapping1
pub const RF_DIOMAPPING1_DIO0_MASK: u8 = 0xC0;

/// DIO0 = PacketSent in Transmit
pub const RF_DIOMAPPING1_DIO0_00: u8 = 0x00;

/// DIO0 = PayloadReady in Receive
pub const RF_DIOMAPPING1_DIO0_01: u8 = 0x40;

// =============================================================================
// RegSyncConfig / RegPacketConfig1 / RegPacketConfig2 / RegFifoThresh
// =============================================================================

pub const RF_SYNC_ON: u8 = 0x80;
pub const RF_SYNC_SIZE_SHIFT: u8 = 3;

pub const RF_PACKET1_FORMAT_VARIABLE: u8 = 0x80;
pub const RF_PACKET1_DCFREE_MASK: u8 = 0x60;
pub const RF_PACKET1_DCFREE_OFF: u8 = 0x00;
pub const RF_PACKET1_DCFREE_MANCHESTER: u8 = 0x20;
pub const RF_PACKET1_DCFREE_WHITENING: u8 = 0x40;
pub const RF_PACKET1_CRC_ON: u8 = 0x10;
pub const RF_PACKET1_CRCAUTOCLEAR_OFF: u8 = 0x08;

pub const RF_PACKET2_RXRESTARTDELAY_2BITS: u8 = 0x10;
pub const RF_PACKET2_AUTORXRESTART_ON: u8 = 0x02;
pub const RF_PACKET2_AES_ON: u8 = 0x01;

pub const RF_FIFOTHRESH_TXSTART_FIFONOTEMPTY: u8 = 0x80;
pub const RF_FIFOTHRESH_VALUE_MASK: u8 = 0x7F;

// =============================================================================
// RegTemp1
// =============================================================================

pub const RF_TEMP1_MEAS_START: u8 = 0x08;
pub const RF_TEMP1_MEAS_RUNNING: u8 = 0x04;

// =============================================================================
// Chip Constants
// =============================================================================

/// Crystal oscillator frequency in Hz
pub const FXOSC: f64 = 32_000_000.0;

/// Frequency synthesizer step: FXOSC / 2^19 Hz
pub const FSTEP: f64 = 61.03515625;

/// Hardware FIFO depth in bytes
pub const FIFO_SIZE: usize = 66;

/// Largest frame a single length-prefix byte can describe
pub const MAX_PACKET_SIZE: usize = 255;

/// Largest payload the AES engine accepts in variable-length mode
pub const MAX_AES_PAYLOAD: usize = 64;

/// RegVersion values reported by supported silicon
pub const SUPPORTED_VERSIONS: [u8; 2] = [0x23, 0x24];

/// Number of addressable registers
pub const REGISTER_COUNT: usize = 0x80;
