//! # Operating Mode Control
//!
//! Tracks the chip's operating mode and performs transitions with a
//! read-modify-write of RegOpMode so the sequencer and listen bits survive.
//! Each transition also routes DIO0 to the event the interrupt handler
//! expects in the new mode, and switches the RFM69H(W) high-power PA
//! registers in and out around Transmit when +20 dBm boost is active.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::bus::RegisterBus;
use super::hal::{Hal, HalError};
use super::registers::*;

/// Chip operating modes used by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    Sleep,
    Standby,
    Receive,
    Transmit,
}

impl OperatingMode {
    /// RegOpMode mode-field pattern
    pub const fn bits(self) -> u8 {
        match self {
            OperatingMode::Sleep => RF_OPMODE_SLEEP,
            OperatingMode::Standby => RF_OPMODE_STANDBY,
            OperatingMode::Transmit => RF_OPMODE_TRANSMITTER,
            OperatingMode::Receive => RF_OPMODE_RECEIVER,
        }
    }

    /// Decode the mode field of a RegOpMode value
    pub fn from_register(value: u8) -> Option<Self> {
        match value & RF_OPMODE_MODE_MASK {
            RF_OPMODE_SLEEP => Some(OperatingMode::Sleep),
            RF_OPMODE_STANDBY => Some(OperatingMode::Standby),
            RF_OPMODE_TRANSMITTER => Some(OperatingMode::Transmit),
            RF_OPMODE_RECEIVER => Some(OperatingMode::Receive),
            _ => None,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatingMode::Sleep => "sleep",
            OperatingMode::Standby => "standby",
            OperatingMode::Receive => "receive",
            OperatingMode::Transmit => "transmit",
        };
        f.write_str(name)
    }
}

/// Owner of the in-memory operating mode
#[derive(Debug)]
pub struct ModeController {
    current: OperatingMode,
    pa_boost: bool,
    boost_active: bool,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    /// Starts in Sleep, the mode the chip profile leaves the radio in.
    pub fn new() -> Self {
        Self {
            current: OperatingMode::Sleep,
            pa_boost: false,
            boost_active: false,
        }
    }

    pub fn current(&self) -> OperatingMode {
        self.current
    }

    pub fn pa_boost(&self) -> bool {
        self.pa_boost
    }

    /// Whether the boost values are currently written to RegTestPa1/2
    pub fn boost_active(&self) -> bool {
        self.boost_active
    }

    /// Record whether the high-power boost registers belong in Transmit.
    ///
    /// Takes effect on the next transition into or out of Transmit.
    pub fn set_pa_boost(&mut self, enabled: bool) {
        self.pa_boost = enabled;
    }

    /// Switch to `mode`. A no-op when already there.
    pub fn set_mode<H: Hal>(
        &mut self,
        bus: &mut RegisterBus<H>,
        mode: OperatingMode,
    ) -> Result<(), HalError> {
        if self.current == mode {
            return Ok(());
        }
        self.transition(bus, mode)
    }

    /// Write `mode` unconditionally, for when the chip state is unknown
    /// (after reset or while loading the chip profile).
    pub fn resync<H: Hal>(
        &mut self,
        bus: &mut RegisterBus<H>,
        mode: OperatingMode,
    ) -> Result<(), HalError> {
        self.transition(bus, mode)
    }

    fn transition<H: Hal>(
        &mut self,
        bus: &mut RegisterBus<H>,
        mode: OperatingMode,
    ) -> Result<(), HalError> {
        match mode {
            OperatingMode::Transmit => {
                if self.pa_boost {
                    bus.write_register(REG_TESTPA1, RF_TESTPA1_BOOST)?;
                    bus.write_register(REG_TESTPA2, RF_TESTPA2_BOOST)?;
                    self.boost_active = true;
                }
                bus.modify_register(REG_DIOMAPPING1, RF_DIOMAPPING1_DIO0_MASK, RF_DIOMAPPING1_DIO0_00)?;
            }
            OperatingMode::Receive => {
                self.restore_pa(bus)?;
                bus.modify_register(REG_DIOMAPPING1, RF_DIOMAPPING1_DIO0_MASK, RF_DIOMAPPING1_DIO0_01)?;
            }
            OperatingMode::Sleep | OperatingMode::Standby => self.restore_pa(bus)?,
        }

        bus.modify_register(REG_OPMODE, RF_OPMODE_MODE_MASK, mode.bits())?;
        debug!("RFM69 mode {} -> {}", self.current, mode);
        self.current = mode;
        Ok(())
    }

    // The boost settings must never stay active outside Transmit, even if
    // the power level changed while transmitting
    fn restore_pa<H: Hal>(&mut self, bus: &mut RegisterBus<H>) -> Result<(), HalError> {
        if self.boost_active {
            bus.write_register(REG_TESTPA1, RF_TESTPA1_NORMAL)?;
            bus.write_register(REG_TESTPA2, RF_TESTPA2_NORMAL)?;
            self.boost_active = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::hal::SimulatedRfm69;

    fn setup() -> (SimulatedRfm69, RegisterBus<SimulatedRfm69>, ModeController) {
        let chip = SimulatedRfm69::new();
        let bus = RegisterBus::new(chip.clone());
        (chip, bus, ModeController::new())
    }

    #[test]
    fn transition_preserves_unrelated_bits() {
        let (chip, mut bus, mut modes) = setup();
        chip.set_register(REG_OPMODE, RF_OPMODE_SEQUENCER_OFF | RF_OPMODE_LISTEN_ON | 0x03);

        modes.set_mode(&mut bus, OperatingMode::Receive).unwrap();
        assert_eq!(chip.register(REG_OPMODE), 0xC3 | RF_OPMODE_RECEIVER);

        modes.set_mode(&mut bus, OperatingMode::Transmit).unwrap();
        assert_eq!(chip.register(REG_OPMODE), 0xC3 | RF_OPMODE_TRANSMITTER);

        modes.set_mode(&mut bus, OperatingMode::Sleep).unwrap();
        assert_eq!(chip.register(REG_OPMODE), 0xC3);
        assert_eq!(modes.current(), OperatingMode::Sleep);
    }

    #[test]
    fn same_mode_is_noop() {
        let (chip, mut bus, mut modes) = setup();
        modes.set_mode(&mut bus, OperatingMode::Standby).unwrap();
        chip.clear_transactions();

        modes.set_mode(&mut bus, OperatingMode::Standby).unwrap();
        assert!(chip.transactions().is_empty());
    }

    #[test]
    fn resync_always_writes() {
        let (chip, mut bus, mut modes) = setup();
        modes.resync(&mut bus, OperatingMode::Sleep).unwrap();
        assert_eq!(chip.writes_to(REG_OPMODE), vec![RF_OPMODE_SLEEP]);
    }

    #[test]
    fn dio0_follows_mode() {
        let (chip, mut bus, mut modes) = setup();
        chip.set_register(REG_DIOMAPPING1, 0x0C);

        modes.set_mode(&mut bus, OperatingMode::Receive).unwrap();
        assert_eq!(chip.register(REG_DIOMAPPING1), 0x4C);

        modes.set_mode(&mut bus, OperatingMode::Transmit).unwrap();
        assert_eq!(chip.register(REG_DIOMAPPING1), 0x0C);
    }

    #[test]
    fn boost_registers_bracket_transmit() {
        let (chip, mut bus, mut modes) = setup();
        modes.set_pa_boost(true);

        modes.set_mode(&mut bus, OperatingMode::Transmit).unwrap();
        assert_eq!(chip.register(REG_TESTPA1), RF_TESTPA1_BOOST);
        assert_eq!(chip.register(REG_TESTPA2), RF_TESTPA2_BOOST);

        modes.set_mode(&mut bus, OperatingMode::Receive).unwrap();
        assert_eq!(chip.register(REG_TESTPA1), RF_TESTPA1_NORMAL);
        assert_eq!(chip.register(REG_TESTPA2), RF_TESTPA2_NORMAL);
    }

    #[test]
    fn boost_cleared_after_power_drop_mid_transmit() {
        let (chip, mut bus, mut modes) = setup();
        modes.set_pa_boost(true);
        modes.set_mode(&mut bus, OperatingMode::Transmit).unwrap();
        assert!(modes.boost_active());

        modes.set_pa_boost(false);
        modes.set_mode(&mut bus, OperatingMode::Receive).unwrap();
        assert_eq!(chip.register(REG_TESTPA1), RF_TESTPA1_NORMAL);
        assert_eq!(chip.register(REG_TESTPA2), RF_TESTPA2_NORMAL);
        assert!(!modes.boost_active());
    }

    #[test]
    fn failed_write_keeps_previous_mode() {
        let (chip, mut bus, mut modes) = setup();
        chip.fail_next(1);

        assert!(modes.set_mode(&mut bus, OperatingMode::Receive).is_err());
        assert_eq!(modes.current(), OperatingMode::Sleep);
    }

    #[test]
    fn decode_register_value() {
        assert_eq!(OperatingMode::from_register(0x84), Some(OperatingMode::Standby));
        assert_eq!(OperatingMode::from_register(0x10), Some(OperatingMode::Receive));
        assert_eq!(OperatingMode::from_register(0x08), None);
    }
}
