//! # RFM69 Driver
//!
//! [`Rfm69`] is the caller-facing half of the driver. All state shared with
//! the interrupt handler sits in a single `critical_section::Mutex`, and
//! every method takes `&self`, so one instance can live in a `static` (or an
//! `Arc`) and be reached from both the application and the interrupt
//! routine:
//!
//! ```rust,no_run
//! use rfm69_radio::{Rfm69, Rfm69Config, SimulatedRfm69};
//!
//! let radio = Rfm69::new(SimulatedRfm69::new(), Rfm69Config::default())?;
//! radio.init()?;
//! radio.send(b"hello")?;
//!
//! // From the DIO0/DIO1 interrupt routine:
//! radio.handle_interrupt();
//!
//! let mut buf = [0u8; 65];
//! if let Some(len) = radio.recv(&mut buf)? {
//!     println!("got {:?}", &buf[..len]);
//! }
//! # Ok::<(), rfm69_radio::RadioError>(())
//! ```
//!
//! Waiting (for a previous transmission, an RSSI measurement, mode ready)
//! happens only here in caller context. Each poll takes the critical section
//! briefly, then sleeps for `poll_interval_us`; the whole wait gives up with
//! [`RadioError::Timeout`] after `poll_timeout_ms`.

use std::cell::RefCell;
use std::thread;
use std::time::{Duration, Instant};

use critical_section::Mutex;
use log::{debug, error, info, warn};

use super::config::{frequency_to_frf, Rfm69Config, CHIP_PROFILE, MAX_AFC_PULL_IN_MHZ};
use super::shared::{FramePolicy, RadioCore};
use super::hal::Hal;
use super::irq::{InterruptOutcome, IrqFlags1, NoEvents, RadioEvents};
use super::mode::OperatingMode;
use super::modem::{ModemConfig, ModemPreset};
use super::packet::RadioStats;
use super::registers::*;
use crate::error::RadioError;

/// Offset of the uncalibrated temperature sensor reading
const TEMPERATURE_OFFSET: i16 = 166;

/// Convert a raw RegRssiValue reading to dBm
pub fn rssi_dbm(raw: u8) -> i16 {
    -i16::from(raw) >> 1
}

/// Interrupt-driven RFM69 packet radio
pub struct Rfm69<H, E = NoEvents> {
    core: Mutex<RefCell<RadioCore<H>>>,
    events: E,
    config: Rfm69Config,
}

impl<H: Hal> Rfm69<H, NoEvents> {
    /// Create a driver without event callbacks. Touches no registers;
    /// call [`init`](Self::init) before use.
    pub fn new(hal: H, config: Rfm69Config) -> Result<Self, RadioError> {
        Self::with_events(hal, config, NoEvents)
    }
}

impl<H: Hal, E: RadioEvents> Rfm69<H, E> {
    /// Create a driver that reports interrupt outcomes to `events`
    pub fn with_events(hal: H, config: Rfm69Config, events: E) -> Result<Self, RadioError> {
        config.validate()?;
        let policy = FramePolicy {
            max_message_len: usize::from(config.max_message_len),
            fifo_threshold: usize::from(config.fifo_threshold),
            crc: config.crc,
            idle_mode: config.idle_mode,
            after_tx_mode: config.after_tx_mode,
        };

        Ok(Self {
            core: Mutex::new(RefCell::new(RadioCore::new(hal, policy))),
            events,
            config,
        })
    }

    fn with_core<R>(&self, f: impl FnOnce(&mut RadioCore<H>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.core.borrow_ref_mut(cs)))
    }

    /// Poll `check` until it yields a value or the configured timeout expires
    fn poll_until<T>(
        &self,
        what: &'static str,
        mut check: impl FnMut(&mut RadioCore<H>) -> Result<Option<T>, RadioError>,
    ) -> Result<T, RadioError> {
        let start = Instant::now();
        let timeout = self.config.poll_timeout();

        loop {
            if let Some(value) = self.with_core(&mut check)? {
                return Ok(value);
            }
            if start.elapsed() >= timeout {
                warn!("RFM69 timed out after {:?} waiting for {}", timeout, what);
                return Err(RadioError::Timeout(what));
            }
            thread::sleep(self.config.poll_interval());
        }
    }

    pub fn config(&self) -> &Rfm69Config {
        &self.config
    }

    /// Pulse the reset line. The chip returns to its power-on state, so
    /// [`init`](Self::init) must run again afterwards.
    pub fn reset(&self) -> Result<(), RadioError> {
        self.with_core(|core| core.bus.hal_mut().set_reset(true))?;
        thread::sleep(Duration::from_micros(100));
        self.with_core(|core| core.bus.hal_mut().set_reset(false))?;
        thread::sleep(Duration::from_millis(5));
        Ok(())
    }

    /// Initialize the radio
    ///
    /// Checks the chip version, loads the chip profile and every configured
    /// setting, then enters the idle mode and waits for ModeReady.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Radio is configured and idle
    /// * `Err(RadioError::UnknownDevice)` - RegVersion did not match
    /// * `Err(RadioError::Hal)` - Bus failure
    /// * `Err(RadioError::Timeout)` - The chip never reported ModeReady
    pub fn init(&self) -> Result<(), RadioError> {
        if self.config.reset_on_init {
            self.reset()?;
        }

        let version = self.device_version()?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            error!("RFM69 not found: RegVersion reads 0x{:02X}", version);
            return Err(RadioError::UnknownDevice { version });
        }

        let config = &self.config;
        let frf = frequency_to_frf(config.frequency_mhz)?;
        let key = config.aes_key_bytes()?;
        let modem = config.modem.config();

        let pa = self.with_core(|core| {
            core.rx.clear();
            core.tx.clear();
            core.mode.resync(&mut core.bus, OperatingMode::Sleep)?;
            core.write_chip_profile(CHIP_PROFILE)?;
            core.write_modem_config(&modem)?;
            core.write_frequency(frf, config.afc_pull_in_mhz > 0.0)?;
            let pa = core.write_tx_power(config.tx_power_dbm, config.high_power)?;
            core.write_sync_words(&config.sync_words)?;
            core.write_preamble_length(config.preamble_len)?;
            core.write_payload_limits()?;
            core.write_aes_key(key.as_deref())?;
            core.set_mode(config.idle_mode)?;
            Ok::<_, RadioError>(pa)
        })?;
        self.wait_mode_ready()?;

        info!(
            "RFM69 (version 0x{:02X}) ready: {} MHz, {:?}, {} dBm, {}",
            version, config.frequency_mhz, config.modem, pa.dbm, config.idle_mode
        );
        Ok(())
    }

    fn wait_mode_ready(&self) -> Result<(), RadioError> {
        self.poll_until("mode ready", |core| {
            let flags = IrqFlags1::from_bits_retain(core.bus.read_register(REG_IRQFLAGS1)?);
            Ok(flags.contains(IrqFlags1::MODE_READY).then_some(()))
        })
    }

    /// Service a DIO interrupt. Call from the platform's interrupt routine.
    ///
    /// Never blocks and never fails; problems are reported through the
    /// returned outcome, the event callbacks and the log.
    pub fn handle_interrupt(&self) -> InterruptOutcome {
        let outcome = self.with_core(|core| core.service_interrupt());
        outcome.notify(&self.events);
        outcome
    }

    /// Whether a received frame is waiting.
    ///
    /// When none is, the receiver is (re)armed, even if the radio was
    /// transmitting or asleep.
    pub fn available(&self) -> Result<bool, RadioError> {
        self.with_core(|core| {
            if core.rx.is_valid() {
                return Ok(true);
            }
            core.set_mode(OperatingMode::Receive)?;
            Ok(false)
        })
    }

    /// Take the waiting frame, if any
    ///
    /// # Arguments
    ///
    /// * `buf` - Destination; its length is the most that will be copied
    ///
    /// # Returns
    ///
    /// * `Ok(Some(len))` - `len` bytes copied; anything past `buf.len()` is dropped
    /// * `Ok(None)` - Nothing received yet (the receiver has been armed)
    pub fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>, RadioError> {
        if !self.available()? {
            return Ok(None);
        }

        let copied = self.with_core(|core| {
            if !core.rx.is_valid() {
                return None;
            }
            let frame_len = core.rx.len();
            let copied = core.rx.copy_out(buf);
            if copied < frame_len {
                debug!("RFM69 recv truncated {} byte frame to {}", frame_len, copied);
            }
            Some(copied)
        });
        Ok(copied)
    }

    /// Wait up to `timeout` for a frame to arrive
    pub fn wait_available_timeout(&self, timeout: Duration) -> Result<bool, RadioError> {
        let start = Instant::now();
        loop {
            if self.available()? {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            thread::sleep(self.config.poll_interval());
        }
    }

    /// Queue `data` for transmission
    ///
    /// Waits for any transmission already in progress, then loads the FIFO
    /// and starts transmitting. Returns once the packet is on its way; the
    /// interrupt handler feeds the remaining fragments and reports PacketSent.
    ///
    /// # Returns
    ///
    /// * `Err(RadioError::EmptyPayload)` - `data` is empty; nothing was touched
    /// * `Err(RadioError::PayloadTooLong)` - `data` exceeds `max_message_len`; nothing was touched
    /// * `Err(RadioError::Timeout)` - The previous packet never completed
    pub fn send(&self, data: &[u8]) -> Result<(), RadioError> {
        if data.is_empty() {
            return Err(RadioError::EmptyPayload);
        }
        let max = usize::from(self.config.max_message_len);
        if data.len() > max {
            return Err(RadioError::PayloadTooLong {
                len: data.len(),
                max,
            });
        }

        self.wait_packet_sent()?;
        self.with_core(|core| core.start_transmit(data))
    }

    /// Block until the radio has left Transmit
    pub fn wait_packet_sent(&self) -> Result<(), RadioError> {
        self.poll_until("packet sent", |core| {
            Ok((core.mode.current() != OperatingMode::Transmit).then_some(()))
        })
    }

    /// Signal strength in dBm
    ///
    /// With `force_trigger` a fresh measurement is started first; otherwise
    /// the value from the receiver's continuous measurement is returned once
    /// ready.
    pub fn rssi_read(&self, force_trigger: bool) -> Result<i16, RadioError> {
        if force_trigger {
            self.with_core(|core| core.bus.write_register(REG_RSSICONFIG, RF_RSSI_START))?;
        }
        self.poll_until("RSSI measurement", |core| {
            Ok((core.bus.read_register(REG_RSSICONFIG)? & RF_RSSI_DONE != 0).then_some(()))
        })?;

        let raw = self.with_core(|core| core.bus.read_register(REG_RSSIVALUE))?;
        Ok(rssi_dbm(raw))
    }

    /// Raw RSSI latched when the last good frame arrived
    pub fn last_rssi(&self) -> u8 {
        self.with_core(|core| core.last_rssi)
    }

    pub fn last_rssi_dbm(&self) -> i16 {
        rssi_dbm(self.last_rssi())
    }

    /// Read the on-chip temperature sensor (uncalibrated, roughly °C).
    ///
    /// Leaves the radio in Standby.
    pub fn temperature_read(&self) -> Result<i16, RadioError> {
        self.with_core(|core| {
            core.set_mode(OperatingMode::Standby)?;
            core.bus.write_register(REG_TEMP1, RF_TEMP1_MEAS_START)
        })?;
        self.poll_until("temperature measurement", |core| {
            Ok((core.bus.read_register(REG_TEMP1)? & RF_TEMP1_MEAS_RUNNING == 0).then_some(()))
        })?;

        let raw = self.with_core(|core| core.bus.read_register(REG_TEMP2))?;
        Ok(TEMPERATURE_OFFSET - i16::from(raw))
    }

    /// Set output power, clamped to what the module supports.
    ///
    /// Returns the power actually programmed.
    pub fn set_tx_power(&self, dbm: i8) -> Result<i8, RadioError> {
        let high_power = self.config.high_power;
        let pa = self.with_core(|core| core.write_tx_power(dbm, high_power))?;
        if pa.dbm != dbm {
            warn!("RFM69 tx power {} dBm out of range, using {} dBm", dbm, pa.dbm);
        }
        Ok(pa.dbm)
    }

    /// Retune the carrier. A non-zero `afc_pull_in_mhz` enables automatic AFC.
    pub fn set_frequency(&self, centre_mhz: f32, afc_pull_in_mhz: f32) -> Result<(), RadioError> {
        if !(0.0..=MAX_AFC_PULL_IN_MHZ).contains(&afc_pull_in_mhz) {
            return Err(RadioError::Config(format!(
                "AFC pull-in {afc_pull_in_mhz} MHz out of range"
            )));
        }
        let frf = frequency_to_frf(centre_mhz)?;
        self.with_core(|core| core.write_frequency(frf, afc_pull_in_mhz > 0.0))?;
        debug!("RFM69 tuned to {} MHz (FRF 0x{:06X})", centre_mhz, frf);
        Ok(())
    }

    pub fn set_modem_config(&self, preset: ModemPreset) -> Result<(), RadioError> {
        self.set_modem_registers(&preset.config())
    }

    pub fn set_modem_registers(&self, modem: &ModemConfig) -> Result<(), RadioError> {
        self.with_core(|core| core.write_modem_config(modem))?;
        Ok(())
    }

    /// Up to eight sync bytes; an empty slice disables sync detection
    pub fn set_sync_words(&self, words: &[u8]) -> Result<(), RadioError> {
        if words.len() > 8 {
            return Err(RadioError::Config(format!(
                "at most 8 sync bytes, got {}",
                words.len()
            )));
        }
        self.with_core(|core| core.write_sync_words(words))?;
        Ok(())
    }

    pub fn set_preamble_length(&self, bytes: u16) -> Result<(), RadioError> {
        self.with_core(|core| core.write_preamble_length(bytes))?;
        Ok(())
    }

    /// Enable hardware AES-128 with `key`, or disable it with `None`
    pub fn set_encryption_key(&self, key: Option<&[u8; 16]>) -> Result<(), RadioError> {
        if key.is_some() && usize::from(self.config.max_message_len) > MAX_AES_PAYLOAD {
            return Err(RadioError::Config(format!(
                "AES limits max_message_len to {MAX_AES_PAYLOAD}"
            )));
        }
        self.with_core(|core| core.write_aes_key(key))?;
        Ok(())
    }

    pub fn mode(&self) -> OperatingMode {
        self.with_core(|core| core.mode.current())
    }

    pub fn set_mode(&self, mode: OperatingMode) -> Result<(), RadioError> {
        self.with_core(|core| core.set_mode(mode))?;
        Ok(())
    }

    /// Enter the configured idle mode
    pub fn set_mode_idle(&self) -> Result<(), RadioError> {
        self.set_mode(self.config.idle_mode)
    }

    pub fn set_mode_rx(&self) -> Result<(), RadioError> {
        self.set_mode(OperatingMode::Receive)
    }

    pub fn sleep(&self) -> Result<(), RadioError> {
        self.set_mode(OperatingMode::Sleep)
    }

    pub fn stats(&self) -> RadioStats {
        self.with_core(|core| core.stats)
    }

    pub fn device_version(&self) -> Result<u8, RadioError> {
        Ok(self.with_core(|core| core.bus.read_register(REG_VERSION))?)
    }

    /// Consume the driver and return the HAL
    pub fn release(self) -> H {
        self.core.into_inner().into_inner().bus.into_inner()
    }
}
