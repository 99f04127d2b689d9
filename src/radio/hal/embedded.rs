//! `embedded-hal` 1.0 adapter.
//!
//! Wraps an [`SpiDevice`] (chip select handled by the device) and an optional
//! reset [`OutputPin`]. Works with `linux-embedded-hal` on a Raspberry Pi as
//! well as with MCU HALs.

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{Operation, SpiDevice};

use super::{Hal, HalError};

/// Placeholder reset pin for boards that leave RESET floating.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResetPin;

impl PinErrorType for NoResetPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// [`Hal`] implementation over `embedded-hal` traits
#[derive(Debug)]
pub struct EmbeddedHal<SPI, RST = NoResetPin> {
    spi: SPI,
    reset: RST,
}

impl<SPI> EmbeddedHal<SPI, NoResetPin> {
    pub fn without_reset(spi: SPI) -> Self {
        Self {
            spi,
            reset: NoResetPin,
        }
    }
}

impl<SPI, RST> EmbeddedHal<SPI, RST> {
    pub fn new(spi: SPI, reset: RST) -> Self {
        Self { spi, reset }
    }

    /// Give back the bus and the reset pin
    pub fn release(self) -> (SPI, RST) {
        (self.spi, self.reset)
    }
}

impl<SPI, RST> Hal for EmbeddedHal<SPI, RST>
where
    SPI: SpiDevice,
    RST: OutputPin,
{
    fn spi_write(&mut self, header: u8, data: &[u8]) -> Result<(), HalError> {
        self.spi
            .transaction(&mut [Operation::Write(&[header]), Operation::Write(data)])
            .map_err(|_| HalError::Spi)
    }

    fn spi_read(&mut self, header: u8, buf: &mut [u8]) -> Result<(), HalError> {
        self.spi
            .transaction(&mut [Operation::Write(&[header]), Operation::Read(buf)])
            .map_err(|_| HalError::Spi)
    }

    fn set_reset(&mut self, asserted: bool) -> Result<(), HalError> {
        let result = if asserted {
            self.reset.set_high()
        } else {
            self.reset.set_low()
        };
        result.map_err(|_| HalError::Gpio)
    }
}
