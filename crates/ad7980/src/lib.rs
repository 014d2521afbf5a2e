//! Provides a driver for an Analog Devices AD7980 16-bit ADC via the `embedded-hal` ecosystem.
//!
//! The AD7980 starts a conversion on a bus write and hands the result back on the following,
//! chip-select gated, read. Because the trigger write must happen with chip-select *released*,
//! the driver takes a raw [`SpiBus`] and drives the chip-select [`OutputPin`] itself rather than
//! accepting an [`embedded_hal::spi::SpiDevice`].
//!
//! ```
//! use ad7980::{Ad7980, Error};
//! use embedded_hal::{digital::OutputPin, spi::SpiBus};
//!
//! fn sample<SPI: SpiBus, CS: OutputPin>(
//!     spi: SPI,
//!     cs: CS,
//! ) -> Result<f32, Error<SPI::Error, CS::Error>> {
//!     let mut adc = Ad7980::new(spi, cs).map_err(|(_spi, _cs, e)| e)?;
//!     let volts = adc.read_volts(5.0)?;
//!     let (_spi, _cs) = adc.release();
//!     Ok(volts)
//! }
//! ```
//!
//! Releasing the driver consumes it, so a handle cannot be used once torn down:
//!
//! ```compile_fail
//! # use ad7980::Ad7980;
//! # use embedded_hal::{digital::OutputPin, spi::SpiBus};
//! fn twice<SPI: SpiBus, CS: OutputPin>(adc: Ad7980<SPI, CS>) {
//!     let _ = adc.release();
//!     let _ = adc.release();
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

use core::convert::Infallible;
use core::fmt;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::spi::SpiBus;

/// Byte written to start a conversion.
pub const TRIGGER_BYTE: u8 = 0x7F;

/// Byte clocked out while the result is read back.
pub const READ_FILL: u8 = 0xFF;

/// Divisor mapping a raw code onto the reference voltage.
pub const FULL_SCALE: f32 = 65536.0;

/// Driver error, tagged with the peripheral that failed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<SpiE, PinE> {
    /// An error with the underlying SPI bus
    Spi(SpiE),
    /// An error driving the chip-select pin
    Pin(PinE),
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> fmt::Display for Error<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(e) => write!(f, "SPI bus error: {e:?}"),
            Error::Pin(e) => write!(f, "chip-select pin error: {e:?}"),
        }
    }
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> core::error::Error for Error<SpiE, PinE> {}

/// Stand-in chip-select for boards where CS is tied low or driven elsewhere.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoChipSelect;

impl ErrorType for NoChipSelect {
    type Error = Infallible;
}

impl OutputPin for NoChipSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// AD7980 driver
///
/// The handle is not meant to be shared: every conversion needs `&mut self`, which keeps the
/// assert/transfer/deassert window from interleaving with another caller.
pub struct Ad7980<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI: SpiBus> Ad7980<SPI, NoChipSelect> {
    /// Creates a new driver for a device whose chip-select is not under our control.
    pub fn new_without_cs(spi: SPI) -> Self {
        Self {
            spi,
            cs: NoChipSelect,
        }
    }
}

impl<SPI: SpiBus, CS: OutputPin> Ad7980<SPI, CS> {
    /// Creates a new driver from an SPI bus and a chip-select pin.
    ///
    /// Chip-select is active-low, so the pin is driven high (idle) before the driver is handed back.
    /// If that fails, the bus and pin are returned alongside the error.
    #[allow(clippy::type_complexity)]
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, (SPI, CS, Error<SPI::Error, CS::Error>)> {
        if let Err(e) = cs.set_high() {
            return Err((spi, cs, Error::Pin(e)));
        }

        Ok(Self { spi, cs })
    }

    /// Start a conversion and read back the 16 bit result as a [`u16`].
    ///
    /// Once chip-select has been asserted it is always released again, even if the read fails.
    /// A bus error takes precedence over a pin error in that case.
    pub fn convert(&mut self) -> Result<u16, Error<SPI::Error, CS::Error>> {
        // Trigger runs outside the chip-select window
        self.spi.write(&[TRIGGER_BYTE]).map_err(Error::Spi)?;
        self.spi.flush().map_err(Error::Spi)?;

        self.cs.set_low().map_err(Error::Pin)?;

        let mut buffer = [READ_FILL; 2];

        let read = self
            .spi
            .transfer_in_place(&mut buffer)
            .and_then(|()| self.spi.flush());

        let deassert = self.cs.set_high();

        read.map_err(Error::Spi)?;
        deassert.map_err(Error::Pin)?;

        Ok(u16::from_be_bytes(buffer))
    }

    /// Convert and scale the result against `v_ref`. See [`to_volts`].
    pub fn read_volts(&mut self, v_ref: f32) -> Result<f32, Error<SPI::Error, CS::Error>> {
        self.convert().map(|raw| to_volts(raw, v_ref))
    }

    /// Give back the SPI bus and chip-select pin.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

/// Scale a raw sample to volts.
///
/// The code is divided by 2^16, so full scale (`0xFFFF`) lands one LSB short of `v_ref`.
pub fn to_volts(raw: u16, v_ref: f32) -> f32 {
    v_ref * raw as f32 / FULL_SCALE
}
