//! Blocking SPI transport for the panel
//!
//! Sharp memory LCDs select on a HIGH chip select, which the RP2040 SPI
//! block cannot generate, so CS is a plain GPIO framed around each write.

use embassy_rp::gpio::Output;
use embassy_rp::spi::{self, Blocking, Instance, Spi};

use memlcd_hal::spi::{Phase, Polarity};
use memlcd_hal::{SpiBus, SpiConfig};

/// SPI0 pins that carry the SCK function
pub const SPI0_SCK_PINS: [u8; 4] = [2, 6, 18, 22];

/// SPI0 pins that carry the TX (MOSI) function
pub const SPI0_MOSI_PINS: [u8; 4] = [3, 7, 19, 23];

/// Check that `sck`/`mosi` can be muxed to SPI0
pub fn spi0_pins_valid(sck: u8, mosi: u8) -> bool {
    SPI0_SCK_PINS.contains(&sck) && SPI0_MOSI_PINS.contains(&mosi)
}

/// Translate the HAL SPI settings into an `embassy-rp` config
pub fn spi_config(config: &SpiConfig) -> spi::Config {
    let (polarity, phase): (Polarity, Phase) = config.mode.into();

    let mut out = spi::Config::default();
    out.frequency = config.frequency;
    out.polarity = match polarity {
        Polarity::IdleLow => spi::Polarity::IdleLow,
        Polarity::IdleHigh => spi::Polarity::IdleHigh,
    };
    out.phase = match phase {
        Phase::CaptureOnFirstTransition => spi::Phase::CaptureOnFirstTransition,
        Phase::CaptureOnSecondTransition => spi::Phase::CaptureOnSecondTransition,
    };
    out
}

/// SPI bus plus active-high chip select
pub struct SpiTransport<'d, T: Instance> {
    spi: Spi<'d, T, Blocking>,
    cs: Output<'d>,
}

impl<'d, T: Instance> SpiTransport<'d, T> {
    /// Wrap a TX-only blocking SPI and its CS line
    ///
    /// CS is deasserted (low) immediately.
    pub fn new(spi: Spi<'d, T, Blocking>, mut cs: Output<'d>) -> Self {
        cs.set_low();
        Self { spi, cs }
    }
}

impl<T: Instance> SpiBus for SpiTransport<'_, T> {
    type Error = spi::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.cs.set_high();
        // blocking_write returns once the shifter is idle
        let result = self.spi.blocking_write(data);
        self.cs.set_low();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_board_wiring_is_spi0() {
        assert!(spi0_pins_valid(18, 19));
        assert!(spi0_pins_valid(2, 3));
        assert!(!spi0_pins_valid(19, 18));
        assert!(!spi0_pins_valid(10, 11));
    }
}
