//! Hardware configuration types
//!
//! These types describe how a panel is wired to the controller: the SPI
//! pins, the latch (DISP) line and the refresh pacing.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::panel::{PanelGeometry, PanelInfo, PanelModel, NOMINAL_REFRESH_HZ};
use crate::error::ConfigError;

/// Default flush pacing (one quantum at 60 Hz, rounded down)
pub const DEFAULT_REFRESH_INTERVAL_MS: u16 = 1000 / NOMINAL_REFRESH_HZ;

/// Default SPI clock for memory LCDs
pub const DEFAULT_SPI_FREQUENCY: u32 = 1_000_000;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// SPI wiring for the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiHwConfig {
    /// Clock pin
    pub sck: PinConfig,
    /// Data out (panel SI)
    pub mosi: PinConfig,
    /// Chip select (panel SCS, active high)
    pub cs: PinConfig,
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for SpiHwConfig {
    fn default() -> Self {
        // SPI0 on the Pico header
        Self {
            sck: PinConfig::new(18),
            mosi: PinConfig::new(19),
            cs: PinConfig::new(17),
            frequency: DEFAULT_SPI_FREQUENCY,
        }
    }
}

/// Complete panel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelConfig {
    /// Panel model (physical size, default geometry)
    pub model: PanelModel,
    /// Resolution actually driven
    pub geometry: PanelGeometry,
    /// Latch / DISP line; required
    pub latch_pin: Option<PinConfig>,
    /// SPI wiring
    pub spi: SpiHwConfig,
    /// Minimum interval between flushes in ms
    pub refresh_interval_ms: u16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::for_model(PanelModel::default())
    }
}

impl PanelConfig {
    /// Configuration for a model at its native resolution, latch unset
    pub fn for_model(model: PanelModel) -> Self {
        Self {
            model,
            geometry: model.geometry(),
            latch_pin: None,
            spi: SpiHwConfig::default(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
        }
    }

    /// Builder-style latch pin assignment
    pub fn with_latch_pin(mut self, pin: PinConfig) -> Self {
        self.latch_pin = Some(pin);
        self
    }

    /// Validate everything a probe depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;

        let latch = self.latch_pin.ok_or(ConfigError::MissingLatchPin)?;

        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::InvalidRefreshInterval);
        }

        let pins = [latch.pin, self.spi.sck.pin, self.spi.mosi.pin, self.spi.cs.pin];
        for (i, a) in pins.iter().enumerate() {
            if pins[i + 1..].contains(a) {
                return Err(ConfigError::PinConflict);
            }
        }

        Ok(())
    }

    /// Static panel description for this configuration
    pub fn info(&self) -> PanelInfo {
        PanelInfo::new(self.model, self.geometry, self.refresh_interval_ms)
    }
}
