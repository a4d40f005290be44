//! Panel geometry and model presets

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bytes per pixel in the RGB888 pixel surface
pub const BYTES_PER_PIXEL: usize = 3;

/// Tallest panel addressable with an 8-bit line address
pub const MAX_LINES: u16 = 255;

/// Identifier reported in [`PanelInfo`]
pub const PANEL_ID: &str = "Sharp FB";

/// Nominal refresh rate the flush pacing is derived from
pub const NOMINAL_REFRESH_HZ: u16 = 60;

/// Panel resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelGeometry {
    /// Pixels per line (multiple of 8)
    pub width: u16,
    /// Number of lines
    pub height: u16,
}

impl PanelGeometry {
    /// Create a geometry without validating it
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Check the geometry against the line protocol's limits
    ///
    /// Width must pack into whole bytes and every 1-based line number
    /// must fit the single address byte.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.width % 8 != 0 {
            return Err(ConfigError::InvalidWidth);
        }
        if self.height == 0 || self.height > MAX_LINES {
            return Err(ConfigError::InvalidHeight);
        }
        Ok(())
    }

    /// Bytes per surface line (RGB888)
    pub const fn line_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Total pixel surface size in bytes
    pub const fn surface_len(&self) -> usize {
        self.line_bytes() * self.height as usize
    }

    /// Packed 1bpp data bytes per panel line
    pub const fn data_bytes_per_line(&self) -> usize {
        self.width as usize / 8
    }

    /// One frame line: address byte, data bytes, trailer byte
    pub const fn frame_line_len(&self) -> usize {
        1 + self.data_bytes_per_line() + 1
    }

    /// Total transmit frame size: mode byte, all lines, terminator
    pub const fn frame_len(&self) -> usize {
        1 + self.height as usize * self.frame_line_len() + 1
    }

    /// Number of pixels
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for PanelGeometry {
    fn default() -> Self {
        PanelModel::Ls013b7dh03.geometry()
    }
}

/// Known Sharp memory LCD models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PanelModel {
    /// 1.28" 128x128
    #[default]
    Ls013b7dh03,
    /// 1.26" 144x168
    Ls013b7dh05,
    /// 2.7" 400x240
    Ls027b7dh01,
}

impl PanelModel {
    /// Native resolution
    pub const fn geometry(&self) -> PanelGeometry {
        match self {
            PanelModel::Ls013b7dh03 => PanelGeometry::new(128, 128),
            PanelModel::Ls013b7dh05 => PanelGeometry::new(144, 168),
            PanelModel::Ls027b7dh01 => PanelGeometry::new(400, 240),
        }
    }

    /// Active area (width, height) in millimetres
    pub const fn physical_size_mm(&self) -> (u16, u16) {
        match self {
            PanelModel::Ls013b7dh03 => (20, 20),
            PanelModel::Ls013b7dh05 => (21, 24),
            PanelModel::Ls027b7dh01 => (59, 35),
        }
    }

    /// Lower-case part number as used in `panel.toml`
    pub const fn name(&self) -> &'static str {
        match self {
            PanelModel::Ls013b7dh03 => "ls013b7dh03",
            PanelModel::Ls013b7dh05 => "ls013b7dh05",
            PanelModel::Ls027b7dh01 => "ls027b7dh01",
        }
    }

    /// Look up a model by part number (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        [
            PanelModel::Ls013b7dh03,
            PanelModel::Ls013b7dh05,
            PanelModel::Ls027b7dh01,
        ]
        .into_iter()
        .find(|model| model.name().eq_ignore_ascii_case(name))
    }
}

/// Static description of an attached panel
///
/// Mirrors what a framebuffer consumer needs to lay out pixels: the
/// resolution, the stride and the total surface size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelInfo {
    /// Driver identifier
    pub id: &'static str,
    /// Panel model
    pub model: PanelModel,
    /// Resolution
    pub geometry: PanelGeometry,
    /// Active area width in mm
    pub width_mm: u16,
    /// Active area height in mm
    pub height_mm: u16,
    /// Bits per pixel of the surface
    pub bits_per_pixel: u8,
    /// Surface stride in bytes
    pub line_length: usize,
    /// Surface size in bytes
    pub surface_len: usize,
    /// Nominal refresh rate in Hz
    pub refresh_hz: u16,
}

impl PanelInfo {
    /// Describe a panel model driven at the given geometry
    pub fn new(model: PanelModel, geometry: PanelGeometry, refresh_interval_ms: u16) -> Self {
        let (width_mm, height_mm) = model.physical_size_mm();
        // The default interval is 1000 / 60 rounded down; report it as 60
        let refresh_hz = if refresh_interval_ms == 0
            || refresh_interval_ms == 1000 / NOMINAL_REFRESH_HZ
        {
            NOMINAL_REFRESH_HZ
        } else {
            (1000 / refresh_interval_ms).max(1)
        };

        Self {
            id: PANEL_ID,
            model,
            geometry,
            width_mm,
            height_mm,
            bits_per_pixel: (BYTES_PER_PIXEL * 8) as u8,
            line_length: geometry.line_bytes(),
            surface_len: geometry.surface_len(),
            refresh_hz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_panel_sizes() {
        let g = PanelModel::Ls013b7dh03.geometry();
        assert_eq!(g.surface_len(), 3 * 128 * 128);
        assert_eq!(g.data_bytes_per_line(), 16);
        assert_eq!(g.frame_line_len(), 18);
        assert_eq!(g.frame_len(), 18 * 128 + 2);
    }

    #[test]
    fn test_validate_width() {
        assert_eq!(
            PanelGeometry::new(0, 128).validate(),
            Err(ConfigError::InvalidWidth)
        );
        assert_eq!(
            PanelGeometry::new(130, 128).validate(),
            Err(ConfigError::InvalidWidth)
        );
        assert!(PanelGeometry::new(400, 240).validate().is_ok());
    }

    #[test]
    fn test_validate_height() {
        assert_eq!(
            PanelGeometry::new(128, 0).validate(),
            Err(ConfigError::InvalidHeight)
        );
        assert_eq!(
            PanelGeometry::new(128, 256).validate(),
            Err(ConfigError::InvalidHeight)
        );
        assert!(PanelGeometry::new(8, 255).validate().is_ok());
    }

    #[test]
    fn test_model_lookup() {
        assert_eq!(
            PanelModel::from_name("LS027B7DH01"),
            Some(PanelModel::Ls027b7dh01)
        );
        assert_eq!(PanelModel::from_name("ls013b7dh05"), Some(PanelModel::Ls013b7dh05));
        assert_eq!(PanelModel::from_name("ssd1680"), None);
    }

    #[test]
    fn test_all_models_have_valid_geometry() {
        for model in [
            PanelModel::Ls013b7dh03,
            PanelModel::Ls013b7dh05,
            PanelModel::Ls027b7dh01,
        ] {
            assert!(model.geometry().validate().is_ok(), "{}", model.name());
        }
    }

    #[test]
    fn test_panel_info() {
        let info = PanelInfo::new(PanelModel::Ls013b7dh03, PanelGeometry::default(), 16);
        assert_eq!(info.id, "Sharp FB");
        assert_eq!(info.line_length, 384);
        assert_eq!(info.surface_len, 49152);
        assert_eq!((info.width_mm, info.height_mm), (20, 20));
        assert_eq!(info.bits_per_pixel, 24);
        assert_eq!(info.refresh_hz, 60);
    }

    #[test]
    fn test_refresh_hz_from_interval() {
        let hz = |ms| {
            PanelInfo::new(PanelModel::Ls013b7dh03, PanelGeometry::default(), ms).refresh_hz
        };
        assert_eq!(hz(0), NOMINAL_REFRESH_HZ);
        assert_eq!(hz(16), 60);
        assert_eq!(hz(20), 50);
        assert_eq!(hz(5000), 1);
    }
}
