//! Simple TOML parser for panel configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! `panel.toml`. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer)
//! - `[panel]`, `[spi]` and `[refresh]` section headers
//! - Comments (# ...)
//!
//! Unknown keys are ignored so that board files can carry extra notes.

use super::hardware::{PanelConfig, PinConfig};
use super::panel::PanelModel;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
    /// Model name not recognised
    UnknownModel,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Panel,
    Spi,
    Refresh,
}

/// Parse `panel.toml` into a [`PanelConfig`]
///
/// Geometry defaults to the model's native resolution; `width`/`height`
/// override it regardless of where they appear in the section.
pub fn parse_config(input: &str) -> Result<PanelConfig, ParseError> {
    let mut config = PanelConfig::default();
    let mut section = Section::Root;
    let mut width: Option<u16> = None;
    let mut height: Option<u16> = None;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let Some((key, value)) = parse_key_value(line) else {
            continue;
        };

        match section {
            Section::Panel => match key {
                "model" => {
                    let name = parse_string(value)?;
                    config.model = PanelModel::from_name(name).ok_or(ParseError::UnknownModel)?;
                }
                "width" => width = Some(parse_int(value)?),
                "height" => height = Some(parse_int(value)?),
                "latch_pin" | "disp_pin" => config.latch_pin = Some(parse_pin(value)?),
                _ => {}
            },
            Section::Spi => match key {
                "sck_pin" => config.spi.sck = parse_pin(value)?,
                "mosi_pin" => config.spi.mosi = parse_pin(value)?,
                "cs_pin" => config.spi.cs = parse_pin(value)?,
                "frequency" => config.spi.frequency = parse_int(value)?,
                _ => {}
            },
            Section::Refresh => {
                if key == "interval_ms" {
                    config.refresh_interval_ms = parse_int(value)?;
                }
            }
            Section::Root => {
                // No root-level keys
            }
        }
    }

    config.geometry = config.model.geometry();
    if let Some(w) = width {
        config.geometry.width = w;
    }
    if let Some(h) = height {
        config.geometry.height = h;
    }

    Ok(config)
}

/// Parse section header like "panel" or "spi"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "panel" => Ok(Section::Panel),
        "spi" => Ok(Section::Spi),
        "refresh" => Ok(Section::Refresh),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse an integer value, accepting `_` digit separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits = heapless::String::<16>::new();
    for ch in value.chars().filter(|c| *c != '_') {
        digits.push(ch).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a pin string like "gpio20" or "!gpio20"
fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let value = parse_string(value)?;
    let (s, inverted) = match value.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (value, false),
    };

    let num = s.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    let pin: u8 = num.parse().map_err(|_| ParseError::InvalidPin)?;

    Ok(PinConfig { pin, inverted })
}
