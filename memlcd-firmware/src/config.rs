//! Configuration loading
//!
//! The panel wiring is compiled in from `panel.toml`. build.rs has
//! already rejected malformed files, so a parse failure here means the
//! embedded parser and the build-time check disagree; fall back to the
//! reference wiring rather than leave the panel dark.

use defmt::*;

use memlcd_core::config::{parse_config, PinConfig};
use memlcd_core::{PanelConfig, PanelModel};

use crate::board::LATCH_PIN;

/// Parse the embedded configuration, falling back to board defaults
pub fn load(text: &str) -> PanelConfig {
    match parse_config(text) {
        Ok(config) => {
            info!(
                "Panel config: {} {}x{}, refresh every {} ms",
                config.model,
                config.geometry.width,
                config.geometry.height,
                config.refresh_interval_ms
            );
            config
        }
        Err(e) => {
            warn!("panel.toml rejected ({}), using board defaults", e);
            PanelConfig::for_model(PanelModel::default()).with_latch_pin(PinConfig::new(LATCH_PIN))
        }
    }
}
