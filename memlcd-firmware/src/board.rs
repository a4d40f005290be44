//! Reference board wiring
//!
//! The SPI0 pins, chip select and latch are soldered to fixed GPIOs on
//! the reference board. `panel.toml` must describe the same wiring; a
//! mismatch means the file belongs to a different board.

use memlcd_core::{ConfigError, PanelConfig};
use memlcd_hal_rp2040::spi::spi0_pins_valid;

/// SPI0 clock
pub const SCK_PIN: u8 = 18;
/// SPI0 TX (panel SI)
pub const MOSI_PIN: u8 = 19;
/// Panel SCS
pub const CS_PIN: u8 = 17;
/// Panel DISP / latch
pub const LATCH_PIN: u8 = 20;

/// Check that the configuration matches this board
pub fn check_wiring(config: &PanelConfig) -> Result<(), ConfigError> {
    let latch = config.latch_pin.ok_or(ConfigError::MissingLatchPin)?;

    if !spi0_pins_valid(config.spi.sck.pin, config.spi.mosi.pin) {
        return Err(ConfigError::InvalidPin);
    }

    let wired = [
        (config.spi.sck.pin, SCK_PIN),
        (config.spi.mosi.pin, MOSI_PIN),
        (config.spi.cs.pin, CS_PIN),
        (latch.pin, LATCH_PIN),
    ];
    if wired.iter().any(|(configured, board)| configured != board) {
        return Err(ConfigError::InvalidPin);
    }

    Ok(())
}
