//! GPIO allocation and the latch output
//!
//! Tracks which GPIO pins a panel configuration claims so a bad
//! `panel.toml` is caught before any peripheral is touched.

use embassy_rp::gpio::Output;
use heapless::FnvIndexSet;

use memlcd_core::config::PinConfig;
use memlcd_core::{ConfigError, PanelConfig};
use memlcd_hal::OutputPin;

/// Maximum number of GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// GPIO allocator to track pin usage
pub struct GpioAllocator {
    allocated: FnvIndexSet<u8, 32>,
}

impl Default for GpioAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self {
            allocated: FnvIndexSet::new(),
        }
    }

    /// Claim a GPIO pin
    pub fn allocate(&mut self, pin: u8) -> Result<(), ConfigError> {
        if pin as usize >= GPIO_COUNT {
            return Err(ConfigError::InvalidPin);
        }
        if self.allocated.contains(&pin) {
            return Err(ConfigError::PinConflict);
        }
        self.allocated
            .insert(pin)
            .map_err(|_| ConfigError::InvalidPin)?;
        Ok(())
    }

    /// Claim every pin a panel needs
    ///
    /// On error nothing from this call stays allocated.
    pub fn claim_panel(&mut self, config: &PanelConfig) -> Result<(), ConfigError> {
        let latch = config.latch_pin.ok_or(ConfigError::MissingLatchPin)?;
        let pins = [latch.pin, config.spi.sck.pin, config.spi.mosi.pin, config.spi.cs.pin];

        for (i, &pin) in pins.iter().enumerate() {
            if let Err(err) = self.allocate(pin) {
                for &claimed in &pins[..i] {
                    self.release(claimed);
                }
                return Err(err);
            }
        }

        Ok(())
    }

    /// Release a GPIO pin
    pub fn release(&mut self, pin: u8) {
        self.allocated.remove(&pin);
    }

    /// Check if a pin is allocated
    pub fn is_allocated(&self, pin: u8) -> bool {
        self.allocated.contains(&pin)
    }

    /// Number of allocated pins
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }
}

/// Latch (DISP) line driven from an RP2040 output
///
/// Honors the `!` inversion flag from the pin config, so the driver
/// always talks in logical levels.
pub struct LatchPin<'d> {
    output: Output<'d>,
    inverted: bool,
}

impl<'d> LatchPin<'d> {
    /// Wrap a configured output
    pub fn new(output: Output<'d>, config: PinConfig) -> Self {
        Self {
            output,
            inverted: config.inverted,
        }
    }

    fn drive(&mut self, high: bool) {
        if high != self.inverted {
            self.output.set_high();
        } else {
            self.output.set_low();
        }
    }
}

impl OutputPin for LatchPin<'_> {
    fn set_high(&mut self) {
        self.drive(true);
    }

    fn set_low(&mut self) {
        self.drive(false);
    }

    fn is_set_high(&self) -> bool {
        self.output.is_set_high() != self.inverted
    }
}
