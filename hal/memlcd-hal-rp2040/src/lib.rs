//! RP2040 HAL for the memlcd driver stack
//!
//! Implements the `memlcd-hal` traits on top of `embassy-rp`:
//!
//! - [`spi::SpiTransport`] - blocking SPI with the panel's active-high
//!   chip select
//! - [`gpio::LatchPin`] - the DISP/latch output line
//! - [`gpio::GpioAllocator`] - pin bookkeeping for config-driven bring-up

#![no_std]

pub mod gpio;
pub mod spi;

pub use gpio::{GpioAllocator, LatchPin};
pub use spi::SpiTransport;
