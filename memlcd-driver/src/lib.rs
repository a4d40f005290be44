//! Sharp memory LCD driver
//!
//! This crate ties the pure pieces of `memlcd-core` to real hardware:
//!
//! - [`surface::PixelSurface`] - the RGB888 buffer applications draw into
//! - [`scheduler::FlushScheduler`] - coalesces flush requests and runs
//!   encode → SPI transfer → latch pulse under one lock
//! - [`device::MemoryLcd`] - probe/remove lifecycle, write hook and
//!   `embedded-graphics` drawing
//!
//! # Usage
//!
//! ```ignore
//! let lcd = MemoryLcd::<CriticalSectionRawMutex, _, _, _>::probe(&config, spi, latch, Delay)?;
//!
//! // Worker task
//! lcd.run(&mut Delay).await;
//!
//! // Anywhere else
//! Text::new("hello", Point::new(4, 12), style).draw(&mut lcd.canvas())?;
//! ```

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod device;
pub mod scheduler;
pub mod surface;

pub use device::{Canvas, MemoryLcd};
pub use memlcd_core::{DeviceState, LcdError, PanelConfig, PanelGeometry, PanelInfo};
pub use scheduler::{FlushScheduler, FlushStats, Transfer, LATCH_HOLD_US};
pub use surface::PixelSurface;
