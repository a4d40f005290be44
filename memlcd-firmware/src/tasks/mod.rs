//! Embassy async tasks
//!
//! The flush worker owns the panel bus; everything else only draws into
//! the surface and raises flush requests.

pub mod demo;
pub mod flush;

pub use demo::demo_task;
pub use flush::flush_task;

use embassy_rp::peripherals::SPI0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Delay;
use memlcd_driver::MemoryLcd;
use memlcd_hal_rp2040::{LatchPin, SpiTransport};

/// The board's single panel
pub type Lcd =
    MemoryLcd<CriticalSectionRawMutex, SpiTransport<'static, SPI0>, LatchPin<'static>, Delay>;
