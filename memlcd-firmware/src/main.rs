//! memlcd - Sharp Memory LCD demo firmware
//!
//! Brings up an LS013B7DH03-class panel on an RP2040 board: parses the
//! embedded `panel.toml`, probes the panel on SPI0 and runs the flush
//! worker next to a small drawing demo.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::spi::Spi;
use embassy_time::Delay;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use memlcd_hal::spi::{Mode, SpiConfig};
use memlcd_hal_rp2040::spi::spi_config;
use memlcd_hal_rp2040::{GpioAllocator, LatchPin, SpiTransport};

use crate::tasks::Lcd;

// Heap allocator for the pixel surface and transmit frame
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 64KB (128x128 RGB888 surface is 48KB)
const HEAP_SIZE: usize = 64 * 1024;

/// Embedded panel wiring (compiled into firmware)
/// Edit panel.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../panel.toml");

mod board;
mod config;
mod tasks;

static LCD: StaticCell<Lcd> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("memlcd firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load(EMBEDDED_CONFIG);

    if let Err(e) = board::check_wiring(&config) {
        error!("panel.toml does not match board wiring: {}", e);
        return;
    }

    let mut gpio = GpioAllocator::new();
    if let Err(e) = gpio.claim_panel(&config) {
        error!("Pin allocation failed: {}", e);
        return;
    }

    let spi_settings = SpiConfig {
        frequency: config.spi.frequency,
        mode: Mode::Mode0,
    };
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config(&spi_settings));
    let cs = Output::new(p.PIN_17, Level::Low);
    let transport = SpiTransport::new(spi, cs);

    // Latch idles high; probe drives it again through the driver
    let latch_config = config.latch_pin.unwrap_or_default();
    let latch_level = if latch_config.inverted {
        Level::Low
    } else {
        Level::High
    };
    let latch = LatchPin::new(Output::new(p.PIN_20, latch_level), latch_config);

    let lcd = match Lcd::probe(&config, transport, latch, Delay) {
        Ok(lcd) => LCD.init(lcd),
        Err(e) => {
            error!("Panel probe failed: {}", e);
            return;
        }
    };

    let info = lcd.info();
    info!(
        "{} ready: {}x{}, {}x{} mm, {} bytes/line",
        info.id,
        info.geometry.width,
        info.geometry.height,
        info.width_mm,
        info.height_mm,
        info.line_length
    );

    spawner.spawn(tasks::flush_task(lcd)).unwrap();
    spawner.spawn(tasks::demo_task(lcd)).unwrap();

    info!("All tasks spawned");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
