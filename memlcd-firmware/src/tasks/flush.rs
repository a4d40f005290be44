//! Flush worker task

use defmt::*;
use embassy_time::Delay;

use super::Lcd;

/// Flush worker - coalesces requests and drives the panel
#[embassy_executor::task]
pub async fn flush_task(lcd: &'static Lcd) {
    info!("Flush task started, up to {} Hz", lcd.info().refresh_hz);

    lcd.run(&mut Delay).await;

    let stats = lcd.stats();
    info!(
        "Flush task stopped: {} requests, {} flushes, {} failures",
        stats.requests, stats.flushes, stats.failures
    );
}
