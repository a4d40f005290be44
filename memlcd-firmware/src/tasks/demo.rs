//! Demo drawing task
//!
//! Draws a static frame once, then an uptime counter and a bouncing
//! marker four times a second. Each draw only raises a flush request;
//! the flush task decides when the panel is actually refreshed.

use core::fmt::Write;

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X15_BOLD};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use heapless::String;

use memlcd_driver::LcdError;

use super::Lcd;

/// Redraw interval in milliseconds
pub const DEMO_INTERVAL_MS: u64 = 250;

const MARKER_SIZE: u32 = 8;
const MARKER_Y: i32 = 96;
const STATS_EVERY: u32 = 40;

/// Demo task - exercises the draw → request → flush path
#[embassy_executor::task]
pub async fn demo_task(lcd: &'static Lcd) {
    info!("Demo task started");

    let mut canvas = lcd.canvas();
    if let Err(e) = draw_background(&mut canvas) {
        warn!("Demo background failed: {}", e);
    }

    let width = canvas.size().width as i32;
    let mut ticker = Ticker::every(Duration::from_millis(DEMO_INTERVAL_MS));
    let start = Instant::now();
    let mut x = 0i32;
    let mut dx = 4i32;
    let mut ticks = 0u32;

    loop {
        ticker.next().await;

        let secs = start.elapsed().as_secs();
        match draw_status(&mut canvas, secs, x) {
            Ok(()) => {}
            Err(LcdError::Detached) => {
                info!("Panel detached, demo stopping");
                return;
            }
            Err(e) => warn!("Demo draw failed: {}", e),
        }

        if x + dx < 0 || x + dx + MARKER_SIZE as i32 > width {
            dx = -dx;
        }
        x += dx;

        ticks = ticks.wrapping_add(1);
        if ticks % STATS_EVERY == 0 {
            let stats = lcd.stats();
            debug!(
                "Panel stats: {} requests, {} flushes, {} failures",
                stats.requests, stats.flushes, stats.failures
            );
        }
    }
}

fn draw_background<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    target.clear(Rgb888::WHITE)?;

    let bounds = target.bounding_box();
    bounds
        .into_styled(PrimitiveStyle::with_stroke(Rgb888::BLACK, 2))
        .draw(target)?;

    let title = MonoTextStyle::new(&FONT_9X15_BOLD, Rgb888::BLACK);
    Text::new("memlcd", Point::new(8, 20), title).draw(target)?;

    Ok(())
}

fn draw_status<D>(target: &mut D, secs: u64, marker_x: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let width = target.bounding_box().size.width;

    // Clear the status band and the marker track
    Rectangle::new(Point::new(4, 40), Size::new(width - 8, 14))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
        .draw(target)?;
    Rectangle::new(Point::new(0, MARKER_Y), Size::new(width, MARKER_SIZE))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
        .draw(target)?;

    let mut line: String<24> = String::new();
    // Capacity covers any u64; a truncated line is still drawable
    let _ = core::write!(line, "up {}:{:02}", secs / 60, secs % 60);

    let style = MonoTextStyle::new(&FONT_6X10, Rgb888::BLACK);
    Text::new(&line, Point::new(8, 50), style).draw(target)?;

    Rectangle::new(
        Point::new(marker_x, MARKER_Y),
        Size::new(MARKER_SIZE, MARKER_SIZE),
    )
    .into_styled(PrimitiveStyle::with_fill(Rgb888::BLACK))
    .draw(target)?;

    Ok(())
}
