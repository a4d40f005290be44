//! Device lifecycle
//!
//! [`MemoryLcd`] owns everything one attached panel needs: the pixel
//! surface, the transmit frame and the hardware handles behind the flush
//! scheduler. It is created by [`MemoryLcd::probe`] and torn down by
//! [`MemoryLcd::remove`]; nothing is shared between devices.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{
    Dimensions, DrawTarget, OriginDimensions, Pixel, PointsIter, Size,
};
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as AsyncDelayNs;

use memlcd_core::{DeviceState, LcdError, PanelConfig, PanelInfo};
use memlcd_hal::{OutputPin, SpiBus};

use crate::scheduler::{FlushScheduler, FlushStats, Transfer};
use crate::surface::PixelSurface;

/// One attached Sharp memory LCD
pub struct MemoryLcd<M: RawMutex, SPI, PIN, D> {
    surface: PixelSurface,
    scheduler: FlushScheduler<M, SPI, PIN, D>,
    info: PanelInfo,
}

impl<M, SPI, PIN, D> MemoryLcd<M, SPI, PIN, D>
where
    M: RawMutex,
    SPI: SpiBus,
    PIN: OutputPin,
    D: DelayNs,
{
    /// Attach a panel
    ///
    /// Validates the configuration, allocates the surface and transmit
    /// frame, and drives the latch to its idle level. On error every
    /// resource handed in is dropped; nothing stays half-attached.
    pub fn probe(config: &PanelConfig, spi: SPI, latch: PIN, delay: D) -> Result<Self, LcdError> {
        config.validate()?;

        let surface = PixelSurface::new(config.geometry)?;
        let mut transfer = Transfer::new(config.geometry, spi, latch, delay)?;
        transfer.release_latch();

        let scheduler = FlushScheduler::new(transfer, u32::from(config.refresh_interval_ms));
        scheduler.attach();

        let info = config.info();

        #[cfg(feature = "defmt")]
        defmt::info!(
            "{} attached: {}x{} ({})",
            info.id,
            info.geometry.width,
            info.geometry.height,
            info.model
        );

        Ok(Self {
            surface,
            scheduler,
            info,
        })
    }

    /// Static panel description
    pub fn info(&self) -> &PanelInfo {
        &self.info
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        self.scheduler.state()
    }

    /// Flush counters
    pub fn stats(&self) -> FlushStats {
        self.scheduler.stats()
    }

    /// Direct access to the pixel surface
    ///
    /// Writes made through this handle are not flushed until
    /// [`request_flush`](Self::request_flush) is called.
    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    /// Write raw RGB888 bytes at `offset` and schedule a refresh
    ///
    /// Returns the number of bytes stored. If a detach starts between the
    /// state check and the flush request, the bytes are stored but
    /// [`LcdError::Detached`] is returned; they will not reach the panel.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<usize, LcdError> {
        if self.state().is_shutting_down() {
            return Err(LcdError::Detached);
        }

        let written = self.surface.write(offset, data)?;
        self.scheduler.request_flush()?;
        Ok(written)
    }

    /// Read raw RGB888 bytes starting at `offset`
    pub fn read(&self, offset: usize, buf: &mut [u8]) -> usize {
        self.surface.read(offset, buf)
    }

    /// `embedded-graphics` draw target over the surface
    pub fn canvas(&self) -> Canvas<'_, M, SPI, PIN, D> {
        Canvas { lcd: self }
    }

    /// Schedule a refresh without writing
    pub fn request_flush(&self) -> Result<(), LcdError> {
        self.scheduler.request_flush()
    }

    /// Flush immediately, bypassing the coalescing window
    pub async fn flush(&self) -> Result<(), LcdError> {
        self.scheduler.flush(&self.surface).await
    }

    /// Run the flush worker until the device detaches
    pub async fn run<T: AsyncDelayNs>(&self, timer: &mut T) {
        self.scheduler.run(&self.surface, timer).await
    }

    /// Stop the worker and wait for any in-flight flush
    ///
    /// Subsequent writes and flushes fail with [`LcdError::Detached`].
    pub async fn detach(&self) {
        self.scheduler.detach().await
    }

    /// Detach and hand the hardware back
    ///
    /// The surface and transmit frame are freed here.
    pub async fn remove(self) -> (SPI, PIN, D) {
        self.detach().await;
        self.scheduler.into_transfer().into_parts()
    }
}

/// Drawing handle returned by [`MemoryLcd::canvas`]
///
/// Every draw call schedules a refresh once it completes. Pixels outside
/// the panel are clipped.
pub struct Canvas<'a, M: RawMutex, SPI, PIN, D> {
    lcd: &'a MemoryLcd<M, SPI, PIN, D>,
}

impl<M, SPI, PIN, D> Canvas<'_, M, SPI, PIN, D>
where
    M: RawMutex,
    SPI: SpiBus,
    PIN: OutputPin,
    D: DelayNs,
{
    fn ensure_attached(&self) -> Result<(), LcdError> {
        if self.lcd.state().is_shutting_down() {
            return Err(LcdError::Detached);
        }
        Ok(())
    }

    fn mark_dirty(&self) -> Result<(), LcdError> {
        self.lcd.scheduler.request_flush()
    }

    /// Copy a block of pixels within the panel
    ///
    /// The source is clipped to the panel first; the destination moves by
    /// whatever was cut off the source's top-left corner.
    pub fn copy_area(&mut self, src: Rectangle, dst_x: u16, dst_y: u16) -> Result<(), LcdError> {
        self.ensure_attached()?;

        let clipped = src.intersection(&self.bounding_box());
        if clipped.size.width > 0 && clipped.size.height > 0 {
            let shift_x = i64::from(clipped.top_left.x) - i64::from(src.top_left.x);
            let shift_y = i64::from(clipped.top_left.y) - i64::from(src.top_left.y);
            let (x, y) = clamp_origin(&clipped);

            self.lcd.surface.copy_area(
                x,
                y,
                shift_origin(dst_x, shift_x),
                shift_origin(dst_y, shift_y),
                clamp_len(clipped.size.width),
                clamp_len(clipped.size.height),
            );
        }
        self.mark_dirty()
    }
}

impl<M, SPI, PIN, D> OriginDimensions for Canvas<'_, M, SPI, PIN, D>
where
    M: RawMutex,
{
    fn size(&self) -> Size {
        let g = self.lcd.info.geometry;
        Size::new(u32::from(g.width), u32::from(g.height))
    }
}

impl<M, SPI, PIN, D> DrawTarget for Canvas<'_, M, SPI, PIN, D>
where
    M: RawMutex,
    SPI: SpiBus,
    PIN: OutputPin,
    D: DelayNs,
{
    type Color = Rgb888;
    type Error = LcdError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.ensure_attached()?;

        for Pixel(coord, color) in pixels {
            if coord.x < 0 || coord.y < 0 {
                continue;
            }
            // Out-of-range coordinates are dropped by the surface
            let _ = self.lcd.surface.set_pixel(
                clamp_len(coord.x as u32),
                clamp_len(coord.y as u32),
                rgb(color),
            );
        }
        self.mark_dirty()
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.ensure_attached()?;

        let area = area.intersection(&self.bounding_box());
        if area.size.width > 0 && area.size.height > 0 {
            let (x, y) = clamp_origin(&area);
            self.lcd.surface.fill_rect(
                x,
                y,
                clamp_len(area.size.width),
                clamp_len(area.size.height),
                rgb(color),
            );
        }
        self.mark_dirty()
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.draw_iter(
            area.points()
                .zip(colors)
                .map(|(pos, color)| Pixel(pos, color)),
        )
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.ensure_attached()?;

        self.lcd.surface.fill(rgb(color));
        self.mark_dirty()
    }
}

fn rgb(color: Rgb888) -> (u8, u8, u8) {
    (color.r(), color.g(), color.b())
}

fn clamp_len(v: u32) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

fn shift_origin(origin: u16, shift: i64) -> u16 {
    u16::try_from(i64::from(origin) + shift).unwrap_or(u16::MAX)
}

fn clamp_origin(rect: &Rectangle) -> (u16, u16) {
    (
        clamp_len(rect.top_left.x.max(0) as u32),
        clamp_len(rect.top_left.y.max(0) as u32),
    )
}
