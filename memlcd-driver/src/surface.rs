//! RGB888 pixel surface
//!
//! The buffer applications draw into. Writers store bytes without taking
//! the flush lock, so every byte is an atomic cell: a flush that races a
//! write sees each byte either before or after the write, never garbage.
//! Whole pixels may still tear across a flush; the next flush picks up
//! the final value.

use alloc::vec::Vec;

use portable_atomic::{AtomicU8, Ordering};

use memlcd_core::config::BYTES_PER_PIXEL;
use memlcd_core::{LcdError, PanelGeometry, PixelSource};

/// Allocate `len` elements without aborting on out-of-memory
pub(crate) fn try_alloc_with<T>(len: usize, f: impl FnMut() -> T) -> Result<Vec<T>, LcdError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| LcdError::AllocationFailure)?;
    buf.resize_with(len, f);
    Ok(buf)
}

/// Zero-initialized RGB888 pixel buffer of fixed geometry
pub struct PixelSurface {
    bytes: Vec<AtomicU8>,
    geometry: PanelGeometry,
}

impl PixelSurface {
    /// Allocate a zero-filled surface
    pub fn new(geometry: PanelGeometry) -> Result<Self, LcdError> {
        geometry.validate()?;
        let bytes = try_alloc_with(geometry.surface_len(), || AtomicU8::new(0))?;
        Ok(Self { bytes, geometry })
    }

    /// Surface geometry
    pub fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    /// Copy `data` into the surface starting at byte `offset`
    ///
    /// Writes that run past the end are truncated; returns the number of
    /// bytes stored. An offset at or beyond the end is an error.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<usize, LcdError> {
        if data.is_empty() {
            return Ok(0);
        }

        let len = self.bytes.len();
        if offset >= len {
            return Err(LcdError::OutOfBounds);
        }

        let count = data.len().min(len - offset);
        for (cell, &byte) in self.bytes[offset..offset + count].iter().zip(data) {
            cell.store(byte, Ordering::Relaxed);
        }

        Ok(count)
    }

    /// Copy surface bytes starting at `offset` into `buf`
    ///
    /// Returns the number of bytes read; 0 at or past the end.
    pub fn read(&self, offset: usize, buf: &mut [u8]) -> usize {
        let len = self.bytes.len();
        if offset >= len {
            return 0;
        }

        let count = buf.len().min(len - offset);
        for (out, cell) in buf.iter_mut().zip(&self.bytes[offset..offset + count]) {
            *out = cell.load(Ordering::Relaxed);
        }

        count
    }

    /// Set one pixel
    pub fn set_pixel(&self, x: u16, y: u16, rgb: (u8, u8, u8)) -> Result<(), LcdError> {
        let offset = self.pixel_offset(x, y).ok_or(LcdError::OutOfBounds)?;
        self.store_rgb(offset, rgb);
        Ok(())
    }

    /// Read one pixel
    pub fn pixel(&self, x: u16, y: u16) -> Option<(u8, u8, u8)> {
        self.pixel_offset(x, y).map(|offset| self.rgb_at(offset))
    }

    /// Paint every pixel with one color
    pub fn fill(&self, rgb: (u8, u8, u8)) {
        for px in self.bytes.chunks_exact(BYTES_PER_PIXEL) {
            px[0].store(rgb.0, Ordering::Relaxed);
            px[1].store(rgb.1, Ordering::Relaxed);
            px[2].store(rgb.2, Ordering::Relaxed);
        }
    }

    /// Paint a rectangle, clipped to the surface
    pub fn fill_rect(&self, x: u16, y: u16, width: u16, height: u16, rgb: (u8, u8, u8)) {
        let x_end = x.saturating_add(width).min(self.geometry.width);
        let y_end = y.saturating_add(height).min(self.geometry.height);

        for py in y..y_end {
            for px in x..x_end {
                if let Some(offset) = self.pixel_offset(px, py) {
                    self.store_rgb(offset, rgb);
                }
            }
        }
    }

    /// Copy a `width`×`height` block from (`src_x`, `src_y`) to
    /// (`dst_x`, `dst_y`)
    ///
    /// Overlapping source and destination behave like `memmove`. Both
    /// rectangles are clipped to the surface.
    pub fn copy_area(
        &self,
        src_x: u16,
        src_y: u16,
        dst_x: u16,
        dst_y: u16,
        width: u16,
        height: u16,
    ) {
        let (gw, gh) = (self.geometry.width, self.geometry.height);
        let width = width
            .min(gw.saturating_sub(src_x))
            .min(gw.saturating_sub(dst_x));
        let height = height
            .min(gh.saturating_sub(src_y))
            .min(gh.saturating_sub(dst_y));

        // Walk away from the destination so source pixels are read
        // before they are overwritten
        let rows_down = dst_y <= src_y;
        let cols_right = dst_x <= src_x;

        for row in 0..height {
            let dy = if rows_down { row } else { height - 1 - row };
            for col in 0..width {
                let dx = if cols_right { col } else { width - 1 - col };
                if let (Some(from), Some(to)) = (
                    self.pixel_offset(src_x + dx, src_y + dy),
                    self.pixel_offset(dst_x + dx, dst_y + dy),
                ) {
                    let rgb = self.rgb_at(from);
                    self.store_rgb(to, rgb);
                }
            }
        }
    }

    fn pixel_offset(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.geometry.width || y >= self.geometry.height {
            return None;
        }
        Some(y as usize * self.geometry.line_bytes() + x as usize * BYTES_PER_PIXEL)
    }

    fn store_rgb(&self, offset: usize, rgb: (u8, u8, u8)) {
        self.bytes[offset].store(rgb.0, Ordering::Relaxed);
        self.bytes[offset + 1].store(rgb.1, Ordering::Relaxed);
        self.bytes[offset + 2].store(rgb.2, Ordering::Relaxed);
    }
}

impl PixelSource for PixelSurface {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.bytes[index].load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: (u8, u8, u8) = (255, 255, 255);

    fn surface() -> PixelSurface {
        PixelSurface::new(PanelGeometry::new(16, 4)).unwrap()
    }

    #[test]
    fn test_zero_initialized() {
        let s = surface();
        assert_eq!(PixelSource::len(&s), 16 * 4 * 3);
        let mut buf = [0xAAu8; 16 * 4 * 3];
        assert_eq!(s.read(0, &mut buf), buf.len());
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_truncates_at_end() {
        let s = surface();
        let end = PixelSource::len(&s);
        assert_eq!(s.write(end - 2, &[1, 2, 3, 4]), Ok(2));
        assert_eq!(s.byte_at(end - 1), 2);
        assert_eq!(s.write(end, &[1]), Err(LcdError::OutOfBounds));
        assert_eq!(s.write(end, &[]), Ok(0));
    }

    #[test]
    fn test_read_past_end() {
        let s = surface();
        let mut buf = [0u8; 8];
        assert_eq!(s.read(PixelSource::len(&s), &mut buf), 0);
        assert_eq!(s.read(PixelSource::len(&s) - 3, &mut buf), 3);
    }

    #[test]
    fn test_pixel_accessors() {
        let s = surface();
        s.set_pixel(3, 2, (10, 20, 30)).unwrap();
        assert_eq!(s.pixel(3, 2), Some((10, 20, 30)));
        assert_eq!(s.rgb_at(2 * 48 + 9), (10, 20, 30));
        assert_eq!(s.pixel(16, 0), None);
        assert_eq!(s.set_pixel(0, 4, WHITE), Err(LcdError::OutOfBounds));
    }

    #[test]
    fn test_fill_and_fill_rect() {
        let s = surface();
        s.fill(WHITE);
        assert_eq!(s.pixel(15, 3), Some(WHITE));

        s.fill_rect(14, 2, 10, 10, (0, 0, 0));
        assert_eq!(s.pixel(13, 2), Some(WHITE));
        assert_eq!(s.pixel(14, 2), Some((0, 0, 0)));
        assert_eq!(s.pixel(15, 3), Some((0, 0, 0)));
        assert_eq!(s.pixel(15, 1), Some(WHITE));
    }

    #[test]
    fn test_copy_area_overlapping_right() {
        let s = surface();
        for x in 0..4u16 {
            s.set_pixel(x, 0, (x as u8 + 1, 0, 0)).unwrap();
        }

        // Shift the first four pixels right by two
        s.copy_area(0, 0, 2, 0, 4, 1);

        let reds: [u8; 6] = core::array::from_fn(|x| s.pixel(x as u16, 0).unwrap().0);
        assert_eq!(reds, [1, 2, 1, 2, 3, 4]);
    }

    #[test]
    fn test_copy_area_overlapping_up() {
        let s = surface();
        for y in 0..4u16 {
            s.set_pixel(0, y, (0, y as u8 + 1, 0)).unwrap();
        }

        s.copy_area(0, 1, 0, 0, 1, 3);

        let greens: [u8; 4] = core::array::from_fn(|y| s.pixel(0, y as u16).unwrap().1);
        assert_eq!(greens, [2, 3, 4, 4]);
    }

    #[test]
    fn test_copy_area_clipped() {
        let s = surface();
        s.set_pixel(15, 3, WHITE).unwrap();
        // Destination runs off the surface; nothing panics
        s.copy_area(15, 3, 14, 3, 8, 8);
        assert_eq!(s.pixel(14, 3), Some(WHITE));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        assert!(matches!(
            PixelSurface::new(PanelGeometry::new(10, 4)),
            Err(LcdError::Configuration(_))
        ));
    }

    #[test]
    fn test_allocation_failure_reported() {
        let result = try_alloc_with(usize::MAX, || 0u8);
        assert_eq!(result.unwrap_err(), LcdError::AllocationFailure);
    }
}
