//! RGB888 → 1bpp frame encoder
//!
//! Converts the 24-bit pixel surface into the packed line data of a
//! [`TransmitFrame`]. Pure and allocation-free: the only side effect is
//! writing the frame's data bytes.
//!
//! Each pixel is reduced to an approximate luma
//! `R/3 + G/2 + B/9` (roughly 33/50/11 % weights; integer division is
//! applied per channel) and lit when that value reaches
//! [`LUMA_THRESHOLD`]. Eight horizontal pixels pack into one byte with the
//! leftmost pixel in bit 7.

use crate::config::{PanelGeometry, BYTES_PER_PIXEL};
use crate::frame::{FrameError, TransmitFrame};

/// Luma at or above which a pixel is lit
pub const LUMA_THRESHOLD: u8 = 128;

/// Read access to an RGB888 pixel surface
///
/// Implemented for plain byte slices; the driver implements it for its
/// shared surface so the encoder can read while writers keep writing.
pub trait PixelSource {
    /// Surface size in bytes
    fn len(&self) -> usize;

    /// Byte at `index`
    fn byte_at(&self, index: usize) -> u8;

    /// True if the surface holds no bytes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The (R, G, B) triple starting at `offset`
    fn rgb_at(&self, offset: usize) -> (u8, u8, u8) {
        (
            self.byte_at(offset),
            self.byte_at(offset + 1),
            self.byte_at(offset + 2),
        )
    }
}

impl PixelSource for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn byte_at(&self, index: usize) -> u8 {
        self[index]
    }
}

/// Approximate luma of an RGB888 pixel
///
/// The maximum is 85 + 127 + 28 = 240, so the sum never overflows.
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    r / 3 + g / 2 + b / 9
}

/// Whether an RGB888 pixel is lit on the panel
pub const fn is_on(r: u8, g: u8, b: u8) -> bool {
    luma(r, g, b) >= LUMA_THRESHOLD
}

/// Encode surface line `y` into `out` (`width / 8` bytes)
///
/// Lines are independent, so callers may encode them in any order or in
/// parallel; the result is identical to [`encode`]. A line that is past
/// the panel's height or not fully inside `source` leaves `out` untouched.
pub fn encode_line<S>(source: &S, geometry: PanelGeometry, y: u16, out: &mut [u8])
where
    S: PixelSource + ?Sized,
{
    let line_start = y as usize * geometry.line_bytes();
    if y >= geometry.height || line_start + geometry.line_bytes() > source.len() {
        return;
    }

    for (group, byte) in out
        .iter_mut()
        .take(geometry.data_bytes_per_line())
        .enumerate()
    {
        let mut packed = 0u8;
        for bit in 0..8 {
            let x = group * 8 + bit;
            let (r, g, b) = source.rgb_at(line_start + x * BYTES_PER_PIXEL);
            if is_on(r, g, b) {
                packed |= 1 << (7 - bit);
            }
        }
        *byte = packed;
    }
}

/// Re-encode every line of `frame` from `source`, top to bottom
pub fn encode<S, B>(source: &S, frame: &mut TransmitFrame<B>) -> Result<(), FrameError>
where
    S: PixelSource + ?Sized,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    let geometry = frame.geometry();
    if source.len() < geometry.surface_len() {
        return Err(FrameError::SourceTooSmall);
    }

    for (y, line) in frame.lines_mut().enumerate() {
        encode_line(source, geometry, y as u16, line);
    }

    Ok(())
}
