//! Transmit frame layout for Sharp memory LCDs
//!
//! Frame format (multi-line write):
//! - MODE (1 byte): 0x80, write-line command
//! - per line:
//!   - ADDRESS (1 byte): 1-based line number, bit-reversed
//!   - DATA (width/8 bytes): 1bpp pixels, MSB = leftmost
//!   - TRAILER (1 byte): 0x00 dummy
//! - TERMINATOR (1 byte): 0x00 dummy
//!
//! Everything except the data bytes is written once when the frame is
//! created and never touched again.

use crate::config::PanelGeometry;

/// Mode byte: write data
pub const MODE_WRITE: u8 = 0x80;

/// Dummy byte after each line's data
pub const LINE_TRAILER: u8 = 0x00;

/// Dummy byte closing the transfer
pub const FRAME_TERMINATOR: u8 = 0x00;

/// Errors that can occur while setting up a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Backing buffer length does not match the geometry
    LengthMismatch {
        /// Required length
        expected: usize,
        /// Provided length
        actual: usize,
    },
    /// Geometry cannot be expressed in the line protocol
    InvalidGeometry,
    /// Pixel source is smaller than the geometry's surface
    SourceTooSmall,
}

/// Reverse the bit order of a byte (bit 0 ↔ bit 7, bit 1 ↔ bit 6, ...)
pub const fn reverse_bits(mut b: u8) -> u8 {
    b = (b & 0xF0) >> 4 | (b & 0x0F) << 4;
    b = (b & 0xCC) >> 2 | (b & 0x33) << 2;
    b = (b & 0xAA) >> 1 | (b & 0x55) << 1;
    b
}

/// Address byte for 0-based line `y`
pub const fn line_address(y: u16) -> u8 {
    reverse_bits((y + 1) as u8)
}

/// A complete multi-line write, ready to be clocked out
///
/// Generic over its backing storage so the driver can hand in a heap
/// buffer and firmware a `static` array.
#[derive(Debug)]
pub struct TransmitFrame<B> {
    buffer: B,
    geometry: PanelGeometry,
}

impl<B> TransmitFrame<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Lay out a frame in `buffer`
    ///
    /// Writes the mode byte, every line address, trailers and the
    /// terminator, and clears the data region.
    pub fn new(mut buffer: B, geometry: PanelGeometry) -> Result<Self, FrameError> {
        geometry
            .validate()
            .map_err(|_| FrameError::InvalidGeometry)?;

        let expected = geometry.frame_len();
        let actual = buffer.as_ref().len();
        if actual != expected {
            return Err(FrameError::LengthMismatch { expected, actual });
        }

        let bytes = buffer.as_mut();
        let stride = geometry.frame_line_len();

        bytes[0] = MODE_WRITE;
        for (y, line) in bytes[1..expected - 1].chunks_exact_mut(stride).enumerate() {
            line[0] = line_address(y as u16);
            line[1..stride - 1].fill(0);
            line[stride - 1] = LINE_TRAILER;
        }
        bytes[expected - 1] = FRAME_TERMINATOR;

        Ok(Self { buffer, geometry })
    }

    /// Geometry this frame was laid out for
    pub fn geometry(&self) -> PanelGeometry {
        self.geometry
    }

    /// The full frame as sent on the wire
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Address byte of line `y`
    pub fn line_address(&self, y: u16) -> u8 {
        self.as_bytes()[self.line_offset(y)]
    }

    /// Packed data bytes of line `y`
    pub fn line_data(&self, y: u16) -> &[u8] {
        let start = self.line_offset(y) + 1;
        &self.as_bytes()[start..start + self.geometry.data_bytes_per_line()]
    }

    /// Mutable packed data bytes of line `y`
    ///
    /// This is the only mutable view into the frame; the framing bytes
    /// around it stay fixed.
    pub fn line_data_mut(&mut self, y: u16) -> &mut [u8] {
        let start = self.line_offset(y) + 1;
        let len = self.geometry.data_bytes_per_line();
        &mut self.buffer.as_mut()[start..start + len]
    }

    /// Iterate over mutable data regions, top line first
    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        let stride = self.geometry.frame_line_len();
        let data_len = self.geometry.data_bytes_per_line();
        let end = self.geometry.frame_len() - 1;
        self.buffer.as_mut()[1..end]
            .chunks_exact_mut(stride)
            .map(move |line| &mut line[1..1 + data_len])
    }

    /// Give the backing buffer back
    pub fn into_inner(self) -> B {
        self.buffer
    }

    fn line_offset(&self, y: u16) -> usize {
        1 + y as usize * self.geometry.frame_line_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: PanelGeometry = PanelGeometry::new(128, 128);

    fn frame() -> TransmitFrame<[u8; 18 * 128 + 2]> {
        TransmitFrame::new([0xAA; 18 * 128 + 2], G).unwrap()
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0x01), 0x80);
        assert_eq!(reverse_bits(0x02), 0x40);
        assert_eq!(reverse_bits(0x03), 0xC0);
        assert_eq!(reverse_bits(0x80), 0x01);
        assert_eq!(reverse_bits(0xF0), 0x0F);
        for b in 0..=255u8 {
            assert_eq!(reverse_bits(b), b.reverse_bits());
        }
    }

    #[test]
    fn test_layout() {
        let f = frame();
        let bytes = f.as_bytes();

        assert_eq!(bytes.len(), 2306);
        assert_eq!(bytes[0], MODE_WRITE);
        assert_eq!(bytes[1], 0x80); // line 1
        assert_eq!(bytes[19], 0x40); // line 2
        assert_eq!(bytes[18], LINE_TRAILER);
        assert_eq!(bytes[2305], FRAME_TERMINATOR);
        assert!(bytes[2..18].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_every_line_address() {
        let f = frame();
        for y in 0..128u16 {
            assert_eq!(f.line_address(y), ((y + 1) as u8).reverse_bits());
        }
        // Last line is 128 = 0b1000_0000 -> 0b0000_0001
        assert_eq!(f.line_address(127), 0x01);
    }

    #[test]
    fn test_data_writes_stay_in_region() {
        let mut f = frame();
        for line in f.lines_mut() {
            line.fill(0xFF);
        }

        for y in 0..128u16 {
            assert_eq!(f.line_address(y), line_address(y));
            assert!(f.line_data(y).iter().all(|&b| b == 0xFF));
        }
        let bytes = f.as_bytes();
        assert_eq!(bytes[0], MODE_WRITE);
        assert_eq!(bytes[18], LINE_TRAILER);
        assert_eq!(bytes[2305], FRAME_TERMINATOR);
    }

    #[test]
    fn test_line_data_mut_offsets() {
        let mut f = frame();
        f.line_data_mut(1)[0] = 0x5A;
        assert_eq!(f.as_bytes()[20], 0x5A);
        assert_eq!(f.line_data(1)[0], 0x5A);
        assert_eq!(f.line_data(0)[0], 0x00);
    }

    #[test]
    fn test_length_mismatch() {
        let err = TransmitFrame::new([0u8; 100], G).unwrap_err();
        assert_eq!(
            err,
            FrameError::LengthMismatch {
                expected: 2306,
                actual: 100
            }
        );
    }

    #[test]
    fn test_invalid_geometry() {
        let err = TransmitFrame::new([0u8; 4], PanelGeometry::new(12, 1)).unwrap_err();
        assert_eq!(err, FrameError::InvalidGeometry);
    }
}
