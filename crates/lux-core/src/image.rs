//! 8-bit RGBA raster buffer.
//!
//! [`RasterImage`] is the only pixel container the engine works with. Pixels
//! are sRGB encoded, stored row-major top-to-bottom with interleaved alpha:
//!
//! ```text
//! Memory: [R G B A R G B A ... pad]  <- Row 0 (stride bytes)
//!         [R G B A R G B A ... pad]  <- Row 1
//!         ...
//! ```
//!
//! Decoders frequently hand out padded rows, so the row stride is explicit
//! and may exceed `width * 4`. Kernels that want the packed fast path ask
//! for [`RasterImage::packed_data`] and fall back to per-row access when it
//! returns `None`.
//!
//! # Sharing
//!
//! Pixel data lives behind an [`Arc`], so cloning an image is cheap and a
//! session can keep the source alive while renders produce new buffers.
//! Mutation goes through [`RasterImage::set_pixel`] / [`RasterImage::data_mut`]
//! which detach the buffer first (copy-on-write).
//!
//! # Usage
//!
//! ```rust
//! use lux_core::RasterImage;
//!
//! let mut img = RasterImage::new(2, 2);
//! img.set_pixel(1, 0, [255, 128, 0, 255]);
//! assert_eq!(img.pixel(1, 0), [255, 128, 0, 255]);
//! assert!(img.packed_data().is_some());
//! ```

use std::sync::Arc;

use crate::error::{Error, Result};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// 8-bit RGBA image with explicit row stride.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    data: Arc<Vec<u8>>,
    width: u32,
    height: u32,
    stride: usize,
}

impl RasterImage {
    /// Creates a zero-filled, tightly packed image.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width as usize * BYTES_PER_PIXEL;
        Self {
            data: Arc::new(vec![0; stride * height as usize]),
            width,
            height,
            stride,
        }
    }

    /// Wraps a tightly packed RGBA8 buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSizeMismatch`] if `data.len() != width * height * 4`.
    pub fn from_rgba8(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let stride = row_bytes(width, height)?;
        let expected = checked_len(stride, height, width)?;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            stride,
        })
    }

    /// Wraps an RGBA8 buffer whose rows are `stride` bytes apart.
    ///
    /// The final row only needs `width * 4` bytes; trailing padding after it
    /// may be absent.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidStride`] if `stride < width * 4`
    /// - [`Error::BufferSizeMismatch`] if the buffer is too short
    pub fn from_raw_parts(data: Vec<u8>, width: u32, height: u32, stride: usize) -> Result<Self> {
        let min_stride = row_bytes(width, height)?;
        if stride < min_stride {
            return Err(Error::InvalidStride {
                stride,
                min_stride,
                width,
            });
        }
        let expected = if height == 0 {
            0
        } else {
            checked_len(stride, height - 1, width)?
                .checked_add(min_stride)
                .ok_or_else(|| Error::invalid_dimensions(width, height, "buffer size overflows usize"))?
        };
        if data.len() < expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            stride,
        })
    }

    /// Expands a tightly packed RGB8 buffer to RGBA8 with opaque alpha.
    pub fn from_rgb8(data: &[u8], width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let mut rgba = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for px in data.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        Self::from_rgba8(rgba, width, height)
    }

    /// Creates an image where every pixel has the same value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&rgba);
        }
        Self {
            data: Arc::new(data),
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
        }
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance between rows in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if rows are adjacent with no padding.
    #[inline]
    pub fn is_packed(&self) -> bool {
        self.stride == self.width as usize * BYTES_PER_PIXEL
    }

    /// Raw backing buffer including any row padding.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable backing buffer; detaches shared storage first.
    pub fn data_mut(&mut self) -> &mut [u8] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// The backing buffer when it holds exactly `width * height * 4` bytes.
    pub fn packed_data(&self) -> Option<&[u8]> {
        let len = self.pixel_count() * BYTES_PER_PIXEL;
        (self.is_packed() && self.data.len() == len).then(|| self.data.as_slice())
    }

    /// Payload bytes of row `y` (without padding).
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// Iterates over the payload bytes of every row.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Gets the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Gets the pixel at (x, y), or an error when out of bounds.
    pub fn try_pixel(&self, x: u32, y: u32) -> Result<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.pixel(x, y))
    }

    /// Sets the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        self.data_mut()[i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Copies the pixels into a tightly packed buffer.
    pub fn to_packed(&self) -> Vec<u8> {
        if let Some(packed) = self.packed_data() {
            return packed.to_vec();
        }
        let mut out = Vec::with_capacity(self.pixel_count() * BYTES_PER_PIXEL);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }

    /// Returns a tightly packed copy (or a cheap clone when already packed).
    pub fn packed(&self) -> Self {
        if self.packed_data().is_some() {
            return self.clone();
        }
        Self {
            data: Arc::new(self.to_packed()),
            width: self.width,
            height: self.height,
            stride: self.width as usize * BYTES_PER_PIXEL,
        }
    }
}

fn row_bytes(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .ok_or_else(|| Error::invalid_dimensions(width, height, "row size overflows usize"))
}

fn checked_len(stride: usize, rows: u32, width: u32) -> Result<usize> {
    stride
        .checked_mul(rows as usize)
        .ok_or_else(|| Error::invalid_dimensions(width, rows, "buffer size overflows usize"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_packed() {
        let img = RasterImage::new(3, 2);
        assert_eq!(img.stride(), 12);
        assert_eq!(img.data().len(), 24);
        assert!(img.is_packed());
        assert!(!img.is_empty());
    }

    #[test]
    fn test_from_rgba8_rejects_wrong_length() {
        let err = RasterImage::from_rgba8(vec![0; 15], 2, 2).unwrap_err();
        assert!(matches!(err, Error::BufferSizeMismatch { expected: 16, actual: 15 }));
    }

    #[test]
    fn test_from_raw_parts_padded() {
        // 2x2 image, 12-byte rows (4 bytes padding), last row unpadded
        let mut data = vec![0u8; 12 + 8];
        data[12..16].copy_from_slice(&[1, 2, 3, 4]);
        let img = RasterImage::from_raw_parts(data, 2, 2, 12).unwrap();
        assert!(!img.is_packed());
        assert!(img.packed_data().is_none());
        assert_eq!(img.pixel(0, 1), [1, 2, 3, 4]);
        assert_eq!(img.row(1).len(), 8);

        let packed = img.to_packed();
        assert_eq!(packed.len(), 16);
        assert_eq!(&packed[8..12], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_from_raw_parts_rejects_small_stride() {
        let err = RasterImage::from_raw_parts(vec![0; 64], 4, 2, 8).unwrap_err();
        assert!(matches!(err, Error::InvalidStride { stride: 8, min_stride: 16, .. }));
    }

    #[test]
    fn test_from_raw_parts_rejects_short_buffer() {
        let err = RasterImage::from_raw_parts(vec![0; 19], 2, 2, 12).unwrap_err();
        assert!(matches!(err, Error::BufferSizeMismatch { expected: 20, actual: 19 }));
    }

    #[test]
    fn test_from_rgb8() {
        let img = RasterImage::from_rgb8(&[10, 20, 30, 40, 50, 60], 2, 1).unwrap();
        assert_eq!(img.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(img.pixel(1, 0), [40, 50, 60, 255]);
    }

    #[test]
    fn test_copy_on_write() {
        let a = RasterImage::filled(2, 2, [9, 9, 9, 255]);
        let mut b = a.clone();
        b.set_pixel(0, 0, [0, 0, 0, 0]);
        assert_eq!(a.pixel(0, 0), [9, 9, 9, 255]);
        assert_eq!(b.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_try_pixel_out_of_bounds() {
        let img = RasterImage::new(1, 1);
        assert!(img.try_pixel(0, 0).is_ok());
        assert!(matches!(img.try_pixel(1, 0), Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn test_empty() {
        let img = RasterImage::new(0, 5);
        assert!(img.is_empty());
        assert_eq!(img.pixel_count(), 0);
        assert_eq!(img.to_packed().len(), 0);
    }
}
