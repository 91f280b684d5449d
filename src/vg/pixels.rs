// pixels.rs - Pixel buffer sizing

//! Sizing rules for caller-supplied pixel buffers.
//!
//! A packed buffer holds `width * height * k` bytes where `k` is the
//! format's [`bytes_per_pixel`](ImageFormat::bytes_per_pixel). With a row
//! stride the engine touches `stride * (height - 1) + width * k` bytes, so
//! the required length is the larger of the two. Buffers handed to the
//! binding must have exactly that length.

use crate::vg::error::{Error, Result, VgError};
use crate::vg::types::ImageFormat;

/// Packed length of a `width` x `height` region; zero for empty regions
pub fn pixel_buffer_len(format: ImageFormat, width: i32, height: i32) -> usize {
    if width <= 0 || height <= 0 {
        return 0;
    }
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(format.bytes_per_pixel())
}

/// Bytes the engine may touch for a strided region
pub fn strided_buffer_len(
    format: ImageFormat,
    stride: i32,
    width: i32,
    height: i32,
) -> Result<usize> {
    if stride < 0 {
        return Err(Error::NegativeStride(stride));
    }
    let packed = pixel_buffer_len(format, width, height);
    if packed == 0 {
        return Ok(0);
    }
    let span = (stride as usize)
        .saturating_mul(height as usize - 1)
        .saturating_add(width as usize * format.bytes_per_pixel());
    Ok(packed.max(span))
}

/// [`strided_buffer_len`] for a raw format code.
///
/// Unknown codes are sized at four bytes per pixel, the widest format.
/// `None` for a negative stride.
#[cfg_attr(not(feature = "native"), allow(dead_code))]
pub(crate) fn raw_region_len(format: u32, stride: i32, width: i32, height: i32) -> Option<usize> {
    let format = ImageFormat::from_u32(format).unwrap_or(ImageFormat::sRGBA_8888);
    strided_buffer_len(format, stride, width, height).ok()
}

/// Zeroed buffer for a read; a length the allocator refuses is out of memory
pub(crate) fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::Native(VgError::OutOfMemory))?;
    data.resize(len, 0);
    Ok(data)
}

/// Reject a buffer whose length differs from the region's
pub(crate) fn check_buffer(
    what: &'static str,
    format: ImageFormat,
    stride: i32,
    width: i32,
    height: i32,
    actual: usize,
) -> Result<()> {
    let expected = strided_buffer_len(format, stride, width, height)?;
    if actual != expected {
        return Err(Error::WrongArgumentLength {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_len() {
        assert_eq!(pixel_buffer_len(ImageFormat::sRGBA_8888, 4, 4), 64);
        assert_eq!(pixel_buffer_len(ImageFormat::sRGB_565, 3, 2), 12);
        assert_eq!(pixel_buffer_len(ImageFormat::A_8, 5, 5), 25);
        assert_eq!(pixel_buffer_len(ImageFormat::sL_8, 0, 5), 0);
        assert_eq!(pixel_buffer_len(ImageFormat::sL_8, 5, -1), 0);
    }

    #[test]
    fn test_stride_span() {
        // Padded rows: the last row needs only width * k bytes
        assert_eq!(
            strided_buffer_len(ImageFormat::sRGBA_8888, 32, 4, 3).unwrap(),
            32 * 2 + 16
        );
        // A short stride never shrinks below the packed size
        assert_eq!(
            strided_buffer_len(ImageFormat::sRGBA_8888, 0, 4, 3).unwrap(),
            48
        );
        assert_eq!(
            strided_buffer_len(ImageFormat::sRGBA_8888, -4, 4, 3),
            Err(Error::NegativeStride(-4))
        );
    }

    #[test]
    fn test_check_buffer() {
        assert!(check_buffer("pixels", ImageFormat::A_8, 2, 2, 2, 4).is_ok());
        assert_eq!(
            check_buffer("pixels", ImageFormat::A_8, 2, 2, 2, 3),
            Err(Error::WrongArgumentLength {
                what: "pixels",
                expected: 4,
                actual: 3,
            })
        );
        assert_eq!(
            check_buffer("pixels", ImageFormat::A_8, 2, 2, 2, 64),
            Err(Error::WrongArgumentLength {
                what: "pixels",
                expected: 4,
                actual: 64,
            })
        );
        // Empty regions take an empty buffer; the engine judges the size
        assert!(check_buffer("pixels", ImageFormat::A_8, 0, 0, 2, 0).is_ok());
    }

    #[test]
    fn test_raw_region_len() {
        assert_eq!(
            raw_region_len(ImageFormat::A_8.to_u32(), 4, 4, 2),
            Some(8)
        );
        // Unknown formats are sized as four bytes per pixel
        assert_eq!(raw_region_len(0xFFFF, 0, 4, 2), Some(32));
        assert_eq!(raw_region_len(ImageFormat::A_8.to_u32(), -1, 4, 2), None);
        // Huge regions saturate instead of overflowing
        assert!(raw_region_len(ImageFormat::sRGBA_8888.to_u32(), 0, i32::MAX, i32::MAX).is_some());
    }

    #[test]
    fn test_alloc_buffer() {
        assert_eq!(alloc_buffer(3).unwrap(), vec![0, 0, 0]);
        assert!(alloc_buffer(0).unwrap().is_empty());
        assert_eq!(
            alloc_buffer(usize::MAX),
            Err(Error::Native(VgError::OutOfMemory))
        );
    }
}
