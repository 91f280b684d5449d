// image.rs - Image handle wrapper

//! Owned image objects and the image filters.
//!
//! A child image is a separate engine handle that shares pixels with its
//! parent. The engine owns the parent link: releasing a child never touches
//! the parent handle, and [`Image::parent`] returns a non-owning handle.
//!
//! Width, height and format are cached at creation; the cached format
//! follows successful writes of `VG_IMAGE_FORMAT`.

use std::sync::Arc;

use crate::vg::backend::{Backend, NativeHandle};
use crate::vg::error::{native_call, Error, Result};
use crate::vg::handle::{ObjectKind, OwnedHandle};
use crate::vg::params::{self, ParamValue, Target};
use crate::vg::pixels::{alloc_buffer, check_buffer, strided_buffer_len};
use crate::vg::types::{
    image_param, ImageChannel, ImageFormat, ImageQuality, TilingMode, LOOKUP_TABLE_SIZE,
};

/// Entries in the engine's color matrix: 4x4 plus one offset column
const COLOR_MATRIX_LEN: usize = 20;

/// A convolution kernel of `width * height` coefficients, row-major
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolveKernel<'a> {
    pub width: i32,
    pub height: i32,
    pub values: &'a [i16],
}

/// Separable kernel: `x` has `width` taps, `y` has `height`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparableKernel<'a> {
    pub width: i32,
    pub height: i32,
    pub x: &'a [i16],
    pub y: &'a [i16],
}

/// Shift, scale, bias and edge handling shared by both convolutions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convolution {
    pub shift_x: i32,
    pub shift_y: i32,
    pub scale: f32,
    pub bias: f32,
    pub tiling_mode: TilingMode,
}

impl Default for Convolution {
    fn default() -> Self {
        Convolution {
            shift_x: 0,
            shift_y: 0,
            scale: 1.0,
            bias: 0.0,
            tiling_mode: TilingMode::Pad,
        }
    }
}

fn kernel_len(width: i32, height: i32) -> usize {
    width.max(0) as usize * height.max(0) as usize
}

fn lookup_table<'a, T>(what: &'static str, table: &'a [T]) -> Result<&'a [T; LOOKUP_TABLE_SIZE]> {
    table.try_into().map_err(|_| Error::WrongArgumentLength {
        what,
        expected: LOOKUP_TABLE_SIZE,
        actual: table.len(),
    })
}

/// An engine image object
#[derive(Debug)]
pub struct Image {
    handle: OwnedHandle,
    format: ImageFormat,
    width: i32,
    height: i32,
}

impl Image {
    pub fn new(
        backend: Arc<dyn Backend>,
        format: ImageFormat,
        width: i32,
        height: i32,
        allowed_quality: ImageQuality,
    ) -> Result<Image> {
        let handle = OwnedHandle::acquire(backend, ObjectKind::Image, |vg| {
            vg.create_image(format.to_u32(), width, height, allowed_quality.bits())
        })?;
        Ok(Image {
            handle,
            format,
            width,
            height,
        })
    }

    pub fn handle(&self) -> Result<NativeHandle> {
        self.handle.get()
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.handle.backend()
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_released()
    }

    pub fn release(&mut self) -> Result<()> {
        self.handle.release()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn vg(&self) -> &dyn Backend {
        &**self.handle.backend()
    }

    /// A new image sharing the pixels of a region of this one
    pub fn child(&self, x: i32, y: i32, width: i32, height: i32) -> Result<Image> {
        let parent = self.handle()?;
        let handle = OwnedHandle::acquire(self.backend().clone(), ObjectKind::Image, |vg| {
            vg.child_image(parent, x, y, width, height)
        })?;
        Ok(Image {
            handle,
            format: self.format,
            width,
            height,
        })
    }

    /// Nearest live ancestor, or this image's own handle
    pub fn parent(&self) -> Result<NativeHandle> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.get_parent(handle))
    }

    /// Fill a region with `VG_CLEAR_COLOR`
    pub fn clear(&self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.clear_image(handle, x, y, width, height))
    }

    pub fn draw(&self) -> Result<()> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.draw_image(handle))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_from(
        &self,
        dx: i32,
        dy: i32,
        src: &Image,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
        dither: bool,
    ) -> Result<()> {
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| {
            vg.copy_image(dst, dx, dy, src, sx, sy, width, height, dither)
        })
    }

    /// Read a region as raw bytes in `format`
    pub fn sub_data(
        &self,
        stride: i32,
        format: ImageFormat,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<Vec<u8>> {
        let handle = self.handle()?;
        let mut data = alloc_buffer(strided_buffer_len(format, stride, width, height)?)?;
        native_call(self.vg(), |vg| {
            vg.get_image_sub_data(
                handle,
                &mut data,
                stride,
                format.to_u32(),
                x,
                y,
                width,
                height,
            )
        })?;
        Ok(data)
    }

    /// Write raw bytes in `format` into a region
    #[allow(clippy::too_many_arguments)]
    pub fn set_sub_data(
        &self,
        data: &[u8],
        stride: i32,
        format: ImageFormat,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        let handle = self.handle()?;
        check_buffer("image data", format, stride, width, height, data.len())?;
        native_call(self.vg(), |vg| {
            vg.image_sub_data(handle, data, stride, format.to_u32(), x, y, width, height)
        })
    }

    /// Apply a color matrix read from `src`.
    ///
    /// Accepts the full 20-entry matrix or a 4x4 one, which gets zero offsets.
    pub fn color_matrix(&self, src: &Image, matrix: &[f32]) -> Result<()> {
        let mut full = [0f32; COLOR_MATRIX_LEN];
        match matrix.len() {
            16 | COLOR_MATRIX_LEN => full[..matrix.len()].copy_from_slice(matrix),
            actual => {
                return Err(Error::WrongArgumentLength {
                    what: "4x5 color matrix (4x4 also accepted)",
                    expected: COLOR_MATRIX_LEN,
                    actual,
                })
            }
        }
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| vg.color_matrix(dst, src, &full))
    }

    pub fn convolve(
        &self,
        src: &Image,
        kernel: &ConvolveKernel<'_>,
        conv: &Convolution,
    ) -> Result<()> {
        let expected = kernel_len(kernel.width, kernel.height);
        if kernel.values.len() != expected {
            return Err(Error::WrongArgumentLength {
                what: "convolution kernel",
                expected,
                actual: kernel.values.len(),
            });
        }
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| {
            vg.convolve(
                dst,
                src,
                kernel.width,
                kernel.height,
                conv.shift_x,
                conv.shift_y,
                kernel.values,
                conv.scale,
                conv.bias,
                conv.tiling_mode as u32,
            )
        })
    }

    pub fn separable_convolve(
        &self,
        src: &Image,
        kernel: &SeparableKernel<'_>,
        conv: &Convolution,
    ) -> Result<()> {
        if kernel.x.len() != kernel.width.max(0) as usize {
            return Err(Error::WrongArgumentLength {
                what: "horizontal kernel",
                expected: kernel.width.max(0) as usize,
                actual: kernel.x.len(),
            });
        }
        if kernel.y.len() != kernel.height.max(0) as usize {
            return Err(Error::WrongArgumentLength {
                what: "vertical kernel",
                expected: kernel.height.max(0) as usize,
                actual: kernel.y.len(),
            });
        }
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| {
            vg.separable_convolve(
                dst,
                src,
                kernel.width,
                kernel.height,
                conv.shift_x,
                conv.shift_y,
                kernel.x,
                kernel.y,
                conv.scale,
                conv.bias,
                conv.tiling_mode as u32,
            )
        })
    }

    pub fn gaussian_blur(
        &self,
        src: &Image,
        std_deviation_x: f32,
        std_deviation_y: f32,
        tiling_mode: TilingMode,
    ) -> Result<()> {
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| {
            vg.gaussian_blur(
                dst,
                src,
                std_deviation_x,
                std_deviation_y,
                tiling_mode as u32,
            )
        })
    }

    /// Map each channel of `src` through its own 256-entry table
    #[allow(clippy::too_many_arguments)]
    pub fn lookup(
        &self,
        src: &Image,
        red: &[u8],
        green: &[u8],
        blue: &[u8],
        alpha: &[u8],
        output_linear: bool,
        output_premultiplied: bool,
    ) -> Result<()> {
        let red = lookup_table("red lookup table", red)?;
        let green = lookup_table("green lookup table", green)?;
        let blue = lookup_table("blue lookup table", blue)?;
        let alpha = lookup_table("alpha lookup table", alpha)?;
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| {
            vg.lookup(
                dst,
                src,
                red,
                green,
                blue,
                alpha,
                output_linear,
                output_premultiplied,
            )
        })
    }

    /// Map one channel of `src` to packed RGBA through a single table
    pub fn lookup_single(
        &self,
        src: &Image,
        table: &[u32],
        source_channel: ImageChannel,
        output_linear: bool,
        output_premultiplied: bool,
    ) -> Result<()> {
        let table = lookup_table("lookup table", table)?;
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| {
            vg.lookup_single(
                dst,
                src,
                table,
                source_channel as u32,
                output_linear,
                output_premultiplied,
            )
        })
    }

    pub fn get(&self, key: u32) -> Result<ParamValue> {
        params::get(self.vg(), Target::Image(self.handle()?), key)
    }

    pub fn set(&mut self, key: u32, value: ParamValue) -> Result<()> {
        let handle = self.handle()?;
        let format = match (key, &value) {
            (image_param::FORMAT, ParamValue::Int(code)) => ImageFormat::from_u32(*code as u32),
            _ => None,
        };
        params::set(self.vg(), Target::Image(handle), key, value)?;
        if let Some(format) = format {
            self.format = format;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vg::error::VgError;
    use crate::vg::mock::MockBackend;

    fn setup() -> (Arc<MockBackend>, Image) {
        let mock = Arc::new(MockBackend::new());
        assert!(mock.create_context(16, 16));
        let backend: Arc<dyn Backend> = mock.clone();
        let image = Image::new(backend, ImageFormat::sRGBA_8888, 4, 4, ImageQuality::FASTER).unwrap();
        (mock, image)
    }

    fn sibling(mock: &Arc<MockBackend>) -> Image {
        let backend: Arc<dyn Backend> = mock.clone();
        Image::new(backend, ImageFormat::sRGBA_8888, 4, 4, ImageQuality::FASTER).unwrap()
    }

    #[test]
    fn test_child_parent_link() {
        let (_mock, image) = setup();
        let child = image.child(1, 1, 2, 2).unwrap();
        assert_eq!(child.parent().unwrap(), image.handle().unwrap());
        assert_eq!((child.width(), child.height()), (2, 2));
        assert_eq!(image.parent().unwrap(), image.handle().unwrap());
    }

    #[test]
    fn test_dropping_child_keeps_parent() {
        let (mock, image) = setup();
        let child = image.child(0, 0, 2, 2).unwrap();
        drop(child);
        assert_eq!(mock.calls("vgDestroyImage"), 1);
        assert!(mock.is_live(image.handle().unwrap()));
        image.clear(0, 0, 4, 4).unwrap();
    }

    #[test]
    fn test_sub_data_roundtrip() {
        let (_mock, image) = setup();
        let pixels: Vec<u8> = (0..16).collect();
        image
            .set_sub_data(&pixels, 8, ImageFormat::sRGBA_8888, 1, 1, 2, 2)
            .unwrap();
        let back = image.sub_data(8, ImageFormat::sRGBA_8888, 1, 1, 2, 2).unwrap();
        assert_eq!(back, pixels);
    }

    #[test]
    fn test_short_buffer_makes_no_call() {
        let (mock, image) = setup();
        mock.reset_calls();
        let err = image
            .set_sub_data(&[0u8; 15], 8, ImageFormat::sRGBA_8888, 0, 0, 2, 2)
            .unwrap_err();
        assert_eq!(
            err,
            Error::WrongArgumentLength {
                what: "image data",
                expected: 16,
                actual: 15,
            }
        );
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    fn test_oversized_buffer_makes_no_call() {
        let (mock, image) = setup();
        mock.reset_calls();
        let err = image
            .set_sub_data(&[0u8; 20], 8, ImageFormat::sRGBA_8888, 0, 0, 2, 2)
            .unwrap_err();
        assert_eq!(
            err,
            Error::WrongArgumentLength {
                what: "image data",
                expected: 16,
                actual: 20,
            }
        );
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    fn test_empty_region_is_reported_by_engine() {
        let (mock, image) = setup();
        mock.reset_calls();
        assert_eq!(
            image.sub_data(0, ImageFormat::sRGBA_8888, 0, 0, 0, 4),
            Err(Error::Native(VgError::IllegalArgument))
        );
        assert_eq!(
            image.sub_data(0, ImageFormat::sRGBA_8888, 0, 0, 4, -2),
            Err(Error::Native(VgError::IllegalArgument))
        );
        assert_eq!(
            image.set_sub_data(&[], 0, ImageFormat::sRGBA_8888, 0, 0, 0, 4),
            Err(Error::Native(VgError::IllegalArgument))
        );
        assert_eq!(mock.calls("vgGetImageSubData"), 2);
        assert_eq!(mock.calls("vgImageSubData"), 1);
    }

    #[test]
    fn test_pixel_access_needs_context() {
        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();
        let image = Image::new(backend, ImageFormat::sRGBA_8888, 4, 4, ImageQuality::FASTER).unwrap();

        assert_eq!(
            image.sub_data(0, ImageFormat::sRGBA_8888, 0, 0, 0, 4),
            Err(Error::Native(VgError::NoContext))
        );
        assert_eq!(
            image.sub_data(16, ImageFormat::sRGBA_8888, 0, 0, 4, 1),
            Err(Error::Native(VgError::NoContext))
        );
        assert_eq!(
            image.set_sub_data(&[0u8; 4], 4, ImageFormat::sRGBA_8888, 0, 0, 1, 1),
            Err(Error::Native(VgError::NoContext))
        );
    }

    #[test]
    fn test_color_matrix_lengths() {
        let (mock, image) = setup();
        let src = sibling(&mock);
        let mut identity = [0f32; 16];
        for i in 0..4 {
            identity[i * 5] = 1.0;
        }
        image.color_matrix(&src, &identity).unwrap();
        image.color_matrix(&src, &[0.0; 20]).unwrap();

        mock.reset_calls();
        let err = image.color_matrix(&src, &[0.0; 12]).unwrap_err();
        assert!(matches!(err, Error::WrongArgumentLength { actual: 12, .. }));
        assert!(err.to_string().contains("4x4 also accepted"));
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    fn test_convolve_kernel_size() {
        let (mock, image) = setup();
        let src = sibling(&mock);
        let values = [1i16; 9];
        let kernel = ConvolveKernel {
            width: 3,
            height: 3,
            values: &values,
        };
        image.convolve(&src, &kernel, &Convolution::default()).unwrap();

        let short = ConvolveKernel {
            width: 3,
            height: 3,
            values: &values[..8],
        };
        let err = image
            .convolve(&src, &short, &Convolution::default())
            .unwrap_err();
        assert!(matches!(err, Error::WrongArgumentLength { expected: 9, .. }));
    }

    #[test]
    fn test_lookup_tables() {
        let (mock, image) = setup();
        let src = sibling(&mock);
        let identity: Vec<u8> = (0..=255).collect();
        src.set_sub_data(&[10, 20, 30, 40], 4, ImageFormat::sRGBA_8888, 0, 0, 1, 1)
            .unwrap();

        let inverted: Vec<u8> = identity.iter().map(|v| 255 - v).collect();
        image
            .lookup(&src, &inverted, &identity, &identity, &identity, false, false)
            .unwrap();
        let out = image.sub_data(4, ImageFormat::sRGBA_8888, 0, 0, 1, 1).unwrap();
        assert_eq!(out, vec![245, 20, 30, 40]);

        let err = image
            .lookup(&src, &identity[..255], &identity, &identity, &identity, false, false)
            .unwrap_err();
        assert!(matches!(err, Error::WrongArgumentLength { expected: 256, .. }));
    }

    #[test]
    fn test_filter_on_same_image_is_rejected() {
        let (_mock, image) = setup();
        let err = image
            .gaussian_blur(&image, 1.0, 1.0, TilingMode::Pad)
            .unwrap_err();
        assert_eq!(err, Error::Native(VgError::IllegalArgument));
    }

    #[test]
    fn test_dimensions_are_read_only() {
        let (mock, mut image) = setup();
        mock.reset_calls();
        let err = image
            .set(image_param::WIDTH, ParamValue::Int(8))
            .unwrap_err();
        assert_eq!(err, Error::ReadOnlyParameter("VG_IMAGE_WIDTH"));
        assert_eq!(mock.total_calls(), 0);
        assert_eq!(image.get(image_param::WIDTH).unwrap(), ParamValue::Int(4));
    }

    #[test]
    fn test_format_update_is_cached() {
        let (_mock, mut image) = setup();
        image
            .set(
                image_param::FORMAT,
                ParamValue::Int(ImageFormat::lRGBA_8888 as i32),
            )
            .unwrap();
        assert_eq!(image.format(), ImageFormat::lRGBA_8888);
    }
}
