// context.rs - Process-wide drawing context

//! The drawing context singleton.
//!
//! The engine supports one context per process. [`Context`] is a cheap
//! clonable handle to it; the native context lives until the last clone is
//! dropped. A static slot holds a weak reference to the live context so a
//! second [`Context::create`] on the same backend joins it (resizing if
//! asked) instead of creating another, while a request on a different
//! backend fails with [`Error::ContextInUse`].
//!
//! After the last clone is dropped the slot is empty again and a fresh
//! context can be created.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::ContextOptions;
use crate::vg::backend::{Backend, NativeHandle};
use crate::vg::error::{check, native_call, Error, Result};
use crate::vg::image::Image;
use crate::vg::paint::Paint;
use crate::vg::params::{self, ParamValue, Target};
use crate::vg::pixels::{alloc_buffer, check_buffer, strided_buffer_len};
use crate::vg::types::{
    param_type, HardwareQueryResult, HardwareQueryType, ImageFormat, MaskOperation, MatrixMode,
    PaintMode, StringId,
};

const MATRIX_LEN: usize = 9;

static CONTEXT_SLOT: Mutex<Option<Weak<ContextInner>>> = Mutex::new(None);

struct ContextInner {
    backend: Arc<dyn Backend>,
    size: Mutex<(i32, i32)>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        let mut slot = CONTEXT_SLOT.lock();
        let (width, height) = *self.size.get_mut();
        log::debug!("destroying {}x{} context", width, height);
        if let Err(e) = native_call(&*self.backend, |vg| vg.destroy_context()) {
            log::warn!("failed to destroy context: {}", e);
        }
        let ours = slot
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), self as *const ContextInner));
        if ours {
            *slot = None;
        }
    }
}

fn same_backend(a: &Arc<dyn Backend>, b: &Arc<dyn Backend>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

fn matrix_from_slice(m: &[f32]) -> Result<[f32; MATRIX_LEN]> {
    m.try_into().map_err(|_| Error::WrongArgumentLength {
        what: "matrix",
        expected: MATRIX_LEN,
        actual: m.len(),
    })
}

/// Shared handle to the live drawing context
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("size", &self.size()).finish()
    }
}

impl Context {
    /// Create the context, or join the live one on the same backend
    pub fn create(backend: Arc<dyn Backend>, width: i32, height: i32) -> Result<Context> {
        let mut slot = CONTEXT_SLOT.lock();
        if let Some(inner) = slot.as_ref().and_then(Weak::upgrade) {
            drop(slot);
            if !same_backend(&inner.backend, &backend) {
                return Err(Error::ContextInUse);
            }
            let ctx = Context { inner };
            ctx.resize(width, height)?;
            return Ok(ctx);
        }

        if !backend.create_context(width, height) {
            return Err(Error::ContextCreationFailed { width, height });
        }
        if let Err(e) = check(&*backend) {
            backend.destroy_context();
            let _ = backend.get_error();
            return Err(e);
        }

        log::debug!("created {}x{} context", width, height);
        let inner = Arc::new(ContextInner {
            backend,
            size: Mutex::new((width, height)),
        });
        *slot = Some(Arc::downgrade(&inner));
        Ok(Context { inner })
    }

    /// Create the context and apply the configured options
    pub fn with_options(backend: Arc<dyn Backend>, opts: &ContextOptions) -> Result<Context> {
        let ctx = Context::create(backend, opts.size.width, opts.size.height)?;
        if let Some(color) = opts.clear_color {
            ctx.set(param_type::CLEAR_COLOR, color.to_vec().into())?;
        }
        Ok(ctx)
    }

    /// True while some `Context` handle is alive
    pub fn is_active() -> bool {
        CONTEXT_SLOT
            .lock()
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    fn vg(&self) -> &dyn Backend {
        &*self.inner.backend
    }

    pub fn width(&self) -> i32 {
        self.inner.size.lock().0
    }

    pub fn height(&self) -> i32 {
        self.inner.size.lock().1
    }

    pub fn size(&self) -> (i32, i32) {
        *self.inner.size.lock()
    }

    /// Resize the drawing surface; a no-op for the current size
    pub fn resize(&self, width: i32, height: i32) -> Result<()> {
        let mut size = self.inner.size.lock();
        if *size == (width, height) {
            return Ok(());
        }
        native_call(self.vg(), |vg| vg.resize_surface(width, height))?;
        log::debug!("resized context to {}x{}", width, height);
        *size = (width, height);
        Ok(())
    }

    pub fn clear(&self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        native_call(self.vg(), |vg| vg.clear(x, y, width, height))
    }

    pub fn flush(&self) -> Result<()> {
        native_call(self.vg(), |vg| vg.flush())
    }

    pub fn finish(&self) -> Result<()> {
        native_call(self.vg(), |vg| vg.finish())
    }

    // Matrices act on the one selected by VG_MATRIX_MODE

    pub fn matrix_mode(&self) -> Result<MatrixMode> {
        let raw = self.get(param_type::MATRIX_MODE)?.as_int().unwrap_or(-1);
        MatrixMode::from_u32(raw as u32).ok_or(Error::UnexpectedValue {
            name: "VG_MATRIX_MODE",
            value: raw,
        })
    }

    pub fn set_matrix_mode(&self, mode: MatrixMode) -> Result<()> {
        self.set(param_type::MATRIX_MODE, ParamValue::Int(mode as i32))
    }

    pub fn load_identity(&self) -> Result<()> {
        native_call(self.vg(), |vg| vg.load_identity())
    }

    pub fn translate(&self, tx: f32, ty: f32) -> Result<()> {
        native_call(self.vg(), |vg| vg.translate(tx, ty))
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Result<()> {
        native_call(self.vg(), |vg| vg.scale(sx, sy))
    }

    pub fn shear(&self, shx: f32, shy: f32) -> Result<()> {
        native_call(self.vg(), |vg| vg.shear(shx, shy))
    }

    /// Rotate by `angle` degrees
    pub fn rotate(&self, angle: f32) -> Result<()> {
        native_call(self.vg(), |vg| vg.rotate(angle))
    }

    /// Load a column-major 3x3 matrix
    pub fn load_matrix(&self, m: &[f32; MATRIX_LEN]) -> Result<()> {
        native_call(self.vg(), |vg| vg.load_matrix(m))
    }

    pub fn load_matrix_slice(&self, m: &[f32]) -> Result<()> {
        let m = matrix_from_slice(m)?;
        self.load_matrix(&m)
    }

    pub fn mult_matrix(&self, m: &[f32; MATRIX_LEN]) -> Result<()> {
        native_call(self.vg(), |vg| vg.mult_matrix(m))
    }

    pub fn mult_matrix_slice(&self, m: &[f32]) -> Result<()> {
        let m = matrix_from_slice(m)?;
        self.mult_matrix(&m)
    }

    pub fn get_matrix(&self) -> Result<[f32; MATRIX_LEN]> {
        native_call(self.vg(), |vg| vg.get_matrix())
    }

    // Pixels

    pub fn copy_pixels(
        &self,
        dx: i32,
        dy: i32,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        native_call(self.vg(), |vg| vg.copy_pixels(dx, dy, sx, sy, width, height))
    }

    /// Copy a region of `src` onto the surface
    #[allow(clippy::too_many_arguments)]
    pub fn set_pixels(
        &self,
        dx: i32,
        dy: i32,
        src: &Image,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        let src = src.handle()?;
        native_call(self.vg(), |vg| {
            vg.set_pixels(dx, dy, src, sx, sy, width, height)
        })
    }

    /// Copy a region of the surface into `dst`
    #[allow(clippy::too_many_arguments)]
    pub fn get_pixels(
        &self,
        dst: &Image,
        dx: i32,
        dy: i32,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        let dst = dst.handle()?;
        native_call(self.vg(), |vg| {
            vg.get_pixels(dst, dx, dy, sx, sy, width, height)
        })
    }

    /// Read a region of the surface as raw bytes in `format`
    pub fn read_pixels(
        &self,
        stride: i32,
        format: ImageFormat,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) -> Result<Vec<u8>> {
        let mut data = alloc_buffer(strided_buffer_len(format, stride, width, height)?)?;
        native_call(self.vg(), |vg| {
            vg.read_pixels(&mut data, stride, format.to_u32(), sx, sy, width, height)
        })?;
        Ok(data)
    }

    /// Write raw bytes in `format` onto the surface
    #[allow(clippy::too_many_arguments)]
    pub fn write_pixels(
        &self,
        data: &[u8],
        stride: i32,
        format: ImageFormat,
        dx: i32,
        dy: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        check_buffer("pixel data", format, stride, width, height, data.len())?;
        native_call(self.vg(), |vg| {
            vg.write_pixels(data, stride, format.to_u32(), dx, dy, width, height)
        })
    }

    /// Modify the alpha mask; `None` is only meaningful for clear and fill
    pub fn mask(
        &self,
        mask: Option<&Image>,
        operation: MaskOperation,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        let mask = match mask {
            Some(image) => image.handle()?,
            None => NativeHandle::INVALID,
        };
        native_call(self.vg(), |vg| {
            vg.mask(mask, operation as u32, x, y, width, height)
        })
    }

    // Paint binding

    /// Handle of the paint bound for filling; not owned by the caller
    pub fn fill_paint(&self) -> Result<NativeHandle> {
        native_call(self.vg(), |vg| vg.get_paint(PaintMode::FILL.bits()))
    }

    /// Handle of the paint bound for stroking; not owned by the caller
    pub fn stroke_paint(&self) -> Result<NativeHandle> {
        native_call(self.vg(), |vg| vg.get_paint(PaintMode::STROKE.bits()))
    }

    pub fn set_paint(&self, paint: &Paint, modes: PaintMode) -> Result<()> {
        let handle = paint.handle()?;
        native_call(self.vg(), |vg| vg.set_paint(handle, modes.bits()))
    }

    pub fn set_fill_paint(&self, paint: &Paint) -> Result<()> {
        self.set_paint(paint, PaintMode::FILL)
    }

    pub fn set_stroke_paint(&self, paint: &Paint) -> Result<()> {
        self.set_paint(paint, PaintMode::STROKE)
    }

    // Parameters and queries

    pub fn get(&self, key: u32) -> Result<ParamValue> {
        params::get(self.vg(), Target::Context, key)
    }

    pub fn set(&self, key: u32, value: ParamValue) -> Result<()> {
        params::set(self.vg(), Target::Context, key, value)
    }

    pub fn string(&self, id: StringId) -> Result<Option<String>> {
        native_call(self.vg(), |vg| vg.get_string(id as u32))
    }

    /// Whether the engine accelerates an image format or path datatype
    pub fn hardware_query(
        &self,
        query: HardwareQueryType,
        setting: i32,
    ) -> Result<HardwareQueryResult> {
        let raw = native_call(self.vg(), |vg| vg.hardware_query(query as u32, setting))?;
        Ok(HardwareQueryResult::from_u32(raw).unwrap_or(HardwareQueryResult::Unaccelerated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceSize;
    use crate::vg::error::{ErrorCategory, VgError};
    use crate::vg::mock::MockBackend;
    use crate::vg::types::ImageQuality;
    use serial_test::serial;

    fn mock() -> (Arc<MockBackend>, Arc<dyn Backend>) {
        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();
        (mock, backend)
    }

    #[test]
    #[serial]
    fn test_create_and_teardown() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 64, 32).unwrap();
        assert!(Context::is_active());
        assert_eq!(ctx.size(), (64, 32));
        assert!(mock.has_context());

        drop(ctx);
        assert!(!Context::is_active());
        assert!(!mock.has_context());
        assert_eq!(mock.calls("vgDestroyContextSH"), 1);
    }

    #[test]
    #[serial]
    fn test_second_create_joins_live_context() {
        let (mock, backend) = mock();
        let first = Context::create(backend.clone(), 64, 64).unwrap();
        let second = Context::create(backend, 64, 64).unwrap();
        assert_eq!(mock.calls("vgCreateContextSH"), 1);
        assert_eq!(mock.calls("vgResizeSurfaceSH"), 0);

        drop(first);
        assert!(mock.has_context());
        drop(second);
        assert!(!mock.has_context());
    }

    #[test]
    #[serial]
    fn test_create_on_other_backend_fails() {
        let (_mock, backend) = mock();
        let (_other, other_backend) = mock();
        let _ctx = Context::create(backend, 16, 16).unwrap();
        let err = Context::create(other_backend, 16, 16).unwrap_err();
        assert_eq!(err, Error::ContextInUse);
    }

    #[test]
    #[serial]
    fn test_failed_create_leaves_slot_empty() {
        let (mock, backend) = mock();
        mock.fail_next("vgCreateContextSH", VgError::OutOfMemory);
        let err = Context::create(backend.clone(), 16, 16).unwrap_err();
        assert_eq!(
            err,
            Error::ContextCreationFailed {
                width: 16,
                height: 16
            }
        );
        assert!(!Context::is_active());
        assert!(Context::create(backend, 16, 16).is_ok());
    }

    #[test]
    #[serial]
    fn test_resize_skips_same_size() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 32, 32).unwrap();
        ctx.resize(32, 32).unwrap();
        assert_eq!(mock.calls("vgResizeSurfaceSH"), 0);
        ctx.resize(48, 16).unwrap();
        assert_eq!(mock.calls("vgResizeSurfaceSH"), 1);
        assert_eq!(ctx.size(), (48, 16));
        assert_eq!(mock.surface_size(), Some((48, 16)));
    }

    #[test]
    #[serial]
    fn test_failed_resize_keeps_cached_size() {
        let (_mock, backend) = mock();
        let ctx = Context::create(backend, 32, 32).unwrap();
        let err = ctx.resize(0, 32).unwrap_err();
        assert_eq!(err, Error::Native(VgError::IllegalArgument));
        assert_eq!(ctx.size(), (32, 32));
    }

    #[test]
    #[serial]
    fn test_with_options_sets_clear_color() {
        let (_mock, backend) = mock();
        let opts = ContextOptions {
            size: SurfaceSize {
                width: 8,
                height: 8,
            },
            clear_color: Some([1.0, 0.0, 0.0, 1.0]),
        };
        let ctx = Context::with_options(backend, &opts).unwrap();
        ctx.clear(0, 0, 8, 8).unwrap();
        let px = ctx
            .read_pixels(4, ImageFormat::sRGBA_8888, 0, 0, 1, 1)
            .unwrap();
        assert_eq!(px, vec![255, 0, 0, 255]);
    }

    #[test]
    #[serial]
    fn test_matrix_slice_length() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 8, 8).unwrap();
        mock.reset_calls();
        let err = ctx.load_matrix_slice(&[1.0; 6]).unwrap_err();
        assert_eq!(
            err,
            Error::WrongArgumentLength {
                what: "matrix",
                expected: 9,
                actual: 6
            }
        );
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    #[serial]
    fn test_matrix_ops() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 8, 8).unwrap();
        ctx.load_identity().unwrap();
        ctx.translate(3.0, 4.0).unwrap();
        ctx.scale(2.0, 2.0).unwrap();
        let m = ctx.get_matrix().unwrap();
        assert_eq!(m, [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 3.0, 4.0, 1.0]);
        assert_eq!(mock.matrix(MatrixMode::PathUserToSurface), m);

        ctx.set_matrix_mode(MatrixMode::FillPaintToUser).unwrap();
        assert_eq!(ctx.matrix_mode().unwrap(), MatrixMode::FillPaintToUser);
        assert_eq!(
            ctx.get_matrix().unwrap(),
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    #[serial]
    fn test_pixel_roundtrip() {
        let (_mock, backend) = mock();
        let ctx = Context::create(backend.clone(), 8, 8).unwrap();
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        ctx.write_pixels(&data, 8, ImageFormat::sRGBA_8888, 2, 2, 2, 1)
            .unwrap();
        ctx.copy_pixels(0, 0, 2, 2, 2, 1).unwrap();
        let back = ctx
            .read_pixels(8, ImageFormat::sRGBA_8888, 0, 0, 2, 1)
            .unwrap();
        assert_eq!(back, data);

        let image = Image::new(backend, ImageFormat::sRGBA_8888, 2, 1, ImageQuality::FASTER).unwrap();
        ctx.get_pixels(&image, 0, 0, 0, 0, 2, 1).unwrap();
        assert_eq!(
            image.sub_data(8, ImageFormat::sRGBA_8888, 0, 0, 2, 1).unwrap(),
            data
        );
    }

    #[test]
    #[serial]
    fn test_short_pixel_buffer_rejected() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 8, 8).unwrap();
        mock.reset_calls();
        let err = ctx
            .write_pixels(&[0u8; 7], 0, ImageFormat::sRGB_565, 0, 0, 2, 2)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::WrongArgumentLength {
                expected: 8,
                actual: 7,
                ..
            }
        ));
        let err = ctx
            .read_pixels(-1, ImageFormat::A_8, 0, 0, 2, 2)
            .unwrap_err();
        assert_eq!(err, Error::NegativeStride(-1));
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    #[serial]
    fn test_oversized_pixel_buffer_rejected() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 8, 8).unwrap();
        mock.reset_calls();
        let err = ctx
            .write_pixels(&[0u8; 64], 4, ImageFormat::sRGBA_8888, 0, 0, 1, 1)
            .unwrap_err();
        assert_eq!(
            err,
            Error::WrongArgumentLength {
                what: "pixel data",
                expected: 4,
                actual: 64,
            }
        );
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    #[serial]
    fn test_empty_region_is_reported_by_engine() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 8, 8).unwrap();
        mock.reset_calls();
        assert_eq!(
            ctx.read_pixels(0, ImageFormat::sRGBA_8888, 0, 0, -3, 2),
            Err(Error::Native(VgError::IllegalArgument))
        );
        assert_eq!(
            ctx.read_pixels(0, ImageFormat::sRGBA_8888, 0, 0, 2, 0),
            Err(Error::Native(VgError::IllegalArgument))
        );
        assert_eq!(
            ctx.write_pixels(&[], 0, ImageFormat::sRGBA_8888, 0, 0, 0, 2),
            Err(Error::Native(VgError::IllegalArgument))
        );
        assert_eq!(mock.calls("vgReadPixels"), 2);
        assert_eq!(mock.calls("vgWritePixels"), 1);
    }

    #[test]
    #[serial]
    fn test_unrecognised_matrix_mode() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 8, 8).unwrap();
        mock.force_context_param(param_type::MATRIX_MODE, &[0x1499 as f32]);
        let err = ctx.matrix_mode().unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedValue {
                name: "VG_MATRIX_MODE",
                value: 0x1499,
            }
        );
        assert_eq!(err.category(), ErrorCategory::Native);
    }

    #[test]
    #[serial]
    fn test_paint_binding() {
        let (_mock, backend) = mock();
        let ctx = Context::create(backend.clone(), 8, 8).unwrap();
        let paint = Paint::new(backend).unwrap();
        assert_eq!(ctx.fill_paint().unwrap(), NativeHandle::INVALID);

        ctx.set_fill_paint(&paint).unwrap();
        assert_eq!(ctx.fill_paint().unwrap(), paint.handle().unwrap());
        assert_eq!(ctx.stroke_paint().unwrap(), NativeHandle::INVALID);

        ctx.set_paint(&paint, PaintMode::STROKE | PaintMode::FILL)
            .unwrap();
        assert_eq!(ctx.stroke_paint().unwrap(), paint.handle().unwrap());
    }

    #[test]
    #[serial]
    fn test_queries() {
        let (_mock, backend) = mock();
        let ctx = Context::create(backend, 8, 8).unwrap();
        assert_eq!(
            ctx.string(StringId::Version).unwrap().as_deref(),
            Some("1.1")
        );
        assert_eq!(
            ctx.hardware_query(HardwareQueryType::ImageFormat, ImageFormat::A_8 as i32)
                .unwrap(),
            HardwareQueryResult::Unaccelerated
        );
    }

    #[test]
    #[serial]
    fn test_read_only_limit() {
        let (mock, backend) = mock();
        let ctx = Context::create(backend, 8, 8).unwrap();
        mock.reset_calls();
        let err = ctx
            .set(param_type::MAX_SCISSOR_RECTS, ParamValue::Int(1))
            .unwrap_err();
        assert!(matches!(err, Error::ReadOnlyParameter(_)));
        assert_eq!(mock.total_calls(), 0);
    }
}
