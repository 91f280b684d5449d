// paint.rs - Paint handle wrapper

//! Owned paint objects: solid colors, gradients and image patterns.

use std::sync::Arc;

use crate::vg::backend::{Backend, NativeHandle};
use crate::vg::error::{native_call, Error, Result};
use crate::vg::handle::{ObjectKind, OwnedHandle};
use crate::vg::image::Image;
use crate::vg::params::{self, ParamValue, Target};
use crate::vg::types::{paint_param, ColorRampSpreadMode, PaintType, TilingMode};

/// Floats per color ramp stop: offset, then RGBA
const STOP_LEN: usize = 5;

/// An engine paint object
#[derive(Debug)]
pub struct Paint {
    handle: OwnedHandle,
}

impl Paint {
    pub fn new(backend: Arc<dyn Backend>) -> Result<Paint> {
        let handle = OwnedHandle::acquire(backend, ObjectKind::Paint, |vg| vg.create_paint())?;
        Ok(Paint { handle })
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

    fn vg(&self) -> &dyn Backend {
        &**self.handle.backend()
    }

    /// Solid color as non-premultiplied `0xRRGGBBAA`
    pub fn color(&self) -> Result<u32> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.get_color(handle))
    }

    pub fn set_color(&mut self, rgba: u32) -> Result<()> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.set_color(handle, rgba))
    }

    /// Use `image` as the pattern, or clear the pattern with `None`
    pub fn set_pattern(&mut self, image: Option<&Image>) -> Result<()> {
        let handle = self.handle()?;
        let pattern = match image {
            Some(image) => image.handle()?,
            None => NativeHandle::INVALID,
        };
        native_call(self.vg(), |vg| vg.paint_pattern(handle, pattern))
    }

    pub fn get(&self, key: u32) -> Result<ParamValue> {
        params::get(self.vg(), Target::Paint(self.handle()?), key)
    }

    pub fn set(&mut self, key: u32, value: ParamValue) -> Result<()> {
        params::set(self.vg(), Target::Paint(self.handle()?), key, value)
    }

    pub fn set_paint_type(&mut self, paint_type: PaintType) -> Result<()> {
        self.set(paint_param::TYPE, ParamValue::Int(paint_type as i32))
    }

    pub fn set_spread_mode(&mut self, mode: ColorRampSpreadMode) -> Result<()> {
        self.set(
            paint_param::COLOR_RAMP_SPREAD_MODE,
            ParamValue::Int(mode as i32),
        )
    }

    pub fn set_tiling_mode(&mut self, mode: TilingMode) -> Result<()> {
        self.set(paint_param::PATTERN_TILING_MODE, ParamValue::Int(mode as i32))
    }

    /// `[x0, y0, x1, y1]`
    pub fn set_linear_gradient(&mut self, points: [f32; 4]) -> Result<()> {
        self.set(paint_param::LINEAR_GRADIENT, points.to_vec().into())
    }

    /// `[cx, cy, fx, fy, radius]`
    pub fn set_radial_gradient(&mut self, gradient: [f32; 5]) -> Result<()> {
        self.set(paint_param::RADIAL_GRADIENT, gradient.to_vec().into())
    }

    /// Stops as consecutive `offset, r, g, b, a` groups
    pub fn set_color_ramp_stops(&mut self, stops: &[f32]) -> Result<()> {
        if stops.len() % STOP_LEN != 0 {
            return Err(Error::WrongArgumentLength {
                what: "color ramp stops",
                expected: stops.len().div_ceil(STOP_LEN) * STOP_LEN,
                actual: stops.len(),
            });
        }
        self.set(paint_param::COLOR_RAMP_STOPS, stops.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vg::mock::MockBackend;
    use crate::vg::types::{ImageFormat, ImageQuality};

    fn setup() -> (Arc<MockBackend>, Paint) {
        let mock = Arc::new(MockBackend::new());
        assert!(mock.create_context(16, 16));
        let backend: Arc<dyn Backend> = mock.clone();
        (mock, Paint::new(backend).unwrap())
    }

    #[test]
    fn test_color_roundtrip() {
        let (_mock, mut paint) = setup();
        paint.set_color(0xFF0000FF).unwrap();
        assert_eq!(paint.color().unwrap(), 0xFF0000FF);
    }

    #[test]
    fn test_color_vector_parameter() {
        let (mock, mut paint) = setup();
        paint.set_color(0x00FF00FF).unwrap();
        mock.reset_calls();

        let color = paint.get(paint_param::COLOR).unwrap();
        assert_eq!(color, ParamValue::FloatVector(vec![0.0, 1.0, 0.0, 1.0]));
        assert_eq!(mock.calls("vgGetParameterVectorSize"), 1);
        assert_eq!(mock.calls("vgGetParameterfv"), 1);
    }

    #[test]
    fn test_premultiplied_is_bool() {
        let (mock, mut paint) = setup();
        assert_eq!(
            paint.get(paint_param::COLOR_RAMP_PREMULTIPLIED).unwrap(),
            ParamValue::Bool(true)
        );
        paint
            .set(paint_param::COLOR_RAMP_PREMULTIPLIED, ParamValue::Bool(false))
            .unwrap();
        assert_eq!(
            paint.get(paint_param::COLOR_RAMP_PREMULTIPLIED).unwrap(),
            ParamValue::Bool(false)
        );

        mock.reset_calls();
        let err = paint
            .set(paint_param::COLOR_RAMP_PREMULTIPLIED, ParamValue::Int(1))
            .unwrap_err();
        assert!(matches!(err, Error::WrongArgumentType { .. }));
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    fn test_gradients() {
        let (_mock, mut paint) = setup();
        paint.set_paint_type(PaintType::RadialGradient).unwrap();
        paint
            .set_radial_gradient([8.0, 8.0, 6.0, 6.0, 4.0])
            .unwrap();
        assert_eq!(
            paint.get(paint_param::RADIAL_GRADIENT).unwrap(),
            ParamValue::FloatVector(vec![8.0, 8.0, 6.0, 6.0, 4.0])
        );
        assert_eq!(
            paint.get(paint_param::TYPE).unwrap(),
            ParamValue::Int(PaintType::RadialGradient as i32)
        );
    }

    #[test]
    fn test_color_ramp_stops_length() {
        let (mock, mut paint) = setup();
        mock.reset_calls();
        let err = paint.set_color_ramp_stops(&[0.0; 7]).unwrap_err();
        assert_eq!(
            err,
            Error::WrongArgumentLength {
                what: "color ramp stops",
                expected: 10,
                actual: 7,
            }
        );
        assert_eq!(mock.total_calls(), 0);

        let stops = [0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0];
        paint.set_color_ramp_stops(&stops).unwrap();
        assert_eq!(
            paint.get(paint_param::COLOR_RAMP_STOPS).unwrap(),
            ParamValue::FloatVector(stops.to_vec())
        );
    }

    #[test]
    fn test_pattern_set_and_clear() {
        let (mock, mut paint) = setup();
        let backend: Arc<dyn Backend> = mock.clone();
        let image = Image::new(backend, ImageFormat::sRGBA_8888, 4, 4, ImageQuality::FASTER).unwrap();

        paint.set_pattern(Some(&image)).unwrap();
        paint.set_pattern(None).unwrap();
        assert_eq!(mock.calls("vgPaintPattern"), 2);
    }
}
