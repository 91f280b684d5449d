//! Table-driven checks of pixel formats and parameter dispatch.

use std::sync::Arc;

use rstest::rstest;
use serial_test::serial;

use openvg_rust::vg::params::{self, Access};
use openvg_rust::vg::{
    image_param, paint_param, param_type, path_param, Backend, Context, Error, ImageFormat,
    MockBackend, Paint, ParamKind, ParamSpace, ParamValue,
};

#[rstest]
#[case(ImageFormat::sL_8, 1)]
#[case(ImageFormat::lL_8, 1)]
#[case(ImageFormat::A_8, 1)]
#[case(ImageFormat::sRGB_565, 2)]
#[case(ImageFormat::sBGR_565, 2)]
#[case(ImageFormat::sRGBA_5551, 2)]
#[case(ImageFormat::sARGB_1555, 2)]
#[case(ImageFormat::sABGR_4444, 2)]
#[case(ImageFormat::sRGBA_8888, 4)]
#[case(ImageFormat::lXBGR_8888, 4)]
#[case(ImageFormat::sBGRA_8888_PRE, 4)]
fn bytes_per_pixel(#[case] format: ImageFormat, #[case] expected: usize) {
    assert_eq!(format.bytes_per_pixel(), expected);
    assert_eq!(ImageFormat::from_u32(format.to_u32()), Some(format));
}

#[rstest]
#[case(ParamSpace::Context, param_type::STROKE_LINE_WIDTH, ParamKind::Float, Access::ReadWrite)]
#[case(ParamSpace::Context, param_type::SCISSOR_RECTS, ParamKind::IntVector, Access::ReadWrite)]
#[case(ParamSpace::Context, param_type::CLEAR_COLOR, ParamKind::FloatVector, Access::ReadWrite)]
#[case(ParamSpace::Context, param_type::MAX_IMAGE_WIDTH, ParamKind::Int, Access::ReadOnly)]
#[case(ParamSpace::Context, param_type::MAX_FLOAT, ParamKind::Float, Access::ReadOnly)]
#[case(ParamSpace::Path, path_param::DATATYPE, ParamKind::Int, Access::ReadWrite)]
#[case(ParamSpace::Path, path_param::NUM_COORDS, ParamKind::Int, Access::ReadOnly)]
#[case(ParamSpace::Paint, paint_param::COLOR_RAMP_PREMULTIPLIED, ParamKind::Bool, Access::ReadWrite)]
#[case(ParamSpace::Paint, paint_param::LINEAR_GRADIENT, ParamKind::FloatVector, Access::ReadWrite)]
#[case(ParamSpace::Image, image_param::FORMAT, ParamKind::Int, Access::ReadWrite)]
#[case(ParamSpace::Image, image_param::HEIGHT, ParamKind::Int, Access::ReadOnly)]
fn dispatch_table_entries(
    #[case] space: ParamSpace,
    #[case] key: u32,
    #[case] kind: ParamKind,
    #[case] access: Access,
) {
    let spec = params::lookup(space, key).unwrap();
    assert_eq!(spec.kind, kind);
    assert_eq!(spec.access, access);
}

#[rstest]
#[case(ParamSpace::Path, paint_param::COLOR)]
#[case(ParamSpace::Image, path_param::SCALE)]
#[case(ParamSpace::Context, 0xDEAD)]
fn unknown_keys_are_index_errors(#[case] space: ParamSpace, #[case] key: u32) {
    let err = params::lookup(space, key).unwrap_err();
    assert_eq!(err, Error::UnknownParameter(key));
}

#[rstest]
#[case(param_type::STROKE_LINE_WIDTH, ParamValue::Float(2.5), ParamValue::Float(2.5))]
#[case(param_type::STROKE_MITER_LIMIT, ParamValue::Int(6), ParamValue::Float(6.0))]
#[case(param_type::FILL_RULE, ParamValue::Int(0x1901), ParamValue::Int(0x1901))]
#[case(
    param_type::SCISSOR_RECTS,
    ParamValue::IntVector(vec![0, 0, 4, 4]),
    ParamValue::IntVector(vec![0, 0, 4, 4])
)]
#[case(
    param_type::STROKE_DASH_PATTERN,
    ParamValue::FloatVector(vec![2.0, 1.0]),
    ParamValue::FloatVector(vec![2.0, 1.0])
)]
#[serial]
fn context_parameters_round_trip(
    #[case] key: u32,
    #[case] value: ParamValue,
    #[case] expected: ParamValue,
) {
    let mock = Arc::new(MockBackend::new());
    let backend: Arc<dyn Backend> = mock.clone();
    let ctx = Context::create(backend, 8, 8).unwrap();
    ctx.set(key, value).unwrap();
    assert_eq!(ctx.get(key).unwrap(), expected);
}

#[rstest]
#[case(param_type::STROKE_LINE_WIDTH, ParamValue::Bool(true))]
#[case(param_type::CLEAR_COLOR, ParamValue::Float(1.0))]
#[case(param_type::MATRIX_MODE, ParamValue::FloatVector(vec![1.0]))]
#[serial]
fn mismatched_kinds_make_no_native_call(#[case] key: u32, #[case] value: ParamValue) {
    let mock = Arc::new(MockBackend::new());
    let backend: Arc<dyn Backend> = mock.clone();
    let ctx = Context::create(backend, 8, 8).unwrap();
    mock.reset_calls();
    assert!(matches!(
        ctx.set(key, value),
        Err(Error::WrongArgumentType { .. })
    ));
    assert_eq!(mock.total_calls(), 0);
}

#[test]
#[serial]
fn limits_are_readable() {
    let mock = Arc::new(MockBackend::new());
    let backend: Arc<dyn Backend> = mock.clone();
    let ctx = Context::create(backend.clone(), 8, 8).unwrap();
    assert!(matches!(
        ctx.get(param_type::MAX_FLOAT).unwrap(),
        ParamValue::Float(v) if v > 1.0e10
    ));
    assert!(matches!(
        ctx.get(param_type::MAX_KERNEL_SIZE).unwrap(),
        ParamValue::Int(v) if v > 0
    ));

    let paint = Paint::new(backend).unwrap();
    assert_eq!(
        paint.get(paint_param::TYPE).unwrap(),
        ParamValue::Int(0x1B00)
    );
}
