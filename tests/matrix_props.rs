//! Property tests for matrix state and buffer sizing.

use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};
use serial_test::serial;

use openvg_rust::vg::pixels::{pixel_buffer_len, strided_buffer_len};
use openvg_rust::vg::{Backend, Context, ImageFormat, MatrixMode, MockBackend};

fn coefficient() -> impl Strategy<Value = f32> {
    -1000.0f32..1000.0
}

fn live_context() -> (Arc<MockBackend>, Context) {
    let mock = Arc::new(MockBackend::new());
    let backend: Arc<dyn Backend> = mock.clone();
    let ctx = Context::create(backend, 16, 16).unwrap();
    (mock, ctx)
}

#[test]
#[serial]
fn affine_matrix_round_trips_in_path_mode() {
    let (_mock, ctx) = live_context();
    let mut runner = TestRunner::new(Config::with_cases(128));
    runner
        .run(&prop::array::uniform6(coefficient()), |[a, b, c, d, e, f]| {
            let m = [a, b, 0.0, c, d, 0.0, e, f, 1.0];
            ctx.load_matrix(&m).unwrap();
            prop_assert_eq!(ctx.get_matrix().unwrap(), m);
            Ok(())
        })
        .unwrap();
}

#[test]
#[serial]
fn any_matrix_round_trips_in_image_mode() {
    let (mock, ctx) = live_context();
    ctx.set_matrix_mode(MatrixMode::ImageUserToSurface).unwrap();
    let mut runner = TestRunner::new(Config::with_cases(128));
    runner
        .run(&prop::array::uniform9(coefficient()), |m| {
            ctx.load_matrix(&m).unwrap();
            prop_assert_eq!(ctx.get_matrix().unwrap(), m);
            prop_assert_eq!(mock.matrix(MatrixMode::ImageUserToSurface), m);
            Ok(())
        })
        .unwrap();
}

#[test]
#[serial]
fn slice_matrix_matches_array_matrix() {
    let (_mock, ctx) = live_context();
    let mut runner = TestRunner::new(Config::with_cases(64));
    runner
        .run(&prop::array::uniform6(coefficient()), |[a, b, c, d, e, f]| {
            let m = [a, b, 0.0, c, d, 0.0, e, f, 1.0];
            ctx.load_identity().unwrap();
            ctx.mult_matrix_slice(&m).unwrap();
            prop_assert_eq!(ctx.get_matrix().unwrap(), m);
            Ok(())
        })
        .unwrap();
}

fn any_format() -> impl Strategy<Value = ImageFormat> {
    prop::sample::select(ImageFormat::ALL.to_vec())
}

proptest! {
    #[test]
    fn packed_len_is_width_height_bpp(format in any_format(), w in 1i32..64, h in 1i32..64) {
        let k = format.bytes_per_pixel();
        prop_assert!(k == 1 || k == 2 || k == 4);
        prop_assert_eq!(pixel_buffer_len(format, w, h), (w * h) as usize * k);
    }

    #[test]
    fn strided_len_covers_every_row(
        format in any_format(),
        w in 1i32..64,
        h in 1i32..64,
        pad in 0i32..16,
    ) {
        let k = format.bytes_per_pixel() as i32;
        let stride = w * k + pad;
        let len = strided_buffer_len(format, stride, w, h).unwrap();
        prop_assert!(len >= pixel_buffer_len(format, w, h));
        prop_assert!(len >= (stride * (h - 1) + w * k) as usize);
    }
}
