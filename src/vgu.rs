// vgu.rs - VGU utility library

//! Shape builders and warp matrices from the VGU utility library.
//!
//! The shape functions append segments to an existing [`Path`], which must
//! have been created with `APPEND_TO`. VGU reports failures through its
//! return value; those map to [`Error::Utility`].

use crate::vg::backend::{Backend, NativeHandle};
use crate::vg::error::{check_utility, native_call, Error, Result};
use crate::vg::path::Path;

/// Closure style for [`arc`] (`VGUArcType`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcType {
    Open = 0xF100,
    Chord = 0xF101,
    Pie = 0xF102,
}

/// A quad as four corner points `[x0, y0, x1, y1, x2, y2, x3, y3]`
pub type Quad = [f32; 8];

/// Column-major 3x3 projective matrix
pub type Matrix = [f32; 9];

fn append(path: &Path, f: impl FnOnce(&dyn Backend, NativeHandle) -> u32) -> Result<()> {
    let handle = path.handle()?;
    let code = native_call(&**path.backend(), |vg| f(vg, handle))?;
    check_utility(code)
}

pub fn line(path: &mut Path, x0: f32, y0: f32, x1: f32, y1: f32) -> Result<()> {
    append(path, |vg, h| vg.vgu_line(h, x0, y0, x1, y1))
}

/// Append a polyline through `points` given as `x, y` pairs
pub fn polygon(path: &mut Path, points: &[f32], closed: bool) -> Result<()> {
    if points.is_empty() || points.len() % 2 != 0 {
        return Err(Error::WrongArgumentLength {
            what: "polygon points",
            expected: (points.len() / 2 + 1) * 2,
            actual: points.len(),
        });
    }
    append(path, |vg, h| vg.vgu_polygon(h, points, closed))
}

pub fn rect(path: &mut Path, x: f32, y: f32, width: f32, height: f32) -> Result<()> {
    append(path, |vg, h| vg.vgu_rect(h, x, y, width, height))
}

#[allow(clippy::too_many_arguments)]
pub fn round_rect(
    path: &mut Path,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    arc_width: f32,
    arc_height: f32,
) -> Result<()> {
    append(path, |vg, h| {
        vg.vgu_round_rect(h, x, y, width, height, arc_width, arc_height)
    })
}

/// Append an ellipse centered on `(cx, cy)`
pub fn ellipse(path: &mut Path, cx: f32, cy: f32, width: f32, height: f32) -> Result<()> {
    append(path, |vg, h| vg.vgu_ellipse(h, cx, cy, width, height))
}

/// Append an elliptical arc; angles are in degrees
#[allow(clippy::too_many_arguments)]
pub fn arc(
    path: &mut Path,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    start_angle: f32,
    angle_extent: f32,
    arc_type: ArcType,
) -> Result<()> {
    append(path, |vg, h| {
        vg.vgu_arc(
            h,
            x,
            y,
            width,
            height,
            start_angle,
            angle_extent,
            arc_type as u32,
        )
    })
}

fn warp(
    backend: &dyn Backend,
    f: impl FnOnce(&dyn Backend, &mut Matrix) -> u32,
) -> Result<Matrix> {
    let mut matrix = [0f32; 9];
    check_utility(f(backend, &mut matrix))?;
    Ok(matrix)
}

/// Matrix mapping the unit square onto `dst`
pub fn compute_warp_square_to_quad(backend: &dyn Backend, dst: &Quad) -> Result<Matrix> {
    warp(backend, |vg, m| vg.vgu_compute_warp_square_to_quad(dst, m))
}

/// Matrix mapping `src` onto the unit square
pub fn compute_warp_quad_to_square(backend: &dyn Backend, src: &Quad) -> Result<Matrix> {
    warp(backend, |vg, m| vg.vgu_compute_warp_quad_to_square(src, m))
}

/// Matrix mapping `src` onto `dst`
pub fn compute_warp_quad_to_quad(backend: &dyn Backend, dst: &Quad, src: &Quad) -> Result<Matrix> {
    warp(backend, |vg, m| vg.vgu_compute_warp_quad_to_quad(dst, src, m))
}
