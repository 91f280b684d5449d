// mock.rs - In-memory engine for tests

//! An in-memory stand-in for the OpenVG engine.
//!
//! `MockBackend` keeps just enough state to answer queries the way the real
//! engine would: object parameters, path geometry for bounds and lengths,
//! per-mode matrices, image parent links and a simple RGBA pixel store. It
//! does not rasterize.
//!
//! Every entry point bumps a per-name call counter (the C name, e.g.
//! `"vgDrawPath"`) so tests can assert exactly which native calls an
//! operation made. Errors go to a last-error slot that keeps the first
//! unread error, as the engine does.
//!
//! Object creation and destruction work without a context; every other
//! operation records `VG_NO_CONTEXT_ERROR` until `create_context` succeeds.

use std::collections::{HashMap, HashSet};
use std::f32::consts::PI;

use parking_lot::Mutex;

use crate::vg::backend::{Backend, Bounds, NativeHandle, PathCoords, PointAlongPath};
use crate::vg::error::{VgError, VguError, VGU_NO_ERROR};
use crate::vg::types::{
    image_param, paint_param, param_type, path_param, segment, ImageFormat, MatrixMode,
    PathCapabilities, PathDatatype, VG_PATH_FORMAT_STANDARD,
};

const MAX_IMAGE_SIZE: i32 = 2048;
const MAX_KERNEL_SIZE: i32 = 7;
const MAX_SEPARABLE_KERNEL_SIZE: i32 = 15;
const MAX_GAUSSIAN_STD_DEVIATION: f32 = 16.0;

const IDENTITY: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// RGBA pixel grid backing images and the drawing surface
#[derive(Debug, Clone, Default)]
struct PixelStore {
    width: i32,
    height: i32,
    pixels: Vec<[u8; 4]>,
    refs: usize,
}

impl PixelStore {
    fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) as usize) * (height.max(0) as usize);
        PixelStore {
            width,
            height,
            pixels: vec![[0; 4]; len],
            refs: 1,
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    fn get(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    fn set(&mut self, x: i32, y: i32, px: [u8; 4]) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = px;
        }
    }
}

#[derive(Debug, Clone)]
struct MockPath {
    format: i32,
    datatype: PathDatatype,
    scale: f32,
    bias: f32,
    capabilities: u32,
    segments: Vec<u8>,
    /// User-space coordinates (scale and bias applied)
    coords: Vec<f32>,
}

#[derive(Debug, Clone)]
struct MockPaint {
    params: HashMap<u32, Vec<f32>>,
    pattern: u32,
}

impl MockPaint {
    fn new() -> Self {
        let mut params = HashMap::new();
        params.insert(paint_param::TYPE, vec![0x1B00 as f32]);
        params.insert(paint_param::COLOR, vec![0.0, 0.0, 0.0, 1.0]);
        params.insert(paint_param::COLOR_RAMP_SPREAD_MODE, vec![0x1C00 as f32]);
        params.insert(paint_param::COLOR_RAMP_STOPS, Vec::new());
        params.insert(paint_param::LINEAR_GRADIENT, vec![0.0, 0.0, 1.0, 0.0]);
        params.insert(paint_param::RADIAL_GRADIENT, vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        params.insert(paint_param::PATTERN_TILING_MODE, vec![0x1D00 as f32]);
        params.insert(paint_param::COLOR_RAMP_PREMULTIPLIED, vec![1.0]);
        MockPaint { params, pattern: 0 }
    }
}

#[derive(Debug, Clone, Copy)]
struct MockImage {
    format: ImageFormat,
    width: i32,
    height: i32,
    parent: Option<u32>,
    store: u32,
    origin: (i32, i32),
}

#[derive(Debug, Clone)]
enum Object {
    Path(MockPath),
    Paint(MockPaint),
    Image(MockImage),
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Surface,
    Image(u32),
}

/// One segment resolved to absolute points
#[derive(Debug, Clone)]
struct Piece {
    from: (f32, f32),
    controls: Vec<(f32, f32)>,
    to: (f32, f32),
    draws: bool,
}

struct MockState {
    context: Option<(i32, i32)>,
    last_error: u32,
    calls: HashMap<&'static str, usize>,
    fail_next: HashMap<&'static str, u32>,
    next_handle: u32,
    objects: HashMap<u32, Object>,
    /// Parent links of live images and of destroyed ancestors a live
    /// image still reaches
    lineage: HashMap<u32, Option<u32>>,
    stores: HashMap<u32, PixelStore>,
    params: HashMap<u32, Vec<f32>>,
    matrices: [[f32; 9]; 4],
    fill_paint: u32,
    stroke_paint: u32,
    surface: PixelStore,
}

fn default_context_params() -> HashMap<u32, Vec<f32>> {
    let scalars: [(u32, f32); 30] = [
        (param_type::MATRIX_MODE, 0x1400 as f32),
        (param_type::FILL_RULE, 0x1900 as f32),
        (param_type::IMAGE_QUALITY, 2.0),
        (param_type::RENDERING_QUALITY, 0x1202 as f32),
        (param_type::BLEND_MODE, 0x2001 as f32),
        (param_type::IMAGE_MODE, 0x1F00 as f32),
        (param_type::STROKE_LINE_WIDTH, 1.0),
        (param_type::STROKE_CAP_STYLE, 0x1700 as f32),
        (param_type::STROKE_JOIN_STYLE, 0x1800 as f32),
        (param_type::STROKE_MITER_LIMIT, 4.0),
        (param_type::STROKE_DASH_PHASE, 0.0),
        (param_type::STROKE_DASH_PHASE_RESET, 0.0),
        (param_type::MASKING, 0.0),
        (param_type::SCISSORING, 0.0),
        (param_type::PIXEL_LAYOUT, 0x1300 as f32),
        (param_type::SCREEN_LAYOUT, 0x1300 as f32),
        (param_type::FILTER_FORMAT_LINEAR, 0.0),
        (param_type::FILTER_FORMAT_PREMULTIPLIED, 0.0),
        (param_type::FILTER_CHANNEL_MASK, 15.0),
        (param_type::MAX_SCISSOR_RECTS, 32.0),
        (param_type::MAX_DASH_COUNT, 16.0),
        (param_type::MAX_KERNEL_SIZE, MAX_KERNEL_SIZE as f32),
        (
            param_type::MAX_SEPARABLE_KERNEL_SIZE,
            MAX_SEPARABLE_KERNEL_SIZE as f32,
        ),
        (param_type::MAX_COLOR_RAMP_STOPS, 32.0),
        (param_type::MAX_IMAGE_WIDTH, MAX_IMAGE_SIZE as f32),
        (param_type::MAX_IMAGE_HEIGHT, MAX_IMAGE_SIZE as f32),
        (param_type::MAX_IMAGE_PIXELS, 4_194_304.0),
        (param_type::MAX_IMAGE_BYTES, 16_777_216.0),
        (param_type::MAX_FLOAT, f32::MAX),
        (
            param_type::MAX_GAUSSIAN_STD_DEVIATION,
            MAX_GAUSSIAN_STD_DEVIATION,
        ),
    ];

    let mut params: HashMap<u32, Vec<f32>> =
        scalars.iter().map(|&(k, v)| (k, vec![v])).collect();
    params.insert(param_type::SCISSOR_RECTS, Vec::new());
    params.insert(param_type::STROKE_DASH_PATTERN, Vec::new());
    params.insert(param_type::TILE_FILL_COLOR, vec![0.0; 4]);
    params.insert(param_type::CLEAR_COLOR, vec![0.0; 4]);
    params
}

fn context_param_read_only(key: u32) -> bool {
    key == param_type::SCREEN_LAYOUT
        || (param_type::MAX_SCISSOR_RECTS..=param_type::MAX_GAUSSIAN_STD_DEVIATION).contains(&key)
}

fn context_param_is_vector(key: u32) -> bool {
    matches!(
        key,
        param_type::SCISSOR_RECTS
            | param_type::STROKE_DASH_PATTERN
            | param_type::TILE_FILL_COLOR
            | param_type::CLEAR_COLOR
    )
}

/// Record an error unless an unread one is already pending
fn record(slot: &mut u32, err: VgError) {
    if *slot == 0 {
        *slot = err.to_u32();
    }
}

/// Column-major 3x3 product `a * b`
fn mat_mul(a: &[f32; 9], b: &[f32; 9]) -> [f32; 9] {
    let mut out = [0.0f32; 9];
    for col in 0..3 {
        for row in 0..3 {
            out[col * 3 + row] = (0..3).map(|k| a[k * 3 + row] * b[col * 3 + k]).sum();
        }
    }
    out
}

fn mat_apply(m: &[f32; 9], (x, y): (f32, f32)) -> (f32, f32) {
    let w = m[2] * x + m[5] * y + m[8];
    let w = if w == 0.0 { 1.0 } else { w };
    (
        (m[0] * x + m[3] * y + m[6]) / w,
        (m[1] * x + m[4] * y + m[7]) / w,
    )
}

fn mat_apply_linear(m: &[f32; 9], (x, y): (f32, f32)) -> (f32, f32) {
    (m[0] * x + m[3] * y, m[1] * x + m[4] * y)
}

fn mat_invert(m: &[f32; 9]) -> Option<[f32; 9]> {
    // Row-major view: r[row][col] = m[col * 3 + row]
    let r = |row: usize, col: usize| m[col * 3 + row] as f64;
    let det = r(0, 0) * (r(1, 1) * r(2, 2) - r(1, 2) * r(2, 1))
        - r(0, 1) * (r(1, 0) * r(2, 2) - r(1, 2) * r(2, 0))
        + r(0, 2) * (r(1, 0) * r(2, 1) - r(1, 1) * r(2, 0));
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inv = |row: usize, col: usize| -> f32 {
        // Cofactor of the transposed position
        let rows: Vec<usize> = (0..3).filter(|&i| i != col).collect();
        let cols: Vec<usize> = (0..3).filter(|&i| i != row).collect();
        let minor =
            r(rows[0], cols[0]) * r(rows[1], cols[1]) - r(rows[0], cols[1]) * r(rows[1], cols[0]);
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        (sign * minor / det) as f32
    };
    let mut out = [0.0f32; 9];
    for col in 0..3 {
        for row in 0..3 {
            out[col * 3 + row] = inv(row, col);
        }
    }
    Some(out)
}

fn force_affine(m: &mut [f32; 9]) {
    m[2] = 0.0;
    m[5] = 0.0;
    m[8] = 1.0;
}

/// Projective map of the unit square onto a quad, column-major
fn warp_square_to_quad(q: &[f32; 8]) -> Result<[f32; 9], VguError> {
    let [x0, y0, x1, y1, x2, y2, x3, y3] = *q;
    let diff_x = x0 - x1 + x2 - x3;
    let diff_y = y0 - y1 + y2 - y3;

    if diff_x == 0.0 && diff_y == 0.0 {
        return Ok([x1 - x0, y1 - y0, 0.0, x3 - x0, y3 - y0, 0.0, x0, y0, 1.0]);
    }

    let det2 = |a: f32, b: f32, c: f32, d: f32| a * d - b * c;
    let det = det2(x1 - x2, x3 - x2, y1 - y2, y3 - y2);
    if det == 0.0 {
        return Err(VguError::BadWarp);
    }
    let g = det2(diff_x, x3 - x2, diff_y, y3 - y2) / det;
    let h = det2(x1 - x2, diff_x, y1 - y2, diff_y) / det;

    Ok([
        x1 - x0 + g * x1,
        y1 - y0 + g * y1,
        g,
        x3 - x0 + h * x3,
        y3 - y0 + h * y3,
        h,
        x0,
        y0,
        1.0,
    ])
}

fn warp_quad_to_square(q: &[f32; 8]) -> Result<[f32; 9], VguError> {
    let m = warp_square_to_quad(q)?;
    mat_invert(&m).ok_or(VguError::BadWarp)
}

/// Resolve segments to absolute points
fn walk(segments: &[u8], coords: &[f32]) -> Vec<Piece> {
    let mut pieces = Vec::with_capacity(segments.len());
    let mut cur = (0.0f32, 0.0f32);
    let mut start = (0.0f32, 0.0f32);
    let mut idx = 0usize;

    for &cmd in segments {
        let Some(n) = segment::coord_count(cmd) else {
            break;
        };
        let c = |i: usize| coords.get(idx + i).copied().unwrap_or(0.0);
        let rel = segment::is_relative(cmd);
        let pt = |x: f32, y: f32| if rel { (cur.0 + x, cur.1 + y) } else { (x, y) };

        let from = cur;
        let mut controls = Vec::new();
        let mut draws = true;
        let to = match cmd & !segment::RELATIVE {
            segment::CLOSE_PATH => start,
            segment::MOVE_TO => {
                draws = false;
                let p = pt(c(0), c(1));
                start = p;
                p
            }
            segment::LINE_TO | segment::SQUAD_TO => pt(c(0), c(1)),
            segment::HLINE_TO => (if rel { cur.0 + c(0) } else { c(0) }, cur.1),
            segment::VLINE_TO => (cur.0, if rel { cur.1 + c(0) } else { c(0) }),
            segment::QUAD_TO | segment::SCUBIC_TO => {
                controls.push(pt(c(0), c(1)));
                pt(c(2), c(3))
            }
            segment::CUBIC_TO => {
                controls.push(pt(c(0), c(1)));
                controls.push(pt(c(2), c(3)));
                pt(c(4), c(5))
            }
            // Arcs: rh, rv, rot, x, y
            _ => pt(c(3), c(4)),
        };

        pieces.push(Piece {
            from,
            controls,
            to,
            draws,
        });
        cur = to;
        idx += n;
    }

    pieces
}

fn bounds_of(points: impl Iterator<Item = (f32, f32)>) -> Bounds {
    let mut min = (f32::INFINITY, f32::INFINITY);
    let mut max = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    let mut any = false;
    for (x, y) in points {
        any = true;
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }
    if !any {
        // Empty path: the engine reports a negative extent
        return Bounds {
            x: 0.0,
            y: 0.0,
            width: -1.0,
            height: -1.0,
        };
    }
    Bounds {
        x: min.0,
        y: min.1,
        width: max.0 - min.0,
        height: max.1 - min.1,
    }
}

fn piece_points(pieces: &[Piece]) -> impl Iterator<Item = (f32, f32)> + '_ {
    pieces.iter().flat_map(|p| {
        std::iter::once(p.to)
            .chain(p.controls.iter().copied())
            .chain(if p.draws { Some(p.from) } else { None })
    })
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

/// Whether a region anchored at `(x, y)` stays inside `i32` coordinates
fn region_fits(x: i32, y: i32, width: i32, height: i32) -> bool {
    x.checked_add(width).is_some() && y.checked_add(height).is_some()
}

impl MockState {
    fn new() -> Self {
        MockState {
            context: None,
            last_error: 0,
            calls: HashMap::new(),
            fail_next: HashMap::new(),
            next_handle: 1,
            objects: HashMap::new(),
            lineage: HashMap::new(),
            stores: HashMap::new(),
            params: default_context_params(),
            matrices: [IDENTITY; 4],
            fill_paint: 0,
            stroke_paint: 0,
            surface: PixelStore::default(),
        }
    }

    fn raise(&mut self, err: VgError) {
        record(&mut self.last_error, err);
    }

    /// Count the call and apply any injected failure.
    ///
    /// Returns `false` when the call must have no effect.
    fn enter(&mut self, name: &'static str) -> bool {
        *self.calls.entry(name).or_insert(0) += 1;
        if let Some(code) = self.fail_next.remove(name) {
            if self.last_error == 0 {
                self.last_error = code;
            }
            return false;
        }
        true
    }

    /// `enter` plus the live-context requirement
    fn enter_live(&mut self, name: &'static str) -> bool {
        if !self.enter(name) {
            return false;
        }
        if self.context.is_none() {
            self.raise(VgError::NoContext);
            return false;
        }
        true
    }

    /// Drop parent links no live image can walk through any more
    fn prune_lineage(&mut self) {
        let mut reachable = HashSet::new();
        for (&id, object) in &self.objects {
            if !matches!(object, Object::Image(_)) {
                continue;
            }
            let mut link = Some(id);
            while let Some(cur) = link {
                if !reachable.insert(cur) {
                    break;
                }
                link = self.lineage.get(&cur).copied().flatten();
            }
        }
        self.lineage.retain(|id, _| reachable.contains(id));
    }

    fn alloc(&mut self, object: Object) -> NativeHandle {
        let id = self.next_handle;
        self.next_handle += 1;
        self.objects.insert(id, object);
        NativeHandle::from_raw(id)
    }

    fn path(&self, h: NativeHandle) -> Option<&MockPath> {
        match self.objects.get(&h.raw()) {
            Some(Object::Path(p)) => Some(p),
            _ => None,
        }
    }

    fn image(&self, h: NativeHandle) -> Option<MockImage> {
        match self.objects.get(&h.raw()) {
            Some(Object::Image(i)) => Some(*i),
            _ => None,
        }
    }

    fn is_paint(&self, h: NativeHandle) -> bool {
        matches!(self.objects.get(&h.raw()), Some(Object::Paint(_)))
    }

    /// Path with all of `caps`, or the matching error
    fn path_with(&self, h: NativeHandle, caps: PathCapabilities) -> Result<&MockPath, VgError> {
        let path = self.path(h).ok_or(VgError::BadHandle)?;
        if path.capabilities & caps.bits() != caps.bits() {
            return Err(VgError::PathCapability);
        }
        Ok(path)
    }

    fn matrix_slot(&self) -> usize {
        let mode = self
            .params
            .get(&param_type::MATRIX_MODE)
            .and_then(|v| v.first())
            .map(|&v| v as u32)
            .unwrap_or(0x1400);
        (mode.saturating_sub(0x1400) as usize).min(3)
    }

    fn current_mode(&self) -> MatrixMode {
        MatrixMode::from_u32(0x1400 + self.matrix_slot() as u32).unwrap_or(MatrixMode::PathUserToSurface)
    }

    fn update_matrix(&mut self, f: impl FnOnce(&[f32; 9]) -> [f32; 9]) {
        let slot = self.matrix_slot();
        let mut m = f(&self.matrices[slot]);
        if self.current_mode() != MatrixMode::ImageUserToSurface {
            force_affine(&mut m);
        }
        self.matrices[slot] = m;
    }

    fn clear_color_bytes(&self) -> [u8; 4] {
        let c = self
            .params
            .get(&param_type::CLEAR_COLOR)
            .cloned()
            .unwrap_or_else(|| vec![0.0; 4]);
        let q = |i: usize| (c.get(i).copied().unwrap_or(0.0).clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(0), q(1), q(2), q(3)]
    }

    fn read_px(&self, target: Target, x: i32, y: i32) -> Option<[u8; 4]> {
        match target {
            Target::Surface => self.surface.get(x, y),
            Target::Image(id) => {
                let img = self.image(NativeHandle::from_raw(id))?;
                if x < 0 || y < 0 || x >= img.width || y >= img.height {
                    return None;
                }
                self.stores
                    .get(&img.store)?
                    .get(img.origin.0 + x, img.origin.1 + y)
            }
        }
    }

    fn write_px(&mut self, target: Target, x: i32, y: i32, px: [u8; 4]) {
        match target {
            Target::Surface => self.surface.set(x, y, px),
            Target::Image(id) => {
                let Some(img) = self.image(NativeHandle::from_raw(id)) else {
                    return;
                };
                if x < 0 || y < 0 || x >= img.width || y >= img.height {
                    return;
                }
                if let Some(store) = self.stores.get_mut(&img.store) {
                    store.set(img.origin.0 + x, img.origin.1 + y, px);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn blit(
        &mut self,
        src: Target,
        sx: i32,
        sy: i32,
        dst: Target,
        dx: i32,
        dy: i32,
        width: i32,
        height: i32,
    ) {
        let mut moved = Vec::new();
        for y in 0..height {
            for x in 0..width {
                if let Some(px) = self.read_px(src, sx + x, sy + y) {
                    moved.push((dx + x, dy + y, px));
                }
            }
        }
        for (x, y, px) in moved {
            self.write_px(dst, x, y, px);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write_bytes(
        &mut self,
        target: Target,
        data: &[u8],
        stride: i32,
        format: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        let Some(format) = ImageFormat::from_u32(format) else {
            return self.raise(VgError::UnsupportedImageFormat);
        };
        if width <= 0 || height <= 0 || !region_fits(x, y, width, height) {
            return self.raise(VgError::IllegalArgument);
        }
        let k = format.bytes_per_pixel();
        for row in 0..height {
            for col in 0..width {
                let offset = row as usize * stride.max(0) as usize + col as usize * k;
                let Some(bytes) = data.get(offset..offset + k) else {
                    continue;
                };
                let mut px = self.read_px(target, x + col, y + row).unwrap_or([0; 4]);
                px[..k].copy_from_slice(bytes);
                self.write_px(target, x + col, y + row, px);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn read_bytes(
        &mut self,
        target: Target,
        data: &mut [u8],
        stride: i32,
        format: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        let Some(format) = ImageFormat::from_u32(format) else {
            return self.raise(VgError::UnsupportedImageFormat);
        };
        if width <= 0 || height <= 0 || !region_fits(x, y, width, height) {
            return self.raise(VgError::IllegalArgument);
        }
        let k = format.bytes_per_pixel();
        for row in 0..height {
            for col in 0..width {
                let offset = row as usize * stride.max(0) as usize + col as usize * k;
                let Some(px) = self.read_px(target, x + col, y + row) else {
                    continue;
                };
                if let Some(out) = data.get_mut(offset..offset + k) {
                    out.copy_from_slice(&px[..k]);
                }
            }
        }
    }

    /// Check a filter's source and destination images
    fn filter_pair(&self, dst: NativeHandle, src: NativeHandle) -> Result<(), VgError> {
        let d = self.image(dst).ok_or(VgError::BadHandle)?;
        let s = self.image(src).ok_or(VgError::BadHandle)?;
        if d.store == s.store {
            return Err(VgError::IllegalArgument);
        }
        Ok(())
    }

    fn filter_copy(&mut self, dst: NativeHandle, src: NativeHandle) {
        let (Some(d), Some(s)) = (self.image(dst), self.image(src)) else {
            return;
        };
        let w = d.width.min(s.width);
        let h = d.height.min(s.height);
        self.blit(
            Target::Image(src.raw()),
            0,
            0,
            Target::Image(dst.raw()),
            0,
            0,
            w,
            h,
        );
    }

    fn object_param(&self, h: NativeHandle, key: u32) -> Result<Vec<f32>, VgError> {
        match self.objects.get(&h.raw()) {
            None => Err(VgError::BadHandle),
            Some(Object::Path(p)) => match key {
                path_param::FORMAT => Ok(vec![p.format as f32]),
                path_param::DATATYPE => Ok(vec![p.datatype as i32 as f32]),
                path_param::SCALE => Ok(vec![p.scale]),
                path_param::BIAS => Ok(vec![p.bias]),
                path_param::NUM_SEGMENTS => Ok(vec![p.segments.len() as f32]),
                path_param::NUM_COORDS => Ok(vec![p.coords.len() as f32]),
                _ => Err(VgError::IllegalArgument),
            },
            Some(Object::Paint(p)) => p.params.get(&key).cloned().ok_or(VgError::IllegalArgument),
            Some(Object::Image(i)) => match key {
                image_param::FORMAT => Ok(vec![i.format.to_u32() as f32]),
                image_param::WIDTH => Ok(vec![i.width as f32]),
                image_param::HEIGHT => Ok(vec![i.height as f32]),
                _ => Err(VgError::IllegalArgument),
            },
        }
    }

    fn set_object_param(&mut self, h: NativeHandle, key: u32, values: &[f32]) -> Result<(), VgError> {
        let scalar = || -> Result<f32, VgError> {
            match values {
                [v] => Ok(*v),
                _ => Err(VgError::IllegalArgument),
            }
        };
        match self.objects.get_mut(&h.raw()) {
            None => Err(VgError::BadHandle),
            Some(Object::Path(p)) => match key {
                path_param::FORMAT => {
                    if scalar()? as i32 != VG_PATH_FORMAT_STANDARD {
                        return Err(VgError::UnsupportedPathFormat);
                    }
                    p.format = VG_PATH_FORMAT_STANDARD;
                    Ok(())
                }
                path_param::DATATYPE => {
                    p.datatype =
                        PathDatatype::from_i32(scalar()? as i32).ok_or(VgError::IllegalArgument)?;
                    Ok(())
                }
                path_param::SCALE => {
                    p.scale = scalar()?;
                    Ok(())
                }
                path_param::BIAS => {
                    p.bias = scalar()?;
                    Ok(())
                }
                // Derived counts: writes are ignored
                path_param::NUM_SEGMENTS | path_param::NUM_COORDS => Ok(()),
                _ => Err(VgError::IllegalArgument),
            },
            Some(Object::Paint(p)) => {
                let valid = match key {
                    paint_param::TYPE => (0x1B00..=0x1B03).contains(&(scalar()? as u32)),
                    paint_param::COLOR_RAMP_SPREAD_MODE => {
                        (0x1C00..=0x1C02).contains(&(scalar()? as u32))
                    }
                    paint_param::PATTERN_TILING_MODE => {
                        (0x1D00..=0x1D03).contains(&(scalar()? as u32))
                    }
                    paint_param::COLOR_RAMP_PREMULTIPLIED => {
                        let v = scalar()?;
                        v == 0.0 || v == 1.0
                    }
                    paint_param::COLOR | paint_param::LINEAR_GRADIENT => values.len() == 4,
                    paint_param::RADIAL_GRADIENT => values.len() == 5,
                    paint_param::COLOR_RAMP_STOPS => values.len() % 5 == 0,
                    _ => false,
                };
                if !valid {
                    return Err(VgError::IllegalArgument);
                }
                p.params.insert(key, values.to_vec());
                Ok(())
            }
            Some(Object::Image(i)) => match key {
                image_param::FORMAT => {
                    i.format = ImageFormat::from_u32(scalar()? as u32)
                        .ok_or(VgError::UnsupportedImageFormat)?;
                    Ok(())
                }
                image_param::WIDTH | image_param::HEIGHT => Ok(()),
                _ => Err(VgError::IllegalArgument),
            },
        }
    }

    fn set_context_param(&mut self, key: u32, values: &[f32]) -> Result<(), VgError> {
        if !self.params.contains_key(&key) {
            return Err(VgError::IllegalArgument);
        }
        if context_param_read_only(key) {
            return Ok(());
        }
        if !context_param_is_vector(key) && values.len() != 1 {
            return Err(VgError::IllegalArgument);
        }
        if key == param_type::MATRIX_MODE && MatrixMode::from_u32(values[0] as u32).is_none() {
            return Err(VgError::IllegalArgument);
        }
        self.params.insert(key, values.to_vec());
        Ok(())
    }

    /// Append resolved segment data to a path, in user space
    fn push_segments(&mut self, h: NativeHandle, segments: &[u8], coords: &[f32]) {
        if let Some(Object::Path(p)) = self.objects.get_mut(&h.raw()) {
            p.segments.extend_from_slice(segments);
            p.coords.extend_from_slice(coords);
        }
    }

    fn vgu_append(&mut self, name: &'static str, h: NativeHandle, segments: &[u8], coords: &[f32]) -> u32 {
        *self.calls.entry(name).or_insert(0) += 1;
        if self.context.is_none() {
            return VguError::BadHandle.to_u32();
        }
        match self.path_with(h, PathCapabilities::APPEND_TO) {
            Err(VgError::PathCapability) => return VguError::PathCapability.to_u32(),
            Err(_) => return VguError::BadHandle.to_u32(),
            Ok(_) => {}
        }
        self.push_segments(h, segments, coords);
        VGU_NO_ERROR
    }
}

/// In-memory engine with call counters, for tests.
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend {
            state: Mutex::new(MockState::new()),
        }
    }

    /// Number of times the named entry point (C name) was called
    pub fn calls(&self, name: &str) -> usize {
        self.state.lock().calls.get(name).copied().unwrap_or(0)
    }

    /// Total entry-point calls, `vgGetError` included
    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Make the next call to `name` fail with `err` and have no effect.
    ///
    /// For `vgCreateContextSH` the failure is reported as a `false` return.
    pub fn fail_next(&self, name: &'static str, err: VgError) {
        self.state.lock().fail_next.insert(name, err.to_u32());
    }

    /// Error waiting in the slot, without clearing it
    pub fn pending_error(&self) -> u32 {
        self.state.lock().last_error
    }

    pub fn has_context(&self) -> bool {
        self.state.lock().context.is_some()
    }

    pub fn surface_size(&self) -> Option<(i32, i32)> {
        self.state.lock().context
    }

    /// Whether `handle` names a live engine object
    pub fn is_live(&self, handle: NativeHandle) -> bool {
        self.state.lock().objects.contains_key(&handle.raw())
    }

    pub fn live_objects(&self) -> usize {
        self.state.lock().objects.len()
    }

    pub fn path_segments(&self, handle: NativeHandle) -> Option<Vec<u8>> {
        self.state.lock().path(handle).map(|p| p.segments.clone())
    }

    pub fn path_coords(&self, handle: NativeHandle) -> Option<Vec<f32>> {
        self.state.lock().path(handle).map(|p| p.coords.clone())
    }

    /// Store a context parameter without validating it, as an engine newer
    /// than the binding might
    pub fn force_context_param(&self, key: u32, values: &[f32]) {
        self.state.lock().params.insert(key, values.to_vec());
    }

    /// Matrix stored for `mode`, bypassing the engine's current mode
    pub fn matrix(&self, mode: MatrixMode) -> [f32; 9] {
        self.state.lock().matrices[(mode as u32 - 0x1400) as usize]
    }
}

impl Backend for MockBackend {
    fn get_error(&self) -> u32 {
        let mut st = self.state.lock();
        *st.calls.entry("vgGetError").or_insert(0) += 1;
        std::mem::take(&mut st.last_error)
    }

    fn create_context(&self, width: i32, height: i32) -> bool {
        let mut st = self.state.lock();
        if !st.enter("vgCreateContextSH") {
            // Failure is reported by the return value only
            st.last_error = 0;
            return false;
        }
        if width <= 0 || height <= 0 {
            return false;
        }
        if st.context.is_none() {
            st.context = Some((width, height));
            st.surface = PixelStore::new(width, height);
        }
        true
    }

    fn resize_surface(&self, width: i32, height: i32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgResizeSurfaceSH") {
            return;
        }
        if width <= 0 || height <= 0 {
            return st.raise(VgError::IllegalArgument);
        }
        let mut surface = PixelStore::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if let Some(px) = st.surface.get(x, y) {
                    surface.set(x, y, px);
                }
            }
        }
        st.surface = surface;
        st.context = Some((width, height));
    }

    fn destroy_context(&self) {
        let mut st = self.state.lock();
        if !st.enter("vgDestroyContextSH") {
            return;
        }
        st.context = None;
        st.params = default_context_params();
        st.matrices = [IDENTITY; 4];
        st.fill_paint = 0;
        st.stroke_paint = 0;
        st.surface = PixelStore::default();
    }

    fn flush(&self) {
        self.state.lock().enter_live("vgFlush");
    }

    fn finish(&self) {
        self.state.lock().enter_live("vgFinish");
    }

    fn set_f(&self, key: u32, value: f32) {
        let mut st = self.state.lock();
        if st.enter_live("vgSetf") {
            if let Err(e) = st.set_context_param(key, &[value]) {
                st.raise(e);
            }
        }
    }

    fn set_i(&self, key: u32, value: i32) {
        let mut st = self.state.lock();
        if st.enter_live("vgSeti") {
            if let Err(e) = st.set_context_param(key, &[value as f32]) {
                st.raise(e);
            }
        }
    }

    fn set_fv(&self, key: u32, values: &[f32]) {
        let mut st = self.state.lock();
        if st.enter_live("vgSetfv") {
            if let Err(e) = st.set_context_param(key, values) {
                st.raise(e);
            }
        }
    }

    fn set_iv(&self, key: u32, values: &[i32]) {
        let mut st = self.state.lock();
        if st.enter_live("vgSetiv") {
            let values: Vec<f32> = values.iter().map(|&v| v as f32).collect();
            if let Err(e) = st.set_context_param(key, &values) {
                st.raise(e);
            }
        }
    }

    fn get_f(&self, key: u32) -> f32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetf") {
            return 0.0;
        }
        match st.params.get(&key).and_then(|v| v.first()).copied() {
            Some(v) => v,
            None => {
                st.raise(VgError::IllegalArgument);
                0.0
            }
        }
    }

    fn get_i(&self, key: u32) -> i32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgGeti") {
            return 0;
        }
        match st.params.get(&key).and_then(|v| v.first()).copied() {
            Some(v) => v.floor() as i32,
            None => {
                st.raise(VgError::IllegalArgument);
                0
            }
        }
    }

    fn get_vector_size(&self, key: u32) -> i32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetVectorSize") {
            return 0;
        }
        match st.params.get(&key) {
            Some(v) => v.len() as i32,
            None => {
                st.raise(VgError::IllegalArgument);
                0
            }
        }
    }

    fn get_fv(&self, key: u32, values: &mut [f32]) {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetfv") {
            return;
        }
        match st.params.get(&key) {
            Some(v) if v.len() >= values.len() => values.copy_from_slice(&v[..values.len()]),
            _ => st.raise(VgError::IllegalArgument),
        }
    }

    fn get_iv(&self, key: u32, values: &mut [i32]) {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetiv") {
            return;
        }
        match st.params.get(&key) {
            Some(v) if v.len() >= values.len() => {
                for (out, &v) in values.iter_mut().zip(v.iter()) {
                    *out = v.floor() as i32;
                }
            }
            _ => st.raise(VgError::IllegalArgument),
        }
    }

    fn set_parameter_f(&self, object: NativeHandle, key: u32, value: f32) {
        let mut st = self.state.lock();
        if st.enter_live("vgSetParameterf") {
            if let Err(e) = st.set_object_param(object, key, &[value]) {
                st.raise(e);
            }
        }
    }

    fn set_parameter_i(&self, object: NativeHandle, key: u32, value: i32) {
        let mut st = self.state.lock();
        if st.enter_live("vgSetParameteri") {
            if let Err(e) = st.set_object_param(object, key, &[value as f32]) {
                st.raise(e);
            }
        }
    }

    fn set_parameter_fv(&self, object: NativeHandle, key: u32, values: &[f32]) {
        let mut st = self.state.lock();
        if st.enter_live("vgSetParameterfv") {
            if let Err(e) = st.set_object_param(object, key, values) {
                st.raise(e);
            }
        }
    }

    fn set_parameter_iv(&self, object: NativeHandle, key: u32, values: &[i32]) {
        let mut st = self.state.lock();
        if st.enter_live("vgSetParameteriv") {
            let values: Vec<f32> = values.iter().map(|&v| v as f32).collect();
            if let Err(e) = st.set_object_param(object, key, &values) {
                st.raise(e);
            }
        }
    }

    fn get_parameter_f(&self, object: NativeHandle, key: u32) -> f32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetParameterf") {
            return 0.0;
        }
        match st.object_param(object, key) {
            Ok(v) if !v.is_empty() => v[0],
            Ok(_) => {
                st.raise(VgError::IllegalArgument);
                0.0
            }
            Err(e) => {
                st.raise(e);
                0.0
            }
        }
    }

    fn get_parameter_i(&self, object: NativeHandle, key: u32) -> i32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetParameteri") {
            return 0;
        }
        match st.object_param(object, key) {
            Ok(v) if !v.is_empty() => v[0].floor() as i32,
            Ok(_) => {
                st.raise(VgError::IllegalArgument);
                0
            }
            Err(e) => {
                st.raise(e);
                0
            }
        }
    }

    fn get_parameter_vector_size(&self, object: NativeHandle, key: u32) -> i32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetParameterVectorSize") {
            return 0;
        }
        match st.object_param(object, key) {
            Ok(v) => v.len() as i32,
            Err(e) => {
                st.raise(e);
                0
            }
        }
    }

    fn get_parameter_fv(&self, object: NativeHandle, key: u32, values: &mut [f32]) {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetParameterfv") {
            return;
        }
        match st.object_param(object, key) {
            Ok(v) if v.len() >= values.len() => values.copy_from_slice(&v[..values.len()]),
            Ok(_) => st.raise(VgError::IllegalArgument),
            Err(e) => st.raise(e),
        }
    }

    fn get_parameter_iv(&self, object: NativeHandle, key: u32, values: &mut [i32]) {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetParameteriv") {
            return;
        }
        match st.object_param(object, key) {
            Ok(v) if v.len() >= values.len() => {
                for (out, &v) in values.iter_mut().zip(v.iter()) {
                    *out = v.floor() as i32;
                }
            }
            Ok(_) => st.raise(VgError::IllegalArgument),
            Err(e) => st.raise(e),
        }
    }

    fn load_identity(&self) {
        let mut st = self.state.lock();
        if st.enter_live("vgLoadIdentity") {
            st.update_matrix(|_| IDENTITY);
        }
    }

    fn load_matrix(&self, m: &[f32; 9]) {
        let mut st = self.state.lock();
        if st.enter_live("vgLoadMatrix") {
            st.update_matrix(|_| *m);
        }
    }

    fn get_matrix(&self) -> [f32; 9] {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetMatrix") {
            return [0.0; 9];
        }
        st.matrices[st.matrix_slot()]
    }

    fn mult_matrix(&self, m: &[f32; 9]) {
        let mut st = self.state.lock();
        if st.enter_live("vgMultMatrix") {
            st.update_matrix(|cur| mat_mul(cur, m));
        }
    }

    fn translate(&self, tx: f32, ty: f32) {
        let mut st = self.state.lock();
        if st.enter_live("vgTranslate") {
            let t = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, tx, ty, 1.0];
            st.update_matrix(|cur| mat_mul(cur, &t));
        }
    }

    fn scale(&self, sx: f32, sy: f32) {
        let mut st = self.state.lock();
        if st.enter_live("vgScale") {
            let s = [sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0];
            st.update_matrix(|cur| mat_mul(cur, &s));
        }
    }

    fn shear(&self, shx: f32, shy: f32) {
        let mut st = self.state.lock();
        if st.enter_live("vgShear") {
            let s = [1.0, shy, 0.0, shx, 1.0, 0.0, 0.0, 0.0, 1.0];
            st.update_matrix(|cur| mat_mul(cur, &s));
        }
    }

    fn rotate(&self, angle: f32) {
        let mut st = self.state.lock();
        if st.enter_live("vgRotate") {
            let (sin, cos) = (angle * PI / 180.0).sin_cos();
            let r = [cos, sin, 0.0, -sin, cos, 0.0, 0.0, 0.0, 1.0];
            st.update_matrix(|cur| mat_mul(cur, &r));
        }
    }

    fn mask(&self, mask: NativeHandle, operation: u32, _x: i32, _y: i32, width: i32, height: i32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgMask") {
            return;
        }
        if !(0x1500..=0x1505).contains(&operation) || width <= 0 || height <= 0 {
            return st.raise(VgError::IllegalArgument);
        }
        // Clear and Fill ignore the mask image
        let needs_image = !matches!(operation, 0x1500 | 0x1501);
        if needs_image && st.image(mask).is_none() {
            st.raise(VgError::BadHandle);
        }
    }

    fn clear(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgClear") {
            return;
        }
        if width <= 0 || height <= 0 || !region_fits(x, y, width, height) {
            return st.raise(VgError::IllegalArgument);
        }
        let px = st.clear_color_bytes();
        for row in y..y + height {
            for col in x..x + width {
                st.surface.set(col, row, px);
            }
        }
    }

    fn create_path(
        &self,
        format: i32,
        datatype: u32,
        scale: f32,
        bias: f32,
        _segment_capacity_hint: i32,
        _coord_capacity_hint: i32,
        capabilities: u32,
    ) -> NativeHandle {
        let mut st = self.state.lock();
        if !st.enter("vgCreatePath") {
            return NativeHandle::INVALID;
        }
        if format != VG_PATH_FORMAT_STANDARD {
            st.raise(VgError::UnsupportedPathFormat);
            return NativeHandle::INVALID;
        }
        let Some(datatype) = PathDatatype::from_i32(datatype as i32) else {
            st.raise(VgError::IllegalArgument);
            return NativeHandle::INVALID;
        };
        if scale == 0.0 {
            st.raise(VgError::IllegalArgument);
            return NativeHandle::INVALID;
        }
        st.alloc(Object::Path(MockPath {
            format,
            datatype,
            scale,
            bias,
            capabilities: capabilities & PathCapabilities::ALL.bits(),
            segments: Vec::new(),
            coords: Vec::new(),
        }))
    }

    fn clear_path(&self, path: NativeHandle, capabilities: u32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgClearPath") {
            return;
        }
        match st.objects.get_mut(&path.raw()) {
            Some(Object::Path(p)) => {
                p.segments.clear();
                p.coords.clear();
                p.capabilities = capabilities & PathCapabilities::ALL.bits();
            }
            _ => st.raise(VgError::BadHandle),
        }
    }

    fn destroy_path(&self, path: NativeHandle) {
        let mut st = self.state.lock();
        if !st.enter("vgDestroyPath") {
            return;
        }
        if st.path(path).is_some() {
            st.objects.remove(&path.raw());
        } else {
            st.raise(VgError::BadHandle);
        }
    }

    fn remove_path_capabilities(&self, path: NativeHandle, capabilities: u32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgRemovePathCapabilities") {
            return;
        }
        match st.objects.get_mut(&path.raw()) {
            Some(Object::Path(p)) => p.capabilities &= !capabilities,
            _ => st.raise(VgError::BadHandle),
        }
    }

    fn get_path_capabilities(&self, path: NativeHandle) -> u32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetPathCapabilities") {
            return 0;
        }
        match st.path(path) {
            Some(p) => p.capabilities,
            None => {
                st.raise(VgError::BadHandle);
                0
            }
        }
    }

    fn append_path(&self, dst: NativeHandle, src: NativeHandle) {
        let mut st = self.state.lock();
        if !st.enter_live("vgAppendPath") {
            return;
        }
        let source = match (
            st.path_with(dst, PathCapabilities::APPEND_TO),
            st.path_with(src, PathCapabilities::APPEND_FROM),
        ) {
            (Ok(_), Ok(s)) => (s.segments.clone(), s.coords.clone()),
            (Err(e), _) | (_, Err(e)) => return st.raise(e),
        };
        st.push_segments(dst, &source.0, &source.1);
    }

    fn append_path_data(&self, dst: NativeHandle, segments: &[u8], coords: &PathCoords) {
        let mut st = self.state.lock();
        if !st.enter_live("vgAppendPathData") {
            return;
        }
        let (scale, bias) = match st.path_with(dst, PathCapabilities::APPEND_TO) {
            Ok(p) if p.datatype == coords.datatype() => (p.scale, p.bias),
            Ok(_) => return st.raise(VgError::IllegalArgument),
            Err(e) => return st.raise(e),
        };
        let mut needed = 0usize;
        for &cmd in segments {
            match segment::coord_count(cmd) {
                Some(n) => needed += n,
                None => return st.raise(VgError::IllegalArgument),
            }
        }
        if segments.is_empty() || needed > coords.len() {
            return st.raise(VgError::IllegalArgument);
        }
        let user: Vec<f32> = (0..needed)
            .filter_map(|i| coords.get(i))
            .map(|c| c * scale + bias)
            .collect();
        st.push_segments(dst, segments, &user);
    }

    fn modify_path_coords(
        &self,
        dst: NativeHandle,
        start_index: i32,
        num_segments: i32,
        coords: &PathCoords,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgModifyPathCoords") {
            return;
        }
        let (offset, needed, scale, bias) = match st.path_with(dst, PathCapabilities::MODIFY) {
            Ok(p) => {
                let start = start_index.max(0) as usize;
                let end = start + num_segments.max(0) as usize;
                if start_index < 0 || num_segments <= 0 || end > p.segments.len() {
                    return st.raise(VgError::IllegalArgument);
                }
                let count = |segs: &[u8]| -> usize {
                    segs.iter().filter_map(|&c| segment::coord_count(c)).sum()
                };
                (
                    count(&p.segments[..start]),
                    count(&p.segments[start..end]),
                    p.scale,
                    p.bias,
                )
            }
            Err(e) => return st.raise(e),
        };
        if coords.len() < needed {
            return st.raise(VgError::IllegalArgument);
        }
        if let Some(Object::Path(p)) = st.objects.get_mut(&dst.raw()) {
            for i in 0..needed {
                if let Some(c) = coords.get(i) {
                    p.coords[offset + i] = c * scale + bias;
                }
            }
        }
    }

    fn transform_path(&self, dst: NativeHandle, src: NativeHandle) {
        let mut st = self.state.lock();
        if !st.enter_live("vgTransformPath") {
            return;
        }
        let m = st.matrices[0];
        let (segments, coords) = match (
            st.path_with(dst, PathCapabilities::TRANSFORM_TO),
            st.path_with(src, PathCapabilities::TRANSFORM_FROM),
        ) {
            (Ok(_), Ok(s)) => (s.segments.clone(), s.coords.clone()),
            (Err(e), _) | (_, Err(e)) => return st.raise(e),
        };

        let mut out = Vec::with_capacity(coords.len());
        let mut idx = 0usize;
        for &cmd in &segments {
            let n = segment::coord_count(cmd).unwrap_or(0);
            let c = &coords[idx..(idx + n).min(coords.len())];
            let rel = segment::is_relative(cmd);
            let map = |x: f32, y: f32| {
                if rel {
                    mat_apply_linear(&m, (x, y))
                } else {
                    mat_apply(&m, (x, y))
                }
            };
            match cmd & !segment::RELATIVE {
                segment::HLINE_TO => out.push(c[0] * m[0] + if rel { 0.0 } else { m[6] }),
                segment::VLINE_TO => out.push(c[0] * m[4] + if rel { 0.0 } else { m[7] }),
                segment::SCCWARC_TO | segment::SCWARC_TO | segment::LCCWARC_TO
                | segment::LCWARC_TO => {
                    out.extend_from_slice(&c[..3]);
                    let (x, y) = map(c[3], c[4]);
                    out.extend_from_slice(&[x, y]);
                }
                _ => {
                    for pair in c.chunks(2) {
                        let (x, y) = map(pair[0], pair[1]);
                        out.extend_from_slice(&[x, y]);
                    }
                }
            }
            idx += n;
        }
        st.push_segments(dst, &segments, &out);
    }

    fn interpolate_path(
        &self,
        dst: NativeHandle,
        start: NativeHandle,
        end: NativeHandle,
        amount: f32,
    ) -> bool {
        let mut st = self.state.lock();
        if !st.enter_live("vgInterpolatePath") {
            return false;
        }
        let (segments, a, b) = match (
            st.path_with(dst, PathCapabilities::INTERPOLATE_TO),
            st.path_with(start, PathCapabilities::INTERPOLATE_FROM),
            st.path_with(end, PathCapabilities::INTERPOLATE_FROM),
        ) {
            (Ok(_), Ok(s), Ok(e)) => {
                if s.segments != e.segments || s.coords.len() != e.coords.len() {
                    return false;
                }
                (s.segments.clone(), s.coords.clone(), e.coords.clone())
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                st.raise(e);
                return false;
            }
        };
        let mixed: Vec<f32> = a
            .iter()
            .zip(b.iter())
            .map(|(s, e)| s + (e - s) * amount)
            .collect();
        st.push_segments(dst, &segments, &mixed);
        true
    }

    fn path_length(&self, path: NativeHandle, start_segment: i32, num_segments: i32) -> f32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgPathLength") {
            return -1.0;
        }
        let p = match st.path_with(path, PathCapabilities::PATH_LENGTH) {
            Ok(p) => p,
            Err(e) => {
                st.raise(e);
                return -1.0;
            }
        };
        let start = start_segment.max(0) as usize;
        let end = start + num_segments.max(0) as usize;
        if start_segment < 0 || num_segments <= 0 || end > p.segments.len() {
            st.raise(VgError::IllegalArgument);
            return -1.0;
        }
        walk(&p.segments, &p.coords)[start..end]
            .iter()
            .filter(|piece| piece.draws)
            .map(|piece| distance(piece.from, piece.to))
            .sum()
    }

    fn point_along_path(
        &self,
        path: NativeHandle,
        start_segment: i32,
        num_segments: i32,
        distance_along: f32,
    ) -> PointAlongPath {
        let mut st = self.state.lock();
        if !st.enter_live("vgPointAlongPath") {
            return PointAlongPath::default();
        }
        let p = match st.path_with(path, PathCapabilities::POINT_ALONG_PATH) {
            Ok(p) => p,
            Err(e) => {
                st.raise(e);
                return PointAlongPath::default();
            }
        };
        let start = start_segment.max(0) as usize;
        let end = start + num_segments.max(0) as usize;
        if start_segment < 0 || num_segments <= 0 || end > p.segments.len() {
            st.raise(VgError::IllegalArgument);
            return PointAlongPath::default();
        }

        let pieces = walk(&p.segments, &p.coords);
        let range = &pieces[start..end];
        let mut remaining = distance_along.max(0.0);
        let mut result = PointAlongPath {
            x: range[0].from.0,
            y: range[0].from.1,
            tangent_x: 1.0,
            tangent_y: 0.0,
        };
        for piece in range.iter().filter(|piece| piece.draws) {
            let len = distance(piece.from, piece.to);
            if len == 0.0 {
                continue;
            }
            let dir = ((piece.to.0 - piece.from.0) / len, (piece.to.1 - piece.from.1) / len);
            let t = remaining.min(len);
            result = PointAlongPath {
                x: piece.from.0 + dir.0 * t,
                y: piece.from.1 + dir.1 * t,
                tangent_x: dir.0,
                tangent_y: dir.1,
            };
            if remaining <= len {
                break;
            }
            remaining -= len;
        }
        result
    }

    fn path_bounds(&self, path: NativeHandle) -> Bounds {
        let mut st = self.state.lock();
        if !st.enter_live("vgPathBounds") {
            return Bounds::default();
        }
        match st.path_with(path, PathCapabilities::PATH_BOUNDS) {
            Ok(p) => bounds_of(piece_points(&walk(&p.segments, &p.coords))),
            Err(e) => {
                st.raise(e);
                Bounds::default()
            }
        }
    }

    fn path_transformed_bounds(&self, path: NativeHandle) -> Bounds {
        let mut st = self.state.lock();
        if !st.enter_live("vgPathTransformedBounds") {
            return Bounds::default();
        }
        let m = st.matrices[0];
        match st.path_with(path, PathCapabilities::PATH_TRANSFORMED_BOUNDS) {
            Ok(p) => {
                let pieces = walk(&p.segments, &p.coords);
                bounds_of(piece_points(&pieces).map(|pt| mat_apply(&m, pt)))
            }
            Err(e) => {
                st.raise(e);
                Bounds::default()
            }
        }
    }

    fn draw_path(&self, path: NativeHandle, paint_modes: u32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgDrawPath") {
            return;
        }
        if st.path(path).is_none() {
            return st.raise(VgError::BadHandle);
        }
        if paint_modes == 0 || paint_modes & !3 != 0 {
            st.raise(VgError::IllegalArgument);
        }
    }

    fn create_paint(&self) -> NativeHandle {
        let mut st = self.state.lock();
        if !st.enter("vgCreatePaint") {
            return NativeHandle::INVALID;
        }
        st.alloc(Object::Paint(MockPaint::new()))
    }

    fn destroy_paint(&self, paint: NativeHandle) {
        let mut st = self.state.lock();
        if !st.enter("vgDestroyPaint") {
            return;
        }
        if st.is_paint(paint) {
            st.objects.remove(&paint.raw());
        } else {
            st.raise(VgError::BadHandle);
        }
    }

    fn set_paint(&self, paint: NativeHandle, paint_modes: u32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgSetPaint") {
            return;
        }
        if paint.is_valid() && !st.is_paint(paint) {
            return st.raise(VgError::BadHandle);
        }
        if paint_modes == 0 || paint_modes & !3 != 0 {
            return st.raise(VgError::IllegalArgument);
        }
        if paint_modes & 1 != 0 {
            st.stroke_paint = paint.raw();
        }
        if paint_modes & 2 != 0 {
            st.fill_paint = paint.raw();
        }
    }

    fn get_paint(&self, paint_mode: u32) -> NativeHandle {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetPaint") {
            return NativeHandle::INVALID;
        }
        match paint_mode {
            1 => NativeHandle::from_raw(st.stroke_paint),
            2 => NativeHandle::from_raw(st.fill_paint),
            _ => {
                st.raise(VgError::IllegalArgument);
                NativeHandle::INVALID
            }
        }
    }

    fn set_color(&self, paint: NativeHandle, rgba: u32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgSetColor") {
            return;
        }
        let color: Vec<f32> = rgba
            .to_be_bytes()
            .iter()
            .map(|&b| b as f32 / 255.0)
            .collect();
        if let Err(e) = st.set_object_param(paint, paint_param::COLOR, &color) {
            st.raise(e);
        }
    }

    fn get_color(&self, paint: NativeHandle) -> u32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetColor") {
            return 0;
        }
        if !st.is_paint(paint) {
            st.raise(VgError::BadHandle);
            return 0;
        }
        match st.object_param(paint, paint_param::COLOR) {
            Ok(c) => c.iter().fold(0u32, |acc, &v| {
                (acc << 8) | (v.clamp(0.0, 1.0) * 255.0).round() as u32
            }),
            Err(e) => {
                st.raise(e);
                0
            }
        }
    }

    fn paint_pattern(&self, paint: NativeHandle, pattern: NativeHandle) {
        let mut st = self.state.lock();
        if !st.enter_live("vgPaintPattern") {
            return;
        }
        if pattern.is_valid() && st.image(pattern).is_none() {
            return st.raise(VgError::BadHandle);
        }
        match st.objects.get_mut(&paint.raw()) {
            Some(Object::Paint(p)) => p.pattern = pattern.raw(),
            _ => st.raise(VgError::BadHandle),
        }
    }

    fn create_image(
        &self,
        format: u32,
        width: i32,
        height: i32,
        allowed_quality: u32,
    ) -> NativeHandle {
        let mut st = self.state.lock();
        if !st.enter("vgCreateImage") {
            return NativeHandle::INVALID;
        }
        let Some(format) = ImageFormat::from_u32(format) else {
            st.raise(VgError::UnsupportedImageFormat);
            return NativeHandle::INVALID;
        };
        if width <= 0
            || height <= 0
            || width > MAX_IMAGE_SIZE
            || height > MAX_IMAGE_SIZE
            || allowed_quality & !7 != 0
        {
            st.raise(VgError::IllegalArgument);
            return NativeHandle::INVALID;
        }
        let id = st.next_handle;
        st.stores.insert(id, PixelStore::new(width, height));
        st.lineage.insert(id, None);
        st.alloc(Object::Image(MockImage {
            format,
            width,
            height,
            parent: None,
            store: id,
            origin: (0, 0),
        }))
    }

    fn destroy_image(&self, image: NativeHandle) {
        let mut st = self.state.lock();
        if !st.enter("vgDestroyImage") {
            return;
        }
        let Some(img) = st.image(image) else {
            return st.raise(VgError::BadHandle);
        };
        st.objects.remove(&image.raw());
        let drop_store = match st.stores.get_mut(&img.store) {
            Some(store) => {
                store.refs = store.refs.saturating_sub(1);
                store.refs == 0
            }
            None => false,
        };
        if drop_store {
            st.stores.remove(&img.store);
        }
        st.prune_lineage();
    }

    fn clear_image(&self, image: NativeHandle, x: i32, y: i32, width: i32, height: i32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgClearImage") {
            return;
        }
        if st.image(image).is_none() {
            return st.raise(VgError::BadHandle);
        }
        if width <= 0 || height <= 0 || !region_fits(x, y, width, height) {
            return st.raise(VgError::IllegalArgument);
        }
        let px = st.clear_color_bytes();
        for row in y..y + height {
            for col in x..x + width {
                st.write_px(Target::Image(image.raw()), col, row, px);
            }
        }
    }

    fn image_sub_data(
        &self,
        image: NativeHandle,
        data: &[u8],
        stride: i32,
        format: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgImageSubData") {
            return;
        }
        if st.image(image).is_none() {
            return st.raise(VgError::BadHandle);
        }
        st.write_bytes(
            Target::Image(image.raw()),
            data,
            stride,
            format,
            x,
            y,
            width,
            height,
        );
    }

    fn get_image_sub_data(
        &self,
        image: NativeHandle,
        data: &mut [u8],
        stride: i32,
        format: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetImageSubData") {
            return;
        }
        if st.image(image).is_none() {
            return st.raise(VgError::BadHandle);
        }
        st.read_bytes(
            Target::Image(image.raw()),
            data,
            stride,
            format,
            x,
            y,
            width,
            height,
        );
    }

    fn child_image(
        &self,
        parent: NativeHandle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> NativeHandle {
        let mut st = self.state.lock();
        if !st.enter("vgChildImage") {
            return NativeHandle::INVALID;
        }
        let Some(p) = st.image(parent) else {
            st.raise(VgError::BadHandle);
            return NativeHandle::INVALID;
        };
        let inside = match (x.checked_add(width), y.checked_add(height)) {
            (Some(right), Some(bottom)) => right <= p.width && bottom <= p.height,
            _ => false,
        };
        if x < 0 || y < 0 || width <= 0 || height <= 0 || !inside {
            st.raise(VgError::IllegalArgument);
            return NativeHandle::INVALID;
        }
        if let Some(store) = st.stores.get_mut(&p.store) {
            store.refs += 1;
        }
        let child = st.alloc(Object::Image(MockImage {
            format: p.format,
            width,
            height,
            parent: Some(parent.raw()),
            store: p.store,
            origin: (p.origin.0 + x, p.origin.1 + y),
        }));
        st.lineage.insert(child.raw(), Some(parent.raw()));
        child
    }

    fn get_parent(&self, image: NativeHandle) -> NativeHandle {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetParent") {
            return NativeHandle::INVALID;
        }
        let Some(img) = st.image(image) else {
            st.raise(VgError::BadHandle);
            return NativeHandle::INVALID;
        };
        // Skip ancestors that were destroyed
        let mut link = img.parent;
        while let Some(id) = link {
            if st.image(NativeHandle::from_raw(id)).is_some() {
                return NativeHandle::from_raw(id);
            }
            link = st.lineage.get(&id).copied().flatten();
        }
        image
    }

    fn copy_image(
        &self,
        dst: NativeHandle,
        dx: i32,
        dy: i32,
        src: NativeHandle,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
        _dither: bool,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgCopyImage") {
            return;
        }
        if st.image(dst).is_none() || st.image(src).is_none() {
            return st.raise(VgError::BadHandle);
        }
        if width <= 0
            || height <= 0
            || !region_fits(dx, dy, width, height)
            || !region_fits(sx, sy, width, height)
        {
            return st.raise(VgError::IllegalArgument);
        }
        st.blit(
            Target::Image(src.raw()),
            sx,
            sy,
            Target::Image(dst.raw()),
            dx,
            dy,
            width,
            height,
        );
    }

    fn draw_image(&self, image: NativeHandle) {
        let mut st = self.state.lock();
        if st.enter_live("vgDrawImage") && st.image(image).is_none() {
            st.raise(VgError::BadHandle);
        }
    }

    fn set_pixels(
        &self,
        dx: i32,
        dy: i32,
        src: NativeHandle,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgSetPixels") {
            return;
        }
        if st.image(src).is_none() {
            return st.raise(VgError::BadHandle);
        }
        if width <= 0
            || height <= 0
            || !region_fits(dx, dy, width, height)
            || !region_fits(sx, sy, width, height)
        {
            return st.raise(VgError::IllegalArgument);
        }
        st.blit(
            Target::Image(src.raw()),
            sx,
            sy,
            Target::Surface,
            dx,
            dy,
            width,
            height,
        );
    }

    fn write_pixels(
        &self,
        data: &[u8],
        stride: i32,
        format: u32,
        dx: i32,
        dy: i32,
        width: i32,
        height: i32,
    ) {
        let mut st = self.state.lock();
        if st.enter_live("vgWritePixels") {
            st.write_bytes(Target::Surface, data, stride, format, dx, dy, width, height);
        }
    }

    fn get_pixels(
        &self,
        dst: NativeHandle,
        dx: i32,
        dy: i32,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgGetPixels") {
            return;
        }
        if st.image(dst).is_none() {
            return st.raise(VgError::BadHandle);
        }
        if width <= 0
            || height <= 0
            || !region_fits(dx, dy, width, height)
            || !region_fits(sx, sy, width, height)
        {
            return st.raise(VgError::IllegalArgument);
        }
        st.blit(
            Target::Surface,
            sx,
            sy,
            Target::Image(dst.raw()),
            dx,
            dy,
            width,
            height,
        );
    }

    fn read_pixels(
        &self,
        data: &mut [u8],
        stride: i32,
        format: u32,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) {
        let mut st = self.state.lock();
        if st.enter_live("vgReadPixels") {
            st.read_bytes(Target::Surface, data, stride, format, sx, sy, width, height);
        }
    }

    fn copy_pixels(&self, dx: i32, dy: i32, sx: i32, sy: i32, width: i32, height: i32) {
        let mut st = self.state.lock();
        if !st.enter_live("vgCopyPixels") {
            return;
        }
        if width <= 0
            || height <= 0
            || !region_fits(dx, dy, width, height)
            || !region_fits(sx, sy, width, height)
        {
            return st.raise(VgError::IllegalArgument);
        }
        st.blit(
            Target::Surface,
            sx,
            sy,
            Target::Surface,
            dx,
            dy,
            width,
            height,
        );
    }

    fn color_matrix(&self, dst: NativeHandle, src: NativeHandle, _matrix: &[f32; 20]) {
        let mut st = self.state.lock();
        if !st.enter_live("vgColorMatrix") {
            return;
        }
        match st.filter_pair(dst, src) {
            Ok(()) => st.filter_copy(dst, src),
            Err(e) => st.raise(e),
        }
    }

    fn convolve(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        kernel_width: i32,
        kernel_height: i32,
        _shift_x: i32,
        _shift_y: i32,
        kernel: &[i16],
        _scale: f32,
        _bias: f32,
        tiling_mode: u32,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgConvolve") {
            return;
        }
        if let Err(e) = st.filter_pair(dst, src) {
            return st.raise(e);
        }
        if !(1..=MAX_KERNEL_SIZE).contains(&kernel_width)
            || !(1..=MAX_KERNEL_SIZE).contains(&kernel_height)
            || kernel.len() < (kernel_width * kernel_height) as usize
            || !(0x1D00..=0x1D03).contains(&tiling_mode)
        {
            return st.raise(VgError::IllegalArgument);
        }
        st.filter_copy(dst, src);
    }

    fn separable_convolve(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        kernel_width: i32,
        kernel_height: i32,
        _shift_x: i32,
        _shift_y: i32,
        kernel_x: &[i16],
        kernel_y: &[i16],
        _scale: f32,
        _bias: f32,
        tiling_mode: u32,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgSeparableConvolve") {
            return;
        }
        if let Err(e) = st.filter_pair(dst, src) {
            return st.raise(e);
        }
        if !(1..=MAX_SEPARABLE_KERNEL_SIZE).contains(&kernel_width)
            || !(1..=MAX_SEPARABLE_KERNEL_SIZE).contains(&kernel_height)
            || kernel_x.len() < kernel_width as usize
            || kernel_y.len() < kernel_height as usize
            || !(0x1D00..=0x1D03).contains(&tiling_mode)
        {
            return st.raise(VgError::IllegalArgument);
        }
        st.filter_copy(dst, src);
    }

    fn gaussian_blur(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        std_deviation_x: f32,
        std_deviation_y: f32,
        tiling_mode: u32,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgGaussianBlur") {
            return;
        }
        if let Err(e) = st.filter_pair(dst, src) {
            return st.raise(e);
        }
        let valid = |s: f32| s > 0.0 && s <= MAX_GAUSSIAN_STD_DEVIATION;
        if !valid(std_deviation_x)
            || !valid(std_deviation_y)
            || !(0x1D00..=0x1D03).contains(&tiling_mode)
        {
            return st.raise(VgError::IllegalArgument);
        }
        st.filter_copy(dst, src);
    }

    fn lookup(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        red: &[u8; 256],
        green: &[u8; 256],
        blue: &[u8; 256],
        alpha: &[u8; 256],
        _output_linear: bool,
        _output_premultiplied: bool,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgLookup") {
            return;
        }
        let (d, s) = match (st.filter_pair(dst, src), st.image(dst), st.image(src)) {
            (Ok(()), Some(d), Some(s)) => (d, s),
            (Err(e), _, _) => return st.raise(e),
            _ => return st.raise(VgError::BadHandle),
        };
        for y in 0..d.height.min(s.height) {
            for x in 0..d.width.min(s.width) {
                if let Some(px) = st.read_px(Target::Image(src.raw()), x, y) {
                    let mapped = [
                        red[px[0] as usize],
                        green[px[1] as usize],
                        blue[px[2] as usize],
                        alpha[px[3] as usize],
                    ];
                    st.write_px(Target::Image(dst.raw()), x, y, mapped);
                }
            }
        }
    }

    fn lookup_single(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        table: &[u32; 256],
        source_channel: u32,
        _output_linear: bool,
        _output_premultiplied: bool,
    ) {
        let mut st = self.state.lock();
        if !st.enter_live("vgLookupSingle") {
            return;
        }
        if let Err(e) = st.filter_pair(dst, src) {
            return st.raise(e);
        }
        let channel = match source_channel {
            8 => 0,
            4 => 1,
            2 => 2,
            1 => 3,
            _ => return st.raise(VgError::IllegalArgument),
        };
        let (Some(d), Some(s)) = (st.image(dst), st.image(src)) else {
            return st.raise(VgError::BadHandle);
        };
        for y in 0..d.height.min(s.height) {
            for x in 0..d.width.min(s.width) {
                if let Some(px) = st.read_px(Target::Image(src.raw()), x, y) {
                    let mapped = table[px[channel] as usize].to_be_bytes();
                    st.write_px(Target::Image(dst.raw()), x, y, mapped);
                }
            }
        }
    }

    fn hardware_query(&self, key: u32, _setting: i32) -> u32 {
        let mut st = self.state.lock();
        if !st.enter_live("vgHardwareQuery") {
            return 0;
        }
        if !matches!(key, 0x2100 | 0x2101) {
            st.raise(VgError::IllegalArgument);
            return 0;
        }
        0x2201
    }

    fn get_string(&self, name: u32) -> Option<String> {
        let mut st = self.state.lock();
        if !st.enter("vgGetString") || st.context.is_none() {
            return None;
        }
        match name {
            0x2300 => Some("openvg_rust".to_string()),
            0x2301 => Some("MockBackend".to_string()),
            0x2302 => Some("1.1".to_string()),
            0x2303 => Some(String::new()),
            _ => None,
        }
    }

    fn vgu_line(&self, path: NativeHandle, x0: f32, y0: f32, x1: f32, y1: f32) -> u32 {
        let mut st = self.state.lock();
        st.vgu_append(
            "vguLine",
            path,
            &[segment::MOVE_TO_ABS, segment::LINE_TO_ABS],
            &[x0, y0, x1, y1],
        )
    }

    fn vgu_polygon(&self, path: NativeHandle, points: &[f32], closed: bool) -> u32 {
        let mut st = self.state.lock();
        let count = points.len() / 2;
        if count == 0 {
            *st.calls.entry("vguPolygon").or_insert(0) += 1;
            return VguError::IllegalArgument.to_u32();
        }
        let mut segments = vec![segment::MOVE_TO_ABS];
        segments.extend(std::iter::repeat(segment::LINE_TO_ABS).take(count - 1));
        if closed {
            segments.push(segment::CLOSE_PATH);
        }
        st.vgu_append("vguPolygon", path, &segments, &points[..count * 2])
    }

    fn vgu_rect(&self, path: NativeHandle, x: f32, y: f32, width: f32, height: f32) -> u32 {
        let mut st = self.state.lock();
        if width <= 0.0 || height <= 0.0 {
            *st.calls.entry("vguRect").or_insert(0) += 1;
            return VguError::IllegalArgument.to_u32();
        }
        st.vgu_append(
            "vguRect",
            path,
            &[
                segment::MOVE_TO_ABS,
                segment::HLINE_TO_REL,
                segment::VLINE_TO_REL,
                segment::HLINE_TO_REL,
                segment::CLOSE_PATH,
            ],
            &[x, y, width, height, -width],
        )
    }

    fn vgu_round_rect(
        &self,
        path: NativeHandle,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        arc_width: f32,
        arc_height: f32,
    ) -> u32 {
        let mut st = self.state.lock();
        if width <= 0.0 || height <= 0.0 {
            *st.calls.entry("vguRoundRect").or_insert(0) += 1;
            return VguError::IllegalArgument.to_u32();
        }
        let rx = arc_width.clamp(0.0, width) / 2.0;
        let ry = arc_height.clamp(0.0, height) / 2.0;
        let arc = segment::SCCWARC_TO_REL;
        st.vgu_append(
            "vguRoundRect",
            path,
            &[
                segment::MOVE_TO_ABS,
                segment::HLINE_TO_REL,
                arc,
                segment::VLINE_TO_REL,
                arc,
                segment::HLINE_TO_REL,
                arc,
                segment::VLINE_TO_REL,
                arc,
                segment::CLOSE_PATH,
            ],
            &[
                x + rx,
                y,
                width - 2.0 * rx,
                rx,
                ry,
                0.0,
                rx,
                ry,
                height - 2.0 * ry,
                rx,
                ry,
                0.0,
                -rx,
                ry,
                -(width - 2.0 * rx),
                rx,
                ry,
                0.0,
                -rx,
                -ry,
                -(height - 2.0 * ry),
                rx,
                ry,
                0.0,
                rx,
                -ry,
            ],
        )
    }

    fn vgu_ellipse(&self, path: NativeHandle, cx: f32, cy: f32, width: f32, height: f32) -> u32 {
        let mut st = self.state.lock();
        if width <= 0.0 || height <= 0.0 {
            *st.calls.entry("vguEllipse").or_insert(0) += 1;
            return VguError::IllegalArgument.to_u32();
        }
        let (rx, ry) = (width / 2.0, height / 2.0);
        st.vgu_append(
            "vguEllipse",
            path,
            &[
                segment::MOVE_TO_ABS,
                segment::SCCWARC_TO_ABS,
                segment::SCCWARC_TO_ABS,
                segment::CLOSE_PATH,
            ],
            &[
                cx + rx,
                cy,
                rx,
                ry,
                0.0,
                cx - rx,
                cy,
                rx,
                ry,
                0.0,
                cx + rx,
                cy,
            ],
        )
    }

    fn vgu_arc(
        &self,
        path: NativeHandle,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        start_angle: f32,
        angle_extent: f32,
        arc_type: u32,
    ) -> u32 {
        let mut st = self.state.lock();
        if width <= 0.0 || height <= 0.0 || !(0xF100..=0xF102).contains(&arc_type) {
            *st.calls.entry("vguArc").or_insert(0) += 1;
            return VguError::IllegalArgument.to_u32();
        }
        let (rx, ry) = (width / 2.0, height / 2.0);
        let at = |deg: f32| {
            let (sin, cos) = (deg * PI / 180.0).sin_cos();
            (x + rx * cos, y + ry * sin)
        };
        let from = at(start_angle);
        let to = at(start_angle + angle_extent);
        let arc = match (angle_extent >= 0.0, angle_extent.abs() > 180.0) {
            (true, false) => segment::SCCWARC_TO_ABS,
            (true, true) => segment::LCCWARC_TO_ABS,
            (false, false) => segment::SCWARC_TO_ABS,
            (false, true) => segment::LCWARC_TO_ABS,
        };

        let mut segments = Vec::new();
        let mut coords = Vec::new();
        if arc_type == 0xF102 {
            // Pie: start at the center
            segments.extend_from_slice(&[segment::MOVE_TO_ABS, segment::LINE_TO_ABS]);
            coords.extend_from_slice(&[x, y, from.0, from.1]);
        } else {
            segments.push(segment::MOVE_TO_ABS);
            coords.extend_from_slice(&[from.0, from.1]);
        }
        segments.push(arc);
        coords.extend_from_slice(&[rx, ry, 0.0, to.0, to.1]);
        if arc_type != 0xF100 {
            segments.push(segment::CLOSE_PATH);
        }
        st.vgu_append("vguArc", path, &segments, &coords)
    }

    fn vgu_compute_warp_quad_to_square(&self, src: &[f32; 8], matrix: &mut [f32; 9]) -> u32 {
        let mut st = self.state.lock();
        *st.calls.entry("vguComputeWarpQuadToSquare").or_insert(0) += 1;
        match warp_quad_to_square(src) {
            Ok(m) => {
                *matrix = m;
                VGU_NO_ERROR
            }
            Err(e) => e.to_u32(),
        }
    }

    fn vgu_compute_warp_square_to_quad(&self, dst: &[f32; 8], matrix: &mut [f32; 9]) -> u32 {
        let mut st = self.state.lock();
        *st.calls.entry("vguComputeWarpSquareToQuad").or_insert(0) += 1;
        match warp_square_to_quad(dst) {
            Ok(m) => {
                *matrix = m;
                VGU_NO_ERROR
            }
            Err(e) => e.to_u32(),
        }
    }

    fn vgu_compute_warp_quad_to_quad(
        &self,
        dst: &[f32; 8],
        src: &[f32; 8],
        matrix: &mut [f32; 9],
    ) -> u32 {
        let mut st = self.state.lock();
        *st.calls.entry("vguComputeWarpQuadToQuad").or_insert(0) += 1;
        let result = warp_quad_to_square(src)
            .and_then(|q2s| warp_square_to_quad(dst).map(|s2q| mat_mul(&s2q, &q2s)));
        match result {
            Ok(m) => {
                *matrix = m;
                VGU_NO_ERROR
            }
            Err(e) => e.to_u32(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_mock() -> MockBackend {
        let mock = MockBackend::new();
        assert!(mock.create_context(16, 16));
        mock
    }

    fn f32_path(mock: &MockBackend) -> NativeHandle {
        mock.create_path(
            VG_PATH_FORMAT_STANDARD,
            PathDatatype::F32 as u32,
            1.0,
            0.0,
            0,
            0,
            PathCapabilities::ALL.bits(),
        )
    }

    #[test]
    fn test_no_context_is_recorded() {
        let mock = MockBackend::new();
        mock.clear(0, 0, 1, 1);
        assert_eq!(mock.get_error(), VgError::NoContext.to_u32());
        assert_eq!(mock.get_error(), 0);
        assert_eq!(mock.calls("vgClear"), 1);
        assert_eq!(mock.calls("vgGetError"), 2);
    }

    #[test]
    fn test_first_error_is_kept() {
        let mock = live_mock();
        mock.draw_path(NativeHandle::from_raw(999), 2);
        mock.set_i(0xFFFF, 1);
        assert_eq!(mock.get_error(), VgError::BadHandle.to_u32());
        assert_eq!(mock.get_error(), 0);
    }

    #[test]
    fn test_objects_without_context() {
        let mock = MockBackend::new();
        let path = f32_path(&mock);
        assert!(path.is_valid());
        assert!(mock.is_live(path));
        mock.destroy_path(path);
        assert!(!mock.is_live(path));
        assert_eq!(mock.get_error(), 0);
    }

    #[test]
    fn test_fail_next() {
        let mock = MockBackend::new();
        mock.fail_next("vgCreateContextSH", VgError::OutOfMemory);
        assert!(!mock.create_context(4, 4));
        assert_eq!(mock.get_error(), 0);
        assert!(mock.create_context(4, 4));

        mock.fail_next("vgCreatePaint", VgError::OutOfMemory);
        assert_eq!(mock.create_paint(), NativeHandle::INVALID);
        assert_eq!(mock.get_error(), VgError::OutOfMemory.to_u32());
    }

    #[test]
    fn test_path_bounds_and_length() {
        let mock = live_mock();
        let path = f32_path(&mock);
        let coords = PathCoords::F32(vec![10.0, 20.0, 110.0, 70.0]);
        mock.append_path_data(
            path,
            &[segment::MOVE_TO_ABS, segment::LINE_TO_ABS],
            &coords,
        );
        assert_eq!(mock.get_error(), 0);

        let b = mock.path_bounds(path);
        assert_eq!((b.x, b.y, b.width, b.height), (10.0, 20.0, 100.0, 50.0));

        let len = mock.path_length(path, 0, 2);
        assert!((len - 100.0f32.hypot(50.0)).abs() < 1e-3);
    }

    #[test]
    fn test_relative_segments() {
        let mock = live_mock();
        let path = f32_path(&mock);
        let coords = PathCoords::F32(vec![0.0, 0.0, 30.0, 40.0]);
        mock.append_path_data(
            path,
            &[segment::MOVE_TO_ABS, segment::HLINE_TO_REL, segment::VLINE_TO_REL],
            &coords,
        );
        let b = mock.path_bounds(path);
        assert_eq!((b.width, b.height), (30.0, 40.0));
        assert!((mock.path_length(path, 0, 3) - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_capability_checks() {
        let mock = live_mock();
        let path = f32_path(&mock);
        mock.remove_path_capabilities(path, PathCapabilities::PATH_BOUNDS.bits());
        mock.path_bounds(path);
        assert_eq!(mock.get_error(), VgError::PathCapability.to_u32());
        assert_eq!(
            mock.get_path_capabilities(path),
            PathCapabilities::ALL.bits() & !PathCapabilities::PATH_BOUNDS.bits()
        );
    }

    #[test]
    fn test_matrix_ops() {
        let mock = live_mock();
        mock.translate(5.0, 7.0);
        mock.scale(2.0, 3.0);
        let m = mock.get_matrix();
        assert_eq!(m, [2.0, 0.0, 0.0, 0.0, 3.0, 0.0, 5.0, 7.0, 1.0]);

        // Non-image modes stay affine
        mock.load_matrix(&[1.0, 0.0, 0.5, 0.0, 1.0, 0.5, 0.0, 0.0, 2.0]);
        assert_eq!(mock.get_matrix(), IDENTITY);

        mock.set_i(param_type::MATRIX_MODE, MatrixMode::ImageUserToSurface as i32);
        let projective = [1.0, 0.0, 0.5, 0.0, 1.0, 0.5, 0.0, 0.0, 2.0];
        mock.load_matrix(&projective);
        assert_eq!(mock.get_matrix(), projective);
        assert_eq!(mock.matrix(MatrixMode::PathUserToSurface)[6], 0.0);
    }

    #[test]
    fn test_paint_color_packing() {
        let mock = live_mock();
        let paint = mock.create_paint();
        mock.set_color(paint, 0x11223344);
        assert_eq!(mock.get_color(paint), 0x11223344);

        let mut color = [0.0f32; 4];
        mock.get_parameter_fv(paint, paint_param::COLOR, &mut color);
        assert!((color[0] - 0x11 as f32 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_image_parent_walk() {
        let mock = live_mock();
        let root = mock.create_image(ImageFormat::sRGBA_8888.to_u32(), 8, 8, 2);
        let mid = mock.child_image(root, 0, 0, 4, 4);
        let leaf = mock.child_image(mid, 1, 1, 2, 2);
        assert_eq!(mock.get_parent(leaf), mid);

        mock.destroy_image(mid);
        assert_eq!(mock.get_parent(leaf), root);

        mock.destroy_image(root);
        assert_eq!(mock.get_parent(leaf), leaf);
        assert_eq!(mock.get_error(), 0);
    }

    #[test]
    fn test_lineage_is_pruned() {
        let mock = live_mock();
        let root = mock.create_image(ImageFormat::sRGBA_8888.to_u32(), 8, 8, 2);
        let mid = mock.child_image(root, 0, 0, 4, 4);
        let leaf = mock.child_image(mid, 1, 1, 2, 2);

        mock.destroy_image(mid);
        assert_eq!(mock.state.lock().lineage.len(), 3);

        mock.destroy_image(leaf);
        assert_eq!(mock.state.lock().lineage.len(), 1);
        mock.destroy_image(root);
        assert!(mock.state.lock().lineage.is_empty());

        let other = mock.create_image(ImageFormat::sRGBA_8888.to_u32(), 2, 2, 2);
        let child = mock.child_image(other, 0, 0, 1, 1);
        mock.destroy_image(child);
        assert_eq!(mock.state.lock().lineage.len(), 1);
        assert_eq!(mock.get_error(), 0);
    }

    #[test]
    fn test_huge_coordinates_are_illegal() {
        let mock = live_mock();
        let format = ImageFormat::sRGBA_8888.to_u32();
        let image = mock.create_image(format, 4, 4, 2);

        mock.clear_image(image, i32::MAX - 1, 0, 4, 4);
        assert_eq!(mock.get_error(), VgError::IllegalArgument.to_u32());
        mock.clear(0, i32::MAX, 1, 1);
        assert_eq!(mock.get_error(), VgError::IllegalArgument.to_u32());
        mock.image_sub_data(image, &[0; 16], 8, format, i32::MAX, 0, 2, 2);
        assert_eq!(mock.get_error(), VgError::IllegalArgument.to_u32());

        let mut out = [0u8; 16];
        mock.read_pixels(&mut out, 8, format, 0, i32::MAX - 1, 2, 2);
        assert_eq!(mock.get_error(), VgError::IllegalArgument.to_u32());
        mock.copy_pixels(i32::MAX, 0, 0, 0, 2, 2);
        assert_eq!(mock.get_error(), VgError::IllegalArgument.to_u32());
        assert_eq!(
            mock.child_image(image, 1, 1, i32::MAX, 1),
            NativeHandle::INVALID
        );
        assert_eq!(mock.get_error(), VgError::IllegalArgument.to_u32());
    }

    #[test]
    fn test_child_shares_pixels() {
        let mock = live_mock();
        let format = ImageFormat::sRGBA_8888.to_u32();
        let root = mock.create_image(format, 4, 4, 2);
        let child = mock.child_image(root, 2, 2, 2, 2);
        mock.image_sub_data(child, &[1, 2, 3, 4], 4, format, 0, 0, 1, 1);

        let mut out = [0u8; 4];
        mock.get_image_sub_data(root, &mut out, 4, format, 2, 2, 1, 1);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_surface_roundtrip() {
        let mock = live_mock();
        let format = ImageFormat::sRGBA_8888.to_u32();
        mock.write_pixels(&[9, 8, 7, 6, 5, 4, 3, 2], 8, format, 0, 0, 2, 1);
        mock.copy_pixels(0, 1, 0, 0, 2, 1);
        let mut out = [0u8; 8];
        mock.read_pixels(&mut out, 8, format, 0, 1, 2, 1);
        assert_eq!(out, [9, 8, 7, 6, 5, 4, 3, 2]);
    }

    #[test]
    fn test_warp_identity() {
        let unit = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        assert_eq!(warp_square_to_quad(&unit), Ok(IDENTITY));

        let degenerate = [0.0; 8];
        assert_eq!(warp_quad_to_square(&degenerate), Err(VguError::BadWarp));
    }

    #[test]
    fn test_warp_inverse() {
        let quad = [0.0, 0.0, 4.0, 1.0, 5.0, 6.0, -1.0, 3.0];
        let s2q = warp_square_to_quad(&quad).unwrap();
        let q2s = warp_quad_to_square(&quad).unwrap();
        let product = mat_mul(&s2q, &q2s);
        for (a, b) in product.iter().zip(IDENTITY.iter()) {
            assert!((a / product[8] - b).abs() < 1e-4);
        }
        let (x, y) = mat_apply(&s2q, (1.0, 1.0));
        assert!((x - 5.0).abs() < 1e-4 && (y - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_vgu_errors() {
        let mock = live_mock();
        let path = f32_path(&mock);
        assert_eq!(
            mock.vgu_rect(path, 0.0, 0.0, 0.0, 1.0),
            VguError::IllegalArgument.to_u32()
        );
        assert_eq!(
            mock.vgu_line(NativeHandle::from_raw(12345), 0.0, 0.0, 1.0, 1.0),
            VguError::BadHandle.to_u32()
        );
        mock.remove_path_capabilities(path, PathCapabilities::APPEND_TO.bits());
        assert_eq!(
            mock.vgu_line(path, 0.0, 0.0, 1.0, 1.0),
            VguError::PathCapability.to_u32()
        );
    }

    #[test]
    fn test_vgu_rect_geometry() {
        let mock = live_mock();
        let path = f32_path(&mock);
        assert_eq!(mock.vgu_rect(path, 1.0, 2.0, 3.0, 4.0), VGU_NO_ERROR);
        assert_eq!(mock.path_segments(path).unwrap().len(), 5);
        let b = mock.path_bounds(path);
        assert_eq!((b.x, b.y, b.width, b.height), (1.0, 2.0, 3.0, 4.0));
    }
}
