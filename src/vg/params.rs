// params.rs - Keyed parameter dispatch

//! Keyed parameter access for the context and for path, paint and image
//! objects.
//!
//! Each parameter space has a static table describing every key it accepts:
//! its name, value kind and whether it may be written. A lookup is a single
//! search of that table, so unknown keys, read-only writes and kind
//! mismatches are all rejected before anything reaches the engine.
//!
//! Vector parameters are never cached: every read asks the engine for the
//! current length and then fetches exactly that many elements.

use crate::vg::backend::{Backend, NativeHandle};
use crate::vg::error::{native_call, Error, Result};
use crate::vg::types::{image_param, paint_param, param_type, path_param};

/// Which object a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSpace {
    Context,
    Path,
    Paint,
    Image,
}

/// Value shape of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    IntVector,
    FloatVector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

/// One row of a dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub key: u32,
    pub name: &'static str,
    pub kind: ParamKind,
    pub access: Access,
}

/// A parameter value as read from or written to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    IntVector(Vec<i32>),
    FloatVector(Vec<f32>),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::IntVector(_) => ParamKind::IntVector,
            ParamValue::FloatVector(_) => ParamKind::FloatVector,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value; ints widen
    pub fn as_float(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float_vector(&self) -> Option<&[f32]> {
        match self {
            ParamValue::FloatVector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_vector(&self) -> Option<&[i32]> {
        match self {
            ParamValue::IntVector(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<Vec<i32>> for ParamValue {
    fn from(v: Vec<i32>) -> Self {
        ParamValue::IntVector(v)
    }
}

impl From<Vec<f32>> for ParamValue {
    fn from(v: Vec<f32>) -> Self {
        ParamValue::FloatVector(v)
    }
}

impl From<&[f32]> for ParamValue {
    fn from(v: &[f32]) -> Self {
        ParamValue::FloatVector(v.to_vec())
    }
}

/// The object a parameter is read from or written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Context,
    Path(NativeHandle),
    Paint(NativeHandle),
    Image(NativeHandle),
}

impl Target {
    pub fn space(self) -> ParamSpace {
        match self {
            Target::Context => ParamSpace::Context,
            Target::Path(_) => ParamSpace::Path,
            Target::Paint(_) => ParamSpace::Paint,
            Target::Image(_) => ParamSpace::Image,
        }
    }

    fn object(self) -> Option<NativeHandle> {
        match self {
            Target::Context => None,
            Target::Path(h) | Target::Paint(h) | Target::Image(h) => Some(h),
        }
    }

    fn get_i(self, vg: &dyn Backend, key: u32) -> i32 {
        match self.object() {
            None => vg.get_i(key),
            Some(h) => vg.get_parameter_i(h, key),
        }
    }

    fn get_f(self, vg: &dyn Backend, key: u32) -> f32 {
        match self.object() {
            None => vg.get_f(key),
            Some(h) => vg.get_parameter_f(h, key),
        }
    }

    fn vector_size(self, vg: &dyn Backend, key: u32) -> i32 {
        match self.object() {
            None => vg.get_vector_size(key),
            Some(h) => vg.get_parameter_vector_size(h, key),
        }
    }

    fn get_iv(self, vg: &dyn Backend, key: u32, out: &mut [i32]) {
        match self.object() {
            None => vg.get_iv(key, out),
            Some(h) => vg.get_parameter_iv(h, key, out),
        }
    }

    fn get_fv(self, vg: &dyn Backend, key: u32, out: &mut [f32]) {
        match self.object() {
            None => vg.get_fv(key, out),
            Some(h) => vg.get_parameter_fv(h, key, out),
        }
    }

    fn set_i(self, vg: &dyn Backend, key: u32, value: i32) {
        match self.object() {
            None => vg.set_i(key, value),
            Some(h) => vg.set_parameter_i(h, key, value),
        }
    }

    fn set_f(self, vg: &dyn Backend, key: u32, value: f32) {
        match self.object() {
            None => vg.set_f(key, value),
            Some(h) => vg.set_parameter_f(h, key, value),
        }
    }

    fn set_iv(self, vg: &dyn Backend, key: u32, values: &[i32]) {
        match self.object() {
            None => vg.set_iv(key, values),
            Some(h) => vg.set_parameter_iv(h, key, values),
        }
    }

    fn set_fv(self, vg: &dyn Backend, key: u32, values: &[f32]) {
        match self.object() {
            None => vg.set_fv(key, values),
            Some(h) => vg.set_parameter_fv(h, key, values),
        }
    }
}

const fn rw(key: u32, name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        key,
        name,
        kind,
        access: Access::ReadWrite,
    }
}

const fn ro(key: u32, name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        key,
        name,
        kind,
        access: Access::ReadOnly,
    }
}

use ParamKind::{Bool, Float, FloatVector, Int, IntVector};

static CONTEXT_PARAMS: &[ParamSpec] = &[
    rw(param_type::MATRIX_MODE, "VG_MATRIX_MODE", Int),
    rw(param_type::FILL_RULE, "VG_FILL_RULE", Int),
    rw(param_type::IMAGE_QUALITY, "VG_IMAGE_QUALITY", Int),
    rw(param_type::RENDERING_QUALITY, "VG_RENDERING_QUALITY", Int),
    rw(param_type::BLEND_MODE, "VG_BLEND_MODE", Int),
    rw(param_type::IMAGE_MODE, "VG_IMAGE_MODE", Int),
    rw(param_type::SCISSOR_RECTS, "VG_SCISSOR_RECTS", IntVector),
    rw(param_type::STROKE_LINE_WIDTH, "VG_STROKE_LINE_WIDTH", Float),
    rw(param_type::STROKE_CAP_STYLE, "VG_STROKE_CAP_STYLE", Int),
    rw(param_type::STROKE_JOIN_STYLE, "VG_STROKE_JOIN_STYLE", Int),
    rw(param_type::STROKE_MITER_LIMIT, "VG_STROKE_MITER_LIMIT", Float),
    rw(param_type::STROKE_DASH_PATTERN, "VG_STROKE_DASH_PATTERN", FloatVector),
    rw(param_type::STROKE_DASH_PHASE, "VG_STROKE_DASH_PHASE", Float),
    rw(param_type::STROKE_DASH_PHASE_RESET, "VG_STROKE_DASH_PHASE_RESET", Int),
    rw(param_type::TILE_FILL_COLOR, "VG_TILE_FILL_COLOR", FloatVector),
    rw(param_type::CLEAR_COLOR, "VG_CLEAR_COLOR", FloatVector),
    rw(param_type::MASKING, "VG_MASKING", Int),
    rw(param_type::SCISSORING, "VG_SCISSORING", Int),
    rw(param_type::PIXEL_LAYOUT, "VG_PIXEL_LAYOUT", Int),
    rw(param_type::SCREEN_LAYOUT, "VG_SCREEN_LAYOUT", Int),
    rw(param_type::FILTER_FORMAT_LINEAR, "VG_FILTER_FORMAT_LINEAR", Int),
    rw(param_type::FILTER_FORMAT_PREMULTIPLIED, "VG_FILTER_FORMAT_PREMULTIPLIED", Int),
    rw(param_type::FILTER_CHANNEL_MASK, "VG_FILTER_CHANNEL_MASK", Int),
    ro(param_type::MAX_SCISSOR_RECTS, "VG_MAX_SCISSOR_RECTS", Int),
    ro(param_type::MAX_DASH_COUNT, "VG_MAX_DASH_COUNT", Int),
    ro(param_type::MAX_KERNEL_SIZE, "VG_MAX_KERNEL_SIZE", Int),
    ro(param_type::MAX_SEPARABLE_KERNEL_SIZE, "VG_MAX_SEPARABLE_KERNEL_SIZE", Int),
    ro(param_type::MAX_COLOR_RAMP_STOPS, "VG_MAX_COLOR_RAMP_STOPS", Int),
    ro(param_type::MAX_IMAGE_WIDTH, "VG_MAX_IMAGE_WIDTH", Int),
    ro(param_type::MAX_IMAGE_HEIGHT, "VG_MAX_IMAGE_HEIGHT", Int),
    ro(param_type::MAX_IMAGE_PIXELS, "VG_MAX_IMAGE_PIXELS", Int),
    ro(param_type::MAX_IMAGE_BYTES, "VG_MAX_IMAGE_BYTES", Int),
    ro(param_type::MAX_FLOAT, "VG_MAX_FLOAT", Float),
    ro(param_type::MAX_GAUSSIAN_STD_DEVIATION, "VG_MAX_GAUSSIAN_STD_DEVIATION", Float),
];

static PATH_PARAMS: &[ParamSpec] = &[
    rw(path_param::FORMAT, "VG_PATH_FORMAT", Int),
    rw(path_param::DATATYPE, "VG_PATH_DATATYPE", Int),
    rw(path_param::SCALE, "VG_PATH_SCALE", Float),
    rw(path_param::BIAS, "VG_PATH_BIAS", Float),
    ro(path_param::NUM_SEGMENTS, "VG_PATH_NUM_SEGMENTS", Int),
    ro(path_param::NUM_COORDS, "VG_PATH_NUM_COORDS", Int),
];

static PAINT_PARAMS: &[ParamSpec] = &[
    rw(paint_param::TYPE, "VG_PAINT_TYPE", Int),
    rw(paint_param::COLOR, "VG_PAINT_COLOR", FloatVector),
    rw(paint_param::COLOR_RAMP_SPREAD_MODE, "VG_PAINT_COLOR_RAMP_SPREAD_MODE", Int),
    rw(paint_param::COLOR_RAMP_STOPS, "VG_PAINT_COLOR_RAMP_STOPS", FloatVector),
    rw(paint_param::LINEAR_GRADIENT, "VG_PAINT_LINEAR_GRADIENT", FloatVector),
    rw(paint_param::RADIAL_GRADIENT, "VG_PAINT_RADIAL_GRADIENT", FloatVector),
    rw(paint_param::PATTERN_TILING_MODE, "VG_PAINT_PATTERN_TILING_MODE", Int),
    rw(paint_param::COLOR_RAMP_PREMULTIPLIED, "VG_PAINT_COLOR_RAMP_PREMULTIPLIED", Bool),
];

static IMAGE_PARAMS: &[ParamSpec] = &[
    rw(image_param::FORMAT, "VG_IMAGE_FORMAT", Int),
    ro(image_param::WIDTH, "VG_IMAGE_WIDTH", Int),
    ro(image_param::HEIGHT, "VG_IMAGE_HEIGHT", Int),
];

/// Every key a space accepts
pub fn table(space: ParamSpace) -> &'static [ParamSpec] {
    match space {
        ParamSpace::Context => CONTEXT_PARAMS,
        ParamSpace::Path => PATH_PARAMS,
        ParamSpace::Paint => PAINT_PARAMS,
        ParamSpace::Image => IMAGE_PARAMS,
    }
}

/// Find the descriptor for `key`
pub fn lookup(space: ParamSpace, key: u32) -> Result<&'static ParamSpec> {
    table(space)
        .iter()
        .find(|spec| spec.key == key)
        .ok_or(Error::UnknownParameter(key))
}

/// Read a parameter through the engine.
///
/// Vector parameters issue a size query immediately followed by the read.
pub fn get(backend: &dyn Backend, target: Target, key: u32) -> Result<ParamValue> {
    let spec = lookup(target.space(), key)?;

    match spec.kind {
        ParamKind::Int => native_call(backend, |vg| target.get_i(vg, key)).map(ParamValue::Int),
        ParamKind::Bool => {
            native_call(backend, |vg| target.get_i(vg, key)).map(|v| ParamValue::Bool(v != 0))
        }
        ParamKind::Float => {
            native_call(backend, |vg| target.get_f(vg, key)).map(ParamValue::Float)
        }
        ParamKind::IntVector => {
            let len = native_call(backend, |vg| target.vector_size(vg, key))?;
            let mut values = vec![0i32; len.max(0) as usize];
            if !values.is_empty() {
                native_call(backend, |vg| target.get_iv(vg, key, &mut values))?;
            }
            Ok(ParamValue::IntVector(values))
        }
        ParamKind::FloatVector => {
            let len = native_call(backend, |vg| target.vector_size(vg, key))?;
            let mut values = vec![0f32; len.max(0) as usize];
            if !values.is_empty() {
                native_call(backend, |vg| target.get_fv(vg, key, &mut values))?;
            }
            Ok(ParamValue::FloatVector(values))
        }
    }
}

/// Write a parameter through the engine.
///
/// Read-only keys and values of the wrong kind are rejected without a
/// native call. Float keys also accept ints, float-vector keys accept int
/// vectors; bool keys accept only bools.
pub fn set(backend: &dyn Backend, target: Target, key: u32, value: ParamValue) -> Result<()> {
    let spec = lookup(target.space(), key)?;

    if spec.access == Access::ReadOnly {
        return Err(Error::ReadOnlyParameter(spec.name));
    }

    let mismatch = || Error::WrongArgumentType {
        name: spec.name,
        expected: spec.kind,
    };

    match (spec.kind, value) {
        (ParamKind::Int, ParamValue::Int(v)) => native_call(backend, |vg| target.set_i(vg, key, v)),
        (ParamKind::Float, ParamValue::Float(v)) => {
            native_call(backend, |vg| target.set_f(vg, key, v))
        }
        (ParamKind::Float, ParamValue::Int(v)) => {
            native_call(backend, |vg| target.set_f(vg, key, v as f32))
        }
        (ParamKind::Bool, ParamValue::Bool(v)) => {
            native_call(backend, |vg| target.set_i(vg, key, v as i32))
        }
        (ParamKind::IntVector, ParamValue::IntVector(v)) => {
            native_call(backend, |vg| target.set_iv(vg, key, &v))
        }
        (ParamKind::FloatVector, ParamValue::FloatVector(v)) => {
            native_call(backend, |vg| target.set_fv(vg, key, &v))
        }
        (ParamKind::FloatVector, ParamValue::IntVector(v)) => {
            let v: Vec<f32> = v.iter().map(|&i| i as f32).collect();
            native_call(backend, |vg| target.set_fv(vg, key, &v))
        }
        _ => Err(mismatch()),
    }
}
