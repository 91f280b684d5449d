// backend.rs - Engine seam

//! The engine seam.
//!
//! [`Backend`] mirrors the OpenVG, VGU and ShivaVG entry points one to one,
//! with slices in place of pointer/count pairs. Wrappers never call `ffi`
//! directly; they hold an `Arc<dyn Backend>` and route every call through
//! [`crate::vg::error::native_call`].
//!
//! Enumerated arguments are passed as their raw `u32` values so the seam
//! stays a faithful image of the C interface.
//!
//! Several entry points take a pointer with no count (`vgReadPixels`,
//! `vgConvolve`, `vgModifyPathCoords` and others). [`NativeBackend`] sizes
//! those buffers from the other arguments before calling C; a slice that is
//! too short never reaches the engine and the call records
//! `VG_ILLEGAL_ARGUMENT_ERROR` instead.

use std::ffi::c_void;

use crate::vg::types::PathDatatype;

/// An engine object handle (`VGHandle`).
///
/// Never dereferenced; only compared and passed back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle(u32);

impl NativeHandle {
    /// `VG_INVALID_HANDLE`
    pub const INVALID: NativeHandle = NativeHandle(0);

    pub const fn from_raw(raw: u32) -> Self {
        NativeHandle(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Path coordinates converted to the element type a path stores
#[derive(Debug, Clone, PartialEq)]
pub enum PathCoords {
    S8(Vec<i8>),
    S16(Vec<i16>),
    S32(Vec<i32>),
    F32(Vec<f32>),
}

impl PathCoords {
    /// Element type of this buffer
    pub fn datatype(&self) -> PathDatatype {
        match self {
            PathCoords::S8(_) => PathDatatype::S8,
            PathCoords::S16(_) => PathDatatype::S16,
            PathCoords::S32(_) => PathDatatype::S32,
            PathCoords::F32(_) => PathDatatype::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PathCoords::S8(v) => v.len(),
            PathCoords::S16(v) => v.len(),
            PathCoords::S32(v) => v.len(),
            PathCoords::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i` widened to `f32`
    pub fn get(&self, i: usize) -> Option<f32> {
        match self {
            PathCoords::S8(v) => v.get(i).map(|&c| c as f32),
            PathCoords::S16(v) => v.get(i).map(|&c| c as f32),
            PathCoords::S32(v) => v.get(i).map(|&c| c as f32),
            PathCoords::F32(v) => v.get(i).copied(),
        }
    }

    /// Raw pointer for `vgAppendPathData` / `vgModifyPathCoords`
    pub fn as_ptr(&self) -> *const c_void {
        match self {
            PathCoords::S8(v) => v.as_ptr() as *const c_void,
            PathCoords::S16(v) => v.as_ptr() as *const c_void,
            PathCoords::S32(v) => v.as_ptr() as *const c_void,
            PathCoords::F32(v) => v.as_ptr() as *const c_void,
        }
    }
}

/// Axis-aligned bounding box as returned by `vgPathBounds`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Result of `vgPointAlongPath`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointAlongPath {
    pub x: f32,
    pub y: f32,
    pub tangent_x: f32,
    pub tangent_y: f32,
}

/// The engine interface.
///
/// Method names follow the C entry points without the `vg` prefix. Methods
/// that can fail record an error in the engine's last-error slot; callers
/// drain it with [`Backend::get_error`].
pub trait Backend: Send + Sync {
    /// `vgGetError`: read and clear the last-error slot
    fn get_error(&self) -> u32;

    // Context (ShivaVG extension)
    fn create_context(&self, width: i32, height: i32) -> bool;
    fn resize_surface(&self, width: i32, height: i32);
    fn destroy_context(&self);

    fn flush(&self);
    fn finish(&self);

    // Context parameters
    fn set_f(&self, key: u32, value: f32);
    fn set_i(&self, key: u32, value: i32);
    fn set_fv(&self, key: u32, values: &[f32]);
    fn set_iv(&self, key: u32, values: &[i32]);
    fn get_f(&self, key: u32) -> f32;
    fn get_i(&self, key: u32) -> i32;
    fn get_vector_size(&self, key: u32) -> i32;
    fn get_fv(&self, key: u32, values: &mut [f32]);
    fn get_iv(&self, key: u32, values: &mut [i32]);

    // Object parameters
    fn set_parameter_f(&self, object: NativeHandle, key: u32, value: f32);
    fn set_parameter_i(&self, object: NativeHandle, key: u32, value: i32);
    fn set_parameter_fv(&self, object: NativeHandle, key: u32, values: &[f32]);
    fn set_parameter_iv(&self, object: NativeHandle, key: u32, values: &[i32]);
    fn get_parameter_f(&self, object: NativeHandle, key: u32) -> f32;
    fn get_parameter_i(&self, object: NativeHandle, key: u32) -> i32;
    fn get_parameter_vector_size(&self, object: NativeHandle, key: u32) -> i32;
    fn get_parameter_fv(&self, object: NativeHandle, key: u32, values: &mut [f32]);
    fn get_parameter_iv(&self, object: NativeHandle, key: u32, values: &mut [i32]);

    // Matrices, column-major 3x3
    fn load_identity(&self);
    fn load_matrix(&self, m: &[f32; 9]);
    fn get_matrix(&self) -> [f32; 9];
    fn mult_matrix(&self, m: &[f32; 9]);
    fn translate(&self, tx: f32, ty: f32);
    fn scale(&self, sx: f32, sy: f32);
    fn shear(&self, shx: f32, shy: f32);
    fn rotate(&self, angle: f32);

    fn mask(&self, mask: NativeHandle, operation: u32, x: i32, y: i32, width: i32, height: i32);
    fn clear(&self, x: i32, y: i32, width: i32, height: i32);

    // Paths
    #[allow(clippy::too_many_arguments)]
    fn create_path(
        &self,
        format: i32,
        datatype: u32,
        scale: f32,
        bias: f32,
        segment_capacity_hint: i32,
        coord_capacity_hint: i32,
        capabilities: u32,
    ) -> NativeHandle;
    fn clear_path(&self, path: NativeHandle, capabilities: u32);
    fn destroy_path(&self, path: NativeHandle);
    fn remove_path_capabilities(&self, path: NativeHandle, capabilities: u32);
    fn get_path_capabilities(&self, path: NativeHandle) -> u32;
    fn append_path(&self, dst: NativeHandle, src: NativeHandle);
    fn append_path_data(&self, dst: NativeHandle, segments: &[u8], coords: &PathCoords);
    fn modify_path_coords(
        &self,
        dst: NativeHandle,
        start_index: i32,
        num_segments: i32,
        coords: &PathCoords,
    );
    fn transform_path(&self, dst: NativeHandle, src: NativeHandle);
    fn interpolate_path(
        &self,
        dst: NativeHandle,
        start: NativeHandle,
        end: NativeHandle,
        amount: f32,
    ) -> bool;
    fn path_length(&self, path: NativeHandle, start_segment: i32, num_segments: i32) -> f32;
    fn point_along_path(
        &self,
        path: NativeHandle,
        start_segment: i32,
        num_segments: i32,
        distance: f32,
    ) -> PointAlongPath;
    fn path_bounds(&self, path: NativeHandle) -> Bounds;
    fn path_transformed_bounds(&self, path: NativeHandle) -> Bounds;
    fn draw_path(&self, path: NativeHandle, paint_modes: u32);

    // Paint
    fn create_paint(&self) -> NativeHandle;
    fn destroy_paint(&self, paint: NativeHandle);
    fn set_paint(&self, paint: NativeHandle, paint_modes: u32);
    fn get_paint(&self, paint_mode: u32) -> NativeHandle;
    fn set_color(&self, paint: NativeHandle, rgba: u32);
    fn get_color(&self, paint: NativeHandle) -> u32;
    fn paint_pattern(&self, paint: NativeHandle, pattern: NativeHandle);

    // Images
    fn create_image(&self, format: u32, width: i32, height: i32, allowed_quality: u32)
        -> NativeHandle;
    fn destroy_image(&self, image: NativeHandle);
    fn clear_image(&self, image: NativeHandle, x: i32, y: i32, width: i32, height: i32);
    #[allow(clippy::too_many_arguments)]
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
    );
    #[allow(clippy::too_many_arguments)]
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
    );
    fn child_image(&self, parent: NativeHandle, x: i32, y: i32, width: i32, height: i32)
        -> NativeHandle;
    fn get_parent(&self, image: NativeHandle) -> NativeHandle;
    #[allow(clippy::too_many_arguments)]
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
        dither: bool,
    );
    fn draw_image(&self, image: NativeHandle);
    #[allow(clippy::too_many_arguments)]
    fn set_pixels(
        &self,
        dx: i32,
        dy: i32,
        src: NativeHandle,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    );
    #[allow(clippy::too_many_arguments)]
    fn write_pixels(
        &self,
        data: &[u8],
        stride: i32,
        format: u32,
        dx: i32,
        dy: i32,
        width: i32,
        height: i32,
    );
    #[allow(clippy::too_many_arguments)]
    fn get_pixels(
        &self,
        dst: NativeHandle,
        dx: i32,
        dy: i32,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    );
    #[allow(clippy::too_many_arguments)]
    fn read_pixels(
        &self,
        data: &mut [u8],
        stride: i32,
        format: u32,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    );
    fn copy_pixels(&self, dx: i32, dy: i32, sx: i32, sy: i32, width: i32, height: i32);

    // Image filters
    fn color_matrix(&self, dst: NativeHandle, src: NativeHandle, matrix: &[f32; 20]);
    #[allow(clippy::too_many_arguments)]
    fn convolve(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        kernel_width: i32,
        kernel_height: i32,
        shift_x: i32,
        shift_y: i32,
        kernel: &[i16],
        scale: f32,
        bias: f32,
        tiling_mode: u32,
    );
    #[allow(clippy::too_many_arguments)]
    fn separable_convolve(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        kernel_width: i32,
        kernel_height: i32,
        shift_x: i32,
        shift_y: i32,
        kernel_x: &[i16],
        kernel_y: &[i16],
        scale: f32,
        bias: f32,
        tiling_mode: u32,
    );
    fn gaussian_blur(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        std_deviation_x: f32,
        std_deviation_y: f32,
        tiling_mode: u32,
    );
    #[allow(clippy::too_many_arguments)]
    fn lookup(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        red: &[u8; 256],
        green: &[u8; 256],
        blue: &[u8; 256],
        alpha: &[u8; 256],
        output_linear: bool,
        output_premultiplied: bool,
    );
    fn lookup_single(
        &self,
        dst: NativeHandle,
        src: NativeHandle,
        table: &[u32; 256],
        source_channel: u32,
        output_linear: bool,
        output_premultiplied: bool,
    );

    // Queries
    fn hardware_query(&self, key: u32, setting: i32) -> u32;
    fn get_string(&self, name: u32) -> Option<String>;

    // VGU; each returns a VGUErrorCode
    fn vgu_line(&self, path: NativeHandle, x0: f32, y0: f32, x1: f32, y1: f32) -> u32;
    fn vgu_polygon(&self, path: NativeHandle, points: &[f32], closed: bool) -> u32;
    fn vgu_rect(&self, path: NativeHandle, x: f32, y: f32, width: f32, height: f32) -> u32;
    #[allow(clippy::too_many_arguments)]
    fn vgu_round_rect(
        &self,
        path: NativeHandle,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        arc_width: f32,
        arc_height: f32,
    ) -> u32;
    fn vgu_ellipse(&self, path: NativeHandle, cx: f32, cy: f32, width: f32, height: f32) -> u32;
    #[allow(clippy::too_many_arguments)]
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
    ) -> u32;
    fn vgu_compute_warp_quad_to_square(&self, src: &[f32; 8], matrix: &mut [f32; 9]) -> u32;
    fn vgu_compute_warp_square_to_quad(&self, dst: &[f32; 8], matrix: &mut [f32; 9]) -> u32;
    fn vgu_compute_warp_quad_to_quad(
        &self,
        dst: &[f32; 8],
        src: &[f32; 8],
        matrix: &mut [f32; 9],
    ) -> u32;
}

#[cfg(feature = "native")]
pub use native::NativeBackend;

#[cfg(feature = "native")]
mod native {
    use std::ffi::{c_void, CStr};
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::{Backend, Bounds, NativeHandle, PathCoords, PointAlongPath};
    use crate::vg::error::{VgError, VG_NO_ERROR};
    use crate::vg::ffi::{self, vg_bool, VG_TRUE};
    use crate::vg::path::coords_for_segments;
    use crate::vg::pixels::raw_region_len;
    use crate::vg::types::{path_param, PathDatatype, MAX_COORDS_PER_SEGMENT};

    /// Errors for calls refused before reaching the engine; drained together
    /// with the engine's own slot by `get_error`
    static REJECTED: AtomicU32 = AtomicU32::new(VG_NO_ERROR);

    /// Backend that calls straight into the system `libOpenVG`.
    ///
    /// All instances talk to the same process-wide engine state.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NativeBackend;

    impl NativeBackend {
        pub fn new() -> Self {
            NativeBackend
        }
    }

    fn len_i32(len: usize) -> i32 {
        i32::try_from(len).unwrap_or(i32::MAX)
    }

    /// Record a refused call; the first unread error wins
    fn reject(entry: &str, needed: Option<usize>, actual: usize) -> bool {
        log::warn!(
            "{} refused: buffer of {} elements, engine needs {:?}",
            entry,
            actual,
            needed
        );
        let _ = REJECTED.compare_exchange(
            VG_NO_ERROR,
            VgError::IllegalArgument.to_u32(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        false
    }

    /// Whether `len` bytes cover the pixel region the engine will touch
    fn pixels_fit(
        entry: &str,
        len: usize,
        format: u32,
        stride: i32,
        width: i32,
        height: i32,
    ) -> bool {
        match raw_region_len(format, stride, width, height) {
            Some(needed) if len >= needed => true,
            needed => reject(entry, needed, len),
        }
    }

    fn taps_fit(entry: &str, len: usize, width: i32, height: i32) -> bool {
        let needed = width.max(0) as usize * height.max(0) as usize;
        len >= needed || reject(entry, Some(needed), len)
    }

    /// The engine reads path data in the path's own datatype
    fn datatype_matches(entry: &str, path: NativeHandle, coords: &PathCoords) -> bool {
        let raw = unsafe { ffi::vgGetParameteri(path.raw(), path_param::DATATYPE as i32) };
        PathDatatype::from_i32(raw) == Some(coords.datatype()) || reject(entry, None, coords.len())
    }

    // SAFETY (whole impl): every pointer handed to the engine comes from a
    // live slice or array. Where the entry point takes a count, it is the
    // slice length; where it does not, the slice was checked above against
    // the size the other arguments imply.
    impl Backend for NativeBackend {
        fn get_error(&self) -> u32 {
            let engine = unsafe { ffi::vgGetError() };
            let rejected = REJECTED.swap(VG_NO_ERROR, Ordering::SeqCst);
            if engine != VG_NO_ERROR {
                engine
            } else {
                rejected
            }
        }

        fn create_context(&self, width: i32, height: i32) -> bool {
            unsafe { ffi::vgCreateContextSH(width, height) == VG_TRUE }
        }

        fn resize_surface(&self, width: i32, height: i32) {
            unsafe { ffi::vgResizeSurfaceSH(width, height) }
        }

        fn destroy_context(&self) {
            unsafe { ffi::vgDestroyContextSH() }
        }

        fn flush(&self) {
            unsafe { ffi::vgFlush() }
        }

        fn finish(&self) {
            unsafe { ffi::vgFinish() }
        }

        fn set_f(&self, key: u32, value: f32) {
            unsafe { ffi::vgSetf(key, value) }
        }

        fn set_i(&self, key: u32, value: i32) {
            unsafe { ffi::vgSeti(key, value) }
        }

        fn set_fv(&self, key: u32, values: &[f32]) {
            unsafe { ffi::vgSetfv(key, len_i32(values.len()), values.as_ptr()) }
        }

        fn set_iv(&self, key: u32, values: &[i32]) {
            unsafe { ffi::vgSetiv(key, len_i32(values.len()), values.as_ptr()) }
        }

        fn get_f(&self, key: u32) -> f32 {
            unsafe { ffi::vgGetf(key) }
        }

        fn get_i(&self, key: u32) -> i32 {
            unsafe { ffi::vgGeti(key) }
        }

        fn get_vector_size(&self, key: u32) -> i32 {
            unsafe { ffi::vgGetVectorSize(key) }
        }

        fn get_fv(&self, key: u32, values: &mut [f32]) {
            unsafe { ffi::vgGetfv(key, len_i32(values.len()), values.as_mut_ptr()) }
        }

        fn get_iv(&self, key: u32, values: &mut [i32]) {
            unsafe { ffi::vgGetiv(key, len_i32(values.len()), values.as_mut_ptr()) }
        }

        fn set_parameter_f(&self, object: NativeHandle, key: u32, value: f32) {
            unsafe { ffi::vgSetParameterf(object.raw(), key as i32, value) }
        }

        fn set_parameter_i(&self, object: NativeHandle, key: u32, value: i32) {
            unsafe { ffi::vgSetParameteri(object.raw(), key as i32, value) }
        }

        fn set_parameter_fv(&self, object: NativeHandle, key: u32, values: &[f32]) {
            unsafe {
                ffi::vgSetParameterfv(
                    object.raw(),
                    key as i32,
                    len_i32(values.len()),
                    values.as_ptr(),
                )
            }
        }

        fn set_parameter_iv(&self, object: NativeHandle, key: u32, values: &[i32]) {
            unsafe {
                ffi::vgSetParameteriv(
                    object.raw(),
                    key as i32,
                    len_i32(values.len()),
                    values.as_ptr(),
                )
            }
        }

        fn get_parameter_f(&self, object: NativeHandle, key: u32) -> f32 {
            unsafe { ffi::vgGetParameterf(object.raw(), key as i32) }
        }

        fn get_parameter_i(&self, object: NativeHandle, key: u32) -> i32 {
            unsafe { ffi::vgGetParameteri(object.raw(), key as i32) }
        }

        fn get_parameter_vector_size(&self, object: NativeHandle, key: u32) -> i32 {
            unsafe { ffi::vgGetParameterVectorSize(object.raw(), key as i32) }
        }

        fn get_parameter_fv(&self, object: NativeHandle, key: u32, values: &mut [f32]) {
            unsafe {
                ffi::vgGetParameterfv(
                    object.raw(),
                    key as i32,
                    len_i32(values.len()),
                    values.as_mut_ptr(),
                )
            }
        }

        fn get_parameter_iv(&self, object: NativeHandle, key: u32, values: &mut [i32]) {
            unsafe {
                ffi::vgGetParameteriv(
                    object.raw(),
                    key as i32,
                    len_i32(values.len()),
                    values.as_mut_ptr(),
                )
            }
        }

        fn load_identity(&self) {
            unsafe { ffi::vgLoadIdentity() }
        }

        fn load_matrix(&self, m: &[f32; 9]) {
            unsafe { ffi::vgLoadMatrix(m.as_ptr()) }
        }

        fn get_matrix(&self) -> [f32; 9] {
            let mut m = [0.0f32; 9];
            unsafe { ffi::vgGetMatrix(m.as_mut_ptr()) };
            m
        }

        fn mult_matrix(&self, m: &[f32; 9]) {
            unsafe { ffi::vgMultMatrix(m.as_ptr()) }
        }

        fn translate(&self, tx: f32, ty: f32) {
            unsafe { ffi::vgTranslate(tx, ty) }
        }

        fn scale(&self, sx: f32, sy: f32) {
            unsafe { ffi::vgScale(sx, sy) }
        }

        fn shear(&self, shx: f32, shy: f32) {
            unsafe { ffi::vgShear(shx, shy) }
        }

        fn rotate(&self, angle: f32) {
            unsafe { ffi::vgRotate(angle) }
        }

        fn mask(&self, mask: NativeHandle, operation: u32, x: i32, y: i32, width: i32, height: i32) {
            unsafe { ffi::vgMask(mask.raw(), operation, x, y, width, height) }
        }

        fn clear(&self, x: i32, y: i32, width: i32, height: i32) {
            unsafe { ffi::vgClear(x, y, width, height) }
        }

        fn create_path(
            &self,
            format: i32,
            datatype: u32,
            scale: f32,
            bias: f32,
            segment_capacity_hint: i32,
            coord_capacity_hint: i32,
            capabilities: u32,
        ) -> NativeHandle {
            NativeHandle::from_raw(unsafe {
                ffi::vgCreatePath(
                    format,
                    datatype,
                    scale,
                    bias,
                    segment_capacity_hint,
                    coord_capacity_hint,
                    capabilities,
                )
            })
        }

        fn clear_path(&self, path: NativeHandle, capabilities: u32) {
            unsafe { ffi::vgClearPath(path.raw(), capabilities) }
        }

        fn destroy_path(&self, path: NativeHandle) {
            unsafe { ffi::vgDestroyPath(path.raw()) }
        }

        fn remove_path_capabilities(&self, path: NativeHandle, capabilities: u32) {
            unsafe { ffi::vgRemovePathCapabilities(path.raw(), capabilities) }
        }

        fn get_path_capabilities(&self, path: NativeHandle) -> u32 {
            unsafe { ffi::vgGetPathCapabilities(path.raw()) }
        }

        fn append_path(&self, dst: NativeHandle, src: NativeHandle) {
            unsafe { ffi::vgAppendPath(dst.raw(), src.raw()) }
        }

        fn append_path_data(&self, dst: NativeHandle, segments: &[u8], coords: &PathCoords) {
            const ENTRY: &str = "vgAppendPathData";
            match coords_for_segments(segments) {
                Ok(needed) if coords.len() >= needed => {}
                Ok(needed) => {
                    reject(ENTRY, Some(needed), coords.len());
                    return;
                }
                Err(_) => {
                    reject(ENTRY, None, coords.len());
                    return;
                }
            }
            if !datatype_matches(ENTRY, dst, coords) {
                return;
            }
            unsafe {
                ffi::vgAppendPathData(
                    dst.raw(),
                    len_i32(segments.len()),
                    segments.as_ptr(),
                    coords.as_ptr(),
                )
            }
        }

        fn modify_path_coords(
            &self,
            dst: NativeHandle,
            start_index: i32,
            num_segments: i32,
            coords: &PathCoords,
        ) {
            const ENTRY: &str = "vgModifyPathCoords";
            // Segment types are unknown here, so size for the widest one
            let needed = MAX_COORDS_PER_SEGMENT * num_segments.max(0) as usize;
            if coords.len() < needed {
                reject(ENTRY, Some(needed), coords.len());
                return;
            }
            if !datatype_matches(ENTRY, dst, coords) {
                return;
            }
            unsafe { ffi::vgModifyPathCoords(dst.raw(), start_index, num_segments, coords.as_ptr()) }
        }

        fn transform_path(&self, dst: NativeHandle, src: NativeHandle) {
            unsafe { ffi::vgTransformPath(dst.raw(), src.raw()) }
        }

        fn interpolate_path(
            &self,
            dst: NativeHandle,
            start: NativeHandle,
            end: NativeHandle,
            amount: f32,
        ) -> bool {
            unsafe { ffi::vgInterpolatePath(dst.raw(), start.raw(), end.raw(), amount) == VG_TRUE }
        }

        fn path_length(&self, path: NativeHandle, start_segment: i32, num_segments: i32) -> f32 {
            unsafe { ffi::vgPathLength(path.raw(), start_segment, num_segments) }
        }

        fn point_along_path(
            &self,
            path: NativeHandle,
            start_segment: i32,
            num_segments: i32,
            distance: f32,
        ) -> PointAlongPath {
            let mut p = PointAlongPath::default();
            unsafe {
                ffi::vgPointAlongPath(
                    path.raw(),
                    start_segment,
                    num_segments,
                    distance,
                    &mut p.x,
                    &mut p.y,
                    &mut p.tangent_x,
                    &mut p.tangent_y,
                )
            };
            p
        }

        fn path_bounds(&self, path: NativeHandle) -> Bounds {
            let mut b = Bounds::default();
            unsafe {
                ffi::vgPathBounds(path.raw(), &mut b.x, &mut b.y, &mut b.width, &mut b.height)
            };
            b
        }

        fn path_transformed_bounds(&self, path: NativeHandle) -> Bounds {
            let mut b = Bounds::default();
            unsafe {
                ffi::vgPathTransformedBounds(
                    path.raw(),
                    &mut b.x,
                    &mut b.y,
                    &mut b.width,
                    &mut b.height,
                )
            };
            b
        }

        fn draw_path(&self, path: NativeHandle, paint_modes: u32) {
            unsafe { ffi::vgDrawPath(path.raw(), paint_modes) }
        }

        fn create_paint(&self) -> NativeHandle {
            NativeHandle::from_raw(unsafe { ffi::vgCreatePaint() })
        }

        fn destroy_paint(&self, paint: NativeHandle) {
            unsafe { ffi::vgDestroyPaint(paint.raw()) }
        }

        fn set_paint(&self, paint: NativeHandle, paint_modes: u32) {
            unsafe { ffi::vgSetPaint(paint.raw(), paint_modes) }
        }

        fn get_paint(&self, paint_mode: u32) -> NativeHandle {
            NativeHandle::from_raw(unsafe { ffi::vgGetPaint(paint_mode) })
        }

        fn set_color(&self, paint: NativeHandle, rgba: u32) {
            unsafe { ffi::vgSetColor(paint.raw(), rgba) }
        }

        fn get_color(&self, paint: NativeHandle) -> u32 {
            unsafe { ffi::vgGetColor(paint.raw()) }
        }

        fn paint_pattern(&self, paint: NativeHandle, pattern: NativeHandle) {
            unsafe { ffi::vgPaintPattern(paint.raw(), pattern.raw()) }
        }

        fn create_image(
            &self,
            format: u32,
            width: i32,
            height: i32,
            allowed_quality: u32,
        ) -> NativeHandle {
            NativeHandle::from_raw(unsafe {
                ffi::vgCreateImage(format, width, height, allowed_quality)
            })
        }

        fn destroy_image(&self, image: NativeHandle) {
            unsafe { ffi::vgDestroyImage(image.raw()) }
        }

        fn clear_image(&self, image: NativeHandle, x: i32, y: i32, width: i32, height: i32) {
            unsafe { ffi::vgClearImage(image.raw(), x, y, width, height) }
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
            if !pixels_fit("vgImageSubData", data.len(), format, stride, width, height) {
                return;
            }
            unsafe {
                ffi::vgImageSubData(
                    image.raw(),
                    data.as_ptr() as *const c_void,
                    stride,
                    format,
                    x,
                    y,
                    width,
                    height,
                )
            }
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
            if !pixels_fit("vgGetImageSubData", data.len(), format, stride, width, height) {
                return;
            }
            unsafe {
                ffi::vgGetImageSubData(
                    image.raw(),
                    data.as_mut_ptr() as *mut c_void,
                    stride,
                    format,
                    x,
                    y,
                    width,
                    height,
                )
            }
        }

        fn child_image(
            &self,
            parent: NativeHandle,
            x: i32,
            y: i32,
            width: i32,
            height: i32,
        ) -> NativeHandle {
            NativeHandle::from_raw(unsafe { ffi::vgChildImage(parent.raw(), x, y, width, height) })
        }

        fn get_parent(&self, image: NativeHandle) -> NativeHandle {
            NativeHandle::from_raw(unsafe { ffi::vgGetParent(image.raw()) })
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
            dither: bool,
        ) {
            unsafe {
                ffi::vgCopyImage(
                    dst.raw(),
                    dx,
                    dy,
                    src.raw(),
                    sx,
                    sy,
                    width,
                    height,
                    vg_bool(dither),
                )
            }
        }

        fn draw_image(&self, image: NativeHandle) {
            unsafe { ffi::vgDrawImage(image.raw()) }
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
            unsafe { ffi::vgSetPixels(dx, dy, src.raw(), sx, sy, width, height) }
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
            if !pixels_fit("vgWritePixels", data.len(), format, stride, width, height) {
                return;
            }
            unsafe {
                ffi::vgWritePixels(
                    data.as_ptr() as *const c_void,
                    stride,
                    format,
                    dx,
                    dy,
                    width,
                    height,
                )
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
            unsafe { ffi::vgGetPixels(dst.raw(), dx, dy, sx, sy, width, height) }
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
            if !pixels_fit("vgReadPixels", data.len(), format, stride, width, height) {
                return;
            }
            unsafe {
                ffi::vgReadPixels(
                    data.as_mut_ptr() as *mut c_void,
                    stride,
                    format,
                    sx,
                    sy,
                    width,
                    height,
                )
            }
        }

        fn copy_pixels(&self, dx: i32, dy: i32, sx: i32, sy: i32, width: i32, height: i32) {
            unsafe { ffi::vgCopyPixels(dx, dy, sx, sy, width, height) }
        }

        fn color_matrix(&self, dst: NativeHandle, src: NativeHandle, matrix: &[f32; 20]) {
            unsafe { ffi::vgColorMatrix(dst.raw(), src.raw(), matrix.as_ptr()) }
        }

        fn convolve(
            &self,
            dst: NativeHandle,
            src: NativeHandle,
            kernel_width: i32,
            kernel_height: i32,
            shift_x: i32,
            shift_y: i32,
            kernel: &[i16],
            scale: f32,
            bias: f32,
            tiling_mode: u32,
        ) {
            if !taps_fit("vgConvolve", kernel.len(), kernel_width, kernel_height) {
                return;
            }
            unsafe {
                ffi::vgConvolve(
                    dst.raw(),
                    src.raw(),
                    kernel_width,
                    kernel_height,
                    shift_x,
                    shift_y,
                    kernel.as_ptr(),
                    scale,
                    bias,
                    tiling_mode,
                )
            }
        }

        fn separable_convolve(
            &self,
            dst: NativeHandle,
            src: NativeHandle,
            kernel_width: i32,
            kernel_height: i32,
            shift_x: i32,
            shift_y: i32,
            kernel_x: &[i16],
            kernel_y: &[i16],
            scale: f32,
            bias: f32,
            tiling_mode: u32,
        ) {
            if !taps_fit("vgSeparableConvolve", kernel_x.len(), kernel_width, 1)
                || !taps_fit("vgSeparableConvolve", kernel_y.len(), 1, kernel_height)
            {
                return;
            }
            unsafe {
                ffi::vgSeparableConvolve(
                    dst.raw(),
                    src.raw(),
                    kernel_width,
                    kernel_height,
                    shift_x,
                    shift_y,
                    kernel_x.as_ptr(),
                    kernel_y.as_ptr(),
                    scale,
                    bias,
                    tiling_mode,
                )
            }
        }

        fn gaussian_blur(
            &self,
            dst: NativeHandle,
            src: NativeHandle,
            std_deviation_x: f32,
            std_deviation_y: f32,
            tiling_mode: u32,
        ) {
            unsafe {
                ffi::vgGaussianBlur(
                    dst.raw(),
                    src.raw(),
                    std_deviation_x,
                    std_deviation_y,
                    tiling_mode,
                )
            }
        }

        fn lookup(
            &self,
            dst: NativeHandle,
            src: NativeHandle,
            red: &[u8; 256],
            green: &[u8; 256],
            blue: &[u8; 256],
            alpha: &[u8; 256],
            output_linear: bool,
            output_premultiplied: bool,
        ) {
            unsafe {
                ffi::vgLookup(
                    dst.raw(),
                    src.raw(),
                    red.as_ptr(),
                    green.as_ptr(),
                    blue.as_ptr(),
                    alpha.as_ptr(),
                    vg_bool(output_linear),
                    vg_bool(output_premultiplied),
                )
            }
        }

        fn lookup_single(
            &self,
            dst: NativeHandle,
            src: NativeHandle,
            table: &[u32; 256],
            source_channel: u32,
            output_linear: bool,
            output_premultiplied: bool,
        ) {
            unsafe {
                ffi::vgLookupSingle(
                    dst.raw(),
                    src.raw(),
                    table.as_ptr(),
                    source_channel,
                    vg_bool(output_linear),
                    vg_bool(output_premultiplied),
                )
            }
        }

        fn hardware_query(&self, key: u32, setting: i32) -> u32 {
            unsafe { ffi::vgHardwareQuery(key, setting) }
        }

        fn get_string(&self, name: u32) -> Option<String> {
            let ptr = unsafe { ffi::vgGetString(name) };
            if ptr.is_null() {
                return None;
            }
            // SAFETY: the engine returns a static NUL-terminated string
            let s = unsafe { CStr::from_ptr(ptr) };
            Some(s.to_string_lossy().into_owned())
        }

        fn vgu_line(&self, path: NativeHandle, x0: f32, y0: f32, x1: f32, y1: f32) -> u32 {
            unsafe { ffi::vguLine(path.raw(), x0, y0, x1, y1) }
        }

        fn vgu_polygon(&self, path: NativeHandle, points: &[f32], closed: bool) -> u32 {
            let count = len_i32(points.len() / 2);
            unsafe { ffi::vguPolygon(path.raw(), points.as_ptr(), count, vg_bool(closed)) }
        }

        fn vgu_rect(&self, path: NativeHandle, x: f32, y: f32, width: f32, height: f32) -> u32 {
            unsafe { ffi::vguRect(path.raw(), x, y, width, height) }
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
            unsafe { ffi::vguRoundRect(path.raw(), x, y, width, height, arc_width, arc_height) }
        }

        fn vgu_ellipse(&self, path: NativeHandle, cx: f32, cy: f32, width: f32, height: f32) -> u32 {
            unsafe { ffi::vguEllipse(path.raw(), cx, cy, width, height) }
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
            unsafe {
                ffi::vguArc(
                    path.raw(),
                    x,
                    y,
                    width,
                    height,
                    start_angle,
                    angle_extent,
                    arc_type,
                )
            }
        }

        fn vgu_compute_warp_quad_to_square(&self, src: &[f32; 8], matrix: &mut [f32; 9]) -> u32 {
            unsafe {
                ffi::vguComputeWarpQuadToSquare(
                    src[0],
                    src[1],
                    src[2],
                    src[3],
                    src[4],
                    src[5],
                    src[6],
                    src[7],
                    matrix.as_mut_ptr(),
                )
            }
        }

        fn vgu_compute_warp_square_to_quad(&self, dst: &[f32; 8], matrix: &mut [f32; 9]) -> u32 {
            unsafe {
                ffi::vguComputeWarpSquareToQuad(
                    dst[0],
                    dst[1],
                    dst[2],
                    dst[3],
                    dst[4],
                    dst[5],
                    dst[6],
                    dst[7],
                    matrix.as_mut_ptr(),
                )
            }
        }

        fn vgu_compute_warp_quad_to_quad(
            &self,
            dst: &[f32; 8],
            src: &[f32; 8],
            matrix: &mut [f32; 9],
        ) -> u32 {
            unsafe {
                ffi::vguComputeWarpQuadToQuad(
                    dst[0],
                    dst[1],
                    dst[2],
                    dst[3],
                    dst[4],
                    dst[5],
                    dst[6],
                    dst[7],
                    src[0],
                    src[1],
                    src[2],
                    src[3],
                    src[4],
                    src[5],
                    src[6],
                    src[7],
                    matrix.as_mut_ptr(),
                )
            }
        }
    }
}
