//! OpenVG FFI layer - C ABI bindings.
//!
//! Raw declarations of the entry points exported by `libOpenVG` (OpenVG 1.1
//! core, the VGU utility library and the ShivaVG context extension). Nothing
//! here is safe to call directly; [`crate::vg::backend::NativeBackend`] is the
//! only caller.
//!
//! # Safety Requirements
//!
//! ## Context
//!
//! Every function except `vgCreateContextSH` requires a live context created
//! by `vgCreateContextSH` on the calling thread. Without one, calls have no
//! effect and `vgGetError` reports `VG_NO_CONTEXT_ERROR`.
//!
//! ## Error Slot
//!
//! Errors are recorded in a single last-error slot which `vgGetError` reads
//! and clears. The slot keeps the *first* unread error; it must be drained
//! after every call or later failures are attributed to earlier calls.
//!
//! ## Pointers
//!
//! - Array arguments must point to at least as many elements as the count
//!   arguments (or the documented fixed size) imply.
//! - `pathData` for `vgAppendPathData`/`vgModifyPathCoords` is interpreted
//!   according to the path's `VG_PATH_DATATYPE`.
//! - Pixel pointers must cover `dataStride * (height - 1) + width * bpp`
//!   bytes.
//! - `vgGetString` returns a static NUL-terminated string or NULL.
//!
//! ## Threading
//!
//! The engine keeps per-thread context state; all calls for one context must
//! come from the thread that created it.

use libc::{c_char, c_void};

// ============================================================================
// Type Definitions
// ============================================================================

pub type VGfloat = f32;
pub type VGbyte = i8;
pub type VGubyte = u8;
pub type VGshort = i16;
pub type VGint = i32;
pub type VGuint = u32;
pub type VGbitfield = u32;
pub type VGenum = u32;

/// `VGboolean` is an enum in the C headers (`VG_FALSE`, `VG_TRUE`)
pub type VGboolean = u32;

pub const VG_FALSE: VGboolean = 0;
pub const VG_TRUE: VGboolean = 1;

/// Opaque engine object handle
pub type VGHandle = u32;
pub type VGPath = VGHandle;
pub type VGImage = VGHandle;
pub type VGPaint = VGHandle;

pub const VG_INVALID_HANDLE: VGHandle = 0;

/// Convert a Rust bool to `VGboolean`
pub fn vg_bool(value: bool) -> VGboolean {
    if value {
        VG_TRUE
    } else {
        VG_FALSE
    }
}

// ============================================================================
// Raw FFI Bindings
// ============================================================================

// Linked by build.rs when the `native` feature is enabled.
extern "C" {
    // ------------------------------------------------------------------------
    // Errors, synchronization
    // ------------------------------------------------------------------------

    /// Read and clear the last-error slot.
    pub fn vgGetError() -> VGenum;

    pub fn vgFlush();

    pub fn vgFinish();

    // ------------------------------------------------------------------------
    // Context parameters
    // ------------------------------------------------------------------------

    pub fn vgSetf(param_type: VGenum, value: VGfloat);
    pub fn vgSeti(param_type: VGenum, value: VGint);
    pub fn vgSetfv(param_type: VGenum, count: VGint, values: *const VGfloat);
    pub fn vgSetiv(param_type: VGenum, count: VGint, values: *const VGint);

    pub fn vgGetf(param_type: VGenum) -> VGfloat;
    pub fn vgGeti(param_type: VGenum) -> VGint;
    pub fn vgGetVectorSize(param_type: VGenum) -> VGint;
    pub fn vgGetfv(param_type: VGenum, count: VGint, values: *mut VGfloat);
    pub fn vgGetiv(param_type: VGenum, count: VGint, values: *mut VGint);

    // ------------------------------------------------------------------------
    // Object parameters
    // ------------------------------------------------------------------------

    pub fn vgSetParameterf(object: VGHandle, param_type: VGint, value: VGfloat);
    pub fn vgSetParameteri(object: VGHandle, param_type: VGint, value: VGint);
    pub fn vgSetParameterfv(
        object: VGHandle,
        param_type: VGint,
        count: VGint,
        values: *const VGfloat,
    );
    pub fn vgSetParameteriv(object: VGHandle, param_type: VGint, count: VGint, values: *const VGint);

    pub fn vgGetParameterf(object: VGHandle, param_type: VGint) -> VGfloat;
    pub fn vgGetParameteri(object: VGHandle, param_type: VGint) -> VGint;
    pub fn vgGetParameterVectorSize(object: VGHandle, param_type: VGint) -> VGint;
    pub fn vgGetParameterfv(object: VGHandle, param_type: VGint, count: VGint, values: *mut VGfloat);
    pub fn vgGetParameteriv(object: VGHandle, param_type: VGint, count: VGint, values: *mut VGint);

    // ------------------------------------------------------------------------
    // Matrix manipulation
    // ------------------------------------------------------------------------

    pub fn vgLoadIdentity();
    /// `m` points to 9 floats, column-major
    pub fn vgLoadMatrix(m: *const VGfloat);
    pub fn vgGetMatrix(m: *mut VGfloat);
    pub fn vgMultMatrix(m: *const VGfloat);
    pub fn vgTranslate(tx: VGfloat, ty: VGfloat);
    pub fn vgScale(sx: VGfloat, sy: VGfloat);
    pub fn vgShear(shx: VGfloat, shy: VGfloat);
    pub fn vgRotate(angle: VGfloat);

    // ------------------------------------------------------------------------
    // Masking and clearing
    // ------------------------------------------------------------------------

    pub fn vgMask(mask: VGHandle, operation: VGenum, x: VGint, y: VGint, width: VGint, height: VGint);
    pub fn vgClear(x: VGint, y: VGint, width: VGint, height: VGint);

    // ------------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------------

    pub fn vgCreatePath(
        path_format: VGint,
        datatype: VGenum,
        scale: VGfloat,
        bias: VGfloat,
        segment_capacity_hint: VGint,
        coord_capacity_hint: VGint,
        capabilities: VGbitfield,
    ) -> VGPath;
    pub fn vgClearPath(path: VGPath, capabilities: VGbitfield);
    pub fn vgDestroyPath(path: VGPath);
    pub fn vgRemovePathCapabilities(path: VGPath, capabilities: VGbitfield);
    pub fn vgGetPathCapabilities(path: VGPath) -> VGbitfield;
    pub fn vgAppendPath(dst_path: VGPath, src_path: VGPath);
    /// `path_data` element type follows the path's datatype
    pub fn vgAppendPathData(
        dst_path: VGPath,
        num_segments: VGint,
        path_segments: *const VGubyte,
        path_data: *const c_void,
    );
    pub fn vgModifyPathCoords(
        dst_path: VGPath,
        start_index: VGint,
        num_segments: VGint,
        path_data: *const c_void,
    );
    pub fn vgTransformPath(dst_path: VGPath, src_path: VGPath);
    pub fn vgInterpolatePath(
        dst_path: VGPath,
        start_path: VGPath,
        end_path: VGPath,
        amount: VGfloat,
    ) -> VGboolean;
    pub fn vgPathLength(path: VGPath, start_segment: VGint, num_segments: VGint) -> VGfloat;
    pub fn vgPointAlongPath(
        path: VGPath,
        start_segment: VGint,
        num_segments: VGint,
        distance: VGfloat,
        x: *mut VGfloat,
        y: *mut VGfloat,
        tangent_x: *mut VGfloat,
        tangent_y: *mut VGfloat,
    );
    pub fn vgPathBounds(
        path: VGPath,
        min_x: *mut VGfloat,
        min_y: *mut VGfloat,
        width: *mut VGfloat,
        height: *mut VGfloat,
    );
    pub fn vgPathTransformedBounds(
        path: VGPath,
        min_x: *mut VGfloat,
        min_y: *mut VGfloat,
        width: *mut VGfloat,
        height: *mut VGfloat,
    );
    pub fn vgDrawPath(path: VGPath, paint_modes: VGbitfield);

    // ------------------------------------------------------------------------
    // Paint
    // ------------------------------------------------------------------------

    pub fn vgCreatePaint() -> VGPaint;
    pub fn vgDestroyPaint(paint: VGPaint);
    pub fn vgSetPaint(paint: VGPaint, paint_modes: VGbitfield);
    pub fn vgGetPaint(paint_mode: VGenum) -> VGPaint;
    pub fn vgSetColor(paint: VGPaint, rgba: VGuint);
    pub fn vgGetColor(paint: VGPaint) -> VGuint;
    pub fn vgPaintPattern(paint: VGPaint, pattern: VGImage);

    // ------------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------------

    pub fn vgCreateImage(
        format: VGenum,
        width: VGint,
        height: VGint,
        allowed_quality: VGbitfield,
    ) -> VGImage;
    pub fn vgDestroyImage(image: VGImage);
    pub fn vgClearImage(image: VGImage, x: VGint, y: VGint, width: VGint, height: VGint);
    pub fn vgImageSubData(
        image: VGImage,
        data: *const c_void,
        data_stride: VGint,
        data_format: VGenum,
        x: VGint,
        y: VGint,
        width: VGint,
        height: VGint,
    );
    pub fn vgGetImageSubData(
        image: VGImage,
        data: *mut c_void,
        data_stride: VGint,
        data_format: VGenum,
        x: VGint,
        y: VGint,
        width: VGint,
        height: VGint,
    );
    pub fn vgChildImage(parent: VGImage, x: VGint, y: VGint, width: VGint, height: VGint) -> VGImage;
    pub fn vgGetParent(image: VGImage) -> VGImage;
    pub fn vgCopyImage(
        dst: VGImage,
        dx: VGint,
        dy: VGint,
        src: VGImage,
        sx: VGint,
        sy: VGint,
        width: VGint,
        height: VGint,
        dither: VGboolean,
    );
    pub fn vgDrawImage(image: VGImage);
    pub fn vgSetPixels(
        dx: VGint,
        dy: VGint,
        src: VGImage,
        sx: VGint,
        sy: VGint,
        width: VGint,
        height: VGint,
    );
    pub fn vgWritePixels(
        data: *const c_void,
        data_stride: VGint,
        data_format: VGenum,
        dx: VGint,
        dy: VGint,
        width: VGint,
        height: VGint,
    );
    pub fn vgGetPixels(
        dst: VGImage,
        dx: VGint,
        dy: VGint,
        sx: VGint,
        sy: VGint,
        width: VGint,
        height: VGint,
    );
    pub fn vgReadPixels(
        data: *mut c_void,
        data_stride: VGint,
        data_format: VGenum,
        sx: VGint,
        sy: VGint,
        width: VGint,
        height: VGint,
    );
    pub fn vgCopyPixels(dx: VGint, dy: VGint, sx: VGint, sy: VGint, width: VGint, height: VGint);

    // ------------------------------------------------------------------------
    // Image filters
    // ------------------------------------------------------------------------

    /// `matrix` points to 20 floats
    pub fn vgColorMatrix(dst: VGImage, src: VGImage, matrix: *const VGfloat);
    pub fn vgConvolve(
        dst: VGImage,
        src: VGImage,
        kernel_width: VGint,
        kernel_height: VGint,
        shift_x: VGint,
        shift_y: VGint,
        kernel: *const VGshort,
        scale: VGfloat,
        bias: VGfloat,
        tiling_mode: VGenum,
    );
    pub fn vgSeparableConvolve(
        dst: VGImage,
        src: VGImage,
        kernel_width: VGint,
        kernel_height: VGint,
        shift_x: VGint,
        shift_y: VGint,
        kernel_x: *const VGshort,
        kernel_y: *const VGshort,
        scale: VGfloat,
        bias: VGfloat,
        tiling_mode: VGenum,
    );
    pub fn vgGaussianBlur(
        dst: VGImage,
        src: VGImage,
        std_deviation_x: VGfloat,
        std_deviation_y: VGfloat,
        tiling_mode: VGenum,
    );
    /// Each table points to 256 entries
    pub fn vgLookup(
        dst: VGImage,
        src: VGImage,
        red_lut: *const VGubyte,
        green_lut: *const VGubyte,
        blue_lut: *const VGubyte,
        alpha_lut: *const VGubyte,
        output_linear: VGboolean,
        output_premultiplied: VGboolean,
    );
    pub fn vgLookupSingle(
        dst: VGImage,
        src: VGImage,
        lookup_table: *const VGuint,
        source_channel: VGenum,
        output_linear: VGboolean,
        output_premultiplied: VGboolean,
    );

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn vgHardwareQuery(key: VGenum, setting: VGint) -> VGenum;
    pub fn vgGetString(name: VGenum) -> *const c_char;

    // ------------------------------------------------------------------------
    // ShivaVG context extension
    // ------------------------------------------------------------------------

    pub fn vgCreateContextSH(width: VGint, height: VGint) -> VGboolean;
    pub fn vgResizeSurfaceSH(width: VGint, height: VGint);
    pub fn vgDestroyContextSH();

    // ------------------------------------------------------------------------
    // VGU (returns VGUErrorCode directly)
    // ------------------------------------------------------------------------

    pub fn vguLine(path: VGPath, x0: VGfloat, y0: VGfloat, x1: VGfloat, y1: VGfloat) -> VGenum;
    pub fn vguPolygon(path: VGPath, points: *const VGfloat, count: VGint, closed: VGboolean) -> VGenum;
    pub fn vguRect(path: VGPath, x: VGfloat, y: VGfloat, width: VGfloat, height: VGfloat) -> VGenum;
    pub fn vguRoundRect(
        path: VGPath,
        x: VGfloat,
        y: VGfloat,
        width: VGfloat,
        height: VGfloat,
        arc_width: VGfloat,
        arc_height: VGfloat,
    ) -> VGenum;
    pub fn vguEllipse(path: VGPath, cx: VGfloat, cy: VGfloat, width: VGfloat, height: VGfloat) -> VGenum;
    pub fn vguArc(
        path: VGPath,
        x: VGfloat,
        y: VGfloat,
        width: VGfloat,
        height: VGfloat,
        start_angle: VGfloat,
        angle_extent: VGfloat,
        arc_type: VGenum,
    ) -> VGenum;
    pub fn vguComputeWarpQuadToSquare(
        sx0: VGfloat,
        sy0: VGfloat,
        sx1: VGfloat,
        sy1: VGfloat,
        sx2: VGfloat,
        sy2: VGfloat,
        sx3: VGfloat,
        sy3: VGfloat,
        matrix: *mut VGfloat,
    ) -> VGenum;
    pub fn vguComputeWarpSquareToQuad(
        dx0: VGfloat,
        dy0: VGfloat,
        dx1: VGfloat,
        dy1: VGfloat,
        dx2: VGfloat,
        dy2: VGfloat,
        dx3: VGfloat,
        dy3: VGfloat,
        matrix: *mut VGfloat,
    ) -> VGenum;
    pub fn vguComputeWarpQuadToQuad(
        dx0: VGfloat,
        dy0: VGfloat,
        dx1: VGfloat,
        dy1: VGfloat,
        dx2: VGfloat,
        dy2: VGfloat,
        dx3: VGfloat,
        dy3: VGfloat,
        sx0: VGfloat,
        sy0: VGfloat,
        sx1: VGfloat,
        sy1: VGfloat,
        sx2: VGfloat,
        sy2: VGfloat,
        sx3: VGfloat,
        sy3: VGfloat,
        matrix: *mut VGfloat,
    ) -> VGenum;
}
