// path.rs - Path handle wrapper

//! Owned path objects.
//!
//! A [`Path`] holds one engine path handle plus two cached bitmasks: the
//! paint modes last used to draw it and the capabilities last seen by or
//! sent to the engine. Everything else lives in the engine and is read
//! back on demand.
//!
//! Coordinate data is supplied as `f64` and converted to the path's stored
//! datatype, which is queried from the engine right before each conversion.

use std::sync::Arc;

use crate::vg::backend::{Backend, Bounds, NativeHandle, PathCoords, PointAlongPath};
use crate::vg::error::{native_call, Error, Result};
use crate::vg::handle::{ObjectKind, OwnedHandle};
use crate::vg::params::{self, ParamValue, Target};
use crate::vg::types::{
    path_param, segment, PaintMode, PathCapabilities, PathDatatype, MAX_COORDS_PER_SEGMENT,
    VG_PATH_FORMAT_STANDARD,
};

/// Creation arguments for [`Path::new`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathDesc {
    pub format: i32,
    pub datatype: PathDatatype,
    pub scale: f32,
    pub bias: f32,
    pub segment_capacity_hint: i32,
    pub coord_capacity_hint: i32,
    pub capabilities: PathCapabilities,
}

impl Default for PathDesc {
    fn default() -> Self {
        PathDesc {
            format: VG_PATH_FORMAT_STANDARD,
            datatype: PathDatatype::F32,
            scale: 1.0,
            bias: 0.0,
            segment_capacity_hint: 0,
            coord_capacity_hint: 0,
            capabilities: PathCapabilities::ALL,
        }
    }
}

impl PathDesc {
    pub fn with_datatype(datatype: PathDatatype) -> Self {
        PathDesc {
            datatype,
            ..Default::default()
        }
    }
}

/// Total coordinates consumed by a run of segment commands
pub fn coords_for_segments(segments: &[u8]) -> Result<usize> {
    segments.iter().try_fold(0usize, |total, &cmd| {
        segment::coord_count(cmd)
            .map(|n| total + n)
            .ok_or(Error::UnknownSegment(cmd))
    })
}

/// Convert caller coordinates to the engine's stored datatype.
///
/// Integer datatypes reject fractional and out-of-range values rather than
/// truncating them.
pub fn convert_coords(datatype: PathDatatype, coords: &[f64]) -> Result<PathCoords> {
    fn integral<T>(
        datatype: PathDatatype,
        coords: &[f64],
        min: f64,
        max: f64,
        cast: impl Fn(f64) -> T,
    ) -> Result<Vec<T>> {
        coords
            .iter()
            .map(|&value| {
                if value.fract() != 0.0 || !(min..=max).contains(&value) {
                    Err(Error::ValueOutOfRange { value, datatype })
                } else {
                    Ok(cast(value))
                }
            })
            .collect()
    }

    Ok(match datatype {
        PathDatatype::S8 => PathCoords::S8(integral(
            datatype,
            coords,
            i8::MIN as f64,
            i8::MAX as f64,
            |v| v as i8,
        )?),
        PathDatatype::S16 => PathCoords::S16(integral(
            datatype,
            coords,
            i16::MIN as f64,
            i16::MAX as f64,
            |v| v as i16,
        )?),
        PathDatatype::S32 => PathCoords::S32(integral(
            datatype,
            coords,
            i32::MIN as f64,
            i32::MAX as f64,
            |v| v as i32,
        )?),
        PathDatatype::F32 => PathCoords::F32(coords.iter().map(|&c| c as f32).collect()),
    })
}

/// An engine path object
#[derive(Debug)]
pub struct Path {
    handle: OwnedHandle,
    paint_modes: PaintMode,
    capabilities: PathCapabilities,
}

impl Path {
    pub fn new(backend: Arc<dyn Backend>, desc: &PathDesc) -> Result<Path> {
        let handle = OwnedHandle::acquire(backend, ObjectKind::Path, |vg| {
            vg.create_path(
                desc.format,
                desc.datatype as u32,
                desc.scale,
                desc.bias,
                desc.segment_capacity_hint,
                desc.coord_capacity_hint,
                desc.capabilities.bits(),
            )
        })?;
        Ok(Path {
            handle,
            paint_modes: PaintMode::NONE,
            capabilities: desc.capabilities,
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

    /// Destroy the engine path now; later calls are no-ops
    pub fn release(&mut self) -> Result<()> {
        self.handle.release()
    }

    /// Paint modes of the last successful `draw`
    pub fn paint_modes(&self) -> PaintMode {
        self.paint_modes
    }

    /// Capabilities as last observed, without asking the engine
    pub fn cached_capabilities(&self) -> PathCapabilities {
        self.capabilities
    }

    fn vg(&self) -> &dyn Backend {
        &**self.handle.backend()
    }

    fn stored_datatype(&self, handle: NativeHandle) -> Result<PathDatatype> {
        let raw = native_call(self.vg(), |vg| {
            vg.get_parameter_i(handle, path_param::DATATYPE)
        })?;
        PathDatatype::from_i32(raw).ok_or(Error::UnexpectedValue {
            name: "VG_PATH_DATATYPE",
            value: raw,
        })
    }

    pub fn append(&mut self, src: &Path) -> Result<()> {
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| vg.append_path(dst, src))
    }

    /// Append segment commands and their coordinates
    pub fn append_data(&mut self, segments: &[u8], coords: &[f64]) -> Result<()> {
        let handle = self.handle()?;
        let expected = coords_for_segments(segments)?;
        if expected != coords.len() {
            return Err(Error::WrongArgumentLength {
                what: "path coordinates",
                expected,
                actual: coords.len(),
            });
        }

        let datatype = self.stored_datatype(handle)?;
        let coords = convert_coords(datatype, coords)?;
        native_call(self.vg(), |vg| vg.append_path_data(handle, segments, &coords))
    }

    /// Overwrite the coordinates of `num_segments` segments from `start`.
    ///
    /// The buffer handed to the engine is zero-padded to the widest
    /// possible segment so it can never be read past its end.
    pub fn modify_coords(&mut self, start: i32, num_segments: i32, coords: &[f64]) -> Result<()> {
        let handle = self.handle()?;
        let padded_len = MAX_COORDS_PER_SEGMENT * num_segments.max(0) as usize;
        let mut padded = coords.to_vec();
        if padded.len() < padded_len {
            padded.resize(padded_len, 0.0);
        }

        let datatype = self.stored_datatype(handle)?;
        let coords = convert_coords(datatype, &padded)?;
        native_call(self.vg(), |vg| {
            vg.modify_path_coords(handle, start, num_segments, &coords)
        })
    }

    pub fn bounds(&self) -> Result<Bounds> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.path_bounds(handle))
    }

    pub fn transformed_bounds(&self) -> Result<Bounds> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.path_transformed_bounds(handle))
    }

    /// Ask the engine for the current capabilities and cache them
    pub fn capabilities(&mut self) -> Result<PathCapabilities> {
        let handle = self.handle()?;
        let bits = native_call(self.vg(), |vg| vg.get_path_capabilities(handle))?;
        self.capabilities = PathCapabilities::from_bits(bits);
        Ok(self.capabilities)
    }

    pub fn remove_capabilities(&mut self, capabilities: PathCapabilities) -> Result<()> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| {
            vg.remove_path_capabilities(handle, capabilities.bits())
        })?;
        self.capabilities()?;
        Ok(())
    }

    /// Drop all segments and reset the capabilities
    pub fn clear(&mut self, capabilities: PathCapabilities) -> Result<()> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.clear_path(handle, capabilities.bits()))?;
        self.capabilities = capabilities;
        Ok(())
    }

    pub fn draw(&mut self, modes: PaintMode) -> Result<()> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| vg.draw_path(handle, modes.bits()))?;
        self.paint_modes = modes;
        Ok(())
    }

    /// Append the blend of `start` and `end`; `false` if they are incompatible
    pub fn interpolate(&mut self, start: &Path, end: &Path, amount: f32) -> Result<bool> {
        let dst = self.handle()?;
        let start = start.handle()?;
        let end = end.handle()?;
        native_call(self.vg(), |vg| vg.interpolate_path(dst, start, end, amount))
    }

    pub fn length(&self, start_segment: i32, num_segments: i32) -> Result<f32> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| {
            vg.path_length(handle, start_segment, num_segments)
        })
    }

    pub fn point_along(
        &self,
        start_segment: i32,
        num_segments: i32,
        distance: f32,
    ) -> Result<PointAlongPath> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| {
            vg.point_along_path(handle, start_segment, num_segments, distance)
        })
    }

    /// Append `src` transformed by the path-user-to-surface matrix
    pub fn transform(&mut self, src: &Path) -> Result<()> {
        let dst = self.handle()?;
        let src = src.handle()?;
        native_call(self.vg(), |vg| vg.transform_path(dst, src))
    }

    pub fn get(&self, key: u32) -> Result<ParamValue> {
        params::get(self.vg(), Target::Path(self.handle()?), key)
    }

    pub fn set(&mut self, key: u32, value: ParamValue) -> Result<()> {
        params::set(self.vg(), Target::Path(self.handle()?), key, value)
    }

    pub fn num_segments(&self) -> Result<i32> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| {
            vg.get_parameter_i(handle, path_param::NUM_SEGMENTS)
        })
    }

    pub fn num_coords(&self) -> Result<i32> {
        let handle = self.handle()?;
        native_call(self.vg(), |vg| {
            vg.get_parameter_i(handle, path_param::NUM_COORDS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vg::error::VgError;
    use crate::vg::mock::MockBackend;

    fn setup(datatype: PathDatatype) -> (Arc<MockBackend>, Path) {
        let mock = Arc::new(MockBackend::new());
        assert!(mock.create_context(64, 64));
        let backend: Arc<dyn Backend> = mock.clone();
        let path = Path::new(backend, &PathDesc::with_datatype(datatype)).unwrap();
        (mock, path)
    }

    #[test]
    fn test_coords_for_segments() {
        let segs = [
            segment::MOVE_TO_ABS,
            segment::CUBIC_TO_REL,
            segment::HLINE_TO_ABS,
            segment::SCCWARC_TO_ABS,
            segment::CLOSE_PATH,
        ];
        assert_eq!(coords_for_segments(&segs), Ok(2 + 6 + 1 + 5));
        assert_eq!(coords_for_segments(&[0x30]), Err(Error::UnknownSegment(0x30)));
    }

    #[test]
    fn test_convert_coords_ranges() {
        assert_eq!(
            convert_coords(PathDatatype::S8, &[-128.0, 127.0]),
            Ok(PathCoords::S8(vec![-128, 127]))
        );
        assert_eq!(
            convert_coords(PathDatatype::S8, &[128.0]),
            Err(Error::ValueOutOfRange {
                value: 128.0,
                datatype: PathDatatype::S8,
            })
        );
        assert_eq!(
            convert_coords(PathDatatype::S16, &[1.5]),
            Err(Error::ValueOutOfRange {
                value: 1.5,
                datatype: PathDatatype::S16,
            })
        );
        assert_eq!(
            convert_coords(PathDatatype::F32, &[1.5]),
            Ok(PathCoords::F32(vec![1.5]))
        );
    }

    #[test]
    fn test_append_data_bounds() {
        let (_mock, mut path) = setup(PathDatatype::F32);
        path.append_data(
            &[segment::MOVE_TO_ABS, segment::LINE_TO_ABS],
            &[10.0, 20.0, 110.0, 70.0],
        )
        .unwrap();
        let b = path.bounds().unwrap();
        assert_eq!((b.x, b.y, b.width, b.height), (10.0, 20.0, 100.0, 50.0));
        assert_eq!(path.num_segments().unwrap(), 2);
        assert_eq!(path.num_coords().unwrap(), 4);
    }

    #[test]
    fn test_append_data_wrong_count_makes_no_call() {
        let (mock, mut path) = setup(PathDatatype::F32);
        mock.reset_calls();
        let err = path
            .append_data(&[segment::MOVE_TO_ABS], &[1.0, 2.0, 3.0])
            .unwrap_err();
        assert_eq!(
            err,
            Error::WrongArgumentLength {
                what: "path coordinates",
                expected: 2,
                actual: 3,
            }
        );
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    fn test_append_data_queries_datatype() {
        let (mock, mut path) = setup(PathDatatype::S16);
        mock.reset_calls();
        path.append_data(&[segment::MOVE_TO_ABS], &[300.0, -2.0])
            .unwrap();
        assert_eq!(mock.calls("vgGetParameteri"), 1);
        assert_eq!(mock.calls("vgAppendPathData"), 1);

        let handle = path.handle().unwrap();
        assert_eq!(mock.path_coords(handle), Some(vec![300.0, -2.0]));
    }

    #[test]
    fn test_modify_coords_pads_buffer() {
        let (mock, mut path) = setup(PathDatatype::F32);
        path.append_data(
            &[segment::MOVE_TO_ABS, segment::LINE_TO_ABS],
            &[0.0, 0.0, 5.0, 5.0],
        )
        .unwrap();
        path.modify_coords(1, 1, &[8.0, 9.0]).unwrap();
        let handle = path.handle().unwrap();
        assert_eq!(mock.path_coords(handle), Some(vec![0.0, 0.0, 8.0, 9.0]));
    }

    #[test]
    fn test_draw_caches_modes() {
        let (_mock, mut path) = setup(PathDatatype::F32);
        path.draw(PaintMode::FILL | PaintMode::STROKE).unwrap();
        assert_eq!(path.paint_modes(), PaintMode::FILL | PaintMode::STROKE);
    }

    #[test]
    fn test_draw_without_context() {
        let mock = Arc::new(MockBackend::new());
        let backend: Arc<dyn Backend> = mock.clone();
        let mut path = Path::new(backend, &PathDesc::default()).unwrap();

        let err = path.draw(PaintMode::FILL).unwrap_err();
        assert_eq!(err, Error::Native(VgError::NoContext));
        assert_eq!(path.paint_modes(), PaintMode::NONE);
        assert!(!path.is_released());
    }

    #[test]
    fn test_remove_capabilities_refreshes_cache() {
        let (mock, mut path) = setup(PathDatatype::F32);
        mock.reset_calls();
        path.remove_capabilities(PathCapabilities::MODIFY).unwrap();
        assert!(!path.cached_capabilities().contains(PathCapabilities::MODIFY));
        assert_eq!(mock.calls("vgGetPathCapabilities"), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let (mock, mut path) = setup(PathDatatype::F32);
        path.release().unwrap();
        path.release().unwrap();
        assert_eq!(path.bounds().unwrap_err(), Error::Released);
        drop(path);
        assert_eq!(mock.calls("vgDestroyPath"), 1);
    }

    #[test]
    fn test_read_only_parameter() {
        let (mock, mut path) = setup(PathDatatype::F32);
        mock.reset_calls();
        let err = path
            .set(path_param::NUM_SEGMENTS, ParamValue::Int(3))
            .unwrap_err();
        assert_eq!(err, Error::ReadOnlyParameter("VG_PATH_NUM_SEGMENTS"));
        assert_eq!(mock.total_calls(), 0);
    }

    #[test]
    fn test_interpolate_and_length() {
        let (mock, mut dst) = setup(PathDatatype::F32);
        let backend: Arc<dyn Backend> = mock.clone();
        let mut a = Path::new(backend.clone(), &PathDesc::default()).unwrap();
        let mut b = Path::new(backend, &PathDesc::default()).unwrap();
        let segs = [segment::MOVE_TO_ABS, segment::LINE_TO_ABS];
        a.append_data(&segs, &[0.0, 0.0, 10.0, 0.0]).unwrap();
        b.append_data(&segs, &[0.0, 0.0, 30.0, 0.0]).unwrap();

        assert!(dst.interpolate(&a, &b, 0.5).unwrap());
        assert!((dst.length(0, 2).unwrap() - 20.0).abs() < 1e-5);

        let p = dst.point_along(0, 2, 5.0).unwrap();
        assert_eq!((p.x, p.y, p.tangent_x, p.tangent_y), (5.0, 0.0, 1.0, 0.0));
    }
}
