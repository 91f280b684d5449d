// error.rs - Native error translation

//! Error types for the OpenVG binding.
//!
//! The engine reports failures through a global last-error slot rather than
//! return values. Every native entry point invoked by a wrapper goes through
//! [`native_call`], which reads that slot exactly once after the call, so an
//! error is always attributed to the call that produced it.
//!
//! Errors detected by the binding itself (wrong lengths, read-only keys and
//! so on) are reported before anything reaches the engine.

use crate::vg::backend::Backend;
use crate::vg::params::ParamKind;
use crate::vg::types::PathDatatype;

/// `VG_NO_ERROR`
pub const VG_NO_ERROR: u32 = 0;

/// `VGU_NO_ERROR`
pub const VGU_NO_ERROR: u32 = 0;

/// Errors reported by the engine through `vgGetError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum VgError {
    #[error("bad handle")]
    BadHandle,

    #[error("illegal argument")]
    IllegalArgument,

    #[error("out of memory")]
    OutOfMemory,

    #[error("path capability error")]
    PathCapability,

    #[error("unsupported image format")]
    UnsupportedImageFormat,

    #[error("unsupported path format")]
    UnsupportedPathFormat,

    #[error("image in use")]
    ImageInUse,

    #[error("no context")]
    NoContext,

    #[error("unknown error code 0x{0:04x}")]
    Unknown(u32),
}

impl VgError {
    /// Translate a raw `VGErrorCode`.
    ///
    /// `VG_NO_ERROR` is success; any other value is an error, including codes
    /// this binding does not know about.
    pub fn from_code(code: u32) -> std::result::Result<(), VgError> {
        match code {
            VG_NO_ERROR => Ok(()),
            0x1000 => Err(VgError::BadHandle),
            0x1001 => Err(VgError::IllegalArgument),
            0x1002 => Err(VgError::OutOfMemory),
            0x1003 => Err(VgError::PathCapability),
            0x1004 => Err(VgError::UnsupportedImageFormat),
            0x1005 => Err(VgError::UnsupportedPathFormat),
            0x1006 => Err(VgError::ImageInUse),
            0x1007 => Err(VgError::NoContext),
            other => Err(VgError::Unknown(other)),
        }
    }

    /// Convert to the raw error code
    pub fn to_u32(self) -> u32 {
        match self {
            VgError::BadHandle => 0x1000,
            VgError::IllegalArgument => 0x1001,
            VgError::OutOfMemory => 0x1002,
            VgError::PathCapability => 0x1003,
            VgError::UnsupportedImageFormat => 0x1004,
            VgError::UnsupportedPathFormat => 0x1005,
            VgError::ImageInUse => 0x1006,
            VgError::NoContext => 0x1007,
            VgError::Unknown(code) => code,
        }
    }
}

/// Errors returned directly by the VGU entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum VguError {
    #[error("bad handle")]
    BadHandle,

    #[error("illegal argument")]
    IllegalArgument,

    #[error("out of memory")]
    OutOfMemory,

    #[error("path capability error")]
    PathCapability,

    #[error("bad warp")]
    BadWarp,

    #[error("unknown utility error code 0x{0:04x}")]
    Unknown(u32),
}

impl VguError {
    /// Translate a raw `VGUErrorCode`
    pub fn from_code(code: u32) -> std::result::Result<(), VguError> {
        match code {
            VGU_NO_ERROR => Ok(()),
            0xF000 => Err(VguError::BadHandle),
            0xF001 => Err(VguError::IllegalArgument),
            0xF002 => Err(VguError::OutOfMemory),
            0xF003 => Err(VguError::PathCapability),
            0xF004 => Err(VguError::BadWarp),
            other => Err(VguError::Unknown(other)),
        }
    }

    /// Convert to the raw error code
    pub fn to_u32(self) -> u32 {
        match self {
            VguError::BadHandle => 0xF000,
            VguError::IllegalArgument => 0xF001,
            VguError::OutOfMemory => 0xF002,
            VguError::PathCapability => 0xF003,
            VguError::BadWarp => 0xF004,
            VguError::Unknown(code) => code,
        }
    }
}

/// Coarse grouping of [`Error`] variants for hosts that map errors onto
/// their own exception classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Raised by the engine
    Native,
    /// Malformed argument rejected by the binding
    Argument,
    /// Unknown key or segment command
    Index,
    /// Context or handle lifetime violation
    Lifecycle,
}

/// Binding error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("OpenVG error: {0}")]
    Native(#[from] VgError),

    #[error("VGU error: {0}")]
    Utility(#[from] VguError),

    #[error("parameter {name} expects a {expected:?} value")]
    WrongArgumentType {
        name: &'static str,
        expected: ParamKind,
    },

    #[error("{what} must have {expected} elements, got {actual}")]
    WrongArgumentLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unknown parameter key 0x{0:04x}")]
    UnknownParameter(u32),

    #[error("parameter {0} is read-only")]
    ReadOnlyParameter(&'static str),

    #[error("value {value} cannot be stored as {datatype:?}")]
    ValueOutOfRange { value: f64, datatype: PathDatatype },

    #[error("negative stride {0}")]
    NegativeStride(i32),

    #[error("unknown path segment command 0x{0:02x}")]
    UnknownSegment(u8),

    #[error("engine returned unrecognised value {value} for {name}")]
    UnexpectedValue { name: &'static str, value: i32 },

    #[error("unable to create a {width}x{height} context")]
    ContextCreationFailed { width: i32, height: i32 },

    #[error("a context is already bound to another backend")]
    ContextInUse,

    #[error("engine returned an invalid {0} handle")]
    HandleCreationFailed(&'static str),

    #[error("handle has already been released")]
    Released,
}

impl Error {
    /// Which class of failure this is
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Native(_) | Error::Utility(_) | Error::UnexpectedValue { .. } => {
                ErrorCategory::Native
            }
            Error::WrongArgumentType { .. }
            | Error::WrongArgumentLength { .. }
            | Error::ReadOnlyParameter(_)
            | Error::ValueOutOfRange { .. }
            | Error::NegativeStride(_) => ErrorCategory::Argument,
            Error::UnknownParameter(_) | Error::UnknownSegment(_) => ErrorCategory::Index,
            Error::ContextCreationFailed { .. }
            | Error::ContextInUse
            | Error::HandleCreationFailed(_)
            | Error::Released => ErrorCategory::Lifecycle,
        }
    }

    /// The engine error, if this came from the engine
    pub fn native(&self) -> Option<VgError> {
        match self {
            Error::Native(e) => Some(*e),
            _ => None,
        }
    }
}

/// Result type used throughout the binding
pub type Result<T> = std::result::Result<T, Error>;

/// Read the engine's last-error slot once and translate it
pub fn check(backend: &dyn Backend) -> Result<()> {
    let code = backend.get_error();
    VgError::from_code(code).map_err(|e| {
        log::trace!("engine reported {} (0x{:04x})", e, code);
        Error::Native(e)
    })
}

/// Run one native call, then check the error slot.
///
/// The closure must invoke exactly one entry point; a result produced by a
/// failed call is discarded.
pub fn native_call<T>(backend: &dyn Backend, f: impl FnOnce(&dyn Backend) -> T) -> Result<T> {
    let value = f(backend);
    check(backend)?;
    Ok(value)
}

/// Translate a VGU return code
pub fn check_utility(code: u32) -> Result<()> {
    VguError::from_code(code).map_err(Error::Utility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vg::mock::MockBackend;

    #[test]
    fn test_from_code() {
        assert_eq!(VgError::from_code(0), Ok(()));
        assert_eq!(VgError::from_code(0x1000), Err(VgError::BadHandle));
        assert_eq!(VgError::from_code(0x1007), Err(VgError::NoContext));
        assert_eq!(VgError::from_code(0x1234), Err(VgError::Unknown(0x1234)));
    }

    #[test]
    fn test_code_roundtrip() {
        for code in 0x1000..=0x1007 {
            let err = VgError::from_code(code).unwrap_err();
            assert_eq!(err.to_u32(), code);
        }
        for code in 0xF000..=0xF004 {
            let err = VguError::from_code(code).unwrap_err();
            assert_eq!(err.to_u32(), code);
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::Native(VgError::OutOfMemory).category(),
            ErrorCategory::Native
        );
        assert_eq!(
            Error::ReadOnlyParameter("VG_IMAGE_WIDTH").category(),
            ErrorCategory::Argument
        );
        assert_eq!(Error::UnknownParameter(7).category(), ErrorCategory::Index);
        assert_eq!(Error::UnknownSegment(99).category(), ErrorCategory::Index);
        assert_eq!(
            Error::UnexpectedValue {
                name: "VG_MATRIX_MODE",
                value: 7,
            }
            .category(),
            ErrorCategory::Native
        );
        assert_eq!(Error::Released.category(), ErrorCategory::Lifecycle);
    }

    #[test]
    fn test_check_clears_slot() {
        let mock = MockBackend::new();
        // No context yet: any non-creation call records NoContext
        mock.flush();
        assert_eq!(check(&mock), Err(Error::Native(VgError::NoContext)));
        assert_eq!(check(&mock), Ok(()));
    }

    #[test]
    fn test_native_call_discards_value_on_error() {
        let mock = MockBackend::new();
        let result = native_call(&mock, |vg| vg.get_i(0x1101));
        assert_eq!(result, Err(Error::Native(VgError::NoContext)));

        assert!(mock.create_context(8, 8));
        let result = native_call(&mock, |vg| vg.get_i(0x1101));
        assert_eq!(result, Ok(0x1900));
    }
}
