// mod.rs - OpenVG binding

//! Safe wrappers over the OpenVG engine.
//!
//! Every engine object is owned by exactly one wrapper ([`Path`], [`Paint`],
//! [`Image`]) that destroys it once, and every native call is followed by a
//! read of the engine's error slot. The process-wide [`Context`] must be
//! alive for drawing calls to succeed.

pub mod backend;
pub mod context;
pub mod error;
#[cfg(feature = "native")]
pub mod ffi;
mod handle;
pub mod image;
pub mod mock;
pub mod paint;
pub mod params;
pub mod path;
pub mod pixels;
pub mod types;

#[cfg(feature = "native")]
pub use backend::NativeBackend;
pub use backend::{Backend, Bounds, NativeHandle, PathCoords, PointAlongPath};
pub use context::Context;
pub use error::{Error, ErrorCategory, Result, VgError, VguError};
pub use image::{ConvolveKernel, Convolution, Image, SeparableKernel};
pub use mock::MockBackend;
pub use paint::Paint;
pub use params::{ParamKind, ParamSpace, ParamValue};
pub use path::{Path, PathDesc};
pub use types::*;
