// OpenVG Rust bindings
// Handle-lifetime wrappers over OpenVG 1.1 and VGU

pub mod config;
pub mod vg;
pub mod vgu;

pub use config::ContextOptions;
pub use vg::{Context, Error, Image, Paint, Path, PathDesc, Result};
