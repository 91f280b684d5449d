// types.rs - OpenVG enumerations and bitfields

//! Core enumerations for the OpenVG API.
//!
//! Values mirror `openvg.h` (1.1, plus the ShivaVG `_SH` blend modes) so they
//! can be passed through to the engine unchanged.

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Path format identifier for the standard segment encoding
pub const VG_PATH_FORMAT_STANDARD: i32 = 0;

/// Maximum number of coordinates any single segment consumes (cubic)
pub const MAX_COORDS_PER_SEGMENT: usize = 6;

/// Entries in a `lookup` table, and in a `lookup_single` table
pub const LOOKUP_TABLE_SIZE: usize = 256;

/// Context parameter keys (`VGParamType`)
pub mod param_type {
    pub const MATRIX_MODE: u32 = 0x1100;
    pub const FILL_RULE: u32 = 0x1101;
    pub const IMAGE_QUALITY: u32 = 0x1102;
    pub const RENDERING_QUALITY: u32 = 0x1103;
    pub const BLEND_MODE: u32 = 0x1104;
    pub const IMAGE_MODE: u32 = 0x1105;
    pub const SCISSOR_RECTS: u32 = 0x1106;
    pub const STROKE_LINE_WIDTH: u32 = 0x1110;
    pub const STROKE_CAP_STYLE: u32 = 0x1111;
    pub const STROKE_JOIN_STYLE: u32 = 0x1112;
    pub const STROKE_MITER_LIMIT: u32 = 0x1113;
    pub const STROKE_DASH_PATTERN: u32 = 0x1114;
    pub const STROKE_DASH_PHASE: u32 = 0x1115;
    pub const STROKE_DASH_PHASE_RESET: u32 = 0x1116;
    pub const TILE_FILL_COLOR: u32 = 0x1120;
    pub const CLEAR_COLOR: u32 = 0x1121;
    pub const MASKING: u32 = 0x1130;
    pub const SCISSORING: u32 = 0x1131;
    pub const PIXEL_LAYOUT: u32 = 0x1140;
    pub const SCREEN_LAYOUT: u32 = 0x1141;
    pub const FILTER_FORMAT_LINEAR: u32 = 0x1150;
    pub const FILTER_FORMAT_PREMULTIPLIED: u32 = 0x1151;
    pub const FILTER_CHANNEL_MASK: u32 = 0x1152;
    pub const MAX_SCISSOR_RECTS: u32 = 0x1160;
    pub const MAX_DASH_COUNT: u32 = 0x1161;
    pub const MAX_KERNEL_SIZE: u32 = 0x1162;
    pub const MAX_SEPARABLE_KERNEL_SIZE: u32 = 0x1163;
    pub const MAX_COLOR_RAMP_STOPS: u32 = 0x1164;
    pub const MAX_IMAGE_WIDTH: u32 = 0x1165;
    pub const MAX_IMAGE_HEIGHT: u32 = 0x1166;
    pub const MAX_IMAGE_PIXELS: u32 = 0x1167;
    pub const MAX_IMAGE_BYTES: u32 = 0x1168;
    pub const MAX_FLOAT: u32 = 0x1169;
    pub const MAX_GAUSSIAN_STD_DEVIATION: u32 = 0x116A;
}

/// Path parameter keys (`VGPathParamType`)
pub mod path_param {
    pub const FORMAT: u32 = 0x1600;
    pub const DATATYPE: u32 = 0x1601;
    pub const SCALE: u32 = 0x1602;
    pub const BIAS: u32 = 0x1603;
    pub const NUM_SEGMENTS: u32 = 0x1604;
    pub const NUM_COORDS: u32 = 0x1605;
}

/// Paint parameter keys (`VGPaintParamType`)
pub mod paint_param {
    pub const TYPE: u32 = 0x1A00;
    pub const COLOR: u32 = 0x1A01;
    pub const COLOR_RAMP_SPREAD_MODE: u32 = 0x1A02;
    pub const COLOR_RAMP_STOPS: u32 = 0x1A03;
    pub const LINEAR_GRADIENT: u32 = 0x1A04;
    pub const RADIAL_GRADIENT: u32 = 0x1A05;
    pub const PATTERN_TILING_MODE: u32 = 0x1A06;
    pub const COLOR_RAMP_PREMULTIPLIED: u32 = 0x1A07;
}

/// Image parameter keys (`VGImageParamType`)
pub mod image_param {
    pub const FORMAT: u32 = 0x1E00;
    pub const WIDTH: u32 = 0x1E01;
    pub const HEIGHT: u32 = 0x1E02;
}

/// Path segment commands (`VGPathSegment` | `VGPathAbsRel`)
pub mod segment {
    pub const ABSOLUTE: u8 = 0;
    pub const RELATIVE: u8 = 1;

    pub const CLOSE_PATH: u8 = 0 << 1;
    pub const MOVE_TO: u8 = 1 << 1;
    pub const LINE_TO: u8 = 2 << 1;
    pub const HLINE_TO: u8 = 3 << 1;
    pub const VLINE_TO: u8 = 4 << 1;
    pub const QUAD_TO: u8 = 5 << 1;
    pub const CUBIC_TO: u8 = 6 << 1;
    pub const SQUAD_TO: u8 = 7 << 1;
    pub const SCUBIC_TO: u8 = 8 << 1;
    pub const SCCWARC_TO: u8 = 9 << 1;
    pub const SCWARC_TO: u8 = 10 << 1;
    pub const LCCWARC_TO: u8 = 11 << 1;
    pub const LCWARC_TO: u8 = 12 << 1;

    pub const MOVE_TO_ABS: u8 = MOVE_TO | ABSOLUTE;
    pub const MOVE_TO_REL: u8 = MOVE_TO | RELATIVE;
    pub const LINE_TO_ABS: u8 = LINE_TO | ABSOLUTE;
    pub const LINE_TO_REL: u8 = LINE_TO | RELATIVE;
    pub const HLINE_TO_ABS: u8 = HLINE_TO | ABSOLUTE;
    pub const HLINE_TO_REL: u8 = HLINE_TO | RELATIVE;
    pub const VLINE_TO_ABS: u8 = VLINE_TO | ABSOLUTE;
    pub const VLINE_TO_REL: u8 = VLINE_TO | RELATIVE;
    pub const QUAD_TO_ABS: u8 = QUAD_TO | ABSOLUTE;
    pub const QUAD_TO_REL: u8 = QUAD_TO | RELATIVE;
    pub const CUBIC_TO_ABS: u8 = CUBIC_TO | ABSOLUTE;
    pub const CUBIC_TO_REL: u8 = CUBIC_TO | RELATIVE;
    pub const SQUAD_TO_ABS: u8 = SQUAD_TO | ABSOLUTE;
    pub const SQUAD_TO_REL: u8 = SQUAD_TO | RELATIVE;
    pub const SCUBIC_TO_ABS: u8 = SCUBIC_TO | ABSOLUTE;
    pub const SCUBIC_TO_REL: u8 = SCUBIC_TO | RELATIVE;
    pub const SCCWARC_TO_ABS: u8 = SCCWARC_TO | ABSOLUTE;
    pub const SCCWARC_TO_REL: u8 = SCCWARC_TO | RELATIVE;
    pub const SCWARC_TO_ABS: u8 = SCWARC_TO | ABSOLUTE;
    pub const SCWARC_TO_REL: u8 = SCWARC_TO | RELATIVE;
    pub const LCCWARC_TO_ABS: u8 = LCCWARC_TO | ABSOLUTE;
    pub const LCCWARC_TO_REL: u8 = LCCWARC_TO | RELATIVE;
    pub const LCWARC_TO_ABS: u8 = LCWARC_TO | ABSOLUTE;
    pub const LCWARC_TO_REL: u8 = LCWARC_TO | RELATIVE;

    /// Number of coordinates a segment command consumes, or `None` for an
    /// unknown command.
    pub fn coord_count(command: u8) -> Option<usize> {
        match command & !RELATIVE {
            CLOSE_PATH => Some(0),
            MOVE_TO | LINE_TO | SQUAD_TO => Some(2),
            HLINE_TO | VLINE_TO => Some(1),
            QUAD_TO | SCUBIC_TO => Some(4),
            CUBIC_TO => Some(6),
            SCCWARC_TO | SCWARC_TO | LCCWARC_TO | LCWARC_TO => Some(5),
            _ => None,
        }
    }

    /// Whether the command uses relative coordinates
    pub fn is_relative(command: u8) -> bool {
        command & RELATIVE != 0
    }
}

macro_rules! bitfield {
    ($(#[$meta:meta])* $name:ident { $($(#[$cmeta:meta])* $flag:ident = $value:expr,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u32);

        impl $name {
            /// No bits set
            pub const NONE: Self = Self(0);
            $($(#[$cmeta])* pub const $flag: Self = Self($value);)*

            /// Create from raw bits
            pub const fn from_bits(bits: u32) -> Self {
                Self(bits)
            }

            /// Raw bits for the native interface
            pub const fn bits(self) -> u32 {
                self.0
            }

            /// Check whether every bit of `other` is set
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Check whether no bit is set
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }
    };
}

bitfield! {
    /// Paint modes for drawing a path (`VGPaintMode`)
    PaintMode {
        STROKE = 1 << 0,
        FILL = 1 << 1,
    }
}

bitfield! {
    /// Path capability bits (`VGPathCapabilities`)
    PathCapabilities {
        APPEND_FROM = 1 << 0,
        APPEND_TO = 1 << 1,
        MODIFY = 1 << 2,
        TRANSFORM_FROM = 1 << 3,
        TRANSFORM_TO = 1 << 4,
        INTERPOLATE_FROM = 1 << 5,
        INTERPOLATE_TO = 1 << 6,
        PATH_LENGTH = 1 << 7,
        POINT_ALONG_PATH = 1 << 8,
        TANGENT_ALONG_PATH = 1 << 9,
        PATH_BOUNDS = 1 << 10,
        PATH_TRANSFORMED_BOUNDS = 1 << 11,
        ALL = (1 << 12) - 1,
    }
}

bitfield! {
    /// Allowed image resampling qualities (`VGImageQuality`)
    ImageQuality {
        NONANTIALIASED = 1 << 0,
        FASTER = 1 << 1,
        BETTER = 1 << 2,
    }
}

/// Image channels, usable alone or as a filter channel mask (`VGImageChannel`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageChannel {
    Red = 1 << 3,
    Green = 1 << 2,
    Blue = 1 << 1,
    Alpha = 1 << 0,
}

/// Coordinate element type stored by a path (`VGPathDatatype`)
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathDatatype {
    S8 = 0,
    S16 = 1,
    S32 = 2,
    F32 = 3,
}

impl PathDatatype {
    /// Convert from the raw value returned by the engine
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(PathDatatype::S8),
            1 => Some(PathDatatype::S16),
            2 => Some(PathDatatype::S32),
            3 => Some(PathDatatype::F32),
            _ => None,
        }
    }

    /// Size in bytes of one coordinate
    pub fn element_size(self) -> usize {
        match self {
            PathDatatype::S8 => 1,
            PathDatatype::S16 => 2,
            PathDatatype::S32 | PathDatatype::F32 => 4,
        }
    }
}

/// Pixel formats (`VGImageFormat`)
#[allow(non_camel_case_types)]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    sRGBX_8888 = 0,
    sRGBA_8888 = 1,
    sRGBA_8888_PRE = 2,
    sRGB_565 = 3,
    sRGBA_5551 = 4,
    sRGBA_4444 = 5,
    sL_8 = 6,
    lRGBX_8888 = 7,
    lRGBA_8888 = 8,
    lRGBA_8888_PRE = 9,
    lL_8 = 10,
    A_8 = 11,
    BW_1 = 12,

    sXRGB_8888 = 64,
    sARGB_8888 = 65,
    sARGB_8888_PRE = 66,
    sARGB_1555 = 68,
    sARGB_4444 = 69,
    lXRGB_8888 = 71,
    lARGB_8888 = 72,
    lARGB_8888_PRE = 73,

    sBGRX_8888 = 128,
    sBGRA_8888 = 129,
    sBGRA_8888_PRE = 130,
    sBGR_565 = 131,
    sBGRA_5551 = 132,
    sBGRA_4444 = 133,
    lBGRX_8888 = 135,
    lBGRA_8888 = 136,
    lBGRA_8888_PRE = 137,

    sXBGR_8888 = 192,
    sABGR_8888 = 193,
    sABGR_8888_PRE = 194,
    sABGR_1555 = 196,
    sABGR_4444 = 197,
    lXBGR_8888 = 199,
    lABGR_8888 = 200,
    lABGR_8888_PRE = 201,
}

impl ImageFormat {
    /// All formats known to the binding
    pub const ALL: [ImageFormat; 38] = [
        ImageFormat::sRGBX_8888,
        ImageFormat::sRGBA_8888,
        ImageFormat::sRGBA_8888_PRE,
        ImageFormat::sRGB_565,
        ImageFormat::sRGBA_5551,
        ImageFormat::sRGBA_4444,
        ImageFormat::sL_8,
        ImageFormat::lRGBX_8888,
        ImageFormat::lRGBA_8888,
        ImageFormat::lRGBA_8888_PRE,
        ImageFormat::lL_8,
        ImageFormat::A_8,
        ImageFormat::BW_1,
        ImageFormat::sXRGB_8888,
        ImageFormat::sARGB_8888,
        ImageFormat::sARGB_8888_PRE,
        ImageFormat::sARGB_1555,
        ImageFormat::sARGB_4444,
        ImageFormat::lXRGB_8888,
        ImageFormat::lARGB_8888,
        ImageFormat::lARGB_8888_PRE,
        ImageFormat::sBGRX_8888,
        ImageFormat::sBGRA_8888,
        ImageFormat::sBGRA_8888_PRE,
        ImageFormat::sBGR_565,
        ImageFormat::sBGRA_5551,
        ImageFormat::sBGRA_4444,
        ImageFormat::lBGRX_8888,
        ImageFormat::lBGRA_8888,
        ImageFormat::lBGRA_8888_PRE,
        ImageFormat::sXBGR_8888,
        ImageFormat::sABGR_8888,
        ImageFormat::sABGR_8888_PRE,
        ImageFormat::sABGR_1555,
        ImageFormat::sABGR_4444,
        ImageFormat::lXBGR_8888,
        ImageFormat::lABGR_8888,
        ImageFormat::lABGR_8888_PRE,
    ];

    /// Convert from a raw format code
    pub fn from_u32(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| *f as u32 == code)
    }

    /// Raw format code for the native interface
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    /// Bytes per pixel used when sizing pixel buffers.
    ///
    /// 8-bit luminance and alpha formats take one byte, the 16-bit packed
    /// formats two, and everything else is sized at four.
    pub fn bytes_per_pixel(self) -> usize {
        // Channel-order bits (6 and 7) do not change the storage width
        match self.to_u32() & 0x3F {
            6 | 10 | 11 => 1,
            3 | 4 | 5 => 2,
            _ => 4,
        }
    }
}

/// Matrix selected by `VG_MATRIX_MODE` (`VGMatrixMode`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixMode {
    PathUserToSurface = 0x1400,
    ImageUserToSurface = 0x1401,
    FillPaintToUser = 0x1402,
    StrokePaintToUser = 0x1403,
}

impl MatrixMode {
    /// Convert from the raw parameter value
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x1400 => Some(MatrixMode::PathUserToSurface),
            0x1401 => Some(MatrixMode::ImageUserToSurface),
            0x1402 => Some(MatrixMode::FillPaintToUser),
            0x1403 => Some(MatrixMode::StrokePaintToUser),
            _ => None,
        }
    }
}

/// Mask operations (`VGMaskOperation`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskOperation {
    Clear = 0x1500,
    Fill = 0x1501,
    Set = 0x1502,
    Union = 0x1503,
    Intersect = 0x1504,
    Subtract = 0x1505,
}

/// Fill rules (`VGFillRule`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillRule {
    EvenOdd = 0x1900,
    NonZero = 0x1901,
}

/// Rendering quality (`VGRenderingQuality`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderingQuality {
    Nonantialiased = 0x1200,
    Faster = 0x1201,
    Better = 0x1202,
}

/// Subpixel layouts (`VGPixelLayout`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Unknown = 0x1300,
    RgbVertical = 0x1301,
    BgrVertical = 0x1302,
    RgbHorizontal = 0x1303,
    BgrHorizontal = 0x1304,
}

/// Stroke end caps (`VGCapStyle`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapStyle {
    Butt = 0x1700,
    Round = 0x1701,
    Square = 0x1702,
}

/// Stroke joins (`VGJoinStyle`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinStyle {
    Miter = 0x1800,
    Round = 0x1801,
    Bevel = 0x1802,
}

/// Paint kinds (`VGPaintType`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaintType {
    Color = 0x1B00,
    LinearGradient = 0x1B01,
    RadialGradient = 0x1B02,
    Pattern = 0x1B03,
}

/// Gradient spread modes (`VGColorRampSpreadMode`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRampSpreadMode {
    Pad = 0x1C00,
    Repeat = 0x1C01,
    Reflect = 0x1C02,
}

/// Edge handling for filters and patterns (`VGTilingMode`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TilingMode {
    Fill = 0x1D00,
    Pad = 0x1D01,
    Repeat = 0x1D02,
    Reflect = 0x1D03,
}

/// How images are combined with paint when drawn (`VGImageMode`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageMode {
    Normal = 0x1F00,
    Multiply = 0x1F01,
    Stencil = 0x1F02,
}

/// Blend modes (`VGBlendMode`), including the ShivaVG extensions
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Src = 0x2000,
    SrcOver = 0x2001,
    DstOver = 0x2002,
    SrcIn = 0x2003,
    DstIn = 0x2004,
    Multiply = 0x2005,
    Screen = 0x2006,
    Darken = 0x2007,
    Lighten = 0x2008,
    Additive = 0x2009,
    SrcOutSh = 0x200A,
    DstOutSh = 0x200B,
    SrcAtopSh = 0x200C,
    DstAtopSh = 0x200D,
}

/// Hardware query subjects (`VGHardwareQueryType`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareQueryType {
    ImageFormat = 0x2100,
    PathDatatype = 0x2101,
}

/// Hardware query answers (`VGHardwareQueryResult`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareQueryResult {
    Accelerated = 0x2200,
    Unaccelerated = 0x2201,
}

impl HardwareQueryResult {
    /// Convert from the raw value returned by the engine
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x2200 => Some(HardwareQueryResult::Accelerated),
            0x2201 => Some(HardwareQueryResult::Unaccelerated),
            _ => None,
        }
    }
}

/// Implementation strings (`VGStringID`)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringId {
    Vendor = 0x2300,
    Renderer = 0x2301,
    Version = 0x2302,
    Extensions = 0x2303,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_coord_counts() {
        assert_eq!(segment::coord_count(segment::CLOSE_PATH), Some(0));
        assert_eq!(segment::coord_count(segment::MOVE_TO_ABS), Some(2));
        assert_eq!(segment::coord_count(segment::LINE_TO_REL), Some(2));
        assert_eq!(segment::coord_count(segment::HLINE_TO_ABS), Some(1));
        assert_eq!(segment::coord_count(segment::CUBIC_TO_REL), Some(6));
        assert_eq!(segment::coord_count(segment::LCWARC_TO_ABS), Some(5));
        assert_eq!(segment::coord_count(26), None);
        assert!(segment::is_relative(segment::QUAD_TO_REL));
        assert!(!segment::is_relative(segment::QUAD_TO_ABS));
    }

    #[test]
    fn test_bitfield_ops() {
        let modes = PaintMode::FILL | PaintMode::STROKE;
        assert_eq!(modes.bits(), 3);
        assert!(modes.contains(PaintMode::FILL));
        assert!(!PaintMode::STROKE.contains(PaintMode::FILL));
        assert_eq!(PathCapabilities::ALL.bits(), 0x0FFF);
        assert!(PathCapabilities::ALL.contains(PathCapabilities::PATH_BOUNDS));
        assert!(PathCapabilities::NONE.is_empty());
    }

    #[test]
    fn test_format_roundtrip_codes() {
        for format in ImageFormat::ALL {
            assert_eq!(ImageFormat::from_u32(format.to_u32()), Some(format));
        }
        assert_eq!(ImageFormat::from_u32(13), None);
    }

    #[test]
    fn test_datatype_from_i32() {
        assert_eq!(PathDatatype::from_i32(3), Some(PathDatatype::F32));
        assert_eq!(PathDatatype::from_i32(4), None);
        assert_eq!(PathDatatype::S16.element_size(), 2);
    }
}
