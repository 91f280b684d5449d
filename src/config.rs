use anyhow::{Context, Result};

/// Drawing surface dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: i32,
    pub height: i32,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Options applied when a context is created
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextOptions {
    pub size: SurfaceSize,
    /// Written to `VG_CLEAR_COLOR` right after creation
    pub clear_color: Option<[f32; 4]>,
}

impl ContextOptions {
    /// Build options from optional textual settings
    pub fn parse(size: Option<&str>, clear_color: Option<&str>) -> Result<Self> {
        let mut opts = Self::default();
        if let Some(s) = size {
            opts.size = parse_surface_size(s)?;
        }
        if let Some(s) = clear_color {
            opts.clear_color = Some(parse_clear_color(s)?);
        }
        Ok(opts)
    }
}

/// Parse a surface size string in the format "WIDTHxHEIGHT"
pub fn parse_surface_size(s: &str) -> Result<SurfaceSize> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        anyhow::bail!("Surface size must be in WIDTHxHEIGHT format");
    }

    let width: i32 = parts[0].trim().parse().context("Invalid width value")?;
    let height: i32 = parts[1].trim().parse().context("Invalid height value")?;

    if width <= 0 || height <= 0 {
        anyhow::bail!("Surface size values must be positive");
    }

    Ok(SurfaceSize { width, height })
}

/// Parse a clear color in the format "r,g,b,a" with components in 0.0-1.0
pub fn parse_clear_color(s: &str) -> Result<[f32; 4]> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        anyhow::bail!("Clear color must have four comma-separated components");
    }

    let mut color = [0f32; 4];
    for (slot, part) in color.iter_mut().zip(&parts) {
        let value: f32 = part
            .trim()
            .parse()
            .with_context(|| format!("Invalid color component '{}'", part.trim()))?;
        if !(0.0..=1.0).contains(&value) {
            anyhow::bail!("Color component {} out of range (0.0 to 1.0)", value);
        }
        *slot = value;
    }

    Ok(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_surface_size_valid() {
        let size = parse_surface_size("256x128").unwrap();
        assert_eq!(size.width, 256);
        assert_eq!(size.height, 128);
    }

    #[test]
    fn test_parse_surface_size_invalid_format() {
        assert!(parse_surface_size("640-480").is_err());
        assert!(parse_surface_size("640x480x32").is_err());
    }

    #[test]
    fn test_parse_surface_size_invalid_values() {
        assert!(parse_surface_size("0x480").is_err());
        assert!(parse_surface_size("640x-1").is_err());
        assert!(parse_surface_size("abcxdef").is_err());
    }

    #[test]
    fn test_parse_clear_color() {
        assert_eq!(
            parse_clear_color("1.0, 0.5, 0, 1").unwrap(),
            [1.0, 0.5, 0.0, 1.0]
        );
        assert!(parse_clear_color("1,0,0").is_err()); // Too few
        assert!(parse_clear_color("1,0,0,2").is_err()); // Out of range
        assert!(parse_clear_color("1,x,0,1").is_err()); // Invalid
    }

    #[test]
    fn test_options_default() {
        let opts = ContextOptions::default();
        assert_eq!(
            opts.size,
            SurfaceSize {
                width: 640,
                height: 480
            }
        );
        assert!(opts.clear_color.is_none());
    }

    #[test]
    fn test_options_parse() {
        let opts = ContextOptions::parse(Some("32x16"), Some("0,0,0,1")).unwrap();
        assert_eq!(opts.size.width, 32);
        assert_eq!(opts.clear_color, Some([0.0, 0.0, 0.0, 1.0]));

        let err = ContextOptions::parse(Some("32"), None).unwrap_err();
        assert!(err.to_string().contains("WIDTHxHEIGHT"));
    }
}
