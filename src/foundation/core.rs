use crate::foundation::error::{GlimmerError, GlimmerResult};

pub use kurbo::{Point, Vec2};

/// Straight (non-premultiplied) RGBA8 color.
///
/// Serialized as a CSS-like string: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` or
/// `rgba(r, g, b, a)` with `a` in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with the alpha channel replaced by `opacity` in `[0, 1]`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: unit_to_u8(opacity),
            ..self
        }
    }

    /// Alpha as a `[0, 1]` float.
    pub fn alpha_f32(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// Premultiplied `[r, g, b, a]` bytes.
    pub fn premultiplied(self) -> [u8; 4] {
        let a16 = u16::from(self.a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }

    /// Recover a straight color from premultiplied bytes.
    ///
    /// Channels of fully transparent pixels collapse to zero.
    pub fn from_premultiplied(px: [u8; 4]) -> Self {
        let [r, g, b, a] = px;
        if a == 0 {
            return Self::TRANSPARENT;
        }
        let a16 = u16::from(a);
        let unpremul = |c: u8| -> u8 { ((u16::from(c) * 255 + a16 / 2) / a16).min(255) as u8 };
        Self::new(unpremul(r), unpremul(g), unpremul(b), a)
    }

    /// Parse a CSS-like color string.
    pub fn parse(input: &str) -> GlimmerResult<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| invalid_color(input));
        }

        let lower = s.to_ascii_lowercase();
        let (body, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(invalid_color(input));
        };
        let body = body.strip_suffix(')').ok_or_else(|| invalid_color(input))?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid_color(input));
        }

        let channel = |p: &str| -> GlimmerResult<u8> {
            let v: f32 = p.parse().map_err(|_| invalid_color(input))?;
            if !v.is_finite() {
                return Err(invalid_color(input));
            }
            Ok(v.round().clamp(0.0, 255.0) as u8)
        };
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = if has_alpha {
            let v: f32 = parts[3].parse().map_err(|_| invalid_color(input))?;
            unit_to_u8(v)
        } else {
            255
        };
        Ok(Self::new(r, g, b, a))
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = GlimmerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rgba8> for String {
    fn from(c: Rgba8) -> Self {
        if c.a == 255 {
            format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
        }
    }
}

fn invalid_color(input: &str) -> GlimmerError {
    GlimmerError::validation(format!("invalid color '{input}'"))
}

fn parse_hex(hex: &str) -> Option<Rgba8> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba8::new(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        6 => Some(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// Map a `[0, 1]` float onto `0..=255`, clamping out-of-range and NaN input.
pub fn unit_to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Box size in logical (CSS-like) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
}

impl SurfaceSize {
    /// Construct a size.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// `true` when either side is zero, negative or not finite.
    pub fn is_degenerate(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// Backing raster size in physical pixels.
///
/// Limited to `u16` per side by the raster backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelSize {
    /// Width in physical pixels.
    pub width: u16,
    /// Height in physical pixels.
    pub height: u16,
}

impl PixelSize {
    /// Physical size for `size` at device pixel ratio `dpr`, rounded up and saturated.
    pub fn from_logical(size: SurfaceSize, dpr: f32) -> Self {
        let dpr = sanitize_dpr(dpr);
        let to_px = |v: f32| -> u16 {
            if !v.is_finite() || v <= 0.0 {
                return 0;
            }
            (v * dpr).ceil().min(f32::from(u16::MAX)) as u16
        };
        Self {
            width: to_px(size.width),
            height: to_px(size.height),
        }
    }

    /// `true` when there is no pixel to draw into.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Upper bound on samples taken at `stride`.
    pub fn max_samples(self, stride: u32) -> usize {
        let stride = stride.max(1) as usize;
        (usize::from(self.width).div_ceil(stride)) * (usize::from(self.height).div_ceil(stride))
    }
}

/// Device pixel ratios that are not finite and positive are treated as `1.0`.
pub fn sanitize_dpr(dpr: f32) -> f32 {
    if dpr.is_finite() && dpr > 0.0 {
        dpr
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_css_rgba_used_by_callers() {
        let c = Rgba8::parse("rgba(211, 253, 80, 1)").unwrap();
        assert_eq!(c, Rgba8::new(211, 253, 80, 255));
        let half = Rgba8::parse("rgba(255,255,255,0.5)").unwrap();
        assert_eq!(half.a, 128);
        assert_eq!(Rgba8::parse("rgb(1, 2, 3)").unwrap(), Rgba8::new(1, 2, 3, 255));
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgba8::parse("#fff").unwrap(), Rgba8::WHITE);
        assert_eq!(Rgba8::parse("#102030").unwrap(), Rgba8::new(16, 32, 48, 255));
        assert_eq!(Rgba8::parse("#10203040").unwrap(), Rgba8::new(16, 32, 48, 64));
        assert!(Rgba8::parse("#12").is_err());
        assert!(Rgba8::parse("#zzzzzz").is_err());
        assert!(Rgba8::parse("hsl(0, 0%, 0%)").is_err());
        assert!(Rgba8::parse("rgba(1,2,3)").is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let c = Rgba8::new(16, 32, 48, 64);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"#10203040\"");
        let back: Rgba8 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn premultiply_then_recover_is_close() {
        let c = Rgba8::new(200, 100, 50, 128);
        let back = Rgba8::from_premultiplied(c.premultiplied());
        assert_eq!(back.a, 128);
        assert!(back.r.abs_diff(200) <= 2);
        assert!(back.g.abs_diff(100) <= 2);
        assert!(back.b.abs_diff(50) <= 2);
        assert_eq!(Rgba8::from_premultiplied([9, 9, 9, 0]), Rgba8::TRANSPARENT);
    }

    #[test]
    fn opacity_substitution_clamps() {
        let c = Rgba8::new(1, 2, 3, 4);
        assert_eq!(c.with_opacity(2.0).a, 255);
        assert_eq!(c.with_opacity(-1.0).a, 0);
        assert_eq!(c.with_opacity(f32::NAN).a, 0);
    }

    #[test]
    fn pixel_size_scales_with_dpr() {
        let px = PixelSize::from_logical(SurfaceSize::new(200.0, 100.5), 2.0);
        assert_eq!(px, PixelSize { width: 400, height: 201 });
        let zero = PixelSize::from_logical(SurfaceSize::new(0.0, 10.0), 1.0);
        assert!(zero.is_empty());
        let bad_dpr = PixelSize::from_logical(SurfaceSize::new(10.0, 10.0), f32::NAN);
        assert_eq!(bad_dpr, PixelSize { width: 10, height: 10 });
    }

    #[test]
    fn max_samples_bounds_grid() {
        let px = PixelSize { width: 10, height: 5 };
        assert_eq!(px.max_samples(1), 50);
        assert_eq!(px.max_samples(5), 2);
        assert_eq!(px.max_samples(0), 50);
    }
}
