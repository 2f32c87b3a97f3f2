//! Wrapper box sizing for the reveal component.

use crate::config::RevealConfig;
use crate::foundation::core::{SurfaceSize, sanitize_dpr};
use crate::text::fonts::TextMeasurer;

/// Viewport widths below this use the mobile padding and minimums.
pub const MOBILE_BREAKPOINT: f32 = 768.0;
/// Share of the container/viewport the box may occupy.
pub const SAFE_FRACTION: f32 = 0.95;
/// Box used when the text cannot be measured.
pub const DEFAULT_BOX: SurfaceSize = SurfaceSize {
    width: 600.0,
    height: 200.0,
};

const LINE_HEIGHT_FACTOR: f32 = 1.4;

/// Host viewport in logical pixels plus its device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Viewport width.
    pub width: f32,
    /// Viewport height.
    pub height: f32,
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f32,
}

impl Viewport {
    /// Viewport at the given size and pixel ratio.
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: sanitize_dpr(device_pixel_ratio),
        }
    }

    /// `true` below [`MOBILE_BREAKPOINT`].
    pub fn is_mobile(&self) -> bool {
        self.width < MOBILE_BREAKPOINT
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0, 1.0)
    }
}

/// Padding and minimums for one device class.
#[derive(Clone, Copy, Debug, PartialEq)]
struct DeviceClass {
    padding: f32,
    min_width: f32,
    min_height: f32,
}

const DESKTOP: DeviceClass = DeviceClass {
    padding: 1.0,
    min_width: 320.0,
    min_height: 120.0,
};

const MOBILE: DeviceClass = DeviceClass {
    padding: 0.5,
    min_width: 200.0,
    min_height: 80.0,
};

/// Computes the wrapper box for a configuration.
///
/// Stateless: every call derives a fresh size from its inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct SizeController;

impl SizeController {
    /// Box for `config` in `viewport`, optionally inside a `container` box.
    ///
    /// Measured size is `advance + font_size × padding` by `font_size × 1.4`, raised to the
    /// device-class minimums, replaced by caller overrides, then capped to
    /// [`SAFE_FRACTION`] of the container and viewport.
    pub fn compute(
        &self,
        config: &RevealConfig,
        viewport: Viewport,
        container: Option<SurfaceSize>,
        measurer: &mut dyn TextMeasurer,
    ) -> SurfaceSize {
        let class = if viewport.is_mobile() { MOBILE } else { DESKTOP };
        let o = &config.overrides;

        let measured = match measurer.measure(
            &config.text,
            config.font_size,
            config.font_weight,
            &config.font_family,
        ) {
            Ok(m) => SurfaceSize::new(
                (m.advance + config.font_size * class.padding).ceil(),
                (config.font_size * LINE_HEIGHT_FACTOR).ceil(),
            ),
            Err(err) => {
                tracing::warn!(%err, "text measurement failed, using default box");
                DEFAULT_BOX
            }
        };

        let min_w = o.min_width.unwrap_or(class.min_width);
        let min_h = o.min_height.unwrap_or(class.min_height);
        let width = o.width.unwrap_or(measured.width.max(min_w));
        let height = o.height.unwrap_or(measured.height.max(min_h));

        let mut max_w = viewport.width;
        let mut max_h = viewport.height;
        if let Some(c) = container {
            max_w = max_w.min(c.width);
            max_h = max_h.min(c.height);
        }
        let size = SurfaceSize::new(
            clamp_to(width, max_w * SAFE_FRACTION),
            clamp_to(height, max_h * SAFE_FRACTION),
        );
        tracing::debug!(?size, mobile = viewport.is_mobile(), "computed wrapper size");
        size
    }
}

fn clamp_to(v: f32, max: f32) -> f32 {
    let v = if v.is_finite() { v.max(0.0) } else { 0.0 };
    if max.is_finite() { v.min(max.max(0.0)) } else { v }
}
