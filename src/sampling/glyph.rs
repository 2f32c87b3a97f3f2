use crate::foundation::core::{PixelSize, Point, Rgba8, sanitize_dpr};
use crate::text::fonts::PreparedText;

/// A raster position where the text left a non-background pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InkSample {
    /// Column in physical pixels.
    pub x: u16,
    /// Row in physical pixels.
    pub y: u16,
    /// Straight color of the sampled pixel.
    pub color: Rgba8,
}

impl InkSample {
    /// Sample position as a point in physical pixel space.
    pub fn point(&self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// Axis-aligned bounds of a sample set, inclusive, in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InkBounds {
    /// Smallest column.
    pub min_x: u16,
    /// Smallest row.
    pub min_y: u16,
    /// Largest column.
    pub max_x: u16,
    /// Largest row.
    pub max_y: u16,
}

impl InkBounds {
    /// Bounds of `samples`, `None` when empty.
    pub fn of(samples: &[InkSample]) -> Option<Self> {
        let first = samples.first()?;
        let mut b = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for s in &samples[1..] {
            b.min_x = b.min_x.min(s.x);
            b.min_y = b.min_y.min(s.y);
            b.max_x = b.max_x.max(s.x);
            b.max_y = b.max_y.max(s.y);
        }
        Some(b)
    }

    /// Horizontal extent.
    pub fn width(&self) -> u16 {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    pub fn height(&self) -> u16 {
        self.max_y - self.min_y
    }
}

/// Turns prepared text into ink samples at a fixed stride.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphSampler {
    /// Distance between visited pixels, in physical pixels.
    pub stride: u32,
    /// Pixels with alpha strictly above this are ink.
    pub alpha_threshold: u8,
}

impl GlyphSampler {
    /// Sampler with a stride (clamped to at least 1) and alpha threshold.
    pub fn new(stride: u32, alpha_threshold: u8) -> Self {
        Self {
            stride: stride.max(1),
            alpha_threshold,
        }
    }

    /// Rasterize `text` centered on a scratch surface and collect its ink samples.
    ///
    /// Empty text or an empty surface yields no samples.
    #[tracing::instrument(skip(self, text), fields(text = text.text(), stride = self.stride))]
    pub fn sample(&self, text: &PreparedText, size: PixelSize, dpr: f32) -> Vec<InkSample> {
        if text.text().is_empty() {
            return Vec::new();
        }
        let Some(scratch) = rasterize_text(text, size, dpr) else {
            return Vec::new();
        };
        let samples = sample_ink(&scratch, self.stride, self.alpha_threshold);
        tracing::debug!(
            samples = samples.len(),
            bound = size.max_samples(self.stride),
            "sampled ink"
        );
        samples
    }
}

/// Draw `text` centered onto a fresh transparent pixmap of `size`.
///
/// Returns `None` for an empty surface. Glyph parts outside the surface are simply not drawn.
pub fn rasterize_text(text: &PreparedText, size: PixelSize, dpr: f32) -> Option<vello_cpu::Pixmap> {
    if size.is_empty() {
        return None;
    }
    let dpr = sanitize_dpr(dpr);
    let logical_w = f32::from(size.width) / dpr;
    let logical_h = f32::from(size.height) / dpr;
    let (ox, oy) = text.centered_origin(logical_w, logical_h);

    let mut ctx = vello_cpu::RenderContext::new(size.width, size.height);
    ctx.set_transform(
        vello_cpu::kurbo::Affine::scale(f64::from(dpr))
            * vello_cpu::kurbo::Affine::translate((ox, oy)),
    );
    text.fill(&mut ctx);
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(size.width, size.height);
    ctx.render_to_pixmap(&mut pixmap);
    Some(pixmap)
}

/// Walk `pixmap` every `stride` pixels in both axes and keep pixels above `alpha_threshold`.
///
/// Output is row-major, so identical input always yields the identical sample list.
pub fn sample_ink(pixmap: &vello_cpu::Pixmap, stride: u32, alpha_threshold: u8) -> Vec<InkSample> {
    let width = usize::from(pixmap.width());
    let height = usize::from(pixmap.height());
    let stride = stride.max(1) as usize;
    let data = pixmap.data_as_u8_slice();

    let mut out = Vec::new();
    for y in (0..height).step_by(stride) {
        let row = y * width * 4;
        for x in (0..width).step_by(stride) {
            let i = row + x * 4;
            let Some(px) = data.get(i..i + 4) else {
                continue;
            };
            if px[3] <= alpha_threshold {
                continue;
            }
            out.push(InkSample {
                x: x as u16,
                y: y as u16,
                color: Rgba8::from_premultiplied([px[0], px[1], px[2], px[3]]),
            });
        }
    }
    out
}
