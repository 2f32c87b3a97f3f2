use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{GlimmerError, GlimmerResult};

/// Common locations checked when no font file is configured.
const SYSTEM_FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Width/height of a laid out single line, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    /// Advance width of the line.
    pub advance: f32,
    /// Line box height.
    pub line_height: f32,
}

/// Anything able to measure a single line of text.
///
/// [`FontBook`] is the real implementation; sizing code depends on this trait only.
pub trait TextMeasurer {
    /// Measure `text` at the given font configuration.
    fn measure(
        &mut self,
        text: &str,
        font_size: f32,
        font_weight: f32,
        font_family: &str,
    ) -> GlimmerResult<TextMetrics>;
}

/// A registered family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFont {
    /// Family name as reported by the font.
    pub family: String,
}

/// Laid out single line ready for rasterization.
#[derive(Clone)]
pub struct PreparedText {
    pub(crate) text: String,
    pub(crate) layout: Arc<parley::Layout<Rgba8>>,
    pub(crate) metrics: TextMetrics,
}

impl PreparedText {
    /// Source string.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Measured size of the line.
    pub fn metrics(&self) -> TextMetrics {
        self.metrics
    }

    /// Top-left corner that centers the line box in a `width × height` logical area.
    pub fn centered_origin(&self, width: f32, height: f32) -> (f64, f64) {
        (
            f64::from((width - self.metrics.advance) * 0.5),
            f64::from((height - self.metrics.line_height) * 0.5),
        )
    }

    /// Fill the glyphs with their layout brush under the context's current transform.
    ///
    /// Each run is drawn with the face Parley selected for it, so weight picks the matching file.
    pub(crate) fn fill(&self, ctx: &mut vello_cpu::RenderContext) {
        for line in self.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(run.run().font())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
}

impl std::fmt::Debug for PreparedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedText")
            .field("text", &self.text)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

/// Registered fonts plus the Parley contexts used to shape text with them.
pub struct FontBook {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    families: Vec<ResolvedFont>,
    files: Vec<PathBuf>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.family_names())
            .finish_non_exhaustive()
    }
}

impl FontBook {
    /// Empty book with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Names of all registered families, in registration order.
    pub fn family_names(&self) -> Vec<&str> {
        self.families.iter().map(|f| f.family.as_str()).collect()
    }

    /// `true` when no family has been registered.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Register raw font bytes, returning the family names they provide.
    pub fn register_bytes(&mut self, bytes: Vec<u8>) -> GlimmerResult<Vec<String>> {
        let registered = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::new(Arc::new(bytes)), None);
        if registered.is_empty() {
            return Err(GlimmerError::font("no font families registered from font bytes"));
        }

        let mut names = Vec::with_capacity(registered.len());
        for (family_id, _) in registered {
            let name = self
                .font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| GlimmerError::font("registered font family has no name"))?
                .to_string();
            if !self.families.iter().any(|f| f.family == name) {
                self.families.push(ResolvedFont {
                    family: name.clone(),
                });
            }
            names.push(name);
        }
        Ok(names)
    }

    /// Read and register a font file.
    pub fn register_file(&mut self, path: impl AsRef<Path>) -> GlimmerResult<Vec<String>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let names = self.register_bytes(bytes)?;
        tracing::debug!(path = %path.display(), families = ?names, "registered font file");
        self.files.push(path.to_path_buf());
        Ok(names)
    }

    /// `true` when `path` was already registered through [`FontBook::register_file`].
    pub fn has_file(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.files.iter().any(|f| f == path)
    }

    /// Register the first readable font among well-known system locations.
    ///
    /// Returns `false` when none could be loaded.
    pub fn register_system_fallback(&mut self) -> bool {
        for candidate in SYSTEM_FALLBACK_FONTS {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            match self.register_file(path) {
                Ok(_) => return true,
                Err(err) => tracing::debug!(path = candidate, %err, "skipping fallback font"),
            }
        }
        false
    }

    /// Resolve a CSS-style family list against registered families.
    ///
    /// Names match case-insensitively with surrounding quotes ignored. Unknown lists fall back to
    /// the first registered family.
    pub fn resolve(&self, family_list: &str) -> Option<ResolvedFont> {
        for wanted in family_list.split(',') {
            let wanted = wanted.trim().trim_matches(|c| c == '"' || c == '\'');
            if wanted.is_empty() {
                continue;
            }
            if let Some(found) = self
                .families
                .iter()
                .find(|f| f.family.eq_ignore_ascii_case(wanted))
            {
                return Some(found.clone());
            }
        }
        self.families.first().cloned()
    }

    /// Shape `text` as a single unwrapped line.
    pub fn layout_line(
        &mut self,
        text: &str,
        font: &ResolvedFont,
        size_px: f32,
        weight: f32,
        brush: Rgba8,
    ) -> GlimmerResult<PreparedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(GlimmerError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(weight),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);

        let metrics = TextMetrics {
            advance: layout.width(),
            line_height: layout.height(),
        };

        Ok(PreparedText {
            text: text.to_string(),
            layout: Arc::new(layout),
            metrics,
        })
    }

    /// Resolve `font_family` and shape `text`.
    pub fn prepare(
        &mut self,
        text: &str,
        font_size: f32,
        font_weight: f32,
        font_family: &str,
        color: Rgba8,
    ) -> GlimmerResult<PreparedText> {
        let font = self
            .resolve(font_family)
            .ok_or_else(|| GlimmerError::font("no fonts registered"))?;
        self.layout_line(text, &font, font_size, font_weight, color)
    }
}

impl TextMeasurer for FontBook {
    fn measure(
        &mut self,
        text: &str,
        font_size: f32,
        font_weight: f32,
        font_family: &str,
    ) -> GlimmerResult<TextMetrics> {
        Ok(self
            .prepare(text, font_size, font_weight, font_family, Rgba8::WHITE)?
            .metrics)
    }
}
