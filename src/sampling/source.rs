use crate::config::RevealConfig;
use crate::foundation::core::PixelSize;
use crate::foundation::error::GlimmerResult;
use crate::sampling::glyph::{GlyphSampler, InkSample};
use crate::text::fonts::{FontBook, PreparedText, TextMeasurer};

/// Result of one sampling pass over a surface.
#[derive(Clone, Debug, Default)]
pub struct SampledText {
    /// Ink samples in physical pixels.
    pub samples: Vec<InkSample>,
    /// Shaped text for the literal overlay, when the source can draw glyphs.
    pub overlay: Option<PreparedText>,
}

/// Produces ink samples for a configuration at a surface size.
pub trait GlyphSource: TextMeasurer {
    /// Rasterize `config.text` centered in `size` and sample it at the configured stride.
    fn sample_text(
        &mut self,
        config: &RevealConfig,
        size: PixelSize,
        dpr: f32,
    ) -> GlimmerResult<SampledText>;

    /// Pick up font settings from a new configuration before it is measured or sampled.
    fn configure(&mut self, _config: &RevealConfig) {}
}

impl GlyphSource for FontBook {
    fn sample_text(
        &mut self,
        config: &RevealConfig,
        size: PixelSize,
        dpr: f32,
    ) -> GlimmerResult<SampledText> {
        if config.text.is_empty() || size.is_empty() {
            return Ok(SampledText::default());
        }
        let prepared = self.prepare(
            &config.text,
            config.font_size,
            config.font_weight,
            &config.font_family,
            config.color,
        )?;
        let sampler = GlyphSampler::new(
            config.sampling_stride(dpr),
            config.motion.ink_alpha_threshold,
        );
        let samples = sampler.sample(&prepared, size, dpr);
        Ok(SampledText {
            samples,
            overlay: Some(prepared),
        })
    }

    /// Registers `font_files` not seen before. Unreadable files are logged and skipped.
    fn configure(&mut self, config: &RevealConfig) {
        for path in &config.font_files {
            if self.has_file(path) {
                continue;
            }
            if let Err(err) = self.register_file(path) {
                tracing::warn!(path = %path.display(), %err, "failed to register font file");
            }
        }
    }
}

impl FontBook {
    /// Book holding the configured font files, or a system fallback when none load.
    ///
    /// Unreadable files are logged and skipped.
    pub fn from_config(config: &RevealConfig) -> Self {
        let mut book = Self::new();
        book.configure(config);
        if book.is_empty() && !book.register_system_fallback() {
            tracing::warn!("no usable font found; text will render as nothing");
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_or_surface_samples_nothing_without_fonts() {
        let mut book = FontBook::new();
        let cfg = RevealConfig {
            text: String::new(),
            ..RevealConfig::default()
        };
        let out = book
            .sample_text(&cfg, PixelSize { width: 10, height: 10 }, 1.0)
            .unwrap();
        assert!(out.samples.is_empty());
        assert!(out.overlay.is_none());

        let out = book
            .sample_text(&RevealConfig::default(), PixelSize { width: 0, height: 10 }, 1.0)
            .unwrap();
        assert!(out.samples.is_empty());
    }

    #[test]
    fn configure_skips_missing_files_and_registers_new_ones() {
        let mut book = FontBook::new();
        let mut cfg = RevealConfig {
            font_files: vec!["definitely/not/here.ttf".into()],
            ..RevealConfig::default()
        };
        book.configure(&cfg);
        assert!(book.is_empty());
        assert!(!book.has_file("definitely/not/here.ttf"));

        let candidates = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
        ];
        let Some(path) = candidates
            .into_iter()
            .find(|p| std::path::Path::new(p).is_file())
        else {
            return;
        };
        cfg.font_files.push(path.into());
        book.configure(&cfg);
        assert!(book.has_file(path));
        let families = book.family_names().len();
        book.configure(&cfg);
        assert_eq!(book.family_names().len(), families);
    }

    #[test]
    fn missing_fonts_fail_sampling() {
        let mut book = FontBook::new();
        let res = book.sample_text(&RevealConfig::default(), PixelSize { width: 10, height: 10 }, 1.0);
        assert!(res.is_err());
    }
}
