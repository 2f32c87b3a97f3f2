use crate::config::RevealConfig;
use crate::foundation::core::{PixelSize, SurfaceSize};
use crate::foundation::error::GlimmerResult;
use crate::foundation::rng::Rng64;
use crate::layout::size::{SizeController, Viewport};
use crate::particles::field::ParticleField;
use crate::particles::motion::{FieldState, HoverPolicy, MotionParams};
use crate::render::cpu::{DrawStats, OverlayFade, ParticleRenderer};
use crate::render::surface::Surface;
use crate::sampling::source::GlyphSource;
use crate::session::driver::{AnimationDriver, FrameTarget};
use crate::session::host::{ListenerId, ViewportHost};
use crate::text::fonts::{FontBook, PreparedText};

/// The particle text reveal component.
///
/// Owns its configuration, glyph source, visible surface and particle field. The host feeds it
/// pointer and resize events and calls [`TextReveal::frame`] once per display frame.
pub struct TextReveal<S: GlyphSource = FontBook> {
    config: RevealConfig,
    source: S,
    viewport: Viewport,
    container: Option<SurfaceSize>,
    size: SurfaceSize,
    surface: Option<Surface>,
    overlay_text: Option<PreparedText>,
    field: ParticleField,
    params: MotionParams,
    hover: HoverPolicy,
    overlay: OverlayFade,
    renderer: ParticleRenderer,
    driver: AnimationDriver,
    rng: Rng64,
    dirty: bool,
    listener: Option<ListenerId>,
    torn_down: bool,
    last_stats: DrawStats,
}

impl TextReveal<FontBook> {
    /// Component using fonts from `config.font_files` (or a system fallback).
    pub fn with_fonts(config: RevealConfig, viewport: Viewport) -> GlimmerResult<Self> {
        let fonts = FontBook::from_config(&config);
        Self::new(config, fonts, viewport)
    }
}

impl<S: GlyphSource> TextReveal<S> {
    /// Validate `config` and size the component for `viewport`.
    ///
    /// No surface is attached yet; call [`TextReveal::attach_surface`] before frames can draw.
    pub fn new(config: RevealConfig, source: S, viewport: Viewport) -> GlimmerResult<Self> {
        config.validate()?;
        let mut this = Self {
            params: MotionParams::new(&config, viewport.device_pixel_ratio),
            hover: HoverPolicy::new(config.reset_on_pointer_exit),
            renderer: ParticleRenderer::new(config.particle_size),
            driver: AnimationDriver::new(f64::from(config.motion.max_step_secs)),
            config,
            source,
            viewport,
            container: None,
            size: SurfaceSize::new(0.0, 0.0),
            surface: None,
            overlay_text: None,
            field: ParticleField::empty(),
            overlay: OverlayFade::default(),
            rng: Rng64::from_entropy(),
            dirty: true,
            listener: None,
            torn_down: false,
            last_stats: DrawStats::default(),
        };
        this.size = this.compute_size();
        Ok(this)
    }

    /// Replace the scatter randomness with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng64::new(seed);
        self
    }

    /// Register with the host and start the frame loop.
    pub fn mount(&mut self, host: &mut dyn ViewportHost) {
        if self.torn_down {
            return;
        }
        if self.listener.is_none() {
            self.listener = Some(host.add_resize_listener());
        }
        self.driver.start();
    }

    /// Stop the frame loop, deregister from the host and drop the field. Idempotent.
    pub fn teardown(&mut self, host: &mut dyn ViewportHost) {
        self.driver.stop();
        if let Some(id) = self.listener.take() {
            host.remove_resize_listener(id);
        }
        if !self.torn_down {
            tracing::debug!(particles = self.field.len(), "tearing down text reveal");
        }
        self.torn_down = true;
        self.field = ParticleField::empty();
        self.surface = None;
        self.overlay_text = None;
    }

    /// Allocate the visible surface for the current size.
    ///
    /// A size with no pixels leaves the component without a surface.
    pub fn attach_surface(&mut self) {
        if self.torn_down {
            return;
        }
        match Surface::new(self.size, self.viewport.device_pixel_ratio) {
            Ok(s) => self.surface = Some(s),
            Err(err) => {
                tracing::warn!(%err, "cannot attach surface");
                self.surface = None;
            }
        }
        self.dirty = true;
    }

    /// Drop the visible surface; frames become no-ops until a surface is attached again.
    pub fn detach_surface(&mut self) {
        self.surface = None;
    }

    /// Pointer entered the component.
    pub fn pointer_enter(&mut self) {
        self.hover.pointer_enter();
    }

    /// Pointer left the component.
    pub fn pointer_leave(&mut self) {
        self.hover.pointer_leave();
        if !self.hover.state().is_converging() {
            self.overlay.update(0.0, FieldState::Dispersed, self.config.motion.overlay_fade_secs);
        }
    }

    /// Viewport changed (size or pixel ratio).
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.relayout();
    }

    /// Containing layout box changed.
    pub fn set_container(&mut self, container: Option<SurfaceSize>) {
        self.container = container;
        self.relayout();
    }

    /// Replace the text.
    pub fn set_text(&mut self, text: impl Into<String>) -> GlimmerResult<()> {
        let config = RevealConfig {
            text: text.into(),
            ..self.config.clone()
        };
        self.set_config(config)
    }

    /// Replace the whole configuration.
    ///
    /// Font files named by the new configuration are registered before the next measurement.
    pub fn set_config(&mut self, config: RevealConfig) -> GlimmerResult<()> {
        config.validate()?;
        self.source.configure(&config);
        self.hover
            .set_reset_on_pointer_exit(config.reset_on_pointer_exit);
        self.renderer.set_particle_size(config.particle_size);
        self.driver
            .set_max_step(f64::from(config.motion.max_step_secs));
        self.config = config;
        self.relayout();
        self.dirty = true;
        Ok(())
    }

    /// Drive one display frame at host time `now_s`. Returns whether another frame is wanted.
    pub fn frame(&mut self, now_s: f64) -> bool {
        let mut driver = self.driver;
        let more = driver.tick(now_s, self);
        self.driver = driver;
        more
    }

    /// Rebuild the particle field now if a surface is attached.
    ///
    /// Returns `false` when skipped for lack of a surface; the rebuild stays pending.
    #[tracing::instrument(skip(self), fields(text = %self.config.text))]
    pub fn rebuild(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(surface) = &self.surface else {
            tracing::debug!("no surface attached, rebuild deferred");
            self.dirty = true;
            return false;
        };
        let pixel_size: PixelSize = surface.pixel_size();
        let dpr = surface.device_pixel_ratio();

        let sampled = match self.source.sample_text(&self.config, pixel_size, dpr) {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!(%err, "sampling failed, rendering nothing");
                Default::default()
            }
        };
        self.params = MotionParams::new(&self.config, dpr);
        let field = ParticleField::build(&sampled.samples, &self.params, &mut self.rng);
        tracing::debug!(
            particles = field.len(),
            width = pixel_size.width,
            height = pixel_size.height,
            "rebuilt particle field"
        );

        self.field = field;
        self.overlay_text = sampled.overlay;
        self.dirty = false;
        true
    }

    /// Current configuration.
    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Current wrapper box in logical pixels.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Hover state.
    pub fn state(&self) -> FieldState {
        self.hover.state()
    }

    /// The live particle field.
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    /// The visible surface, if attached.
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Current literal text overlay opacity.
    pub fn overlay_opacity(&self) -> f32 {
        self.overlay.opacity()
    }

    /// Counters from the last drawn frame.
    pub fn last_stats(&self) -> DrawStats {
        self.last_stats
    }

    /// Whether a rebuild is pending.
    pub fn needs_rebuild(&self) -> bool {
        self.dirty
    }

    /// Whether the frame loop is running.
    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    /// The glyph source.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn compute_size(&mut self) -> SurfaceSize {
        SizeController.compute(&self.config, self.viewport, self.container, &mut self.source)
    }

    fn relayout(&mut self) {
        let size = self.compute_size();
        let dpr_changed = self
            .surface
            .as_ref()
            .is_some_and(|s| s.device_pixel_ratio() != self.viewport.device_pixel_ratio);
        if size == self.size && !dpr_changed {
            return;
        }
        self.size = size;
        self.dirty = true;
        if self.surface.is_some() {
            self.attach_surface();
        }
    }
}

impl<S: GlyphSource> FrameTarget for TextReveal<S> {
    fn on_tick(&mut self, dt_s: f64) {
        if self.torn_down {
            return;
        }
        if self.dirty {
            self.rebuild();
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        let state = self.hover.state();
        self.field.advance(dt_s, state, &self.params);
        self.hover.advance(dt_s);
        self.overlay
            .update(dt_s, state, self.config.motion.overlay_fade_secs);

        let overlay = match (state, &self.overlay_text) {
            (FieldState::Converging { .. }, Some(text)) => Some((text, self.overlay.opacity())),
            _ => None,
        };
        self.last_stats = self
            .renderer
            .draw(surface, self.field.particles(), overlay);
    }
}
