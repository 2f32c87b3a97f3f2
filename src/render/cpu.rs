use crate::foundation::core::Rgba8;
use crate::particles::field::Particle;
use crate::particles::motion::FieldState;
use crate::render::surface::Surface;
use crate::text::fonts::PreparedText;

/// Counters from one draw call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Particles painted.
    pub particles: usize,
    /// Distinct paint colors used for particles.
    pub color_groups: usize,
    /// Whether the literal text overlay was painted.
    pub overlay: bool,
}

/// Time-based fade of the literal text overlay.
///
/// Rises linearly while converging and drops to zero as soon as the field disperses.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverlayFade {
    opacity: f32,
}

impl OverlayFade {
    /// Current overlay opacity.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Advance by `dt` seconds; `fade_secs` is the full fade-in duration.
    pub fn update(&mut self, dt: f64, state: FieldState, fade_secs: f32) {
        match state {
            FieldState::Dispersed => self.opacity = 0.0,
            FieldState::Converging { .. } => {
                if !(dt > 0.0) {
                    return;
                }
                if fade_secs <= 0.0 {
                    self.opacity = 1.0;
                } else {
                    self.opacity = (self.opacity + dt as f32 / fade_secs).min(1.0);
                }
            }
        }
    }
}

/// CPU particle renderer powered by `vello_cpu`.
///
/// Particles are grouped by their resolved draw color so each color sets the paint once.
pub struct ParticleRenderer {
    ctx: Option<vello_cpu::RenderContext>,
    order: Vec<(u32, u32)>,
    particle_size: f64,
}

impl std::fmt::Debug for ParticleRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleRenderer")
            .field("particle_size", &self.particle_size)
            .finish_non_exhaustive()
    }
}

impl ParticleRenderer {
    /// Renderer drawing `particle_size` × `particle_size` logical squares.
    pub fn new(particle_size: f32) -> Self {
        Self {
            ctx: None,
            order: Vec::new(),
            particle_size: f64::from(particle_size.max(0.0)),
        }
    }

    /// Change the particle edge length.
    pub fn set_particle_size(&mut self, particle_size: f32) {
        self.particle_size = f64::from(particle_size.max(0.0));
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> R,
    ) -> R {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx);
        self.ctx = Some(ctx);
        out
    }

    /// Clear `surface` and paint the particles, then the text overlay if given.
    ///
    /// Positions are physical pixels; they are divided by the pixel ratio and drawn in logical
    /// units under a `scale(dpr)` transform. Particles with no opacity are skipped.
    pub fn draw(
        &mut self,
        surface: &mut Surface,
        particles: &[Particle],
        overlay: Option<(&PreparedText, f32)>,
    ) -> DrawStats {
        let size = surface.pixel_size();
        let dpr = f64::from(surface.device_pixel_ratio());
        let logical = surface.logical_size();

        self.order.clear();
        for (i, p) in particles.iter().enumerate() {
            if p.opacity() <= 0.0 {
                continue;
            }
            let c = p.draw_color();
            if c.a == 0 {
                continue;
            }
            self.order.push((pack(c), i as u32));
        }
        self.order.sort_unstable();

        surface.clear();
        self.with_ctx_mut(size.width, size.height, |this, ctx| {
            let mut stats = DrawStats::default();
            ctx.set_transform(vello_cpu::kurbo::Affine::scale(dpr));

            let side = this.particle_size;
            let mut current: Option<u32> = None;
            for &(key, idx) in &this.order {
                if current != Some(key) {
                    let c = unpack(key);
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
                    current = Some(key);
                    stats.color_groups += 1;
                }
                let pos = particles[idx as usize].position();
                let (x, y) = (pos.x / dpr, pos.y / dpr);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x, y, x + side, y + side));
                stats.particles += 1;
            }

            if let Some((text, opacity)) = overlay
                && opacity > 0.0
            {
                let (ox, oy) = text.centered_origin(logical.width, logical.height);
                ctx.set_transform(
                    vello_cpu::kurbo::Affine::scale(dpr)
                        * vello_cpu::kurbo::Affine::translate((ox, oy)),
                );
                if opacity < 1.0 {
                    ctx.push_opacity_layer(opacity);
                }
                text.fill(ctx);
                if opacity < 1.0 {
                    ctx.pop_layer();
                }
                stats.overlay = true;
            }

            ctx.flush();
            ctx.render_to_pixmap(&mut surface.pixmap);
            stats
        })
    }
}

fn pack(c: Rgba8) -> u32 {
    u32::from_be_bytes([c.r, c.g, c.b, c.a])
}

fn unpack(key: u32) -> Rgba8 {
    let [r, g, b, a] = key.to_be_bytes();
    Rgba8::new(r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{Point, SurfaceSize};
    use crate::foundation::rng::Rng64;

    fn particle(x: f64, y: f64, color: Rgba8, opacity: f32) -> Particle {
        let mut p = Particle::new(Point::new(x, y), color, Rng64::new(0));
        p.opacity = opacity;
        p
    }

    #[test]
    fn pack_roundtrips() {
        let c = Rgba8::new(1, 2, 3, 4);
        assert_eq!(unpack(pack(c)), c);
    }

    #[test]
    fn groups_by_resolved_color_and_skips_invisible() {
        let mut surface = Surface::new(SurfaceSize::new(32.0, 16.0), 1.0).unwrap();
        let red = Rgba8::new(255, 0, 0, 255);
        let blue = Rgba8::new(0, 0, 255, 255);
        let particles = vec![
            particle(2.0, 2.0, red, 1.0),
            particle(6.0, 2.0, blue, 1.0),
            particle(10.0, 2.0, red, 1.0),
            particle(14.0, 2.0, red, 0.5),
            particle(18.0, 2.0, red, 0.0),
        ];

        let mut r = ParticleRenderer::new(1.0);
        let stats = r.draw(&mut surface, &particles, None);
        assert_eq!(stats.particles, 4);
        assert_eq!(stats.color_groups, 3);
        assert!(!stats.overlay);

        assert_eq!(surface.pixel(2, 2).unwrap()[3], 255);
        assert_eq!(surface.pixel(6, 2).unwrap()[2], 255);
        let half = surface.pixel(14, 2).unwrap();
        assert!(half[3] > 100 && half[3] < 160, "alpha={}", half[3]);
        assert_eq!(surface.pixel(18, 2).unwrap()[3], 0);
        assert_eq!(surface.pixel(0, 10).unwrap()[3], 0);
    }

    #[test]
    fn positions_are_divided_by_pixel_ratio() {
        let mut surface = Surface::new(SurfaceSize::new(16.0, 8.0), 2.0).unwrap();
        let particles = vec![particle(8.0, 4.0, Rgba8::WHITE, 1.0)];
        let mut r = ParticleRenderer::new(1.0);
        r.draw(&mut surface, &particles, None);
        // One logical pixel at logical (4, 2) covers physical (8..10, 4..6).
        for (x, y) in [(8, 4), (9, 4), (8, 5), (9, 5)] {
            assert_eq!(surface.pixel(x, y).unwrap()[3], 255, "({x},{y})");
        }
        assert_eq!(surface.pixel(10, 4).unwrap()[3], 0);
    }

    #[test]
    fn redraw_clears_previous_frame() {
        let mut surface = Surface::new(SurfaceSize::new(8.0, 8.0), 1.0).unwrap();
        let mut r = ParticleRenderer::new(1.0);
        r.draw(&mut surface, &[particle(1.0, 1.0, Rgba8::WHITE, 1.0)], None);
        assert!(!surface.is_blank());
        let stats = r.draw(&mut surface, &[], None);
        assert_eq!(stats, DrawStats::default());
        assert!(surface.is_blank());
    }

    #[test]
    fn overlay_fade_rises_then_resets() {
        let mut fade = OverlayFade::default();
        let converging = FieldState::Converging { elapsed_s: 0.0 };
        fade.update(0.0, converging, 0.5);
        assert_eq!(fade.opacity(), 0.0);
        fade.update(0.25, converging, 0.5);
        assert!((fade.opacity() - 0.5).abs() < 1e-6);
        fade.update(1.0, converging, 0.5);
        assert_eq!(fade.opacity(), 1.0);
        fade.update(0.1, FieldState::Dispersed, 0.5);
        assert_eq!(fade.opacity(), 0.0);
        fade.update(0.1, converging, 0.0);
        assert_eq!(fade.opacity(), 1.0);
    }
}
