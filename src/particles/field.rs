use crate::foundation::core::{Point, Rgba8, Vec2};
use crate::foundation::rng::Rng64;
use crate::particles::motion::{self, FieldState, MotionParams};
use crate::sampling::glyph::{InkBounds, InkSample};

/// One animated dot anchored to an ink sample.
///
/// Coordinates are physical pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    origin: Point,
    color: Rgba8,
    pub(crate) position: Point,
    pub(crate) velocity: Vec2,
    pub(crate) opacity: f32,
    pub(crate) target_opacity: f32,
    pub(crate) floating_phase: f32,
    pub(crate) floating_speed: f32,
    pub(crate) sparkle_speed: f32,
    pub(crate) rng: Rng64,
}

impl Particle {
    /// Particle resting on `origin`, invisible, with neutral motion constants.
    pub fn new(origin: Point, color: Rgba8, rng: Rng64) -> Self {
        Self {
            origin,
            color,
            position: origin,
            velocity: Vec2::ZERO,
            opacity: 0.0,
            target_opacity: 0.0,
            floating_phase: 0.0,
            floating_speed: 1.0,
            sparkle_speed: 1.0,
            rng,
        }
    }

    /// Anchor position; fixed for the particle's lifetime.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Sampled color; fixed for the particle's lifetime.
    pub fn color(&self) -> Rgba8 {
        self.color
    }

    /// Current draw position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Current velocity (only meaningful while converging).
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Current opacity in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Opacity the sparkle is easing toward.
    pub fn target_opacity(&self) -> f32 {
        self.target_opacity
    }

    /// Color used for drawing: sampled RGB with the current opacity as alpha.
    pub fn draw_color(&self) -> Rgba8 {
        self.color.with_opacity(self.opacity)
    }
}

/// All particles of one build plus the ambient clock that drives them.
#[derive(Clone, Debug, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
    clock_s: f64,
}

impl ParticleField {
    /// Field with no particles.
    pub fn empty() -> Self {
        Self::default()
    }

    /// One particle per sample, scattered around its origin.
    ///
    /// The scatter radius is a fraction of the ink box's longer side (not the whole surface),
    /// capped at `spread` so a fresh field already honors the ambient containment radius. Ink
    /// that collapses to a single point scatters over the full `spread`.
    pub fn build(samples: &[InkSample], params: &MotionParams, rng: &mut Rng64) -> Self {
        let Some(bounds) = InkBounds::of(samples) else {
            return Self::empty();
        };
        let ink_extent = f64::from(bounds.width().max(bounds.height()));
        let scatter = if ink_extent > 0.0 {
            ink_extent * params.scatter_factor
        } else {
            params.spread
        };
        let scatter = scatter.min(params.spread).max(0.0);

        let particles = samples
            .iter()
            .map(|s| {
                let mut p = Particle::new(s.point(), s.color, rng.fork());
                let angle = f64::from(p.rng.next_f32_01()) * std::f64::consts::TAU;
                let dist = f64::from(p.rng.next_f32_01()) * scatter;
                p.position = p.origin + Vec2::from_angle(angle) * dist;

                let base_alpha = s.color.alpha_f32();
                p.opacity = (params.initial_opacity * base_alpha).clamp(0.0, 1.0);
                p.target_opacity = params.sparkle_target(&mut p.rng, base_alpha);
                p.floating_phase = p.rng.range_f32(0.0, std::f32::consts::TAU);
                let [lo, hi] = params.floating_speed;
                p.floating_speed = p.rng.range_f32(lo, hi);
                let [lo, hi] = params.sparkle_speed;
                p.sparkle_speed = p.rng.range_f32(lo, hi);
                p
            })
            .collect();

        Self {
            particles,
            clock_s: 0.0,
        }
    }

    /// Read-only view of the particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// `true` when there is nothing to animate.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Ambient clock in seconds.
    pub fn clock_s(&self) -> f64 {
        self.clock_s
    }

    /// Step every particle by `dt` seconds in `state`.
    pub fn advance(&mut self, dt: f64, state: FieldState, params: &MotionParams) {
        if !(dt > 0.0) {
            return;
        }
        self.clock_s += dt;
        let clock = self.clock_s;
        for p in &mut self.particles {
            motion::step(p, dt, state, clock, params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::motion::CONTAINMENT_SLACK;

    fn sample(x: u16, y: u16, a: u8) -> InkSample {
        InkSample {
            x,
            y,
            color: Rgba8::new(10, 20, 30, a),
        }
    }

    #[test]
    fn two_samples_make_two_particles_on_their_origins() {
        let samples = [sample(10, 10, 255), sample(20, 10, 255)];
        let field = ParticleField::build(&samples, &MotionParams::default(), &mut Rng64::new(1));
        let origins: Vec<Point> = field.particles().iter().map(Particle::origin).collect();
        assert_eq!(origins, vec![Point::new(10.0, 10.0), Point::new(20.0, 10.0)]);
        for p in field.particles() {
            assert_eq!(p.color(), Rgba8::new(10, 20, 30, 255));
        }
    }

    #[test]
    fn scatter_is_bounded_by_ink_box_and_spread() {
        let samples: Vec<InkSample> = (0..50)
            .flat_map(|i| [sample(i * 2, 0, 255), sample(i * 2, 40, 255)])
            .collect();
        let params = MotionParams::default();
        let field = ParticleField::build(&samples, &params, &mut Rng64::new(3));
        let radius = (98.0 * params.scatter_factor).min(params.spread);
        for p in field.particles() {
            assert!((p.position() - p.origin()).hypot() <= radius + 1e-9);
        }
    }

    #[test]
    fn collinear_ink_still_scatters() {
        let params = MotionParams::default();
        let row = [sample(10, 10, 255), sample(20, 10, 255)];
        let column = [sample(5, 0, 255), sample(5, 30, 255)];
        for samples in [&row[..], &column[..]] {
            let field = ParticleField::build(samples, &params, &mut Rng64::new(1));
            for p in field.particles() {
                let d = (p.position() - p.origin()).hypot();
                assert!(d > 0.0, "particle at {:?} did not scatter", p.origin());
                assert!(d <= params.spread);
            }
        }

        let single = ParticleField::build(&[sample(4, 4, 255)], &params, &mut Rng64::new(2));
        assert_ne!(single.particles()[0].position(), single.particles()[0].origin());
    }

    #[test]
    fn initial_opacity_is_a_fraction_of_sampled_alpha() {
        let params = MotionParams::default();
        let field = ParticleField::build(
            &[sample(0, 0, 255), sample(4, 4, 51)],
            &params,
            &mut Rng64::new(5),
        );
        let ps = field.particles();
        assert!((ps[0].opacity() - params.initial_opacity).abs() < 1e-6);
        assert!((ps[1].opacity() - params.initial_opacity * 0.2).abs() < 1e-6);
    }

    #[test]
    fn scatter_differs_between_builds_but_origins_do_not() {
        let samples: Vec<InkSample> = (0..20).map(|i| sample(i * 3, i, 255)).collect();
        let params = MotionParams::default();
        let a = ParticleField::build(&samples, &params, &mut Rng64::new(11));
        let b = ParticleField::build(&samples, &params, &mut Rng64::new(12));
        let origins = |f: &ParticleField| f.particles().iter().map(Particle::origin).collect::<Vec<_>>();
        let positions =
            |f: &ParticleField| f.particles().iter().map(Particle::position).collect::<Vec<_>>();
        assert_eq!(origins(&a), origins(&b));
        assert_ne!(positions(&a), positions(&b));
    }

    #[test]
    fn per_particle_constants_are_decorrelated() {
        let samples: Vec<InkSample> = (0..10).map(|i| sample(i, 0, 255)).collect();
        let field =
            ParticleField::build(&samples, &MotionParams::default(), &mut Rng64::new(8));
        let ps = field.particles();
        assert!(ps.windows(2).any(|w| w[0].floating_phase != w[1].floating_phase));
        assert!(ps.windows(2).any(|w| w[0].sparkle_speed != w[1].sparkle_speed));
    }

    #[test]
    fn empty_samples_build_an_empty_field() {
        let field = ParticleField::build(&[], &MotionParams::default(), &mut Rng64::new(1));
        assert!(field.is_empty());
    }

    #[test]
    fn advance_keeps_invariants_over_many_frames() {
        let samples: Vec<InkSample> = (0..30).map(|i| sample(i * 4, (i % 5) * 4, 200)).collect();
        let params = MotionParams::default();
        let mut field = ParticleField::build(&samples, &params, &mut Rng64::new(2));
        for _ in 0..2_000 {
            field.advance(1.0 / 60.0, FieldState::Dispersed, &params);
            for p in field.particles() {
                assert!((0.0..=1.0).contains(&p.opacity()));
                let d = (p.position() - p.origin()).hypot();
                assert!(d <= params.spread * (1.0 + CONTAINMENT_SLACK) + 1e-9);
            }
        }
        assert!((field.clock_s() - 2_000.0 / 60.0).abs() < 1e-6);
    }
}
