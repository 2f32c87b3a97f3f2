//! Per-particle motion: ambient float while dispersed, linear return while converging.
//!
//! Stepping one particle never reads another, so a frame is O(n).

use crate::config::{MotionTuning, RevealConfig};
use crate::foundation::core::{Vec2, sanitize_dpr};
use crate::foundation::rng::Rng64;
use crate::particles::field::Particle;

/// Dispersed particles may end a step at most this fraction beyond `spread`.
pub const CONTAINMENT_SLACK: f64 = 0.05;

/// Share of `spread` reachable by the trig part of the ambient noise.
const NOISE_REACH: f64 = 0.65;
/// Weight of the random term inside the ambient noise.
const NOISE_JITTER: f64 = 0.05;
/// Sparkle easing rate per unit of `sparkle_speed`.
const SPARKLE_RATE: f64 = 2.0;

/// Whether the field floats around its origins or is being pulled onto them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldState {
    /// Ambient float, the idle state.
    Dispersed,
    /// Pointer is hovering; particles return to their origins and fade.
    Converging {
        /// Seconds spent converging so far.
        elapsed_s: f64,
    },
}

impl FieldState {
    /// `true` for [`FieldState::Converging`].
    pub fn is_converging(self) -> bool {
        matches!(self, Self::Converging { .. })
    }
}

/// Hover state machine with the "sticky after first reveal" policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverPolicy {
    state: FieldState,
    reset_on_pointer_exit: bool,
    revealed: bool,
}

impl HoverPolicy {
    /// Start dispersed.
    pub fn new(reset_on_pointer_exit: bool) -> Self {
        Self {
            state: FieldState::Dispersed,
            reset_on_pointer_exit,
            revealed: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> FieldState {
        self.state
    }

    /// `true` once the field has converged at least once.
    pub fn has_revealed(&self) -> bool {
        self.revealed
    }

    /// Change the exit policy; takes effect on the next pointer-leave.
    pub fn set_reset_on_pointer_exit(&mut self, reset: bool) {
        self.reset_on_pointer_exit = reset;
    }

    /// Pointer entered the component.
    pub fn pointer_enter(&mut self) {
        if !self.state.is_converging() {
            self.state = FieldState::Converging { elapsed_s: 0.0 };
        }
        self.revealed = true;
    }

    /// Pointer left the component. A no-op after the first reveal when exit reset is disabled.
    pub fn pointer_leave(&mut self) {
        if self.reset_on_pointer_exit || !self.revealed {
            self.state = FieldState::Dispersed;
        }
    }

    /// Accumulate converging time.
    pub fn advance(&mut self, dt: f64) {
        if let FieldState::Converging { elapsed_s } = &mut self.state
            && dt > 0.0
        {
            *elapsed_s += dt;
        }
    }
}

/// Motion constants resolved into physical pixels for one device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionParams {
    /// Ambient radius around each origin.
    pub spread: f64,
    /// Ambient time multiplier.
    pub speed: f64,
    /// Base return speed, px/s.
    pub return_speed: f64,
    /// Return speed growth per converging second.
    pub return_acceleration: f64,
    /// Snap distance.
    pub snap_epsilon: f64,
    /// Opacity lost per converging second.
    pub fade_rate: f32,
    /// Ambient blend rate per second.
    pub transition_rate: f64,
    /// Raw jitter magnitude, px.
    pub jitter: f64,
    /// Fraction of overshoot removed by containment.
    pub containment_pull: f64,
    /// Sparkle retarget distance.
    pub sparkle_epsilon: f32,
    /// Chance of a bright spark target.
    pub spark_chance: f32,
    /// Bright target range.
    pub spark_opacity: [f32; 2],
    /// Dim target range.
    pub dim_opacity: [f32; 2],
    /// Initial opacity fraction of sampled alpha.
    pub initial_opacity: f32,
    /// Initial scatter radius fraction of the ink box.
    pub scatter_factor: f64,
    /// Per-particle floating speed range.
    pub floating_speed: [f32; 2],
    /// Per-particle sparkle speed range.
    pub sparkle_speed: [f32; 2],
}

impl MotionParams {
    /// Resolve `config` at device pixel ratio `dpr`.
    pub fn new(config: &RevealConfig, dpr: f32) -> Self {
        let dpr = f64::from(sanitize_dpr(dpr));
        let t: &MotionTuning = &config.motion;
        Self {
            spread: f64::from(config.spread.max(0.0)) * dpr,
            speed: f64::from(config.speed.max(0.0)),
            return_speed: f64::from(t.return_speed) * dpr,
            return_acceleration: f64::from(t.return_acceleration),
            snap_epsilon: f64::from(t.snap_epsilon) * dpr,
            fade_rate: t.fade_rate,
            transition_rate: f64::from(t.transition_rate),
            jitter: f64::from(t.jitter) * dpr,
            containment_pull: f64::from(t.containment_pull),
            sparkle_epsilon: t.sparkle_epsilon,
            spark_chance: t.spark_chance,
            spark_opacity: t.spark_opacity,
            dim_opacity: t.dim_opacity,
            initial_opacity: t.initial_opacity,
            scatter_factor: f64::from(t.scatter_factor),
            floating_speed: t.floating_speed,
            sparkle_speed: t.sparkle_speed,
        }
    }

    /// Draw a new sparkle target for a particle whose sampled alpha is `base_alpha`.
    pub fn sparkle_target(&self, rng: &mut Rng64, base_alpha: f32) -> f32 {
        let [lo, hi] = if rng.next_f32_01() < self.spark_chance {
            self.spark_opacity
        } else {
            self.dim_opacity
        };
        (rng.range_f32(lo, hi.max(lo)) * base_alpha).clamp(0.0, 1.0)
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::new(&RevealConfig::default(), 1.0)
    }
}

/// Advance one particle by `dt` seconds.
///
/// `clock_s` is the field's ambient clock. A non-positive `dt` leaves the particle untouched.
pub fn step(p: &mut Particle, dt: f64, state: FieldState, clock_s: f64, params: &MotionParams) {
    if !(dt > 0.0) {
        return;
    }
    match state {
        FieldState::Converging { elapsed_s } => step_converging(p, dt, elapsed_s, params),
        FieldState::Dispersed => step_dispersed(p, dt, clock_s, params),
    }
    p.opacity = p.opacity.clamp(0.0, 1.0);
}

fn step_converging(p: &mut Particle, dt: f64, elapsed_s: f64, params: &MotionParams) {
    let origin = p.origin();
    let to_origin = origin - p.position;
    let dist = to_origin.hypot();

    if dist <= params.snap_epsilon {
        p.position = origin;
        p.velocity = Vec2::ZERO;
    } else {
        let speed = params.return_speed * (1.0 + params.return_acceleration * elapsed_s.max(0.0));
        let dir = to_origin / dist;
        p.velocity = dir * speed;
        p.position += dir * (speed * dt).min(dist);
        if (origin - p.position).hypot() <= params.snap_epsilon {
            p.position = origin;
            p.velocity = Vec2::ZERO;
        }
    }

    p.opacity -= params.fade_rate * dt as f32;
}

fn step_dispersed(p: &mut Particle, dt: f64, clock_s: f64, params: &MotionParams) {
    let origin = p.origin();
    let t = clock_s * params.speed * f64::from(p.floating_speed);
    let phase = f64::from(p.floating_phase);

    let nx = 0.6 * (t + phase).sin()
        + 0.4 * (t * 0.63 + phase * 1.7).cos()
        + NOISE_JITTER * f64::from(p.rng.signed_f32());
    let ny = 0.6 * (t * 0.87 + phase).cos()
        + 0.4 * (t * 1.31 + phase * 0.5).sin()
        + NOISE_JITTER * f64::from(p.rng.signed_f32());
    let target = origin + Vec2::new(nx, ny) * (params.spread * NOISE_REACH);

    let jitter = Vec2::new(
        f64::from(p.rng.signed_f32()) * params.jitter,
        f64::from(p.rng.signed_f32()) * params.jitter,
    );
    let blend = (params.transition_rate * dt).min(1.0);
    p.position += (target - p.position) * blend + jitter;
    p.velocity = Vec2::ZERO;

    contain(p, params);
    sparkle(p, dt, params);
}

fn contain(p: &mut Particle, params: &MotionParams) {
    let origin = p.origin();
    let offset = p.position - origin;
    let dist = offset.hypot();
    if dist <= params.spread {
        return;
    }
    let overshoot = dist - params.spread;
    let limit = params.spread * (1.0 + CONTAINMENT_SLACK);
    let pulled = (dist - overshoot * params.containment_pull).min(limit);
    p.position = origin + offset * (pulled / dist);
}

fn sparkle(p: &mut Particle, dt: f64, params: &MotionParams) {
    let rate = (f64::from(p.sparkle_speed) * SPARKLE_RATE * dt).min(1.0) as f32;
    p.opacity += (p.target_opacity - p.opacity) * rate;
    if (p.opacity - p.target_opacity).abs() < params.sparkle_epsilon {
        let base_alpha = p.color().alpha_f32();
        p.target_opacity = params.sparkle_target(&mut p.rng, base_alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{Point, Rgba8};

    fn particle_at(origin: Point, position: Point, opacity: f32) -> Particle {
        let mut p = Particle::new(origin, Rgba8::WHITE, Rng64::new(42));
        p.position = position;
        p.opacity = opacity;
        p.target_opacity = 0.9;
        p.floating_phase = 1.3;
        p.floating_speed = 1.1;
        p.sparkle_speed = 1.4;
        p
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut p = particle_at(Point::new(5.0, 5.0), Point::new(9.0, 1.0), 0.25);
        let before = p.clone();
        let params = MotionParams::default();
        step(&mut p, 0.0, FieldState::Dispersed, 3.0, &params);
        step(&mut p, 0.0, FieldState::Converging { elapsed_s: 1.0 }, 3.0, &params);
        step(&mut p, f64::NAN, FieldState::Dispersed, 3.0, &params);
        assert_eq!(p, before);
    }

    #[test]
    fn converging_reaches_origin_and_fades_out() {
        let params = MotionParams::default();
        let origin = Point::new(100.0, 50.0);
        let mut p = particle_at(origin, Point::new(160.0, 10.0), 0.8);
        let mut state = HoverPolicy::new(true);
        state.pointer_enter();
        for _ in 0..600 {
            step(&mut p, 1.0 / 60.0, state.state(), 0.0, &params);
            state.advance(1.0 / 60.0);
        }
        assert_eq!(p.position, origin);
        assert_eq!(p.velocity, Vec2::ZERO);
        assert_eq!(p.opacity, 0.0);
    }

    #[test]
    fn converging_step_never_overshoots() {
        let params = MotionParams::default();
        let origin = Point::new(0.0, 0.0);
        let mut p = particle_at(origin, Point::new(3.0, 0.0), 1.0);
        step(&mut p, 10.0, FieldState::Converging { elapsed_s: 50.0 }, 0.0, &params);
        assert_eq!(p.position, origin);
    }

    #[test]
    fn dispersed_particles_stay_contained() {
        let params = MotionParams {
            jitter: 5.0,
            ..MotionParams::default()
        };
        let origin = Point::new(200.0, 200.0);
        let mut p = particle_at(origin, Point::new(200.0 + params.spread, 200.0), 0.5);
        let mut clock = 0.0;
        for i in 0..5_000 {
            let dt = if i % 7 == 0 { 0.1 } else { 1.0 / 120.0 };
            clock += dt;
            step(&mut p, dt, FieldState::Dispersed, clock, &params);
            let d = (p.position - origin).hypot();
            assert!(d <= params.spread * (1.0 + CONTAINMENT_SLACK) + 1e-9, "d={d}");
            assert!((0.0..=1.0).contains(&p.opacity));
        }
    }

    #[test]
    fn containment_pulls_back_a_far_particle() {
        let params = MotionParams::default();
        let origin = Point::new(0.0, 0.0);
        let mut p = particle_at(origin, Point::new(10_000.0, 0.0), 0.5);
        step(&mut p, 1.0 / 60.0, FieldState::Dispersed, 1.0, &params);
        let d = (p.position - origin).hypot();
        assert!(d <= params.spread * (1.0 + CONTAINMENT_SLACK) + 1e-9);
    }

    #[test]
    fn sparkle_retargets_near_target() {
        let params = MotionParams::default();
        let mut p = particle_at(Point::ZERO, Point::ZERO, 0.5);
        p.target_opacity = 0.5;
        step(&mut p, 1.0 / 60.0, FieldState::Dispersed, 0.0, &params);
        assert_ne!(p.target_opacity, 0.5);
        assert!((0.0..=1.0).contains(&p.target_opacity));
    }

    #[test]
    fn opacity_stays_clamped_from_out_of_range_start() {
        let params = MotionParams::default();
        let mut hot = particle_at(Point::ZERO, Point::ZERO, 7.0);
        step(&mut hot, 0.01, FieldState::Dispersed, 0.0, &params);
        assert!(hot.opacity <= 1.0);
        let mut cold = particle_at(Point::ZERO, Point::ZERO, -3.0);
        step(&mut cold, 0.01, FieldState::Converging { elapsed_s: 0.0 }, 0.0, &params);
        assert_eq!(cold.opacity, 0.0);
    }

    #[test]
    fn sticky_policy_ignores_exit_after_reveal() {
        let mut sticky = HoverPolicy::new(false);
        sticky.pointer_leave();
        assert_eq!(sticky.state(), FieldState::Dispersed);
        sticky.pointer_enter();
        sticky.pointer_leave();
        assert!(sticky.state().is_converging());
        assert!(sticky.has_revealed());

        let mut resetting = HoverPolicy::new(true);
        resetting.pointer_enter();
        resetting.advance(0.5);
        assert_eq!(resetting.state(), FieldState::Converging { elapsed_s: 0.5 });
        resetting.pointer_leave();
        assert_eq!(resetting.state(), FieldState::Dispersed);
    }

    #[test]
    fn reenter_keeps_converging_clock() {
        let mut h = HoverPolicy::new(true);
        h.pointer_enter();
        h.advance(0.25);
        h.pointer_enter();
        assert_eq!(h.state(), FieldState::Converging { elapsed_s: 0.25 });
    }

    #[test]
    fn params_scale_lengths_by_pixel_ratio() {
        let cfg = RevealConfig::default();
        let one = MotionParams::new(&cfg, 1.0);
        let two = MotionParams::new(&cfg, 2.0);
        assert_eq!(two.spread, one.spread * 2.0);
        assert_eq!(two.return_speed, one.return_speed * 2.0);
        assert_eq!(two.speed, one.speed);
    }
}
