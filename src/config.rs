use std::path::{Path, PathBuf};

use crate::foundation::core::{Rgba8, sanitize_dpr};
use crate::foundation::error::{GlimmerError, GlimmerResult};

/// Default sampling density.
const DEFAULT_DENSITY: f32 = 3.0;

/// Logical pixels between samples at density 1.
pub const DENSITY_SCALE: f32 = 9.0;

/// Caller configuration for one text reveal component.
///
/// Lengths (`font_size`, `spread`, `particle_size`) are logical pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// The single line of text to render.
    pub text: String,
    /// Fill color of the text and base color of its particles.
    pub color: Rgba8,
    /// Font size in logical pixels.
    pub font_size: f32,
    /// CSS-style family list, e.g. `"Jakarta Sans, sans-serif"`.
    pub font_family: String,
    /// Font weight (`100..=900` typical).
    pub font_weight: f32,
    /// Maximum ambient drift radius around each particle origin.
    pub spread: f32,
    /// Ambient motion rate multiplier.
    pub speed: f32,
    /// Sampling density; larger means more particles. The default of 3 samples every third
    /// logical pixel.
    pub density: f32,
    /// When `false`, the reveal sticks after the first hover.
    pub reset_on_pointer_exit: bool,
    /// Edge length of a drawn particle in logical pixels.
    pub particle_size: f32,
    /// Font files to register before resolving `font_family`.
    pub font_files: Vec<PathBuf>,
    /// Caller sizing overrides.
    pub overrides: SizeOverrides,
    /// Motion constants.
    pub motion: MotionTuning,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            text: "Magic Text".to_string(),
            color: Rgba8::WHITE,
            font_size: 96.0,
            font_family: "Jakarta Sans, sans-serif".to_string(),
            font_weight: 700.0,
            spread: 60.0,
            speed: 0.6,
            density: DEFAULT_DENSITY,
            reset_on_pointer_exit: true,
            particle_size: 1.0,
            font_files: Vec::new(),
            overrides: SizeOverrides::default(),
            motion: MotionTuning::default(),
        }
    }
}

impl RevealConfig {
    /// Parse from a JSON string and validate.
    pub fn from_json_str(json: &str) -> GlimmerResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| GlimmerError::config(format!("parse reveal config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a JSON file, validate, and resolve `font_files` relative to the file's directory.
    pub fn from_json_path(path: impl AsRef<Path>) -> GlimmerResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let mut cfg = Self::from_json_str(&json)?;
        if let Some(dir) = path.parent() {
            for f in &mut cfg.font_files {
                if f.is_relative() {
                    *f = dir.join(&*f);
                }
            }
        }
        Ok(cfg)
    }

    /// Reject values that cannot produce a sensible render.
    pub fn validate(&self) -> GlimmerResult<()> {
        fn finite_at_least(name: &str, v: f32, min: f32, inclusive: bool) -> GlimmerResult<()> {
            let ok = v.is_finite() && if inclusive { v >= min } else { v > min };
            if ok {
                Ok(())
            } else {
                let op = if inclusive { ">=" } else { ">" };
                Err(GlimmerError::validation(format!(
                    "{name} must be finite and {op} {min}, got {v}"
                )))
            }
        }

        finite_at_least("font_size", self.font_size, 0.0, false)?;
        finite_at_least("spread", self.spread, 0.0, true)?;
        finite_at_least("speed", self.speed, 0.0, true)?;
        finite_at_least("density", self.density, 0.0, false)?;
        finite_at_least("particle_size", self.particle_size, 0.0, false)?;
        if !(1.0..=1000.0).contains(&self.font_weight) {
            return Err(GlimmerError::validation(format!(
                "font_weight must be in 1..=1000, got {}",
                self.font_weight
            )));
        }
        if self.text.contains('\n') {
            return Err(GlimmerError::validation("text must be a single line"));
        }
        self.overrides.validate()?;
        self.motion.validate()
    }

    /// Physical sampling stride for a device pixel ratio.
    ///
    /// The stride is `max(1, round(dpr × DENSITY_SCALE / density))`: it shrinks as `density`
    /// grows and scales with the pixel ratio, so on-screen particle spacing stays the same
    /// across displays.
    pub fn sampling_stride(&self, device_pixel_ratio: f32) -> u32 {
        let dpr = sanitize_dpr(device_pixel_ratio);
        let density = if self.density.is_finite() && self.density > 0.0 {
            self.density
        } else {
            DEFAULT_DENSITY
        };
        (dpr * DENSITY_SCALE / density).round().max(1.0) as u32
    }
}

/// Caller-supplied sizing overrides in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SizeOverrides {
    /// Fixed wrapper width, replacing the measured width.
    pub width: Option<f32>,
    /// Fixed wrapper height, replacing the measured height.
    pub height: Option<f32>,
    /// Minimum wrapper width, replacing the device-class minimum.
    pub min_width: Option<f32>,
    /// Minimum wrapper height, replacing the device-class minimum.
    pub min_height: Option<f32>,
}

impl SizeOverrides {
    fn validate(&self) -> GlimmerResult<()> {
        for (name, v) in [
            ("overrides.width", self.width),
            ("overrides.height", self.height),
            ("overrides.min_width", self.min_width),
            ("overrides.min_height", self.min_height),
        ] {
            if let Some(v) = v
                && !(v.is_finite() && v >= 0.0)
            {
                return Err(GlimmerError::validation(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Motion and appearance constants.
///
/// Lengths are logical pixels, rates are per second.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Base speed of the linear return toward origin.
    pub return_speed: f32,
    /// Growth of the return speed per second spent converging.
    pub return_acceleration: f32,
    /// Distance under which a returning particle snaps onto its origin.
    pub snap_epsilon: f32,
    /// Opacity lost per second while converging.
    pub fade_rate: f32,
    /// Blend rate toward the ambient target position.
    pub transition_rate: f32,
    /// Magnitude of the raw per-step jitter.
    pub jitter: f32,
    /// Fraction of the overshoot removed when a particle leaves the spread radius.
    pub containment_pull: f32,
    /// Opacity distance at which a new sparkle target is drawn.
    pub sparkle_epsilon: f32,
    /// Probability that a new sparkle target is a bright spark.
    pub spark_chance: f32,
    /// Range of bright spark opacities.
    pub spark_opacity: [f32; 2],
    /// Range of dim ambient opacities.
    pub dim_opacity: [f32; 2],
    /// Initial opacity as a fraction of the sampled alpha.
    pub initial_opacity: f32,
    /// Initial scatter radius as a fraction of the ink box's smaller side.
    pub scatter_factor: f32,
    /// Range of per-particle floating speeds.
    pub floating_speed: [f32; 2],
    /// Range of per-particle sparkle speeds.
    pub sparkle_speed: [f32; 2],
    /// Seconds for the literal text overlay to fade in.
    pub overlay_fade_secs: f32,
    /// Largest time step fed to the motion model.
    pub max_step_secs: f32,
    /// Pixels with alpha above this count as ink.
    pub ink_alpha_threshold: u8,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            return_speed: 90.0,
            return_acceleration: 2.5,
            snap_epsilon: 0.5,
            fade_rate: 1.2,
            transition_rate: 2.5,
            jitter: 0.15,
            containment_pull: 0.5,
            sparkle_epsilon: 0.02,
            spark_chance: 0.08,
            spark_opacity: [0.75, 1.0],
            dim_opacity: [0.1, 0.4],
            initial_opacity: 0.3,
            scatter_factor: 0.5,
            floating_speed: [0.5, 1.5],
            sparkle_speed: [0.5, 2.0],
            overlay_fade_secs: 0.6,
            max_step_secs: 0.1,
            ink_alpha_threshold: 8,
        }
    }
}

impl MotionTuning {
    fn validate(&self) -> GlimmerResult<()> {
        let non_negative = [
            ("motion.return_speed", self.return_speed),
            ("motion.return_acceleration", self.return_acceleration),
            ("motion.snap_epsilon", self.snap_epsilon),
            ("motion.fade_rate", self.fade_rate),
            ("motion.transition_rate", self.transition_rate),
            ("motion.jitter", self.jitter),
            ("motion.sparkle_epsilon", self.sparkle_epsilon),
            ("motion.scatter_factor", self.scatter_factor),
            ("motion.overlay_fade_secs", self.overlay_fade_secs),
        ];
        for (name, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) {
                return Err(GlimmerError::validation(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }

        let unit = [
            ("motion.containment_pull", self.containment_pull),
            ("motion.spark_chance", self.spark_chance),
            ("motion.initial_opacity", self.initial_opacity),
        ];
        for (name, v) in unit {
            if !(0.0..=1.0).contains(&v) {
                return Err(GlimmerError::validation(format!(
                    "{name} must be in [0, 1], got {v}"
                )));
            }
        }

        for (name, [lo, hi]) in [
            ("motion.spark_opacity", self.spark_opacity),
            ("motion.dim_opacity", self.dim_opacity),
        ] {
            if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
                return Err(GlimmerError::validation(format!(
                    "{name} must be an ordered range within [0, 1]"
                )));
            }
        }
        for (name, [lo, hi]) in [
            ("motion.floating_speed", self.floating_speed),
            ("motion.sparkle_speed", self.sparkle_speed),
        ] {
            if !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && lo <= hi) {
                return Err(GlimmerError::validation(format!(
                    "{name} must be an ordered non-negative range"
                )));
            }
        }

        if !(self.max_step_secs.is_finite() && self.max_step_secs > 0.0) {
            return Err(GlimmerError::validation(
                "motion.max_step_secs must be finite and > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        RevealConfig::default().validate().unwrap();
    }

    #[test]
    fn json_accepts_partial_config() {
        let cfg = RevealConfig::from_json_str(
            r#"{
                "text": "Amoura Works",
                "color": "rgba(211, 253, 80, 1)",
                "font_size": 48,
                "font_weight": 600,
                "reset_on_pointer_exit": false
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.text, "Amoura Works");
        assert_eq!(cfg.color, Rgba8::new(211, 253, 80, 255));
        assert!(!cfg.reset_on_pointer_exit);
        assert_eq!(cfg.spread, 60.0);
        assert_eq!(cfg.motion, MotionTuning::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut cfg = RevealConfig {
            font_size: 0.0,
            ..RevealConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg.font_size = 10.0;
        cfg.density = -1.0;
        assert!(cfg.validate().is_err());

        cfg.density = 1.0;
        cfg.text = "two\nlines".to_string();
        assert!(cfg.validate().is_err());

        cfg.text = "ok".to_string();
        cfg.motion.dim_opacity = [0.5, 0.1];
        assert!(cfg.validate().is_err());

        cfg.motion = MotionTuning::default();
        cfg.overrides.width = Some(f32::INFINITY);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_json_maps_to_config_error() {
        let err = RevealConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, GlimmerError::Config(_)));
    }

    #[test]
    fn stride_scales_with_pixel_ratio() {
        let cfg = RevealConfig::default();
        assert_eq!(cfg.sampling_stride(1.0), 3);
        assert_eq!(cfg.sampling_stride(2.0), 6);
        assert_eq!(cfg.sampling_stride(0.0), 3);
    }

    #[test]
    fn higher_density_means_a_smaller_stride() {
        let at = |density: f32| {
            RevealConfig {
                density,
                ..RevealConfig::default()
            }
            .sampling_stride(1.0)
        };
        assert_eq!(at(1.0), 9);
        assert_eq!(at(3.0), 3);
        assert_eq!(at(9.0), 1);
        assert_eq!(at(100.0), 1);
        assert!(at(0.5) > at(1.0));

        let broken = RevealConfig {
            density: f32::NAN,
            ..RevealConfig::default()
        };
        assert_eq!(broken.sampling_stride(1.0), 3);
    }
}
