//! Glimmer renders a line of text as a field of particles.
//!
//! Particles float around ink positions sampled from the rasterized text and, while the pointer
//! hovers, converge onto those positions and fade as the literal text fades in.
//!
//! - Build a [`RevealConfig`] (or load one from JSON)
//! - Create a [`TextReveal`] for a [`Viewport`], mount it on a [`ViewportHost`] and attach a
//!   surface
//! - Forward pointer/resize events and call [`TextReveal::frame`] once per display frame
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod foundation;
mod layout;
mod particles;
mod render;
mod sampling;
mod session;
mod text;

pub use crate::config::{DENSITY_SCALE, MotionTuning, RevealConfig, SizeOverrides};
pub use crate::foundation::core::{PixelSize, Point, Rgba8, SurfaceSize, Vec2};
pub use crate::foundation::error::{GlimmerError, GlimmerResult};
pub use crate::foundation::rng::Rng64;
pub use crate::layout::size::{
    DEFAULT_BOX, MOBILE_BREAKPOINT, SAFE_FRACTION, SizeController, Viewport,
};
pub use crate::particles::field::{Particle, ParticleField};
pub use crate::particles::motion::{
    CONTAINMENT_SLACK, FieldState, HoverPolicy, MotionParams, step as step_particle,
};
pub use crate::render::cpu::{DrawStats, OverlayFade, ParticleRenderer};
pub use crate::render::surface::{FrameRGBA, Surface};
pub use crate::sampling::glyph::{GlyphSampler, InkBounds, InkSample, rasterize_text, sample_ink};
pub use crate::sampling::source::{GlyphSource, SampledText};
pub use crate::session::driver::{AnimationDriver, FrameTarget};
pub use crate::session::host::{HeadlessHost, ListenerId, ViewportHost};
pub use crate::session::reveal::TextReveal;
pub use crate::text::fonts::{FontBook, PreparedText, ResolvedFont, TextMeasurer, TextMetrics};

/// `vello_cpu` pixmap type used for scratch rasters and surfaces.
pub use vello_cpu::Pixmap;
