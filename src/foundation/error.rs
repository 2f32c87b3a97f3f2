/// Convenience result alias used across the crate.
pub type GlimmerResult<T> = Result<T, GlimmerError>;

/// Error type for configuration, font loading and rasterization failures.
///
/// The per-frame path never surfaces these to the end user: callers log and degrade to an empty
/// render or a default box instead.
#[derive(thiserror::Error, Debug)]
pub enum GlimmerError {
    /// Invalid configuration values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Font registration or text measurement failure.
    #[error("font error: {0}")]
    Font(String),

    /// Raster surface allocation or drawing failure.
    #[error("raster error: {0}")]
    Raster(String),

    /// Configuration (de)serialization failure.
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlimmerError {
    /// Build a [`GlimmerError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GlimmerError::Font`].
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Build a [`GlimmerError::Raster`].
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    /// Build a [`GlimmerError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
