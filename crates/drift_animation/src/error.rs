//! Animation error types

use drift_core::PropertyError;
use thiserror::Error;

/// Errors raised by the animation engine
#[derive(Error, Debug)]
pub enum AnimationError {
    /// A tuning parameter is outside its valid range
    #[error("invalid configuration: {field} = {value} ({reason})")]
    InvalidConfiguration {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A value does not belong to the family the codec is bound to
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Two numeric vectors that must line up have different lengths
    #[error("dimension mismatch: expected {expected} components, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A step input contains NaN or an infinity
    #[error("non-finite component in {0} vector")]
    NonFinite(&'static str),

    /// Step computation panicked (usually inside an injected ramp function)
    #[error("step computation panicked: {0}")]
    StepPanicked(String),

    #[error("duplicate animation token: {0}")]
    DuplicateToken(String),

    #[error("unknown animation token: {0}")]
    UnknownToken(String),

    #[error("unknown animation profile: {0}")]
    UnknownProfile(String),

    /// A `SchedulerHandle` outlived its scheduler
    #[error("animation scheduler has been dropped")]
    SchedulerDropped,

    /// The owner property failed to read or write
    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("failed to build step worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to parse animation config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read animation config: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
