//! Drift Animation System
//!
//! Exponential-convergence animation of typed widget properties.
//!
//! # Features
//!
//! - **Convergence**: each tick covers a fraction of the remaining distance plus
//!   a constant bias, landing exactly on the target in finite ticks
//! - **Moving Targets**: retarget at any time without restarting
//! - **Typed Values**: scalars, integers, points, sizes, rects, colors and numeric
//!   lists through one codec table
//! - **Scheduling**: per-animation timers or one shared scheduler with optional
//!   parallel step computation
//! - **Groups**: token-addressed animation sets per widget

pub mod animation;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod group;
pub mod presets;
pub mod scheduler;
pub mod stepper;

pub use animation::{
    AnimationEvent, AnimationState, ConvergeAnimation, DeferredAction, Driver, SharedAnimation,
    TickOutcome,
};
pub use clock::{Clock, ManualClock, OneShotTimer, PeriodicTimer, SharedClock, SystemClock};
pub use codec::{Codec, NumericVector, ValueFamily};
pub use config::{ConvergeConfig, EngineConfig, ProfileSettings, SchedulerSettings};
pub use error::{AnimationError, Result};
pub use group::AnimationGroup;
pub use presets::ConvergePreset;
pub use scheduler::{AnimationId, AnimationScheduler, SchedulerHandle, TickReport};
pub use stepper::{compute_step, convergence_step, Acceleration, StepInput, StepOutput};
