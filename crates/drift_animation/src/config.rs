//! Convergence tuning and engine configuration
//!
//! [`ConvergeConfig`] holds the per-animation tuning parameters. Every setter
//! validates its input and returns `InvalidConfiguration` instead of clamping.
//!
//! [`EngineConfig`] is the TOML form used by applications:
//!
//! ```toml
//! [scheduler]
//! tick_interval_ms = 16.667
//! worker_threads = 4
//! parallel_threshold = 32
//!
//! [profiles.popup]
//! factor = 0.25
//! bias = 1.0
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{AnimationError, Result};
use crate::stepper::Acceleration;

/// Default tick interval (60 Hz)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_micros(16_667);

const DEFAULT_TICK_INTERVAL_MS: f64 = 16.667;

/// Tuning parameters for one convergence animation
#[derive(Clone)]
pub struct ConvergeConfig {
    factor: f64,
    bias: f64,
    velocity_inertia: f64,
    tick_interval: Duration,
    acceleration: Option<Acceleration>,
}

impl ConvergeConfig {
    /// Create a config with the given factor and bias
    ///
    /// `factor` must lie in the open interval (0, 1) and `bias` must be a
    /// finite value greater than zero.
    pub fn new(factor: f64, bias: f64) -> Result<Self> {
        Ok(Self {
            factor: validate_factor(factor)?,
            bias: validate_bias(bias)?,
            ..Self::default()
        })
    }

    /// Config with known-good constants, used by presets
    pub(crate) const fn unchecked(factor: f64, bias: f64) -> Self {
        Self {
            factor,
            bias,
            velocity_inertia: 0.0,
            tick_interval: DEFAULT_TICK_INTERVAL,
            acceleration: None,
        }
    }

    /// Builder: set velocity inertia, in `[0, 1)`
    pub fn with_velocity_inertia(mut self, inertia: f64) -> Result<Self> {
        self.set_velocity_inertia(inertia)?;
        Ok(self)
    }

    /// Builder: set the tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Result<Self> {
        self.set_tick_interval(interval)?;
        Ok(self)
    }

    /// Builder: bound step sizes with an acceleration ramp
    pub fn with_acceleration(mut self, acceleration: Acceleration) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn velocity_inertia(&self) -> f64 {
        self.velocity_inertia
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn acceleration(&self) -> Option<&Acceleration> {
        self.acceleration.as_ref()
    }

    pub fn set_factor(&mut self, factor: f64) -> Result<()> {
        self.factor = validate_factor(factor)?;
        Ok(())
    }

    pub fn set_bias(&mut self, bias: f64) -> Result<()> {
        self.bias = validate_bias(bias)?;
        Ok(())
    }

    pub fn set_velocity_inertia(&mut self, inertia: f64) -> Result<()> {
        if !(0.0..1.0).contains(&inertia) {
            return Err(AnimationError::InvalidConfiguration {
                field: "velocity_inertia",
                value: inertia,
                reason: "must be in [0, 1)",
            });
        }
        self.velocity_inertia = inertia;
        Ok(())
    }

    pub fn set_tick_interval(&mut self, interval: Duration) -> Result<()> {
        self.tick_interval = validate_interval(interval)?;
        Ok(())
    }

    pub fn set_acceleration(&mut self, acceleration: Option<Acceleration>) {
        self.acceleration = acceleration;
    }
}

impl Default for ConvergeConfig {
    fn default() -> Self {
        Self::unchecked(0.25, 1.0)
    }
}

impl fmt::Debug for ConvergeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvergeConfig")
            .field("factor", &self.factor)
            .field("bias", &self.bias)
            .field("velocity_inertia", &self.velocity_inertia)
            .field("tick_interval", &self.tick_interval)
            .field("acceleration", &self.acceleration)
            .finish()
    }
}

fn validate_factor(factor: f64) -> Result<f64> {
    if factor > 0.0 && factor < 1.0 {
        Ok(factor)
    } else {
        Err(AnimationError::InvalidConfiguration {
            field: "factor",
            value: factor,
            reason: "must be in the open interval (0, 1)",
        })
    }
}

fn validate_bias(bias: f64) -> Result<f64> {
    if bias > 0.0 && bias.is_finite() {
        Ok(bias)
    } else {
        Err(AnimationError::InvalidConfiguration {
            field: "bias",
            value: bias,
            reason: "must be finite and greater than 0",
        })
    }
}

pub(crate) fn validate_interval(interval: Duration) -> Result<Duration> {
    if interval.is_zero() {
        return Err(AnimationError::InvalidConfiguration {
            field: "tick_interval",
            value: 0.0,
            reason: "must be greater than 0",
        });
    }
    Ok(interval)
}

fn millis_to_interval(ms: f64) -> Result<Duration> {
    let invalid = AnimationError::InvalidConfiguration {
        field: "tick_interval_ms",
        value: ms,
        reason: "must be a finite number of milliseconds greater than 0",
    };
    let nanos = (ms * 1_000_000.0).round();
    if !(nanos >= 1.0 && nanos < u64::MAX as f64) {
        return Err(invalid);
    }
    Ok(Duration::from_nanos(nanos as u64))
}

// ============================================================================
// Engine configuration file
// ============================================================================

/// Top-level engine configuration (`animation.toml`)
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    /// Named tuning profiles, e.g. `[profiles.hover]`
    #[serde(default)]
    pub profiles: FxHashMap<String, ProfileSettings>,
}

/// Shared scheduler settings
#[derive(Clone, Debug, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: f64,
    /// Step worker threads; 0 computes steps on the coordinating thread
    #[serde(default)]
    pub worker_threads: usize,
    /// Minimum number of running animations before steps fan out to workers
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_tick_interval_ms() -> f64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_parallel_threshold() -> usize {
    16
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            worker_threads: 0,
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl SchedulerSettings {
    pub fn tick_interval(&self) -> Result<Duration> {
        millis_to_interval(self.tick_interval_ms)
    }
}

/// One named tuning profile
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileSettings {
    pub factor: f64,
    pub bias: f64,
    #[serde(default)]
    pub velocity_inertia: f64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: f64,
}

impl TryFrom<&ProfileSettings> for ConvergeConfig {
    type Error = AnimationError;

    fn try_from(profile: &ProfileSettings) -> Result<Self> {
        ConvergeConfig::new(profile.factor, profile.bias)?
            .with_velocity_inertia(profile.velocity_inertia)?
            .with_tick_interval(millis_to_interval(profile.tick_interval_ms)?)
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the scheduler settings and every profile
    pub fn validate(&self) -> Result<()> {
        self.scheduler.tick_interval()?;
        for profile in self.profiles.values() {
            ConvergeConfig::try_from(profile)?;
        }
        Ok(())
    }

    /// Build the tuning config for a named profile
    pub fn profile(&self, name: &str) -> Result<ConvergeConfig> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| AnimationError::UnknownProfile(name.to_string()))?;
        ConvergeConfig::try_from(profile)
    }
}
