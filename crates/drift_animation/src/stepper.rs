//! Convergence stepper
//!
//! Pure step computation for exponential convergence. Each tick covers a
//! `factor` share of the remaining distance plus a constant `bias`, so the
//! distance shrinks by at least `bias` per tick and the animation lands on its
//! target in a finite number of ticks:
//!
//! ```text
//! distance  = target - current
//! magnitude = |distance| * factor + bias
//! step      = magnitude * sign(distance)
//! ```
//!
//! Once every component is within `bias` of the target the whole vector snaps
//! onto it. Components within `bias` on their own snap individually, so a point
//! moving diagonally can land one axis before the other. A step never carries
//! a component past its target.
//!
//! Nothing here touches owner state, so steps can be computed on worker threads.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use smallvec::smallvec;

use crate::codec::NumericVector;
use crate::config::ConvergeConfig;
use crate::error::{AnimationError, Result};

/// Step bound that ramps up with the number of ticks since start
///
/// The ramp is caller-supplied; the engine only caps it at `ceiling` and never
/// lets the bound fall below the config's `bias`, so progress is guaranteed.
#[derive(Clone)]
pub struct Acceleration {
    ramp: Arc<dyn Fn(u64) -> f64 + Send + Sync>,
    ceiling: f64,
}

impl Acceleration {
    /// Create an acceleration ramp capped at `ceiling`
    pub fn new<F>(ceiling: f64, ramp: F) -> Result<Self>
    where
        F: Fn(u64) -> f64 + Send + Sync + 'static,
    {
        if !(ceiling > 0.0 && ceiling.is_finite()) {
            return Err(AnimationError::InvalidConfiguration {
                field: "step_bound_ceiling",
                value: ceiling,
                reason: "must be finite and greater than 0",
            });
        }
        Ok(Self {
            ramp: Arc::new(ramp),
            ceiling,
        })
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    /// Step bound after `ticks` ticks, never below `floor`
    pub fn bound(&self, ticks: u64, floor: f64) -> f64 {
        (self.ramp)(ticks).min(self.ceiling).max(floor)
    }
}

impl fmt::Debug for Acceleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acceleration")
            .field("ceiling", &self.ceiling)
            .finish_non_exhaustive()
    }
}

/// Everything needed to compute one step, detached from the animation
#[derive(Clone, Debug)]
pub struct StepInput {
    pub current: NumericVector,
    pub target: NumericVector,
    pub velocity: NumericVector,
    /// Ticks applied since the animation started
    pub ticks_elapsed: u64,
    pub config: ConvergeConfig,
}

impl StepInput {
    /// Input for a cold start: zero velocity, no ticks elapsed
    pub fn new(current: &[f64], target: &[f64], config: ConvergeConfig) -> Self {
        Self {
            current: current.iter().copied().collect(),
            target: target.iter().copied().collect(),
            velocity: smallvec![0.0; current.len()],
            ticks_elapsed: 0,
            config,
        }
    }
}

/// Result of one step
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutput {
    /// Delta actually applied to `current`
    pub step: NumericVector,
    /// New `current`; snapped components hold the exact target value
    pub next: NumericVector,
    /// Velocity to carry into the next tick
    pub velocity: NumericVector,
    /// `next == target`
    pub converged: bool,
}

impl StepOutput {
    /// Feed this output back as the next step's input
    pub fn advance(&self, input: &StepInput) -> StepInput {
        StepInput {
            current: self.next.clone(),
            target: input.target.clone(),
            velocity: self.velocity.clone(),
            ticks_elapsed: input.ticks_elapsed + 1,
            config: input.config.clone(),
        }
    }
}

/// Raw convergence step without inertia or acceleration
///
/// Returns `target - current` when every component is within `bias`.
pub fn convergence_step(current: &[f64], target: &[f64], factor: f64, bias: f64) -> NumericVector {
    let distance: NumericVector = target.iter().zip(current).map(|(t, c)| t - c).collect();
    if distance.iter().all(|d| d.abs() <= bias) {
        return distance;
    }

    distance
        .iter()
        .map(|&d| {
            if d.abs() <= bias {
                d
            } else {
                (d.abs() * factor + bias).min(d.abs()).copysign(d)
            }
        })
        .collect()
}

/// Compute the next step
pub fn compute_step(input: &StepInput) -> Result<StepOutput> {
    let width = input.target.len();
    for len in [input.current.len(), input.velocity.len()] {
        if len != width {
            return Err(AnimationError::DimensionMismatch {
                expected: width,
                found: len,
            });
        }
    }
    check_finite("current", &input.current)?;
    check_finite("target", &input.target)?;
    check_finite("velocity", &input.velocity)?;

    let config = &input.config;
    let bias = config.bias();
    let distance: NumericVector = input
        .target
        .iter()
        .zip(&input.current)
        .map(|(t, c)| t - c)
        .collect();

    // Whole-vector snap also discards any carried velocity
    if distance.iter().all(|d| d.abs() <= bias) {
        return Ok(StepOutput {
            step: distance,
            next: input.target.clone(),
            velocity: smallvec![0.0; width],
            converged: true,
        });
    }

    let bound = config
        .acceleration()
        .map(|acceleration| acceleration.bound(input.ticks_elapsed, bias));
    let inertia = config.velocity_inertia();

    let mut step = NumericVector::with_capacity(width);
    let mut next = NumericVector::with_capacity(width);
    let mut velocity = NumericVector::with_capacity(width);

    for i in 0..width {
        let d = distance[i];
        let target = input.target[i];

        if d.abs() <= bias {
            step.push(d);
            next.push(target);
            velocity.push(0.0);
            continue;
        }

        let mut magnitude = d.abs() * config.factor() + bias;
        if let Some(bound) = bound {
            magnitude = magnitude.min(bound);
        }
        let raw = magnitude.min(d.abs()).copysign(d);
        let applied = if inertia > 0.0 {
            input.velocity[i] * inertia + raw * (1.0 - inertia)
        } else {
            raw
        };

        // A step too small to change `current` at this magnitude would stall
        let stalled = input.current[i] + raw == input.current[i];
        if stalled || (applied * d > 0.0 && applied.abs() >= d.abs()) {
            // Reaching or passing the target lands exactly on it
            step.push(d);
            next.push(target);
            velocity.push(0.0);
        } else {
            step.push(applied);
            next.push(input.current[i] + applied);
            velocity.push(applied);
        }
    }

    let converged = next == input.target;
    Ok(StepOutput {
        step,
        next,
        velocity,
        converged,
    })
}

/// [`compute_step`] with panics turned into `StepPanicked` errors
///
/// Injected ramp functions run inside the step; a panic there must only fail
/// the animation that owns it.
pub fn compute_step_isolated(input: &StepInput) -> Result<StepOutput> {
    panic::catch_unwind(AssertUnwindSafe(|| compute_step(input)))
        .unwrap_or_else(|payload| Err(AnimationError::StepPanicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn check_finite(name: &'static str, vector: &[f64]) -> Result<()> {
    if vector.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(AnimationError::NonFinite(name))
    }
}
