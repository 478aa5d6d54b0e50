//! Convergence animation
//!
//! [`ConvergeAnimation`] drives one owner property toward a target. It is a
//! two-state machine:
//!
//! ```text
//!           start()                 tick(): current == target
//!   Idle ─────────────▶ Running ─────────────────────────────▶ Idle
//!     ▲                    │
//!     └──────── stop() ────┘
//! ```
//!
//! Each tick computes a step with the stepper, pushes the decoded value into
//! the owner and emits [`AnimationEvent::Progress`]. The tick that lands on the
//! target stops the animation and emits [`AnimationEvent::Finished`].
//!
//! An animation ticks itself from its own [`PeriodicTimer`] when the host calls
//! [`ConvergeAnimation::poll`], or is ticked by an
//! [`AnimationScheduler`](crate::scheduler::AnimationScheduler) once added to one.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use parking_lot::Mutex;
//! use drift_animation::{ConvergeAnimation, ConvergeConfig, ManualClock};
//! use drift_core::property;
//!
//! let opacity = Arc::new(Mutex::new(0.0f64));
//! let (read, write) = (opacity.clone(), opacity.clone());
//! let prop = property(
//!     "opacity",
//!     move || Ok((*read.lock()).into()),
//!     move |value| {
//!         *write.lock() = f64::try_from(value)?;
//!         Ok(())
//!     },
//! );
//!
//! let clock = ManualClock::new();
//! let config = ConvergeConfig::new(0.25, 0.01).unwrap();
//! let mut fade = ConvergeAnimation::new(prop, config)
//!     .unwrap()
//!     .with_clock(clock.shared());
//!
//! fade.set_target(1.0).unwrap();
//! fade.start().unwrap();
//! while fade.is_running() {
//!     clock.advance(Duration::from_millis(17));
//!     fade.poll().unwrap();
//! }
//! assert_eq!(*opacity.lock(), 1.0);
//! ```

use std::sync::Arc;
use std::time::Duration;

use drift_core::{PropertyAccess, PropertyValue};
use parking_lot::Mutex;
use smallvec::{smallvec, SmallVec};

use crate::clock::{OneShotTimer, PeriodicTimer, SharedClock, SystemClock};
use crate::codec::{Codec, NumericVector, ValueFamily};
use crate::config::ConvergeConfig;
use crate::error::{AnimationError, Result};
use crate::stepper::{compute_step_isolated, StepInput, StepOutput};

/// Animation state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationState {
    #[default]
    Idle,
    Running,
}

/// Notification emitted to listeners
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationEvent {
    /// Value pushed into the owner this tick
    Progress(PropertyValue),
    /// The animation landed on this target value
    Finished(PropertyValue),
}

/// Action scheduled with [`ConvergeAnimation::start_after`] or
/// [`ConvergeAnimation::stop_after`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredAction {
    Start,
    Stop,
}

/// Who ticks the animation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Driver {
    /// The animation's own periodic timer, fired by `poll()`
    #[default]
    OwnTimer,
    /// A shared scheduler
    Scheduler,
}

/// Result of one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing happened
    Idle,
    /// Moved toward the target
    Progressed,
    /// Landed on the target and stopped
    Finished,
}

/// Event listener callback
pub type Listener = Box<dyn FnMut(&AnimationEvent) + Send>;

/// Animation shared between its owner and a scheduler or group
pub type SharedAnimation = Arc<Mutex<ConvergeAnimation>>;

/// Exponential-convergence animation bound to one owner property
pub struct ConvergeAnimation {
    config: ConvergeConfig,
    codec: Codec,
    property: Box<dyn PropertyAccess>,
    state: AnimationState,
    enabled: bool,
    /// Seed for the next run; cleared by `stop()`
    start: Option<NumericVector>,
    /// Restart from `start` on the next tick
    reseed: bool,
    current: NumericVector,
    target: NumericVector,
    velocity: NumericVector,
    ticks_elapsed: u64,
    driver: Driver,
    clock: SharedClock,
    ticker: PeriodicTimer,
    deferred: OneShotTimer<DeferredAction>,
    listeners: SmallVec<[Listener; 2]>,
    /// Events raised by the last applied step, not yet delivered
    events: SmallVec<[AnimationEvent; 2]>,
}

impl ConvergeAnimation {
    /// Bind an animation to an owner property
    ///
    /// Reads the property once to resolve its value family. Both `current`
    /// and `target` start at that value, so `start()` does nothing until a
    /// different target is set.
    pub fn new<P>(property: P, config: ConvergeConfig) -> Result<Self>
    where
        P: PropertyAccess + 'static,
    {
        let value = property.get()?;
        let codec = Codec::for_value(&value)?;
        let current = codec.encode(&value)?;
        let width = current.len();

        Ok(Self {
            ticker: PeriodicTimer::new(config.tick_interval()),
            config,
            codec,
            property: Box::new(property),
            state: AnimationState::Idle,
            enabled: true,
            start: None,
            reseed: false,
            target: current.clone(),
            current,
            velocity: smallvec![0.0; width],
            ticks_elapsed: 0,
            driver: Driver::OwnTimer,
            clock: SystemClock::shared(),
            deferred: OneShotTimer::new(),
            listeners: SmallVec::new(),
            events: SmallVec::new(),
        })
    }

    /// Builder: use a specific clock
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Wrap in a [`SharedAnimation`]
    pub fn shared(self) -> SharedAnimation {
        Arc::new(Mutex::new(self))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == AnimationState::Running
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &ConvergeConfig {
        &self.config
    }

    pub fn family(&self) -> ValueFamily {
        self.codec.family()
    }

    pub fn property_name(&self) -> &str {
        self.property.name()
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn current_vector(&self) -> &[f64] {
        &self.current
    }

    pub fn target_vector(&self) -> &[f64] {
        &self.target
    }

    pub fn start_vector(&self) -> Option<&[f64]> {
        self.start.as_deref()
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Ticks applied since the last `start()`
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }

    /// Decoded current value
    pub fn current_value(&self) -> Result<PropertyValue> {
        self.codec.decode(&self.current)
    }

    /// Decoded target value
    pub fn target_value(&self) -> Result<PropertyValue> {
        self.codec.decode(&self.target)
    }

    /// Deferred action waiting on its timer, if any
    pub fn pending_action(&self) -> Option<DeferredAction> {
        self.deferred.pending().copied()
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Enable or disable the animation; a disabled animation ignores `start()`
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replace the tuning config
    pub fn set_config(&mut self, config: ConvergeConfig) {
        self.ticker.set_interval(config.tick_interval());
        self.config = config;
    }

    pub fn set_factor(&mut self, factor: f64) -> Result<()> {
        self.config.set_factor(factor)
    }

    pub fn set_bias(&mut self, bias: f64) -> Result<()> {
        self.config.set_bias(bias)
    }

    pub fn set_velocity_inertia(&mut self, inertia: f64) -> Result<()> {
        self.config.set_velocity_inertia(inertia)
    }

    pub fn set_tick_interval(&mut self, interval: Duration) -> Result<()> {
        self.config.set_tick_interval(interval)?;
        self.ticker.set_interval(interval);
        Ok(())
    }

    /// Set the value to converge toward
    ///
    /// Takes effect on the next tick. A running animation keeps its start
    /// vector and velocity and redirects toward the new target.
    pub fn set_target(&mut self, value: impl Into<PropertyValue>) -> Result<()> {
        self.target = self.codec.encode(&value.into())?;
        Ok(())
    }

    /// Set the value the next run starts from
    ///
    /// When idle, the next `start()` uses it instead of sampling the owner.
    /// When running, the next tick restarts from it.
    pub fn set_start(&mut self, value: impl Into<PropertyValue>) -> Result<()> {
        self.start = Some(self.codec.encode(&value.into())?);
        if self.is_running() {
            self.reseed = true;
        }
        Ok(())
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Register a listener for every event
    ///
    /// Under a scheduler, listeners run after the animation's lock is released,
    /// so they may lock it or remove it from the scheduler.
    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(&AnimationEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Register a listener for progress values
    pub fn on_progress<F>(&mut self, mut listener: F)
    where
        F: FnMut(&PropertyValue) + Send + 'static,
    {
        self.on_event(move |event| {
            if let AnimationEvent::Progress(value) = event {
                listener(value);
            }
        });
    }

    /// Register a listener for convergence
    pub fn on_finished<F>(&mut self, mut listener: F)
    where
        F: FnMut(&PropertyValue) + Send + 'static,
    {
        self.on_event(move |event| {
            if let AnimationEvent::Finished(value) = event {
                listener(value);
            }
        });
    }

    fn flush_events(&mut self) {
        let events = std::mem::take(&mut self.events);
        for event in &events {
            for listener in self.listeners.iter_mut() {
                listener(event);
            }
        }
    }

    /// Deliver queued events with the animation unlocked
    pub(crate) fn dispatch_events(animation: &SharedAnimation) {
        let (events, mut listeners) = {
            let mut anim = animation.lock();
            if anim.events.is_empty() {
                return;
            }
            (
                std::mem::take(&mut anim.events),
                std::mem::take(&mut anim.listeners),
            )
        };

        for event in &events {
            for listener in listeners.iter_mut() {
                listener(event);
            }
        }

        // Keep listeners registered while these were running
        let mut anim = animation.lock();
        let added = std::mem::replace(&mut anim.listeners, listeners);
        anim.listeners.extend(added);
    }

    // ========================================================================
    // State machine
    // ========================================================================

    /// Start converging toward the target
    ///
    /// Returns `Ok(true)` on the `Idle -> Running` transition. Does nothing when
    /// disabled, already running, or already at the target. Supersedes any
    /// pending deferred action.
    pub fn start(&mut self) -> Result<bool> {
        self.deferred.cancel();
        if !self.enabled {
            tracing::trace!(property = self.property.name(), "start ignored, animation disabled");
            return Ok(false);
        }
        if self.is_running() {
            return Ok(false);
        }

        let seed = match &self.start {
            Some(seed) => seed.clone(),
            None => self.codec.encode(&self.property.get()?)?,
        };
        if seed == self.target {
            return Ok(false);
        }

        self.current = seed.clone();
        self.start = Some(seed);
        self.reseed = false;
        self.velocity = smallvec![0.0; self.current.len()];
        self.ticks_elapsed = 0;
        self.state = AnimationState::Running;
        if self.driver == Driver::OwnTimer {
            self.ticker.arm(self.clock.now());
        }

        tracing::debug!(property = self.property.name(), "animation started");
        Ok(true)
    }

    /// Stop the animation
    ///
    /// Returns true on the `Running -> Idle` transition; calling it while idle
    /// does nothing. Supersedes any pending deferred action.
    pub fn stop(&mut self) -> bool {
        self.deferred.cancel();
        self.halt()
    }

    /// `Running -> Idle` without touching deferred actions
    fn halt(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.state = AnimationState::Idle;
        self.start = None;
        self.reseed = false;
        self.ticker.disarm();
        self.velocity.iter_mut().for_each(|v| *v = 0.0);
        self.ticks_elapsed = 0;

        tracing::debug!(property = self.property.name(), "animation stopped");
        true
    }

    /// Start after `delay`, replacing any pending deferred action
    pub fn start_after(&mut self, delay: Duration) {
        self.deferred
            .schedule(self.clock.now(), delay, DeferredAction::Start);
    }

    /// Stop after `delay`, replacing any pending deferred action
    pub fn stop_after(&mut self, delay: Duration) {
        self.deferred
            .schedule(self.clock.now(), delay, DeferredAction::Stop);
    }

    /// Cancel the pending deferred action
    pub fn cancel_deferred(&mut self) -> Option<DeferredAction> {
        self.deferred.cancel()
    }

    /// Run the deferred action if it is due at `now`
    pub fn poll_deferred(&mut self, now: Duration) -> Result<()> {
        match self.deferred.take_due(now) {
            Some(DeferredAction::Start) => self.start().map(|_| ()).map_err(|err| {
                tracing::warn!(property = self.property.name(), error = %err, "deferred start failed");
                err
            }),
            Some(DeferredAction::Stop) => {
                self.stop();
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Drive the animation from the host event loop
    ///
    /// Runs a due deferred action, then ticks once if the animation's own timer
    /// has fired. Animations driven by a scheduler only handle deferred
    /// actions here.
    pub fn poll(&mut self) -> Result<Option<TickOutcome>> {
        let now = self.clock.now();
        self.poll_deferred(now)?;

        if self.driver == Driver::OwnTimer && self.is_running() && self.ticker.fire_due(now) {
            return self.tick().map(Some);
        }
        Ok(None)
    }

    /// Advance one step
    ///
    /// A failed step stops the animation before the error is returned.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let Some(input) = self.prepare_step() else {
            return Ok(TickOutcome::Idle);
        };
        match compute_step_isolated(&input) {
            Ok(output) => {
                let outcome = self.apply_step(output);
                self.flush_events();
                outcome
            }
            Err(err) => {
                self.halt();
                Err(err)
            }
        }
    }

    // ========================================================================
    // Scheduler integration
    // ========================================================================

    /// Hand ticking over to a scheduler running on `clock`
    pub(crate) fn attach(&mut self, clock: SharedClock) {
        self.driver = Driver::Scheduler;
        self.clock = clock;
        self.ticker.disarm();
    }

    /// Take ticking back after leaving a scheduler; the animation stays stopped
    pub(crate) fn detach(&mut self) {
        self.stop();
        self.driver = Driver::OwnTimer;
    }

    /// Idle with nothing scheduled; a scheduler can let go of it
    pub(crate) fn is_settled(&self) -> bool {
        !self.is_running() && self.deferred.pending().is_none()
    }

    /// Snapshot the data for the next step, or `None` when idle
    pub(crate) fn prepare_step(&mut self) -> Option<StepInput> {
        if !self.is_running() {
            return None;
        }
        if self.reseed {
            if let Some(start) = &self.start {
                self.current = start.clone();
            }
            self.reseed = false;
        }

        Some(StepInput {
            current: self.current.clone(),
            target: self.target.clone(),
            velocity: self.velocity.clone(),
            ticks_elapsed: self.ticks_elapsed,
            config: self.config.clone(),
        })
    }

    /// Apply a computed step: update state, write the owner, queue events
    ///
    /// A failed owner write stops the animation before the error is returned.
    pub(crate) fn apply_step(&mut self, output: StepOutput) -> Result<TickOutcome> {
        if !self.is_running() {
            return Ok(TickOutcome::Idle);
        }
        if output.next.len() != self.current.len() {
            self.halt();
            return Err(AnimationError::DimensionMismatch {
                expected: self.current.len(),
                found: output.next.len(),
            });
        }

        self.current = output.next;
        self.velocity = output.velocity;
        self.ticks_elapsed += 1;

        let value = match self.push_current() {
            Ok(value) => value,
            Err(err) => {
                self.halt();
                return Err(err);
            }
        };
        self.events.push(AnimationEvent::Progress(value));

        if self.current != self.target {
            return Ok(TickOutcome::Progressed);
        }

        let ticks = self.ticks_elapsed;
        self.halt();
        let target = self.codec.decode(&self.target)?;
        tracing::debug!(property = self.property.name(), ticks, "animation finished");
        self.events.push(AnimationEvent::Finished(target));
        Ok(TickOutcome::Finished)
    }

    fn push_current(&mut self) -> Result<PropertyValue> {
        let value = self.codec.decode(&self.current)?;
        self.property.set(value.clone())?;
        Ok(value)
    }
}

impl std::fmt::Debug for ConvergeAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvergeAnimation")
            .field("property", &self.property.name())
            .field("family", &self.codec.family())
            .field("state", &self.state)
            .field("current", &self.current)
            .field("target", &self.target)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use drift_core::{property, Point, PropertyError};

    const FRAME: Duration = Duration::from_micros(16_667);

    fn scalar_owner(initial: f64) -> (Arc<Mutex<f64>>, impl PropertyAccess + 'static) {
        let store = Arc::new(Mutex::new(initial));
        let (read, write) = (store.clone(), store.clone());
        let prop = property(
            "value",
            move || Ok(PropertyValue::Scalar(*read.lock())),
            move |value| {
                *write.lock() = f64::try_from(value)?;
                Ok(())
            },
        );
        (store, prop)
    }

    fn scalar_animation(initial: f64) -> (Arc<Mutex<f64>>, ConvergeAnimation, ManualClock) {
        let (store, prop) = scalar_owner(initial);
        let clock = ManualClock::new();
        let anim = ConvergeAnimation::new(prop, ConvergeConfig::default())
            .unwrap()
            .with_clock(clock.shared());
        (store, anim, clock)
    }

    #[test]
    fn test_new_binds_family_and_idles() {
        let (_, anim, _) = scalar_animation(5.0);
        assert_eq!(anim.state(), AnimationState::Idle);
        assert_eq!(anim.family(), ValueFamily::Scalar);
        assert_eq!(anim.current_vector(), &[5.0]);
        assert_eq!(anim.target_vector(), &[5.0]);
        assert_eq!(anim.start_vector(), None);
        assert_eq!(anim.property_name(), "value");
    }

    #[test]
    fn test_new_rejects_non_numeric_owner() {
        let prop = property(
            "label",
            || Ok(PropertyValue::Text("Save".into())),
            |_| Ok(()),
        );
        let result = ConvergeAnimation::new(prop, ConvergeConfig::default());
        assert!(matches!(result, Err(AnimationError::TypeMismatch { .. })));
    }

    #[test]
    fn test_start_at_target_is_noop() {
        let (_, mut anim, _) = scalar_animation(5.0);
        assert!(!anim.start().unwrap());
        assert_eq!(anim.state(), AnimationState::Idle);
        assert_eq!(anim.start_vector(), None);
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (_, mut anim, _) = scalar_animation(0.0);
        assert!(!anim.stop());
        assert!(!anim.stop());
        assert_eq!(anim.state(), AnimationState::Idle);
    }

    #[test]
    fn test_start_samples_owner_once() {
        let (store, mut anim, _) = scalar_animation(0.0);
        // Owner moved after the animation was bound
        *store.lock() = 40.0;
        anim.set_target(100.0).unwrap();

        assert!(anim.start().unwrap());
        assert_eq!(anim.start_vector(), Some(&[40.0][..]));
        assert_eq!(anim.current_vector(), &[40.0]);

        // Already running
        assert!(!anim.start().unwrap());
    }

    #[test]
    fn test_stop_clears_start_vector() {
        let (store, mut anim, _) = scalar_animation(0.0);
        anim.set_target(100.0).unwrap();
        anim.start().unwrap();
        anim.tick().unwrap();
        assert!(anim.stop());
        assert_eq!(anim.start_vector(), None);
        assert_eq!(anim.velocity(), &[0.0]);

        // Next start re-samples the owner
        *store.lock() = 90.0;
        anim.start().unwrap();
        assert_eq!(anim.start_vector(), Some(&[90.0][..]));
    }

    #[test]
    fn test_start_at_target_keeps_explicit_start() {
        let (store, mut anim, _) = scalar_animation(0.0);
        anim.set_target(10.0).unwrap();
        anim.set_start(10.0).unwrap();
        assert!(!anim.start().unwrap());
        assert_eq!(anim.start_vector(), Some(&[10.0][..]));

        // The seed still applies once the target moves away
        anim.set_target(20.0).unwrap();
        assert!(anim.start().unwrap());
        assert_eq!(anim.current_vector(), &[10.0]);
        assert_eq!(*store.lock(), 0.0);
    }

    #[test]
    fn test_disabled_animation_does_not_start() {
        let (_, mut anim, _) = scalar_animation(0.0);
        anim.set_target(10.0).unwrap();
        anim.set_enabled(false);
        assert!(!anim.start().unwrap());
        assert!(!anim.is_running());

        anim.set_enabled(true);
        assert!(anim.start().unwrap());
    }

    #[test]
    fn test_tick_converges_and_notifies() {
        let (store, mut anim, _) = scalar_animation(0.0);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        anim.on_event(move |event| sink.lock().push(event.clone()));

        anim.set_target(100.0).unwrap();
        anim.start().unwrap();

        let mut outcome = TickOutcome::Progressed;
        let mut ticks = 0;
        while outcome == TickOutcome::Progressed {
            outcome = anim.tick().unwrap();
            ticks += 1;
        }

        assert_eq!(outcome, TickOutcome::Finished);
        assert_eq!(*store.lock(), 100.0);
        assert!(!anim.is_running());

        let events = events.lock();
        assert_eq!(events.len(), ticks + 1);
        assert_eq!(events[0], AnimationEvent::Progress(PropertyValue::Scalar(26.0)));
        assert_eq!(
            events.last().unwrap(),
            &AnimationEvent::Finished(PropertyValue::Scalar(100.0))
        );
        let finished = events
            .iter()
            .filter(|e| matches!(e, AnimationEvent::Finished(_)))
            .count();
        assert_eq!(finished, 1);

        drop(events);
        assert_eq!(anim.tick().unwrap(), TickOutcome::Idle);
    }

    #[test]
    fn test_set_target_while_running_keeps_start_and_velocity() {
        let (_, mut anim, _) = scalar_animation(0.0);
        anim.set_velocity_inertia(0.5).unwrap();
        anim.set_target(100.0).unwrap();
        anim.start().unwrap();
        anim.tick().unwrap();

        let velocity = anim.velocity().to_vec();
        anim.set_target(-50.0).unwrap();
        assert_eq!(anim.start_vector(), Some(&[0.0][..]));
        assert_eq!(anim.velocity(), velocity.as_slice());

        // Redirected toward the new target
        while anim.tick().unwrap() == TickOutcome::Progressed {}
        assert_eq!(anim.current_vector(), &[-50.0]);
    }

    #[test]
    fn test_set_start_while_running_reseeds_next_tick() {
        let (_, mut anim, _) = scalar_animation(0.0);
        anim.set_target(100.0).unwrap();
        anim.start().unwrap();
        anim.tick().unwrap();

        anim.set_start(80.0).unwrap();
        // current untouched until the next tick
        assert_eq!(anim.current_vector(), &[26.0]);
        anim.tick().unwrap();
        // 80 + (20 * 0.25 + 1)
        assert_eq!(anim.current_vector(), &[86.0]);
    }

    #[test]
    fn test_set_target_of_wrong_family_fails_without_change() {
        let (_, mut anim, _) = scalar_animation(0.0);
        let err = anim.set_target(Point::new(1.0, 2.0)).unwrap_err();
        assert!(matches!(err, AnimationError::TypeMismatch { .. }));
        assert_eq!(anim.target_vector(), &[0.0]);
    }

    #[test]
    fn test_own_timer_ticks_on_interval() {
        let (store, mut anim, clock) = scalar_animation(0.0);
        anim.set_target(100.0).unwrap();
        anim.start().unwrap();

        // Not due yet
        assert_eq!(anim.poll().unwrap(), None);
        clock.advance(FRAME);
        assert_eq!(anim.poll().unwrap(), Some(TickOutcome::Progressed));
        assert_eq!(*store.lock(), 26.0);
        assert_eq!(anim.poll().unwrap(), None);

        let mut frames = 1;
        loop {
            clock.advance(FRAME);
            frames += 1;
            if anim.poll().unwrap() == Some(TickOutcome::Finished) {
                break;
            }
            assert!(frames < 100);
        }
        assert_eq!(*store.lock(), 100.0);
        assert_eq!(anim.poll().unwrap(), None);
    }

    #[test]
    fn test_deferred_start_fires_after_delay() {
        let (_, mut anim, clock) = scalar_animation(0.0);
        anim.set_target(10.0).unwrap();
        anim.start_after(Duration::from_millis(100));
        assert_eq!(anim.pending_action(), Some(DeferredAction::Start));

        clock.advance(Duration::from_millis(50));
        anim.poll().unwrap();
        assert!(!anim.is_running());

        clock.advance(Duration::from_millis(50));
        anim.poll().unwrap();
        assert!(anim.is_running());
        assert_eq!(anim.pending_action(), None);
    }

    #[test]
    fn test_direct_stop_cancels_deferred_start() {
        let (_, mut anim, clock) = scalar_animation(0.0);
        anim.set_target(10.0).unwrap();
        anim.start_after(Duration::from_millis(100));
        anim.stop();
        assert_eq!(anim.pending_action(), None);

        clock.advance(Duration::from_secs(1));
        anim.poll().unwrap();
        assert!(!anim.is_running());
    }

    #[test]
    fn test_direct_start_cancels_deferred_stop() {
        let (_, mut anim, clock) = scalar_animation(0.0);
        anim.set_target(1000.0).unwrap();
        anim.start().unwrap();
        anim.stop_after(Duration::from_millis(20));
        anim.start().unwrap();
        assert_eq!(anim.pending_action(), None);

        clock.advance(Duration::from_millis(40));
        anim.poll().unwrap();
        assert!(anim.is_running());
    }

    #[test]
    fn test_deferred_stop() {
        let (_, mut anim, clock) = scalar_animation(0.0);
        anim.set_target(1000.0).unwrap();
        anim.start().unwrap();
        anim.stop_after(Duration::from_millis(20));

        clock.advance(Duration::from_millis(20));
        anim.poll().unwrap();
        assert!(!anim.is_running());
    }

    #[test]
    fn test_owner_failure_stops_animation() {
        let prop = property(
            "value",
            || Ok(PropertyValue::Scalar(0.0)),
            |_| Err(PropertyError::OwnerDropped),
        );
        let mut anim = ConvergeAnimation::new(prop, ConvergeConfig::default()).unwrap();
        anim.set_target(10.0).unwrap();
        anim.start().unwrap();

        let err = anim.tick().unwrap_err();
        assert!(matches!(
            err,
            AnimationError::Property(PropertyError::OwnerDropped)
        ));
        assert!(!anim.is_running());
    }

    #[test]
    fn test_integer_property_lands_exactly() {
        let store = Arc::new(Mutex::new(0i64));
        let (read, write) = (store.clone(), store.clone());
        let prop = property(
            "offset",
            move || Ok(PropertyValue::Integer(*read.lock())),
            move |value| {
                *write.lock() = i64::try_from(value)?;
                Ok(())
            },
        );
        let mut anim = ConvergeAnimation::new(prop, ConvergeConfig::default()).unwrap();
        anim.set_target(PropertyValue::Integer(-37)).unwrap();
        anim.start().unwrap();
        while anim.tick().unwrap() == TickOutcome::Progressed {}

        assert_eq!(*store.lock(), -37);
        assert_eq!(anim.current_value().unwrap(), PropertyValue::Integer(-37));
    }
}
