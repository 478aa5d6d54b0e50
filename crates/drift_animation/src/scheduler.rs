//! Animation scheduler
//!
//! Owns the registry of scheduler-driven animations and ticks them all from one
//! shared periodic timer. Each tick runs in three phases:
//!
//! 1. **Prepare** (serial): run due deferred actions and snapshot step inputs
//! 2. **Compute**: pure step math, fanned out to the worker pool when enough
//!    animations are running
//! 3. **Apply** (serial): write owners on the calling thread, then notify
//!    listeners with the animation unlocked
//!
//! Every step result is joined before the first owner is written. A failure in
//! one animation stops it and drops it from the registry; the others carry on.
//!
//! The shared ticker only runs while the registry is non-empty.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rayon::prelude::*;
use slotmap::{new_key_type, SlotMap};

use crate::animation::{ConvergeAnimation, SharedAnimation, TickOutcome};
use crate::clock::{PeriodicTimer, SharedClock, SystemClock};
use crate::config::{validate_interval, SchedulerSettings, DEFAULT_TICK_INTERVAL};
use crate::error::{AnimationError, Result};
use crate::stepper::{compute_step_isolated, StepInput, StepOutput};

new_key_type! {
    pub struct AnimationId;
}

/// What happened during one shared tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Animations that moved but have not landed yet
    pub progressed: usize,
    /// Animations that landed on their target and left the registry
    pub finished: Vec<AnimationId>,
    /// Animations that failed and were dropped from the registry
    pub failed: Vec<AnimationId>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.progressed == 0 && self.finished.is_empty() && self.failed.is_empty()
    }
}

struct Registry {
    animations: SlotMap<AnimationId, SharedAnimation>,
    ticker: PeriodicTimer,
}

impl Registry {
    fn find(&self, animation: &SharedAnimation) -> Option<AnimationId> {
        self.animations
            .iter()
            .find(|(_, registered)| Arc::ptr_eq(registered, animation))
            .map(|(id, _)| id)
    }

    fn insert(&mut self, animation: SharedAnimation, now: Duration) -> AnimationId {
        if let Some(id) = self.find(&animation) {
            return id;
        }
        let id = self.animations.insert(animation);
        if !self.ticker.is_armed() {
            self.ticker.arm(now);
            tracing::debug!("shared ticker started");
        }
        id
    }

    fn remove(&mut self, id: AnimationId) -> Option<SharedAnimation> {
        let removed = self.animations.remove(id);
        self.disarm_if_empty();
        removed
    }

    fn disarm_if_empty(&mut self) {
        if self.animations.is_empty() && self.ticker.is_armed() {
            self.ticker.disarm();
            tracing::debug!("shared ticker stopped");
        }
    }
}

/// Attach an animation to a registry and start it
///
/// Animations with a pending deferred action are left for the scheduler to
/// start or stop when the action comes due.
fn register(
    registry: &Mutex<Registry>,
    clock: &SharedClock,
    animation: SharedAnimation,
) -> Result<AnimationId> {
    {
        let mut anim = animation.lock();
        if anim.pending_action().is_none() {
            anim.start()?;
        }
        anim.attach(clock.clone());
    }
    let id = registry.lock().insert(animation, clock.now());
    Ok(id)
}

fn unregister(registry: &Mutex<Registry>, id: AnimationId) -> Option<SharedAnimation> {
    let removed = registry.lock().remove(id)?;
    removed.lock().detach();
    Some(removed)
}

/// The scheduler that ticks all registered animations
pub struct AnimationScheduler {
    registry: Arc<Mutex<Registry>>,
    clock: SharedClock,
    pool: Option<rayon::ThreadPool>,
    parallel_threshold: usize,
}

impl AnimationScheduler {
    /// Serial scheduler on the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    /// Serial scheduler on a specific clock
    pub fn with_clock(clock: SharedClock) -> Self {
        let defaults = SchedulerSettings::default();
        Self {
            registry: Arc::new(Mutex::new(Registry {
                animations: SlotMap::with_key(),
                ticker: PeriodicTimer::new(DEFAULT_TICK_INTERVAL),
            })),
            clock,
            pool: None,
            parallel_threshold: defaults.parallel_threshold,
        }
    }

    /// Build a scheduler from the `[scheduler]` config section
    pub fn from_settings(settings: &SchedulerSettings, clock: SharedClock) -> Result<Self> {
        let mut scheduler = Self::with_clock(clock);
        scheduler.set_tick_interval(settings.tick_interval()?)?;
        scheduler.parallel_threshold = settings.parallel_threshold;
        if settings.worker_threads > 0 {
            scheduler = scheduler.with_workers(settings.worker_threads)?;
        }
        Ok(scheduler)
    }

    /// Builder: compute steps on a pool of `threads` workers
    pub fn with_workers(mut self, threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("drift-step-{i}"))
            .build()?;
        self.pool = Some(pool);
        Ok(self)
    }

    /// Minimum number of stepping animations before the pool is used
    pub fn set_parallel_threshold(&mut self, threshold: usize) {
        self.parallel_threshold = threshold;
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub fn worker_threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(0, rayon::ThreadPool::current_num_threads)
    }

    pub fn set_tick_interval(&mut self, interval: Duration) -> Result<()> {
        let interval = validate_interval(interval)?;
        self.registry.lock().ticker.set_interval(interval);
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        self.registry.lock().ticker.interval()
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Weak handle for registering animations from callbacks
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            registry: Arc::downgrade(&self.registry),
            clock: self.clock.clone(),
        }
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Register and start an animation
    ///
    /// Adding an animation that is already registered returns its existing id.
    pub fn add(&self, animation: SharedAnimation) -> Result<AnimationId> {
        let id = register(&self.registry, &self.clock, animation)?;
        tracing::trace!(id = ?id, "animation added");
        Ok(id)
    }

    /// Stop and unregister an animation
    pub fn remove(&self, id: AnimationId) -> Option<SharedAnimation> {
        unregister(&self.registry, id)
    }

    pub fn get(&self, id: AnimationId) -> Option<SharedAnimation> {
        self.registry.lock().animations.get(id).cloned()
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.registry.lock().animations.contains_key(id)
    }

    /// Id of a registered animation
    pub fn id_of(&self, animation: &SharedAnimation) -> Option<AnimationId> {
        self.registry.lock().find(animation)
    }

    /// Number of registered animations
    pub fn len(&self) -> usize {
        self.registry.lock().animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().animations.is_empty()
    }

    /// Whether the shared ticker is running
    pub fn is_ticking(&self) -> bool {
        self.registry.lock().ticker.is_armed()
    }

    /// Check if any registered animation is running
    pub fn has_active_animations(&self) -> bool {
        self.snapshot()
            .iter()
            .any(|(_, animation)| animation.lock().is_running())
    }

    /// Stop and unregister everything
    pub fn clear(&self) {
        let drained: Vec<SharedAnimation> = {
            let mut registry = self.registry.lock();
            let drained = registry.animations.drain().map(|(_, a)| a).collect();
            registry.disarm_if_empty();
            drained
        };
        for animation in drained {
            animation.lock().detach();
        }
    }

    // ========================================================================
    // Ticking
    // ========================================================================

    /// Drive the scheduler from the host event loop
    ///
    /// Ticks once if the shared ticker has fired since the last poll.
    pub fn poll(&self) -> Option<TickReport> {
        let now = self.clock.now();
        let due = self.registry.lock().ticker.fire_due(now);
        due.then(|| self.tick())
    }

    /// Tick every registered animation once
    pub fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::default();
        let mut settled = Vec::new();

        // Prepare
        let mut jobs: Vec<(AnimationId, SharedAnimation, StepInput)> = Vec::new();
        for (id, animation) in self.snapshot() {
            let prepared = {
                let mut anim = animation.lock();
                anim.poll_deferred(now)
                    .map(|()| (anim.prepare_step(), anim.is_settled()))
            };
            match prepared {
                Ok((Some(input), _)) => jobs.push((id, animation, input)),
                Ok((None, true)) => settled.push(id),
                Ok((None, false)) => {}
                Err(err) => self.fail(id, &animation, &err, &mut report),
            }
        }

        // Compute
        let outputs = self.compute(&jobs);

        // Apply
        for ((id, animation, _), output) in jobs.into_iter().zip(outputs) {
            if !self.contains(id) {
                // Removed by an earlier listener this tick
                continue;
            }
            let applied = output.and_then(|output| animation.lock().apply_step(output));
            if applied.is_ok() {
                ConvergeAnimation::dispatch_events(&animation);
            }
            match applied {
                Ok(TickOutcome::Progressed) => report.progressed += 1,
                Ok(TickOutcome::Finished) => {
                    report.finished.push(id);
                    if animation.lock().is_settled() {
                        settled.push(id);
                    }
                }
                Ok(TickOutcome::Idle) => {}
                Err(err) => self.fail(id, &animation, &err, &mut report),
            }
        }

        for id in settled {
            self.remove(id);
        }
        self.registry.lock().disarm_if_empty();
        report
    }

    fn compute(&self, jobs: &[(AnimationId, SharedAnimation, StepInput)]) -> Vec<Result<StepOutput>> {
        match &self.pool {
            Some(pool) if jobs.len() >= self.parallel_threshold.max(1) => pool.install(|| {
                jobs.par_iter()
                    .map(|(_, _, input)| compute_step_isolated(input))
                    .collect()
            }),
            _ => jobs
                .iter()
                .map(|(_, _, input)| compute_step_isolated(input))
                .collect(),
        }
    }

    fn fail(
        &self,
        id: AnimationId,
        animation: &SharedAnimation,
        err: &AnimationError,
        report: &mut TickReport,
    ) {
        let property = animation.lock().property_name().to_string();
        tracing::error!(id = ?id, property = %property, error = %err, "dropping failed animation");
        self.remove(id);
        report.failed.push(id);
    }

    fn snapshot(&self) -> Vec<(AnimationId, SharedAnimation)> {
        self.registry
            .lock()
            .animations
            .iter()
            .map(|(id, animation)| (id, animation.clone()))
            .collect()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("animations", &self.len())
            .field("ticking", &self.is_ticking())
            .field("worker_threads", &self.worker_threads())
            .field("parallel_threshold", &self.parallel_threshold)
            .finish()
    }
}

/// Weak handle to an [`AnimationScheduler`]
///
/// Safe to hold in listeners and widget state; it does not keep the scheduler
/// alive.
#[derive(Clone)]
pub struct SchedulerHandle {
    registry: Weak<Mutex<Registry>>,
    clock: SharedClock,
}

impl SchedulerHandle {
    fn registry(&self) -> Result<Arc<Mutex<Registry>>> {
        self.registry.upgrade().ok_or(AnimationError::SchedulerDropped)
    }

    /// Register and start an animation
    pub fn add(&self, animation: SharedAnimation) -> Result<AnimationId> {
        let registry = self.registry()?;
        register(&registry, &self.clock, animation)
    }

    /// Stop and unregister an animation
    pub fn remove(&self, id: AnimationId) -> Result<Option<SharedAnimation>> {
        let registry = self.registry()?;
        Ok(unregister(&registry, id))
    }

    pub fn contains(&self, id: AnimationId) -> Result<bool> {
        Ok(self.registry()?.lock().animations.contains_key(id))
    }

    pub fn is_alive(&self) -> bool {
        self.registry.strong_count() > 0
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
