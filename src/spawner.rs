//! Moving-target trial sequencing
//!
//! Each trial goes `Spawning -> Moving -> Hit | TimedOut`, followed by a short
//! display hold before the next spawn. The session ends once the configured
//! number of trials has completed.
//!
//! Timers are armed on a shared [`TimerQueue`] with the spawner's current
//! generation token. Ending a trial (hit, timeout, cancel) moves the spawner to
//! a fresh token, so any timer still carrying the old one is ignored on fire.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::metrics::ReactionMetrics;
use crate::timer::{ScheduledTimer, TimerKind, TimerQueue};
use crate::types::{TargetResult, TargetTrial, TrialState};

/// Result of a click on the play surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// No target was moving
    Ignored,
    /// Click landed within the hit radius
    Hit { trial: TargetTrial, reaction_time: f64 },
    /// Click missed the moving target; the trial continues
    Miss { distance: f64 },
}

/// Notable transitions produced by timers
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnerEvent {
    Spawned(TargetTrial),
    TimedOut(TargetTrial),
    /// All trials are done; `avg_time` is absent when nothing was hit
    Finished(TargetResult),
}

/// Target lifecycle driver for one target-task session
#[derive(Debug, Clone)]
pub struct TargetSpawner {
    config: EngineConfig,
    current: Option<TargetTrial>,
    generation: u64,
    completed: u32,
    hits: u32,
    timeouts: u32,
    miss_clicks: u32,
    reactions: Vec<f64>,
    finished: bool,
}

impl TargetSpawner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            current: None,
            generation: 0,
            completed: 0,
            hits: 0,
            timeouts: 0,
            miss_clicks: 0,
            reactions: Vec::new(),
            finished: false,
        }
    }

    /// Reset counters and arm the first spawn after the spawn delay
    pub fn start(&mut self, now: f64, queue: &mut TimerQueue) {
        self.cancel(queue);
        self.completed = 0;
        self.hits = 0;
        self.timeouts = 0;
        self.miss_clicks = 0;
        self.reactions.clear();
        self.finished = false;

        let due = now + ms_to_secs(self.config.spawn_delay_ms);
        queue.schedule(due, TimerKind::Spawn, self.generation);
        debug!(due, trials = self.config.trial_count, "target session armed");
    }

    /// Drop the active trial and invalidate every timer armed for it
    pub fn cancel(&mut self, queue: &mut TimerQueue) {
        queue.cancel_generation(self.generation);
        self.generation = queue.next_generation();
        self.current = None;
    }

    /// Handle a fired timer
    ///
    /// Timers armed under an older generation are ignored.
    pub fn on_timer<R: Rng>(
        &mut self,
        timer: ScheduledTimer,
        queue: &mut TimerQueue,
        rng: &mut R,
    ) -> Option<SpawnerEvent> {
        if timer.generation != self.generation || self.finished {
            trace!(
                kind = ?timer.kind,
                generation = timer.generation,
                live = self.generation,
                "stale timer ignored"
            );
            return None;
        }

        match timer.kind {
            TimerKind::Spawn => {
                if self.completed >= self.config.trial_count {
                    return Some(self.finish());
                }
                Some(SpawnerEvent::Spawned(self.spawn(timer.due, queue, rng)))
            }
            TimerKind::Move => {
                self.step();
                if self.is_moving() {
                    let due = timer.due + ms_to_secs(self.config.tick_interval_ms);
                    queue.schedule(due, TimerKind::Move, self.generation);
                }
                None
            }
            TimerKind::Timeout => {
                let mut trial = self.current.filter(|t| t.state == TrialState::Active)?;
                trial.state = TrialState::Missed;
                self.current = Some(trial);
                self.timeouts += 1;
                self.completed += 1;
                debug!(trial = trial.index, "target timed out");

                self.arm_hold(timer.due + ms_to_secs(self.config.miss_hold_ms), queue);
                Some(SpawnerEvent::TimedOut(trial))
            }
        }
    }

    /// Hit-test a click at engine time `now`
    pub fn click(&mut self, x: f64, y: f64, now: f64, queue: &mut TimerQueue) -> ClickOutcome {
        let mut trial = match self.current {
            Some(t) if t.state == TrialState::Active => t,
            _ => return ClickOutcome::Ignored,
        };

        let distance = (x - trial.center.0).hypot(y - trial.center.1);
        if distance > self.config.hit_radius() {
            self.miss_clicks += 1;
            debug!(trial = trial.index, distance, "miss-click");
            return ClickOutcome::Miss { distance };
        }

        let reaction_time = now - trial.appear_time;
        trial.state = TrialState::Hit;
        self.current = Some(trial);
        self.reactions.push(reaction_time);
        self.hits += 1;
        self.completed += 1;
        debug!(trial = trial.index, reaction_time, "target hit");

        self.arm_hold(now + ms_to_secs(self.config.hit_hold_ms), queue);
        ClickOutcome::Hit {
            trial,
            reaction_time,
        }
    }

    /// The trial currently on screen (active or in its display hold)
    pub fn current(&self) -> Option<&TargetTrial> {
        self.current.as_ref()
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.current, Some(t) if t.state == TrialState::Active)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn completed_trials(&self) -> u32 {
        self.completed
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    /// Timed-out trials plus miss-clicks
    pub fn missed(&self) -> u32 {
        self.timeouts + self.miss_clicks
    }

    pub fn reactions(&self) -> &[f64] {
        &self.reactions
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn spawn<R: Rng>(&mut self, now: f64, queue: &mut TimerQueue, rng: &mut R) -> TargetTrial {
        let cfg = &self.config;
        let x = random_coordinate(rng, cfg.spawn_padding_x, cfg.surface_width - cfg.spawn_padding_x);
        let y = random_coordinate(rng, cfg.spawn_padding_y, cfg.surface_height - cfg.spawn_padding_y);

        let speed = cfg.speed as f64;
        let dx = if rng.random_bool(0.5) { speed } else { -speed };
        let dy = if rng.random_bool(0.5) { speed } else { -speed };

        let trial = TargetTrial {
            index: self.completed,
            center: (x, y),
            appear_time: now,
            velocity: (dx, dy),
            state: TrialState::Active,
        };
        self.current = Some(trial);
        self.generation = queue.next_generation();

        queue.schedule(
            now + ms_to_secs(cfg.tick_interval_ms),
            TimerKind::Move,
            self.generation,
        );
        queue.schedule(now + ms_to_secs(cfg.timeout_ms()), TimerKind::Timeout, self.generation);
        debug!(trial = trial.index, x, y, dx, dy, "target spawned");
        trial
    }

    /// Advance the active target one step, reflecting off the surface edges
    fn step(&mut self) {
        let radius = self.config.target_radius;
        let (width, height) = (self.config.surface_width, self.config.surface_height);

        if let Some(trial) = self.current.as_mut().filter(|t| t.state == TrialState::Active) {
            let (x, y) = trial.center;
            if x - radius <= 0.0 || x + radius >= width {
                trial.velocity.0 = -trial.velocity.0;
            }
            if y - radius <= 0.0 || y + radius >= height {
                trial.velocity.1 = -trial.velocity.1;
            }
            trial.center = (x + trial.velocity.0, y + trial.velocity.1);
        }
    }

    /// Retire the trial's timers and arm the post-trial hold
    fn arm_hold(&mut self, due: f64, queue: &mut TimerQueue) {
        queue.cancel_generation(self.generation);
        self.generation = queue.next_generation();
        queue.schedule(due, TimerKind::Spawn, self.generation);
    }

    fn finish(&mut self) -> SpawnerEvent {
        self.finished = true;
        self.current = None;
        let missed = self.missed();
        let result = ReactionMetrics::analyze(&self.reactions, missed)
            .unwrap_or_else(|_| ReactionMetrics::without_hits(missed));
        debug!(hits = self.hits, missed, "target session finished");
        SpawnerEvent::Finished(result)
    }
}

fn random_coordinate<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    let (low, high) = (low.ceil() as i64, high.floor() as i64);
    if high <= low {
        return low as f64;
    }
    rng.random_range(low..=high) as f64
}

fn ms_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
