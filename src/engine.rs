//! Screening engine
//!
//! This module provides the public API for driving a screening session. It
//! owns the session state, the active task attempt, the target spawner, the
//! timer queue and the notification buffer, and routes pointer, click and
//! timer events between them on a single synchronous control path.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{ensure_finite, AssessError};
use crate::session::{PointerOutcome, TaskSession};
use crate::spawner::{ClickOutcome, SpawnerEvent, TargetSpawner};
use crate::state::SessionState;
use crate::timer::TimerQueue;
use crate::types::{
    PointerPhase, RiskAssessment, Sample, TargetShape, TargetTrial, TaskKind, TaskResult,
    TaskStatus,
};

/// State-change notification for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    TaskStarted { task: TaskKind },
    TaskCompleted { task: TaskKind, result: TaskResult },
    TaskInvalid { task: TaskKind, reason: String },
    TargetSpawned { trial: TargetTrial },
    TargetHit { trial: TargetTrial, reaction_time: f64 },
    MissClick { x: f64, y: f64, distance: f64 },
    TargetTimedOut { trial: TargetTrial },
    Cleared,
}

/// Screening engine over an injected random source
pub struct Engine<R: Rng = StdRng> {
    config: EngineConfig,
    rng: R,
    state: SessionState,
    session: Option<TaskSession>,
    spawner: TargetSpawner,
    queue: TimerQueue,
    events: Vec<EngineEvent>,
    /// Latest engine time seen by `start_task`, `tick` or a click
    last_time: f64,
}

impl Engine<StdRng> {
    /// Create an engine; the RNG is seeded from `config.seed` when present
    pub fn new(config: EngineConfig) -> Result<Self, AssessError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Engine<R> {
    pub fn with_rng(config: EngineConfig, rng: R) -> Result<Self, AssessError> {
        config.validate()?;
        Ok(Self {
            spawner: TargetSpawner::new(config.clone()),
            config,
            rng,
            state: SessionState::new(),
            session: None,
            queue: TimerQueue::new(),
            events: Vec::new(),
            last_time: f64::NEG_INFINITY,
        })
    }

    /// Start (or restart) a task at engine time `now`
    ///
    /// Every timer of the previous task is cancelled before the new task arms
    /// its own.
    pub fn start_task(&mut self, kind: TaskKind, now: f64) {
        self.cancel_timers();
        self.advance_to(now);

        let mut session = TaskSession::idle(kind);
        session.start(now);
        self.session = Some(session);
        self.state.begin(kind);

        if kind == TaskKind::Target {
            self.spawner.start(now, &mut self.queue);
        }

        info!(task = %kind, now, "task started");
        self.events.push(EngineEvent::TaskStarted { task: kind });
    }

    /// Drop every result, the active task and all pending timers
    pub fn clear(&mut self) {
        self.cancel_timers();
        self.session = None;
        self.state.reset();
        self.events.clear();
        self.events.push(EngineEvent::Cleared);
        info!("session cleared");
    }

    /// Feed a press / move / release of the tracing tasks
    ///
    /// Events that do not apply to the active task are ignored.
    pub fn feed_pointer_event(
        &mut self,
        phase: PointerPhase,
        x: f64,
        y: f64,
        timestamp: f64,
    ) -> Result<PointerOutcome, AssessError> {
        let kind = match self.session.as_ref() {
            Some(s) if s.is_active() && s.kind().is_trajectory() => s.kind(),
            _ => return Ok(PointerOutcome::Ignored),
        };
        let shape = self.shape_for(kind);
        let decay = self.config.smoothness_decay;

        let outcome = match self.session.as_mut() {
            Some(session) => session.handle_pointer(phase, x, y, timestamp, &shape, decay)?,
            None => return Ok(PointerOutcome::Ignored),
        };

        match &outcome {
            PointerOutcome::Completed { result } => {
                let result = match kind {
                    TaskKind::Square => TaskResult::Square(*result),
                    _ => TaskResult::Line(*result),
                };
                self.complete(result);
            }
            PointerOutcome::Invalid { samples } => {
                let reason = AssessError::InsufficientSamples {
                    required: crate::metrics::MIN_TRAJECTORY_SAMPLES,
                    got: *samples,
                }
                .to_string();
                warn!(task = %kind, samples, "attempt invalid");
                self.state.invalidate(kind);
                self.events.push(EngineEvent::TaskInvalid { task: kind, reason });
            }
            PointerOutcome::Recorded | PointerOutcome::Ignored => {}
        }

        Ok(outcome)
    }

    /// Feed a click of the target task
    ///
    /// Timers due at or before `timestamp` fire first so the click sees the
    /// target where it is at that instant. Non-finite input and clicks stamped
    /// before the latest engine time are rejected.
    pub fn feed_click_event(
        &mut self,
        x: f64,
        y: f64,
        timestamp: f64,
    ) -> Result<ClickOutcome, AssessError> {
        let x = ensure_finite("x", x)?;
        let y = ensure_finite("y", y)?;
        let timestamp = ensure_finite("t", timestamp)?;
        if timestamp < self.last_time {
            return Err(AssessError::NonMonotonicTimestamp {
                previous: self.last_time,
                t: timestamp,
            });
        }
        self.advance_to(timestamp);

        if self.active_task() != Some(TaskKind::Target) {
            return Ok(ClickOutcome::Ignored);
        }
        self.tick(timestamp);
        if self.active_task() != Some(TaskKind::Target) {
            return Ok(ClickOutcome::Ignored);
        }

        let outcome = self.spawner.click(x, y, timestamp, &mut self.queue);
        match &outcome {
            ClickOutcome::Hit {
                trial,
                reaction_time,
            } => self.events.push(EngineEvent::TargetHit {
                trial: *trial,
                reaction_time: *reaction_time,
            }),
            ClickOutcome::Miss { distance } => self.events.push(EngineEvent::MissClick {
                x,
                y,
                distance: *distance,
            }),
            ClickOutcome::Ignored => {}
        }
        Ok(outcome)
    }

    /// Fire every timer due at or before `now`, earliest first
    ///
    /// Returns the number of timers that fired. A non-finite `now` fires
    /// nothing.
    pub fn tick(&mut self, now: f64) -> usize {
        if !now.is_finite() {
            warn!(now, "non-finite tick ignored");
            return 0;
        }
        self.advance_to(now);

        let mut fired = 0;
        while let Some(timer) = self.queue.pop_due(now) {
            fired += 1;
            if self.active_task() != Some(TaskKind::Target) {
                trace!(kind = ?timer.kind, "timer without active target task dropped");
                continue;
            }
            match self.spawner.on_timer(timer, &mut self.queue, &mut self.rng) {
                Some(SpawnerEvent::Spawned(trial)) => {
                    self.events.push(EngineEvent::TargetSpawned { trial })
                }
                Some(SpawnerEvent::TimedOut(trial)) => {
                    self.events.push(EngineEvent::TargetTimedOut { trial })
                }
                Some(SpawnerEvent::Finished(result)) => self.finish_target(result),
                None => {}
            }
        }
        fired
    }

    /// Tick with an injected clock
    pub fn pump<C: Clock + ?Sized>(&mut self, clock: &C) -> usize {
        self.tick(clock.now())
    }

    pub fn get_task_result(&self, kind: TaskKind) -> Option<TaskResult> {
        self.state.result(kind)
    }

    /// Composite assessment, or the list of tasks still missing
    pub fn get_risk_assessment(&self) -> Result<RiskAssessment, AssessError> {
        self.state.assess()
    }

    pub fn task_status(&self, kind: TaskKind) -> TaskStatus {
        self.state.status(kind)
    }

    pub fn missing_tasks(&self) -> Vec<TaskKind> {
        self.state.missing()
    }

    /// Kind of the task currently accepting input
    pub fn active_task(&self) -> Option<TaskKind> {
        self.session
            .as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.kind())
    }

    /// Target on screen during the target task
    pub fn active_target(&self) -> Option<&TargetTrial> {
        if self.active_task() == Some(TaskKind::Target) {
            self.spawner.current()
        } else {
            None
        }
    }

    /// Trajectory recorded so far by the active (or last) tracing attempt
    pub fn current_samples(&self) -> &[Sample] {
        self.session.as_ref().map(|s| s.samples()).unwrap_or(&[])
    }

    /// Engine time of the earliest pending timer
    pub fn next_timer_due(&self) -> Option<f64> {
        self.queue.next_due()
    }

    pub fn pending_timers(&self) -> usize {
        self.queue.len()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Take the notifications produced since the last drain
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Reference shape of a tracing task
    pub fn shape_for(&self, kind: TaskKind) -> TargetShape {
        match kind {
            TaskKind::Square => self.config.geometry.square(),
            _ => self.config.geometry.line(),
        }
    }

    fn complete(&mut self, result: TaskResult) {
        let task = result.kind();
        self.state.complete(result);
        info!(task = %task, "task completed");
        self.events.push(EngineEvent::TaskCompleted { task, result });
    }

    fn finish_target(&mut self, result: crate::types::TargetResult) {
        let valid = result.avg_time.is_some();
        if let Some(session) = self.session.as_mut() {
            session.finish(valid);
        }
        self.queue.cancel_all();

        if valid {
            self.complete(TaskResult::Target(result));
        } else {
            let reason = AssessError::NoSuccessfulReactions {
                missed: result.missed,
            }
            .to_string();
            warn!(missed = result.missed, "target task ended without hits");
            self.state.complete(TaskResult::Target(result));
            self.events.push(EngineEvent::TaskInvalid {
                task: TaskKind::Target,
                reason,
            });
        }
    }

    fn advance_to(&mut self, now: f64) {
        if now > self.last_time {
            self.last_time = now;
        }
    }

    fn cancel_timers(&mut self) {
        self.spawner.cancel(&mut self.queue);
        let dropped = self.queue.cancel_all();
        if dropped > 0 {
            debug!(dropped, "pending timers cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::RiskTier;

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            seed: Some(42),
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn trace_line(engine: &mut Engine, start: f64) {
        engine.start_task(TaskKind::Line, start);
        engine
            .feed_pointer_event(PointerPhase::Press, 100.0, 300.0, start)
            .unwrap();
        engine
            .feed_pointer_event(PointerPhase::Move, 300.0, 300.0, start + 0.5)
            .unwrap();
        engine
            .feed_pointer_event(PointerPhase::Move, 500.0, 300.0, start + 1.0)
            .unwrap();
        engine
            .feed_pointer_event(PointerPhase::Release, 500.0, 300.0, start + 1.0)
            .unwrap();
    }

    #[test]
    fn test_line_task_end_to_end() {
        let mut engine = engine();
        trace_line(&mut engine, 10.0);

        let result = engine.get_task_result(TaskKind::Line).unwrap();
        let line = result.as_trajectory().unwrap();
        assert_eq!(line.mse, 0.0);
        assert_eq!(line.smoothness, 10.0);
        assert_eq!(line.time_taken, 1.0);
        assert_eq!(engine.task_status(TaskKind::Line), TaskStatus::Completed);
        assert_eq!(engine.active_task(), None);
    }

    #[test]
    fn test_short_gesture_is_invalid_and_keeps_prior_result() {
        let mut engine = engine();
        trace_line(&mut engine, 0.0);
        let previous = engine.get_task_result(TaskKind::Line);

        engine.start_task(TaskKind::Line, 5.0);
        engine
            .feed_pointer_event(PointerPhase::Press, 100.0, 320.0, 5.0)
            .unwrap();
        engine
            .feed_pointer_event(PointerPhase::Release, 100.0, 320.0, 5.1)
            .unwrap();

        assert_eq!(engine.task_status(TaskKind::Line), TaskStatus::Invalid);
        assert_eq!(engine.get_task_result(TaskKind::Line), previous);
        assert!(engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, EngineEvent::TaskInvalid { task: TaskKind::Line, .. })));
    }

    #[test]
    fn test_pointer_events_ignored_without_task() {
        let mut engine = engine();
        let outcome = engine
            .feed_pointer_event(PointerPhase::Press, 1.0, 2.0, 0.0)
            .unwrap();
        assert_eq!(outcome, PointerOutcome::Ignored);
        assert_eq!(engine.feed_click_event(1.0, 2.0, 0.0).unwrap(), ClickOutcome::Ignored);
    }

    /// Run the target task to the end, clicking each target 0.4 s after it appears
    fn hit_every_target(engine: &mut Engine, start: f64) {
        engine.start_task(TaskKind::Target, start);
        let mut now = start;
        while engine.task_status(TaskKind::Target) == TaskStatus::InProgress {
            now += 0.05;
            engine.tick(now);
            if let Some(trial) = engine.active_target().copied() {
                if trial.state == crate::types::TrialState::Active && now - trial.appear_time >= 0.4 {
                    engine
                        .feed_click_event(trial.center.0, trial.center.1, now)
                        .unwrap();
                }
            }
            assert!(now < start + 50.0, "target task did not finish");
        }
    }

    #[test]
    fn test_target_retake_without_hits_keeps_prior_result() {
        let mut engine = engine();
        hit_every_target(&mut engine, 0.0);
        let previous = engine.get_task_result(TaskKind::Target);
        assert!(previous.and_then(|r| r.as_target().and_then(|t| t.avg_time)).is_some());

        engine.start_task(TaskKind::Target, 100.0);
        engine.tick(200.0);

        assert_eq!(engine.task_status(TaskKind::Target), TaskStatus::Invalid);
        assert_eq!(engine.get_task_result(TaskKind::Target), previous);
        assert!(!engine.missing_tasks().contains(&TaskKind::Target));
        assert_eq!(engine.active_task(), None);
        assert!(engine.drain_events().iter().any(|e| matches!(
            e,
            EngineEvent::TaskInvalid { task: TaskKind::Target, reason } if reason.contains("5 missed")
        )));
    }

    #[test]
    fn test_click_before_engine_time_is_rejected() {
        let mut engine = engine();
        engine.start_task(TaskKind::Target, 0.0);
        engine.tick(0.9);
        let (x, y) = engine.active_target().unwrap().center;

        let result = engine.feed_click_event(x, y, 0.2);
        assert!(matches!(
            result,
            Err(AssessError::NonMonotonicTimestamp { previous, t }) if previous == 0.9 && t == 0.2
        ));
        assert!(engine.active_target().is_some());

        match engine.feed_click_event(x, y, 0.9).unwrap() {
            ClickOutcome::Hit { reaction_time, .. } => assert!((reaction_time - 0.4).abs() < 1e-9),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let mut engine = engine();
        engine.start_task(TaskKind::Line, 0.0);
        engine
            .feed_pointer_event(PointerPhase::Press, 100.0, 300.0, 0.0)
            .unwrap();
        let result = engine.feed_pointer_event(PointerPhase::Move, f64::NAN, 300.0, 0.1);
        assert!(matches!(result, Err(AssessError::NonFiniteInput { field: "x", .. })));
        assert_eq!(engine.current_samples().len(), 1);

        engine
            .feed_pointer_event(PointerPhase::Move, 300.0, 300.0, 0.2)
            .unwrap();
        engine
            .feed_pointer_event(PointerPhase::Move, 400.0, 300.0, 0.3)
            .unwrap();
        engine
            .feed_pointer_event(PointerPhase::Release, 400.0, 300.0, 0.3)
            .unwrap();
        let line = engine.get_task_result(TaskKind::Line).unwrap();
        assert!(line.as_trajectory().unwrap().smoothness.is_finite());

        engine.start_task(TaskKind::Target, 1.0);
        assert!(matches!(
            engine.feed_click_event(f64::INFINITY, 0.0, 1.6),
            Err(AssessError::NonFiniteInput { field: "x", .. })
        ));
        assert!(engine.feed_click_event(400.0, 300.0, f64::NAN).is_err());
        assert_eq!(engine.tick(f64::NAN), 0);
    }

    #[test]
    fn test_assessment_incomplete_lists_missing() {
        let mut engine = engine();
        trace_line(&mut engine, 0.0);
        match engine.get_risk_assessment() {
            Err(AssessError::IncompleteAssessment { missing }) => {
                assert_eq!(missing, vec![TaskKind::Square, TaskKind::Target])
            }
            other => panic!("expected incomplete, got {:?}", other),
        }
    }

    #[test]
    fn test_starting_other_task_cancels_target_timers() {
        let mut engine = engine();
        engine.start_task(TaskKind::Target, 0.0);
        engine.tick(0.6);
        assert!(engine.active_target().is_some());
        assert!(engine.pending_timers() > 0);

        engine.start_task(TaskKind::Square, 0.7);
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(engine.tick(100.0), 0);
        assert!(engine.active_target().is_none());
        assert_eq!(engine.task_status(TaskKind::Target), TaskStatus::NotStarted);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut engine = engine();
        trace_line(&mut engine, 0.0);
        engine.start_task(TaskKind::Target, 2.0);
        engine.tick(2.6);

        engine.clear();
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(engine.get_task_result(TaskKind::Line), None);
        assert_eq!(engine.active_task(), None);
        assert_eq!(engine.missing_tasks().len(), 3);
        assert_eq!(engine.drain_events(), vec![EngineEvent::Cleared]);
        assert_eq!(engine.tick(1000.0), 0);
    }

    #[test]
    fn test_pump_uses_clock() {
        let mut engine = engine();
        let clock = ManualClock::new();
        engine.start_task(TaskKind::Target, clock.now());

        clock.advance_ms(400);
        engine.pump(&clock);
        assert!(engine.active_target().is_none());

        clock.advance_ms(150);
        engine.pump(&clock);
        assert!(engine.active_target().is_some());
    }

    #[test]
    fn test_full_session_assessment() {
        let mut engine = engine();
        trace_line(&mut engine, 0.0);

        engine.start_task(TaskKind::Square, 2.0);
        let outline = [(320.0, 220.0), (400.0, 220.0), (480.0, 220.0), (480.0, 300.0), (480.0, 380.0)];
        for (i, (x, y)) in outline.iter().enumerate() {
            let phase = if i == 0 { PointerPhase::Press } else { PointerPhase::Move };
            engine
                .feed_pointer_event(phase, *x, *y, 2.0 + 0.25 * i as f64)
                .unwrap();
        }
        engine
            .feed_pointer_event(PointerPhase::Release, 480.0, 380.0, 3.0)
            .unwrap();

        hit_every_target(&mut engine, 10.0);

        let assessment = engine.get_risk_assessment().unwrap();
        assert_eq!(assessment.tier, RiskTier::Low);
        let target = engine.get_task_result(TaskKind::Target).unwrap();
        assert_eq!(target.as_target().unwrap().missed, 0);
    }
}
