//! Per-task recording state machine
//!
//! `Idle -> Active -> Completed | Invalid`. Trajectory tasks buffer pointer
//! samples while the pointer is held and are scored on release; the target
//! task is completed by the spawner.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_finite, AssessError};
use crate::metrics::{TrajectoryMetrics, MIN_TRAJECTORY_SAMPLES};
use crate::types::{PointerPhase, Sample, TargetShape, TaskKind, TrajectoryResult};

/// Phase of a task attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Active,
    Completed,
    Invalid,
}

/// What a pointer event did to the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PointerOutcome {
    /// Event dropped (pointer not held, or session not active)
    Ignored,
    /// Sample appended to the trajectory
    Recorded,
    /// Release scored the trajectory
    Completed { result: TrajectoryResult },
    /// Release with too few samples
    Invalid { samples: usize },
}

/// One attempt at one task
#[derive(Debug, Clone)]
pub struct TaskSession {
    kind: TaskKind,
    phase: SessionPhase,
    start_time: f64,
    pointer_held: bool,
    samples: Vec<Sample>,
}

impl TaskSession {
    /// A session that has not been started
    pub fn idle(kind: TaskKind) -> Self {
        Self {
            kind,
            phase: SessionPhase::Idle,
            start_time: 0.0,
            pointer_held: false,
            samples: Vec::new(),
        }
    }

    /// Start (or restart) the task with `now` as its time origin
    pub fn start(&mut self, now: f64) {
        self.phase = SessionPhase::Active;
        self.start_time = now;
        self.pointer_held = false;
        self.samples.clear();
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn pointer_held(&self) -> bool {
        self.pointer_held
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Recorded trajectory so far
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Feed a pointer event to a trajectory task
    ///
    /// A press arms recording and records the press point, moves record while
    /// armed, and a release ends the attempt. Nothing is recorded outside the
    /// Active phase.
    pub fn handle_pointer(
        &mut self,
        phase: PointerPhase,
        x: f64,
        y: f64,
        now: f64,
        shape: &TargetShape,
        smoothness_decay: f64,
    ) -> Result<PointerOutcome, AssessError> {
        if !self.is_active() || !self.kind.is_trajectory() {
            return Ok(PointerOutcome::Ignored);
        }

        match phase {
            PointerPhase::Press => {
                self.pointer_held = true;
                self.record_sample(x, y, now)?;
                Ok(PointerOutcome::Recorded)
            }
            PointerPhase::Move => {
                if !self.pointer_held {
                    return Ok(PointerOutcome::Ignored);
                }
                self.record_sample(x, y, now)?;
                Ok(PointerOutcome::Recorded)
            }
            PointerPhase::Release => {
                if !self.pointer_held {
                    return Ok(PointerOutcome::Ignored);
                }
                self.pointer_held = false;
                Ok(self.end(shape, smoothness_decay))
            }
        }
    }

    /// Append a sample at engine time `now`
    ///
    /// Rejects non-finite input and samples whose relative time would precede
    /// the previous one; the buffer is left untouched in both cases.
    pub fn record_sample(&mut self, x: f64, y: f64, now: f64) -> Result<(), AssessError> {
        let x = ensure_finite("x", x)?;
        let y = ensure_finite("y", y)?;
        let t = ensure_finite("t", now - self.start_time)?;
        let previous = self.samples.last().map(|s| s.t).unwrap_or(0.0);
        if t < previous {
            return Err(AssessError::NonMonotonicTimestamp { previous, t });
        }
        self.samples.push(Sample::new(x, y, t));
        Ok(())
    }

    /// Score the buffered trajectory and close the attempt
    pub fn end(&mut self, shape: &TargetShape, smoothness_decay: f64) -> PointerOutcome {
        match TrajectoryMetrics::analyze(&self.samples, shape, smoothness_decay) {
            Ok(result) => {
                self.phase = SessionPhase::Completed;
                debug!(task = %self.kind, samples = self.samples.len(), "trajectory scored");
                PointerOutcome::Completed { result }
            }
            Err(_) => {
                self.phase = SessionPhase::Invalid;
                debug!(
                    task = %self.kind,
                    samples = self.samples.len(),
                    required = MIN_TRAJECTORY_SAMPLES,
                    "trajectory too short"
                );
                PointerOutcome::Invalid {
                    samples: self.samples.len(),
                }
            }
        }
    }

    /// Close the attempt from outside (target task)
    pub fn finish(&mut self, valid: bool) {
        self.pointer_held = false;
        self.phase = if valid {
            SessionPhase::Completed
        } else {
            SessionPhase::Invalid
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECAY: f64 = 50.0;

    fn line() -> TargetShape {
        TargetShape::Line {
            y: 300.0,
            x_start: 100.0,
            x_end: 700.0,
        }
    }

    fn active(kind: TaskKind, now: f64) -> TaskSession {
        let mut session = TaskSession::idle(kind);
        session.start(now);
        session
    }

    fn feed(session: &mut TaskSession, phase: PointerPhase, x: f64, t: f64) -> PointerOutcome {
        session
            .handle_pointer(phase, x, 300.0, t, &line(), DECAY)
            .unwrap()
    }

    #[test]
    fn test_idle_session_ignores_pointer() {
        let mut session = TaskSession::idle(TaskKind::Line);
        assert_eq!(feed(&mut session, PointerPhase::Press, 100.0, 0.0), PointerOutcome::Ignored);
        assert!(session.samples().is_empty());
    }

    #[test]
    fn test_moves_before_press_are_dropped() {
        let mut session = active(TaskKind::Line, 10.0);
        assert_eq!(feed(&mut session, PointerPhase::Move, 100.0, 10.1), PointerOutcome::Ignored);
        assert_eq!(feed(&mut session, PointerPhase::Press, 100.0, 10.2), PointerOutcome::Recorded);
        assert_eq!(session.samples().len(), 1);
        assert!((session.samples()[0].t - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_release_scores_trajectory() {
        let mut session = active(TaskKind::Line, 0.0);
        feed(&mut session, PointerPhase::Press, 100.0, 0.0);
        feed(&mut session, PointerPhase::Move, 300.0, 0.5);
        feed(&mut session, PointerPhase::Move, 500.0, 1.0);

        match feed(&mut session, PointerPhase::Release, 500.0, 1.0) {
            PointerOutcome::Completed { result } => {
                assert_eq!(result.mse, 0.0);
                assert_eq!(result.smoothness, 10.0);
                assert_eq!(result.time_taken, 1.0);
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(session.phase(), SessionPhase::Completed);
    }

    #[test]
    fn test_release_with_too_few_samples_is_invalid() {
        let mut session = active(TaskKind::Square, 0.0);
        feed(&mut session, PointerPhase::Press, 100.0, 0.0);
        feed(&mut session, PointerPhase::Move, 110.0, 0.1);
        assert_eq!(
            feed(&mut session, PointerPhase::Release, 110.0, 0.2),
            PointerOutcome::Invalid { samples: 2 }
        );
        assert_eq!(session.phase(), SessionPhase::Invalid);
    }

    #[test]
    fn test_events_after_completion_are_dropped() {
        let mut session = active(TaskKind::Line, 0.0);
        feed(&mut session, PointerPhase::Press, 100.0, 0.0);
        feed(&mut session, PointerPhase::Release, 100.0, 0.1);
        assert_eq!(feed(&mut session, PointerPhase::Press, 100.0, 0.2), PointerOutcome::Ignored);
        assert_eq!(session.samples().len(), 1);
    }

    #[test]
    fn test_restart_clears_buffer() {
        let mut session = active(TaskKind::Line, 0.0);
        feed(&mut session, PointerPhase::Press, 100.0, 0.0);
        feed(&mut session, PointerPhase::Release, 100.0, 0.1);
        assert_eq!(session.phase(), SessionPhase::Invalid);

        session.start(5.0);
        assert!(session.is_active());
        assert!(session.samples().is_empty());
        assert!(!session.pointer_held());
    }

    #[test]
    fn test_backwards_timestamp_is_rejected() {
        let mut session = active(TaskKind::Line, 0.0);
        feed(&mut session, PointerPhase::Press, 100.0, 1.0);
        let result = session.handle_pointer(PointerPhase::Move, 110.0, 300.0, 0.5, &line(), DECAY);
        assert!(matches!(result, Err(AssessError::NonMonotonicTimestamp { .. })));
        assert_eq!(session.samples().len(), 1);
    }

    #[test]
    fn test_non_finite_sample_is_rejected() {
        let mut session = active(TaskKind::Line, 0.0);
        feed(&mut session, PointerPhase::Press, 100.0, 0.0);

        let result = session.handle_pointer(PointerPhase::Move, f64::NAN, 300.0, 0.1, &line(), DECAY);
        assert!(matches!(result, Err(AssessError::NonFiniteInput { field: "x", .. })));
        let result = session.handle_pointer(PointerPhase::Move, 200.0, 300.0, f64::INFINITY, &line(), DECAY);
        assert!(matches!(result, Err(AssessError::NonFiniteInput { field: "t", .. })));
        assert_eq!(session.samples().len(), 1);

        feed(&mut session, PointerPhase::Move, 300.0, 0.2);
        feed(&mut session, PointerPhase::Move, 400.0, 0.3);
        match feed(&mut session, PointerPhase::Release, 400.0, 0.3) {
            PointerOutcome::Completed { result } => assert!(result.smoothness.is_finite()),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_target_session_ignores_pointer() {
        let mut session = active(TaskKind::Target, 0.0);
        assert_eq!(feed(&mut session, PointerPhase::Press, 100.0, 0.1), PointerOutcome::Ignored);
        session.finish(true);
        assert_eq!(session.phase(), SessionPhase::Completed);
    }
}
