//! Session-wide result slots
//!
//! Holds one result slot and one status per task plus the active task kind.
//! Slots are only ever written by a completed attempt; an invalid attempt
//! changes the status of its own task and nothing else.

use serde::{Deserialize, Serialize};

use crate::error::AssessError;
use crate::scorer::RiskScorer;
use crate::types::{RiskAssessment, TaskKind, TaskResult, TaskStatus};

/// Results and statuses of the three tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    results: [Option<TaskResult>; 3],
    statuses: [TaskStatus; 3],
    active: Option<TaskKind>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self, kind: TaskKind) -> Option<TaskResult> {
        self.results[kind.index()]
    }

    pub fn status(&self, kind: TaskKind) -> TaskStatus {
        self.statuses[kind.index()]
    }

    pub fn active(&self) -> Option<TaskKind> {
        self.active
    }

    pub(crate) fn begin(&mut self, kind: TaskKind) {
        if let Some(previous) = self.active.take() {
            if previous != kind {
                self.settle(previous);
            }
        }
        self.active = Some(kind);
        self.statuses[kind.index()] = TaskStatus::InProgress;
    }

    /// Store a finished attempt
    ///
    /// A target result without a mean reaction time marks the task Invalid.
    /// It is only stored (for its miss count) when the slot holds no
    /// scorable result; an earlier scorable result is never replaced by it.
    pub(crate) fn complete(&mut self, result: TaskResult) {
        let kind = result.kind();
        let scorable = result.is_scorable();
        let keep_previous = !scorable && self.result(kind).is_some_and(|r| r.is_scorable());
        if !keep_previous {
            self.results[kind.index()] = Some(result);
        }
        self.statuses[kind.index()] = if scorable {
            TaskStatus::Completed
        } else {
            TaskStatus::Invalid
        };
        self.release(kind);
    }

    pub(crate) fn invalidate(&mut self, kind: TaskKind) {
        self.statuses[kind.index()] = TaskStatus::Invalid;
        self.release(kind);
    }

    /// Forget everything
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Tasks without a scorable result, in presentation order
    pub fn missing(&self) -> Vec<TaskKind> {
        TaskKind::ALL
            .iter()
            .copied()
            .filter(|k| !self.result(*k).is_some_and(|r| r.is_scorable()))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Composite assessment over the three slots
    pub fn assess(&self) -> Result<RiskAssessment, AssessError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(AssessError::IncompleteAssessment { missing });
        }

        let line = self.result(TaskKind::Line).and_then(|r| r.as_trajectory().copied());
        let square = self.result(TaskKind::Square).and_then(|r| r.as_trajectory().copied());
        let target = self.result(TaskKind::Target).and_then(|r| r.as_target().copied());

        match (line, square, target) {
            (Some(line), Some(square), Some(target)) => RiskScorer::assess(&line, &square, &target),
            _ => Err(AssessError::IncompleteAssessment {
                missing: self.missing(),
            }),
        }
    }

    fn release(&mut self, kind: TaskKind) {
        if self.active == Some(kind) {
            self.active = None;
        }
    }

    /// Status of a task that is no longer being attempted
    fn settle(&mut self, kind: TaskKind) {
        if self.statuses[kind.index()] != TaskStatus::InProgress {
            return;
        }
        self.statuses[kind.index()] = match self.result(kind) {
            Some(r) if r.is_scorable() => TaskStatus::Completed,
            Some(_) => TaskStatus::Invalid,
            None => TaskStatus::NotStarted,
        };
    }
}
