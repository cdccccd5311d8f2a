//! Core types for the Motor Screen engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: raw samples, target shapes, per-task results and the composite
//! risk assessment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three screening tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Trace a horizontal line
    Line,
    /// Trace a square outline
    Square,
    /// Click moving targets
    Target,
}

impl TaskKind {
    /// All task kinds in presentation order
    pub const ALL: [TaskKind; 3] = [TaskKind::Line, TaskKind::Square, TaskKind::Target];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Line => "line",
            TaskKind::Square => "square",
            TaskKind::Target => "target",
        }
    }

    /// Whether the task is scored from a drawn trajectory
    pub fn is_trajectory(&self) -> bool {
        matches!(self, TaskKind::Line | TaskKind::Square)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            TaskKind::Line => 0,
            TaskKind::Square => 1,
            TaskKind::Target => 2,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cursor position and the elapsed seconds since task start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }
}

/// Reference shape a trajectory is compared against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TargetShape {
    /// Horizontal segment at a fixed `y`
    Line { y: f64, x_start: f64, x_end: f64 },
    /// Axis-aligned square outline given by its corners
    Square {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
}

impl TargetShape {
    /// Square outline centred on `(cx, cy)` with the given side length
    pub fn square_centered(cx: f64, cy: f64, side: f64) -> Self {
        let half = side / 2.0;
        TargetShape::Square {
            left: cx - half,
            top: cy - half,
            right: cx + half,
            bottom: cy + half,
        }
    }
}

/// Pointer gesture phase for trajectory tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Press,
    Move,
    Release,
}

/// Result of a line or square tracing task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResult {
    /// Mean squared deviation from the reference shape (px²)
    pub mse: f64,
    /// Seconds between first and last sample
    pub time_taken: f64,
    /// Jerk-based smoothness (0-10, higher is smoother)
    pub smoothness: f64,
}

/// Result of the moving-target task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetResult {
    /// Mean reaction time in seconds, absent when no target was hit
    pub avg_time: Option<f64>,
    /// Population standard deviation of reaction times
    pub std_dev: f64,
    /// Timed-out trials plus miss-clicks
    pub missed: u32,
}

/// Per-task result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskResult {
    Line(TrajectoryResult),
    Square(TrajectoryResult),
    Target(TargetResult),
}

impl TaskResult {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskResult::Line(_) => TaskKind::Line,
            TaskResult::Square(_) => TaskKind::Square,
            TaskResult::Target(_) => TaskKind::Target,
        }
    }

    /// Whether the result can take part in the composite score
    pub fn is_scorable(&self) -> bool {
        match self {
            TaskResult::Target(t) => t.avg_time.is_some(),
            _ => true,
        }
    }

    pub fn as_trajectory(&self) -> Option<&TrajectoryResult> {
        match self {
            TaskResult::Line(r) | TaskResult::Square(r) => Some(r),
            TaskResult::Target(_) => None,
        }
    }

    pub fn as_target(&self) -> Option<&TargetResult> {
        match self {
            TaskResult::Target(r) => Some(r),
            _ => None,
        }
    }
}

/// Progress of a single task within the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    /// The last attempt could not be scored
    Invalid,
}

/// Categorical risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Moderate => "Moderate",
            RiskTier::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Composite risk score with its tier and per-task contributions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Composite score (0-10)
    pub score: f64,
    pub tier: RiskTier,
    /// Line sub-score (0-5)
    pub line_score: f64,
    /// Square sub-score (0-5)
    pub square_score: f64,
    /// Target sub-score (0-5)
    pub target_score: f64,
}

/// Producer metadata carried by every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One task's entry in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTask {
    pub task: TaskKind,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
}

/// Versioned screening report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub tasks: Vec<ReportTask>,
    /// Present once all three tasks hold scorable results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
    /// Tasks still lacking a scorable result
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<TaskKind>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub disclaimer: String,
}

/// Lifecycle state of one spawned target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialState {
    Active,
    Hit,
    Missed,
}

/// One spawned target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetTrial {
    /// Zero-based trial number within the session
    pub index: u32,
    pub center: (f64, f64),
    /// Engine time (seconds) at which the target appeared
    pub appear_time: f64,
    /// Displacement per move tick
    pub velocity: (f64, f64),
    pub state: TrialState,
}
