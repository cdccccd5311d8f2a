//! Motor Screen - On-device motor-control screening engine
//!
//! Motor Screen records three short motor tasks and turns them into a
//! composite risk score through a deterministic pipeline: pointer and click
//! capture → per-task metrics → sub-scores → weighted composite → risk tier.
//!
//! ## Tasks
//!
//! - **Line**: trace a horizontal line; scored on path deviation and smoothness
//! - **Square**: trace a square outline; scored the same way
//! - **Target**: click a moving target over several timed trials; scored on
//!   reaction time and misses
//!
//! All timing goes through an injected clock and a generation-tokened timer
//! queue, so a session can be driven live or replayed from a recorded log.

pub mod clock;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod recommendations;
pub mod schema;
pub mod scorer;
pub mod session;
pub mod spawner;
pub mod state;
pub mod timer;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use encoder::AssessmentEncoder;
pub use engine::{Engine, EngineEvent};
pub use error::AssessError;
pub use metrics::{ReactionMetrics, TrajectoryMetrics};
pub use scorer::RiskScorer;
pub use session::{PointerOutcome, TaskSession};
pub use spawner::{ClickOutcome, TargetSpawner};
pub use state::SessionState;
pub use types::{
    AssessmentReport, PointerPhase, RiskAssessment, RiskTier, TargetResult, TaskKind,
    TaskResult, TaskStatus, TrajectoryResult,
};

// Schema exports
pub use schema::{replay_events, replay_str, InputEvent, SCHEMA_VERSION};

/// Library version embedded in all reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "motor-screen";
