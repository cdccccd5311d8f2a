//! Movement-quality metrics
//!
//! Pure functions that turn recorded samples into per-task results:
//! trajectories into deviation / smoothness / elapsed time, reaction samples
//! into mean / spread.

pub mod reaction;
pub mod trajectory;

pub use reaction::ReactionMetrics;
pub use trajectory::{TrajectoryMetrics, MIN_TRAJECTORY_SAMPLES};
