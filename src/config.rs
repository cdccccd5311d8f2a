//! Engine configuration
//!
//! Every tunable constant of the screening tasks lives here: difficulty
//! settings of the target task, timer intervals, play-surface geometry and the
//! reference shapes of the tracing tasks.

use serde::{Deserialize, Serialize};

use crate::error::AssessError;
use crate::types::TargetShape;

/// Smallest allowed target speed (pixels per move tick)
pub const MIN_SPEED: u32 = 1;
/// Largest allowed target speed (pixels per move tick)
pub const MAX_SPEED: u32 = 5;
/// Smallest allowed target timeout in seconds
pub const MIN_TIMEOUT_SECONDS: f64 = 1.0;
/// Largest allowed target timeout in seconds
pub const MAX_TIMEOUT_SECONDS: f64 = 5.0;

/// Reference geometry of the tracing tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskGeometry {
    pub line_y: f64,
    pub line_x_start: f64,
    pub line_x_end: f64,
    pub square_center: (f64, f64),
    pub square_side: f64,
}

impl Default for TaskGeometry {
    fn default() -> Self {
        Self {
            line_y: 300.0,
            line_x_start: 100.0,
            line_x_end: 700.0,
            square_center: (400.0, 300.0),
            square_side: 160.0,
        }
    }
}

impl TaskGeometry {
    pub fn line(&self) -> TargetShape {
        TargetShape::Line {
            y: self.line_y,
            x_start: self.line_x_start,
            x_end: self.line_x_end,
        }
    }

    pub fn square(&self) -> TargetShape {
        TargetShape::square_centered(self.square_center.0, self.square_center.1, self.square_side)
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target speed in pixels per move tick (1-5)
    pub speed: u32,
    /// Seconds before an unclicked target times out (1-5)
    pub timeout_seconds: f64,
    /// Trials per target session
    pub trial_count: u32,
    /// Target radius in pixels
    pub target_radius: f64,
    /// Extra hit-test tolerance around the target radius
    pub hit_grace_margin: f64,
    /// Jerk scale of the smoothness decay
    pub smoothness_decay: f64,
    /// Interval between target moves in milliseconds
    pub tick_interval_ms: u64,
    /// Delay between starting the target task and the first spawn
    pub spawn_delay_ms: u64,
    /// Pause after a hit before the next spawn
    pub hit_hold_ms: u64,
    /// Pause after a timeout before the next spawn
    pub miss_hold_ms: u64,
    /// Play surface width in pixels
    pub surface_width: f64,
    /// Play surface height in pixels
    pub surface_height: f64,
    /// Horizontal spawn padding
    pub spawn_padding_x: f64,
    /// Vertical spawn padding
    pub spawn_padding_y: f64,
    pub geometry: TaskGeometry,
    /// Fixed RNG seed for reproducible target placement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed: 2,
            timeout_seconds: 3.0,
            trial_count: 5,
            target_radius: 25.0,
            hit_grace_margin: 5.0,
            smoothness_decay: 50.0,
            tick_interval_ms: 20,
            spawn_delay_ms: 500,
            hit_hold_ms: 800,
            miss_hold_ms: 500,
            surface_width: 800.0,
            surface_height: 600.0,
            spawn_padding_x: 50.0,
            spawn_padding_y: 150.0,
            geometry: TaskGeometry::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, AssessError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, AssessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Target timeout in milliseconds
    pub fn timeout_ms(&self) -> u64 {
        (self.timeout_seconds * 1000.0) as u64
    }

    /// Distance from a target centre within which a click counts as a hit
    pub fn hit_radius(&self) -> f64 {
        self.target_radius + self.hit_grace_margin
    }

    pub fn validate(&self) -> Result<(), AssessError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(AssessError::InvalidConfig(format!(
                "speed must be in {}..={}, got {}",
                MIN_SPEED, MAX_SPEED, self.speed
            )));
        }
        if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&self.timeout_seconds) {
            return Err(AssessError::InvalidConfig(format!(
                "timeout_seconds must be in {}..={}, got {}",
                MIN_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS, self.timeout_seconds
            )));
        }
        if self.trial_count == 0 {
            return Err(AssessError::InvalidConfig(
                "trial_count must be positive".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(AssessError::InvalidConfig(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if !(self.smoothness_decay > 0.0) {
            return Err(AssessError::InvalidConfig(
                "smoothness_decay must be positive".to_string(),
            ));
        }
        if self.target_radius <= 0.0 || self.hit_grace_margin < 0.0 {
            return Err(AssessError::InvalidConfig(
                "target_radius must be positive and hit_grace_margin non-negative".to_string(),
            ));
        }
        if self.spawn_padding_x * 2.0 > self.surface_width
            || self.spawn_padding_y * 2.0 > self.surface_height
        {
            return Err(AssessError::InvalidConfig(format!(
                "spawn padding ({}, {}) leaves no room on a {}x{} surface",
                self.spawn_padding_x, self.spawn_padding_y, self.surface_width, self.surface_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_ms(), 3000);
        assert_eq!(config.hit_radius(), 30.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "speed": 4, "timeout_seconds": 2.5 }"#).unwrap();
        assert_eq!(config.speed, 4);
        assert_eq!(config.timeout_ms(), 2500);
        assert_eq!(config.trial_count, 5);
        assert_eq!(config.geometry.square_side, 160.0);
    }

    #[test]
    fn test_speed_out_of_range() {
        let result = EngineConfig::from_json(r#"{ "speed": 9 }"#);
        assert!(matches!(result, Err(AssessError::InvalidConfig(_))));
    }

    #[test]
    fn test_timeout_out_of_range() {
        let config = EngineConfig {
            timeout_seconds: 0.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_padding_must_fit_surface() {
        let config = EngineConfig {
            spawn_padding_y: 400.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
