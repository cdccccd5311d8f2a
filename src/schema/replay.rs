//! Replay of recorded input logs
//!
//! Drives an [`Engine`] with a motor.input_event.v1 log and encodes the
//! resulting session into a report. Timers due before each record fire
//! before the record is applied, so a replay sees the same timeline as the
//! live session did.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::encoder::AssessmentEncoder;
use crate::engine::{Engine, EngineEvent};
use crate::error::AssessError;
use crate::schema::input_event::{parse_events, validate_events, InputAction, InputEvent};
use crate::types::AssessmentReport;

/// Final state of a replayed log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOutcome {
    /// Number of records applied
    pub applied: usize,
    /// Engine time of the last record
    pub end_time: f64,
    pub report: AssessmentReport,
    /// Notifications emitted along the way
    pub events: Vec<EngineEvent>,
}

/// Stateful replayer over a single engine
pub struct SessionReplayer {
    engine: Engine,
    encoder: AssessmentEncoder,
    applied: usize,
    last_t: f64,
    events: Vec<EngineEvent>,
}

impl SessionReplayer {
    pub fn new(config: EngineConfig) -> Result<Self, AssessError> {
        Ok(Self {
            engine: Engine::new(config)?,
            encoder: AssessmentEncoder::new(),
            applied: 0,
            last_t: 0.0,
            events: Vec::new(),
        })
    }

    /// Use a specific encoder (fixed instance id)
    pub fn with_encoder(mut self, encoder: AssessmentEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Apply one record
    pub fn apply(&mut self, event: &InputEvent) -> Result<(), AssessError> {
        event
            .validate()
            .map_err(|e| AssessError::ParseError(format!("Invalid event: {}", e)))?;
        if event.t < self.last_t {
            return Err(AssessError::NonMonotonicTimestamp {
                previous: self.last_t,
                t: event.t,
            });
        }

        let t = event.t;
        self.engine.tick(t);

        match event.action {
            InputAction::Start { task } => self.engine.start_task(task, t),
            InputAction::Pointer { phase, x, y } => {
                self.engine.feed_pointer_event(phase, x, y, t)?;
            }
            InputAction::Click { x, y } => {
                self.engine.feed_click_event(x, y, t)?;
            }
            InputAction::Tick => {}
            InputAction::Clear => self.engine.clear(),
        }

        self.events.extend(self.engine.drain_events());
        self.applied += 1;
        self.last_t = t;
        debug!(action = event.action_name(), t, "record applied");
        Ok(())
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Encode the session as it stands
    pub fn finish(mut self) -> Result<ReplayOutcome, AssessError> {
        self.events.extend(self.engine.drain_events());
        let report = self.encoder.encode(self.engine.state())?;
        info!(
            applied = self.applied,
            complete = report.assessment.is_some(),
            "replay finished"
        );
        Ok(ReplayOutcome {
            applied: self.applied,
            end_time: self.last_t,
            report,
            events: self.events,
        })
    }
}

/// Replay a parsed log
///
/// The whole log is validated before anything is applied.
pub fn replay_events(
    events: &[InputEvent],
    config: EngineConfig,
) -> Result<ReplayOutcome, AssessError> {
    if let Some(failure) = validate_events(events).into_iter().next() {
        return Err(AssessError::ParseError(format!(
            "Invalid event at index {}: {}",
            failure.index, failure.error
        )));
    }

    let mut replayer = SessionReplayer::new(config)?;
    for event in events {
        replayer.apply(event)?;
    }
    replayer.finish()
}

/// Parse (NDJSON or JSON array) and replay
pub fn replay_str(input: &str, config: EngineConfig) -> Result<ReplayOutcome, AssessError> {
    let events = parse_events(input)?;
    replay_events(&events, config)
}
