//! motor.input_event.v1 schema and log replay
//!
//! Recorded sessions are stored as NDJSON input events. This module defines
//! the record format, its validation, and replay through the engine.

mod input_event;
mod replay;

pub use input_event::*;
pub use replay::*;
