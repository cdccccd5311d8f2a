//! FFI bindings for Motor Screen
//!
//! This module provides C-compatible functions for driving a screening engine
//! from other languages. All functions use C strings (null-terminated) and
//! return allocated memory that must be freed by the caller using
//! `mscreen_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::encoder::AssessmentEncoder;
use crate::engine::Engine;
use crate::types::{PointerPhase, TaskKind};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn parse_task(name: &str) -> Option<TaskKind> {
    TaskKind::ALL.iter().copied().find(|k| k.as_str() == name)
}

fn parse_phase(name: &str) -> Option<PointerPhase> {
    match name {
        "press" => Some(PointerPhase::Press),
        "move" => Some(PointerPhase::Move),
        "release" => Some(PointerPhase::Release),
        _ => None,
    }
}

fn to_json_cstr<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Engine API
// ============================================================================

/// Opaque handle to a screening engine
pub struct MscreenEngineHandle {
    engine: Engine,
    clock: SystemClock,
    encoder: AssessmentEncoder,
}

/// Create a new engine.
///
/// # Safety
/// - `config_json` may be NULL (defaults) or a valid null-terminated C string
///   holding an `EngineConfig` JSON object.
/// - Returns a pointer that must be freed with `mscreen_engine_free`.
/// - Returns NULL on error; call `mscreen_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_new(config_json: *const c_char) -> *mut MscreenEngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match EngineConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    match Engine::new(config) {
        Ok(engine) => Box::into_raw(Box::new(MscreenEngineHandle {
            engine,
            clock: SystemClock::new(),
            encoder: AssessmentEncoder::new(),
        })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_free(engine: *mut MscreenEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Seconds elapsed on the engine's own clock.
///
/// Hosts without a clock of their own can use this as the timestamp for
/// every other call. Returns a negative value for a NULL engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_elapsed(engine: *const MscreenEngineHandle) -> f64 {
    if engine.is_null() {
        return -1.0;
    }
    (*engine).clock.now()
}

/// Start (or restart) a task. `task` is one of "line", "square", "target".
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
/// - `task` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_start_task(
    engine: *mut MscreenEngineHandle,
    task: *const c_char,
    now: f64,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    let kind = match cstr_to_string(task).as_deref().and_then(parse_task) {
        Some(kind) => kind,
        None => {
            set_last_error("Unknown task; expected line, square or target");
            return -1;
        }
    };

    handle.engine.start_task(kind, now);
    0
}

/// Drop all results, the active task and pending timers.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_clear(engine: *mut MscreenEngineHandle) {
    if !engine.is_null() {
        (*engine).engine.clear();
    }
}

/// Feed a pointer event. `phase` is one of "press", "move", "release".
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
/// - `phase` must be a valid null-terminated C string.
/// - Returns the outcome as a newly allocated JSON string that must be freed
///   with `mscreen_free_string`, or NULL on error.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_feed_pointer(
    engine: *mut MscreenEngineHandle,
    phase: *const c_char,
    x: f64,
    y: f64,
    timestamp: f64,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *engine;

    let phase = match cstr_to_string(phase).as_deref().and_then(parse_phase) {
        Some(phase) => phase,
        None => {
            set_last_error("Unknown phase; expected press, move or release");
            return ptr::null_mut();
        }
    };

    match handle.engine.feed_pointer_event(phase, x, y, timestamp) {
        Ok(outcome) => to_json_cstr(&outcome),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Feed a click of the target task.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
/// - Returns the outcome as a newly allocated JSON string that must be freed
///   with `mscreen_free_string`, or NULL on error.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_feed_click(
    engine: *mut MscreenEngineHandle,
    x: f64,
    y: f64,
    timestamp: f64,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *engine;
    match handle.engine.feed_click_event(x, y, timestamp) {
        Ok(outcome) => to_json_cstr(&outcome),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Fire every timer due at or before `now`.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
/// - Returns the number of timers fired, or -1 for a NULL engine.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_tick(engine: *mut MscreenEngineHandle, now: f64) -> i32 {
    if engine.is_null() {
        return -1;
    }
    (*engine).engine.tick(now) as i32
}

/// Result of one task as JSON, or the JSON literal `null` when absent.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
/// - `task` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mscreen_free_string`.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_task_result_json(
    engine: *const MscreenEngineHandle,
    task: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    match cstr_to_string(task).as_deref().and_then(parse_task) {
        Some(kind) => to_json_cstr(&handle.engine.get_task_result(kind)),
        None => {
            set_last_error("Unknown task; expected line, square or target");
            ptr::null_mut()
        }
    }
}

/// Risk assessment as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
/// - Returns a newly allocated string that must be freed with `mscreen_free_string`.
/// - Returns NULL while tasks are missing; `mscreen_last_error` names them.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_assessment_json(
    engine: *const MscreenEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    match (*engine).engine.get_risk_assessment() {
        Ok(assessment) => to_json_cstr(&assessment),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Full screening report as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
/// - Returns a newly allocated string that must be freed with `mscreen_free_string`.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_report_json(
    engine: *const MscreenEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    match handle.encoder.encode_to_json(handle.engine.state()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Notifications since the last drain, as a JSON array.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `mscreen_engine_new`.
/// - Returns a newly allocated string that must be freed with `mscreen_free_string`.
#[no_mangle]
pub unsafe extern "C" fn mscreen_engine_drain_events_json(
    engine: *mut MscreenEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let events = (*engine).engine.drain_events();
    to_json_cstr(&events)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Motor Screen functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Motor Screen function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mscreen_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Motor Screen call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn mscreen_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn mscreen_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
