//! FFI bindings for Synheart UV
//!
//! This module provides C-compatible functions for calling the UV engine from
//! mobile hosts. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `uv_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::celestial::{position, sun_position};
use crate::config::UvConfig;
use crate::environment::HeuristicEnvironmentSource;
use crate::error::UvError;
use crate::pipeline::{assess_uv, assess_uv_forecast, UvProcessor};
use crate::timer::{SystemClock, TimerEvent, TimerState};
use crate::types::Location;

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

/// Hand a JSON result to the caller, or record the error and return NULL
fn json_or_null(result: Result<String, UvError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, UvError> {
    serde_json::to_string(value).map_err(|e| UvError::EncodingError(e.to_string()))
}

fn instant_from_unix(unix_seconds: i64) -> Result<DateTime<Utc>, UvError> {
    DateTime::<Utc>::from_timestamp(unix_seconds, 0)
        .ok_or_else(|| UvError::InvalidInput(format!("timestamp out of range: {}", unix_seconds)))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Assess a base UV index against an environmental snapshot.
///
/// # Safety
/// - `environment_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `uv_free_string`.
/// - Returns NULL on error; call `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_assess(
    base_uv_index: u32,
    environment_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let env_str = match cstr_to_string(environment_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid environment string pointer");
            return ptr::null_mut();
        }
    };

    json_or_null(assess_uv(base_uv_index, env_str))
}

/// Assess an hourly UV forecast against an environmental snapshot.
///
/// # Safety
/// - `forecast_json` and `environment_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `uv_free_string`.
/// - Returns NULL on error; call `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_assess_forecast(
    forecast_json: *const c_char,
    environment_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let forecast_str = match cstr_to_string(forecast_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid forecast string pointer");
            return ptr::null_mut();
        }
    };

    let env_str = match cstr_to_string(environment_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid environment string pointer");
            return ptr::null_mut();
        }
    };

    json_or_null(assess_uv_forecast(forecast_str, env_str))
}

/// Sun position for a Unix timestamp, as JSON.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `uv_free_string`.
/// - Returns NULL on error; call `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_sun_position(
    unix_seconds: i64,
    latitude: f64,
    longitude: f64,
) -> *mut c_char {
    clear_last_error();
    json_or_null(
        instant_from_unix(unix_seconds)
            .and_then(|at| to_json(&sun_position(&at, latitude, longitude))),
    )
}

/// Moon position for a Unix timestamp, as JSON.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `uv_free_string`.
/// - Returns NULL on error; call `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_moon_position(
    unix_seconds: i64,
    latitude: f64,
    longitude: f64,
) -> *mut c_char {
    clear_last_error();
    json_or_null(
        instant_from_unix(unix_seconds).and_then(|at| to_json(&position(&at, latitude, longitude))),
    )
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a UvProcessor
pub struct UvProcessorHandle {
    processor: UvProcessor<HeuristicEnvironmentSource, SystemClock>,
}

#[derive(Serialize)]
struct TickResult {
    events: Vec<TimerEvent>,
    state: TimerState,
}

/// Create a new UvProcessor.
///
/// # Safety
/// - `config_json` may be NULL (defaults) or a valid null-terminated C string.
/// - Returns a pointer to a newly allocated UvProcessor.
/// - Must be freed with `uv_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn uv_processor_new(
    config_json: *const c_char,
    altitude_meters: f64,
) -> *mut UvProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        UvConfig::default()
    } else {
        let parsed = cstr_to_string(config_json)
            .ok_or_else(|| UvError::InvalidInput("Invalid config string pointer".to_string()))
            .and_then(|json| UvConfig::from_json(&json));
        match parsed {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let source = HeuristicEnvironmentSource::new(if altitude_meters.is_finite() {
        altitude_meters
    } else {
        0.0
    });
    let processor = UvProcessor::new(source, SystemClock, config);
    let handle = Box::new(UvProcessorHandle { processor });
    Box::into_raw(handle)
}

/// Free a UvProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `uv_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn uv_processor_free(processor: *mut UvProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Assess current conditions with a stateful processor; updates the timer's UV.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `uv_processor_new`.
/// - Returns a newly allocated string that must be freed with `uv_free_string`.
/// - Returns NULL on error; call `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_processor_assess(
    processor: *mut UvProcessorHandle,
    latitude: f64,
    longitude: f64,
    base_uv_index: u32,
    cloud_cover_pct: f64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;
    json_or_null(handle.processor.assess_json(
        Location::new(latitude, longitude),
        base_uv_index,
        cloud_cover_pct,
    ))
}

/// Run a timer command and return the resulting timer state.
///
/// Commands: `start`, `pause`, `apply_sunscreen`, `resume`, `reset`,
/// `cancel_reminder`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `uv_processor_new`.
/// - `command` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `uv_free_string`.
/// - Returns NULL on error (including a rejected transition); call
///   `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_processor_timer_command(
    processor: *mut UvProcessorHandle,
    command: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let command_str = match cstr_to_string(command) {
        Some(s) => s,
        None => {
            set_last_error("Invalid command string pointer");
            return ptr::null_mut();
        }
    };

    let timer = handle.processor.timer_mut();
    let outcome = match command_str.as_str() {
        "start" => timer.start().map(|_| ()),
        "pause" => timer.pause().map(|_| ()),
        "apply_sunscreen" => timer.apply_sunscreen().map(|_| ()),
        "resume" => timer.resume().map(|_| ()),
        "reset" => {
            timer.reset();
            Ok(())
        }
        "cancel_reminder" => {
            timer.cancel_reapply_reminder();
            Ok(())
        }
        other => {
            set_last_error(&format!("Unknown timer command: {}", other));
            return ptr::null_mut();
        }
    };

    match outcome {
        Ok(()) => json_or_null(to_json(&timer.snapshot())),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Observe the timer: returns `{ "events": [...], "state": {...} }`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `uv_processor_new`.
/// - Returns a newly allocated string that must be freed with `uv_free_string`.
/// - Returns NULL on error; call `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_processor_tick(processor: *mut UvProcessorHandle) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;
    let timer = handle.processor.timer_mut();
    let events = timer.tick();
    json_or_null(to_json(&TickResult {
        events,
        state: timer.state().clone(),
    }))
}

/// Save timer state to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `uv_processor_new`.
/// - Returns a newly allocated string that must be freed with `uv_free_string`.
/// - Returns NULL on error; call `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_processor_save_state(processor: *mut UvProcessorHandle) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    json_or_null(handle.processor.save_state())
}

/// Load timer state from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `uv_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `uv_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn uv_processor_load_state(
    processor: *mut UvProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_state(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by UV functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a UV function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn uv_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next UV function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn uv_last_error() -> *const c_char {
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
pub unsafe extern "C" fn uv_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
