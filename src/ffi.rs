//! FFI bindings for the resampling engine
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `vitals_free_string`.
//! No entry point unwinds into the caller: a panic inside the engine is reported
//! as an error like any other.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::fmt::Display;
use std::os::raw::c_char;
use std::panic::{self, UnwindSafe};
use std::ptr;

use crate::interval::IntervalNormalizer;
use crate::pipeline::{daily_heart_rate_to_json, intraday_to_json};
use crate::types::MetricType;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn record_error(message: impl Display) {
    let message = CString::new(message.to_string()).ok();
    LAST_ERROR.with(|slot| slot.replace(message));
}

fn reset_error() {
    LAST_ERROR.with(|slot| slot.replace(None));
}

/// Copy a C string argument; records an error naming `arg` when unusable
unsafe fn read_arg(ptr: *const c_char, arg: &str) -> Option<String> {
    if ptr.is_null() {
        record_error(format!("Invalid {arg} string pointer"));
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(value) => Some(value.to_owned()),
        Err(e) => {
            record_error(format!("{arg} is not valid UTF-8: {e}"));
            None
        }
    }
}

/// Run `compute`, turning both errors and panics into a message
fn guarded<E: Display>(
    compute: impl FnOnce() -> Result<String, E> + UnwindSafe,
) -> Result<String, String> {
    match panic::catch_unwind(compute) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("internal error while computing series".to_string()),
    }
}

/// Owned C string for the caller, or NULL with the last error set
fn into_c_result(result: Result<String, String>) -> *mut c_char {
    match result.and_then(|payload| CString::new(payload).map_err(|e| e.to_string())) {
        Ok(payload) => payload.into_raw(),
        Err(message) => {
            record_error(message);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Resample an intraday request JSON and return the intraday payload JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_intraday_json(json: *const c_char) -> *mut c_char {
    reset_error();
    let Some(request) = read_arg(json, "JSON") else {
        return ptr::null_mut();
    };
    into_c_result(guarded(move || intraday_to_json(request)))
}

/// Aggregate a daily heart-rate request JSON and return the daily payload JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_daily_heart_rate_json(json: *const c_char) -> *mut c_char {
    reset_error();
    let Some(request) = read_arg(json, "JSON") else {
        return ptr::null_mut();
    };
    into_c_result(guarded(move || daily_heart_rate_to_json(request)))
}

/// Normalize an interval token (e.g. `"1h"`) for a metric (e.g. `"heart_rate"`).
///
/// # Safety
/// - `token` and `metric` must be valid null-terminated C strings.
/// - Returns the normalized interval (e.g. `"60m"`) as a newly allocated string
///   that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_normalize_interval(
    token: *const c_char,
    metric: *const c_char,
) -> *mut c_char {
    reset_error();
    let Some(token) = read_arg(token, "interval") else {
        return ptr::null_mut();
    };
    let Some(metric) = read_arg(metric, "metric") else {
        return ptr::null_mut();
    };

    into_c_result(guarded(move || {
        let metric: MetricType = serde_json::from_value(serde_json::Value::String(metric))
            .map_err(|e| format!("Unknown metric: {e}"))?;
        IntervalNormalizer::normalize(&token, metric)
            .map(|spec| spec.to_string())
            .map_err(|e| e.to_string())
    }))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by engine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an engine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitals_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next engine call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vitals_last_error() -> *const c_char {
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
pub unsafe extern "C" fn vitals_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
