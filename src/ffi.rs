//! FFI bindings for Stresslens
//!
//! C-compatible surface for host applications that own the camera and the
//! face-mesh detector. All functions use null-terminated C strings; returned
//! strings are allocated here and must be freed with
//! `stresslens_free_string`. Sessions are opaque handles created with
//! `stresslens_session_new` and destroyed with `stresslens_session_free`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::session::{SessionConfig, StressSession};
use crate::types::LandmarkFrame;

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

/// Get the last error message, or NULL if none.
///
/// # Safety
/// The returned pointer is owned by thread-local storage; do not free it,
/// and do not use it after the next Stresslens call on this thread.
#[no_mangle]
pub unsafe extern "C" fn stresslens_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(msg) => msg.as_ptr(),
        None => ptr::null(),
    })
}

/// Free a string previously returned by a Stresslens function.
///
/// # Safety
/// `s` must be a pointer returned by this library, freed at most once.
#[no_mangle]
pub unsafe extern "C" fn stresslens_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Create a session from a JSON [`SessionConfig`]; NULL config uses the
/// defaults (heuristic model, 90-frame calibration window).
///
/// # Safety
/// `config_json` must be NULL or a valid null-terminated C string.
/// Returns NULL on error; call `stresslens_last_error` for the message.
/// The handle must be destroyed with `stresslens_session_free`.
#[no_mangle]
pub unsafe extern "C" fn stresslens_session_new(
    config_json: *const c_char,
) -> *mut StressSession {
    clear_last_error();

    let config = if config_json.is_null() {
        SessionConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match SessionConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(StressSession::new(config)))
}

/// Process one landmark frame (JSON `LandmarkFrame`: `points` array of
/// `{x, y, z}` plus `timestamp_ms`) and return the frame outcome as JSON.
///
/// # Safety
/// - `session` must be a live handle from `stresslens_session_new`.
/// - `frame_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string to free with `stresslens_free_string`,
///   or NULL on error.
#[no_mangle]
pub unsafe extern "C" fn stresslens_session_process(
    session: *mut StressSession,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let session = match session.as_mut() {
        Some(s) => s,
        None => {
            set_last_error("Null session handle");
            return ptr::null_mut();
        }
    };

    let json = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame string pointer");
            return ptr::null_mut();
        }
    };

    let frame: LandmarkFrame = match serde_json::from_str(&json) {
        Ok(frame) => frame,
        Err(e) => {
            set_last_error(&format!("Failed to parse frame: {e}"));
            return ptr::null_mut();
        }
    };
    if frame.points.len() < crate::types::landmark::MIN_FRAME_LEN {
        set_last_error("Frame has too few landmark points");
        return ptr::null_mut();
    }

    let outcome = session.process_frame(&frame);
    match serde_json::to_string(&outcome) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Return the session provenance report as JSON.
///
/// # Safety
/// `session` must be a live handle. Free the result with
/// `stresslens_free_string`.
#[no_mangle]
pub unsafe extern "C" fn stresslens_session_report(
    session: *const StressSession,
) -> *mut c_char {
    clear_last_error();

    let session = match session.as_ref() {
        Some(s) => s,
        None => {
            set_last_error("Null session handle");
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&session.report()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Reset a session in place for reuse (new baseline, cleared buffers).
///
/// # Safety
/// `session` must be a live handle or NULL (NULL is a no-op).
#[no_mangle]
pub unsafe extern "C" fn stresslens_session_reset(session: *mut StressSession) {
    if let Some(session) = session.as_mut() {
        session.reset();
    }
}

/// Destroy a session handle.
///
/// # Safety
/// `session` must be a handle from `stresslens_session_new`, freed at most
/// once; NULL is a no-op.
#[no_mangle]
pub unsafe extern "C" fn stresslens_session_free(session: *mut StressSession) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}
