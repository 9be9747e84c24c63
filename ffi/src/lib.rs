//! C-ABI wrapper around `listkeeper-core`.
//!
//! # Overview
//! Exposes the sync session through `extern "C"` functions so a native UI in
//! any language with a C FFI can drive it. The UI performs the HTTP
//! round-trips itself and never links to an async runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Session operations mirror `Session` 1:1. Each returns an
//!   `FfiCallResult` that may carry a ticketed request; the caller executes
//!   it and passes the response to `listkeeper_resolve`.
//! - The display state is read as one JSON document (`listkeeper_view_json`)
//!   rather than as a tree of C structs.
//! - The C caller owns all returned pointers and must call the matching
//!   `listkeeper_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use listkeeper_core::{HttpResponse, Session, SessionConfig};

use types::*;

/// Borrow a C string argument. `None` if it is not valid UTF-8.
///
/// The caller has already checked for null.
fn arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Run `f` against the session behind `session`, turning null handles and
/// panics into error results.
fn with_session(
    name: &str,
    session: *mut FfiSession,
    f: impl FnOnce(&mut Session) -> *mut FfiCallResult,
) -> *mut FfiCallResult {
    catch_unwind(AssertUnwindSafe(|| {
        if session.is_null() {
            return FfiCallResult::null_arg("session");
        }
        let session = unsafe { &mut (*session).inner };
        f(session)
    }))
    .unwrap_or_else(|_| {
        tracing::error!(function = name, "panic caught at FFI boundary");
        FfiCallResult::panic(&format!("panic in {name}"))
    })
}

/// Like `with_session`, for operations that take one item id.
fn with_item(
    name: &str,
    session: *mut FfiSession,
    id: *const c_char,
    f: impl FnOnce(&mut Session, &str) -> *mut FfiCallResult,
) -> *mut FfiCallResult {
    with_session(name, session, |session| {
        if id.is_null() {
            return FfiCallResult::null_arg("id");
        }
        match arg(id) {
            Some(id) => f(session, id),
            None => FfiCallResult::invalid_arg("id"),
        }
    })
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Create a session talking to the store at `base_url`. Due dates are shown
/// `utc_offset_minutes` east of UTC.
///
/// Returns null if `base_url` is null or not UTF-8, or if an internal panic
/// occurs. The caller must free the returned pointer with
/// `listkeeper_session_free`.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_session_new(base_url: *const c_char, utc_offset_minutes: i32) -> *mut FfiSession {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let Some(url) = arg(base_url) else {
            return std::ptr::null_mut();
        };
        let config = SessionConfig::new(url).with_utc_offset_minutes(utc_offset_minutes);
        Box::into_raw(Box::new(FfiSession {
            inner: Session::new(&config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a session configured from `LISTKEEPER_STORE_URL` and
/// `LISTKEEPER_UTC_OFFSET_MINUTES`.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_session_from_env() -> *mut FfiSession {
    catch_unwind(|| {
        let config = SessionConfig::from_env();
        Box::into_raw(Box::new(FfiSession {
            inner: Session::new(&config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a session. Safe to call with null. Outstanding tickets are dropped.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_session_free(session: *mut FfiSession) {
    if !session.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(session) });
        });
    }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// Fetch every list. Call once after creating the session; resolving the
/// request activates the first list and returns its item fetch.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_start(session: *mut FfiSession) -> *mut FfiCallResult {
    with_session("listkeeper_start", session, |session| {
        FfiCallResult::ok(Some(session.start()))
    })
}

/// Fetch every list again.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_reload_lists(session: *mut FfiSession) -> *mut FfiCallResult {
    with_session("listkeeper_reload_lists", session, |session| {
        FfiCallResult::ok(Some(session.reload_lists()))
    })
}

/// Make the list at `index` active. `request` is null when the list's items
/// are already cached or being fetched.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_select(session: *mut FfiSession, index: u32) -> *mut FfiCallResult {
    with_session("listkeeper_select", session, |session| {
        match session.select(index as usize) {
            Ok(fetch) => FfiCallResult::ok(fetch),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
}

/// Create a list in the store.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_create_list(
    session: *mut FfiSession,
    name: *const c_char,
    color: *const c_char,
) -> *mut FfiCallResult {
    with_session("listkeeper_create_list", session, |session| {
        if name.is_null() {
            return FfiCallResult::null_arg("name");
        }
        if color.is_null() {
            return FfiCallResult::null_arg("color");
        }
        let (Some(name), Some(color)) = (arg(name), arg(color)) else {
            return FfiCallResult::invalid_arg("name or color");
        };
        match session.create_list(name, color) {
            Ok(outbound) => FfiCallResult::ok(Some(outbound)),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
}

/// Sign out of the store.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_sign_out(session: *mut FfiSession) -> *mut FfiCallResult {
    with_session("listkeeper_sign_out", session, |session| {
        FfiCallResult::ok(Some(session.sign_out()))
    })
}

// ---------------------------------------------------------------------------
// Items of the active list
// ---------------------------------------------------------------------------

/// Flip an item's status. The change is visible at once.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_toggle_status(session: *mut FfiSession, id: *const c_char) -> *mut FfiCallResult {
    with_item("listkeeper_toggle_status", session, id, |session, id| {
        match session.toggle_status(id) {
            Ok(outbound) => FfiCallResult::ok(Some(outbound)),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
}

/// Delete an item. It stays visible until the store confirms.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_remove_by_id(session: *mut FfiSession, id: *const c_char) -> *mut FfiCallResult {
    with_item("listkeeper_remove_by_id", session, id, |session, id| {
        match session.remove_by_id(id) {
            Ok(outbound) => FfiCallResult::ok(Some(outbound)),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
}

/// Enter edit mode on an item, or commit `current_body` if it is already
/// being edited. See `FfiCallResult::edit`.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_request_edit(
    session: *mut FfiSession,
    id: *const c_char,
    current_body: *const c_char,
) -> *mut FfiCallResult {
    with_item("listkeeper_request_edit", session, id, |session, id| {
        if current_body.is_null() {
            return FfiCallResult::null_arg("current_body");
        }
        let Some(body) = arg(current_body) else {
            return FfiCallResult::invalid_arg("current_body");
        };
        match session.request_edit(id, body) {
            Ok(outcome) => FfiCallResult::edit(outcome),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
}

/// Send a new body for an item.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_commit_body_edit(
    session: *mut FfiSession,
    id: *const c_char,
    body: *const c_char,
) -> *mut FfiCallResult {
    with_item("listkeeper_commit_body_edit", session, id, |session, id| {
        if body.is_null() {
            return FfiCallResult::null_arg("body");
        }
        let Some(body) = arg(body) else {
            return FfiCallResult::invalid_arg("body");
        };
        match session.commit_body_edit(id, body) {
            Ok(outbound) => FfiCallResult::ok(Some(outbound)),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
}

/// Create an item in the active list. `due_date_unix` (seconds since the
/// epoch) is only read when `has_due_date` is true.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_add_item(
    session: *mut FfiSession,
    body: *const c_char,
    has_due_date: bool,
    due_date_unix: i64,
) -> *mut FfiCallResult {
    with_session("listkeeper_add_item", session, |session| {
        if body.is_null() {
            return FfiCallResult::null_arg("body");
        }
        let Some(body) = arg(body) else {
            return FfiCallResult::invalid_arg("body");
        };
        let due_date: Option<DateTime<Utc>> = if has_due_date {
            match DateTime::from_timestamp(due_date_unix, 0) {
                Some(at) => Some(at),
                None => return FfiCallResult::invalid_arg("due_date_unix"),
            }
        } else {
            None
        };
        match session.add_item(body, due_date) {
            Ok(outbound) => FfiCallResult::ok(Some(outbound)),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
}

/// Fetch the active list's items again.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_resync(session: *mut FfiSession) -> *mut FfiCallResult {
    with_session("listkeeper_resync", session, |session| match session.resync() {
        Ok(outbound) => FfiCallResult::ok(Some(outbound)),
        Err(e) => FfiCallResult::from_error(e),
    })
}

/// Choose which items the view shows. `mode` is an `FfiFilterMode` value.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_set_filter(session: *mut FfiSession, mode: i32) -> *mut FfiCallResult {
    with_session("listkeeper_set_filter", session, |session| {
        match FfiFilterMode::decode(mode) {
            Some(mode) => {
                session.set_filter(mode);
                FfiCallResult::ok(None)
            }
            None => FfiCallResult::invalid_arg("mode"),
        }
    })
}

// ---------------------------------------------------------------------------
// Responses and state
// ---------------------------------------------------------------------------

/// Hand back the response to the request issued under `ticket`.
///
/// `event` in the result says what changed. `request` is set when the
/// response triggered another request (the first list's item fetch).
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_resolve(
    session: *mut FfiSession,
    ticket: u64,
    response: *const FfiHttpResponse,
) -> *mut FfiCallResult {
    with_session("listkeeper_resolve", session, |session| {
        if response.is_null() {
            return FfiCallResult::null_arg("response");
        }
        let resp = unsafe { &*response };
        let body = if resp.body.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(resp.body) }.to_string_lossy().into_owned()
        };
        match session.resolve(ticket, HttpResponse::new(resp.status, body)) {
            Ok(resolved) => FfiCallResult::resolved(resolved),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
}

/// The whole display state as a JSON document: lists, active index, sync
/// status, filter, edit holder and the visible items.
///
/// Returns null if `session` is null. Free with `listkeeper_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_view_json(session: *const FfiSession) -> *mut c_char {
    catch_unwind(|| {
        if session.is_null() {
            return std::ptr::null_mut();
        }
        let session = unsafe { &(*session).inner };
        match serde_json::to_string(&session.view()) {
            Ok(json) => c_string(json),
            Err(e) => {
                tracing::warn!(error = %e, "view serialization failed");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Number of tickets issued and not yet resolved. 0 for a null session.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_outstanding(session: *const FfiSession) -> u32 {
    if session.is_null() {
        return 0;
    }
    catch_unwind(|| unsafe { &(*session).inner }.outstanding() as u32).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiCallResult` and the request, message and detail it carries.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_free_result(result: *mut FfiCallResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| FfiCallResult::free(result));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn listkeeper_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| drop_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    const LISTS: &str = r##"[{"id":"l1","name":"Home","color":"#4e8fef"},{"id":"l2","name":"Work","color":"#bb2b2b"}]"##;
    const ITEMS: &str = r#"[{"id":"b","body":"laundry","status":"pending","created":2},
                            {"id":"a","body":"dishes","status":"completed","created":1}]"#;

    fn new_session() -> *mut FfiSession {
        let url = CString::new("http://localhost:3000").unwrap();
        let session = listkeeper_session_new(url.as_ptr(), 0);
        assert!(!session.is_null());
        session
    }

    fn path(result: &FfiCallResult) -> &str {
        assert!(!result.request.is_null());
        let req = unsafe { &*result.request };
        unsafe { CStr::from_ptr(req.path) }.to_str().unwrap()
    }

    fn respond(session: *mut FfiSession, ticket: u64, status: u16, body: &str) -> *mut FfiCallResult {
        let body = CString::new(body).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
        };
        listkeeper_resolve(session, ticket, &resp)
    }

    fn view(session: *mut FfiSession) -> serde_json::Value {
        let json = listkeeper_view_json(session);
        assert!(!json.is_null());
        let value = serde_json::from_str(unsafe { CStr::from_ptr(json) }.to_str().unwrap()).unwrap();
        listkeeper_free_string(json);
        value
    }

    /// A session with `l1` active and loaded.
    fn loaded_session() -> *mut FfiSession {
        let session = new_session();
        let start = listkeeper_start(session);
        let ticket = unsafe { &*start }.ticket;
        listkeeper_free_result(start);

        let loaded = respond(session, ticket, 200, LISTS);
        let fetch_ticket = unsafe { &*loaded }.ticket;
        listkeeper_free_result(loaded);

        let items = respond(session, fetch_ticket, 200, ITEMS);
        listkeeper_free_result(items);
        session
    }

    #[test]
    fn session_new_and_free() {
        let session = new_session();
        listkeeper_session_free(session);
    }

    #[test]
    fn session_new_null_returns_null() {
        assert!(listkeeper_session_new(std::ptr::null(), 0).is_null());
    }

    #[test]
    fn session_free_null_is_safe() {
        listkeeper_session_free(std::ptr::null_mut());
    }

    #[test]
    fn start_returns_lists_request() {
        let session = new_session();
        let result = listkeeper_start(session);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.ticket, 1);
        assert_eq!(path(r), "http://localhost:3000/lists");
        let req = unsafe { &*r.request };
        assert_eq!(req.method, FfiHttpMethod::Get);
        assert!(req.body.is_null());
        assert_eq!(req.headers_len, 0);
        assert_eq!(listkeeper_outstanding(session), 1);

        listkeeper_free_result(result);
        listkeeper_session_free(session);
    }

    #[test]
    fn resolving_lists_returns_first_fetch() {
        let session = new_session();
        let start = listkeeper_start(session);
        let ticket = unsafe { &*start }.ticket;
        listkeeper_free_result(start);

        let result = respond(session, ticket, 200, LISTS);
        let r = unsafe { &*result };
        assert_eq!(r.event, FfiEventKind::ListsLoaded);
        assert!(!r.background);
        assert_eq!(path(r), "http://localhost:3000/lists/l1/items");
        assert_ne!(r.ticket, ticket);

        listkeeper_free_result(result);
        listkeeper_session_free(session);
    }

    #[test]
    fn view_json_shows_sorted_items() {
        let session = loaded_session();
        let view = view(session);
        assert_eq!(view["active_index"], 0);
        assert_eq!(view["status"]["state"], "synced");
        assert_eq!(view["items"][0]["id"], "a");
        assert_eq!(view["items"][1]["id"], "b");
        assert_eq!(view["items"][1]["due_date"], "none");
        listkeeper_session_free(session);
    }

    #[test]
    fn view_json_null_session_returns_null() {
        assert!(listkeeper_view_json(std::ptr::null()).is_null());
    }

    #[test]
    fn toggle_without_active_list_fails() {
        let session = new_session();
        let id = CString::new("a").unwrap();
        let result = listkeeper_toggle_status(session, id.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NoActiveList);
        assert!(!r.error_message.is_null());
        assert!(r.request.is_null());

        listkeeper_free_result(result);
        listkeeper_session_free(session);
    }

    #[test]
    fn toggle_sends_put_with_json_body() {
        let session = loaded_session();
        let id = CString::new("b").unwrap();
        let result = listkeeper_toggle_status(session, id.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(path(r), "http://localhost:3000/items/b");

        let req = unsafe { &*r.request };
        assert_eq!(req.method, FfiHttpMethod::Put);
        assert_eq!(req.headers_len, 1);
        let body_str = unsafe { CStr::from_ptr(req.body) }.to_str().unwrap();
        let body: serde_json::Value = serde_json::from_str(body_str).unwrap();
        assert_eq!(body, serde_json::json!({"status": "completed"}));

        let ticket = r.ticket;
        listkeeper_free_result(result);
        let failed = respond(session, ticket, 500, "boom");
        let f = unsafe { &*failed };
        assert_eq!(f.event, FfiEventKind::StatusRejected);
        assert!(!f.detail.is_null());
        assert_eq!(view(session)["status"]["message"], "Error Adding List");

        listkeeper_free_result(failed);
        listkeeper_session_free(session);
    }

    #[test]
    fn toggle_null_id_returns_null_arg() {
        let session = loaded_session();
        let result = listkeeper_toggle_status(session, std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        listkeeper_free_result(result);
        listkeeper_session_free(session);
    }

    #[test]
    fn null_session_returns_null_arg() {
        let result = listkeeper_start(std::ptr::null_mut());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        listkeeper_free_result(result);
    }

    #[test]
    fn resolve_unknown_ticket() {
        let session = new_session();
        let result = respond(session, 99, 200, "[]");
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::UnknownTicket);
        listkeeper_free_result(result);
        listkeeper_session_free(session);
    }

    #[test]
    fn resolve_null_response_returns_null_arg() {
        let session = new_session();
        let result = listkeeper_resolve(session, 1, std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        listkeeper_free_result(result);
        listkeeper_session_free(session);
    }

    #[test]
    fn select_out_of_range() {
        let session = loaded_session();
        let result = listkeeper_select(session, 7);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NoSuchList);
        listkeeper_free_result(result);
        listkeeper_session_free(session);
    }

    #[test]
    fn edit_round_trip() {
        let session = loaded_session();
        let id = CString::new("a").unwrap();
        let other = CString::new("b").unwrap();
        let body = CString::new("dishes").unwrap();
        let new_body = CString::new("wash dishes").unwrap();

        let entered = listkeeper_request_edit(session, id.as_ptr(), body.as_ptr());
        assert_eq!(unsafe { &*entered }.edit, FfiEditOutcome::Entered);
        assert!(unsafe { &*entered }.request.is_null());
        listkeeper_free_result(entered);

        let refused = listkeeper_request_edit(session, other.as_ptr(), body.as_ptr());
        assert_eq!(unsafe { &*refused }.edit, FfiEditOutcome::Refused);
        listkeeper_free_result(refused);

        let commit = listkeeper_request_edit(session, id.as_ptr(), new_body.as_ptr());
        let c = unsafe { &*commit };
        assert_eq!(c.edit, FfiEditOutcome::Committing);
        assert_eq!(path(c), "http://localhost:3000/items/a");
        let ticket = c.ticket;
        listkeeper_free_result(commit);

        let done = respond(session, ticket, 200, "{}");
        assert_eq!(unsafe { &*done }.event, FfiEventKind::BodyCommitted);
        listkeeper_free_result(done);

        let view = view(session);
        assert_eq!(view["items"][0]["body"], "wash dishes");
        assert!(view["editing"].is_null());
        listkeeper_session_free(session);
    }

    #[test]
    fn add_item_with_due_date() {
        let session = loaded_session();
        let body = CString::new("pay rent").unwrap();
        let result = listkeeper_add_item(session, body.as_ptr(), true, 1_600_700_700);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(path(r), "http://localhost:3000/lists/l1/items");
        let req = unsafe { &*r.request };
        let sent: serde_json::Value =
            serde_json::from_str(unsafe { CStr::from_ptr(req.body) }.to_str().unwrap()).unwrap();
        assert_eq!(sent["body"], "pay rent");
        assert_eq!(sent["due_date"], "2020-09-21T15:05:00Z");
        let ticket = r.ticket;
        listkeeper_free_result(result);

        let added = respond(
            session,
            ticket,
            201,
            r#"{"id":"c","body":"pay rent","status":"pending","created":3,"due_date":"2020-09-21T15:05:00Z"}"#,
        );
        let a = unsafe { &*added };
        assert_eq!(a.event, FfiEventKind::ItemAdded);
        assert_eq!(unsafe { CStr::from_ptr(a.detail) }.to_str().unwrap(), "c");
        listkeeper_free_result(added);

        assert_eq!(view(session)["items"][2]["due_date"], "9/21/2020 3:05PM");
        listkeeper_session_free(session);
    }

    #[test]
    fn set_filter_rejects_unknown_mode() {
        let session = loaded_session();
        let result = listkeeper_set_filter(session, 9);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::InvalidArg);
        listkeeper_free_result(result);

        let result = listkeeper_set_filter(session, FfiFilterMode::Completed as i32);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Ok);
        listkeeper_free_result(result);

        let view = view(session);
        assert_eq!(view["filter"], "completed");
        assert_eq!(view["items"].as_array().unwrap().len(), 1);
        listkeeper_session_free(session);
    }

    #[test]
    fn switching_back_needs_no_request() {
        let session = loaded_session();
        let second = listkeeper_select(session, 1);
        let ticket = unsafe { &*second }.ticket;
        assert_eq!(path(unsafe { &*second }), "http://localhost:3000/lists/l2/items");
        listkeeper_free_result(second);
        listkeeper_free_result(respond(session, ticket, 200, "[]"));

        let back = listkeeper_select(session, 0);
        let b = unsafe { &*back };
        assert_eq!(b.error_code, FfiErrorCode::Ok);
        assert!(b.request.is_null());
        assert_eq!(b.ticket, 0);
        listkeeper_free_result(back);
        assert_eq!(listkeeper_outstanding(session), 0);
        listkeeper_session_free(session);
    }

    #[test]
    fn free_result_null_is_safe() {
        listkeeper_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        listkeeper_free_string(std::ptr::null_mut());
    }
}
