//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use listkeeper_core::{
    EditOutcome, FilterMode, HttpMethod, HttpRequest, Outbound, Resolved, Session, SessionEvent, SyncError, SyncEvent,
};

/// Opaque handle to a `Session`. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiSession {
    pub(crate) inner: Session,
}

/// Copy `s` into a C string owned by the caller. Interior NULs yield "".
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Reclaim a C string produced by `c_string`. Null is ignored.
pub(crate) fn drop_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Carried inside an `FfiCallResult`. The C caller executes the request and
/// hands the response back through `listkeeper_resolve` with the same ticket.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body,
        }))
    }

    /// Free a request built by `from_core`. Null is ignored.
    pub(crate) fn free(req: *mut Self) {
        if req.is_null() {
            return;
        }
        let req = unsafe { Box::from_raw(req) };
        drop_c_string(req.path);
        drop_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                drop_c_string(h.key);
                drop_c_string(h.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request, then
/// passes a pointer to `listkeeper_resolve`. The FFI layer reads but does not
/// free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiCallResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotLoaded = 1,
    NoActiveList = 2,
    UnknownItem = 3,
    NoSuchList = 4,
    UnknownTicket = 5,
    Api = 6,
    Panic = 7,
    NullArg = 8,
    InvalidArg = 9,
}

impl From<&SyncError> for FfiErrorCode {
    fn from(err: &SyncError) -> Self {
        match err {
            SyncError::NotLoaded => FfiErrorCode::NotLoaded,
            SyncError::NoActiveList => FfiErrorCode::NoActiveList,
            SyncError::UnknownItem(_) => FfiErrorCode::UnknownItem,
            SyncError::NoSuchList { .. } => FfiErrorCode::NoSuchList,
            SyncError::UnknownTicket(_) => FfiErrorCode::UnknownTicket,
            SyncError::Api(_) => FfiErrorCode::Api,
        }
    }
}

/// Outcome of `listkeeper_request_edit`. `NotApplicable` everywhere else.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiEditOutcome {
    NotApplicable = 0,
    Entered = 1,
    Refused = 2,
    Committing = 3,
    AlreadyCommitting = 4,
}

/// What `listkeeper_resolve` did. `None` for every other call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiEventKind {
    None = 0,
    ListsLoaded = 1,
    ListsUnavailable = 2,
    ListCreated = 3,
    ListRejected = 4,
    SignedOut = 5,
    SignOutRejected = 6,
    ItemsLoaded = 7,
    ItemsUnavailable = 8,
    StatusConfirmed = 9,
    StatusRejected = 10,
    ItemRemoved = 11,
    RemoveRejected = 12,
    BodyCommitted = 13,
    BodyRejected = 14,
    ItemAdded = 15,
    AddRejected = 16,
}

/// Filter selector accepted by `listkeeper_set_filter`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiFilterMode {
    All = 0,
    Pending = 1,
    Completed = 2,
}

impl FfiFilterMode {
    /// Decode the raw value a C caller passed. `None` if out of range.
    pub(crate) fn decode(raw: i32) -> Option<FilterMode> {
        match raw {
            r if r == FfiFilterMode::All as i32 => Some(FilterMode::All),
            r if r == FfiFilterMode::Pending as i32 => Some(FilterMode::Pending),
            r if r == FfiFilterMode::Completed as i32 => Some(FilterMode::Completed),
            _ => None,
        }
    }
}

/// Result envelope for every session call.
///
/// On success `error_code` is `Ok` and `error_message` is null. If the call
/// needs the store, `request` points to the request to execute and `ticket`
/// identifies it; otherwise `request` is null and `ticket` is 0.
///
/// For `listkeeper_resolve`, `event` says what the response did and
/// `background` is set when it belonged to a list that is no longer active.
/// `detail` carries the failure text of a rejected operation, or the id of a
/// created list or item; it is null otherwise.
#[repr(C)]
pub struct FfiCallResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub ticket: u64,
    pub request: *mut FfiHttpRequest,
    pub edit: FfiEditOutcome,
    pub event: FfiEventKind,
    pub background: bool,
    pub detail: *mut c_char,
}

impl FfiCallResult {
    fn empty(error_code: FfiErrorCode) -> Self {
        FfiCallResult {
            error_code,
            error_message: std::ptr::null_mut(),
            ticket: 0,
            request: std::ptr::null_mut(),
            edit: FfiEditOutcome::NotApplicable,
            event: FfiEventKind::None,
            background: false,
            detail: std::ptr::null_mut(),
        }
    }

    fn failed(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        let result = FfiCallResult {
            error_message: c_string(msg),
            ..Self::empty(error_code)
        };
        Box::into_raw(Box::new(result))
    }

    fn with_outbound(mut self, outbound: Option<Outbound>) -> Self {
        if let Some(outbound) = outbound {
            self.ticket = outbound.ticket;
            self.request = FfiHttpRequest::from_core(outbound.request);
        }
        self
    }

    /// A success result, carrying a request if there is one to execute.
    pub(crate) fn ok(outbound: Option<Outbound>) -> *mut Self {
        Box::into_raw(Box::new(Self::empty(FfiErrorCode::Ok).with_outbound(outbound)))
    }

    pub(crate) fn edit(outcome: EditOutcome<Outbound>) -> *mut Self {
        let (edit, outbound) = match outcome {
            EditOutcome::Entered => (FfiEditOutcome::Entered, None),
            EditOutcome::Refused => (FfiEditOutcome::Refused, None),
            EditOutcome::Committing(commit) => (FfiEditOutcome::Committing, Some(commit)),
            EditOutcome::AlreadyCommitting => (FfiEditOutcome::AlreadyCommitting, None),
        };
        let result = FfiCallResult {
            edit,
            ..Self::empty(FfiErrorCode::Ok)
        };
        Box::into_raw(Box::new(result.with_outbound(outbound)))
    }

    pub(crate) fn resolved(resolved: Resolved) -> *mut Self {
        let (event, background, detail) = describe(resolved.event);
        let result = FfiCallResult {
            event,
            background,
            detail: detail.map_or(std::ptr::null_mut(), |d| c_string(d)),
            ..Self::empty(FfiErrorCode::Ok)
        };
        Box::into_raw(Box::new(result.with_outbound(resolved.follow_up)))
    }

    /// Build an error result from a `SyncError`.
    pub(crate) fn from_error(err: SyncError) -> *mut Self {
        Self::failed(FfiErrorCode::from(&err), &err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failed(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for an argument that is not valid UTF-8 or out
    /// of range.
    pub(crate) fn invalid_arg(name: &str) -> *mut Self {
        Self::failed(FfiErrorCode::InvalidArg, &format!("invalid argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failed(FfiErrorCode::Panic, msg)
    }

    /// Free a result and everything it owns. Null is ignored.
    pub(crate) fn free(result: *mut Self) {
        if result.is_null() {
            return;
        }
        let result = unsafe { Box::from_raw(result) };
        drop_c_string(result.error_message);
        drop_c_string(result.detail);
        FfiHttpRequest::free(result.request);
    }
}

fn describe(event: SessionEvent) -> (FfiEventKind, bool, Option<String>) {
    match event {
        SessionEvent::ListsLoaded { .. } => (FfiEventKind::ListsLoaded, false, None),
        SessionEvent::ListsUnavailable(failure) => (FfiEventKind::ListsUnavailable, false, Some(failure.to_string())),
        SessionEvent::ListCreated { list_id } => (FfiEventKind::ListCreated, false, Some(list_id)),
        SessionEvent::ListRejected(failure) => (FfiEventKind::ListRejected, false, Some(failure.to_string())),
        SessionEvent::SignedOut => (FfiEventKind::SignedOut, false, None),
        SessionEvent::SignOutRejected(failure) => (FfiEventKind::SignOutRejected, false, Some(failure.to_string())),
        SessionEvent::Active(event) => {
            let (kind, detail) = describe_sync(event);
            (kind, false, detail)
        }
        SessionEvent::Background(event) => {
            let (kind, detail) = describe_sync(event);
            (kind, true, detail)
        }
    }
}

fn describe_sync(event: SyncEvent) -> (FfiEventKind, Option<String>) {
    match event {
        SyncEvent::ItemsLoaded { .. } => (FfiEventKind::ItemsLoaded, None),
        SyncEvent::ItemsUnavailable { failure, .. } => (FfiEventKind::ItemsUnavailable, Some(failure.to_string())),
        SyncEvent::StatusConfirmed { .. } => (FfiEventKind::StatusConfirmed, None),
        SyncEvent::StatusRejected { failure, .. } => (FfiEventKind::StatusRejected, Some(failure.to_string())),
        SyncEvent::ItemRemoved { .. } => (FfiEventKind::ItemRemoved, None),
        SyncEvent::RemoveRejected { failure, .. } => (FfiEventKind::RemoveRejected, Some(failure.to_string())),
        SyncEvent::BodyCommitted { .. } => (FfiEventKind::BodyCommitted, None),
        SyncEvent::BodyRejected { failure, .. } => (FfiEventKind::BodyRejected, Some(failure.to_string())),
        SyncEvent::ItemAdded { item_id } => (FfiEventKind::ItemAdded, Some(item_id)),
        SyncEvent::AddRejected { failure, .. } => (FfiEventKind::AddRejected, Some(failure.to_string())),
    }
}
