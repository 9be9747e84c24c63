//! Error types for the list store client and the sync session.
//!
//! # Design
//! Three layers, kept apart on purpose:
//! - `ApiError` describes why a single store response could not be turned
//!   into a value. `NotFound` has its own variant because a deleted list or
//!   item is routine; every other non-2xx lands in `Http` with the raw body.
//! - `RemoteFailure` names which store operation failed. These never surface
//!   as `Err`: the session catches them when a response is resolved and
//!   reports them as events (or folds them into the sync status).
//! - `SyncError` is returned to the caller for misuse of the session, such as
//!   mutating before the active list has loaded.

/// Errors returned by `StoreClient` build and parse methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The store returned 404 for the requested list or item.
    #[error("resource not found")]
    NotFound,

    /// The store returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// A store operation that completed with an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteFailure {
    #[error("fetching lists failed: {0}")]
    FetchListsFailed(#[source] ApiError),

    #[error("fetching items of list {list_id} failed: {source}")]
    FetchItemsFailed {
        list_id: String,
        #[source]
        source: ApiError,
    },

    #[error("updating status of item {item_id} failed: {source}")]
    UpdateStatusFailed {
        item_id: String,
        #[source]
        source: ApiError,
    },

    #[error("deleting item {item_id} failed: {source}")]
    DeleteFailed {
        item_id: String,
        #[source]
        source: ApiError,
    },

    #[error("updating body of item {item_id} failed: {source}")]
    UpdateBodyFailed {
        item_id: String,
        #[source]
        source: ApiError,
    },

    #[error("creating item in list {list_id} failed: {source}")]
    CreateItemFailed {
        list_id: String,
        #[source]
        source: ApiError,
    },

    #[error("creating list failed: {0}")]
    CreateListFailed(#[source] ApiError),

    #[error("signing out failed: {0}")]
    SignOutFailed(#[source] ApiError),
}

/// Errors returned directly by `Session` and `SyncEngine` operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The active list's items have not been loaded yet.
    #[error("the active list has not finished loading")]
    NotLoaded,

    /// There is no active list (the registry is empty or not loaded).
    #[error("no list is active")]
    NoActiveList,

    /// No item with this id exists in the active list.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The registry has no list at this index.
    #[error("no list at index {index} (registry holds {len})")]
    NoSuchList { index: usize, len: usize },

    /// The ticket was never issued or has already been resolved.
    #[error("unknown ticket: {0}")]
    UnknownTicket(u64),

    /// A request could not be built.
    #[error(transparent)]
    Api(#[from] ApiError),
}
