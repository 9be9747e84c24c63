//! Local/remote synchronization core for the list manager.
//!
//! # Overview
//! Keeps what the UI shows in step with a remote document store: which list
//! is active, its items in creation order, optimistic status toggles, a
//! single edit session, filtered views and a synced/syncing/error indicator.
//!
//! # Design
//! - Host-does-IO: the core builds `HttpRequest` values and consumes
//!   `HttpResponse` values; it never touches the network itself. `Session`
//!   hands out ticketed `Outbound` requests and takes responses back through
//!   `Session::resolve`, in any order.
//! - `StoreClient` is stateless and split into `build_*` / `parse_*`.
//! - `ListRegistry` owns the lists; `SyncEngine` owns the active list's item
//!   cache and is rebuilt on every list switch.
//! - Wire records (`types`) are kept apart from the display model (`model`).

pub mod client;
pub mod config;
pub mod edit_lock;
pub mod engine;
pub mod error;
pub mod filter;
pub mod http;
pub mod model;
pub mod registry;
pub mod session;
pub mod types;

pub use client::StoreClient;
pub use config::SessionConfig;
pub use edit_lock::{EditLock, EditRequest};
pub use engine::{EditOutcome, Effect, PendingOp, SyncEngine, SyncEvent, SyncStatus};
pub use error::{ApiError, RemoteFailure, SyncError};
pub use filter::{filter_view, FilterMode};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use model::{Confirmation, DueDate, ItemCache, ItemSnapshot, TodoItem, TodoList, SENTINEL_ID};
pub use registry::ListRegistry;
pub use session::{Outbound, Resolved, Session, SessionEvent, SessionView, Ticket};
pub use types::{ItemPatch, ItemRecord, ItemStatus, ListRecord, NewItem, NewList};
