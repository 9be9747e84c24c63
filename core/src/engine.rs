//! Sync engine for the active list.
//!
//! # Design
//! `SyncEngine` owns the item cache of exactly one list (or none, while the
//! registry is empty) and decides what the UI believes right now. Every
//! store interaction is an `Effect`: a `PendingOp` describing what to do
//! with the answer, plus the `HttpRequest` to send. The engine never waits;
//! `apply` is called later with the response, in whatever order the host
//! gets them back.
//!
//! Status toggles are optimistic and never rolled back; the item is marked
//! `Pending`, then `Confirmed` or `Unconfirmed`. Deletes and body edits only
//! touch the cache once the store has confirmed them.
//!
//! The cache-level half of `apply` lives in `settle`, which the session also
//! uses for responses that arrive after their list stopped being active.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::client::StoreClient;
use crate::edit_lock::{EditLock, EditRequest};
use crate::error::{RemoteFailure, SyncError};
use crate::filter::{filter_view, FilterMode};
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{ItemCache, ItemSnapshot, TodoItem};
use crate::types::{ItemStatus, ListRecord, NewItem};

/// Shown when the active list's items cannot be fetched.
pub const FETCH_FAILED_MESSAGE: &str = "Error Loading List";
/// Shown when a status update or an item add is rejected by the store.
pub const WRITE_FAILED_MESSAGE: &str = "Error Adding List";

/// The three-valued indicator next to the list title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    Syncing,
    Error(String),
}

/// What to do with the response to an outstanding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOp {
    FetchItems { list_id: String },
    UpdateStatus { item_id: String, status: ItemStatus },
    UpdateBody { item_id: String, body: String },
    DeleteItem { item_id: String },
    CreateItem { list_id: String },
}

impl PendingOp {
    pub fn is_fetch(&self) -> bool {
        matches!(self, PendingOp::FetchItems { .. })
    }

    /// Whether the answer moves the sync indicator. Deletes and body edits
    /// report through their own events.
    pub fn drives_status(&self) -> bool {
        matches!(
            self,
            PendingOp::FetchItems { .. } | PendingOp::UpdateStatus { .. } | PendingOp::CreateItem { .. }
        )
    }
}

/// A request the host must execute, and how to interpret its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub op: PendingOp,
    pub request: HttpRequest,
}

/// Result of asking to toggle edit mode on an item. `T` is whatever carries
/// the commit request: an `Effect` here, an `Outbound` at the session level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome<T = Effect> {
    /// The item is now in edit mode.
    Entered,
    /// Another item is being edited; nothing changed.
    Refused,
    /// The item was in edit mode; its body is being committed.
    Committing(T),
    /// The item's commit is already in flight.
    AlreadyCommitting,
}

impl<T> EditOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> EditOutcome<U> {
        match self {
            EditOutcome::Entered => EditOutcome::Entered,
            EditOutcome::Refused => EditOutcome::Refused,
            EditOutcome::Committing(commit) => EditOutcome::Committing(f(commit)),
            EditOutcome::AlreadyCommitting => EditOutcome::AlreadyCommitting,
        }
    }
}

/// What a resolved response did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    ItemsLoaded { list_id: String, count: usize },
    ItemsUnavailable { list_id: String, failure: RemoteFailure },
    StatusConfirmed { item_id: String },
    StatusRejected { item_id: String, failure: RemoteFailure },
    ItemRemoved { item_id: String },
    RemoveRejected { item_id: String, failure: RemoteFailure },
    BodyCommitted { item_id: String },
    BodyRejected { item_id: String, failure: RemoteFailure },
    ItemAdded { item_id: String },
    AddRejected { list_id: String, failure: RemoteFailure },
}

/// Apply a response to an item cache. Touches nothing but the cache.
pub(crate) fn settle(
    cache: &mut ItemCache,
    client: &StoreClient,
    offset: FixedOffset,
    op: PendingOp,
    response: HttpResponse,
) -> SyncEvent {
    match op {
        PendingOp::FetchItems { list_id } => match client.parse_fetch_items(response) {
            Ok(records) => {
                let count = records.len();
                let fresh = ItemSnapshot::from_records(records, offset).succeeding(cache.snapshot());
                *cache = ItemCache::Fetched(fresh);
                tracing::info!(list = %list_id, count, "items loaded");
                SyncEvent::ItemsLoaded { list_id, count }
            }
            Err(source) => {
                let failure = RemoteFailure::FetchItemsFailed {
                    list_id: list_id.clone(),
                    source,
                };
                tracing::warn!(error = %failure, "fetch failed");
                SyncEvent::ItemsUnavailable { list_id, failure }
            }
        },
        PendingOp::UpdateStatus { item_id, status } => {
            let outcome = client.parse_update_item(response);
            if let Some(snapshot) = cache.snapshot_mut() {
                snapshot.finish_write(&item_id, outcome.is_ok());
            }
            match outcome {
                Ok(()) => {
                    tracing::debug!(item = %item_id, status = status.as_str(), "status confirmed");
                    SyncEvent::StatusConfirmed { item_id }
                }
                Err(source) => {
                    let failure = RemoteFailure::UpdateStatusFailed {
                        item_id: item_id.clone(),
                        source,
                    };
                    tracing::warn!(error = %failure, "status update failed, keeping local value");
                    SyncEvent::StatusRejected { item_id, failure }
                }
            }
        }
        PendingOp::UpdateBody { item_id, body } => match client.parse_update_item(response) {
            Ok(()) => {
                if let Some(snapshot) = cache.snapshot_mut() {
                    snapshot.set_body(&item_id, &body);
                }
                tracing::debug!(item = %item_id, "body committed");
                SyncEvent::BodyCommitted { item_id }
            }
            Err(source) => {
                let failure = RemoteFailure::UpdateBodyFailed {
                    item_id: item_id.clone(),
                    source,
                };
                tracing::warn!(error = %failure, "body update failed");
                SyncEvent::BodyRejected { item_id, failure }
            }
        },
        PendingOp::DeleteItem { item_id } => match client.parse_delete_item(response) {
            Ok(()) => {
                if let Some(snapshot) = cache.snapshot_mut() {
                    snapshot.remove(&item_id);
                }
                tracing::debug!(item = %item_id, "item deleted");
                SyncEvent::ItemRemoved { item_id }
            }
            Err(source) => {
                let failure = RemoteFailure::DeleteFailed {
                    item_id: item_id.clone(),
                    source,
                };
                tracing::warn!(error = %failure, "delete failed, item kept");
                SyncEvent::RemoveRejected { item_id, failure }
            }
        },
        PendingOp::CreateItem { list_id } => match client.parse_create_item(response) {
            Ok(record) => {
                let item = TodoItem::from_record(record, offset);
                let item_id = item.id.clone();
                if let Some(snapshot) = cache.snapshot_mut() {
                    snapshot.insert(item);
                }
                tracing::debug!(list = %list_id, item = %item_id, "item created");
                SyncEvent::ItemAdded { item_id }
            }
            Err(source) => {
                let failure = RemoteFailure::CreateItemFailed {
                    list_id: list_id.clone(),
                    source,
                };
                tracing::warn!(error = %failure, "create failed");
                SyncEvent::AddRejected { list_id, failure }
            }
        },
    }
}

/// Owns the active list's items, its sync status, filter and edit lock.
#[derive(Debug)]
pub struct SyncEngine {
    client: StoreClient,
    offset: FixedOffset,
    list: Option<ListRecord>,
    items: ItemCache,
    loaded: bool,
    synced: bool,
    error: Option<String>,
    /// Outstanding requests that drive the status indicator.
    in_flight: usize,
    filter: FilterMode,
    lock: EditLock,
}

impl SyncEngine {
    /// An engine with no active list: stays in its initial state.
    pub fn idle(client: StoreClient, offset: FixedOffset) -> Self {
        Self {
            client,
            offset,
            list: None,
            items: ItemCache::Unfetched,
            loaded: false,
            synced: false,
            error: None,
            in_flight: 0,
            filter: FilterMode::default(),
            lock: EditLock::default(),
        }
    }

    /// An engine that takes ownership of `list`'s item cache.
    pub fn new(client: StoreClient, offset: FixedOffset, list: ListRecord, items: ItemCache) -> Self {
        Self {
            list: Some(list),
            items,
            ..Self::idle(client, offset)
        }
    }

    /// React to becoming the active list. Returns the bulk fetch to send if
    /// the items were never fetched; a cached list is ready immediately.
    pub fn activate(&mut self) -> Option<Effect> {
        let list_id = self.list.as_ref()?.id.clone();
        if self.items.is_fetched() {
            tracing::debug!(list = %list_id, "using cached items");
            self.loaded = true;
            if self.in_flight == 0 {
                self.mark_synced();
            }
            return None;
        }
        Some(self.fetch(list_id))
    }

    /// Count `count` requests an earlier activation of this list sent, and
    /// that are still unanswered, as this engine's own.
    pub fn adopt_outstanding(&mut self, count: usize) {
        if count > 0 {
            self.in_flight += count;
            self.synced = false;
        }
    }

    /// Re-issue the bulk fetch, whatever the current status.
    pub fn resync(&mut self) -> Result<Effect, SyncError> {
        let list_id = self.list.as_ref().ok_or(SyncError::NoActiveList)?.id.clone();
        Ok(self.fetch(list_id))
    }

    fn fetch(&mut self, list_id: String) -> Effect {
        self.begin_sync();
        let request = self.client.build_fetch_items(&list_id);
        tracing::debug!(list = %list_id, "fetching items");
        Effect {
            op: PendingOp::FetchItems { list_id },
            request,
        }
    }

    /// Flip an item's status locally and send the new value.
    pub fn toggle_status(&mut self, id: &str) -> Result<Effect, SyncError> {
        let next = self.loaded_item(id)?.status.toggled();
        let request = self.client.build_update_status(id, next)?;
        if let Some(snapshot) = self.items.snapshot_mut() {
            snapshot.toggle(id);
        }
        self.begin_sync();
        Ok(Effect {
            op: PendingOp::UpdateStatus {
                item_id: id.to_string(),
                status: next,
            },
            request,
        })
    }

    /// Ask the store to delete an item. The cache changes only on success.
    pub fn remove_by_id(&mut self, id: &str) -> Result<Effect, SyncError> {
        self.loaded_item(id)?;
        Ok(Effect {
            op: PendingOp::DeleteItem { item_id: id.to_string() },
            request: self.client.build_delete_item(id),
        })
    }

    /// Send a new body. The cache changes, and edit mode ends, only on success.
    pub fn commit_body_edit(&mut self, id: &str, body: &str) -> Result<Effect, SyncError> {
        self.loaded_item(id)?;
        let request = self.client.build_update_body(id, body)?;
        self.lock.begin_commit(id);
        Ok(Effect {
            op: PendingOp::UpdateBody {
                item_id: id.to_string(),
                body: body.to_string(),
            },
            request,
        })
    }

    /// Enter edit mode on `id`, or commit `current_body` if `id` is already
    /// being edited.
    pub fn request_edit(&mut self, id: &str, current_body: &str) -> Result<EditOutcome, SyncError> {
        self.loaded_item(id)?;
        match self.lock.request(id) {
            EditRequest::Granted => Ok(EditOutcome::Entered),
            EditRequest::Refused => Ok(EditOutcome::Refused),
            EditRequest::AlreadyCommitting => Ok(EditOutcome::AlreadyCommitting),
            EditRequest::Commit => match self.commit_body_edit(id, current_body) {
                Ok(effect) => Ok(EditOutcome::Committing(effect)),
                Err(err) => {
                    self.lock.commit_failed(id);
                    Err(err)
                }
            },
        }
    }

    /// Create an item in the active list.
    pub fn add_item(&mut self, body: &str, due_date: Option<DateTime<Utc>>) -> Result<Effect, SyncError> {
        let list_id = self.list.as_ref().ok_or(SyncError::NoActiveList)?.id.clone();
        if !self.loaded {
            return Err(SyncError::NotLoaded);
        }
        let input = NewItem {
            body: body.to_string(),
            due_date,
        };
        let request = self.client.build_create_item(&list_id, &input)?;
        self.begin_sync();
        Ok(Effect {
            op: PendingOp::CreateItem { list_id },
            request,
        })
    }

    /// Feed back the response to an effect this list issued.
    pub fn apply(&mut self, op: PendingOp, response: HttpResponse) -> SyncEvent {
        let event = settle(&mut self.items, &self.client, self.offset, op, response);
        match &event {
            SyncEvent::ItemsLoaded { .. } => {
                self.loaded = true;
                self.sync_succeeded();
            }
            SyncEvent::ItemsUnavailable { .. } => self.sync_failed(FETCH_FAILED_MESSAGE),
            SyncEvent::StatusConfirmed { .. } | SyncEvent::ItemAdded { .. } => self.sync_succeeded(),
            SyncEvent::StatusRejected { .. } | SyncEvent::AddRejected { .. } => {
                self.sync_failed(WRITE_FAILED_MESSAGE)
            }
            SyncEvent::ItemRemoved { item_id } => {
                if self.lock.release(item_id) {
                    tracing::debug!(item = %item_id, "edit lock released by delete");
                }
            }
            SyncEvent::RemoveRejected { .. } => {}
            SyncEvent::BodyCommitted { item_id } => {
                self.lock.release(item_id);
            }
            SyncEvent::BodyRejected { item_id, .. } => self.lock.commit_failed(item_id),
        }
        event
    }

    /// Settle a response to a request sent before this engine took over the
    /// list. The cache changes; the status indicator never counted it.
    pub fn absorb(&mut self, op: PendingOp, response: HttpResponse) -> SyncEvent {
        let event = settle(&mut self.items, &self.client, self.offset, op, response);
        if let SyncEvent::ItemRemoved { item_id } = &event {
            self.lock.release(item_id);
        }
        event
    }

    /// Give up the list: release the edit lock and hand back the cache.
    pub fn detach(mut self) -> Option<(ListRecord, ItemCache)> {
        if let Some(holder) = self.lock.force_release() {
            tracing::debug!(item = %holder, "edit lock released by list switch");
        }
        let list = self.list.take()?;
        Some((list, self.items))
    }

    fn loaded_item(&self, id: &str) -> Result<&TodoItem, SyncError> {
        if self.list.is_none() {
            return Err(SyncError::NoActiveList);
        }
        if !self.loaded {
            return Err(SyncError::NotLoaded);
        }
        self.items
            .snapshot()
            .and_then(|snapshot| snapshot.get(id))
            .ok_or_else(|| SyncError::UnknownItem(id.to_string()))
    }

    fn begin_sync(&mut self) {
        self.in_flight += 1;
        self.synced = false;
    }

    fn sync_succeeded(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.mark_synced();
        }
    }

    fn sync_failed(&mut self, message: &str) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.synced = false;
        self.error = Some(message.to_string());
    }

    /// The only place error text is cleared.
    fn mark_synced(&mut self) {
        self.synced = true;
        self.error = None;
    }

    pub fn status(&self) -> SyncStatus {
        match &self.error {
            Some(message) => SyncStatus::Error(message.clone()),
            None if self.synced => SyncStatus::Synced,
            None => SyncStatus::Syncing,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn list(&self) -> Option<&ListRecord> {
        self.list.as_ref()
    }

    pub fn snapshot(&self) -> Option<&ItemSnapshot> {
        self.items.snapshot()
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
    }

    /// The items to display: filtered, in creation order. Empty until loaded.
    pub fn visible_items(&self) -> Vec<&TodoItem> {
        match self.items.snapshot() {
            Some(snapshot) if self.loaded => filter_view(snapshot.items(), self.filter),
            _ => Vec::new(),
        }
    }

    /// The item currently in edit mode, if any.
    pub fn editing(&self) -> Option<&str> {
        self.lock.holder()
    }

    pub fn edit_lock(&self) -> &EditLock {
        &self.lock
    }
}
