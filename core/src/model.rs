//! In-memory model of lists and items as the UI sees them.
//!
//! # Design
//! A list's items are either not fetched yet or fetched; `ItemCache` makes
//! that a type-level distinction instead of a placeholder element. Fetched
//! items live in an `ItemSnapshot`: an `Arc`'d vector plus a version number.
//! Every mutation goes through `Arc::make_mut`, so a snapshot handed to the
//! UI is never changed underneath it, and the version tells the UI whether
//! it needs to redraw.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Serialize, Serializer};

use crate::types::{ItemRecord, ItemStatus, ListRecord};

/// Id marking a list or item that is not a real store entity.
pub const SENTINEL_ID: &str = "-1";

/// A due date normalized for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueDate {
    None,
    At(String),
}

impl DueDate {
    /// Format a stored due date in `offset`, e.g. `9/21/2020 3:05PM`.
    pub fn normalize(due: Option<DateTime<Utc>>, offset: FixedOffset) -> Self {
        match due {
            Some(at) => DueDate::At(at.with_timezone(&offset).format("%-m/%-d/%Y %-I:%M%p").to_string()),
            None => DueDate::None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DueDate::None => "none",
            DueDate::At(display) => display.as_str(),
        }
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Whether the store is believed to hold an item's local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confirmation {
    /// Local state matches the last successful write (or the fetch).
    Confirmed,
    /// At least one write for this item is outstanding.
    Pending,
    /// The most recent write failed; local state may differ from the store.
    Unconfirmed,
}

/// One item of the active list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoItem {
    pub id: String,
    pub body: String,
    pub status: ItemStatus,
    pub created: i64,
    pub due_date: DueDate,
    pub confirmation: Confirmation,
    #[serde(skip)]
    pending_writes: u32,
    #[serde(skip)]
    last_write_failed: bool,
}

impl TodoItem {
    pub fn from_record(record: ItemRecord, offset: FixedOffset) -> Self {
        Self {
            id: record.id,
            body: record.body,
            status: record.status,
            created: record.created,
            due_date: DueDate::normalize(record.due_date, offset),
            confirmation: Confirmation::Confirmed,
            pending_writes: 0,
            last_write_failed: false,
        }
    }

    fn begin_write(&mut self) {
        self.pending_writes += 1;
        self.refresh_confirmation();
    }

    fn finish_write(&mut self, succeeded: bool) {
        self.pending_writes = self.pending_writes.saturating_sub(1);
        self.last_write_failed = !succeeded;
        self.refresh_confirmation();
    }

    fn refresh_confirmation(&mut self) {
        self.confirmation = if self.pending_writes > 0 {
            Confirmation::Pending
        } else if self.last_write_failed {
            Confirmation::Unconfirmed
        } else {
            Confirmation::Confirmed
        };
    }
}

/// An immutable, versioned view of a fetched item sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    version: u64,
    items: Arc<Vec<TodoItem>>,
}

impl ItemSnapshot {
    /// Build from store records: normalize due dates and sort ascending by
    /// creation time. Records with equal timestamps keep their fetched order.
    pub fn from_records(records: Vec<ItemRecord>, offset: FixedOffset) -> Self {
        let mut items: Vec<TodoItem> = records
            .into_iter()
            .map(|record| TodoItem::from_record(record, offset))
            .collect();
        items.sort_by_key(|item| item.created);
        Self {
            version: 0,
            items: Arc::new(items),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Continue the version sequence of a snapshot this one replaces.
    pub(crate) fn succeeding(mut self, previous: Option<&ItemSnapshot>) -> Self {
        if let Some(previous) = previous {
            self.version = previous.version + 1;
        }
        self
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    /// A cheap handle on the current items; later mutations do not affect it.
    pub fn shared(&self) -> Arc<Vec<TodoItem>> {
        Arc::clone(&self.items)
    }

    pub fn get(&self, id: &str) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn modify_item(&mut self, id: &str, f: impl FnOnce(&mut TodoItem)) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };
        f(&mut Arc::make_mut(&mut self.items)[index]);
        self.version += 1;
        true
    }

    /// Flip an item's status and mark a write as outstanding. Returns the new
    /// status, or `None` if the item is absent.
    pub(crate) fn toggle(&mut self, id: &str) -> Option<ItemStatus> {
        let mut flipped = None;
        self.modify_item(id, |item| {
            item.status = item.status.toggled();
            item.begin_write();
            flipped = Some(item.status);
        });
        flipped
    }

    pub(crate) fn finish_write(&mut self, id: &str, succeeded: bool) -> bool {
        self.modify_item(id, |item| item.finish_write(succeeded))
    }

    pub(crate) fn set_body(&mut self, id: &str, body: &str) -> bool {
        self.modify_item(id, |item| item.body = body.to_string())
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        Arc::make_mut(&mut self.items).retain(|item| item.id != id);
        self.version += 1;
        true
    }

    /// Insert keeping the ascending creation order; ties go after existing items.
    pub(crate) fn insert(&mut self, item: TodoItem) {
        let items = Arc::make_mut(&mut self.items);
        let at = items.partition_point(|existing| existing.created <= item.created);
        items.insert(at, item);
        self.version += 1;
    }
}

/// The items of one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ItemCache {
    /// Never fetched from the store during this registry's lifetime.
    #[default]
    Unfetched,
    Fetched(ItemSnapshot),
}

impl ItemCache {
    pub fn is_fetched(&self) -> bool {
        matches!(self, ItemCache::Fetched(_))
    }

    pub fn snapshot(&self) -> Option<&ItemSnapshot> {
        match self {
            ItemCache::Fetched(snapshot) => Some(snapshot),
            ItemCache::Unfetched => None,
        }
    }

    pub(crate) fn snapshot_mut(&mut self) -> Option<&mut ItemSnapshot> {
        match self {
            ItemCache::Fetched(snapshot) => Some(snapshot),
            ItemCache::Unfetched => None,
        }
    }
}

/// A list together with its item cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoList {
    pub record: ListRecord,
    pub items: ItemCache,
}

impl TodoList {
    /// A list fresh from the store; its items are fetched on activation.
    pub fn unfetched(record: ListRecord) -> Self {
        Self {
            record,
            items: ItemCache::Unfetched,
        }
    }

    /// The "nothing to add" value that seeds the list-append path.
    pub fn placeholder() -> Self {
        Self::unfetched(ListRecord {
            id: SENTINEL_ID.to_string(),
            name: String::new(),
            color: String::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn is_placeholder(&self) -> bool {
        self.record.id == SENTINEL_ID
    }
}
