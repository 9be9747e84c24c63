//! Wire records exchanged with the document store.
//!
//! # Design
//! These mirror the store's JSON schema but are defined independently of
//! the mock-server crate; the integration tests catch drift between the
//! two. They are deliberately dumb: due dates stay `DateTime<Utc>` here and
//! only become display strings once the engine normalizes them into
//! `model::TodoItem`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Completed,
}

impl ItemStatus {
    /// The other state.
    pub fn toggled(self) -> Self {
        match self {
            ItemStatus::Pending => ItemStatus::Completed,
            ItemStatus::Completed => ItemStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Completed => "completed",
        }
    }
}

/// A list as stored remotely (without its items).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// An item as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    #[serde(default)]
    pub list_id: String,
    pub body: String,
    pub status: ItemStatus,
    /// Creation time in milliseconds since the Unix epoch.
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Payload for creating a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewList {
    pub name: String,
    pub color: String,
}

/// Payload for creating an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial item update. Only the fields present in the JSON are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}
