//! Status filter over an item sequence.

use serde::{Deserialize, Serialize};

use crate::model::TodoItem;
use crate::types::ItemStatus;

/// Which items the list view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Pending,
    Completed,
}

impl FilterMode {
    pub fn admits(self, status: ItemStatus) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Pending => status == ItemStatus::Pending,
            FilterMode::Completed => status == ItemStatus::Completed,
        }
    }
}

/// The items `mode` admits, in their original relative order.
pub fn filter_view(items: &[TodoItem], mode: FilterMode) -> Vec<&TodoItem> {
    items.iter().filter(|item| mode.admits(item.status)).collect()
}
