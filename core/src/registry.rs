//! The collection of lists and which one is active.
//!
//! # Design
//! The registry owns every `TodoList` record. While a list is active its item
//! cache is lent to the `SyncEngine` (`take_items`) and comes back when the
//! list is deactivated (`restore_items`), so items fetched once are never
//! fetched again just because the user looked at another list.

use std::collections::HashMap;

use crate::error::{ApiError, RemoteFailure, SyncError};
use crate::model::{ItemCache, TodoList};
use crate::types::ListRecord;

#[derive(Debug, Default)]
pub struct ListRegistry {
    lists: Vec<TodoList>,
    active: Option<usize>,
    load_error: Option<RemoteFailure>,
}

impl ListRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the result of fetching every list. Each new list starts
    /// unfetched; lists already known keep their item caches.
    ///
    /// A failed first load leaves the registry empty. A failed reload keeps
    /// the lists already loaded. Either way the failure is remembered in
    /// `load_error` until the next successful load.
    pub fn load_all_lists(&mut self, outcome: Result<Vec<ListRecord>, ApiError>) -> Result<usize, RemoteFailure> {
        let records = match outcome {
            Ok(records) => records,
            Err(source) => {
                let failure = RemoteFailure::FetchListsFailed(source);
                tracing::warn!(error = %failure, kept = self.lists.len(), "list fetch failed");
                self.load_error = Some(failure.clone());
                return Err(failure);
            }
        };
        let active_id = self.active().map(|list| list.id().to_string());
        let mut previous: HashMap<String, ItemCache> = self
            .lists
            .drain(..)
            .map(|list| (list.record.id, list.items))
            .collect();
        self.lists = records
            .into_iter()
            .map(|record| {
                let items = previous.remove(&record.id).unwrap_or_default();
                TodoList { record, items }
            })
            .collect();
        self.active = active_id.and_then(|id| self.position(&id));
        self.load_error = None;
        tracing::info!(count = self.lists.len(), "lists loaded");
        Ok(self.lists.len())
    }

    /// Make `index` the active list. Returns whether the active list changed.
    /// With an empty registry there is nothing to select and the active list
    /// stays unset.
    pub fn select_by_index(&mut self, index: usize) -> Result<bool, SyncError> {
        if self.lists.is_empty() {
            return Ok(false);
        }
        if index >= self.lists.len() {
            return Err(SyncError::NoSuchList {
                index,
                len: self.lists.len(),
            });
        }
        if self.active == Some(index) {
            return Ok(false);
        }
        self.active = Some(index);
        tracing::info!(index, list = %self.lists[index].id(), "active list changed");
        Ok(true)
    }

    /// Add a list created elsewhere. The placeholder seed and lists already
    /// present are ignored. Returns whether the list was added.
    pub fn append_list(&mut self, list: TodoList) -> bool {
        if list.is_placeholder() || self.position(list.id()).is_some() {
            return false;
        }
        tracing::debug!(list = %list.id(), "list appended");
        self.lists.push(list);
        true
    }

    /// Lend the item cache of the list at `index` to the engine.
    pub fn take_items(&mut self, index: usize) -> ItemCache {
        self.lists
            .get_mut(index)
            .map(|list| std::mem::take(&mut list.items))
            .unwrap_or_default()
    }

    /// Return a cache taken with `take_items`. Dropped if the list is gone.
    pub fn restore_items(&mut self, list_id: &str, items: ItemCache) {
        if let Some(list) = self.lists.iter_mut().find(|list| list.id() == list_id) {
            list.items = items;
        }
    }

    /// The cache of an inactive list.
    pub fn items_mut(&mut self, list_id: &str) -> Option<&mut ItemCache> {
        self.lists
            .iter_mut()
            .find(|list| list.id() == list_id)
            .map(|list| &mut list.items)
    }

    fn position(&self, list_id: &str) -> Option<usize> {
        self.lists.iter().position(|list| list.id() == list_id)
    }

    pub fn lists(&self) -> &[TodoList] {
        &self.lists
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&TodoList> {
        self.active.and_then(|index| self.lists.get(index))
    }

    pub fn load_error(&self) -> Option<&RemoteFailure> {
        self.load_error.as_ref()
    }
}
