//! The single edit session shared by every item of the visible list.
//!
//! # Design
//! The lock is a three-state resource: free, held by one item, or held by
//! one item whose commit is in flight. Only the holder can move it forward,
//! and a list switch force-releases it regardless of state.

/// Current state of the edit lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditLock {
    #[default]
    Free,
    Held { item_id: String, committing: bool },
}

/// What a request to toggle edit mode on an item resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRequest {
    /// The lock was free and now belongs to the item.
    Granted,
    /// Another item holds the lock; nothing changed.
    Refused,
    /// The item already holds the lock: its body should be committed.
    Commit,
    /// The item's commit is already in flight.
    AlreadyCommitting,
}

impl EditLock {
    pub fn holder(&self) -> Option<&str> {
        match self {
            EditLock::Free => None,
            EditLock::Held { item_id, .. } => Some(item_id.as_str()),
        }
    }

    pub fn is_held_by(&self, id: &str) -> bool {
        self.holder() == Some(id)
    }

    /// Acquire for `id`, or start the holder's commit.
    pub fn request(&mut self, id: &str) -> EditRequest {
        match self {
            EditLock::Free => {
                *self = EditLock::Held {
                    item_id: id.to_string(),
                    committing: false,
                };
                EditRequest::Granted
            }
            EditLock::Held { item_id, .. } if item_id.as_str() != id => EditRequest::Refused,
            EditLock::Held { committing: true, .. } => EditRequest::AlreadyCommitting,
            EditLock::Held { committing, .. } => {
                *committing = true;
                EditRequest::Commit
            }
        }
    }

    /// Mark the holder's commit as started; no-op for anyone else.
    pub fn begin_commit(&mut self, id: &str) {
        if let EditLock::Held { item_id, committing } = self {
            if item_id.as_str() == id {
                *committing = true;
            }
        }
    }

    /// The holder's commit failed: keep the lock, allow another attempt.
    pub fn commit_failed(&mut self, id: &str) {
        if let EditLock::Held { item_id, committing } = self {
            if item_id.as_str() == id {
                *committing = false;
            }
        }
    }

    /// Release if `id` holds the lock. Returns whether it did.
    pub fn release(&mut self, id: &str) -> bool {
        if self.is_held_by(id) {
            *self = EditLock::Free;
            return true;
        }
        false
    }

    /// Release unconditionally, e.g. when the visible list is replaced.
    pub fn force_release(&mut self) -> Option<String> {
        match std::mem::take(self) {
            EditLock::Free => None,
            EditLock::Held { item_id, .. } => Some(item_id),
        }
    }
}
