//! Host-facing facade: registry, active engine and outstanding requests.
//!
//! # Design
//! Every operation that needs the store hands back an `Outbound`: a ticket
//! plus the request to execute. The host runs the request however it likes
//! (fetch in a browser, ureq in a test, a C caller through the FFI) and later
//! calls `resolve` with the same ticket. Tickets can be resolved in any order
//! or never; an unresolved ticket only keeps its own effect pending.
//!
//! Each ticket remembers the list it was issued for and the engine
//! generation that issued it. A response for a list that has since been
//! switched away from is settled against that list's cache in the registry
//! instead of the active engine. When a list becomes active again, the new
//! engine adopts its still unanswered fetches, toggles and adds so the
//! indicator keeps counting them. Deletes and body edits sent by an earlier
//! engine only settle the cache.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::client::StoreClient;
use crate::config::SessionConfig;
use crate::engine::{self, EditOutcome, Effect, PendingOp, SyncEngine, SyncEvent, SyncStatus};
use crate::error::{RemoteFailure, SyncError};
use crate::filter::FilterMode;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{ItemCache, TodoItem, TodoList};
use crate::registry::ListRegistry;
use crate::types::{ListRecord, NewList};

/// Identifies one outstanding request.
pub type Ticket = u64;

/// A request the host must execute and resolve with `Session::resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub ticket: Ticket,
    pub request: HttpRequest,
}

#[derive(Debug)]
enum Inflight {
    Lists,
    CreateList,
    SignOut,
    Items {
        list_id: String,
        generation: u64,
        op: PendingOp,
    },
}

/// What resolving a ticket did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ListsLoaded { count: usize },
    ListsUnavailable(RemoteFailure),
    ListCreated { list_id: String },
    ListRejected(RemoteFailure),
    SignedOut,
    SignOutRejected(RemoteFailure),
    /// A response for the active list.
    Active(SyncEvent),
    /// A response settled into a list's cache without touching the status
    /// indicator: the list was switched away from after it was sent.
    Background(SyncEvent),
}

/// The outcome of `Session::resolve`, plus any request it triggered (the
/// first list becoming active needs its items fetched).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub event: SessionEvent,
    pub follow_up: Option<Outbound>,
}

/// Everything the UI renders, as plain serializable data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub lists: Vec<ListRecord>,
    pub active_index: Option<usize>,
    pub lists_error: Option<String>,
    pub loaded: bool,
    pub status: SyncStatus,
    pub filter: FilterMode,
    pub editing: Option<String>,
    pub version: Option<u64>,
    pub items: Vec<TodoItem>,
}

#[derive(Debug)]
pub struct Session {
    client: StoreClient,
    offset: FixedOffset,
    registry: ListRegistry,
    engine: SyncEngine,
    /// Bumped every time the engine is replaced.
    generation: u64,
    next_ticket: Ticket,
    inflight: BTreeMap<Ticket, Inflight>,
}

impl Session {
    pub fn new(config: &SessionConfig) -> Self {
        let client = StoreClient::new(&config.store_url);
        let offset = config.display_offset();
        Self {
            engine: SyncEngine::idle(client.clone(), offset),
            client,
            offset,
            registry: ListRegistry::new(),
            generation: 0,
            next_ticket: 1,
            inflight: BTreeMap::new(),
        }
    }

    fn issue(&mut self, request: HttpRequest, inflight: Inflight) -> Outbound {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        tracing::debug!(ticket, method = ?request.method, path = %request.path, "request issued");
        self.inflight.insert(ticket, inflight);
        Outbound { ticket, request }
    }

    fn dispatch(&mut self, effect: Effect) -> Outbound {
        let list_id = self.engine.list().map(|list| list.id.clone()).unwrap_or_default();
        let inflight = Inflight::Items {
            list_id,
            generation: self.generation,
            op: effect.op,
        };
        self.issue(effect.request, inflight)
    }

    /// Fetch every list. Called once when the session starts.
    pub fn start(&mut self) -> Outbound {
        self.reload_lists()
    }

    /// Fetch every list again, e.g. after the first load failed.
    pub fn reload_lists(&mut self) -> Outbound {
        let request = self.client.build_fetch_lists();
        self.issue(request, Inflight::Lists)
    }

    /// Switch the active list. Returns the bulk fetch to send if the list's
    /// items were never fetched.
    pub fn select(&mut self, index: usize) -> Result<Option<Outbound>, SyncError> {
        if !self.registry.select_by_index(index)? {
            return Ok(None);
        }
        Ok(self.swap_engine())
    }

    /// Add a list created elsewhere. The first list of an empty registry
    /// becomes active.
    pub fn append_list(&mut self, list: TodoList) -> Option<Outbound> {
        let was_empty = self.registry.is_empty();
        if !self.registry.append_list(list) || !was_empty {
            return None;
        }
        self.select(0).ok().flatten()
    }

    pub fn create_list(&mut self, name: &str, color: &str) -> Result<Outbound, SyncError> {
        let input = NewList {
            name: name.to_string(),
            color: color.to_string(),
        };
        let request = self.client.build_create_list(&input)?;
        Ok(self.issue(request, Inflight::CreateList))
    }

    pub fn toggle_status(&mut self, id: &str) -> Result<Outbound, SyncError> {
        let effect = self.engine.toggle_status(id)?;
        Ok(self.dispatch(effect))
    }

    pub fn remove_by_id(&mut self, id: &str) -> Result<Outbound, SyncError> {
        let effect = self.engine.remove_by_id(id)?;
        Ok(self.dispatch(effect))
    }

    pub fn commit_body_edit(&mut self, id: &str, body: &str) -> Result<Outbound, SyncError> {
        let effect = self.engine.commit_body_edit(id, body)?;
        Ok(self.dispatch(effect))
    }

    pub fn request_edit(&mut self, id: &str, current_body: &str) -> Result<EditOutcome<Outbound>, SyncError> {
        let outcome = self.engine.request_edit(id, current_body)?;
        Ok(outcome.map(|effect| self.dispatch(effect)))
    }

    pub fn resync(&mut self) -> Result<Outbound, SyncError> {
        let effect = self.engine.resync()?;
        Ok(self.dispatch(effect))
    }

    pub fn add_item(&mut self, body: &str, due_date: Option<DateTime<Utc>>) -> Result<Outbound, SyncError> {
        let effect = self.engine.add_item(body, due_date)?;
        Ok(self.dispatch(effect))
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.engine.set_filter(mode);
    }

    pub fn sign_out(&mut self) -> Outbound {
        let request = self.client.build_sign_out();
        self.issue(request, Inflight::SignOut)
    }

    /// Feed back the response to `ticket`.
    pub fn resolve(&mut self, ticket: Ticket, response: HttpResponse) -> Result<Resolved, SyncError> {
        let inflight = self.inflight.remove(&ticket).ok_or(SyncError::UnknownTicket(ticket))?;
        tracing::debug!(ticket, status = response.status, "response resolved");
        let mut follow_up = None;
        let event = match inflight {
            Inflight::Lists => {
                let outcome = self.client.parse_fetch_lists(response);
                match self.registry.load_all_lists(outcome) {
                    Ok(count) => {
                        follow_up = self.settle_active_after_reload();
                        SessionEvent::ListsLoaded { count }
                    }
                    Err(failure) => SessionEvent::ListsUnavailable(failure),
                }
            }
            Inflight::CreateList => match self.client.parse_create_list(response) {
                Ok(record) => {
                    let list_id = record.id.clone();
                    follow_up = self.append_list(TodoList::unfetched(record));
                    SessionEvent::ListCreated { list_id }
                }
                Err(source) => {
                    let failure = RemoteFailure::CreateListFailed(source);
                    tracing::warn!(error = %failure, "list not created");
                    SessionEvent::ListRejected(failure)
                }
            },
            Inflight::SignOut => match self.client.parse_sign_out(response) {
                Ok(()) => SessionEvent::SignedOut,
                Err(source) => {
                    let failure = RemoteFailure::SignOutFailed(source);
                    tracing::warn!(error = %failure, "sign-out failed");
                    SessionEvent::SignOutRejected(failure)
                }
            },
            Inflight::Items {
                list_id,
                generation,
                op,
            } => self.settle_items(&list_id, generation, op, response),
        };
        Ok(Resolved { event, follow_up })
    }

    fn settle_items(
        &mut self,
        list_id: &str,
        generation: u64,
        op: PendingOp,
        response: HttpResponse,
    ) -> SessionEvent {
        let is_active = self.engine.list().is_some_and(|list| list.id == list_id);
        if is_active && generation == self.generation {
            return SessionEvent::Active(self.engine.apply(op, response));
        }
        if is_active {
            tracing::debug!(list = %list_id, generation, "settling response from an earlier activation");
            return SessionEvent::Background(self.engine.absorb(op, response));
        }
        tracing::debug!(list = %list_id, "settling response for inactive list");
        let event = match self.registry.items_mut(list_id) {
            Some(cache) => engine::settle(cache, &self.client, self.offset, op, response),
            None => engine::settle(&mut ItemCache::Unfetched, &self.client, self.offset, op, response),
        };
        SessionEvent::Background(event)
    }

    /// After a list load: keep the active engine if its list survived,
    /// otherwise activate the first list (or nothing).
    fn settle_active_after_reload(&mut self) -> Option<Outbound> {
        let engine_list = self.engine.list().map(|list| list.id.clone());
        let registry_list = self.registry.active().map(|list| list.id().to_string());
        if engine_list.is_some() && engine_list == registry_list {
            return None;
        }
        if self.registry.active_index().is_some() {
            return self.swap_engine();
        }
        if self.registry.is_empty() {
            if engine_list.is_some() {
                self.swap_engine();
            }
            return None;
        }
        self.select(0).ok().flatten()
    }

    /// Replace the engine with one for the registry's active list.
    fn swap_engine(&mut self) -> Option<Outbound> {
        let next = match self.registry.active_index() {
            Some(index) => {
                let record = self.registry.lists()[index].record.clone();
                let items = self.registry.take_items(index);
                SyncEngine::new(self.client.clone(), self.offset, record, items)
            }
            None => SyncEngine::idle(self.client.clone(), self.offset),
        };
        let previous = std::mem::replace(&mut self.engine, next);
        self.generation += 1;
        if let Some((record, items)) = previous.detach() {
            self.registry.restore_items(&record.id, items);
        }

        let list_id = self.engine.list()?.id.clone();
        let (adopted, fetching) = self.adopt_outstanding(&list_id);
        self.engine.adopt_outstanding(adopted);
        if fetching && self.engine.snapshot().is_none() {
            tracing::debug!(list = %list_id, "fetch already in flight");
            return None;
        }
        let effect = self.engine.activate()?;
        Some(self.dispatch(effect))
    }

    /// Hand the unanswered status-driving requests of `list_id` to the
    /// current engine. Returns how many there were and whether one of them
    /// is a bulk fetch.
    fn adopt_outstanding(&mut self, list_id: &str) -> (usize, bool) {
        let current = self.generation;
        let mut adopted = 0;
        let mut fetching = false;
        for inflight in self.inflight.values_mut() {
            if let Inflight::Items {
                list_id: owner,
                generation,
                op,
            } = inflight
            {
                if owner.as_str() == list_id && op.drives_status() {
                    *generation = current;
                    adopted += 1;
                    fetching |= op.is_fetch();
                }
            }
        }
        (adopted, fetching)
    }

    /// Number of tickets issued and not yet resolved.
    pub fn outstanding(&self) -> usize {
        self.inflight.len()
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn registry(&self) -> &ListRegistry {
        &self.registry
    }

    pub fn lists_error(&self) -> Option<&RemoteFailure> {
        self.registry.load_error()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            lists: self.registry.lists().iter().map(|list| list.record.clone()).collect(),
            active_index: self.registry.active_index(),
            lists_error: self.lists_error().map(ToString::to_string),
            loaded: self.engine.is_loaded(),
            status: self.engine.status(),
            filter: self.engine.filter(),
            editing: self.engine.editing().map(str::to_string),
            version: self.engine.snapshot().map(|snapshot| snapshot.version()),
            items: self.engine.visible_items().into_iter().cloned().collect(),
        }
    }
}
