//! Generic Entity Store
//!
//! Holds one entity split into record, extension and side collections.
//! The mutex is never held across an await: each operation snapshots what
//! it needs, awaits the network, then re-locks and applies the result only
//! if the editing context is still the one the call started in.

use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{Clearable, StoreState, StoreStatus};
use crate::api::{self, cancellable, ApiClient};
use crate::error::{ApiError, Outcome};
use crate::models::{EntityData, EntityKind, FieldTarget, Record};

/// Editing context a call started in
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    generation: u64,
    pub(crate) cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    data: Option<EntityData>,
    state: StoreState,
    changed: bool,
    /// Count of field edits, compared across a save
    edits: u64,
    revision: u64,
    generation: u64,
    cancel: CancellationToken,
}

impl Inner {
    fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
            cancel: self.cancel.clone(),
        }
    }

    /// Abandon calls issued so far; their tickets stop being current
    fn renew(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
    }

    /// Drop all editing state and start a new context
    fn reset(&mut self) {
        self.renew();
        self.data = None;
        self.state = StoreState::Idle;
        self.changed = false;
        self.edits = 0;
    }
}

pub struct EntityStore<K: EntityKind> {
    api: ApiClient,
    inner: Mutex<Inner>,
    status: watch::Sender<StoreStatus>,
    kind: PhantomData<fn() -> K>,
}

impl<K: EntityKind> EntityStore<K> {
    pub fn new(api: ApiClient) -> Self {
        let (status, _) = watch::channel(StoreStatus::default());
        Self {
            api,
            inner: Mutex::new(Inner::default()),
            status,
            kind: PhantomData,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn publish(&self, inner: &mut Inner) {
        inner.revision += 1;
        self.status.send_replace(StoreStatus {
            state: inner.state.clone(),
            changed: inner.changed,
            revision: inner.revision,
        });
    }

    // ========================
    // Observation
    // ========================

    pub fn subscribe(&self) -> watch::Receiver<StoreStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> StoreStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> StoreState {
        self.lock().state.clone()
    }

    pub fn is_changed(&self) -> bool {
        self.lock().changed
    }

    pub fn data(&self) -> Option<EntityData> {
        self.lock().data.clone()
    }

    pub fn record(&self) -> Record {
        self.lock()
            .data
            .as_ref()
            .map(|d| d.record.clone())
            .unwrap_or_default()
    }

    pub fn extdata(&self) -> Record {
        self.lock()
            .data
            .as_ref()
            .map(|d| d.extdata.clone())
            .unwrap_or_default()
    }

    /// Working id; `None` until the server assigned one
    pub fn id(&self) -> Option<String> {
        self.lock()
            .data
            .as_ref()
            .and_then(|d| d.id::<K>().map(str::to_string))
    }

    pub fn side_records(&self, field: &str) -> Vec<Record> {
        self.lock()
            .data
            .as_ref()
            .map(|d| d.side_records(field))
            .unwrap_or_default()
    }

    pub fn side_strings(&self, field: &str) -> Vec<String> {
        self.lock()
            .data
            .as_ref()
            .map(|d| d.side_strings(field))
            .unwrap_or_default()
    }

    // ========================
    // Context fencing
    // ========================

    pub(crate) fn ticket(&self) -> Ticket {
        self.lock().ticket()
    }

    pub(crate) fn is_current(&self, ticket: &Ticket) -> bool {
        self.lock().generation == ticket.generation
    }

    /// Notify subscribers of a change held outside the entity data
    pub(crate) fn touch(&self) {
        let mut inner = self.lock();
        self.publish(&mut inner);
    }

    /// Claim the store for a load or save. A load re-targets the store, so
    /// it also abandons media and licence calls made for the previous entity.
    fn start(&self, state: StoreState) -> Result<Ticket, Outcome> {
        let mut inner = self.lock();
        if inner.state.is_busy() {
            return Err(Outcome::Busy);
        }
        if state == StoreState::Loading {
            inner.renew();
        }
        inner.state = state;
        self.publish(&mut inner);
        Ok(inner.ticket())
    }

    // ========================
    // Operations
    // ========================

    /// Fetch the entity with its extension data, replacing what is held
    pub async fn load(&self, id: &str) -> Outcome {
        if id.trim().is_empty() {
            return ApiError::Validation(format!("{} id is required", K::RESOURCE)).into();
        }
        let ticket = match self.start(StoreState::Loading) {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };

        log::debug!("Loading {} {}", K::RESOURCE, id);
        let result = cancellable(&ticket.cancel, api::get_entity_info::<K>(&self.api, id)).await;

        let mut inner = self.lock();
        if inner.generation != ticket.generation {
            log::debug!("Discarding stale {} {} response", K::RESOURCE, id);
            return Outcome::Cancelled;
        }
        let outcome = match result {
            Ok(combined) => {
                let mut data = EntityData::split::<K>(combined);
                if data.id::<K>().is_none() {
                    data.record.set(K::ID_FIELD, id);
                }
                inner.data = Some(data);
                inner.changed = false;
                inner.state = StoreState::Loaded;
                Outcome::Ok
            }
            Err(e) => {
                log::warn!("Failed to load {} {}: {}", K::RESOURCE, id, e);
                let outcome = Outcome::from(e);
                inner.state = StoreState::Error(outcome.message().unwrap_or_default());
                outcome
            }
        };
        self.publish(&mut inner);
        outcome
    }

    /// Start editing an entity the server has not seen yet
    pub fn begin_new(&self) {
        let mut inner = self.lock();
        inner.reset();
        inner.data = Some(EntityData::default());
        inner.state = StoreState::Loaded;
        self.publish(&mut inner);
    }

    /// Replace one field; returns false when the edit was ignored
    pub fn mutate_field(&self, target: FieldTarget, key: &str, value: impl Into<Value>) -> bool {
        let mut inner = self.lock();
        if inner.state == StoreState::Loading {
            return false;
        }
        if target == FieldTarget::Entity && K::is_read_only(key) {
            return false;
        }
        let Some(data) = inner.data.as_mut() else {
            return false;
        };
        match target {
            FieldTarget::Entity => data.record.set(key, value),
            FieldTarget::Extension => data.extdata.set(key, value),
        };
        inner.changed = true;
        inner.edits += 1;
        self.publish(&mut inner);
        true
    }

    /// Edit a side collection in place; `edit` reports whether it changed
    /// anything
    pub(crate) fn update_side(&self, field: &str, edit: impl FnOnce(&mut Vec<Value>) -> bool) -> bool {
        let mut inner = self.lock();
        if inner.state == StoreState::Loading {
            return false;
        }
        let Some(data) = inner.data.as_mut() else {
            return false;
        };
        let mut items = match data.side.get(field) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        if !edit(&mut items) {
            return false;
        }
        data.side.set(field, Value::Array(items));
        inner.changed = true;
        inner.edits += 1;
        self.publish(&mut inner);
        true
    }

    /// Record a field value the server already holds
    pub(crate) fn apply_server_field(&self, ticket: &Ticket, key: &str, value: impl Into<Value>) {
        let mut inner = self.lock();
        if inner.generation != ticket.generation {
            return;
        }
        if let Some(data) = inner.data.as_mut() {
            data.record.set(key, value);
            self.publish(&mut inner);
        }
    }

    pub async fn save(&self) -> Outcome {
        match self.persist().await {
            Ok(_) => Outcome::Ok,
            Err(outcome) => outcome,
        }
    }

    /// Save the combined entity, returning the id it is stored under
    pub(crate) async fn persist(&self) -> Result<(String, Ticket), Outcome> {
        let (ticket, id, body, edits) = {
            let mut inner = self.lock();
            if inner.state.is_busy() {
                return Err(Outcome::Busy);
            }
            let Some(data) = inner.data.as_ref() else {
                return Err(ApiError::Validation(format!("no {} to save", K::RESOURCE)).into());
            };
            let id = data.id::<K>().unwrap_or_default().to_string();
            let body = data.combine::<K>();
            inner.state = StoreState::Saving;
            self.publish(&mut inner);
            (inner.ticket(), id, body, inner.edits)
        };

        let result = cancellable(&ticket.cancel, api::set_entity::<K>(&self.api, &id, &body))
            .await
            .and_then(|saved| match (saved.itemuid.is_empty(), id.is_empty()) {
                (true, true) => Err(ApiError::Server(format!(
                    "{} saved without an id",
                    K::RESOURCE
                ))),
                (true, false) => Ok(id.clone()),
                (false, _) => Ok(saved.itemuid),
            });

        let mut inner = self.lock();
        if inner.generation != ticket.generation {
            return Err(Outcome::Cancelled);
        }
        match result {
            Ok(saved_id) => {
                if let Some(data) = inner.data.as_mut() {
                    data.record.set(K::ID_FIELD, saved_id.as_str());
                }
                inner.changed = inner.edits != edits;
                inner.state = StoreState::Loaded;
                self.publish(&mut inner);
                log::info!("Saved {} {}", K::RESOURCE, saved_id);
                Ok((saved_id, ticket))
            }
            Err(e) => {
                log::warn!("Failed to save {}: {}", K::RESOURCE, e);
                let outcome = Outcome::from(e);
                inner.state = StoreState::Error(outcome.message().unwrap_or_default());
                self.publish(&mut inner);
                Err(outcome)
            }
        }
    }

    /// Reset to empty defaults and abandon in-flight calls; always safe
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.reset();
        self.publish(&mut inner);
    }
}

impl<K: EntityKind> Clearable for EntityStore<K> {
    fn clear(&self) {
        EntityStore::clear(self);
    }
}
