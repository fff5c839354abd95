//! Entity Stores
//!
//! In-memory editing state for one entity at a time, with the network
//! sequences that load and persist it. Every store publishes a
//! `StoreStatus` on a watch channel so views can redraw on change.

mod contact;
mod entity;
mod inventory;

#[cfg(test)]
mod tests;

use std::ops::Deref;
use std::sync::Arc;

pub use contact::{ContactStore, DlImages};
pub use entity::EntityStore;
pub use inventory::{InventoryStore, MediaState, UploadFailure, UploadReport};

use crate::models::{Account, Deal};

pub type DealStore = EntityStore<Deal>;
pub type AccountStore = EntityStore<Account>;

/// Lifecycle of the entity under edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoreState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Saving,
    Error(String),
}

impl StoreState {
    /// A load or save is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, StoreState::Loading | StoreState::Saving)
    }
}

/// Snapshot published to subscribers after every change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    pub state: StoreState,
    pub changed: bool,
    /// Bumped on every published change
    pub revision: u64,
}

/// Stores that can drop their editing state
pub trait Clearable: Send + Sync {
    fn clear(&self);
}

/// Editing context bound to a view; clears the store when dropped
pub struct EditScope<S: Clearable> {
    store: Arc<S>,
}

impl<S: Clearable> EditScope<S> {
    pub fn open(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: Clearable> Deref for EditScope<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.store
    }
}

impl<S: Clearable> Drop for EditScope<S> {
    fn drop(&mut self) {
        self.store.clear();
    }
}
