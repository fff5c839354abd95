//! User Settings
//!
//! Table preferences stored server-side as one JSON blob per user, keyed by
//! view (`inventory`, `contacts`, ...). Keys this client does not know are
//! carried through untouched so other clients' settings survive a save.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::api::{self, ApiClient};
use crate::error::Outcome;
use crate::query::{FilterOption, TableState};

/// Views that keep table preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableView {
    Inventory,
    Contacts,
    Deals,
    Accounts,
}

impl TableView {
    pub fn key(&self) -> &'static str {
        match self {
            TableView::Inventory => "inventory",
            TableView::Contacts => "contacts",
            TableView::Deals => "deals",
            TableView::Accounts => "accounts",
        }
    }
}

/// Column shown in a data table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub field: String,
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl TableColumn {
    pub fn new(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header: header.into(),
            checked: None,
        }
    }
}

/// Preferences of one view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_columns: Option<Vec<TableColumn>>,
    /// Column widths in pixels keyed by field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_width: Option<BTreeMap<String, Number>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_filter_options: Option<Vec<FilterOption>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ViewSettings {
    /// Stored table state, gaps filled from `initial`
    pub fn table_state(&self, initial: &TableState) -> TableState {
        match &self.table {
            Some(table) => table.or_initial(initial),
            None => initial.clone(),
        }
    }

    /// Stored active columns, or `defaults` when none were saved
    pub fn active_columns_or(&self, defaults: &[TableColumn]) -> Vec<TableColumn> {
        match &self.active_columns {
            Some(columns) if !columns.is_empty() => columns.clone(),
            _ => defaults.to_vec(),
        }
    }

    /// Show or hide `field`; returns whether it is now visible.
    /// Unknown fields are ignored.
    pub fn toggle_column(&mut self, available: &[TableColumn], field: &str) -> bool {
        let mut active = self.active_columns_or(available);
        let visible = match active.iter().position(|c| c.field == field) {
            Some(index) => {
                active.remove(index);
                false
            }
            None => match available.iter().find(|c| c.field == field) {
                Some(column) => {
                    active.push(column.clone());
                    true
                }
                None => return false,
            },
        };
        self.active_columns = Some(active);
        visible
    }

    /// Reorder active columns to follow `order`; fields not currently
    /// active are dropped
    pub fn reorder_columns(&mut self, available: &[TableColumn], order: &[&str]) {
        let active = self.active_columns_or(available);
        let reordered = order
            .iter()
            .filter_map(|field| active.iter().find(|c| c.field == *field).cloned())
            .collect();
        self.active_columns = Some(reordered);
    }

    pub fn set_column_width(&mut self, field: &str, width: u32) {
        self.column_width
            .get_or_insert_with(BTreeMap::new)
            .insert(field.to_string(), Number::from(width));
    }

    pub fn column_width(&self, field: &str) -> Option<u64> {
        self.column_width.as_ref()?.get(field)?.as_u64()
    }

    /// Shallow merge: every key set in `patch` replaces the stored one
    pub fn merge(&mut self, patch: ViewSettings) {
        if patch.table.is_some() {
            self.table = patch.table;
        }
        if patch.active_columns.is_some() {
            self.active_columns = patch.active_columns;
        }
        if patch.column_width.is_some() {
            self.column_width = patch.column_width;
        }
        if patch.selected_filter_options.is_some() {
            self.selected_filter_options = patch.selected_filter_options;
        }
        self.extra.extend(patch.extra);
    }
}

/// The whole per-user settings blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerUserSettings(Map<String, Value>);

impl ServerUserSettings {
    /// Settings of one view; an unreadable entry reads as empty
    pub fn view(&self, view: TableView) -> ViewSettings {
        match self.0.get(view.key()) {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable {} settings: {}", view.key(), e);
                ViewSettings::default()
            }),
            None => ViewSettings::default(),
        }
    }

    pub fn set_view(&mut self, view: TableView, settings: &ViewSettings) {
        match serde_json::to_value(settings) {
            Ok(value) => {
                self.0.insert(view.key().to_string(), value);
            }
            Err(e) => log::warn!("Failed to encode {} settings: {}", view.key(), e),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

// ========================
// Settings service
// ========================

/// Cached copy of the signed-in user's settings
pub struct SettingsStore {
    api: ApiClient,
    useruid: String,
    settings: Mutex<ServerUserSettings>,
}

impl SettingsStore {
    pub fn new(api: ApiClient, useruid: impl Into<String>) -> Self {
        Self {
            api,
            useruid: useruid.into(),
            settings: Mutex::new(ServerUserSettings::default()),
        }
    }

    pub fn snapshot(&self) -> ServerUserSettings {
        self.settings.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn view(&self, view: TableView) -> ViewSettings {
        self.snapshot().view(view)
    }

    /// Replace the cache with the server copy
    pub async fn load(&self) -> Outcome {
        match api::get_user_settings(&self.api, &self.useruid).await {
            Ok(settings) => {
                *self.settings.lock().unwrap_or_else(|p| p.into_inner()) = settings;
                Outcome::Ok
            }
            Err(e) => {
                log::warn!("Failed to load user settings: {}", e);
                e.into()
            }
        }
    }

    /// Merge `patch` into one view and save the whole blob
    pub async fn change(&self, view: TableView, patch: ViewSettings) -> Outcome {
        let updated = {
            let mut settings = self.settings.lock().unwrap_or_else(|p| p.into_inner());
            let mut current = settings.view(view);
            current.merge(patch);
            settings.set_view(view, &current);
            settings.clone()
        };
        self.save(&updated).await
    }

    /// Apply `edit` to one view and save the whole blob
    pub async fn update(&self, view: TableView, edit: impl FnOnce(&mut ViewSettings)) -> Outcome {
        let updated = {
            let mut settings = self.settings.lock().unwrap_or_else(|p| p.into_inner());
            let mut current = settings.view(view);
            edit(&mut current);
            settings.set_view(view, &current);
            settings.clone()
        };
        self.save(&updated).await
    }

    async fn save(&self, settings: &ServerUserSettings) -> Outcome {
        match api::set_user_settings(&self.api, &self.useruid, settings).await {
            Ok(_) => Outcome::Ok,
            Err(e) => {
                log::warn!("Failed to save user settings: {}", e);
                e.into()
            }
        }
    }
}
