//! Entity Kinds
//!
//! Every business object shares one shape: a flat record, an extension
//! block the backend stores separately, and optional side collections.
//! A kind only names the resource path and the fields that carry them.

use serde_json::Value;

use super::Record;

/// Core trait for all editable entity kinds
pub trait EntityKind: Send + Sync + 'static {
    /// Resource segment of the REST path
    const RESOURCE: &'static str;
    /// Field holding the server-assigned id
    const ID_FIELD: &'static str;
    /// Field carrying the extension block in combined responses
    const EXTDATA_FIELD: &'static str = "extdata";
    /// Collections split off the combined response next to the extension block
    const SIDE_FIELDS: &'static [&'static str] = &[];

    /// Keys `mutate_field` must not replace
    fn is_read_only(key: &str) -> bool {
        key == Self::ID_FIELD || key == Self::EXTDATA_FIELD || Self::SIDE_FIELDS.contains(&key)
    }
}

/// Inventory item (vehicle)
#[derive(Debug, Clone, Copy)]
pub struct Inventory;

impl EntityKind for Inventory {
    const RESOURCE: &'static str = "inventory";
    const ID_FIELD: &'static str = "itemuid";
    const SIDE_FIELDS: &'static [&'static str] = &["options_info"];
}

#[derive(Debug, Clone, Copy)]
pub struct Contact;

impl EntityKind for Contact {
    const RESOURCE: &'static str = "contacts";
    const ID_FIELD: &'static str = "contactuid";
    const SIDE_FIELDS: &'static [&'static str] = &["prospect"];
}

#[derive(Debug, Clone, Copy)]
pub struct Deal;

impl EntityKind for Deal {
    const RESOURCE: &'static str = "deals";
    const ID_FIELD: &'static str = "dealuid";
}

#[derive(Debug, Clone, Copy)]
pub struct Account;

impl EntityKind for Account {
    const RESOURCE: &'static str = "accounts";
    const ID_FIELD: &'static str = "accountuid";
}

/// Which mapping a field edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    Entity,
    Extension,
}

/// One entity under edit, split into its three parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityData {
    pub record: Record,
    pub extdata: Record,
    pub side: Record,
}

impl EntityData {
    /// Split a combined `{...record, extdata, <side fields>}` response
    pub fn split<K: EntityKind>(combined: Record) -> Self {
        let mut record = combined;
        let extdata = record
            .remove(K::EXTDATA_FIELD)
            .and_then(Record::from_value)
            .unwrap_or_default();

        let mut side = Record::new();
        for field in K::SIDE_FIELDS {
            if let Some(value) = record.remove(field) {
                if !value.is_null() {
                    side.set(*field, value);
                }
            }
        }

        Self {
            record,
            extdata,
            side,
        }
    }

    /// Rebuild the combined body sent on save
    pub fn combine<K: EntityKind>(&self) -> Record {
        let mut combined = self.record.clone();
        combined.set(K::EXTDATA_FIELD, self.extdata.clone().into_value());
        for (key, value) in self.side.iter() {
            combined.set(key.clone(), value.clone());
        }
        combined
    }

    pub fn id<K: EntityKind>(&self) -> Option<&str> {
        self.record.non_empty_str(K::ID_FIELD)
    }

    /// Side collection as a list of records; non-object entries are skipped
    pub fn side_records(&self, field: &str) -> Vec<Record> {
        match self.side.get(field) {
            Some(Value::Array(items)) => items.iter().cloned().filter_map(Record::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Side collection as a list of strings
    pub fn side_strings(&self, field: &str) -> Vec<String> {
        match self.side.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}
