//! Secondary Records
//!
//! Small typed payloads around the entity records: save acknowledgements,
//! list totals, contact and task lookups, export-to-web tasks.

use serde::{Deserialize, Serialize};

use super::Record;
use crate::error::Status;

/// Acknowledgement of an entity save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEntity {
    pub status: Status,
    /// Id of the saved entity, newly assigned for creations
    #[serde(default, alias = "itemUID", alias = "contactuid", alias = "dealuid", alias = "accountuid")]
    pub itemuid: String,
}

/// Response of list endpoints called with `total=1`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCount {
    #[serde(default)]
    pub total: u64,
}

/// Inventory deletion reason and comment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReason {
    pub reason: String,
    #[serde(default)]
    pub comment: String,
}

/// Driver licence image side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DlSide {
    Front,
    Back,
}

impl DlSide {
    pub const BOTH: [DlSide; 2] = [DlSide::Front, DlSide::Back];

    /// Contact field holding the media id of this side
    pub fn field(&self) -> &'static str {
        match self {
            DlSide::Front => "dluidfront",
            DlSide::Back => "dluidback",
        }
    }

    /// Path action removing this side
    pub fn delete_action(&self) -> &'static str {
        match self {
            DlSide::Front => "deletedlfront",
            DlSide::Back => "deletedlback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCategory {
    pub id: i64,
    pub name: String,
}

/// Free-form account memo and message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMemoNote {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUser {
    pub useruid: String,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub assign_to: String,
    pub start_date: String,
    pub due_date: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub deal: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub description: String,
}

/// Result of a VIN decode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VehicleDecodeInfo {
    #[serde(default, rename = "VIN")]
    pub vin: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub engine: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportsColumn {
    pub name: String,
    pub data: String,
}

/// Rows and columns submitted to an export task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportWebPostData {
    pub data: Vec<Record>,
    pub columns: Vec<ReportsColumn>,
}

/// Scheduled or historical export task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    #[serde(default)]
    pub taskuid: String,
    #[serde(default)]
    pub useruid: String,
    #[serde(default)]
    pub created: String,
    #[serde(flatten)]
    pub extra: Record,
}
