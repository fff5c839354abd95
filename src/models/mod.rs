//! Models
//!
//! Data structures exchanged with the dashboard API.

mod entity;
mod media;
mod record;
mod records;

pub use entity::{Account, Contact, Deal, EntityData, EntityKind, FieldTarget, Inventory};
pub use media::{ImageItem, MediaBuckets, MediaItemRef, MediaType, UploadFile};
pub use record::Record;
pub use records::{
    AccountMemoNote, ContactCategory, DeleteReason, DlSide, ExportTask, ExportWebPostData,
    NewTask, ReportsColumn, SavedEntity, TaskUser, TotalCount, VehicleDecodeInfo,
};
