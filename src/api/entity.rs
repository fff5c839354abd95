//! Entity Calls
//!
//! Load and save shared by every entity kind.

use super::{segment, ApiClient};
use crate::error::ApiResult;
use crate::models::{EntityKind, Record, SavedEntity};

/// Path id used when saving an entity the server has not seen yet
pub const NEW_ENTITY_ID: &str = "0";

/// Fetch the entity combined with its extension data
pub async fn get_entity_info<K: EntityKind>(api: &ApiClient, id: &str) -> ApiResult<Record> {
    api.get_json(format!("{}/{}/info", K::RESOURCE, segment(id)), Vec::new())
        .await
}

/// Create (empty id) or update an entity
pub async fn set_entity<K: EntityKind>(
    api: &ApiClient,
    id: &str,
    body: &Record,
) -> ApiResult<SavedEntity> {
    let target = if id.is_empty() { NEW_ENTITY_ID } else { id };
    api.post_json(
        format!("{}/{}/set", K::RESOURCE, segment(target)),
        body.clone().into_value(),
    )
    .await
}
