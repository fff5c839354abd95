//! Media Calls
//!
//! Media records are created empty, filled by an upload, then paired with
//! the owning entity.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{decode, segment, ApiClient, ApiRequest};
use crate::error::{ApiError, ApiResult, StatusResponse};
use crate::models::{MediaItemRef, MediaType, UploadFile};

#[derive(Debug, Deserialize)]
struct CreatedMedia {
    #[serde(default, rename = "itemUID", alias = "itemuid")]
    item_uid: String,
}

#[derive(Debug, Deserialize)]
struct UploadedMedia {
    #[serde(default)]
    itemuid: String,
}

/// Create an empty media record, returning its id
pub async fn create_media_item_record(api: &ApiClient, media_type: MediaType) -> ApiResult<String> {
    let created: CreatedMedia = api
        .post_json(format!("media/{}/create", media_type.code()), json!({}))
        .await?;
    if created.item_uid.is_empty() {
        return Err(ApiError::Server("media record created without id".to_string()));
    }
    Ok(created.item_uid)
}

/// Upload bytes into a media record, returning the stored media id
pub async fn upload_media(api: &ApiClient, mediauid: &str, file: UploadFile) -> ApiResult<String> {
    if file.is_empty() {
        return Err(ApiError::Validation(format!("{} is empty", file.file_name)));
    }
    let request = ApiRequest::post(format!("media/{}/upload", segment(mediauid))).with_file(file);
    let uploaded: UploadedMedia = api.request_json(request).await?;
    if uploaded.itemuid.is_empty() {
        return Err(ApiError::Server("upload returned no media id".to_string()));
    }
    Ok(uploaded.itemuid)
}

pub async fn pair_media_with_inventory(
    api: &ApiClient,
    inventoryuid: &str,
    mediauid: &str,
) -> ApiResult<StatusResponse> {
    api.post_status(
        format!("inventory/{}/media", segment(inventoryuid)),
        Some(json!({ "mediaitemuid": mediauid })),
    )
    .await
}

pub async fn get_inventory_media_list(
    api: &ApiClient,
    inventoryuid: &str,
) -> ApiResult<Vec<MediaItemRef>> {
    let items: Option<Vec<MediaItemRef>> = api
        .get_json(format!("inventory/{}/medialist", segment(inventoryuid)), Vec::new())
        .await?;
    Ok(items.unwrap_or_default())
}

/// Download a media item as a `data:` URL
pub async fn get_media_item(api: &ApiClient, mediauid: &str) -> ApiResult<String> {
    let response = api
        .send(ApiRequest::get(format!("media/{}/media", segment(mediauid))))
        .await?;
    if !response.is_success() {
        let _: Value = decode(response)?;
        return Err(ApiError::Server("media download failed".to_string()));
    }
    let content_type = response
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    Ok(format!("data:{};base64,{}", content_type, STANDARD.encode(&response.body)))
}

pub async fn delete_media_item(api: &ApiClient, itemuid: &str) -> ApiResult<StatusResponse> {
    api.post_status(format!("media/{}/delete", segment(itemuid)), None)
        .await
}
