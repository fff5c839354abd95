//! Contact Calls
//!
//! Contact lists, categories and driver licence image links.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{segment, ApiClient};
use crate::error::{ApiResult, StatusResponse};
use crate::models::{ContactCategory, DlSide, Record};
use crate::query::QueryParams;

#[derive(Debug, Default, Deserialize)]
struct ContactTypes {
    #[serde(default)]
    contact_types: Vec<ContactCategory>,
}

pub async fn get_contacts(
    api: &ApiClient,
    useruid: &str,
    params: &QueryParams,
) -> ApiResult<Vec<Record>> {
    api.get_list(format!("contacts/{}/listcontacts", segment(useruid)), params)
        .await
}

pub async fn get_contacts_total(
    api: &ApiClient,
    useruid: &str,
    params: &QueryParams,
) -> ApiResult<u64> {
    api.get_total(format!("contacts/{}/listcontacts", segment(useruid)), params)
        .await
}

pub async fn get_contact_categories(api: &ApiClient) -> ApiResult<Vec<ContactCategory>> {
    let types: ContactTypes = api
        .get_json("contacts/0/listtypes".to_string(), Vec::new())
        .await?;
    Ok(types.contact_types)
}

/// Point one licence side of a contact at an uploaded media id
pub async fn set_contact_dl(
    api: &ApiClient,
    contactuid: &str,
    side: DlSide,
    mediauid: &str,
) -> ApiResult<StatusResponse> {
    let mut body = Map::new();
    body.insert(side.field().to_string(), Value::from(mediauid));
    api.post_status(
        format!("contacts/{}/dl", segment(contactuid)),
        Some(Value::Object(body)),
    )
    .await
}

pub async fn delete_contact_dl(
    api: &ApiClient,
    contactuid: &str,
    side: DlSide,
) -> ApiResult<StatusResponse> {
    api.post_status(
        format!("contacts/{}/{}", segment(contactuid), side.delete_action()),
        None,
    )
    .await
}
