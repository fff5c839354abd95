//! Account Calls
//!
//! Notes, memo and activity history of an account.

use serde_json::{Map, Value};

use super::{segment, ApiClient};
use crate::error::{ApiResult, StatusResponse};
use crate::models::{AccountMemoNote, Record};

pub async fn list_account_notes(api: &ApiClient, accountuid: &str) -> ApiResult<Vec<Record>> {
    let notes: Option<Vec<Record>> = api
        .get_json(format!("accounts/{}/listnotes", segment(accountuid)), Vec::new())
        .await?;
    Ok(notes.unwrap_or_default())
}

pub async fn get_account_note(api: &ApiClient, accountuid: &str) -> ApiResult<AccountMemoNote> {
    api.get_json(format!("accounts/{}/note", segment(accountuid)), Vec::new())
        .await
}

/// Save only the memo fields that are set
pub async fn update_account_note(
    api: &ApiClient,
    accountuid: &str,
    note: Option<&str>,
    message: Option<&str>,
) -> ApiResult<StatusResponse> {
    let mut body = Map::new();
    if let Some(note) = note {
        body.insert("note".to_string(), Value::from(note));
    }
    if let Some(message) = message {
        body.insert("message".to_string(), Value::from(message));
    }
    api.post_status(
        format!("accounts/{}/note", segment(accountuid)),
        Some(Value::Object(body)),
    )
    .await
}

pub async fn list_account_activity(api: &ApiClient, accountuid: &str) -> ApiResult<Vec<Record>> {
    let activity: Option<Vec<Record>> = api
        .get_json(format!("accounts/{}/listactivity", segment(accountuid)), Vec::new())
        .await?;
    Ok(activity.unwrap_or_default())
}
