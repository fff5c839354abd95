//! User Settings Calls
//!
//! The server keeps one JSON blob per user; GET returns it as a string in
//! `profile`, POST takes the blob itself.

use serde::Deserialize;

use super::{segment, ApiClient};
use crate::error::{ApiResult, StatusResponse};
use crate::settings::ServerUserSettings;

#[derive(Debug, Default, Deserialize)]
struct UserSettingsResponse {
    #[serde(default)]
    profile: String,
}

/// Stored settings; an empty profile yields defaults
pub async fn get_user_settings(api: &ApiClient, useruid: &str) -> ApiResult<ServerUserSettings> {
    let response: Option<UserSettingsResponse> = api
        .get_json(format!("user/{}/settings", segment(useruid)), Vec::new())
        .await?;
    let profile = response.map(|r| r.profile).unwrap_or_default();
    if profile.trim().is_empty() {
        return Ok(ServerUserSettings::default());
    }
    Ok(serde_json::from_str(&profile)?)
}

pub async fn set_user_settings(
    api: &ApiClient,
    useruid: &str,
    settings: &ServerUserSettings,
) -> ApiResult<StatusResponse> {
    api.post_status(
        format!("user/{}/settings", segment(useruid)),
        Some(serde_json::to_value(settings)?),
    )
    .await
}
