//! Export-to-Web Calls
//!
//! Immediate and scheduled exports of inventory rows to external listings.

use serde_json::json;

use super::{segment, ApiClient};
use crate::error::{ApiResult, StatusResponse};
use crate::models::{ExportTask, ExportWebPostData};

pub async fn add_export_task(
    api: &ApiClient,
    useruid: &str,
    data: &ExportWebPostData,
) -> ApiResult<StatusResponse> {
    api.post_status(
        format!("external/{}/export", segment(useruid)),
        Some(json!({ "data": data.data, "columns": data.columns, "useruid": useruid })),
    )
    .await
}

pub async fn add_export_task_to_schedule(
    api: &ApiClient,
    useruid: &str,
    data: &ExportWebPostData,
) -> ApiResult<StatusResponse> {
    api.post_status(
        format!("external/{}/schedule", segment(useruid)),
        Some(json!({ "data": data.data, "columns": data.columns, "useruid": useruid })),
    )
    .await
}

pub async fn get_export_schedule_list(api: &ApiClient, useruid: &str) -> ApiResult<Vec<ExportTask>> {
    let tasks: Option<Vec<ExportTask>> = api
        .get_json(format!("external/{}/schedule", segment(useruid)), Vec::new())
        .await?;
    Ok(tasks.unwrap_or_default())
}

pub async fn get_export_history_list(api: &ApiClient, useruid: &str) -> ApiResult<Vec<ExportTask>> {
    let tasks: Option<Vec<ExportTask>> = api
        .get_json(format!("external/{}/history", segment(useruid)), Vec::new())
        .await?;
    Ok(tasks.unwrap_or_default())
}

/// Control action on a scheduled export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTaskAction {
    Delete,
    Pause,
    Continue,
}

impl ExportTaskAction {
    fn as_str(&self) -> &'static str {
        match self {
            ExportTaskAction::Delete => "delete",
            ExportTaskAction::Pause => "pause",
            ExportTaskAction::Continue => "continue",
        }
    }
}

pub async fn export_task_schedule_action(
    api: &ApiClient,
    taskuid: &str,
    action: ExportTaskAction,
) -> ApiResult<StatusResponse> {
    api.post_status(
        format!("external/{}/{}", segment(taskuid), action.as_str()),
        None,
    )
    .await
}
