//! Task Calls

use super::{segment, ApiClient};
use crate::error::{ApiError, ApiResult, StatusResponse};
use crate::models::{NewTask, TaskUser};

pub async fn get_tasks_user_list(api: &ApiClient, useruid: &str) -> ApiResult<Vec<TaskUser>> {
    let users: Option<Vec<TaskUser>> = api
        .get_json(format!("tasks/{}/listusers", segment(useruid)), Vec::new())
        .await?;
    Ok(users.unwrap_or_default())
}

pub async fn create_task(api: &ApiClient, task: &NewTask) -> ApiResult<StatusResponse> {
    if task.assign_to.trim().is_empty() {
        return Err(ApiError::Validation("task must be assigned".to_string()));
    }
    api.post_status("tasks/0/create".to_string(), Some(serde_json::to_value(task)?))
        .await
}
