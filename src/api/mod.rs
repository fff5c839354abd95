//! API Services
//!
//! Typed bindings to the dashboard REST API, organized by domain. Every call
//! goes through `ApiClient`, which decodes the JSON body and turns
//! `{status: "Error"}` envelopes into `ApiError::Server`.

mod accounts;
mod contacts;
mod deals;
mod entity;
mod export_web;
mod inventory;
mod media;
mod tasks;
mod transport;
mod user_settings;

use std::future::Future;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{ApiError, ApiResult, StatusResponse};
use crate::models::Record;
use crate::query::QueryParams;
use crate::session::AuthUser;

pub use accounts::*;
pub use contacts::*;
pub use deals::*;
pub use entity::*;
pub use export_web::*;
pub use inventory::*;
pub use media::*;
pub use tasks::*;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, RequestBody, Transport};
pub use user_settings::*;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode an id for use as one path segment
pub(crate) fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

/// Shared handle to the API
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// HTTP client authenticated as `user`, if any
    pub fn http(config: &Config, user: Option<&AuthUser>) -> ApiResult<Self> {
        let token = user.map(|u| u.token.clone());
        let transport = HttpTransport::new(&config.api_url, token, config.request_timeout)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        log::debug!("{:?} {}", request.method, request.path);
        let response = self.transport.send(request).await;
        if let Err(e) = &response {
            log::warn!("API request failed: {}", e);
        }
        response
    }

    pub async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request).await?;
        decode(response)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: String,
        query: Vec<(String, String)>,
    ) -> ApiResult<T> {
        self.request_json(ApiRequest::get(path).with_query(query))
            .await
    }

    pub async fn post_json<T: DeserializeOwned>(&self, path: String, body: Value) -> ApiResult<T> {
        self.request_json(ApiRequest::post(path).with_json(body))
            .await
    }

    /// POST expecting a bare `{status, error}` acknowledgement
    pub async fn post_status(&self, path: String, body: Option<Value>) -> ApiResult<StatusResponse> {
        let request = match body {
            Some(body) => ApiRequest::post(path).with_json(body),
            None => ApiRequest::post(path),
        };
        self.request_json(request).await
    }

    /// GET a list endpoint with paging, sort and filter parameters
    pub async fn get_list(&self, path: String, params: &QueryParams) -> ApiResult<Vec<Record>> {
        let value: Value = self.get_json(path, params.to_pairs()).await?;
        match value {
            Value::Array(items) => Ok(items.into_iter().filter_map(Record::from_value).collect()),
            // Empty result sets come back as `{}` or `null`
            Value::Object(_) | Value::Null => Ok(Vec::new()),
            other => Err(ApiError::Serde(format!("expected list, got {}", other))),
        }
    }

    /// Same list endpoint called with `total=1`
    pub async fn get_total(&self, path: String, params: &QueryParams) -> ApiResult<u64> {
        let counted = params.clone().with_total();
        let total: crate::models::TotalCount = self.get_json(path, counted.to_pairs()).await?;
        Ok(total.total)
    }
}

/// Decode a response body, surfacing error envelopes and HTTP failures
pub(crate) fn decode<T: DeserializeOwned>(response: ApiResponse) -> ApiResult<T> {
    let value: Value = if response.body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&response.body) {
            Ok(value) => value,
            Err(_) if !response.is_success() => {
                return Err(ApiError::Http {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        }
    };

    if let Some(message) = error_envelope(&value) {
        return Err(ApiError::Server(message));
    }
    if !response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
            body: value.to_string(),
        });
    }
    Ok(serde_json::from_value(value)?)
}

fn error_envelope(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    if obj.get("status").and_then(Value::as_str) != Some("Error") {
        return None;
    }
    let message = match obj.get("error") {
        Some(Value::String(msg)) if !msg.is_empty() => msg.clone(),
        Some(Value::Null) | None => "Unknown server error".to_string(),
        Some(other) => other.to_string(),
    };
    Some(message)
}

/// Race a call against the editing context's cancellation token
pub async fn cancellable<T>(
    token: &CancellationToken,
    call: impl Future<Output = ApiResult<T>>,
) -> ApiResult<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::Cancelled),
        result = call => result,
    }
}
