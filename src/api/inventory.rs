//! Inventory Calls
//!
//! List, deletion and VIN lookups for inventory items.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use super::{segment, ApiClient};
use crate::error::{ApiError, ApiResult, StatusResponse};
use crate::models::{DeleteReason, Record, VehicleDecodeInfo};
use crate::query::QueryParams;

pub async fn get_inventory_list(
    api: &ApiClient,
    useruid: &str,
    params: &QueryParams,
) -> ApiResult<Vec<Record>> {
    api.get_list(format!("inventory/{}/list", segment(useruid)), params)
        .await
}

pub async fn get_inventory_total(
    api: &ApiClient,
    useruid: &str,
    params: &QueryParams,
) -> ApiResult<u64> {
    api.get_total(format!("inventory/{}/list", segment(useruid)), params)
        .await
}

/// Inventory rows prepared for export to web
pub async fn get_inventory_web_list(
    api: &ApiClient,
    useruid: &str,
    params: &QueryParams,
) -> ApiResult<Vec<Record>> {
    api.get_list(format!("inventory/{}/weblist", segment(useruid)), params)
        .await
}

pub async fn get_inventory_delete_reasons(api: &ApiClient, useruid: &str) -> ApiResult<Vec<String>> {
    api.get_json(
        format!("inventory/{}/listdeletionreasons", segment(useruid)),
        Vec::new(),
    )
    .await
}

pub async fn delete_inventory(
    api: &ApiClient,
    itemuid: &str,
    reason: &DeleteReason,
) -> ApiResult<StatusResponse> {
    if reason.reason.trim().is_empty() {
        return Err(ApiError::Validation("deletion reason is required".to_string()));
    }
    api.post_status(
        format!("inventory/{}/delete", segment(itemuid)),
        Some(json!({ "reason": reason.reason, "comment": reason.comment })),
    )
    .await
}

fn vin_pattern() -> &'static Regex {
    static VIN: OnceLock<Regex> = OnceLock::new();
    // 17 characters, I/O/Q excluded
    VIN.get_or_init(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("static VIN pattern"))
}

pub fn is_valid_vin(vin: &str) -> bool {
    vin_pattern().is_match(&vin.trim().to_ascii_uppercase())
}

pub async fn inventory_decode_vin(api: &ApiClient, vin: &str) -> ApiResult<VehicleDecodeInfo> {
    let vin = vin.trim().to_ascii_uppercase();
    if !is_valid_vin(&vin) {
        return Err(ApiError::Validation(format!("invalid VIN: {}", vin)));
    }
    api.get_json(format!("inventory/{}/decodevin", segment(&vin)), Vec::new())
        .await
}
