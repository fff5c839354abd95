//! Deal Calls

use serde::Deserialize;

use super::{segment, ApiClient};
use crate::error::ApiResult;
use crate::models::Record;
use crate::query::QueryParams;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct DealPaymentsTotal {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub paid: f64,
}

pub async fn get_deals_list(
    api: &ApiClient,
    useruid: &str,
    params: &QueryParams,
) -> ApiResult<Vec<Record>> {
    api.get_list(format!("deals/{}/list", segment(useruid)), params)
        .await
}

pub async fn get_deals_total(api: &ApiClient, useruid: &str, params: &QueryParams) -> ApiResult<u64> {
    api.get_total(format!("deals/{}/list", segment(useruid)), params)
        .await
}

pub async fn get_deal_payments_total(api: &ApiClient, dealuid: &str) -> ApiResult<DealPaymentsTotal> {
    api.get_json(format!("deals/{}/paymentstotal", segment(dealuid)), Vec::new())
        .await
}
