use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use brandpulse_core::{MetricSnapshot, RiskLevel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_monitor_error, parse_brand_id, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct MonitorRequest {
    #[serde(default)]
    pub brand: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MonitorResponse {
    pub success: bool,
    pub brand_id: Uuid,
    pub tweets_found: usize,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalyzeRequest {
    #[serde(default)]
    pub brand_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalyzeResponse {
    pub success: bool,
    pub analyzed: usize,
    pub metrics: MetricsBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MetricsBody {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
    pub total: i64,
    pub overall_score: f64,
    pub risk_level: RiskLevel,
}

impl From<&MetricSnapshot> for MetricsBody {
    fn from(s: &MetricSnapshot) -> Self {
        Self {
            positive: s.positive_count,
            negative: s.negative_count,
            neutral: s.neutral_count,
            total: s.total_count,
            overall_score: s.overall_score,
            risk_level: s.risk_level,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StopResponse {
    pub success: bool,
    pub brand_id: Uuid,
}

pub(super) async fn start_monitoring(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<MonitorRequest>, JsonRejection>,
) -> Result<Json<MonitorResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let brand = body
        .brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ApiError::validation("brand is required"))?;

    let outcome = state
        .scheduler
        .start(brand)
        .await
        .map_err(|e| map_monitor_error(&req_id.0, e))?;

    Ok(Json(MonitorResponse {
        success: true,
        brand_id: outcome.brand.id,
        tweets_found: outcome.mentions_found,
        message: format!("Started monitoring {}", outcome.brand.name),
    }))
}

pub(super) async fn analyze_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let raw = body
        .brand_id
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| ApiError::validation("brandId is required"))?;
    let brand_id = parse_brand_id(raw)?;

    let outcome = state
        .scheduler
        .monitor()
        .analyze(brand_id)
        .await
        .map_err(|e| map_monitor_error(&req_id.0, e))?;

    Ok(Json(AnalyzeResponse {
        success: true,
        analyzed: outcome.analyzed,
        metrics: MetricsBody::from(&outcome.snapshot),
    }))
}

pub(super) async fn stop_monitoring(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand_id): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    let brand_id = parse_brand_id(&brand_id)?;
    state
        .scheduler
        .stop(brand_id)
        .await
        .map_err(|e| map_monitor_error(&req_id.0, e))?;

    Ok(Json(StopResponse {
        success: true,
        brand_id,
    }))
}
