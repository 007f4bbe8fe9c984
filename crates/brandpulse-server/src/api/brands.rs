use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use brandpulse_core::{Alert, MetricSnapshot};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    map_monitor_error, normalize_limit, parse_brand_id, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

const DEFAULT_SNAPSHOT_LIMIT: u32 = 20;
const DEFAULT_ALERT_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub(super) struct LimitQuery {
    pub limit: Option<u32>,
}

/// Most recent snapshots, oldest first.
pub(super) async fn list_snapshots(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<MetricSnapshot>>>, ApiError> {
    let brand_id = parse_brand_id(&brand_id)?;
    let monitor = state.scheduler.monitor();
    monitor
        .brand(brand_id)
        .await
        .map_err(|e| map_monitor_error(&req_id.0, e))?;

    let data = monitor
        .store()
        .list_snapshots(brand_id, normalize_limit(query.limit, DEFAULT_SNAPSHOT_LIMIT))
        .await
        .map_err(|e| map_monitor_error(&req_id.0, e.into()))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Most recent alerts, newest first.
pub(super) async fn list_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Alert>>>, ApiError> {
    let brand_id = parse_brand_id(&brand_id)?;
    let monitor = state.scheduler.monitor();
    monitor
        .brand(brand_id)
        .await
        .map_err(|e| map_monitor_error(&req_id.0, e))?;

    let data = monitor
        .store()
        .list_alerts(brand_id, normalize_limit(query.limit, DEFAULT_ALERT_LIMIT))
        .await
        .map_err(|e| map_monitor_error(&req_id.0, e.into()))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
