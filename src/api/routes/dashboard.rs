//! Dashboard Routes
//!
//! - GET /api/v1/dashboard - Totals, status split, per-location and monthly series

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::FilterParams;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::{summarize, DashboardSummary};

/// GET /api/v1/dashboard
///
/// Aggregates over the same filters as the shift list.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<DashboardSummary>> {
    let shifts = state.shifts.query(&params.to_filter()).await?;
    Ok(Json(summarize(&shifts)))
}
