//! Shift Routes
//!
//! CRUD endpoints for shift records.
//!
//! - GET /api/v1/shifts - List with filters
//! - POST /api/v1/shifts - Create one shift
//! - POST /api/v1/shifts/batch - Import many shifts
//! - GET /api/v1/shifts/:id - Fetch one shift
//! - PATCH /api/v1/shifts/:id - Inline edit
//! - POST /api/v1/shifts/:id/status - Status transition
//! - DELETE /api/v1/shifts/:id - Delete

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    BatchError, BatchShiftRequest, BatchShiftResponse, FilterParams, ShiftListResponse,
    StatusChangeRequest,
};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::shifts::{NewShift, Shift, ShiftPatch};

/// GET /api/v1/shifts
///
/// Shifts matching the filter, newest first.
pub async fn list_shifts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<ShiftListResponse>> {
    let shifts = state.shifts.query(&params.to_filter()).await?;

    Ok(Json(ShiftListResponse {
        count: shifts.len(),
        shifts,
    }))
}

/// POST /api/v1/shifts
///
/// Create a shift. Tax is derived from the default rate unless given.
pub async fn create_shift(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewShift>,
) -> ApiResult<(StatusCode, Json<Shift>)> {
    state.ensure_can_write(&headers).await?;

    let shift = state.shifts.create(req).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

/// POST /api/v1/shifts/batch
///
/// Import many shifts. Valid items are stored even when others fail.
pub async fn import_shifts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BatchShiftRequest>,
) -> ApiResult<(StatusCode, Json<BatchShiftResponse>)> {
    state.ensure_can_write(&headers).await?;

    let report = state.shifts.import(req.shifts).await?;
    let accepted = report.accepted();
    let rejected = report.rejected();

    let (status, status_str) = if rejected == 0 {
        (StatusCode::CREATED, "ok")
    } else if accepted > 0 {
        (StatusCode::MULTI_STATUS, "partial")
    } else {
        (StatusCode::BAD_REQUEST, "failed")
    };

    Ok((
        status,
        Json(BatchShiftResponse {
            status: status_str.to_string(),
            accepted,
            rejected,
            created: report.created,
            errors: report
                .errors
                .into_iter()
                .map(|e| BatchError {
                    index: e.index,
                    error: e.error,
                })
                .collect(),
        }),
    ))
}

/// GET /api/v1/shifts/:id
pub async fn get_shift(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Shift>> {
    Ok(Json(state.shifts.get(&id).await?))
}

/// PATCH /api/v1/shifts/:id
///
/// Inline edit; only the fields present are changed.
pub async fn update_shift(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<ShiftPatch>,
) -> ApiResult<Json<Shift>> {
    state.ensure_can_write(&headers).await?;
    Ok(Json(state.shifts.update(&id, patch).await?))
}

/// POST /api/v1/shifts/:id/status
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<StatusChangeRequest>,
) -> ApiResult<Json<Shift>> {
    state.ensure_can_write(&headers).await?;
    Ok(Json(state.shifts.set_status(&id, req.status).await?))
}

/// DELETE /api/v1/shifts/:id
pub async fn delete_shift(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    state.ensure_can_write(&headers).await?;
    state.shifts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
