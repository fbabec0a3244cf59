//! Export Routes
//!
//! Data export endpoint for backup and accounting.
//!
//! - GET /api/v1/shifts/export - Export filtered shifts as CSV or JSON

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::ExportParams;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::shifts::write_csv;

/// GET /api/v1/shifts/export
///
/// Export the filtered shifts, newest first, as an attachment.
pub async fn export_shifts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    // Check if export is enabled
    if !state.config.enable_export {
        return Err(ApiError::Validation(
            "Export feature is disabled".to_string(),
        ));
    }

    let format = params.format.to_lowercase();
    let (content_type, extension) = match format.as_str() {
        "csv" => ("text/csv; charset=utf-8", "csv"),
        "json" => ("application/json", "json"),
        other => {
            return Err(ApiError::Validation(format!(
                "Unknown export format: {}. Use csv or json",
                other
            )))
        }
    };

    let shifts = state.shifts.query(&params.to_filter()).await?;

    let body = match extension {
        "csv" => write_csv(&shifts)?,
        _ => serde_json::to_string_pretty(&shifts)
            .map_err(|e| ApiError::Internal(format!("Failed to encode export: {}", e)))?,
    };

    tracing::info!(count = shifts.len(), format = %extension, "Exported shifts");

    let filename = format!(
        "plantoes_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        extension
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(body),
    )
        .into_response())
}
