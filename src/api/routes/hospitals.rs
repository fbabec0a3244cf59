//! Hospital Routes
//!
//! - GET /api/v1/hospitals?q=&limit= - Autocomplete over the reference list
//! - GET /api/v1/map - Markers for the filtered shifts

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{FilterParams, HospitalSearchParams, HospitalSearchResponse, MapResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::hospitals::map_markers;

/// GET /api/v1/hospitals
///
/// Queries shorter than two characters return an empty list.
pub async fn search_hospitals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HospitalSearchParams>,
) -> Json<HospitalSearchResponse> {
    let hospitals: Vec<_> = state
        .catalog
        .search(&params.q, params.limit)
        .into_iter()
        .cloned()
        .collect();

    Json(HospitalSearchResponse {
        count: hospitals.len(),
        hospitals,
    })
}

/// GET /api/v1/map
pub async fn get_map(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<MapResponse>> {
    let shifts = state.shifts.query(&params.to_filter()).await?;
    let unmapped = shifts.iter().filter(|s| s.coordinates.is_none()).count();

    Ok(Json(MapResponse {
        markers: map_markers(&shifts),
        unmapped,
    }))
}
