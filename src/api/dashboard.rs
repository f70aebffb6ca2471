use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::{CurrentUser, DashboardData};

/// GET /dashboard
/// Aggregate counters, recent activity, the caller's assigned bugs and the
/// chart distributions, in one response.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<DashboardData>>, ApiError> {
    let data = state.dashboard().overview(&user).await?;

    Ok(Json(ApiResponse::success(data)))
}
