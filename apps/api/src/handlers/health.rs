use axum::Json;
use axum::extract::State;
use maintrack_core::AppError;

use crate::dto::HealthResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Liveness plus a database round trip.
pub async fn health_handler(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .map_err(|error| AppError::Internal(format!("database health check failed: {error}")))?;

    Ok(Json(HealthResponse { status: "ok" }))
}
