use axum::Json;
use axum::extract::{Extension, State};
use maintrack_application::{AccessClaims, TenantSettingsUpdate};

use crate::dto::{TenantSettingsResponse, UpdateTenantSettingsRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_tenant_settings_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> ApiResult<Json<TenantSettingsResponse>> {
    let settings = state.tenant_service.settings(&claims).await?;

    Ok(Json(TenantSettingsResponse::from(settings)))
}

pub async fn update_tenant_settings_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<UpdateTenantSettingsRequest>,
) -> ApiResult<Json<TenantSettingsResponse>> {
    let settings = state
        .tenant_service
        .update_settings(&claims, TenantSettingsUpdate::from(payload))
        .await?;

    Ok(Json(TenantSettingsResponse::from(settings)))
}
