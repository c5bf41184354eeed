use axum::Json;
use axum::extract::{Extension, Query, State};
use maintrack_application::{AccessClaims, AuditLogListParams};

use crate::dto::{AuditLogEntryResponse, AuditLogListQuery, PageResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audit_logs_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(query): Query<AuditLogListQuery>,
) -> ApiResult<Json<PageResponse<AuditLogEntryResponse>>> {
    let params = AuditLogListParams::from(query);
    let page = state.audit_log_service.list(&claims, &params).await?;

    Ok(Json(page.map(AuditLogEntryResponse::from).into()))
}
