use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use maintrack_application::{AccessClaims, NewWorkOrder, WorkOrderListParams, WorkOrderUpdate};
use maintrack_domain::UserId;
use uuid::Uuid;

use crate::dto::{
    AssignWorkOrderRequest, CreateWorkOrderRequest, PageResponse, UpdateWorkOrderRequest,
    WorkOrderListQuery, WorkOrderResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_work_orders_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(query): Query<WorkOrderListQuery>,
) -> ApiResult<Json<PageResponse<WorkOrderResponse>>> {
    let params = WorkOrderListParams::try_from(query)?;
    let page = state.work_order_service.list(&claims, &params).await?;

    Ok(Json(page.map(WorkOrderResponse::from).into()))
}

pub async fn get_work_order_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(work_order_id): Path<Uuid>,
) -> ApiResult<Json<WorkOrderResponse>> {
    let work_order = state
        .work_order_service
        .find(&claims, work_order_id)
        .await?;

    Ok(Json(WorkOrderResponse::from(work_order)))
}

pub async fn create_work_order_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<CreateWorkOrderRequest>,
) -> ApiResult<(StatusCode, Json<WorkOrderResponse>)> {
    let input = NewWorkOrder::try_from(payload)?;
    let work_order = state.work_order_service.create(&claims, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(WorkOrderResponse::from(work_order)),
    ))
}

pub async fn update_work_order_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(work_order_id): Path<Uuid>,
    Json(payload): Json<UpdateWorkOrderRequest>,
) -> ApiResult<Json<WorkOrderResponse>> {
    let update = WorkOrderUpdate::try_from(payload)?;
    let work_order = state
        .work_order_service
        .update(&claims, work_order_id, update)
        .await?;

    Ok(Json(WorkOrderResponse::from(work_order)))
}

pub async fn assign_work_order_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(work_order_id): Path<Uuid>,
    Json(payload): Json<AssignWorkOrderRequest>,
) -> ApiResult<Json<WorkOrderResponse>> {
    let work_order = state
        .work_order_service
        .assign(&claims, work_order_id, UserId::from_uuid(payload.assignee_id))
        .await?;

    Ok(Json(WorkOrderResponse::from(work_order)))
}

pub async fn close_work_order_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(work_order_id): Path<Uuid>,
) -> ApiResult<Json<WorkOrderResponse>> {
    let work_order = state
        .work_order_service
        .close(&claims, work_order_id)
        .await?;

    Ok(Json(WorkOrderResponse::from(work_order)))
}
