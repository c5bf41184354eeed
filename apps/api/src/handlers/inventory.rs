use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use maintrack_application::{
    AccessClaims, NewPart, PartListParams, PartUpdate, StockAdjustment, StockListParams,
};
use uuid::Uuid;

use crate::dto::{
    AdjustStockRequest, CreatePartRequest, PageResponse, PartListQuery, PartResponse,
    StockLevelResponse, StockListQuery, UpdatePartRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_parts_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(query): Query<PartListQuery>,
) -> ApiResult<Json<PageResponse<PartResponse>>> {
    let params = PartListParams::from(query);
    let page = state.inventory_service.list_parts(&claims, &params).await?;

    Ok(Json(page.map(PartResponse::from).into()))
}

pub async fn get_part_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(part_id): Path<Uuid>,
) -> ApiResult<Json<PartResponse>> {
    let part = state.inventory_service.find_part(&claims, part_id).await?;

    Ok(Json(PartResponse::from(part)))
}

pub async fn create_part_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<CreatePartRequest>,
) -> ApiResult<(StatusCode, Json<PartResponse>)> {
    let part = state
        .inventory_service
        .create_part(&claims, NewPart::from(payload))
        .await?;

    Ok((StatusCode::CREATED, Json(PartResponse::from(part))))
}

pub async fn update_part_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(part_id): Path<Uuid>,
    Json(payload): Json<UpdatePartRequest>,
) -> ApiResult<Json<PartResponse>> {
    let part = state
        .inventory_service
        .update_part(&claims, part_id, PartUpdate::from(payload))
        .await?;

    Ok(Json(PartResponse::from(part)))
}

pub async fn list_stock_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Query(query): Query<StockListQuery>,
) -> ApiResult<Json<PageResponse<StockLevelResponse>>> {
    let params = StockListParams::from(query);
    let page = state.inventory_service.list_stock(&claims, &params).await?;

    Ok(Json(page.map(StockLevelResponse::from).into()))
}

pub async fn adjust_stock_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<AdjustStockRequest>,
) -> ApiResult<Json<StockLevelResponse>> {
    let stock = state
        .inventory_service
        .adjust_stock(&claims, StockAdjustment::from(payload))
        .await?;

    Ok(Json(StockLevelResponse::from(stock)))
}
