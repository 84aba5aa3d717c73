//! Order status endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::order::{CaptureOrdersRequest, ChangeStatusRequest, Order, UncapturedOrder, WorkflowStage},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct StatusOption {
    pub code: i32,
    pub label: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChangeStatusResponse {
    pub updated: usize,
    /// Acknowledgment returned by the order API
    #[schema(value_type = Object)]
    pub result: serde_json::Value,
}

#[derive(Serialize, ToSchema)]
pub struct CaptureOrdersResponse {
    pub captured: usize,
    pub message: String,
    /// Acknowledgment returned by the order API
    #[schema(value_type = Object)]
    pub result: serde_json::Value,
}

/// Orders the sales desk has yet to capture
#[utoipa::path(
    get,
    path = "/api/v1/orders/uncaptured",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Uncaptured orders", body = Vec<UncapturedOrder>),
        (status = 502, description = "Order API unavailable")
    )
)]
pub async fn list_uncaptured(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<UncapturedOrder>>> {
    Ok(Json(state.services.orders.list_uncaptured().await?))
}

/// Capture the selected orders
#[utoipa::path(
    post,
    path = "/api/v1/orders/capture",
    tag = "orders",
    security(("bearer_auth" = [])),
    request_body = CaptureOrdersRequest,
    responses(
        (status = 200, description = "Orders captured", body = CaptureOrdersResponse),
        (status = 400, description = "No orders selected"),
        (status = 502, description = "Order API unavailable")
    )
)]
pub async fn capture_orders(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CaptureOrdersRequest>,
) -> AppResult<Json<CaptureOrdersResponse>> {
    let captured = request.orders.len();
    let result = state
        .services
        .orders
        .capture_orders(request, &claims.operator())
        .await?;

    let message = if captured == 1 {
        "Order successfully captured.".to_string()
    } else {
        format!("{} orders captured successfully.", captured)
    };

    Ok(Json(CaptureOrdersResponse {
        captured,
        message,
        result,
    }))
}

/// Orders waiting at the capture stage
#[utoipa::path(
    get,
    path = "/api/v1/orders/captured",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Captured orders", body = Vec<Order>),
        (status = 502, description = "Order API unavailable")
    )
)]
pub async fn list_captured(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.services.orders.list_captured().await?))
}

/// Statuses a desk may set
#[utoipa::path(
    get,
    path = "/api/v1/orders/statuses/{stage}",
    tag = "orders",
    params(("stage" = WorkflowStage, Path, description = "sales or dispatch")),
    responses(
        (status = 200, description = "Statuses offered by the stage", body = Vec<StatusOption>)
    )
)]
pub async fn list_statuses(Path(stage): Path<WorkflowStage>) -> Json<Vec<StatusOption>> {
    Json(
        stage
            .statuses()
            .iter()
            .map(|s| StatusOption {
                code: s.code(),
                label: s.label().to_string(),
            })
            .collect(),
    )
}

/// Move orders to new statuses
#[utoipa::path(
    post,
    path = "/api/v1/orders/status",
    tag = "orders",
    security(("bearer_auth" = [])),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Statuses updated", body = ChangeStatusResponse),
        (status = 400, description = "Empty request or status not offered by the stage"),
        (status = 502, description = "Order API unavailable")
    )
)]
pub async fn change_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ChangeStatusRequest>,
) -> AppResult<Json<ChangeStatusResponse>> {
    let updated = request.orders.len();
    let result = state
        .services
        .orders
        .change_status(request, &claims.operator())
        .await?;

    Ok(Json(ChangeStatusResponse { updated, result }))
}
