//! Trip sheet and delivery note endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::dispatch::{DeliveryNote, TripSheetEntry},
    AppState,
};

use super::AuthenticatedUser;

/// Orders loaded on a trip sheet
#[utoipa::path(
    get,
    path = "/api/v1/tripsheets/{id}",
    tag = "dispatch",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Trip sheet ID")),
    responses(
        (status = 200, description = "Trip sheet orders", body = Vec<TripSheetEntry>),
        (status = 502, description = "Order API unavailable")
    )
)]
pub async fn get_trip_sheet(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<TripSheetEntry>>> {
    Ok(Json(state.services.dispatch.trip_sheet(&id).await?))
}

/// A delivery note with its priced lines
#[utoipa::path(
    get,
    path = "/api/v1/deliverynotes/{dnn}",
    tag = "dispatch",
    security(("bearer_auth" = [])),
    params(("dnn" = String, Path, description = "Delivery note number")),
    responses(
        (status = 200, description = "Delivery note", body = DeliveryNote),
        (status = 502, description = "Order API unavailable or unknown note")
    )
)]
pub async fn get_delivery_note(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(dnn): Path<String>,
) -> AppResult<Json<DeliveryNote>> {
    Ok(Json(state.services.dispatch.delivery_note(&dnn).await?))
}
