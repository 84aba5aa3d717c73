//! Scan session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::session::SessionSnapshot,
    scanner::CameraDevice,
    services::{session::FormUpdate, sessions::StationCameras},
    AppState,
};

use super::AuthenticatedUser;

/// Mount request sent by the station
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Cameras the station enumerated; omitted to use the configured ones
    #[serde(default)]
    pub cameras: Option<Vec<CameraDevice>>,
    /// Reason the station could not access its cameras
    #[serde(default)]
    pub camera_error: Option<String>,
}

/// One frame decoded on the station
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FrameRequest {
    #[validate(length(min = 1, max = 512))]
    pub text: String,
}

/// Quantity as typed by the operator: a number, or text where blank clears it
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum QuantityInput {
    Count(i64),
    Text(String),
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFormRequest {
    #[serde(default)]
    pub quantity: Option<QuantityInput>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub reference: Option<String>,
}

fn parse_quantity(input: QuantityInput) -> AppResult<Option<u32>> {
    let invalid = || AppError::Validation("Quantity must be a whole number of zero or more".to_string());
    match input {
        QuantityInput::Count(n) => u32::try_from(n).map(Some).map_err(|_| invalid()),
        QuantityInput::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                text.parse::<u32>().map(Some).map_err(|_| invalid())
            }
        }
    }
}

/// Mount a scan session for the signed-in operator
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    security(("bearer_auth" = [])),
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session mounted", body = SessionSnapshot),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateSessionRequest>,
) -> AppResult<(StatusCode, Json<SessionSnapshot>)> {
    let snapshot = state
        .services
        .sessions
        .create(
            Some(claims.operator()),
            StationCameras {
                cameras: request.cameras,
                access_error: request.camera_error,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Current state of a session
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state", body = SessionSnapshot),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    Ok(Json(state.services.sessions.snapshot(id).await?))
}

/// Tear a session down and release its scanner
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Final session state", body = SessionSnapshot),
        (status = 404, description = "Session not found")
    )
)]
pub async fn close_session(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    Ok(Json(state.services.sessions.teardown(id).await?))
}

/// Push a frame decoded by the station's camera
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/frames",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = FrameRequest,
    responses(
        (status = 202, description = "Frame queued for lookup"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Scanner is not running")
    )
)]
pub async fn push_frame(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<FrameRequest>,
) -> AppResult<StatusCode> {
    request.validate()?;
    state.services.sessions.push_frame(id, &request.text).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Edit the quantity and reference fields
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{id}/form",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = UpdateFormRequest,
    responses(
        (status = 200, description = "Updated session state", body = SessionSnapshot),
        (status = 400, description = "Invalid quantity or reference")
    )
)]
pub async fn update_form(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFormRequest>,
) -> AppResult<Json<SessionSnapshot>> {
    request.validate()?;
    let update = FormUpdate {
        quantity: request.quantity.map(parse_quantity).transpose()?,
        reference: request.reference,
    };
    Ok(Json(state.services.sessions.update_form(id, update).await?))
}

/// Capture the counted quantity against the last scanned item
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/capture",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Capture attempted; a failure is reported in `error`", body = SessionSnapshot),
        (status = 409, description = "Nothing to capture yet")
    )
)]
pub async fn capture_stock(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    Ok(Json(state.services.sessions.capture(id).await?))
}

/// Switch scanning to the next camera
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/camera/toggle",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state after the switch", body = SessionSnapshot),
        (status = 409, description = "Camera toggling disabled")
    )
)]
pub async fn toggle_camera(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    Ok(Json(state.services.sessions.toggle_camera(id).await?))
}
