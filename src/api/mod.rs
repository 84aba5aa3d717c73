//! API handlers for Stockscan REST endpoints

pub mod dispatch;
pub mod health;
pub mod openapi;
pub mod orders;
pub mod sessions;
pub mod user;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Scan sessions
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::close_session),
        )
        .route("/sessions/:id/frames", post(sessions::push_frame))
        .route("/sessions/:id/form", put(sessions::update_form))
        .route("/sessions/:id/capture", post(sessions::capture_stock))
        .route("/sessions/:id/camera/toggle", post(sessions::toggle_camera))
        // Orders
        .route("/orders/captured", get(orders::list_captured))
        .route("/orders/statuses/:stage", get(orders::list_statuses))
        .route("/orders/status", post(orders::change_status))
        .route("/orders/uncaptured", get(orders::list_uncaptured))
        .route("/orders/capture", post(orders::capture_orders))
        // Dispatch documents
        .route("/tripsheets/:id", get(dispatch::get_trip_sheet))
        .route("/deliverynotes/:dnn", get(dispatch::get_delivery_note))
        .with_state(state.clone());

    Router::new()
        .route("/api/fetchUser", get(user::fetch_user))
        .with_state(state)
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
