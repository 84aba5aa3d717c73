//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{dispatch, health, orders, sessions, user};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockscan API",
        version = "1.0.0",
        description = "Warehouse scan station and order workflow REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Identity
        user::fetch_user,
        // Scan sessions
        sessions::create_session,
        sessions::get_session,
        sessions::close_session,
        sessions::push_frame,
        sessions::update_form,
        sessions::capture_stock,
        sessions::toggle_camera,
        // Orders
        orders::list_captured,
        orders::list_statuses,
        orders::change_status,
        orders::list_uncaptured,
        orders::capture_orders,
        // Dispatch documents
        dispatch::get_trip_sheet,
        dispatch::get_delivery_note,
    ),
    components(
        schemas(
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Identity
            user::FetchUserResponse,
            user::UnauthorizedResponse,
            crate::models::user::CurrentUser,
            // Sessions
            sessions::CreateSessionRequest,
            sessions::FrameRequest,
            sessions::QuantityInput,
            sessions::UpdateFormRequest,
            crate::models::session::SessionSnapshot,
            crate::models::session::SessionPhase,
            crate::models::stock::StockRecord,
            crate::scanner::CameraDevice,
            // Orders
            orders::StatusOption,
            orders::ChangeStatusResponse,
            crate::models::order::Order,
            crate::models::order::OrderStatus,
            crate::models::order::Priority,
            crate::models::order::WorkflowStage,
            crate::models::order::StatusChange,
            crate::models::order::ChangeStatusRequest,
            orders::CaptureOrdersResponse,
            crate::models::order::UncapturedOrder,
            crate::models::order::OrderCapture,
            crate::models::order::CaptureOrdersRequest,
            // Dispatch documents
            crate::models::dispatch::TripSheetEntry,
            crate::models::dispatch::DeliveryNote,
            crate::models::dispatch::DeliveryNoteLine,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Operator identity"),
        (name = "sessions", description = "Barcode scan and stock-take capture sessions"),
        (name = "orders", description = "Sales and dispatch order status workflow"),
        (name = "dispatch", description = "Trip sheets and delivery notes")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
