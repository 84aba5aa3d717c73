//! Authenticated user identity

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, models::user::CurrentUser};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct FetchUserResponse {
    pub user: CurrentUser,
}

#[derive(Serialize, ToSchema)]
pub struct UnauthorizedResponse {
    pub error: String,
}

/// Identity of the signed-in operator
#[utoipa::path(
    get,
    path = "/api/fetchUser",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Signed-in user", body = FetchUserResponse),
        (status = 401, description = "Not signed in", body = UnauthorizedResponse)
    )
)]
pub async fn fetch_user(user: Result<AuthenticatedUser, AppError>) -> Response {
    match user {
        Ok(AuthenticatedUser(claims)) => Json(FetchUserResponse {
            user: CurrentUser {
                email: claims.operator(),
            },
        })
        .into_response(),
        Err(e) => {
            tracing::debug!("fetchUser rejected: {}", e);
            (
                StatusCode::UNAUTHORIZED,
                Json(UnauthorizedResponse {
                    error: "Unauthorized".to_string(),
                }),
            )
                .into_response()
        }
    }
}
