use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use super::utils::{validate_email_format, validate_password_format};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// POST /api/auth/register - Create a new user account
///
/// Duplicate e-mail addresses are a 409 conflict. Registration does not log
/// the user in; clients follow up with POST /api/auth/login.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }
    validate_email_format(&payload.email).map_err(ApiError::bad_request)?;
    validate_password_format(&payload.password).map_err(ApiError::bad_request)?;

    let user = state.users.register(&payload.name, &payload.email, &payload.password)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": 201,
            "message": "Successfully registered a user!",
            "data": user,
        })),
    ))
}
