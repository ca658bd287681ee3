use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::users::PublicUser;

/// GET /api/users/current - Identity of the bearer-token holder
pub async fn current_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .get(current.user_id)
        .ok_or_else(|| ApiError::unauthorized("Access token is invalid or expired"))?;

    Ok(Json(json!({
        "status": 200,
        "message": "Successfully retrieved current user!",
        "data": PublicUser::from(&user),
    })))
}
