use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use super::utils::{issue_access_token, set_session_cookies};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::PublicUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login - Authenticate and open a session
///
/// On success a session record is created server-side and its credentials are
/// delivered as HttpOnly cookies (`refreshToken`, `sessionId`), while the
/// short-lived access token travels in the JSON body:
///
/// ```json
/// {
///   "status": 200,
///   "message": "Successfully logged in an user!",
///   "data": {
///     "accessToken": "eyJhbGciOiJIUzI1NiI...",
///     "user": { "id": "...", "name": "...", "email": "..." }
///   }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.verify(&payload.email, &payload.password)?;
    let issued = state.sessions.create(user.id).await;
    let access_token = issue_access_token(&user)?;

    let jar = set_session_cookies(jar, &issued);
    tracing::info!(user_id = %user.id, "user logged in");

    Ok((
        jar,
        Json(json!({
            "status": 200,
            "message": "Successfully logged in an user!",
            "data": {
                "accessToken": access_token,
                "user": PublicUser::from(&user),
            },
        })),
    ))
}
