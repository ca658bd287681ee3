use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use super::utils::{issue_access_token, set_session_cookies, REFRESH_COOKIE, SESSION_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::PublicUser;

/// POST /api/auth/refresh - Exchange the session cookies for a new access token
///
/// The request carries no body and no Authorization header; `sessionId` and
/// `refreshToken` arrive exclusively via cookies. Validate-and-rotate is one
/// atomic step in the session store: on success the previous refresh token is
/// superseded (single-use) and rotated cookies accompany the response; on any
/// failure no rotation happens, the session is destroyed, and the caller gets
/// a generic 401 that does not reveal which part of the credential was wrong.
///
/// Success response:
/// ```json
/// {
///   "status": 200,
///   "message": "Successfully refreshed a session!",
///   "data": {
///     "accessToken": "eyJhbGciOiJIUzI1NiI...",
///     "user": { "id": "...", "name": "...", "email": "..." }
///   }
/// }
/// ```
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    let (Some(session_id), Some(refresh_token)) = (session_id, refresh_token) else {
        return Err(ApiError::unauthorized("Session token is invalid or expired"));
    };

    let issued = state.sessions.refresh(&session_id, &refresh_token).await?;

    let Some(user) = state.users.get(issued.user_id) else {
        // Account vanished between rotations; the fresh session is worthless
        state.sessions.delete(&issued.session_id).await;
        return Err(ApiError::unauthorized("Session token is invalid or expired"));
    };

    let access_token = issue_access_token(&user)?;
    let jar = set_session_cookies(jar, &issued);

    Ok((
        jar,
        Json(json!({
            "status": 200,
            "message": "Successfully refreshed a session!",
            "data": {
                "accessToken": access_token,
                "user": PublicUser::from(&user),
            },
        })),
    ))
}
