use axum::{extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;

use super::utils::{clear_session_cookies, SESSION_COOKIE};
use crate::state::AppState;

/// POST /api/auth/logout - Delete the session and clear its cookies
///
/// Identified by the `sessionId` cookie alone; an unknown or absent session
/// still answers 204 so logout is idempotent.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.delete(cookie.value()).await;
        tracing::debug!(session_id = cookie.value(), "session logged out");
    }

    (clear_session_cookies(jar), StatusCode::NO_CONTENT)
}
