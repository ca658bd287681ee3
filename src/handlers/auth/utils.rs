use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::auth::{self, Claims};
use crate::config;
use crate::error::ApiError;
use crate::session::IssuedSession;
use crate::users::User;

/// Cookie names shared by login, refresh and logout.
///
/// Both are HttpOnly: the refresh credential is deliberately kept away from
/// client script and from the Authorization header.
pub const REFRESH_COOKIE: &str = "refreshToken";
pub const SESSION_COOKIE: &str = "sessionId";

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let cfg = &config::config().cookies;
    let same_site = if cfg.cross_origin { SameSite::None } else { SameSite::Lax };

    Cookie::build((name, value))
        .http_only(true)
        .path("/")
        .secure(cfg.secure)
        .same_site(same_site)
        .max_age(Duration::seconds(cfg.ttl_secs as i64))
        .build()
}

/// Attach the rotated `refreshToken` / `sessionId` pair to the response.
pub fn set_session_cookies(jar: CookieJar, issued: &IssuedSession) -> CookieJar {
    jar.add(session_cookie(REFRESH_COOKIE, issued.refresh_token.clone()))
        .add(session_cookie(SESSION_COOKIE, issued.session_id.clone()))
}

pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(REFRESH_COOKIE).path("/").build())
        .remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

pub fn issue_access_token(user: &User) -> Result<String, ApiError> {
    Ok(auth::generate_access_token(&Claims::new(user))?)
}

/// Minimal request body validation, enough to return a useful 400.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_password_format(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    Ok(())
}
