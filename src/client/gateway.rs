use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{cookie::Jar, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::coordinator::{RefreshCoordinator, RefreshTransport};
use super::state::AuthState;
use super::types::{Envelope, GatewayError, RefreshError, SessionData, UserInfo};

/// HTTP gateway for the Recipes API.
///
/// All authenticated traffic funnels through [`ApiClient::send_authed`]: the
/// current access token rides in the Authorization header, a 401 triggers
/// exactly one coordinated refresh-and-retry, and a second 401 on the retried
/// request surfaces as-is rather than starting another refresh cycle.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthState,
    coordinator: RefreshCoordinator,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        // One cookie jar shared by both clients: login responses deposit the
        // session cookies the refresh transport later presents.
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;
        let refresh_http = reqwest::Client::builder().cookie_provider(jar).build()?;

        let auth = AuthState::new();
        let transport = HttpRefreshTransport {
            http: refresh_http,
            refresh_url: format!("{}/api/auth/refresh", base_url),
        };
        let coordinator = RefreshCoordinator::new(auth.clone(), Arc::new(transport));

        Ok(Self {
            http,
            base_url,
            auth,
            coordinator,
        })
    }

    /// Shared auth state; embedding applications may persist or restore the
    /// access token across reloads through this handle.
    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<UserInfo, GatewayError> {
        let body = json!({ "name": name, "email": email, "password": password });
        let resp = self
            .dispatch(Method::POST, "/api/auth/register", Some(&body), None)
            .await?;
        let envelope: Envelope<UserInfo> = parse_envelope(resp).await?;
        require_data(envelope)
    }

    /// Authenticate, store the returned access token, and let the cookie jar
    /// capture the session cookies.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserInfo, GatewayError> {
        let body = json!({ "email": email, "password": password });
        let resp = self
            .dispatch(Method::POST, "/api/auth/login", Some(&body), None)
            .await?;
        let envelope: Envelope<SessionData> = parse_envelope(resp).await?;
        let session = require_data(envelope)?;

        self.auth.set_token(&session.access_token);
        Ok(session.user)
    }

    /// End the session. Local credentials are cleared even if the server-side
    /// delete fails.
    pub async fn logout(&self) -> Result<(), GatewayError> {
        let resp = self.dispatch(Method::POST, "/api/auth/logout", None, None).await?;
        self.auth.clear();

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(resp).await)
        }
    }

    pub async fn current_user(&self) -> Result<UserInfo, GatewayError> {
        self.get("/api/users/current").await
    }

    /// Authenticated GET returning the envelope's data payload.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let resp = self.send_authed(Method::GET, path, None).await?;
        require_data(parse_envelope(resp).await?)
    }

    /// Authenticated POST returning the envelope's data payload.
    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, GatewayError> {
        let resp = self.send_authed(Method::POST, path, Some(body)).await?;
        require_data(parse_envelope(resp).await?)
    }

    /// Issue an authenticated request, driving the refresh protocol on 401.
    async fn send_authed(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, GatewayError> {
        let token = self.auth.token();
        let resp = self
            .dispatch(method.clone(), path, body.as_ref(), token.as_deref())
            .await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }
        let original = error_from_response(resp).await;

        match self.coordinator.refresh().await {
            Ok(session) => {
                let retried = self
                    .dispatch(method, path, body.as_ref(), Some(&session.access_token))
                    .await?;
                if retried.status() == StatusCode::UNAUTHORIZED {
                    // Already retried once; never start a second refresh cycle
                    Err(error_from_response(retried).await)
                } else {
                    Ok(retried)
                }
            }
            // The coordinator already cleared local state; the caller sees
            // the original authorization failure
            Err(_) => Err(original),
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut request = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}

/// Cookie-only refresh channel; deliberately never attaches a bearer token.
struct HttpRefreshTransport {
    http: reqwest::Client,
    refresh_url: String,
}

#[async_trait]
impl RefreshTransport for HttpRefreshTransport {
    async fn refresh_session(&self) -> Result<SessionData, RefreshError> {
        let resp = self
            .http
            .post(&self.refresh_url)
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("authorization failed")
                .to_string();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<SessionData> =
            serde_json::from_value(body).map_err(|e| RefreshError::Transport(e.to_string()))?;
        envelope
            .data
            .ok_or_else(|| RefreshError::Transport("refresh response missing data".to_string()))
    }
}

async fn parse_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<Envelope<T>, GatewayError> {
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    resp.json::<Envelope<T>>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

fn require_data<T>(envelope: Envelope<T>) -> Result<T, GatewayError> {
    let Envelope { status, message, data } = envelope;
    data.ok_or_else(|| {
        GatewayError::Decode(format!("response envelope ({}) carried no data: {}", status, message))
    })
}

async fn error_from_response(resp: reqwest::Response) -> GatewayError {
    let status = resp.status().as_u16();
    let message = resp
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());
    GatewayError::Api { status, message }
}
