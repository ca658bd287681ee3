#![allow(dead_code)]

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use recipes_api_rust::session::MemorySessionStore;
use recipes_api_rust::state::AppState;
use recipes_api_rust::users::MemoryUserStore;

pub struct TestServer {
    pub base_url: String,
    pub users: Arc<MemoryUserStore>,
    pub sessions: Arc<MemorySessionStore>,
}

/// Spin up the real router on an ephemeral port, keeping direct handles to
/// the stores so tests can observe refresh counts and force invalidation.
pub async fn spawn_server() -> Result<TestServer> {
    let users = Arc::new(MemoryUserStore::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let state = AppState {
        users: users.clone(),
        sessions: sessions.clone(),
        started_at: Instant::now(),
    };

    let app = recipes_api_rust::app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    Ok(TestServer { base_url, users, sessions })
}

/// Pull a cookie's value out of the Set-Cookie response headers.
pub fn cookie_value(resp: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| {
            header
                .strip_prefix(&prefix)
                .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        })
}

pub async fn register_user(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let res = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&serde_json::json!({ "name": name, "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == reqwest::StatusCode::CREATED, "register failed: {}", res.status());
    Ok(())
}
