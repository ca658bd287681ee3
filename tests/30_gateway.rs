mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use recipes_api_rust::client::ApiClient;
use recipes_api_rust::session::SessionStore;

async fn logged_in_client(server: &common::TestServer) -> Result<ApiClient> {
    let client = ApiClient::new(&server.base_url)?;
    client.register("Olga", "olga@example.com", "hunter2222").await?;
    client.login("olga@example.com", "hunter2222").await?;
    Ok(client)
}

#[tokio::test]
async fn login_then_current_user() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = logged_in_client(&server).await?;

    let user = client.current_user().await?;
    assert_eq!(user.email, "olga@example.com");
    assert_eq!(server.sessions.refresh_calls(), 0, "no refresh needed for a fresh token");
    Ok(())
}

#[tokio::test]
async fn stale_token_is_refreshed_transparently() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = logged_in_client(&server).await?;

    // Simulate an expired access token while the session cookies stay valid
    client.auth_state().set_token("stale-access-token");

    let user = client.current_user().await?;
    assert_eq!(user.email, "olga@example.com");
    assert_eq!(server.sessions.refresh_calls(), 1);

    // The process-wide state now holds the refreshed token
    let token = client.auth_state().token().expect("token after refresh");
    assert_ne!(token, "stale-access-token");
    Ok(())
}

#[tokio::test]
async fn concurrent_401s_share_a_single_refresh() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = logged_in_client(&server).await?;

    client.auth_state().set_token("stale-access-token");

    let outcomes = futures::future::join_all(vec![
        client.current_user(),
        client.current_user(),
        client.current_user(),
    ])
    .await;

    for outcome in outcomes {
        assert_eq!(outcome?.email, "olga@example.com");
    }
    assert_eq!(
        server.sessions.refresh_calls(),
        1,
        "exactly one refresh call reaches the server"
    );
    Ok(())
}

#[tokio::test]
async fn failed_refresh_rejects_queued_calls_and_logs_out() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = logged_in_client(&server).await?;

    // Invalidate both credentials: the access token is stale and the session
    // is gone server-side, so the refresh must fail
    client.auth_state().set_token("stale-access-token");
    server.sessions.clear().await;

    let outcomes = futures::future::join_all(vec![
        client.current_user(),
        client.current_user(),
    ])
    .await;

    for outcome in outcomes {
        let err = outcome.expect_err("call must fail when refresh fails");
        assert_eq!(err.status(), Some(401), "original authorization error surfaces");
    }
    assert!(
        client.auth_state().token().is_none(),
        "failed refresh clears client state"
    );
    Ok(())
}

#[tokio::test]
async fn never_authenticated_short_circuits_without_refresh() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = ApiClient::new(&server.base_url)?;

    let err = client.current_user().await.expect_err("must fail");
    assert_eq!(err.status(), Some(401));
    assert_eq!(server.sessions.refresh_calls(), 0, "no refresh call issued");
    Ok(())
}

/// Stub backend whose protected route answers 401 unconditionally, to prove
/// the gateway retries once and never starts a second refresh cycle.
async fn spawn_stubborn_401_server() -> Result<(String, Arc<AtomicUsize>, Arc<AtomicUsize>)> {
    let request_hits = Arc::new(AtomicUsize::new(0));
    let refresh_hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/api/users/current", get({
            let hits = request_hits.clone();
            move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "status": 401, "message": "Access token is invalid or expired" })),
                    )
                }
            }
        }))
        .route("/api/auth/refresh", post({
            let hits = refresh_hits.clone();
            move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "status": 200,
                        "message": "Successfully refreshed a session!",
                        "data": {
                            "accessToken": "fresh-access-token",
                            "user": {
                                "id": uuid::Uuid::new_v4(),
                                "name": "Olga",
                                "email": "olga@example.com",
                            },
                        },
                    }))
                }
            }
        }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    Ok((base_url, request_hits, refresh_hits))
}

#[tokio::test]
async fn retried_request_never_starts_a_second_refresh_cycle() -> Result<()> {
    let (base_url, request_hits, refresh_hits) = spawn_stubborn_401_server().await?;

    let client = ApiClient::new(&base_url)?;
    client.auth_state().set_token("stale-access-token");

    let err = client.current_user().await.expect_err("persistent 401 must fail");
    assert_eq!(err.status(), Some(401));

    assert_eq!(request_hits.load(Ordering::SeqCst), 2, "original call plus one retry");
    assert_eq!(refresh_hits.load(Ordering::SeqCst), 1, "no second refresh cycle");
    Ok(())
}
