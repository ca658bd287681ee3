use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::state::AuthState;
use super::types::{RefreshError, SessionData};

/// Credential-free channel the refresh call travels on. Implemented over HTTP
/// by the gateway; swapped for instrumented fakes in tests.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    async fn refresh_session(&self) -> Result<SessionData, RefreshError>;
}

type Waiter = oneshot::Sender<Result<SessionData, RefreshError>>;

/// Single-flight coordinator for access-token refresh.
///
/// Two states: `Idle` (`in_flight` is `None`) and `RefreshInFlight`
/// (`in_flight` holds the queue of waiting continuations). The first caller
/// to arrive while idle becomes the leader and issues the one refresh call;
/// everyone arriving while it is outstanding parks a oneshot in the queue and
/// awaits the shared outcome. The lock is never held across an await.
pub struct RefreshCoordinator {
    auth: AuthState,
    transport: Arc<dyn RefreshTransport>,
    in_flight: Mutex<Option<Vec<Waiter>>>,
}

impl RefreshCoordinator {
    pub fn new(auth: AuthState, transport: Arc<dyn RefreshTransport>) -> Self {
        Self {
            auth,
            transport,
            in_flight: Mutex::new(None),
        }
    }

    /// Obtain a fresh session, coalescing concurrent callers onto one wire
    /// call.
    ///
    /// On success the shared [`AuthState`] holds the new access token and
    /// every caller receives the same [`SessionData`]. On failure the state
    /// is cleared (local logout) and every caller receives the same error.
    /// Never attempted when no credential was ever stored.
    pub async fn refresh(&self) -> Result<SessionData, RefreshError> {
        if self.auth.token().is_none() {
            return Err(RefreshError::NoStoredCredential);
        }

        let rx = {
            let mut in_flight = self.in_flight.lock().unwrap();
            match in_flight.as_mut() {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                None => {
                    *in_flight = Some(Vec::new());
                    None
                }
            }
        };

        if let Some(rx) = rx {
            // A refresh is already outstanding; await its outcome
            return rx
                .await
                .map_err(|_| RefreshError::Transport("refresh abandoned".to_string()))?;
        }

        // Leader path: issue the single refresh call
        let outcome = self.transport.refresh_session().await;

        match &outcome {
            Ok(session) => self.auth.set_token(&session.access_token),
            Err(err) => {
                tracing::debug!("refresh failed, clearing client credentials: {}", err);
                self.auth.clear();
            }
        }

        let waiters = self.in_flight.lock().unwrap().take().unwrap_or_default();
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;
    use uuid::Uuid;

    use crate::client::types::UserInfo;

    fn session(token: &str) -> SessionData {
        SessionData {
            access_token: token.to_string(),
            user: UserInfo {
                id: Uuid::new_v4(),
                name: "Olga".to_string(),
                email: "olga@example.com".to_string(),
            },
        }
    }

    /// Transport that blocks until the test releases it, counting calls.
    struct GatedTransport {
        calls: AtomicUsize,
        gate: Semaphore,
        outcome: Result<SessionData, RefreshError>,
    }

    impl GatedTransport {
        fn new(outcome: Result<SessionData, RefreshError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Semaphore::new(0),
                outcome,
            })
        }

        fn release(&self) {
            self.gate.add_permits(1);
        }
    }

    #[async_trait]
    impl RefreshTransport for GatedTransport {
        async fn refresh_session(&self) -> Result<SessionData, RefreshError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.acquire().await.unwrap().forget();
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh_call() {
        let transport = GatedTransport::new(Ok(session("fresh-token")));
        let auth = AuthState::new();
        auth.set_token("stale-token");
        let coordinator = Arc::new(RefreshCoordinator::new(auth.clone(), transport.clone()));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move { coordinator.refresh().await }));
        }

        // Let all three tasks reach the coordinator before releasing the wire
        while transport.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        transport.release();

        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            assert_eq!(outcome.access_token, "fresh-token");
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(auth.token().as_deref(), Some("fresh-token"));
    }

    #[tokio::test]
    async fn failure_fans_out_and_logs_out() {
        let transport = GatedTransport::new(Err(RefreshError::Rejected {
            status: 401,
            message: "Session token is invalid or expired".to_string(),
        }));
        let auth = AuthState::new();
        auth.set_token("stale-token");
        let coordinator = Arc::new(RefreshCoordinator::new(auth.clone(), transport.clone()));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move { coordinator.refresh().await }));
        }

        while transport.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        transport.release();

        for handle in handles {
            let outcome = handle.await.unwrap();
            assert!(matches!(outcome, Err(RefreshError::Rejected { status: 401, .. })));
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(auth.token().is_none(), "failed refresh clears client state");
    }

    #[tokio::test]
    async fn no_stored_credential_short_circuits() {
        let transport = GatedTransport::new(Ok(session("unreachable")));
        let coordinator = RefreshCoordinator::new(AuthState::new(), transport.clone());

        let outcome = coordinator.refresh().await;
        assert!(matches!(outcome, Err(RefreshError::NoStoredCredential)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0, "no refresh call issued");
    }

    #[tokio::test]
    async fn coordinator_returns_to_idle_after_settling() {
        let transport = GatedTransport::new(Ok(session("token-a")));
        let auth = AuthState::new();
        auth.set_token("stale");
        let coordinator = RefreshCoordinator::new(auth, transport.clone());

        transport.release();
        coordinator.refresh().await.unwrap();

        // A later 401 cycle starts a brand-new refresh call
        transport.release();
        coordinator.refresh().await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
