use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config;

/// One authenticated device/browser session.
///
/// The refresh token itself is never stored; only its SHA-256 hash. At most
/// one valid hash exists per session identifier: every rotation replaces the
/// record wholesale, and every validation failure deletes it.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Freshly minted session credentials, handed back exactly once so the
/// plaintext refresh token can be placed in a cookie.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: String,
    pub refresh_token: String,
    pub user_id: Uuid,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    SessionNotFound,
    #[error("refresh token is invalid or expired")]
    InvalidOrExpiredRefreshToken,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session for `user_id`, issuing a fresh refresh token.
    async fn create(&self, user_id: Uuid) -> IssuedSession;

    /// Validate and rotate a session in one atomic step.
    ///
    /// On success the previous refresh token is superseded (single-use) and a
    /// renewed session identifier is issued. On any failure the session is
    /// destroyed; the identifier is permanently invalid afterwards.
    async fn refresh(&self, session_id: &str, refresh_token: &str) -> Result<IssuedSession, SessionError>;

    /// Delete a session (logout). Unknown identifiers are a no-op.
    async fn delete(&self, session_id: &str);

    /// Number of live sessions, reported by the health endpoint.
    async fn active_sessions(&self) -> usize;

    /// Refresh attempts observed since startup, successful or not.
    fn refresh_calls(&self) -> u64;
}

/// In-memory session store.
///
/// Validate-and-rotate runs entirely under one lock acquisition, so two
/// concurrent refresh calls against the same session (two browser tabs racing
/// after an access-token expiry) can never both succeed against a
/// since-rotated token.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
    refresh_calls: AtomicU64,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        let hours = config::config().security.session_ttl_hours;
        Self::with_ttl(Duration::hours(hours as i64))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            refresh_calls: AtomicU64::new(0),
        }
    }

    /// Drop every session. Test hook for simulating server-side invalidation.
    pub async fn clear(&self) {
        self.sessions.lock().await.clear();
    }

    fn mint(&self, user_id: Uuid) -> (Session, IssuedSession) {
        let session_id = Uuid::new_v4().to_string();
        let refresh_token = new_opaque_token();
        let now = Utc::now();

        let session = Session {
            id: session_id.clone(),
            user_id,
            refresh_token_hash: hash_token(&refresh_token),
            refresh_expires_at: now + self.ttl,
            created_at: now,
        };
        let issued = IssuedSession { session_id, refresh_token, user_id };
        (session, issued)
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: Uuid) -> IssuedSession {
        let (session, issued) = self.mint(user_id);
        self.sessions.lock().await.insert(session.id.clone(), session);
        tracing::debug!(user_id = %user_id, session_id = %issued.session_id, "session created");
        issued
    }

    async fn refresh(&self, session_id: &str, refresh_token: &str) -> Result<IssuedSession, SessionError> {
        self.refresh_calls.fetch_add(1, Ordering::Relaxed);

        let mut sessions = self.sessions.lock().await;

        // Removing up front makes failure paths destroy the session and keeps
        // the rotation single-use even under concurrent callers.
        let session = sessions.remove(session_id).ok_or(SessionError::SessionNotFound)?;

        if session.refresh_token_hash != hash_token(refresh_token)
            || session.refresh_expires_at <= Utc::now()
        {
            tracing::info!(session_id, "refresh rejected, session destroyed");
            return Err(SessionError::InvalidOrExpiredRefreshToken);
        }

        let (rotated, issued) = self.mint(session.user_id);
        sessions.insert(rotated.id.clone(), rotated);
        tracing::debug!(old = session_id, new = %issued.session_id, "session rotated");
        Ok(issued)
    }

    async fn delete(&self, session_id: &str) {
        self.sessions.lock().await.remove(session_id);
    }

    async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn refresh_calls(&self) -> u64 {
        self.refresh_calls.load(Ordering::Relaxed)
    }
}

/// Opaque refresh token: two v4 UUIDs worth of randomness, hex-compact.
fn new_opaque_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
