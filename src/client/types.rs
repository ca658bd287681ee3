use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The `{status, message, data}` envelope every endpoint answers with,
/// decoded at the boundary instead of picked apart ad hoc.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

/// Payload of a successful login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub access_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Failure of the refresh call itself. `Clone` because a single failure fans
/// out to every request queued behind the in-flight refresh.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// No access token has ever been stored; refresh is not even attempted.
    #[error("no stored credential")]
    NoStoredCredential,
    /// The server rejected the session cookies.
    #[error("refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The refresh call never produced a usable response.
    #[error("refresh transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status, .. } => Some(*status),
            GatewayError::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
