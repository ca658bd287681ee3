use std::sync::Arc;
use std::time::Instant;

use crate::session::{MemorySessionStore, SessionStore};
use crate::users::MemoryUserStore;

/// Shared application state handed to every handler.
///
/// The session store sits behind a trait object so the handlers stay agnostic
/// of where sessions actually live.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<MemoryUserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            started_at: Instant::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
