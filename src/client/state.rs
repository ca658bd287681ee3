use std::sync::{Arc, Mutex};

/// Process-wide client auth state, held explicitly rather than as a module
/// global so tests can run isolated instances side by side.
///
/// Cloning shares the underlying slot; the gateway, the coordinator and the
/// embedding application all observe the same token.
#[derive(Clone, Default)]
pub struct AuthState {
    token: Arc<Mutex<Option<String>>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current access token, if any. `None` means never authenticated or
    /// logged out.
    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.lock().unwrap() = Some(token.into());
    }

    /// Drop the stored credential (logout signal).
    pub fn clear(&self) {
        *self.token.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_slot() {
        let a = AuthState::new();
        let b = a.clone();
        a.set_token("tok-1");
        assert_eq!(b.token().as_deref(), Some("tok-1"));
        b.clear();
        assert!(a.token().is_none());
    }
}
