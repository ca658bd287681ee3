//! Typed API client for the Recipes backend.
//!
//! The gateway is the sole pathway for authenticated calls: it attaches the
//! current bearer access token, and when a request comes back 401 it hands
//! control to the refresh coordinator before retrying exactly once. The
//! coordinator is a single-flight mechanism: however many concurrent requests
//! hit a 401 at the same moment, at most one refresh call goes over the wire,
//! and every caller observes the same outcome.
//!
//! The refresh call itself travels on a credential-free transport that shares
//! the cookie jar with the main client (the `refreshToken` / `sessionId`
//! cookies captured at login) but never carries the Authorization header, so
//! a rejected refresh cannot recurse into another refresh.

pub mod coordinator;
pub mod gateway;
pub mod state;
pub mod types;

pub use coordinator::{RefreshCoordinator, RefreshTransport};
pub use gateway::ApiClient;
pub use state::AuthState;
pub use types::{Envelope, GatewayError, RefreshError, SessionData, UserInfo};
