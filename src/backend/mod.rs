pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpBackend;

/// Opaque identifier handed out by `registerUser`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend {method} returned HTTP {status}")]
    Status { method: &'static str, status: u16 },
    #[error("backend {method} sent an unexpected body: {reason}")]
    Decode { method: &'static str, reason: String },
    #[error("backend rejected the call: {0}")]
    Rejected(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Remote service that owns users, sessions and the authoritative points tally.
#[async_trait]
pub trait BackendService: Send + Sync {
    async fn register_user(&self, name: &str) -> BackendResult<UserId>;

    async fn start_session(&self, user_id: &UserId, duration_minutes: u32) -> BackendResult<bool>;

    async fn end_session(&self, user_id: &UserId) -> BackendResult<bool>;

    /// Returns the user's points after the adjustment.
    async fn adjust_points(&self, user_id: &UserId, is_using_phone: bool) -> BackendResult<i64>;

    async fn greet(&self, name: &str) -> BackendResult<String>;
}
