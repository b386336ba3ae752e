use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use super::{BackendError, BackendResult, BackendService, UserId};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NameArgs<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionArgs<'a> {
    user_id: &'a UserId,
    duration_minutes: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserArgs<'a> {
    user_id: &'a UserId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdjustPointsArgs<'a> {
    user_id: &'a UserId,
    is_using_phone: bool,
}

/// JSON-over-HTTP client: every call is `POST {base_url}/{method}`.
///
/// No request timeout is configured; a hung call only delays the caller.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<A, R>(&self, method: &'static str, args: &A) -> BackendResult<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(args)
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                method,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|err| BackendError::Decode {
            method,
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl BackendService for HttpBackend {
    async fn register_user(&self, name: &str) -> BackendResult<UserId> {
        self.call("registerUser", &NameArgs { name }).await
    }

    async fn start_session(&self, user_id: &UserId, duration_minutes: u32) -> BackendResult<bool> {
        self.call(
            "startSession",
            &StartSessionArgs {
                user_id,
                duration_minutes,
            },
        )
        .await
    }

    async fn end_session(&self, user_id: &UserId) -> BackendResult<bool> {
        self.call("endSession", &UserArgs { user_id }).await
    }

    async fn adjust_points(&self, user_id: &UserId, is_using_phone: bool) -> BackendResult<i64> {
        self.call(
            "adjustPoints",
            &AdjustPointsArgs {
                user_id,
                is_using_phone,
            },
        )
        .await
    }

    async fn greet(&self, name: &str) -> BackendResult<String> {
        self.call("greet", &NameArgs { name }).await
    }
}
