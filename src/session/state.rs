use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendError, UserId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Inactive,
    Active,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Inactive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Registration {
    Pending,
    Registered,
    /// Session and points features stay disabled for the rest of the page load.
    Failed { reason: String },
}

impl Default for Registration {
    fn default() -> Self {
        Registration::Pending
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("no user registered yet")]
    NotRegistered,
    #[error("session features disabled: registration failed ({0})")]
    RegistrationFailed(String),
    #[error("name must not be empty")]
    EmptyName,
    #[error("coordinator already torn down")]
    TornDown,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorState {
    pub user_id: Option<UserId>,
    pub registration: Registration,
    pub session: SessionState,
    pub phone_usage: bool,
    /// Last value the backend reported; the server holds the real tally.
    pub points: i64,
    pub greeting: Option<String>,
    pub session_started_at: Option<DateTime<Utc>>,
    pub last_tick_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub torn_down: bool,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session == SessionState::Active
    }

    pub fn registered(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
        self.registration = Registration::Registered;
    }

    pub fn registration_failed(&mut self, reason: impl Into<String>) {
        self.user_id = None;
        self.registration = Registration::Failed {
            reason: reason.into(),
        };
    }

    /// The user id, if session operations are currently allowed.
    pub fn require_user(&self) -> Result<UserId, CoordinatorError> {
        if self.torn_down {
            return Err(CoordinatorError::TornDown);
        }
        match (&self.registration, &self.user_id) {
            (Registration::Failed { reason }, _) => {
                Err(CoordinatorError::RegistrationFailed(reason.clone()))
            }
            (_, Some(user_id)) => Ok(user_id.clone()),
            (_, None) => Err(CoordinatorError::NotRegistered),
        }
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        if !self.is_active() {
            self.session_started_at = Some(now);
        }
        self.session = SessionState::Active;
    }

    pub fn deactivate(&mut self) {
        self.session = SessionState::Inactive;
        self.session_started_at = None;
    }

    pub fn mark_presence(&mut self) {
        self.phone_usage = true;
    }

    /// Reads the phone-usage flag for a tick, clearing it only when `reset` is set.
    pub fn take_phone_usage(&mut self, reset: bool) -> bool {
        let used = self.phone_usage;
        if reset {
            self.phone_usage = false;
        }
        used
    }

    pub fn record_points(&mut self, points: i64, now: DateTime<Utc>) {
        self.points = points;
        self.last_tick_at = Some(now);
    }

    /// Returns true only for the first call.
    pub fn begin_teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        self.deactivate();
        true
    }
}
