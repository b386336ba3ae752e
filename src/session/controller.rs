use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    backend::{BackendResult, BackendService, UserId},
    settings::{ClientSettings, MAX_TICK_INTERVAL, MIN_TICK_INTERVAL},
};

use super::{CoordinatorError, CoordinatorState, Registration};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "focuspeer::session";

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorSnapshot {
    pub state: CoordinatorState,
    pub ticker_armed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub session_duration_minutes: u32,
    pub tick_interval: Duration,
    pub reset_phone_usage_each_tick: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from(&ClientSettings::default())
    }
}

impl From<&ClientSettings> for CoordinatorConfig {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            session_duration_minutes: settings.session_duration_minutes,
            tick_interval: settings.tick_interval(),
            reset_phone_usage_each_tick: settings.reset_phone_usage_each_tick,
        }
    }
}

/// Owns the session flag, the phone-usage flag and the user id, and drives
/// the periodic `adjustPoints` ticker while a session is active.
///
/// Start is pessimistic (Active only on a true backend answer); end is
/// optimistic (Inactive whatever the backend says).
#[derive(Clone)]
pub struct SessionPointsCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    backend: Arc<dyn BackendService>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    config: CoordinatorConfig,
    updates: Arc<watch::Sender<CoordinatorSnapshot>>,
}

impl SessionPointsCoordinator {
    pub fn new(backend: Arc<dyn BackendService>, config: CoordinatorConfig) -> Self {
        let (updates, _) = watch::channel(CoordinatorSnapshot {
            state: CoordinatorState::new(),
            ticker_armed: false,
        });

        Self {
            state: Arc::new(Mutex::new(CoordinatorState::new())),
            backend,
            ticker: Arc::new(Mutex::new(None)),
            config,
            updates: Arc::new(updates),
        }
    }

    pub fn config(&self) -> CoordinatorConfig {
        self.config
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorSnapshot> {
        self.updates.subscribe()
    }

    pub async fn get_state(&self) -> CoordinatorState {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> CoordinatorSnapshot {
        let state = self.state.lock().await.clone();
        CoordinatorSnapshot {
            state,
            ticker_armed: self.ticker_armed().await,
        }
    }

    /// Registers `name` with the backend. Runs at most once per coordinator:
    /// a later call returns the stored id, or the stored failure.
    pub async fn initialize(&self, name: &str) -> Result<UserId, CoordinatorError> {
        {
            let state = self.state.lock().await;
            match (&state.registration, &state.user_id) {
                (Registration::Registered, Some(user_id)) => return Ok(user_id.clone()),
                (Registration::Failed { reason }, _) => {
                    return Err(CoordinatorError::RegistrationFailed(reason.clone()))
                }
                _ => {}
            }
        }

        let result = self.backend.register_user(name).await;

        let outcome = {
            let mut state = self.state.lock().await;
            match result {
                Ok(user_id) => {
                    log_info!("Registered user {}", user_id);
                    state.registered(user_id.clone());
                    Ok(user_id)
                }
                Err(err) => {
                    log_error!("User registration failed: {}", err);
                    let reason = err.to_string();
                    state.registration_failed(reason.clone());
                    Err(CoordinatorError::RegistrationFailed(reason))
                }
            }
        };

        self.publish().await;
        outcome
    }

    /// Asks the backend to start a session. Returns whether the session is
    /// now active; backend failures are logged and leave the state untouched.
    pub async fn start_session(&self) -> Result<bool, CoordinatorError> {
        let user_id = self.state.lock().await.require_user()?;

        let result = self
            .backend
            .start_session(&user_id, self.config.session_duration_minutes)
            .await;

        let started = match result {
            Ok(started) => {
                log_info!("Session started: {}", started);
                started
            }
            Err(err) => {
                log_error!("Failed to start session for {}: {}", user_id, err);
                return Ok(self.state.lock().await.is_active());
            }
        };

        let needs_ticker = {
            let mut state = self.state.lock().await;
            if state.torn_down {
                return Err(CoordinatorError::TornDown);
            }
            if started {
                let was_active = state.is_active();
                state.activate(Utc::now());
                !was_active
            } else {
                state.deactivate();
                false
            }
        };

        if started {
            if needs_ticker || !self.ticker_armed().await {
                self.spawn_ticker().await;
            }
        } else {
            self.cancel_ticker().await;
        }

        self.publish().await;
        Ok(started)
    }

    /// Ends the session locally no matter what the backend answers. Returns
    /// the backend's answer when one arrived.
    pub async fn end_session(&self) -> Option<bool> {
        let user_id = self.state.lock().await.require_user().ok();

        let answer = match user_id {
            Some(user_id) => match self.backend.end_session(&user_id).await {
                Ok(ended) => {
                    log_info!("Session ended: {}", ended);
                    Some(ended)
                }
                Err(err) => {
                    log_warn!("Backend failed to end session for {}: {}", user_id, err);
                    None
                }
            },
            None => None,
        };

        self.state.lock().await.deactivate();
        self.cancel_ticker().await;
        self.publish().await;
        answer
    }

    /// Pointer movement: marks the session as phone-using. No debounce.
    pub async fn on_presence_detected(&self) {
        let changed = {
            let mut state = self.state.lock().await;
            let changed = !state.phone_usage;
            state.mark_presence();
            changed
        };

        if changed {
            self.publish().await;
        }
    }

    /// Page unload: disarms the ticker and fires one `adjustPoints(user, false)`.
    /// The flush runs detached; the returned handle may be awaited or dropped.
    /// Only the first call flushes.
    ///
    /// Exception: with no registered user (registration pending or failed)
    /// there is no id to flush for, so no call is made and `None` is returned.
    pub async fn on_page_teardown(&self) -> Option<JoinHandle<BackendResult<i64>>> {
        let user_id = {
            let mut state = self.state.lock().await;
            if !state.begin_teardown() {
                return None;
            }
            state.user_id.clone()
        };

        self.cancel_ticker().await;
        self.publish().await;

        let Some(user_id) = user_id else {
            log_warn!("Teardown before registration completed; no final flush");
            return None;
        };

        let backend = self.backend.clone();
        Some(tokio::spawn(async move {
            let result = backend.adjust_points(&user_id, false).await;
            match &result {
                Ok(points) => log_info!("Final flush for {}: {} points", user_id, points),
                Err(err) => log_warn!("Final flush for {} failed: {}", user_id, err),
            }
            result
        }))
    }

    /// Greeting form submit. Independent of sessions and registration.
    pub async fn submit_greeting(&self, name: &str) -> Result<String, CoordinatorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoordinatorError::EmptyName);
        }

        let message = self.backend.greet(name).await?;
        self.state.lock().await.greeting = Some(message.clone());
        self.publish().await;
        Ok(message)
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let backend = self.backend.clone();
        let updates = self.updates.clone();
        let period = self
            .config
            .tick_interval
            .clamp(MIN_TICK_INTERVAL, MAX_TICK_INTERVAL);
        let reset = self.config.reset_phone_usage_each_tick;

        let handle = tokio::spawn(async move {
            // First tick lands one full period after activation.
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let (user_id, using_phone) = {
                    let mut guard = state.lock().await;
                    if !guard.is_active() {
                        break;
                    }
                    let Some(user_id) = guard.user_id.clone() else {
                        break;
                    };
                    (user_id, guard.take_phone_usage(reset))
                };

                match backend.adjust_points(&user_id, using_phone).await {
                    Ok(points) => {
                        log_info!("Points adjusted: {}", points);
                        let snapshot = {
                            let mut guard = state.lock().await;
                            guard.record_points(points, Utc::now());
                            guard.clone()
                        };
                        updates.send_replace(CoordinatorSnapshot {
                            state: snapshot,
                            ticker_armed: true,
                        });
                    }
                    Err(err) => {
                        log_warn!("Point adjustment failed for {}: {}", user_id, err);
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn ticker_armed(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn publish(&self) {
        let snapshot = self.get_snapshot().await;
        self.updates.send_replace(snapshot);
    }
}
