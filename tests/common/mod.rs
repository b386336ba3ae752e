//! Common Test Utilities
//!
//! Scripted backend that records every call it receives.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use focuspeer_lib::{
    backend::{BackendError, BackendResult, BackendService, UserId},
    session::{CoordinatorConfig, SessionPointsCoordinator},
};
use tokio::time::Instant;

pub const TICK: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RegisterUser(String),
    StartSession(String, u32),
    EndSession(String),
    AdjustPoints(String, bool),
    Greet(String),
}

pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    register: Mutex<BackendResult<UserId>>,
    start: Mutex<BackendResult<bool>>,
    end: Mutex<BackendResult<bool>>,
    points: Mutex<VecDeque<BackendResult<i64>>>,
    delays: Mutex<VecDeque<Duration>>,
    spans: Mutex<Vec<(Instant, Instant)>>,
    default_points: i64,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_registration() -> Arc<Self> {
        let backend = Self::default();
        *backend.register.lock().unwrap() =
            Err(BackendError::Transport("connection refused".into()));
        Arc::new(backend)
    }

    pub fn set_start(&self, result: BackendResult<bool>) {
        *self.start.lock().unwrap() = result;
    }

    pub fn set_end(&self, result: BackendResult<bool>) {
        *self.end.lock().unwrap() = result;
    }

    /// Queues the answer for the next `adjustPoints`; an empty queue answers
    /// with the default points.
    pub fn push_points(&self, result: BackendResult<i64>) {
        self.points.lock().unwrap().push_back(result);
    }

    /// Makes the next `adjustPoints` answer only after `delay`.
    pub fn push_delay(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    /// When each `adjustPoints` call was received and answered.
    pub fn adjust_spans(&self) -> Vec<(Instant, Instant)> {
        self.spans.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// The `isUsingPhone` argument of every `adjustPoints` call, in order.
    pub fn adjust_calls(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AdjustPoints(_, using_phone) => Some(using_phone),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            register: Mutex::new(Ok(UserId::new("u1"))),
            start: Mutex::new(Ok(true)),
            end: Mutex::new(Ok(true)),
            points: Mutex::new(VecDeque::new()),
            delays: Mutex::new(VecDeque::new()),
            spans: Mutex::new(Vec::new()),
            default_points: 10,
        }
    }
}

#[async_trait]
impl BackendService for RecordingBackend {
    async fn register_user(&self, name: &str) -> BackendResult<UserId> {
        self.record(Call::RegisterUser(name.to_string()));
        self.register.lock().unwrap().clone()
    }

    async fn start_session(&self, user_id: &UserId, duration_minutes: u32) -> BackendResult<bool> {
        self.record(Call::StartSession(user_id.to_string(), duration_minutes));
        self.start.lock().unwrap().clone()
    }

    async fn end_session(&self, user_id: &UserId) -> BackendResult<bool> {
        self.record(Call::EndSession(user_id.to_string()));
        self.end.lock().unwrap().clone()
    }

    async fn adjust_points(&self, user_id: &UserId, is_using_phone: bool) -> BackendResult<i64> {
        self.record(Call::AdjustPoints(user_id.to_string(), is_using_phone));
        let received = Instant::now();
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.spans.lock().unwrap().push((received, Instant::now()));

        self.points
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.default_points))
    }

    async fn greet(&self, name: &str) -> BackendResult<String> {
        self.record(Call::Greet(name.to_string()));
        Ok(format!("Hello, {name}!"))
    }
}

pub fn config() -> CoordinatorConfig {
    CoordinatorConfig {
        session_duration_minutes: 1,
        tick_interval: TICK,
        reset_phone_usage_each_tick: false,
    }
}

pub fn coordinator(backend: &Arc<RecordingBackend>) -> SessionPointsCoordinator {
    SessionPointsCoordinator::new(backend.clone(), config())
}

/// Coordinator with `u1` already registered.
pub async fn registered(backend: &Arc<RecordingBackend>) -> SessionPointsCoordinator {
    let coordinator = coordinator(backend);
    coordinator.initialize("User").await.unwrap();
    coordinator
}

/// Sleeps past the next `n` ticks (paused clock).
pub async fn ticks(n: u32) {
    tokio::time::sleep(TICK * n + Duration::from_millis(100)).await;
}
