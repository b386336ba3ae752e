use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::session::SessionPointsCoordinator;

use super::loop_worker::{presence_loop, PresenceExit};
use super::PresenceSource;

/// Registration of the coordinator's presence handlers with a source.
/// Every `register` is paired with exactly one `unregister` or `join`.
pub struct PresenceListener {
    handle: Option<JoinHandle<PresenceExit>>,
    cancel_token: Option<CancellationToken>,
}

impl PresenceListener {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.handle.is_some()
    }

    pub fn register(
        &mut self,
        source: &mut dyn PresenceSource,
        coordinator: SessionPointsCoordinator,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("presence listener already registered");
        }

        let Some(events) = source.subscribe() else {
            bail!("presence source already has a listener");
        };

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(presence_loop(coordinator, events, cancel_token.clone()));

        info!("Presence listener registered");
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Removes the handlers. Returns how the loop ended, or `None` when
    /// nothing was registered.
    pub async fn unregister(&mut self) -> Result<Option<PresenceExit>> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.join().await
    }

    /// Waits for the loop to end on its own (teardown or closed source).
    pub async fn join(&mut self) -> Result<Option<PresenceExit>> {
        let Some(handle) = self.handle.take() else {
            return Ok(None);
        };
        self.cancel_token = None;

        let exit = handle
            .await
            .context("presence listener task failed to join")?;
        Ok(Some(exit))
    }
}

impl Default for PresenceListener {
    fn default() -> Self {
        Self::new()
    }
}
