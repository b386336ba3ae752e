use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{backend::BackendResult, session::SessionPointsCoordinator};

use super::PresenceEvent;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "focuspeer::presence";

use crate::{log_info, log_warn};

/// Why the listener loop stopped.
#[derive(Debug)]
pub enum PresenceExit {
    /// Teardown was delivered; carries the final flush when one was issued.
    Teardown(Option<JoinHandle<BackendResult<i64>>>),
    Unregistered,
    SourceClosed,
}

pub async fn presence_loop(
    coordinator: SessionPointsCoordinator,
    mut events: mpsc::UnboundedReceiver<PresenceEvent>,
    cancel_token: CancellationToken,
) -> PresenceExit {
    loop {
        tokio::select! {
            // Unregistration wins over queued events.
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("presence listener unregistered");
                return PresenceExit::Unregistered;
            }
            event = events.recv() => match event {
                Some(PresenceEvent::PointerMoved) => coordinator.on_presence_detected().await,
                Some(PresenceEvent::Teardown) => {
                    log_info!("teardown received; flushing points");
                    let flush = coordinator.on_page_teardown().await;
                    return PresenceExit::Teardown(flush);
                }
                None => {
                    log_warn!("presence source closed without teardown");
                    return PresenceExit::SourceClosed;
                }
            },
        }
    }
}
