//! Browser-style presence signals: pointer movement and page teardown.
//!
//! A [`PresenceSource`] hands its event stream to a [`PresenceListener`],
//! which routes each event to the coordinator until it is unregistered or a
//! teardown arrives.

pub mod controller;
pub mod loop_worker;

use tokio::sync::mpsc;

pub use controller::PresenceListener;
pub use loop_worker::PresenceExit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    PointerMoved,
    Teardown,
}

pub trait PresenceSource: Send {
    /// Hands out the event stream. Yields `None` once the stream is taken.
    fn subscribe(&mut self) -> Option<mpsc::UnboundedReceiver<PresenceEvent>>;
}

/// In-process source fed through cloneable [`PresenceHandle`]s.
pub struct ChannelPresenceSource {
    tx: mpsc::UnboundedSender<PresenceEvent>,
    rx: Option<mpsc::UnboundedReceiver<PresenceEvent>>,
}

impl ChannelPresenceSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx: Some(rx) }
    }

    pub fn handle(&self) -> PresenceHandle {
        PresenceHandle {
            tx: self.tx.clone(),
        }
    }
}

impl Default for ChannelPresenceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceSource for ChannelPresenceSource {
    fn subscribe(&mut self) -> Option<mpsc::UnboundedReceiver<PresenceEvent>> {
        self.rx.take()
    }
}

#[derive(Debug, Clone)]
pub struct PresenceHandle {
    tx: mpsc::UnboundedSender<PresenceEvent>,
}

impl PresenceHandle {
    /// Returns false once the listener side is gone.
    pub fn pointer_moved(&self) -> bool {
        self.tx.send(PresenceEvent::PointerMoved).is_ok()
    }

    /// Never blocks, so it is safe from unload paths.
    pub fn teardown(&self) -> bool {
        self.tx.send(PresenceEvent::Teardown).is_ok()
    }
}
