use tokio::sync::mpsc;

use crate::error::Error;

/// Progress and terminal notifications from a running load.
///
/// `Status` messages are advisory and may be dropped; exactly one of `Loaded`
/// or `Error` closes every load.
#[derive(Debug, Clone)]
pub enum Event {
    Status(String),
    Loaded,
    Error(Error),
}

/// Non-blocking event source handed through the decoder. A disabled sender
/// (no channel) makes synchronous loads free of event plumbing; a closed
/// receiver is ignored rather than treated as an error.
#[derive(Clone, Default)]
pub struct EventSender {
    tx: Option<mpsc::UnboundedSender<Event>>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: Event) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(Event::Status(message.into()));
    }
}
