use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::codec::HeaderSchema;
use crate::error::{Error, Result};
use crate::events::{Event, EventSender};
use crate::info::InfoDb;
use crate::state::World;

/// Cooperative cancellation flag shared between a caller and a running load.
/// The decoder polls it at tile-column boundaries and between sections, so
/// cancellation is prompt but never mid-record.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What to load: a world file and, optionally, the player file whose
/// companion seen-map should be merged in.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub world: PathBuf,
    pub player: Option<PathBuf>,
}

impl LoadRequest {
    pub fn new(world: impl Into<PathBuf>) -> Self {
        Self {
            world: world.into(),
            player: None,
        }
    }

    pub fn with_player(mut self, player: impl Into<PathBuf>) -> Self {
        self.player = Some(player.into());
        self
    }
}

/// A load running on a blocking worker. Events stream out as the decode
/// progresses; the worker sends exactly one terminal event (`Loaded` or
/// `Error`) before finishing.
pub struct LoadTask {
    events: mpsc::UnboundedReceiver<Event>,
    cancel: CancelToken,
    handle: JoinHandle<Result<World>>,
}

impl LoadTask {
    /// Next event, or `None` once the worker is done and the stream drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Waits for the worker and returns the decoded world.
    pub async fn join(self) -> Result<World> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(Error::Io(err.to_string())),
        }
    }
}

/// Runs the whole decode on `spawn_blocking`, reporting progress over an
/// unbounded channel so the decoder never blocks on a slow consumer.
pub fn spawn_load(request: LoadRequest, db: Arc<InfoDb>, schema: Arc<HeaderSchema>) -> LoadTask {
    let (tx, rx) = mpsc::unbounded_channel();
    let events = EventSender::new(tx);
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();

    let handle = tokio::task::spawn_blocking(move || {
        let result = World::load_with(
            &request.world,
            request.player.as_deref(),
            &db,
            &schema,
            &events,
            &worker_cancel,
        );
        match &result {
            Ok(_) => events.send(Event::Loaded),
            Err(err) => events.send(Event::Error(err.clone())),
        }
        result
    });

    LoadTask {
        events: rx,
        cancel,
        handle,
    }
}
