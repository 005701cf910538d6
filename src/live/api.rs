// Event-driven live view API
//
// Wraps the synchronous orchestrator core in a tokio task: an mpsc inbox for
// view events, a deadline-aware loop driving the hysteresis and unlock
// timers, a watch channel publishing presentation snapshots, and an async
// handler for outward host notices.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::error::{LiveResult, LiveViewError};
use super::orchestrator::LiveViewOrchestrator;
use super::types::{HostNotice, Presentation, ViewEvent};

/// Identifier for one spawned live view, used in logs
pub type ViewId = Uuid;

/// Loop wake-up cadence when no timer is outstanding
const IDLE_TICK: Duration = Duration::from_secs(60);

/// Receiver for notifications the orchestrator surfaces to the host
///
/// Implement this to observe playback errors and completed fallbacks; the
/// orchestrator never retries on its own.
#[async_trait]
pub trait HostNoticeHandler: Send + Sync {
    /// Handle one outward notice
    async fn on_notice(&self, notice: HostNotice);
}

/// Handle to a running live view
///
/// Dropping the handle aborts the event loop and with it every outstanding
/// timer.
pub struct LiveView {
    id: ViewId,
    events: mpsc::UnboundedSender<ViewEvent>,
    presentation: watch::Receiver<Presentation>,
    task: JoinHandle<()>,
}

impl LiveView {
    /// Spawn the event loop for an orchestrator
    pub fn spawn(orchestrator: LiveViewOrchestrator, handler: Arc<dyn HostNoticeHandler>) -> Self {
        let id = Uuid::new_v4();
        let (events, inbox) = mpsc::unbounded_channel();
        let (publisher, presentation) = watch::channel(orchestrator.presentation());
        let task = tokio::spawn(run_view(id, orchestrator, inbox, publisher, handler));

        Self {
            id,
            events,
            presentation,
            task,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Push an event into the view's inbox
    pub fn send(&self, event: ViewEvent) -> LiveResult<()> {
        self.events
            .send(event)
            .map_err(|_| LiveViewError::view_closed("view event loop has stopped"))
    }

    /// Latest published presentation snapshot
    pub fn presentation(&self) -> Presentation {
        self.presentation.borrow().clone()
    }

    /// Subscribe to presentation snapshot changes
    pub fn watch(&self) -> watch::Receiver<Presentation> {
        self.presentation.clone()
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_view(
    id: ViewId,
    mut orchestrator: LiveViewOrchestrator,
    mut inbox: mpsc::UnboundedReceiver<ViewEvent>,
    publisher: watch::Sender<Presentation>,
    handler: Arc<dyn HostNoticeHandler>,
) {
    log::debug!("live view {} started for {}", id, orchestrator.camera());

    loop {
        let wait = orchestrator
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_TICK);

        tokio::select! {
            received = inbox.recv() => match received {
                Some(event) => orchestrator.handle_event(event, Instant::now()),
                None => break,
            },
            _ = tokio::time::sleep(wait) => {}
        }

        orchestrator.poll(Instant::now());

        for notice in orchestrator.take_notices() {
            handler.on_notice(notice).await;
        }

        let snapshot = orchestrator.presentation();
        if *publisher.borrow() != snapshot {
            // Send only fails when every receiver is gone; the view keeps
            // running on events alone in that case.
            let _ = publisher.send(snapshot);
        }
    }

    log::debug!("live view {} stopped", id);
}
