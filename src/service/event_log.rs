//! Audit trail of investment mutations.
//!
//! [`EventSink`] is the sending half of a bounded queue drained by a single
//! background task into [`InvestmentRepository::append_event`]. A full
//! queue makes [`EventSink::record`] wait instead of dropping the event.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::InvestmentEvent;
use crate::store::InvestmentRepository;

/// Handle the service uses to hand events to the event log.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Option<mpsc::Sender<InvestmentEvent>>,
}

impl EventSink {
    /// Creates a sink and the receiver it feeds. `capacity` is clamped to
    /// at least one slot.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<InvestmentEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Sink that only traces events. Used when the event log is off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { sender: None }
    }

    /// Queues `event` for the audit log, waiting for a free slot when the
    /// queue is full.
    pub async fn record(&self, event: InvestmentEvent) {
        let Some(sender) = &self.sender else {
            tracing::debug!(
                investment_id = %event.investment_id(),
                event_type = event.event_type_str(),
                "event log disabled, event not persisted"
            );
            return;
        };
        if let Err(mpsc::error::SendError(event)) = sender.send(event).await {
            tracing::error!(
                investment_id = %event.investment_id(),
                event_type = event.event_type_str(),
                "event log stopped, event not persisted"
            );
        }
    }

    /// Events queued but not yet appended.
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.sender
            .as_ref()
            .map_or(0, |s| s.max_capacity().saturating_sub(s.capacity()))
    }
}

/// Starts the event log task and returns the sink feeding it.
///
/// The task appends events in order and stops once every [`EventSink`]
/// clone is dropped and the queue is drained. Append failures are logged
/// and the task keeps running.
pub fn spawn_event_log(
    capacity: usize,
    repo: Arc<dyn InvestmentRepository>,
) -> (EventSink, JoinHandle<()>) {
    let (sink, mut rx) = EventSink::channel(capacity);
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            tracing::info!(
                investment_id = %event.investment_id(),
                event_type = event.event_type_str(),
                actor = %event.actor(),
                "investment event"
            );
            if let Err(e) = repo.append_event(&event).await {
                tracing::error!(error = %e, "failed to append investment event");
            }
        }
        tracing::debug!("event log task stopped");
    });
    (sink, handle)
}
