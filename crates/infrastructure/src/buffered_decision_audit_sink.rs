use std::sync::Arc;

use campus_application::{DecisionAuditSink, DecisionEvent, DecisionLogRepository};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Default number of decision events buffered before new events are dropped.
pub const DEFAULT_AUDIT_BUFFER_CAPACITY: usize = 1024;

/// Decision sink that hands events to a background writer.
///
/// Recording never blocks; when the buffer is full the event is dropped.
#[derive(Clone)]
pub struct BufferedDecisionAuditSink {
    sender: mpsc::Sender<DecisionEvent>,
}

impl BufferedDecisionAuditSink {
    /// Spawns the writer task and returns the sink feeding it.
    ///
    /// The task ends once every sink clone is dropped and the buffer drains.
    #[must_use]
    pub fn spawn(
        repository: Arc<dyn DecisionLogRepository>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<DecisionEvent>(capacity.max(1));

        let writer = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if let Err(error) = repository.append_decision(event).await {
                    error!(%error, "failed to persist access decision event");
                }
            }
        });

        (Self { sender }, writer)
    }
}

impl DecisionAuditSink for BufferedDecisionAuditSink {
    fn record(&self, event: DecisionEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => warn!(
                path = %event.path,
                outcome = event.outcome.as_str(),
                "decision audit buffer full, dropping event"
            ),
            Err(TrySendError::Closed(event)) => warn!(
                path = %event.path,
                "decision audit writer stopped, dropping event"
            ),
        }
    }
}
