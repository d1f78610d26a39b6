//! Background persistence: a channel-backed sink drained by a tokio task

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use nodes_core::{CoreError, GraphMutation, GraphRepository, MutationSink};

/// Mutation sink that forwards into a [`PersistenceWorker`].
///
/// `persist` never blocks; if the worker is gone the mutation is dropped
/// with a warning.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<GraphMutation>,
}

impl MutationSink for ChannelSink {
    fn persist(&self, mutation: GraphMutation) {
        if let Err(e) = self.tx.send(mutation) {
            warn!(
                event = e.0.event_type(),
                "Persistence worker stopped, dropping mutation"
            );
        }
    }
}

/// Totals reported when a worker drains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    /// Mutations the repository accepted
    pub applied: usize,
    /// Mutations the repository rejected
    pub failed: usize,
}

/// Task applying sink mutations to a repository in arrival order
pub struct PersistenceWorker {
    handle: JoinHandle<PersistenceStats>,
}

impl PersistenceWorker {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// Returns the worker and the first sink; clone the sink for more
    /// producers. The worker runs until every sink is dropped.
    pub fn spawn(repository: Arc<dyn GraphRepository>) -> (Self, ChannelSink) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::run(repository, rx));
        (Self { handle }, ChannelSink { tx })
    }

    async fn run(
        repository: Arc<dyn GraphRepository>,
        mut rx: UnboundedReceiver<GraphMutation>,
    ) -> PersistenceStats {
        let mut stats = PersistenceStats::default();

        while let Some(mutation) = rx.recv().await {
            let result = match &mutation {
                GraphMutation::Cleared => repository.clear_all().await,
                other => repository.apply(other).await,
            };

            match result {
                Ok(()) => {
                    stats.applied += 1;
                    debug!(event = mutation.event_type(), "Persisted mutation");
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(
                        event = mutation.event_type(),
                        error = %e,
                        "Failed to persist mutation"
                    );
                }
            }
        }

        debug!(
            applied = stats.applied,
            failed = stats.failed,
            "Persistence worker drained"
        );
        stats
    }

    /// Wait for the worker to finish.
    ///
    /// Completes once every [`ChannelSink`] has been dropped and the queue
    /// is empty.
    pub async fn shutdown(self) -> Result<PersistenceStats, CoreError> {
        self.handle
            .await
            .map_err(|e| CoreError::StateStoreError(format!("Persistence worker failed: {}", e)))
    }
}
