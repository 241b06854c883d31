//! Applying a reaction queue to a message.

use std::time::Duration;

use {async_trait::async_trait, serde::Serialize, tracing::{debug, warn}};

use crate::{ReactionQueue, ReactionSpec, Result};

/// Pause between two reactions unless configured otherwise.
pub const DEFAULT_REACTION_DELAY: Duration = Duration::from_millis(250);

/// Adds reactions to one particular message.
#[async_trait]
pub trait ReactionSink: Send + Sync {
    async fn react(&self, reaction: &ReactionSpec) -> Result<()>;
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub applied: usize,
    pub failed: usize,
}

/// Applies reactions in queue order, pausing between them to stay clear of
/// the platform's reaction rate limit.
#[derive(Debug, Clone, Copy)]
pub struct ReactionDispatcher {
    delay: Duration,
}

impl Default for ReactionDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_REACTION_DELAY)
    }
}

impl ReactionDispatcher {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// A failed reaction is logged and skipped; nothing is retried.
    pub async fn dispatch(&self, queue: &ReactionQueue, sink: &dyn ReactionSink) -> DispatchReport {
        let mut report = DispatchReport::default();
        for (index, reaction) in queue.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match sink.react(reaction).await {
                Ok(()) => {
                    report.applied += 1;
                    debug!(%reaction, "reaction added");
                },
                Err(e) => {
                    report.failed += 1;
                    warn!(%reaction, error = %e, "failed to add reaction");
                },
            }
        }
        report
    }
}
