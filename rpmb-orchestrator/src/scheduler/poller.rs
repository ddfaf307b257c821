//! Build poller
//!
//! Re-reads one build at a fixed interval and reports every observation to
//! the caller until the build reaches a terminal phase or the caller cancels.
//! Cancelling only stops the polling; the build itself keeps running.

use rpmb_core::domain::{BuildId, BuildJob};
use std::sync::Arc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::service::BuildService;

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The build reached `Succeeded` or `Failed`
    Finished(BuildJob),
    /// The caller stopped watching
    Cancelled,
}

/// Polls build status until completion
pub struct BuildPoller {
    service: Arc<BuildService>,
    interval: Duration,
}

impl BuildPoller {
    pub fn new(service: Arc<BuildService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    pub fn from_config(service: Arc<BuildService>, config: &Config) -> Self {
        Self::new(service, config.poll_interval)
    }

    /// Polls `build_id` until it finishes or `cancel` fires
    ///
    /// A failed status read is logged and retried on the next tick; it never
    /// ends the loop, so a dropped request cannot be mistaken for a failed
    /// build. Only namespace resolution can fail the call.
    pub async fn run<F>(
        &self,
        build_id: &BuildId,
        namespace: Option<&str>,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<PollOutcome>
    where
        F: FnMut(&BuildJob),
    {
        let namespace = self.service.resolve_namespace(namespace)?;

        info!(
            build_id = %build_id,
            namespace = %namespace,
            "Watching build (interval: {:?})",
            self.interval
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            debug!(build_id = %build_id, "Polling build status");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.service.status(build_id, Some(&namespace)) => result,
            };

            match result {
                Ok(job) => {
                    on_update(&job);

                    if job.is_terminal() {
                        info!(build_id = %build_id, "Build finished: {}", job.phase());
                        return Ok(PollOutcome::Finished(job));
                    }
                }
                Err(e) => {
                    warn!(build_id = %build_id, "Failed to poll build status: {}", e);
                }
            }
        }

        info!(build_id = %build_id, "Stopped watching build");
        Ok(PollOutcome::Cancelled)
    }
}
