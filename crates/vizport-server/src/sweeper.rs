use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vizport_core::store::ArtifactStore;

/// Periodically drop artifacts older than `ttl` until `shutdown` fires.
///
/// Reads already treat expired records as missing; this only reclaims the
/// memory.
pub fn spawn_sweeper(
    store: Arc<dyn ArtifactStore>,
    ttl: Duration,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match store.sweep(ttl).await {
                Ok(0) => {}
                Ok(swept) => tracing::debug!(swept, "expired artifacts removed"),
                Err(err) => tracing::warn!(error = %err, "artifact sweep failed"),
            }
        }

        tracing::debug!("sweeper stopped");
    })
}
