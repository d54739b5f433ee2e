//! Debounced viewport input.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::trace;

use crate::bounds::Bounds;

/// Coalesces bursts of viewport changes: [`ViewportDebouncer::next`] yields
/// the last viewport of a burst once no new one arrived for the quiet period.
pub struct ViewportDebouncer {
    rx: mpsc::UnboundedReceiver<Bounds>,
    quiet: Duration,
}

impl ViewportDebouncer {
    pub fn channel(quiet: Duration) -> (mpsc::UnboundedSender<Bounds>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, ViewportDebouncer { rx, quiet })
    }

    /// Wait for the next settled viewport. `None` once every sender is gone
    /// and nothing is pending.
    pub async fn next(&mut self) -> Option<Bounds> {
        let mut latest = self.rx.recv().await?;
        let mut coalesced = 0usize;

        loop {
            match timeout(self.quiet, self.rx.recv()).await {
                Ok(Some(bounds)) => {
                    latest = bounds;
                    coalesced += 1;
                }
                // Senders dropped mid-burst: deliver what we have
                Ok(None) => break,
                Err(_) => break,
            }
        }

        trace!(coalesced, viewport = %latest, "Viewport settled");
        Some(latest)
    }
}
