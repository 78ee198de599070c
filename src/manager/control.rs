//! Cancellation.

use super::DownloadManager;
use crate::error::Result;
use crate::types::Status;

impl DownloadManager {
    /// Cancel a download
    ///
    /// A queued task is removed from the queue. A running task has its
    /// cancellation token fired, and this call waits until the worker has
    /// stopped, so no further events for `url` arrive after it returns. The
    /// task ends up `Cancelled` either way and its slot goes to the next
    /// queued task.
    ///
    /// Cancelling a task whose worker is still winding down from an earlier
    /// cancel waits for that worker as well. Cancelling a task that already
    /// finished, or a URL that was never added, is a no-op.
    pub async fn cancel(&self, url: &str) -> Result<()> {
        let exited = {
            let mut state = self.state.lock().await;

            let Some(status) = state.tasks.get(url).map(|task| task.status) else {
                tracing::debug!(url, "Cancel ignored, no such download");
                return Ok(());
            };

            if status.is_terminal() {
                let winding_down = state.workers.get(url).map(|slot| slot.exited.clone());
                if winding_down.is_none() {
                    tracing::debug!(url, status = %status, "Cancel ignored, download already finished");
                }
                winding_down
            } else {
                let exited = state.workers.get(url).map(|slot| {
                    slot.cancel.cancel();
                    slot.exited.clone()
                });
                state.pending.retain(|queued| queued != url);

                self.transition(&mut state, url, Status::Cancelled);
                tracing::info!(url, was = %status, "Download cancelled");
                exited
            }
        };

        if let Some(exited) = exited {
            exited.cancelled().await;

            // The worker frees its own slot unless it died before recording an outcome
            let mut state = self.state.lock().await;
            if state
                .workers
                .get(url)
                .is_some_and(|slot| slot.exited.is_cancelled())
            {
                tracing::warn!(url, "Worker exited without releasing its slot");
                state.workers.remove(url);
                self.process_queue(&mut state);
            }
        }

        Ok(())
    }
}
