//! Shutdown coordination.

use super::DownloadManager;
use crate::error::Result;
use crate::types::{Event, Status};
use futures::future::join_all;

impl DownloadManager {
    /// Gracefully shut down the manager
    ///
    /// 1. Stops accepting new downloads
    /// 2. Cancels every queued task
    /// 3. Cancels every running task and waits until every worker has
    ///    stopped, including ones already being cancelled by [`cancel`](Self::cancel)
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Finished tasks keep their status. Queries keep working afterwards;
    /// [`add`](Self::add) returns [`Error::ShuttingDown`](crate::Error::ShuttingDown).
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        {
            let mut state = self.state.lock().await;
            state.accepting_new = false;

            let queued: Vec<String> = state.pending.drain(..).collect();
            for url in &queued {
                self.transition(&mut state, url, Status::Cancelled);
            }

            // Workers whose token already fired were cancelled (and announced) earlier
            let running: Vec<String> = state
                .order
                .iter()
                .filter(|url| {
                    state
                        .workers
                        .get(*url)
                        .is_some_and(|slot| !slot.cancel.is_cancelled())
                })
                .cloned()
                .collect();

            for url in &running {
                if let Some(slot) = state.workers.get(url) {
                    slot.cancel.cancel();
                }
                self.transition(&mut state, url, Status::Cancelled);
            }

            tracing::info!(
                queued = queued.len(),
                running = running.len(),
                stopping = state.workers.len(),
                "Cancelled outstanding downloads"
            );
        }

        loop {
            let exits: Vec<_> = {
                let mut state = self.state.lock().await;
                state.workers.retain(|url, slot| {
                    let gone = slot.exited.is_cancelled();
                    if gone {
                        tracing::warn!(url = %url, "Worker exited without releasing its slot");
                    }
                    !gone
                });

                if state.workers.is_empty() {
                    self.emit_event(Event::Shutdown);
                    break;
                }
                state.workers.values().map(|slot| slot.exited.clone()).collect()
            };

            join_all(exits.iter().map(|exited| exited.cancelled())).await;
        }

        tracing::info!("Shutdown complete");
        Ok(())
    }
}
