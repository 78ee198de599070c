//! Per-task fetch execution, progress normalization and outcome reporting.

use super::DownloadManager;
use crate::error::FetchError;
use crate::fetch::{FetchRequest, ProgressReporter, ProgressTick};
use crate::types::{Event, Status};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Capacity of each worker's progress channel
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Convert a raw sample into a percentage
///
/// Returns `None` when the total is unknown or zero. The result is clamped to
/// 100 for tools that overshoot their estimate.
///
/// # Examples
///
/// ```
/// use tube_dl::fetch::ProgressTick;
/// use tube_dl::manager::percentage;
///
/// assert_eq!(percentage(ProgressTick { downloaded: 50, total: Some(200) }), Some(25.0));
/// assert_eq!(percentage(ProgressTick { downloaded: 50, total: None }), None);
/// ```
pub fn percentage(tick: ProgressTick) -> Option<f64> {
    match tick.total {
        Some(total) if total > 0 => Some((tick.downloaded as f64 * 100.0 / total as f64).min(100.0)),
        _ => None,
    }
}

/// Worker body: run the fetch, forward its progress, report the outcome
///
/// Progress ticks are applied while the fetch runs, then any still buffered
/// are drained before the outcome is reported, so a task's progress events
/// always precede its completion. A panicking fetcher is reported as an
/// unexpected failure. `exited` fires after the outcome is recorded, or when
/// the worker is dropped without finishing.
pub(super) async fn run_worker(
    manager: DownloadManager,
    request: FetchRequest,
    cancel: CancellationToken,
    exited: CancellationToken,
) {
    let _exit_guard = exited.drop_guard();
    let url = request.url.clone();
    let fetcher = Arc::clone(&manager.fetcher);
    let (reporter, mut ticks) = ProgressReporter::channel(PROGRESS_CHANNEL_CAPACITY);

    let outcome = {
        let fetch = AssertUnwindSafe(fetcher.fetch(&request, reporter, cancel)).catch_unwind();
        tokio::pin!(fetch);

        loop {
            tokio::select! {
                result = &mut fetch => break result,
                Some(tick) = ticks.recv() => manager.record_progress(&url, tick).await,
            }
        }
    };

    while let Ok(tick) = ticks.try_recv() {
        manager.record_progress(&url, tick).await;
    }

    let outcome = outcome.unwrap_or_else(|panic| {
        Err(FetchError::Unexpected(format!(
            "fetcher panicked: {}",
            panic_message(panic.as_ref())
        )))
    });

    manager.finish_download(&url, outcome).await;
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

impl DownloadManager {
    /// Apply one progress sample to a running task
    ///
    /// Samples are dropped when the percentage is unknown, when it does not
    /// exceed the last published value, or once the task is no longer running
    /// or its cancellation was requested.
    pub(super) async fn record_progress(&self, url: &str, tick: ProgressTick) {
        let Some(percent) = percentage(tick) else {
            tracing::trace!(url, downloaded = tick.downloaded, "Progress without known total");
            return;
        };

        let mut state = self.state.lock().await;

        let cancelled = state
            .workers
            .get(url)
            .is_none_or(|slot| slot.cancel.is_cancelled());
        if cancelled {
            return;
        }

        let Some(task) = state.tasks.get_mut(url) else {
            return;
        };
        if task.status != Status::Downloading || percent <= task.progress {
            return;
        }

        task.progress = percent;
        self.emit_event(Event::Progress {
            url: url.to_string(),
            percent,
        });
    }

    /// Record a worker's outcome, release its slot and admit the next task
    ///
    /// The outcome is discarded when the task was cancelled while the fetch
    /// was running.
    pub(super) async fn finish_download(&self, url: &str, outcome: Result<(), FetchError>) {
        let mut state = self.state.lock().await;

        let slot = state.workers.remove(url);
        let cancelled = slot.as_ref().is_none_or(|s| s.cancel.is_cancelled());
        let downloading = state
            .tasks
            .get(url)
            .is_some_and(|task| task.status == Status::Downloading);

        if cancelled || !downloading {
            tracing::debug!(url, "Discarding outcome of cancelled download");
        } else {
            match outcome {
                Ok(()) => {
                    if let Some(task) = state.tasks.get_mut(url) {
                        task.progress = 100.0;
                    }
                    self.transition(&mut state, url, Status::Completed);
                    self.emit_event(Event::DownloadCompleted {
                        url: url.to_string(),
                        success: true,
                        error: None,
                    });
                    tracing::info!(url, "Download completed");
                }
                Err(err) => {
                    if err.is_operation_specific() {
                        tracing::warn!(url, error = %err, "Download failed");
                    } else {
                        tracing::error!(url, error = %err, "Download failed unexpectedly");
                    }

                    let message = err.to_string();
                    if let Some(task) = state.tasks.get_mut(url) {
                        task.error_message = Some(message.clone());
                    }
                    self.transition(&mut state, url, Status::Failed);
                    self.emit_event(Event::DownloadCompleted {
                        url: url.to_string(),
                        success: false,
                        error: Some(message),
                    });
                }
            }
        }

        self.process_queue(&mut state);
    }
}
