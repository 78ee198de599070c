//! Submission and FIFO admission.

use super::{DownloadManager, ManagerState, WorkerSlot, worker};
use crate::error::{Error, Result};
use crate::fetch::FetchRequest;
use crate::types::{DownloadKind, DownloadTask, Event, Status, UNKNOWN_TITLE};
use tokio_util::sync::CancellationToken;

impl DownloadManager {
    /// Add a download to the queue
    ///
    /// The task is recorded as `Pending`, announced with [`Event::TaskAdded`]
    /// and started right away if a worker slot is free. Otherwise it waits
    /// behind every task submitted before it.
    ///
    /// # Arguments
    ///
    /// * `url` - Source URL, also the task's identity
    /// * `quality` - Quality selector, passed to the fetcher untouched
    /// * `kind` - Video or audio
    /// * `title` - Display title; `None` or blank becomes `"Unknown"`
    ///
    /// # Returns
    ///
    /// `Ok(())` when the task was added, or when a task with the same URL
    /// already exists (the duplicate is ignored and the existing task is left
    /// untouched).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` is empty
    /// - [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tube_dl::{Config, DownloadKind, DownloadManager};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = DownloadManager::new(Config::default()).await?;
    /// manager
    ///     .add(
    ///         "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    ///         "bestaudio",
    ///         DownloadKind::Audio,
    ///         Some("Never Gonna Give You Up".into()),
    ///     )
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add(
        &self,
        url: impl Into<String>,
        quality: impl Into<String>,
        kind: DownloadKind,
        title: Option<String>,
    ) -> Result<()> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(Error::InvalidUrl("URL cannot be empty".into()));
        }

        let mut state = self.state.lock().await;

        if !state.accepting_new {
            return Err(Error::ShuttingDown);
        }

        if state.tasks.contains_key(&url) {
            tracing::warn!(url = %url, "Download already in list, ignoring duplicate");
            return Ok(());
        }

        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let task = DownloadTask::new(url.clone(), quality.into(), kind, title);
        tracing::info!(url = %url, title = %task.title, kind = %kind, "Download added");

        state.tasks.insert(url.clone(), task.clone());
        state.order.push(url.clone());
        state.pending.push_back(url);
        self.emit_event(Event::TaskAdded { task });

        self.process_queue(&mut state);
        Ok(())
    }

    /// Start queued tasks while worker slots are free
    ///
    /// Runs after every state change that can free a slot (add, completion,
    /// cancellation). Entries whose task is no longer `Pending` are dropped.
    pub(crate) fn process_queue(&self, state: &mut ManagerState) {
        let max = self.config.download.max_concurrent_downloads;

        while state.workers.len() < max {
            let Some(url) = state.pending.pop_front() else {
                break;
            };

            let is_pending = state
                .tasks
                .get(&url)
                .is_some_and(|task| task.status == Status::Pending);
            if !is_pending {
                tracing::debug!(url = %url, "Skipping queue entry that is no longer pending");
                continue;
            }

            self.start_download(state, &url);
        }

        if !state.pending.is_empty() {
            tracing::debug!(
                queued = state.pending.len(),
                active = state.workers.len(),
                "All worker slots busy"
            );
        }
    }

    fn start_download(&self, state: &mut ManagerState, url: &str) {
        let Some(task) = state.tasks.get(url) else {
            return;
        };
        let request = FetchRequest {
            url: url.to_string(),
            quality: task.quality.clone(),
            kind: task.kind,
            output_dir: self.config.download.download_dir.clone(),
        };

        if !self.transition(state, url, Status::Downloading) {
            return;
        }
        self.emit_event(Event::DownloadStarted {
            url: url.to_string(),
        });

        let cancel = CancellationToken::new();
        let exited = CancellationToken::new();
        tokio::spawn(worker::run_worker(
            self.clone(),
            request,
            cancel.clone(),
            exited.clone(),
        ));
        state
            .workers
            .insert(url.to_string(), WorkerSlot { cancel, exited });

        tracing::info!(url, active = state.workers.len(), "Download started");
    }
}
