//! Download queue manager split into focused submodules.
//!
//! The `DownloadManager` struct and its methods are organized by concern:
//! - [`queue`] - Submission and FIFO admission
//! - [`control`] - Cancellation
//! - [`worker`] - Per-task fetch execution, progress normalization, outcome reporting
//! - [`snapshot`] - Read-only queries
//! - [`lifecycle`] - Shutdown coordination
//!
//! All queue state sits behind a single mutex. Every mutation and every event
//! emission happens while it is held, so subscribers observe events in the
//! exact order the state changed.

mod control;
mod lifecycle;
mod queue;
mod snapshot;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use worker::percentage;

use crate::config::{Config, ToolsConfig};
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, UnavailableFetcher, YtDlpFetcher};
use crate::types::{DownloadTask, Event, MediaInfo, Status};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Bookkeeping for one running worker
///
/// The slot is removed by the worker itself once its outcome is recorded, so
/// a slot whose task is already `Cancelled` belongs to a worker still winding down.
pub(crate) struct WorkerSlot {
    /// Fired by `cancel`/`shutdown`; checked before any worker output is published
    pub(crate) cancel: CancellationToken,
    /// Fired by the worker when it exits, however it exits; any number of
    /// callers may wait on it
    pub(crate) exited: CancellationToken,
}

/// Everything the manager mutates, guarded by one lock
#[derive(Default)]
pub(crate) struct ManagerState {
    /// Every task ever added, keyed by URL (never evicted)
    pub(crate) tasks: HashMap<String, DownloadTask>,
    /// Submission order of `tasks`
    pub(crate) order: Vec<String>,
    /// URLs waiting for a worker, earliest first
    pub(crate) pending: VecDeque<String>,
    /// Running workers keyed by URL
    pub(crate) workers: HashMap<String, WorkerSlot>,
    /// Cleared by `shutdown`
    pub(crate) accepting_new: bool,
}

/// Download queue manager (cloneable - all fields are Arc-wrapped)
///
/// Accepts download requests, runs at most
/// `config.download.max_concurrent_downloads` fetches at once, admits queued
/// tasks in submission order and publishes lifecycle events to subscribers.
#[derive(Clone)]
pub struct DownloadManager {
    /// Queue state (task table, pending queue, worker slots)
    pub(crate) state: Arc<Mutex<ManagerState>>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration, fixed after construction
    pub(crate) config: Arc<Config>,
    /// The fetch operation every worker runs
    pub(crate) fetcher: Arc<dyn Fetcher>,
}

impl DownloadManager {
    /// Create a manager whose fetcher is chosen from `config.tools`
    ///
    /// An explicit `ytdlp_path` wins; otherwise PATH is searched when
    /// `search_path` is set. Without a yt-dlp binary every download fails with
    /// a descriptive error instead of hanging.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the download
    /// directory cannot be created.
    pub async fn new(config: Config) -> Result<Self> {
        let fetcher = select_fetcher(&config.tools);
        Self::with_fetcher(config, fetcher).await
    }

    /// Create a manager with an explicit fetcher
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            fetcher = fetcher.name(),
            max_concurrent = config.download.max_concurrent_downloads,
            download_dir = %config.download.download_dir.display(),
            "Download manager initialized"
        );

        Ok(Self {
            state: Arc::new(Mutex::new(ManagerState {
                accepting_new: true,
                ..Default::default()
            })),
            event_tx,
            config: Arc::new(config),
            fetcher,
        })
    }

    /// Subscribe to download events
    ///
    /// Each subscriber receives every event emitted after it subscribed, in
    /// the order the state changed.
    ///
    /// The one exception is a subscriber that falls more than 1000 events
    /// behind: the oldest events it has not read are dropped and its next
    /// `recv` returns `RecvError::Lagged(n)` with the number lost. Such a
    /// subscriber should resynchronize from [`all_downloads`](Self::all_downloads)
    /// rather than assume it saw every status change.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tube_dl::{Config, DownloadManager};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let manager = DownloadManager::new(Config::default()).await?;
    ///
    ///     let mut events = manager.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             println!("{:?}", event);
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the configuration the manager was built with
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Name of the fetcher in use
    pub fn fetcher_name(&self) -> &'static str {
        self.fetcher.name()
    }

    /// Resolve media metadata (e.g. the title to pass to [`add`](Self::add))
    ///
    /// Does not touch the queue.
    pub async fn probe(&self, url: &str) -> Result<MediaInfo> {
        let info = self.fetcher.probe(url).await?;
        tracing::debug!(url, title = %info.title, "Probed media");
        Ok(info)
    }

    /// Emit an event to all subscribers
    ///
    /// Callers hold the state lock, which is what orders events. Having no
    /// subscribers is not an error.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Move `url` to `next` and announce it
    ///
    /// Returns false (and changes nothing) when the state machine has no such edge.
    pub(crate) fn transition(&self, state: &mut ManagerState, url: &str, next: Status) -> bool {
        let Some(task) = state.tasks.get_mut(url) else {
            return false;
        };

        if !task.status.can_transition_to(next) {
            tracing::warn!(
                url,
                from = %task.status,
                to = %next,
                "Ignoring invalid status transition"
            );
            return false;
        }

        task.status = next;
        self.emit_event(Event::StatusChanged {
            url: url.to_string(),
            status: next,
        });
        true
    }
}

fn select_fetcher(tools: &ToolsConfig) -> Arc<dyn Fetcher> {
    if let Some(ref path) = tools.ytdlp_path {
        return Arc::new(YtDlpFetcher::new(path.clone()).with_ffmpeg(tools.ffmpeg_path.clone()));
    }

    if tools.search_path {
        if let Some(fetcher) = YtDlpFetcher::from_path() {
            tracing::debug!(path = %fetcher.binary_path().display(), "Found yt-dlp in PATH");
            return Arc::new(fetcher.with_ffmpeg(tools.ffmpeg_path.clone()));
        }
        tracing::warn!("yt-dlp not found in PATH, downloads will fail");
    }

    Arc::new(UnavailableFetcher)
}
