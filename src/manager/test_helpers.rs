//! Shared test helpers for driving a DownloadManager with a scripted fetcher.

use crate::config::Config;
use crate::error::FetchError;
use crate::fetch::{FetchRequest, Fetcher, ProgressReporter};
use crate::manager::DownloadManager;
use crate::types::{DownloadKind, Event, Status};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// How long any test waits for an expected event
pub(crate) const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// One instruction for a scripted fetch
#[derive(Debug)]
pub(crate) enum Step {
    /// Report `downloaded` of `total` bytes
    Progress(u64, Option<u64>),
    /// Finish successfully
    Succeed,
    /// Finish with the given error
    Fail(FetchError),
    /// Panic inside the fetch
    Panic(&'static str),
}

type Script = (mpsc::UnboundedSender<Step>, Option<mpsc::UnboundedReceiver<Step>>);

/// Fetcher whose behavior per URL is fed step by step from the test
///
/// A fetch blocks until the test sends its next step, so tests decide exactly
/// when each download progresses or finishes. Cancellation is honored between
/// steps.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    started: Mutex<Vec<String>>,
    stopped: Mutex<Vec<String>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
    /// Delay between seeing cancellation and returning, during which one more
    /// progress sample is reported
    cancel_delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fetcher that lingers after cancellation and reports a late progress sample
    pub(crate) fn slow_to_cancel(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            cancel_delay: Some(delay),
            ..Default::default()
        })
    }

    /// Sender for the steps of `url`'s fetch (may be called before or after it starts)
    pub(crate) fn script(&self, url: &str) -> mpsc::UnboundedSender<Step> {
        let mut scripts = self.scripts.lock().unwrap();
        let entry = scripts.entry(url.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            (tx, Some(rx))
        });
        entry.0.clone()
    }

    /// Send a single step for `url`
    pub(crate) fn step(&self, url: &str, step: Step) {
        self.script(url).send(step).unwrap();
    }

    fn take_receiver(&self, url: &str) -> mpsc::UnboundedReceiver<Step> {
        self.script(url);
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|entry| entry.1.take())
            .expect("a URL is fetched at most once")
    }

    /// URLs whose fetch has begun, in start order
    pub(crate) fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// URLs whose fetch has returned, in order
    pub(crate) fn stopped(&self) -> Vec<String> {
        self.stopped.lock().unwrap().clone()
    }

    /// Highest number of fetches that were running at the same time
    pub(crate) fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressReporter,
        cancel: CancellationToken,
    ) -> Result<(), FetchError> {
        let url = request.url.clone();
        let mut steps = self.take_receiver(&url);
        self.started.lock().unwrap().push(url.clone());
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    if let Some(delay) = self.cancel_delay {
                        tokio::time::sleep(delay).await;
                        progress.report(999, Some(1000)).await;
                    }
                    break Err(FetchError::Cancelled);
                }
                step = steps.recv() => match step {
                    Some(Step::Progress(downloaded, total)) => progress.report(downloaded, total).await,
                    Some(Step::Succeed) | None => break Ok(()),
                    Some(Step::Fail(err)) => break Err(err),
                    Some(Step::Panic(msg)) => panic!("{}", msg),
                },
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.stopped.lock().unwrap().push(url);
        result
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Create a manager backed by a scripted fetcher.
/// Returns the manager, the fetcher and the tempdir (which must be kept alive).
pub(crate) async fn create_test_manager(
    max_concurrent: usize,
) -> (DownloadManager, Arc<ScriptedFetcher>, tempfile::TempDir) {
    create_test_manager_with(max_concurrent, ScriptedFetcher::new()).await
}

/// Same as [`create_test_manager`] with a caller-built fetcher
pub(crate) async fn create_test_manager_with(
    max_concurrent: usize,
    fetcher: Arc<ScriptedFetcher>,
) -> (DownloadManager, Arc<ScriptedFetcher>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.max_concurrent_downloads = max_concurrent;
    config.tools.search_path = false;

    let manager = DownloadManager::with_fetcher(config, fetcher.clone())
        .await
        .unwrap();

    (manager, fetcher, temp_dir)
}

/// Add a video download with default quality and no title
pub(crate) async fn add_video(manager: &DownloadManager, url: &str) {
    manager
        .add(url, "best", DownloadKind::Video, None)
        .await
        .unwrap();
}

/// Wait for the first event matching `predicate`, failing the test on timeout
pub(crate) async fn wait_for_event<F>(rx: &mut broadcast::Receiver<Event>, predicate: F) -> Event
where
    F: Fn(&Event) -> bool,
{
    tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("event channel failed: {}", e),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Collect events up to and including the first one matching `predicate`
pub(crate) async fn collect_until<F>(rx: &mut broadcast::Receiver<Event>, predicate: F) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut events = Vec::new();
    tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            let event = rx.recv().await.expect("event channel failed");
            let done = predicate(&event);
            events.push(event);
            if done {
                break;
            }
        }
    })
    .await
    .expect("timed out collecting events");
    events
}

/// Whether `event` is the completion of `url`
pub(crate) fn is_completion_of(event: &Event, url: &str) -> bool {
    matches!(event, Event::DownloadCompleted { url: u, .. } if u == url)
}

/// Wait until `url` reports `status`
pub(crate) async fn wait_for_status(rx: &mut broadcast::Receiver<Event>, url: &str, status: Status) {
    wait_for_event(rx, |event| {
        matches!(event, Event::StatusChanged { url: u, status: s } if u == url && *s == status)
    })
    .await;
}

/// Collect every event already delivered to `rx`
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Events in `events` that refer to `url`
pub(crate) fn events_for<'a>(events: &'a [Event], url: &str) -> Vec<&'a Event> {
    events.iter().filter(|e| e.url() == Some(url)).collect()
}
