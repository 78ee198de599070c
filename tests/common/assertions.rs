//! Event-waiting helpers for integration tests

use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tube_dl::Event;

/// Default time any test waits for the fake binary
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of waiting for a download to finish
#[derive(Debug, PartialEq)]
pub enum WaitResult {
    /// Download completed successfully
    Completed,
    /// Download failed with error
    Failed(String),
    /// Timeout waiting for completion
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait for the `DownloadCompleted` event of `url`
///
/// # Arguments
/// * `events` - Receiver subscribed before the download was added
/// * `url` - Download to wait for
/// * `timeout` - Maximum time to wait
pub async fn wait_for_completion(
    events: &mut Receiver<Event>,
    url: &str,
    timeout: Duration,
) -> WaitResult {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::DownloadCompleted {
                    url: event_url,
                    success,
                    error,
                }) if event_url == url => {
                    return if success {
                        WaitResult::Completed
                    } else {
                        WaitResult::Failed(error.unwrap_or_default())
                    };
                }
                Ok(_) => continue,
                Err(_) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Collect events until `predicate` matches (inclusive) or the timeout expires
pub async fn collect_events_until<F>(
    events: &mut Receiver<Event>,
    timeout: Duration,
    predicate: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut collected = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        while let Ok(event) = events.recv().await {
            let done = predicate(&event);
            collected.push(event);
            if done {
                break;
            }
        }
    })
    .await;
    collected
}

/// Percentages of all `Progress` events for `url`
pub fn progress_of(events: &[Event], url: &str) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { url: u, percent } if u == url => Some(*percent),
            _ => None,
        })
        .collect()
}
