//! Core types for tube-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used until the caller supplies one
pub const UNKNOWN_TITLE: &str = "Unknown";

/// What the fetcher should produce for a download
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    /// Video with audio
    #[default]
    Video,
    /// Audio only
    Audio,
}

impl std::fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadKind::Video => write!(f, "video"),
            DownloadKind::Audio => write!(f, "audio"),
        }
    }
}

/// Download status
///
/// `Pending -> Downloading -> {Completed, Failed}`, and `Cancelled` from either
/// non-terminal state. Terminal states are never left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Queued and waiting for a free slot
    Pending,
    /// A worker is running the fetch
    Downloading,
    /// Fetch finished successfully
    Completed,
    /// Fetch failed
    Failed,
    /// Cancelled by the observer
    Cancelled,
}

impl Status {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed | Status::Cancelled)
    }

    /// Whether `self -> next` is an edge of the status state machine
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Downloading)
                | (Status::Pending, Status::Cancelled)
                | (Status::Downloading, Status::Completed)
                | (Status::Downloading, Status::Failed)
                | (Status::Downloading, Status::Cancelled)
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::Downloading => "downloading",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One requested download, keyed by its URL
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Source URL (unique key within a manager)
    pub url: String,
    /// Quality selector, forwarded verbatim to the fetcher
    pub quality: String,
    /// Video or audio
    pub kind: DownloadKind,
    /// Display label
    pub title: String,
    /// Current lifecycle status
    pub status: Status,
    /// Progress percentage (0.0 to 100.0)
    pub progress: f64,
    /// Failure description, only set when `status` is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the task was added to the manager
    pub added_at: DateTime<Utc>,
}

impl DownloadTask {
    pub(crate) fn new(url: String, quality: String, kind: DownloadKind, title: String) -> Self {
        Self {
            url,
            quality,
            kind,
            title,
            status: Status::Pending,
            progress: 0.0,
            error_message: None,
            added_at: Utc::now(),
        }
    }
}

/// Metadata returned by a probe, used to resolve a display title before queueing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Media or playlist title
    pub title: String,
    /// Uploader / channel name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    /// Duration in seconds (single media only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Number of entries when the URL is a playlist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
}

/// Event emitted during the download lifecycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task accepted into the manager (always the first event for a URL)
    TaskAdded {
        /// Snapshot of the new task
        task: DownloadTask,
    },

    /// A worker was spawned for the task
    DownloadStarted {
        /// Task URL
        url: String,
    },

    /// Progress update (never lower than the previous one for the same URL)
    Progress {
        /// Task URL
        url: String,
        /// Progress percentage (0.0 to 100.0)
        percent: f64,
    },

    /// Task moved to a new status
    StatusChanged {
        /// Task URL
        url: String,
        /// New status
        status: Status,
    },

    /// Fetch finished (emitted once per started task, unless cancelled)
    DownloadCompleted {
        /// Task URL
        url: String,
        /// Whether the fetch succeeded
        success: bool,
        /// Failure description when `success` is false
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Manager shut down
    Shutdown,
}

impl Event {
    /// URL the event refers to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Event::TaskAdded { task } => Some(&task.url),
            Event::DownloadStarted { url }
            | Event::Progress { url, .. }
            | Event::StatusChanged { url, .. }
            | Event::DownloadCompleted { url, .. } => Some(url),
            Event::Shutdown => None,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_have_no_outgoing_edges() {
        let all = [
            Status::Pending,
            Status::Downloading,
            Status::Completed,
            Status::Failed,
            Status::Cancelled,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(
                    !from.can_transition_to(to),
                    "{from} must not transition to {to}"
                );
            }
        }
    }

    #[test]
    fn test_pending_cannot_skip_downloading() {
        assert!(!Status::Pending.can_transition_to(Status::Completed));
        assert!(!Status::Pending.can_transition_to(Status::Failed));
        assert!(Status::Pending.can_transition_to(Status::Cancelled));
        assert!(Status::Downloading.can_transition_to(Status::Cancelled));
    }

    #[test]
    fn test_new_task_defaults() {
        let task = DownloadTask::new(
            "https://youtu.be/abc".into(),
            "best".into(),
            DownloadKind::Audio,
            UNKNOWN_TITLE.into(),
        );
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.progress, 0.0);
        assert!(task.error_message.is_none());
        assert_eq!(task.title, "Unknown");
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = Event::StatusChanged {
            url: "https://youtu.be/abc".into(),
            status: Status::Downloading,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["status"], "downloading");

        let completed = Event::DownloadCompleted {
            url: "u".into(),
            success: true,
            error: None,
        };
        let json = serde_json::to_value(&completed).unwrap();
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_event_url() {
        assert_eq!(
            Event::DownloadStarted { url: "u".into() }.url(),
            Some("u")
        );
        assert_eq!(Event::Shutdown.url(), None);
    }
}
