//! Traits and types for fetch operations

use crate::error::FetchError;
use crate::types::{DownloadKind, MediaInfo};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Everything a fetcher needs to perform one download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Source URL
    pub url: String,
    /// Quality selector, passed through untouched
    pub quality: String,
    /// Video or audio
    pub kind: DownloadKind,
    /// Directory the output file(s) are written to
    pub output_dir: PathBuf,
}

/// Raw progress sample as reported by the underlying tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTick {
    /// Bytes transferred so far
    pub downloaded: u64,
    /// Total size in bytes, if known
    pub total: Option<u64>,
}

/// Sending half of a task's progress channel
///
/// The channel is bounded, so a fetcher that reports faster than the manager
/// consumes is slowed down rather than buffering without limit.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::Sender<ProgressTick>,
}

impl ProgressReporter {
    /// Create a reporter and the receiver its ticks arrive on
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressTick>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Report `downloaded` of `total` bytes
    ///
    /// Silently does nothing once the receiving side is gone.
    pub async fn report(&self, downloaded: u64, total: Option<u64>) {
        self.tx
            .send(ProgressTick { downloaded, total })
            .await
            .ok();
    }
}

/// Trait for the external fetch operation
///
/// Implementations must be callable concurrently from several workers. They
/// should watch `cancel` and return [`FetchError::Cancelled`] promptly once it
/// fires; a fetcher that ignores the token makes `cancel` wait until the
/// transfer ends on its own.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use tube_dl::FetchError;
/// use tube_dl::fetch::{FetchRequest, Fetcher, ProgressReporter};
///
/// struct InstantFetcher;
///
/// #[async_trait]
/// impl Fetcher for InstantFetcher {
///     async fn fetch(
///         &self,
///         _request: &FetchRequest,
///         progress: ProgressReporter,
///         _cancel: CancellationToken,
///     ) -> Result<(), FetchError> {
///         progress.report(1024, Some(1024)).await;
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "instant"
///     }
/// }
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform one download
    ///
    /// # Errors
    ///
    /// - [`FetchError::Download`] when the tool reports a failure
    /// - [`FetchError::Unexpected`] for any other fault
    /// - [`FetchError::Cancelled`] when `cancel` fired before completion
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressReporter,
        cancel: CancellationToken,
    ) -> Result<(), FetchError>;

    /// Resolve metadata (title etc.) without downloading
    ///
    /// The default implementation reports the operation as unsupported.
    async fn probe(&self, url: &str) -> Result<MediaInfo, FetchError> {
        Err(FetchError::Unsupported(format!(
            "{} cannot probe {}",
            self.name(),
            url
        )))
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
