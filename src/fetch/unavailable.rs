//! Fetcher used when no yt-dlp binary is available

use super::traits::{FetchRequest, Fetcher, ProgressReporter};
use crate::error::FetchError;
use crate::types::MediaInfo;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

const MISSING_TOOL: &str = "downloading requires the yt-dlp binary. \
     Configure ytdlp_path or ensure yt-dlp is in PATH.";

/// Stand-in fetcher when yt-dlp cannot be found
///
/// Every task handed to it fails immediately, so the queue keeps working and
/// the observer sees a clear error instead of a stuck download. The failure
/// is reported as [`FetchError::Unexpected`]: a missing tool is a setup
/// problem, not something specific to the requested video.
///
/// # Examples
///
/// ```
/// use tube_dl::fetch::{Fetcher, UnavailableFetcher};
///
/// # #[tokio::main]
/// # async fn main() {
/// let fetcher = UnavailableFetcher;
/// assert!(fetcher.probe("https://youtu.be/abc").await.is_err());
/// # }
/// ```
pub struct UnavailableFetcher;

#[async_trait]
impl Fetcher for UnavailableFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest,
        _progress: ProgressReporter,
        _cancel: CancellationToken,
    ) -> Result<(), FetchError> {
        tracing::debug!(url = %request.url, "Rejecting fetch: yt-dlp unavailable");
        Err(FetchError::Unexpected(MISSING_TOOL.into()))
    }

    async fn probe(&self, _url: &str) -> Result<MediaInfo, FetchError> {
        Err(FetchError::Unsupported(MISSING_TOOL.into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
