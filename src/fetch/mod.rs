//! Fetch operations: the boundary to the external extraction/download tool.
//!
//! The manager never talks to yt-dlp directly. It hands each admitted task to a
//! [`Fetcher`], which performs the transfer, reports byte-level progress through
//! a [`ProgressReporter`] and returns the outcome.
//!
//! Implementations:
//!
//! - [`YtDlpFetcher`]: drives the external `yt-dlp` executable
//! - [`UnavailableFetcher`]: stand-in when no yt-dlp binary is available
//!
//! ## Usage
//!
//! ```no_run
//! use tube_dl::fetch::{FetchRequest, Fetcher, ProgressReporter, YtDlpFetcher};
//! use tube_dl::DownloadKind;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = YtDlpFetcher::from_path().ok_or("yt-dlp not found")?;
//!     let (reporter, mut ticks) = ProgressReporter::channel(16);
//!     tokio::spawn(async move {
//!         while let Some(tick) = ticks.recv().await {
//!             println!("{} / {:?} bytes", tick.downloaded, tick.total);
//!         }
//!     });
//!
//!     let request = FetchRequest {
//!         url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
//!         quality: "best".to_string(),
//!         kind: DownloadKind::Video,
//!         output_dir: "downloads".into(),
//!     };
//!     fetcher.fetch(&request, reporter, CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

mod parser;
mod traits;
mod unavailable;
mod ytdlp;

pub use parser::{PROGRESS_PREFIX, parse_progress_line};
pub use traits::{FetchRequest, Fetcher, ProgressReporter, ProgressTick};
pub use unavailable::UnavailableFetcher;
pub use ytdlp::YtDlpFetcher;
