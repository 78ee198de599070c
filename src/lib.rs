//! # tube-dl
//!
//! Concurrent download queue for YouTube and YouTube Music media.
//!
//! Requests are queued and run by at most `max_concurrent_downloads` workers,
//! strictly in submission order. Each worker drives a [`fetch::Fetcher`]
//! (by default the external `yt-dlp` binary), turns its byte counts into
//! percentages and reports the outcome. Observers subscribe to a broadcast
//! stream of [`Event`]s instead of polling.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tube_dl::{Config, DownloadKind, DownloadManager, Event};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let manager = DownloadManager::new(config).await?;
//!
//!     let mut events = manager.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Progress { url, percent } = event {
//!                 println!("{url}: {percent:.1}%");
//!             }
//!         }
//!     });
//!
//!     manager
//!         .add(
//!             "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!             "bestvideo[height<=1080]+bestaudio/best",
//!             DownloadKind::Video,
//!             None,
//!         )
//!         .await?;
//!
//!     tube_dl::run_with_shutdown(manager).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Fetch operation boundary and the yt-dlp implementation
pub mod fetch;
/// Logging setup
pub mod logging;
/// Download queue manager (decomposed into focused submodules)
pub mod manager;
/// Core types and events
pub mod types;
/// URL validation
pub mod validation;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, LoggingConfig, ToolsConfig};
pub use error::{Error, FetchError, Result};
pub use fetch::{Fetcher, UnavailableFetcher, YtDlpFetcher};
pub use logging::init_logging;
pub use manager::DownloadManager;
pub use types::{DownloadKind, DownloadTask, Event, MediaInfo, Status};
pub use validation::{is_playlist_url, validate_url};

/// Run the manager until a termination signal arrives, then shut it down.
///
/// - **Unix:** SIGTERM or SIGINT
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`
///
/// # Example
///
/// ```no_run
/// use tube_dl::{Config, DownloadManager, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = DownloadManager::new(Config::default()).await?;
///     run_with_shutdown(manager).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(manager: DownloadManager) -> Result<()> {
    wait_for_signal().await;
    manager.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                _ = sigint.recv() => tracing::info!("Received SIGINT"),
            }
        }
        (Ok(mut only), Err(e)) | (Err(e), Ok(mut only)) => {
            tracing::warn!(error = %e, "Could not register all signal handlers");
            only.recv().await;
            tracing::info!("Received termination signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}
