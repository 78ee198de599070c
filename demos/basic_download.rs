//! Basic download example
//!
//! This example demonstrates the core functionality of tube-dl:
//! - Loading configuration from the environment
//! - Validating URLs and probing titles
//! - Subscribing to events
//! - Queueing downloads and shutting down on Ctrl+C
//!
//! ```bash
//! MAX_CONCURRENT_DOWNLOADS=2 cargo run --example basic_download -- \
//!     https://www.youtube.com/watch?v=dQw4w9WgXcQ \
//!     https://music.youtube.com/watch?v=abcdefghijk
//! ```

use tube_dl::{
    Config, DownloadKind, DownloadManager, Event, init_logging, run_with_shutdown, validate_url,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let _log_guard = init_logging(&config.logging)?;

    let manager = DownloadManager::new(config).await?;

    let mut events = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::TaskAdded { task } => println!("+ Queued {} ({})", task.title, task.url),
                Event::DownloadStarted { url } => println!("> Started {}", url),
                Event::Progress { url, percent } => println!("  {:5.1}% {}", percent, url),
                Event::DownloadCompleted {
                    url,
                    success: true,
                    ..
                } => println!("✓ Done {}", url),
                Event::DownloadCompleted {
                    url,
                    error: Some(error),
                    ..
                } => println!("✗ Failed {}: {}", url, error),
                Event::Shutdown => println!("Shut down"),
                _ => {}
            }
        }
    });

    for url in std::env::args().skip(1) {
        if let Err(e) = validate_url(&url) {
            eprintln!("Skipping {}: {}", url, e);
            continue;
        }

        // Music links are fetched as audio, everything else as video
        let kind = if url.contains("music.youtube.com") {
            DownloadKind::Audio
        } else {
            DownloadKind::Video
        };

        let title = match manager.probe(&url).await {
            Ok(info) => Some(info.title),
            Err(e) => {
                eprintln!("Could not fetch title for {}: {}", url, e);
                None
            }
        };

        manager.add(url, "best", kind, title).await?;
    }

    run_with_shutdown(manager).await?;
    Ok(())
}
