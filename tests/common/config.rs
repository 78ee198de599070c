//! Test configuration helpers for creating managers backed by the fake yt-dlp

use super::fixtures::write_fake_ytdlp;
use tempfile::TempDir;
use tube_dl::{Config, DownloadManager};

/// Config writing into `temp_dir/downloads` and running `ytdlp_path`
pub fn test_config(temp_dir: &TempDir, ytdlp_path: Option<std::path::PathBuf>) -> Config {
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.max_concurrent_downloads = 2;
    config.tools.ytdlp_path = ytdlp_path;
    config.tools.search_path = false;
    config
}

/// Manager running the fake yt-dlp.
/// Returns the manager and the tempdir (which must be kept alive).
pub async fn create_fake_manager() -> (DownloadManager, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let script = write_fake_ytdlp(temp_dir.path());
    let manager = DownloadManager::new(test_config(&temp_dir, Some(script)))
        .await
        .unwrap();
    (manager, temp_dir)
}
