//! Read-only queries.

use super::DownloadManager;
use crate::types::{DownloadTask, Status};

impl DownloadManager {
    /// Snapshots of all tasks currently `Downloading`, in submission order
    pub async fn active_downloads(&self) -> Vec<DownloadTask> {
        let state = self.state.lock().await;
        state
            .order
            .iter()
            .filter_map(|url| state.tasks.get(url))
            .filter(|task| task.status == Status::Downloading)
            .cloned()
            .collect()
    }

    /// Snapshots of every task ever added, in submission order
    pub async fn all_downloads(&self) -> Vec<DownloadTask> {
        let state = self.state.lock().await;
        state
            .order
            .iter()
            .filter_map(|url| state.tasks.get(url))
            .cloned()
            .collect()
    }

    /// Snapshot of a single task
    pub async fn get(&self, url: &str) -> Option<DownloadTask> {
        self.state.lock().await.tasks.get(url).cloned()
    }
}
