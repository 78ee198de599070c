//! URL checks used before a download reaches the queue.
//!
//! The manager only rejects empty URLs. Callers that accept user input run
//! [`validate_url`] first; the yt-dlp fetcher uses [`is_playlist_url`] to decide
//! between single-media and playlist mode.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

const SUPPORTED_URL_PATTERNS: &[&str] = &[
    r"^(https?://)?(www\.|m\.)?(youtube\.com|youtu\.be)/.+$",
    r"^(https?://)?(music\.youtube\.com)/.+$",
];

static SUPPORTED_URLS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SUPPORTED_URL_PATTERNS
        .iter()
        .filter_map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    tracing::error!(pattern, error = %e, "Invalid URL pattern");
                })
                .ok()
        })
        .collect()
});

/// Check that `url` is a non-empty YouTube or YouTube Music URL
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] with a user-facing reason.
pub fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::InvalidUrl("URL cannot be empty".to_string()));
    }

    if SUPPORTED_URLS.iter().any(|re| re.is_match(url)) {
        Ok(())
    } else {
        Err(Error::InvalidUrl(
            "Not a valid YouTube or YouTube Music URL".to_string(),
        ))
    }
}

/// Whether `url` points at a playlist rather than a single media item
pub fn is_playlist_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("list=") || lower.contains("/playlist")
}
