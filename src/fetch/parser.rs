//! Parsers for yt-dlp output

use super::traits::ProgressTick;
use crate::error::FetchError;
use crate::types::{MediaInfo, UNKNOWN_TITLE};
use serde::Deserialize;

/// Marker at the start of every progress line produced by [`progress_template`]
pub const PROGRESS_PREFIX: &str = "tube-dl-progress:";

/// Value of yt-dlp's `--progress-template` option
///
/// Each line carries downloaded bytes, total bytes and the total estimate,
/// separated by `:`. Unknown fields are printed by yt-dlp as `NA`.
pub(crate) fn progress_template() -> String {
    format!(
        "download:{}%(progress.downloaded_bytes)s:%(progress.total_bytes)s:%(progress.total_bytes_estimate)s",
        PROGRESS_PREFIX
    )
}

/// Parse one stdout line into a progress sample
///
/// Returns `None` for lines that are not progress lines or lack a downloaded
/// byte count. The total falls back to yt-dlp's estimate when the exact size
/// is unknown.
pub fn parse_progress_line(line: &str) -> Option<ProgressTick> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split(':');

    let downloaded = parse_byte_count(fields.next()?)?;
    let total = fields.next().and_then(parse_byte_count);
    let estimate = fields.next().and_then(parse_byte_count);

    Some(ProgressTick {
        downloaded,
        total: total.or(estimate),
    })
}

// yt-dlp prints integers for exact sizes but floats for estimates
fn parse_byte_count(field: &str) -> Option<u64> {
    let field = field.trim();
    if let Ok(n) = field.parse::<u64>() {
        return Some(n);
    }
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

/// Pick the message that explains a failed run from captured stderr
///
/// Prefers the last `ERROR:` line (prefix stripped), then the last non-empty line.
pub(crate) fn parse_error_message(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find_map(|l| l.strip_prefix("ERROR:"))
        .map(|msg| msg.trim().to_string())
        .or_else(|| lines.last().map(|l| l.to_string()))
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    playlist_count: Option<usize>,
    entries: Option<Vec<serde_json::Value>>,
}

/// Parse the JSON printed by `yt-dlp --dump-single-json`
pub(crate) fn parse_media_info(json: &[u8]) -> Result<MediaInfo, FetchError> {
    let raw: RawInfo = serde_json::from_slice(json)
        .map_err(|e| FetchError::Unexpected(format!("Failed to parse yt-dlp metadata: {}", e)))?;

    let entry_count = raw
        .entries
        .as_ref()
        .map(Vec::len)
        .or(raw.playlist_count);

    Ok(MediaInfo {
        title: raw
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        uploader: raw.uploader.or(raw.channel),
        duration_secs: raw.duration,
        entry_count,
    })
}
