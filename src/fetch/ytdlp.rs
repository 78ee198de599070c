//! Fetcher driving the external yt-dlp binary

use super::parser::{parse_error_message, parse_media_info, parse_progress_line, progress_template};
use super::traits::{FetchRequest, Fetcher, ProgressReporter};
use crate::error::FetchError;
use crate::types::{DownloadKind, MediaInfo};
use crate::validation::is_playlist_url;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// Number of stderr lines kept for error reporting
const STDERR_TAIL_LINES: usize = 200;

/// Output file name template, relative to the request's output directory
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Fetcher that runs `yt-dlp` as a child process
///
/// Progress is read from stdout via a custom `--progress-template`; stderr is
/// collected and its last `ERROR:` line becomes the failure message. When the
/// cancellation token fires, the child is killed and reaped before `fetch`
/// returns.
///
/// # Examples
///
/// ```no_run
/// use tube_dl::fetch::{Fetcher, YtDlpFetcher};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Explicit binary
/// let fetcher = YtDlpFetcher::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or discover it on PATH
/// let fetcher = YtDlpFetcher::from_path().ok_or("yt-dlp not found")?;
///
/// let info = fetcher.probe("https://youtu.be/dQw4w9WgXcQ").await?;
/// println!("{}", info.title);
/// # Ok(())
/// # }
/// ```
pub struct YtDlpFetcher {
    binary_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
}

impl YtDlpFetcher {
    /// Create a fetcher with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            ffmpeg_path: None,
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Forward an ffmpeg location to yt-dlp (used for audio extraction and thumbnail embedding)
    pub fn with_ffmpeg(mut self, ffmpeg_path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path;
        self
    }

    /// Path of the binary this fetcher runs
    pub fn binary_path(&self) -> &std::path::Path {
        &self.binary_path
    }

    pub(crate) fn build_args(&self, request: &FetchRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--newline",
            "--no-warnings",
            "--quiet",
            "--progress",
            "--progress-template",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(progress_template().into());

        args.push("-o".into());
        args.push(request.output_dir.join(OUTPUT_TEMPLATE).into_os_string());

        let quality = request.quality.trim();
        if !quality.is_empty() {
            args.push("-f".into());
            args.push(quality.into());
        }

        if is_playlist_url(&request.url) {
            args.push("--yes-playlist".into());
        } else {
            args.push("--no-playlist".into());
        }

        args.push("--embed-thumbnail".into());

        if request.kind == DownloadKind::Audio {
            for arg in [
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
                "--embed-metadata",
            ] {
                args.push(arg.into());
            }
        }

        if let Some(ref ffmpeg) = self.ffmpeg_path {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.clone().into_os_string());
        }

        args.push("--".into());
        args.push(request.url.clone().into());
        args
    }

    fn spawn(&self, args: &[OsString]) -> Result<Child, FetchError> {
        Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FetchError::Unexpected(format!("Failed to execute yt-dlp: {}", e)))
    }
}

/// Read progress lines from stdout until EOF, then wait for the process
async fn run_to_exit(
    child: &mut Child,
    stdout: impl AsyncRead + Unpin,
    progress: &ProgressReporter,
) -> std::io::Result<ExitStatus> {
    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_progress_line(&line) {
            Some(tick) => progress.report(tick.downloaded, tick.total).await,
            None => tracing::trace!(line = %line, "yt-dlp stdout"),
        }
    }
    child.wait().await
}

/// Collect the tail of stderr
async fn collect_stderr(stderr: impl AsyncRead + Unpin) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(line = %line, "yt-dlp stderr");
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Vec::from(tail).join("\n")
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressReporter,
        cancel: CancellationToken,
    ) -> Result<(), FetchError> {
        let args = self.build_args(request);
        tracing::info!(
            url = %request.url,
            kind = %request.kind,
            playlist = is_playlist_url(&request.url),
            "Starting yt-dlp"
        );

        let mut child = self.spawn(&args)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::Unexpected("yt-dlp stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::Unexpected("yt-dlp stderr was not captured".into()))?;
        let stderr_task = tokio::spawn(collect_stderr(stderr));

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(url = %request.url, error = %e, "Failed to kill yt-dlp");
                }
                stderr_task.abort();
                tracing::info!(url = %request.url, "yt-dlp stopped on cancellation");
                return Err(FetchError::Cancelled);
            }
            status = run_to_exit(&mut child, stdout, &progress) => status?,
        };

        let stderr_text = stderr_task.await.unwrap_or_default();

        if status.success() {
            tracing::info!(url = %request.url, "yt-dlp finished");
            Ok(())
        } else {
            let message = parse_error_message(&stderr_text)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
            Err(FetchError::Download(message))
        }
    }

    async fn probe(&self, url: &str) -> Result<MediaInfo, FetchError> {
        let mut command = Command::new(&self.binary_path);
        command
            .args(["--dump-single-json", "--skip-download", "--no-warnings"])
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if is_playlist_url(url) {
            command.arg("--flat-playlist");
        }
        command.arg("--").arg(url);

        let output = command
            .output()
            .await
            .map_err(|e| FetchError::Unexpected(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Download(
                parse_error_message(&stderr)
                    .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status)),
            ));
        }

        parse_media_info(&output.stdout)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
