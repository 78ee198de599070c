//! Fake yt-dlp binary used by the integration tests

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// URL the fake binary fails for
pub const FAILING_URL: &str = "https://www.youtube.com/watch?v=failfailfai";

/// URL the fake binary never finishes downloading
pub const SLOW_URL: &str = "https://www.youtube.com/watch?v=slowslowslo";

/// URL the fake binary downloads in three progress steps
pub const GOOD_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Failure line the fake binary prints for [`FAILING_URL`]
pub const FAILURE_REASON: &str = "[youtube] failfailfai: Video unavailable";

/// Behaviour is keyed on the last argument (the URL):
/// - contains `fail`: prints an ERROR line to stderr and exits 1
/// - with `--dump-single-json` first: prints metadata JSON
/// - contains `slow`: prints one progress line, then sleeps
/// - otherwise: prints 10%, 50% (estimate only) and 100% progress and exits 0
///
/// The arguments of the last run are written to `args.log` next to the script.
const FAKE_YTDLP: &str = r#"#!/bin/sh
for arg; do last="$arg"; done
printf '%s\n' "$@" > "$(dirname "$0")/args.log"

case "$last" in
  *fail*)
    echo "WARNING: unrelated warning" >&2
    echo "ERROR: [youtube] failfailfai: Video unavailable" >&2
    exit 1 ;;
esac

if [ "$1" = "--dump-single-json" ]; then
  echo '{"title": "Fake Title", "uploader": "Fake Channel", "duration": 42.0}'
  exit 0
fi

case "$last" in
  *slow*)
    echo "tube-dl-progress:100:1000:NA"
    exec sleep 30 ;;
  *)
    echo "[youtube] Extracting URL: $last"
    echo "tube-dl-progress:100:1000:NA"
    echo "tube-dl-progress:500:NA:1000"
    echo "tube-dl-progress:1000:1000:NA"
    exit 0 ;;
esac
"#;

/// Write the fake yt-dlp script into `dir` and make it executable
pub fn write_fake_ytdlp(dir: &Path) -> PathBuf {
    let path = dir.join("yt-dlp");
    std::fs::write(&path, FAKE_YTDLP).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Arguments the fake binary received on its last run
pub fn recorded_args(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("args.log"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
