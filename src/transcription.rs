use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;

pub(crate) const DEFAULT_BIN: &str = "yt-dlp";

/// URLs per tool invocation. Smaller than the API batch size: one bad
/// video aborts the whole invocation, so small batches limit the blast
/// radius.
const BATCH_SIZE: usize = 10;

/// Outcome of one requested transcription. `path` is set when the
/// subtitle file exists on disk, whether downloaded now or earlier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionStatus {
    pub video_id: String,
    pub path: Option<PathBuf>,
}

impl TranscriptionStatus {
    pub fn downloaded(&self) -> bool {
        self.path.is_some()
    }
}

/// Output files are named `<video_id>.<language>.vtt` so callers can
/// locate them by globbing on the video ID.
fn subtitle_path(dir: &Path, video_id: &str, language: &str) -> PathBuf {
    dir.join(format!("{video_id}.{language}.vtt"))
}

fn ytdlp_args(dir: &Path, language: &str) -> Vec<String> {
    vec![
        "--skip-download".to_string(),
        "--write-auto-subs".to_string(),
        "--sub-langs".to_string(),
        language.to_string(),
        "--output".to_string(),
        dir.join("%(id)s").to_string_lossy().into_owned(),
        "--no-cache-dir".to_string(),
        "--no-progress".to_string(),
        "--quiet".to_string(),
    ]
}

/// Download auto-generated transcriptions for `videos_ids` into `dir`.
///
/// Tool failures are per-item by design: a failed invocation only leaves
/// its files absent, and every requested ID is reported either way.
pub(crate) async fn download(
    bin: &str,
    videos_ids: &[String],
    language_code: &str,
    dir: &Path,
    skip_downloaded: bool,
) -> Vec<TranscriptionStatus> {
    let language = language_code.to_lowercase();

    let pending: Vec<String> = videos_ids
        .iter()
        .filter(|id| !(skip_downloaded && subtitle_path(dir, id, &language).exists()))
        .map(|id| format!("https://www.youtube.com/watch?v={id}"))
        .collect();

    for batch in pending.chunks(BATCH_SIZE) {
        tracing::debug!(%bin, count = batch.len(), "downloading transcriptions");
        let status = Command::new(bin)
            .args(ytdlp_args(dir, &language))
            .args(batch)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) if !status.success() => {
                tracing::warn!(%bin, %status, "transcription batch exited abnormally");
            }
            Err(e) => {
                tracing::warn!(%bin, error = %e, "failed to run transcription tool");
            }
            Ok(_) => {}
        }
    }

    videos_ids
        .iter()
        .map(|id| {
            let path = subtitle_path(dir, id, &language);
            TranscriptionStatus {
                video_id: id.clone(),
                path: path.exists().then_some(path),
            }
        })
        .collect()
}
