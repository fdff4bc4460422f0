//! Execution engine: runs the external downloader for a single job.
//!
//! Spawns the tool with piped stdout/stderr, drives the line parser over
//! both streams, forwards progress events, and resolves a verified output
//! path or a failure reason. `kill_on_drop(true)` ensures the child is
//! killed whenever supervision ends early (timeout, executor drop).

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use vidfetch_core::media::{MediaFormat, MEDIA_EXTENSIONS};
use vidfetch_core::parser::{self, ParsedLine, PathSignal};
use vidfetch_core::ytdlp;

/// Per-invocation engine settings, shared by all workers.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the downloader executable.
    pub ytdlp_path: String,
    /// Shared destination directory for all jobs.
    pub download_dir: PathBuf,
    /// Hard wall-clock limit for one job.
    pub job_timeout: Duration,
}

/// Failure modes of one download execution.
///
/// None of these are retried here; the worker records them on the job and
/// retry is a resubmission decision for the caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("downloader failed to launch: {0}")]
    Launch(std::io::Error),

    #[error("downloader exited with code {code}")]
    NonZeroExit { code: i32 },

    #[error("no output file could be determined")]
    OutputUnresolved,

    #[error("resolved output file missing from disk: {0}")]
    OutputMissing(PathBuf),

    #[error("download timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run one download to completion.
///
/// Progress percentages are forwarded through `progress_tx` as they are
/// parsed (0 at start, 100 after the output file is verified). The caller
/// owns the receiving end and persists updates into the job record.
pub async fn run_download(
    config: &EngineConfig,
    url: &str,
    format: MediaFormat,
    progress_tx: mpsc::Sender<f64>,
) -> Result<PathBuf, EngineError> {
    tokio::fs::create_dir_all(&config.download_dir).await?;
    // Canonical base directory so every path handed back is absolute.
    let download_dir = tokio::fs::canonicalize(&config.download_dir).await?;

    let template = download_dir.join(ytdlp::OUTPUT_TEMPLATE);
    let args = ytdlp::build_args(url, format, &template.to_string_lossy());

    let _ = progress_tx.send(0.0).await;

    let mut child = Command::new(&config.ytdlp_path)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(EngineError::Launch)?;

    // Both streams feed one channel; the parser is line-local, so the
    // interleaving does not matter.
    let (line_tx, mut line_rx) = mpsc::channel::<ParsedLine>(64);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(scan_stream(stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(scan_stream(stderr, line_tx.clone()));
    }
    drop(line_tx);

    let mut destination: Option<String> = None;
    let mut postprocessed: Option<String> = None;

    let supervise = async {
        while let Some(parsed) = line_rx.recv().await {
            if let Some(pct) = parsed.progress {
                let _ = progress_tx.send(pct).await;
            }
            // Last value per signal kind wins.
            match parsed.path {
                Some(PathSignal::Destination(p)) => destination = Some(p),
                Some(PathSignal::Postprocessed(p)) => postprocessed = Some(p),
                None => {}
            }
        }
        child.wait().await
    };

    let status = match tokio::time::timeout(config.job_timeout, supervise).await {
        Ok(waited) => waited?,
        Err(_elapsed) => {
            // The supervise future is dropped here, which drops `child`
            // and kills the process via kill_on_drop.
            return Err(EngineError::Timeout {
                elapsed_secs: config.job_timeout.as_secs(),
            });
        }
    };

    // A non-zero exit is always a failure, no matter what was parsed.
    if !status.success() {
        return Err(EngineError::NonZeroExit {
            code: status.code().unwrap_or(-1),
        });
    }

    // Post-processing may rename or re-encode the file, so its path
    // supersedes the in-progress destination.
    let resolved = match postprocessed.or(destination) {
        Some(reported) => absolutize(&download_dir, PathBuf::from(reported)),
        None => {
            // Last resort: scan the shared directory. Racy under
            // concurrent jobs; see the deployment notes.
            tracing::warn!(
                dir = %download_dir.display(),
                "No output path reported; falling back to directory scan"
            );
            find_latest_media_file(&download_dir)
                .await?
                .ok_or(EngineError::OutputUnresolved)?
        }
    };

    if !tokio::fs::try_exists(&resolved).await.unwrap_or(false) {
        return Err(EngineError::OutputMissing(resolved));
    }

    let _ = progress_tx.send(100.0).await;
    Ok(resolved)
}

/// Read one output stream line-by-line, parse each line, and forward any
/// extracted signals. Lines with no signal are dropped here to keep the
/// channel quiet.
async fn scan_stream<R: AsyncRead + Unpin>(stream: R, tx: mpsc::Sender<ParsedLine>) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let parsed = parser::parse_line(&line);
        if parsed.progress.is_none() && parsed.path.is_none() {
            continue;
        }
        if tx.send(parsed).await.is_err() {
            break;
        }
    }
}

/// Join a tool-reported path onto the download directory unless it is
/// already absolute.
fn absolutize(dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        dir.join(path)
    }
}

/// Find the most recently modified media file in `dir`.
async fn find_latest_media_file(dir: &Path) -> Result<Option<PathBuf>, EngineError> {
    let mut best: Option<(std::time::SystemTime, PathBuf)> = None;

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_media = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| MEDIA_EXTENSIONS.contains(&e))
            .unwrap_or(false);
        if !is_media {
            continue;
        }

        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let mtime = meta
            .modified()
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

        if best.as_ref().map(|(t, _)| mtime > *t).unwrap_or(true) {
            best = Some((mtime, path));
        }
    }

    Ok(best.map(|(_, p)| p))
}
