//! Engine tests driven by a fake downloader script.
//!
//! Each test writes a small shell script standing in for the external
//! tool, so the full spawn / stream-parse / outcome-resolution path is
//! exercised without any network access.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use vidfetch_core::media::MediaFormat;
use vidfetch_worker::engine::{run_download, EngineConfig, EngineError};

const URL: &str = "https://example.com/watch?v=abc";

/// Write an executable `/bin/sh` script into `dir` and return its path.
fn write_fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ytdlp.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Progress channel plus a collector task that returns every forwarded value.
fn progress_collector() -> (mpsc::Sender<f64>, JoinHandle<Vec<f64>>) {
    let (tx, mut rx) = mpsc::channel::<f64>(64);
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(pct) = rx.recv().await {
            seen.push(pct);
        }
        seen
    });
    (tx, handle)
}

fn config(tool: &Path, download_dir: &Path) -> EngineConfig {
    EngineConfig {
        ytdlp_path: tool.to_string_lossy().into_owned(),
        download_dir: download_dir.to_path_buf(),
        job_timeout: Duration::from_secs(10),
    }
}

// ---------------------------------------------------------------------------
// Success paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn destination_line_resolves_the_output_file() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().canonicalize().unwrap().join("downloads");
    std::fs::create_dir_all(&dl_dir).unwrap();

    let video = dl_dir.join("video.mp4");
    let tool = write_fake_tool(
        tmp.path(),
        &format!(
            "echo '[download] Destination: {video}'\n\
             echo '[download]  45.2% of 10.5MiB at 1.2MiB/s ETA 00:05'\n\
             echo '[download] 100% of 10.5MiB in 00:08'\n\
             echo data > '{video}'",
            video = video.display()
        ),
    );

    let (tx, collector) = progress_collector();
    let result = run_download(&config(&tool, &dl_dir), URL, MediaFormat::Mp4, tx).await;

    assert_eq!(result.unwrap(), video);

    let progress = collector.await.unwrap();
    assert_eq!(progress.first(), Some(&0.0));
    assert!(progress.contains(&45.2));
    assert_eq!(progress.last(), Some(&100.0));
    // Forwarded values never decrease.
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn postprocessed_path_supersedes_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().canonicalize().unwrap().join("downloads");
    std::fs::create_dir_all(&dl_dir).unwrap();

    let merged = dl_dir.join("merged.mp4");
    let tool = write_fake_tool(
        tmp.path(),
        &format!(
            "echo '[download] Destination: {dir}/intermediate.f137.mp4'\n\
             echo '[Merger] Merging formats into \"{merged}\"'\n\
             echo data > '{merged}'",
            dir = dl_dir.display(),
            merged = merged.display()
        ),
    );

    let (tx, _collector) = progress_collector();
    let result = run_download(&config(&tool, &dl_dir), URL, MediaFormat::Mp4, tx).await;

    assert_eq!(result.unwrap(), merged);
}

#[tokio::test]
async fn progress_on_stderr_is_parsed_too() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().canonicalize().unwrap().join("downloads");
    std::fs::create_dir_all(&dl_dir).unwrap();

    let video = dl_dir.join("clip.mp3");
    let tool = write_fake_tool(
        tmp.path(),
        &format!(
            "echo '[download]  33.3% of 3MiB' >&2\n\
             echo '[download] Destination: {video}' >&2\n\
             echo data > '{video}'",
            video = video.display()
        ),
    );

    let (tx, collector) = progress_collector();
    let result = run_download(&config(&tool, &dl_dir), URL, MediaFormat::Mp3, tx).await;

    assert_eq!(result.unwrap(), video);
    assert!(collector.await.unwrap().contains(&33.3));
}

#[tokio::test]
async fn zero_exit_without_reported_path_falls_back_to_directory_scan() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().canonicalize().unwrap().join("downloads");
    std::fs::create_dir_all(&dl_dir).unwrap();

    // The tool says nothing parseable but a matching file is present.
    let video = dl_dir.join("found-by-scan.mp4");
    std::fs::write(&video, b"data").unwrap();
    let tool = write_fake_tool(tmp.path(), "echo 'nothing to see here'");

    let (tx, _collector) = progress_collector();
    let result = run_download(&config(&tool, &dl_dir), URL, MediaFormat::Mp4, tx).await;

    assert_eq!(result.unwrap(), video);
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nonzero_exit_fails_even_when_a_path_was_captured() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().canonicalize().unwrap().join("downloads");
    std::fs::create_dir_all(&dl_dir).unwrap();

    let video = dl_dir.join("partial.mp4");
    let tool = write_fake_tool(
        tmp.path(),
        &format!(
            "echo '[download] Destination: {video}'\n\
             echo data > '{video}'\n\
             exit 3",
            video = video.display()
        ),
    );

    let (tx, _collector) = progress_collector();
    let result = run_download(&config(&tool, &dl_dir), URL, MediaFormat::Mp4, tx).await;

    match result {
        Err(EngineError::NonZeroExit { code }) => assert_eq!(code, 3),
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_exit_with_no_path_and_empty_directory_is_unresolved() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().canonicalize().unwrap().join("downloads");
    std::fs::create_dir_all(&dl_dir).unwrap();

    let tool = write_fake_tool(tmp.path(), "echo 'no output at all'");

    let (tx, _collector) = progress_collector();
    let result = run_download(&config(&tool, &dl_dir), URL, MediaFormat::Mp4, tx).await;

    assert!(matches!(result, Err(EngineError::OutputUnresolved)));
}

#[tokio::test]
async fn reported_path_missing_from_disk_fails_verification() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().canonicalize().unwrap().join("downloads");
    std::fs::create_dir_all(&dl_dir).unwrap();

    let ghost = dl_dir.join("ghost.mp4");
    let tool = write_fake_tool(
        tmp.path(),
        &format!("echo '[download] Destination: {}'", ghost.display()),
    );

    let (tx, _collector) = progress_collector();
    let result = run_download(&config(&tool, &dl_dir), URL, MediaFormat::Mp4, tx).await;

    match result {
        Err(EngineError::OutputMissing(path)) => assert_eq!(path, ghost),
        other => panic!("expected OutputMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_tool_is_a_launch_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().join("downloads");

    let cfg = EngineConfig {
        ytdlp_path: "/nonexistent/ytdlp-binary".to_string(),
        download_dir: dl_dir,
        job_timeout: Duration::from_secs(10),
    };

    let (tx, _collector) = progress_collector();
    let result = run_download(&cfg, URL, MediaFormat::Mp4, tx).await;

    assert!(matches!(result, Err(EngineError::Launch(_))));
}

#[tokio::test]
async fn overrunning_tool_is_killed_and_reported_as_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let dl_dir = tmp.path().canonicalize().unwrap().join("downloads");
    std::fs::create_dir_all(&dl_dir).unwrap();

    let tool = write_fake_tool(tmp.path(), "sleep 30");
    let cfg = EngineConfig {
        ytdlp_path: tool.to_string_lossy().into_owned(),
        download_dir: dl_dir,
        job_timeout: Duration::from_millis(200),
    };

    let started = std::time::Instant::now();
    let (tx, _collector) = progress_collector();
    let result = run_download(&cfg, URL, MediaFormat::Mp4, tx).await;

    assert!(matches!(result, Err(EngineError::Timeout { .. })));
    // The 30s sleep must not have been waited out.
    assert!(started.elapsed() < Duration::from_secs(5));
}
