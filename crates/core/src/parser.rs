//! Line-oriented parser for the downloader's text output.
//!
//! The downloader interleaves progress lines, destination announcements,
//! and post-processing messages on stdout/stderr. Parsing is purely
//! line-local: each line is inspected in isolation and yields zero or more
//! signals, so arbitrary interleaving of the two streams is harmless.

use std::sync::LazyLock;

use regex::Regex;

/// `[download]  45.2% of 10.5MiB at 1.2MiB/s ETA 00:05`
static PROGRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[download\]\s+(\d+\.?\d*)%").expect("valid regex"));

/// Quoted output path with a known media extension, as printed by the
/// merge and audio-extraction post-processors:
/// `[Merger] Merging formats into "/data/video.mp4"`.
static POSTPROCESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+\.(?:mp4|mp3))["']"#).expect("valid regex"));

/// Prefix of a destination announcement line.
const DESTINATION_PREFIX: &str = "[download] Destination:";

/// A result-path signal extracted from one output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSignal {
    /// The file the downloader is writing to. May be superseded later if a
    /// post-processing step renames or re-encodes the output.
    Destination(String),
    /// The final path announced by a merge/extract post-processing step.
    Postprocessed(String),
}

/// Signals extracted from a single output line.
///
/// Lines matching none of the known patterns produce an empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    pub progress: Option<f64>,
    pub path: Option<PathSignal>,
}

/// Parse one line of downloader output.
pub fn parse_line(line: &str) -> ParsedLine {
    ParsedLine {
        progress: parse_progress(line),
        path: parse_destination(line).or_else(|| parse_postprocessed(line)),
    }
}

/// Extract a download progress percentage, if the line carries one.
///
/// A token that matches the pattern but fails to parse as a float is
/// ignored rather than treated as an error.
fn parse_progress(line: &str) -> Option<f64> {
    PROGRESS_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Extract the announced destination path, trimmed of whitespace.
fn parse_destination(line: &str) -> Option<PathSignal> {
    let rest = line.split_once(DESTINATION_PREFIX)?.1.trim();
    if rest.is_empty() {
        return None;
    }
    Some(PathSignal::Destination(rest.to_string()))
}

/// Extract the final path from a merge/extract post-processing line.
fn parse_postprocessed(line: &str) -> Option<PathSignal> {
    if !line.contains("[Merger]") && !line.contains("[ExtractAudio]") {
        return None;
    }
    POSTPROCESS_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| PathSignal::Postprocessed(m.as_str().to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
