//! Deterministic argument construction for the external downloader tool.
//!
//! The tool is treated as an opaque executable: the service only fixes the
//! flags that make its output machine-consumable (line-buffered progress,
//! no playlist expansion, explicit output template) and the format
//! selection for the two supported output forms.

use crate::media::MediaFormat;

/// Output filename template, joined onto the download directory.
///
/// The tool expands `%(title)s`/`%(ext)s` itself; distinct titles keep
/// concurrent jobs from clobbering each other in the shared directory.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Format selector for MP4: best video + best audio merged, falling back
/// to the best available single file, constrained to the mp4 container.
const MP4_FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Build the full argument list for one download invocation.
///
/// `output_template` is the already-joined `<download_dir>/<template>`
/// path. The locator always goes last so it can never be mistaken for a
/// flag value.
pub fn build_args(url: &str, format: MediaFormat, output_template: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-playlist".into(),
        "--no-warnings".into(),
        "--progress".into(),
        "--newline".into(),
        "-o".into(),
        output_template.into(),
    ];

    match format {
        MediaFormat::Mp3 => {
            args.extend([
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
                "--audio-quality".into(),
                "0".into(),
            ]);
        }
        MediaFormat::Mp4 => {
            args.extend([
                "-f".into(),
                MP4_FORMAT_SELECTOR.into(),
                "--merge-output-format".into(),
                "mp4".into(),
            ]);
        }
    }

    args.push(url.into());
    args
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
