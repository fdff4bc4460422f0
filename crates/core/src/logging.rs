//! Logging helpers.

/// Strip characters that could forge additional log entries.
///
/// User-supplied values (the submitted URL, downloader error text) must
/// pass through here before being interpolated into a log line.
pub fn sanitize_for_log(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
