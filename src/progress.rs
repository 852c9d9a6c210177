//! Progress line parsing
//!
//! yt-dlp run with `--newline` prints one status line per update on its
//! combined output. Two kinds of line matter here:
//!
//! ```text
//! [download] Downloading item 3 of 7
//! [download]  42.5% of 10.00MiB at 1.50MiB/s ETA 00:05
//! ```
//!
//! Everything else is noise and yields `None`. Parsing never fails loudly.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Structured signal extracted from one output line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The downloader moved on to item `current` of `total`.
    ItemBoundary { current: u32, total: u32 },
    /// Completion of the item currently downloading, as printed (not clamped).
    ItemPercent { value: f64 },
}

fn item_boundary_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    // Older yt-dlp builds say "video N of M", newer ones "item N of M".
    // Anchored on "Downloading" so titles in Destination lines never match.
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bdownloading\s+(?:item|video)\s+(\d+)\s+of\s+(\d+)").ok()
    })
        .as_ref()
}

fn percent_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").ok())
        .as_ref()
}

/// Recognize "Downloading item N of M" anywhere in the line (case-insensitive).
///
/// Both numbers must be positive and `current <= total`; otherwise the line
/// is ignored as a whole.
pub fn parse_item_boundary(line: &str) -> Option<(u32, u32)> {
    let caps = item_boundary_re()?.captures(line)?;
    let current: u32 = caps.get(1)?.as_str().parse().ok()?;
    let total: u32 = caps.get(2)?.as_str().parse().ok()?;

    if current == 0 || total == 0 || current > total {
        return None;
    }

    Some((current, total))
}

/// Extract the first `[download]  NN.N%` value in the line, verbatim.
pub fn parse_percent(line: &str) -> Option<f64> {
    let caps = percent_re()?.captures(line)?;
    caps.get(1)?.as_str().parse::<f64>().ok()
}

/// Classify a whole line. Item announcements win over percentages.
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    if let Some((current, total)) = parse_item_boundary(line) {
        return Some(ProgressEvent::ItemBoundary { current, total });
    }

    parse_percent(line).map(|value| ProgressEvent::ItemPercent { value })
}
