//! Structured view of megatools' human-readable progress output.
//!
//! megatools redraws a single status line while a transfer runs:
//!
//! ```text
//! big.bin: 42.50% - 4.2 MiB (4404019 bytes) of 10.0 MiB (1.1 MiB/s)
//! big.bin: 42.50% - 4.2 MiB of 10.0 MiB (1.1 MiB/s)
//! ```
//!
//! Older releases include the exact byte count, newer ones drop it. Both
//! forms may be wrapped in ANSI colour escapes when megatools believes it
//! is writing to a terminal.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::log::OutputLog;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("ANSI escape pattern is valid")
});

static PROGRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>.+?): (?P<percent>\d+(?:\.\d+)?)% - (?P<done>.+?)(?: \((?P<bytes>\d+) bytes\))? of (?P<total>.+?)(?: \((?P<speed>[^()]*)/s\))?\s*$",
    )
    .expect("progress line pattern is valid")
});

static SEVERITY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+: ").expect("severity tag pattern is valid"));

/// One parsed megatools progress line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferProgress {
    /// Name of the file being transferred.
    pub file_name: String,
    /// Completion percentage, 0.0 to 100.0.
    pub percent: f64,
    /// Human-readable amount transferred (e.g. `4.2 MiB`).
    pub done: String,
    /// Exact bytes transferred, when megatools reports them.
    pub downloaded: Option<u64>,
    /// Human-readable total size.
    pub total: String,
    /// Human-readable speed without the `/s` suffix.
    pub speed: Option<String>,
}

impl TransferProgress {
    /// Completion as a fraction between 0.0 and 1.0.
    pub fn fraction(&self) -> f64 {
        (self.percent / 100.0).clamp(0.0, 1.0)
    }
}

/// Remove ANSI escape sequences from a line.
pub fn strip_ansi(line: &str) -> std::borrow::Cow<'_, str> {
    ANSI_ESCAPE.replace_all(line, "")
}

/// Parse a megatools progress line. Returns `None` for any other output.
pub fn parse_progress_line(line: &str) -> Option<TransferProgress> {
    let clean = strip_ansi(line);
    let caps = PROGRESS_LINE.captures(clean.trim())?;

    Some(TransferProgress {
        file_name: caps["name"].trim().to_string(),
        percent: caps["percent"].parse().ok()?,
        done: caps["done"].trim().to_string(),
        downloaded: caps.name("bytes").and_then(|m| m.as_str().parse().ok()),
        total: caps["total"].trim().to_string(),
        speed: caps.name("speed").map(|m| m.as_str().trim().to_string()),
    })
}

/// Remove a leading severity tag such as `ERROR: ` from a line.
///
/// Only an all-uppercase word at the very start counts, so ordinary
/// messages containing a colon are left untouched.
pub fn strip_severity(line: &str) -> &str {
    SEVERITY_TAG
        .find(line)
        .map_or(line, |tag| &line[tag.end()..])
        .trim_end()
}

/// Whether `line` starts with a severity tag such as `ERROR: `.
pub fn has_severity_tag(line: &str) -> bool {
    SEVERITY_TAG.is_match(line)
}

/// Name part of a `<name>: <status>` line, as printed with `--print-names`.
///
/// Lines without the separator and severity-tagged lines are not name lines.
pub fn name_line_prefix(line: &str) -> Option<String> {
    let clean = strip_ansi(line);
    if has_severity_tag(&clean) {
        return None;
    }
    let (name, _) = clean.split_once(": ")?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Work out the downloaded file's name from a finished log.
///
/// Prefers the newest progress line; otherwise the last non-empty line if
/// it is a `<name>: <status>` line. Anything else yields `None`.
pub fn resolve_file_name(log: &OutputLog) -> Option<String> {
    if let Some(progress) = log.iter().rev().find_map(|line| parse_progress_line(line)) {
        return Some(progress.file_name);
    }

    name_line_prefix(log.last_non_empty()?)
}
