//! Output captured from a running invocation.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Ordered, append-only sequence of lines produced by one invocation.
///
/// The log only grows: the single mutator is [`OutputLog::push`], and
/// callbacks only ever get shared access or an owned snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputLog {
    lines: Vec<String>,
}

impl OutputLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Append a line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// All lines observed so far, in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines observed so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The newest line, if any.
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// The newest line that is not blank.
    pub fn last_non_empty(&self) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .map(String::as_str)
            .find(|line| !line.trim().is_empty())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }

    /// Join the log back into text, one line per row.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl Index<usize> for OutputLog {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.lines[index]
    }
}

impl<'a> IntoIterator for &'a OutputLog {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for OutputLog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Final state of a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    /// Process return code. A process killed by signal `N` reports `-N`.
    pub code: i32,
    /// Every line the process produced.
    pub log: OutputLog,
    /// Whether the process was ended by a kill that a callback requested.
    /// Stays false when the process had already exited on its own.
    pub terminated: bool,
}

impl ExitStatus {
    pub const fn new(code: i32, log: OutputLog, terminated: bool) -> Self {
        Self {
            code,
            log,
            terminated,
        }
    }

    /// Whether the process exited with code 0.
    pub const fn success(&self) -> bool {
        self.code == 0
    }
}
