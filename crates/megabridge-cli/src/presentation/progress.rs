//! CLI progress rendering for downloads.
//!
//! Presentation only: the caller parses megatools output into
//! [`TransferProgress`] events and hands them over. A terminal gets an
//! indicatif bar; anything else gets a throttled `\r` status line.

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use megabridge_core::TransferProgress;

/// Bar resolution: one step per hundredth of a percent.
const BAR_STEPS: u64 = 10_000;

/// Minimum gap between two plain status lines.
const PLAIN_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// CLI Progress Printer
// ============================================================================

/// CLI progress display that automatically selects terminal or plain output.
pub struct CliProgressPrinter {
    inner: ProgressRender,
}

enum ProgressRender {
    Fancy(FancyProgress),
    Plain(PlainProgress),
}

impl CliProgressPrinter {
    /// Create a new progress printer, auto-detecting terminal capability.
    pub fn new() -> Self {
        if io::stdout().is_terminal() {
            Self {
                inner: ProgressRender::Fancy(FancyProgress::new()),
            }
        } else {
            Self::plain()
        }
    }

    /// Printer that never draws a bar.
    pub fn plain() -> Self {
        Self {
            inner: ProgressRender::Plain(PlainProgress::new()),
        }
    }

    /// Show a new progress event.
    pub fn update(&mut self, progress: &TransferProgress) {
        match &mut self.inner {
            ProgressRender::Fancy(inner) => inner.update(progress),
            ProgressRender::Plain(inner) => inner.update(progress),
        }
    }

    /// Print a non-progress line without mangling the bar.
    pub fn message(&mut self, line: &str) {
        match &mut self.inner {
            ProgressRender::Fancy(inner) => inner.bar.println(line),
            ProgressRender::Plain(inner) => inner.message(line),
        }
    }

    /// Finish and clear the progress display.
    pub fn finish(&mut self) {
        match &mut self.inner {
            ProgressRender::Fancy(inner) => inner.finish(),
            ProgressRender::Plain(inner) => inner.finish(),
        }
    }
}

impl Default for CliProgressPrinter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Fancy Terminal Progress (indicatif)
// ============================================================================

struct FancyProgress {
    bar: ProgressBar,
    last_label: Option<String>,
}

impl FancyProgress {
    fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(BAR_STEPS), ProgressDrawTarget::stdout());
        bar.set_style(Self::bar_style());
        bar.set_message("Connecting to mega.nz".to_string());
        Self {
            bar,
            last_label: None,
        }
    }

    fn update(&mut self, progress: &TransferProgress) {
        if self.last_label.as_deref() != Some(progress.file_name.as_str()) {
            self.bar.set_prefix(format_label(&progress.file_name));
            self.last_label = Some(progress.file_name.clone());
        }

        self.bar.set_message(transfer_summary(progress));
        self.bar.set_position(bar_position(progress.percent));
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("⬇ {prefix} {bar:28.cyan/blue} {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

// ============================================================================
// Plain Progress (non-terminal)
// ============================================================================

struct PlainProgress {
    last_emit: Option<Instant>,
    last_line_len: usize,
    printed: bool,
}

impl PlainProgress {
    const fn new() -> Self {
        Self {
            last_emit: None,
            last_line_len: 0,
            printed: false,
        }
    }

    fn update(&mut self, progress: &TransferProgress) {
        let now = Instant::now();
        let due = self
            .last_emit
            .is_none_or(|last| now.duration_since(last) >= PLAIN_INTERVAL);
        if !due && progress.percent < 100.0 {
            return;
        }
        self.last_emit = Some(now);

        let line = format!(
            "⬇ {}: {:5.1}% {}",
            format_label(&progress.file_name),
            progress.percent,
            transfer_summary(progress)
        );

        let pad = self.last_line_len.saturating_sub(line.len());
        print!("\r{line}{:pad$}", "");
        io::stdout().flush().ok();

        self.last_line_len = line.len();
        self.printed = true;
    }

    fn message(&mut self, line: &str) {
        self.finish();
        println!("{line}");
    }

    fn finish(&mut self) {
        if self.printed {
            println!();
            self.printed = false;
            self.last_line_len = 0;
        }
    }
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// `4.2 MiB of 10.0 MiB @ 1.1 MiB/s`, using megatools' own units.
fn transfer_summary(progress: &TransferProgress) -> String {
    let mut summary = format!("{} of {}", progress.done, progress.total);
    if let Some(speed) = &progress.speed {
        summary.push_str(" @ ");
        summary.push_str(speed);
        summary.push_str("/s");
    }
    summary
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_position(percent: f64) -> u64 {
    let clamped = percent.clamp(0.0, 100.0);
    ((clamped * 100.0).round() as u64).min(BAR_STEPS)
}

fn format_label(raw: &str) -> String {
    const MAX_LABEL: usize = 40;
    let char_count = raw.chars().count();
    if char_count <= MAX_LABEL {
        return raw.to_string();
    }
    let mut buf: String = raw.chars().take(MAX_LABEL - 1).collect();
    buf.push('…');
    buf
}
