//! Download command handler.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use megabridge_core::parse_progress_line;
use megabridge_runtime::{
    Download, DownloadOptions, Megatools, OutputLog, ProcessHandle, Progress, ProgressCallback,
};

use crate::error::CliError;
use crate::presentation::CliProgressPrinter;

/// Arguments for the download command.
#[derive(Debug, Default)]
pub struct DownloadArgs {
    pub url: String,
    pub path: Option<PathBuf>,
    pub limit_speed: Option<u64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub proxy: Option<String>,
    pub disable_resume: bool,
    pub no_progress: bool,
    /// Echo megatools output instead of drawing a bar.
    pub raw: bool,
    /// Print the [`Download`] result as JSON.
    pub json: bool,
}

impl DownloadArgs {
    /// Translate the flags into megatools options.
    pub fn options(&self) -> DownloadOptions {
        let mut options = DownloadOptions::new()
            .with_disable_resume(self.disable_resume)
            .with_no_progress(self.no_progress);
        if let Some(path) = &self.path {
            options = options.with_path(path);
        }
        if let Some(limit) = self.limit_speed {
            options = options.with_limit_speed(limit);
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            options = options.with_credentials(username, password);
        }
        if let Some(proxy) = &self.proxy {
            options = options.with_proxy(proxy);
        }
        options
    }
}

/// Download `args.url`, rendering progress on the terminal.
pub async fn execute(megatools: &Megatools, args: DownloadArgs) -> Result<(), CliError> {
    let options = args.options();
    let printer = Arc::new(Mutex::new(CliProgressPrinter::new()));

    let progress = if args.raw {
        Progress::Default
    } else if args.json {
        Progress::Silent
    } else {
        Progress::Callback(render_callback(Arc::clone(&printer)))
    };

    let result = megatools.download_async(&args.url, &options, progress).await;
    if let Ok(mut printer) = printer.lock() {
        printer.finish();
    }
    let download = result?;

    report(&download, args.json)
}

/// Feed each new line to the printer: progress lines move the bar, anything
/// else is printed above it.
fn render_callback(printer: Arc<Mutex<CliProgressPrinter>>) -> ProgressCallback {
    ProgressCallback::immediate(move |log: &OutputLog, _handle: &ProcessHandle| {
        let Some(line) = log.last() else {
            return Ok(());
        };
        let mut printer = printer
            .lock()
            .map_err(|_| anyhow!("progress display lock poisoned"))?;

        match parse_progress_line(line) {
            Some(progress) => printer.update(&progress),
            None if !line.trim().is_empty() => printer.message(line),
            None => {}
        }
        Ok(())
    })
}

fn report(download: &Download, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(download)?);
        return Ok(());
    }

    match &download.file_name {
        Some(name) => println!("✓ Downloaded {name}"),
        None => println!("✓ Download finished"),
    }
    Ok(())
}
