//! `locpatcher patch`: check, then download everything outdated.

use std::path::Path;

use console::style;
use locpatcher::format::format_size;
use locpatcher::sync::{capabilities, Action, AppState, DownloadReport};

use super::common::{load_config, resolve_sync_config, run_session};
use crate::error::CliError;

/// Run a full check and download any outdated files.
///
/// Exits with [`CliError::PartialFailure`] when some files stay outdated.
pub fn run(dir: Option<&Path>) -> Result<(), CliError> {
    let config = load_config()?;
    let sync_config = resolve_sync_config(&config, dir)?;

    println!("Game directory: {}", sync_config.install_root.display());

    let (report, _tracked) = run_session(&config, sync_config, |session| {
        session.check_for_updates()?;
        if !capabilities(AppState::from(session.state())).allows(Action::Patch) {
            return Ok(None);
        }
        session.download_outdated().map(Some)
    })?;

    println!();
    match report {
        None => {
            println!("{} nothing to download.", style("Up to date:").green().bold());
            Ok(())
        }
        Some(report) => summarize(&report),
    }
}

fn summarize(report: &DownloadReport) -> Result<(), CliError> {
    println!(
        "{} {} file(s), {}",
        style("Downloaded:").green().bold(),
        report.downloaded.len(),
        format_size(report.bytes_downloaded)
    );

    if report.all_succeeded() {
        return Ok(());
    }

    println!("{} {} file(s):", style("Failed:").red().bold(), report.failed.len());
    for failure in &report.failed {
        println!("  {} - {}", failure.path, failure.error);
    }
    Err(CliError::PartialFailure {
        failed: report.failed.len(),
    })
}
