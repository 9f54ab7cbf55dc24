//! `locpatcher clear`: delete every tracked file from the installation.

use std::path::Path;

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};

use super::common::{load_config, load_tracked, resolve_sync_config, run_session};
use crate::error::CliError;

/// Delete tracked files after confirmation (skipped with `--yes`).
///
/// Deleted and already-absent paths are dropped from the tracked list; paths
/// that failed stay tracked for the next attempt.
pub fn run(dir: Option<&Path>, yes: bool) -> Result<(), CliError> {
    let config = load_config()?;
    let sync_config = resolve_sync_config(&config, dir)?;
    let paths = load_tracked()?.paths().to_vec();

    if paths.is_empty() {
        println!("No tracked files. Run `locpatcher check` first.");
        return Ok(());
    }

    if !yes {
        let prompt = format!(
            "Delete {} tracked file(s) from {}?",
            paths.len(),
            sync_config.install_root.display()
        );
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| CliError::Config(format!("Confirm error: {}", e)))?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let (report, tracked) =
        run_session(&config, sync_config, move |session| session.clear_tracked_files(&paths))?;

    let (deleted, missed, errored) = report.counts();
    println!();
    println!(
        "{} {} deleted, {} already absent, {} error(s)",
        style("Cleared:").green().bold(),
        deleted,
        missed,
        errored
    );
    if !tracked.is_empty() {
        println!("{} path(s) remain tracked.", tracked.len());
    }

    Ok(())
}
