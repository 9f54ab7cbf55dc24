//! `locpatcher check`: compare the installation with the patch list.

use std::path::Path;

use console::style;
use locpatcher::sync::{capabilities, Action, AppState};

use super::common::{load_config, resolve_sync_config, run_session};
use crate::error::CliError;

/// Fetch the patch list, record it as tracked and validate local files.
pub fn run(dir: Option<&Path>) -> Result<(), CliError> {
    let config = load_config()?;
    let sync_config = resolve_sync_config(&config, dir)?;

    println!("Game directory: {}", sync_config.install_root.display());

    let ((outdated, state), _tracked) = run_session(&config, sync_config, |session| {
        let outdated = session.check_for_updates()?;
        Ok((outdated, AppState::from(session.state())))
    })?;

    println!();
    if capabilities(state).allows(Action::Patch) {
        println!(
            "{} {} file(s) need updating. Run {} to download them.",
            style("Outdated:").yellow().bold(),
            outdated,
            style("locpatcher patch").cyan()
        );
    } else {
        println!("{} ready to play.", style("Up to date:").green().bold());
    }

    Ok(())
}
