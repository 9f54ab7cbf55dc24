//! Terminal rendering of sync events.
//!
//! Two bars, one per progress channel, with status lines printed above them:
//! ```text
//!   Fetching patch list from loc.iambvc.it/client/patchlist.txt
//!   Patch list OK - 1843 files tracked
//!   [=========>                ] Downloading file 3/12  1.20 GB / 3.41 GB (35%)  11.8 MB/s  ETA 03:12
//!   [===================>      ] a.pak  96.00 MB / 120.00 MB (80%)  12.1 MB/s  ETA :02
//! ```

use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use console::Style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use locpatcher::config::TrackedFiles;
use locpatcher::sync::{Severity, SyncEvent};

use crate::error::CliError;

fn bar_style(color: &str) -> ProgressStyle {
    let template = format!("  [{{bar:28.{}/dim}}] {{msg}}", color);
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Info => Style::new(),
        Severity::Success => Style::new().green().bold(),
        Severity::Warning => Style::new().yellow(),
        Severity::Error => Style::new().red().bold(),
    }
}

/// Drains the event channel on the main thread.
///
/// Also keeps the tracked-file list in step with `ManifestReady` and
/// `FilesDeleted`, saving it after every change.
pub struct EventRenderer {
    multi: MultiProgress,
    action: ProgressBar,
    step: ProgressBar,
    tracked: TrackedFiles,
    tracked_path: PathBuf,
}

impl EventRenderer {
    pub fn new(tracked: TrackedFiles, tracked_path: PathBuf) -> Self {
        Self::with_target(tracked, tracked_path, ProgressDrawTarget::stderr())
    }

    fn with_target(tracked: TrackedFiles, tracked_path: PathBuf, target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);
        let action = multi.add(ProgressBar::new(0).with_style(bar_style("cyan")));
        let step = multi.add(ProgressBar::new(0).with_style(bar_style("green")));
        Self {
            multi,
            action,
            step,
            tracked,
            tracked_path,
        }
    }

    /// Render events until every sender is gone.
    ///
    /// Tracked-list save failures are remembered and returned once the
    /// channel closes, so the worker is never left blocked.
    pub fn run(mut self, events: Receiver<SyncEvent>) -> Result<TrackedFiles, CliError> {
        let mut first_error = None;
        for event in events {
            if let Err(e) = self.handle(event) {
                tracing::error!(error = %e, "Tracked-file list update failed");
                first_error.get_or_insert(e);
            }
        }

        self.action.finish_and_clear();
        self.step.finish_and_clear();

        match first_error {
            Some(e) => Err(e),
            None => Ok(self.tracked),
        }
    }

    fn handle(&mut self, event: SyncEvent) -> Result<(), CliError> {
        match event {
            SyncEvent::Status { message, severity } => {
                let line = format!("  {}", severity_style(severity).apply_to(message));
                // Hidden draw targets (no TTY) swallow println.
                if self.multi.is_hidden() {
                    eprintln!("{}", line);
                } else {
                    let _ = self.multi.println(line);
                }
            }
            SyncEvent::StepProgress { value, max, label } => {
                update_bar(&self.step, value, max, label);
            }
            SyncEvent::ActionProgress { value, max, label } => {
                update_bar(&self.action, value, max, label);
            }
            SyncEvent::ManifestReady(paths) => {
                if self.tracked.add_missing(&paths) > 0 {
                    self.save_tracked()?;
                }
            }
            SyncEvent::FilesDeleted(paths) => {
                if self.tracked.remove(&paths) > 0 {
                    self.save_tracked()?;
                }
            }
        }
        Ok(())
    }

    fn save_tracked(&self) -> Result<(), CliError> {
        self.tracked
            .save_to(&self.tracked_path)
            .map_err(|error| CliError::TrackedFiles {
                path: self.tracked_path.clone(),
                error,
            })
    }
}

fn update_bar(bar: &ProgressBar, value: u64, max: u64, label: String) {
    bar.set_length(max);
    bar.set_position(value.min(max));
    bar.set_message(label);
}
