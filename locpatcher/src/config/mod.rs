//! Persistent settings and the tracked-file list.
//!
//! Both live in the platform config directory
//! (`~/.config/locpatcher` on Linux, `%APPDATA%\locpatcher` on Windows):
//!
//! - `config.ini` holds [`ConfigFile`] settings
//! - `tracked_files.txt` holds [`TrackedFiles`], every path any fetched patch
//!   list has named, so a clear can remove files the current list dropped

mod file;
mod tracked;

pub use file::{
    config_directory, config_file_path, log_directory, tracked_files_path, ConfigFile,
    ConfigFileError, NetworkSettings, PatcherSettings, RetrySettings, CONFIG_FILE_NAME,
    LOG_FILE_NAME, TRACKED_FILES_NAME,
};
pub use tracked::TrackedFiles;
