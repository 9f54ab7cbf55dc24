//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`check`] - Fetch the patch list and report outdated files
//! - [`patch`] - Check, then download outdated files
//! - [`clear`] - Delete every tracked file
//! - [`config`] - Configuration management (show, set-dir, path)

pub mod check;
pub mod clear;
pub mod common;
pub mod config;
pub mod patch;
