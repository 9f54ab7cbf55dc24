//! LOCPatcher - keeps a Last Oasis Classic installation in sync with the
//! remote patch list.
//!
//! The library holds the whole engine; front-ends only render events and
//! forward user actions.
//!
//! - [`manifest`] parses the `path checksum size` patch list
//! - [`checksum`] computes and compares CRC-32 values
//! - [`net`] fetches the patch list and streams file bodies
//! - [`safety`] keeps every write and delete inside the install root
//! - [`speed`] and [`format`] turn byte counts into rates and ETAs
//! - [`sync`] runs check, download and clear operations
//! - [`config`] persists settings and the tracked-file list
//! - [`logging`] installs the tracing subscriber

pub mod checksum;
pub mod config;
pub mod format;
pub mod logging;
pub mod manifest;
pub mod net;
pub mod safety;
pub mod speed;
pub mod sync;

/// Version of the library crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
