//! Session states and the UI capability table.
//!
//! [`SyncState`] tracks where one session is in its lifecycle. [`AppState`] is
//! the coarser state a front-end keeps between sessions; which actions it
//! offers in each state is the pure table in [`capabilities`].

/// Lifecycle of one sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Nothing started yet.
    Idle,
    /// Fetching the patch list.
    Fetching,
    /// Patch list loaded; local files not checked yet.
    Fetched,
    /// Checking which files exist locally.
    Scanning,
    /// Checksumming files that exist.
    Validating,
    /// Check finished; at least one file is missing or stale.
    NeedsDownload,
    /// Check finished; everything matches.
    UpToDate,
    /// Downloading outdated files.
    Downloading,
    /// Every outdated file was downloaded and verified.
    Done,
    /// Some files could not be downloaded.
    PartialFailure,
    /// Patch list could not be fetched.
    Failed,
    /// Stopped on user request.
    Cancelled,
    /// Removing tracked files.
    Clearing,
    /// Tracked files removed (errors, if any, are in the report).
    Cleared,
}

impl SyncState {
    /// Whether the session can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncState::Done
                | SyncState::PartialFailure
                | SyncState::Failed
                | SyncState::Cancelled
                | SyncState::Cleared
        )
    }

    /// Whether an operation is in flight.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            SyncState::Fetching
                | SyncState::Scanning
                | SyncState::Validating
                | SyncState::Downloading
                | SyncState::Clearing
        )
    }
}

/// Front-end state between operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    /// Nothing known about the installation.
    Idle,
    /// An operation is running.
    Running,
    /// A check found outdated files.
    NeedsPatch,
    /// The installation matches the patch list.
    ReadyToPlay,
}

impl From<SyncState> for AppState {
    fn from(state: SyncState) -> Self {
        match state {
            s if s.is_running() => AppState::Running,
            SyncState::NeedsDownload | SyncState::PartialFailure => AppState::NeedsPatch,
            SyncState::UpToDate | SyncState::Done => AppState::ReadyToPlay,
            _ => AppState::Idle,
        }
    }
}

/// User-triggerable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Fetch the patch list and check local files.
    Check,
    /// Download outdated files.
    Patch,
    /// Stop the running operation.
    Cancel,
    /// Remove every tracked file.
    Clear,
}

/// Set of actions enabled in a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub check: bool,
    pub patch: bool,
    pub cancel: bool,
    pub clear: bool,
}

impl Capabilities {
    /// Whether `action` is enabled.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Check => self.check,
            Action::Patch => self.patch,
            Action::Cancel => self.cancel,
            Action::Clear => self.clear,
        }
    }
}

/// Actions a front-end should enable in `state`.
pub fn capabilities(state: AppState) -> Capabilities {
    match state {
        AppState::Idle => Capabilities {
            check: true,
            patch: false,
            cancel: false,
            clear: true,
        },
        AppState::Running => Capabilities {
            check: false,
            patch: false,
            cancel: true,
            clear: false,
        },
        AppState::NeedsPatch => Capabilities {
            check: true,
            patch: true,
            cancel: false,
            clear: true,
        },
        AppState::ReadyToPlay => Capabilities {
            check: true,
            patch: false,
            cancel: false,
            clear: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_only_allows_cancel() {
        let caps = capabilities(AppState::Running);
        assert!(caps.allows(Action::Cancel));
        assert!(!caps.allows(Action::Check));
        assert!(!caps.allows(Action::Patch));
        assert!(!caps.allows(Action::Clear));
    }

    #[test]
    fn test_patch_only_when_needed() {
        assert!(capabilities(AppState::NeedsPatch).allows(Action::Patch));
        assert!(!capabilities(AppState::ReadyToPlay).allows(Action::Patch));
        assert!(!capabilities(AppState::Idle).allows(Action::Patch));
    }

    #[test]
    fn test_sync_state_mapping() {
        assert_eq!(AppState::from(SyncState::Downloading), AppState::Running);
        assert_eq!(AppState::from(SyncState::NeedsDownload), AppState::NeedsPatch);
        assert_eq!(AppState::from(SyncState::PartialFailure), AppState::NeedsPatch);
        assert_eq!(AppState::from(SyncState::Done), AppState::ReadyToPlay);
        assert_eq!(AppState::from(SyncState::Cancelled), AppState::Idle);
        assert_eq!(AppState::from(SyncState::Failed), AppState::Idle);
    }

    #[test]
    fn test_fetched_is_idle_not_running() {
        assert!(!SyncState::Fetched.is_running());
        assert!(!SyncState::Fetched.is_terminal());
        let state = AppState::from(SyncState::Fetched);
        assert_eq!(state, AppState::Idle);
        assert!(capabilities(state).allows(Action::Check));
        assert!(!capabilities(state).allows(Action::Cancel));
    }

    #[test]
    fn test_terminal_states() {
        assert!(SyncState::Cancelled.is_terminal());
        assert!(SyncState::Done.is_terminal());
        assert!(!SyncState::NeedsDownload.is_terminal());
        assert!(!SyncState::Downloading.is_terminal());
    }
}
