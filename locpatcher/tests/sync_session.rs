//! End-to-end engine behaviour against a scripted transport.

mod common;

use std::fs;
use std::path::Path;
use std::time::Duration;

use common::{line, session, status_messages, CancellingSink, MockTransport, Reply, MANIFEST_URL};
use locpatcher::sync::{
    CancelToken, RecordingSink, SyncError, SyncEvent, SyncSession, SyncState,
};
use tempfile::TempDir;

fn leftover_temp_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
                .count()
        })
        .unwrap_or(0)
}

fn manifest_ready_count(events: &[SyncEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SyncEvent::ManifestReady(_)))
        .count()
}

// ----- fetch -----

#[test]
fn test_empty_manifest_still_notifies_once() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    transport.manifest("");
    let (mut session, sink) = session(temp.path(), &transport);

    assert_eq!(session.check_for_updates().unwrap(), 0);

    let events = sink.events();
    assert_eq!(manifest_ready_count(&events), 1);
    assert!(events.contains(&SyncEvent::ManifestReady(Vec::new())));
    assert_eq!(session.state(), SyncState::UpToDate);
}

#[test]
fn test_malformed_lines_are_skipped() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let content = format!(
        "{}garbage\nb.pak XYZ 3\n{}",
        line("a.pak", b"aaa"),
        line("c.pak", b"ccc")
    );
    transport.manifest(&content);
    let (mut session, _sink) = session(temp.path(), &transport);

    assert_eq!(session.fetch_manifest().unwrap(), 3);
    assert_eq!(session.manifest().paths(), vec!["a.pak", "b.pak", "c.pak"]);
    assert_eq!(session.manifest().rejected(), 1);
}

#[test]
fn test_unparseable_checksum_is_tracked_and_fails_per_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("odd.pak"), b"hello world").unwrap();

    let transport = MockTransport::new();
    transport.manifest(&format!("odd.pak D4A1185 11\n{}", line("ok.pak", b"ok")));
    transport.file("odd.pak", vec![Reply::Body(b"hello world".to_vec())]);
    transport.file("ok.pak", vec![Reply::Body(b"ok".to_vec())]);
    let (mut session, sink) = session(temp.path(), &transport);

    assert_eq!(session.check_for_updates().unwrap(), 2);
    assert!(sink.events().contains(&SyncEvent::ManifestReady(vec![
        "odd.pak".to_string(),
        "ok.pak".to_string()
    ])));
    assert_eq!(session.outdated(), &["ok.pak", "odd.pak"]);

    let report = session.download_outdated().unwrap();
    assert_eq!(report.downloaded, vec!["ok.pak"]);
    assert_eq!(report.failed_paths(), vec!["odd.pak"]);
    assert!(matches!(report.failed[0].error, SyncError::Validation { .. }));
    assert_eq!(transport.requests_for("odd.pak"), 3);
    assert_eq!(fs::read(temp.path().join("odd.pak")).unwrap(), b"hello world");
    assert_eq!(session.state(), SyncState::PartialFailure);
}

#[test]
fn test_fetch_failure_keeps_previous_manifest() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    transport.manifest(&line("a.pak", b"aaa"));
    let (mut session, sink) = session(temp.path(), &transport);
    session.fetch_manifest().unwrap();

    transport.script(MANIFEST_URL, vec![Reply::Status(500)]);
    let err = session.fetch_manifest().unwrap_err();
    assert!(matches!(err, SyncError::Status { code: 500, .. }));
    assert_eq!(session.manifest().len(), 1);
    assert_eq!(session.state(), SyncState::Failed);

    transport.script(MANIFEST_URL, vec![Reply::Refused]);
    let err = session.fetch_manifest().unwrap_err();
    assert!(matches!(err, SyncError::Network { .. }));
    assert_eq!(session.manifest().len(), 1);

    assert_eq!(manifest_ready_count(&sink.events()), 1);
    assert!(status_messages(&sink.events())
        .iter()
        .any(|m| m.starts_with("ERROR: Network")));
}

// ----- check -----

#[test]
fn test_check_reports_missing_then_mismatched_in_order() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("same.pak"), b"same").unwrap();
    fs::write(temp.path().join("short.pak"), b"sho").unwrap();
    fs::write(temp.path().join("flip.pak"), b"flop").unwrap();

    let transport = MockTransport::new();
    let content = [
        line("same.pak", b"same"),
        line("short.pak", b"short"),
        line("gone.pak", b"gone"),
        line("flip.pak", b"flip"),
    ]
    .concat();
    transport.manifest(&content);
    let (mut session, sink) = session(temp.path(), &transport);

    assert_eq!(session.check_for_updates().unwrap(), 3);
    assert_eq!(session.outdated(), &["gone.pak", "short.pak", "flip.pak"]);
    assert_eq!(session.state(), SyncState::NeedsDownload);
    assert!(status_messages(&sink.events())
        .contains(&"Found 3 outdated/missing file(s) - patch required.".to_string()));
}

#[test]
fn test_check_rebuilds_outdated_set() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    transport.manifest(&line("a.pak", b"aaa"));
    let (mut session, _sink) = session(temp.path(), &transport);

    assert_eq!(session.check_for_updates().unwrap(), 1);
    fs::write(temp.path().join("a.pak"), b"aaa").unwrap();
    assert_eq!(session.check_local_files().unwrap(), 0);
    assert!(session.outdated().is_empty());
}

#[test]
fn test_scan_cancelled_after_tenth_entry() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let content: String = (0..100)
        .map(|i| line(&format!("f{:03}.pak", i), b"x"))
        .collect();
    transport.manifest(&content);

    let token = CancelToken::new();
    let recorder = RecordingSink::new();
    let sink = CancellingSink {
        recorder: recorder.clone(),
        token: token.clone(),
        trigger: Box::new(|event| {
            matches!(event, SyncEvent::StepProgress { value: 10, label, .. } if label.starts_with("Scanning"))
        }),
    };
    let mut session =
        SyncSession::new(common::config(temp.path()), transport, sink).with_cancel_token(token);

    let err = session.check_for_updates().unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(session.state(), SyncState::Cancelled);
    assert_eq!(session.outdated().len(), 10);

    let scanned = recorder
        .events()
        .iter()
        .filter(|e| matches!(e, SyncEvent::StepProgress { label, .. } if label.starts_with("Scanning")))
        .count();
    assert_eq!(scanned, 10);
    assert_eq!(status_messages(&recorder.events()).last().unwrap(), "Cancelled.");
}

// ----- download -----

#[test]
fn test_download_retries_until_success() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    transport.manifest(&line("Paks/a.pak", b"payload"));
    transport.file(
        "Paks/a.pak",
        vec![Reply::Status(503), Reply::Refused, Reply::Body(b"payload".to_vec())],
    );
    let (mut session, sink) = session(temp.path(), &transport);

    session.check_for_updates().unwrap();
    let report = session.download_outdated().unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.downloaded, vec!["Paks/a.pak"]);
    assert_eq!(transport.requests_for("Paks/a.pak"), 3);
    assert_eq!(fs::read(temp.path().join("Paks/a.pak")).unwrap(), b"payload");
    assert_eq!(session.state(), SyncState::Done);

    let messages = status_messages(&sink.events());
    assert!(messages.contains(&"[1/1] a.pak (attempt 3)".to_string()));
    assert_eq!(messages.last().unwrap(), "Patch complete. Ready to play!");
}

#[test]
fn test_exhausted_file_does_not_stop_the_rest() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    transport.manifest(&[line("bad.pak", b"bad"), line("good.pak", b"good")].concat());
    transport.file("bad.pak", vec![Reply::Refused]);
    transport.file("good.pak", vec![Reply::Body(b"good".to_vec())]);
    let (mut session, sink) = session(temp.path(), &transport);

    session.check_for_updates().unwrap();
    let report = session.download_outdated().unwrap();

    assert_eq!(report.downloaded, vec!["good.pak"]);
    assert_eq!(report.failed_paths(), vec!["bad.pak"]);
    assert!(matches!(report.failed[0].error, SyncError::Network { .. }));
    assert_eq!(transport.requests_for("bad.pak"), 3);
    assert_eq!(session.outdated(), &["bad.pak"]);
    assert_eq!(session.state(), SyncState::PartialFailure);
    assert!(!temp.path().join("bad.pak").exists());
    assert!(status_messages(&sink.events())
        .iter()
        .any(|m| m.starts_with("FAILED: bad.pak")));
}

#[test]
fn test_corrupt_body_is_retried_and_never_placed() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    transport.manifest(&line("a.pak", b"abcd"));
    transport.file(
        "a.pak",
        vec![Reply::Body(b"abce".to_vec()), Reply::Body(b"abcd".to_vec())],
    );
    let (mut session, sink) = session(temp.path(), &transport);

    session.check_for_updates().unwrap();
    let report = session.download_outdated().unwrap();

    assert!(report.all_succeeded());
    assert_eq!(transport.requests_for("a.pak"), 2);
    assert!(status_messages(&sink.events())
        .iter()
        .any(|m| m.starts_with("Validation failed for a.pak")));
    assert_eq!(leftover_temp_files(temp.path()), 0);
}

#[test]
fn test_oversized_and_truncated_bodies_fail_validation() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    transport.manifest(&[line("long.pak", b"abcd"), line("cut.pak", b"abcd")].concat());
    transport.file("long.pak", vec![Reply::Body(b"abcdefgh".to_vec())]);
    transport.file("cut.pak", vec![Reply::Body(b"ab".to_vec())]);
    let (mut session, _sink) = session(temp.path(), &transport);

    session.check_for_updates().unwrap();
    let report = session.download_outdated().unwrap();

    assert_eq!(report.failed.len(), 2);
    assert!(report
        .failed
        .iter()
        .all(|f| matches!(f.error, SyncError::Validation { .. })));
    assert!(!temp.path().join("long.pak").exists());
    assert!(!temp.path().join("cut.pak").exists());
    assert_eq!(leftover_temp_files(temp.path()), 0);
}

#[test]
fn test_broken_stream_keeps_existing_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.pak"), b"old!").unwrap();

    let transport = MockTransport::new();
    transport.manifest(&line("a.pak", b"new!"));
    transport.file("a.pak", vec![Reply::BrokenAfter(b"ne".to_vec())]);
    let (mut session, _sink) = session(temp.path(), &transport);

    session.check_for_updates().unwrap();
    let report = session.download_outdated().unwrap();

    assert_eq!(report.failed_paths(), vec!["a.pak"]);
    assert_eq!(fs::read(temp.path().join("a.pak")).unwrap(), b"old!");
    assert_eq!(leftover_temp_files(temp.path()), 0);
}

#[test]
fn test_traversal_path_fails_without_request() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("install");
    fs::create_dir_all(&root).unwrap();

    let transport = MockTransport::new();
    transport.manifest(&[line("../evil.pak", b"evil"), line("ok.pak", b"ok")].concat());
    transport.file("../evil.pak", vec![Reply::Body(b"evil".to_vec())]);
    transport.file("ok.pak", vec![Reply::Body(b"ok".to_vec())]);
    let (mut session, _sink) = session(&root, &transport);

    assert_eq!(session.check_for_updates().unwrap(), 2);
    let report = session.download_outdated().unwrap();

    assert_eq!(report.failed_paths(), vec!["../evil.pak"]);
    assert!(matches!(report.failed[0].error, SyncError::PathSafety { .. }));
    assert_eq!(transport.requests_for("../evil.pak"), 0);
    assert!(!temp.path().join("evil.pak").exists());
    assert!(root.join("ok.pak").exists());
}

#[test]
fn test_download_cancelled_mid_stream() {
    let temp = TempDir::new().unwrap();
    let transport = MockTransport::new();
    transport.manifest(&[line("a.pak", b"0123456789"), line("b.pak", b"b")].concat());
    transport.file("a.pak", vec![Reply::Body(b"0123456789".to_vec())]);
    transport.file("b.pak", vec![Reply::Body(b"b".to_vec())]);

    let token = CancelToken::new();
    let recorder = RecordingSink::new();
    let sink = CancellingSink {
        recorder: recorder.clone(),
        token: token.clone(),
        trigger: Box::new(|event| {
            matches!(event, SyncEvent::StepProgress { label, .. } if label.contains("ETA"))
        }),
    };
    let mut session = SyncSession::new(common::config(temp.path()), transport.clone(), sink)
        .with_cancel_token(token);

    session.check_for_updates().unwrap();
    let err = session.download_outdated().unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(session.state(), SyncState::Cancelled);
    assert!(!temp.path().join("a.pak").exists());
    assert_eq!(leftover_temp_files(temp.path()), 0);
    assert_eq!(transport.requests_for("b.pak"), 0);
    assert_eq!(session.outdated(), &["a.pak", "b.pak"]);
}

#[test]
fn test_slow_progress_interval_only_reports_completion() {
    let temp = TempDir::new().unwrap();
    let big = vec![b'x'; 48];
    let small = b"0123456789ab".to_vec();
    let transport = MockTransport::new();
    transport.manifest(&[line("big.pak", &big), line("small.pak", &small)].concat());
    transport.file("big.pak", vec![Reply::Body(big.clone())]);
    transport.file("small.pak", vec![Reply::Body(small.clone())]);

    let sink = RecordingSink::new();
    let config = common::config(temp.path()).with_progress_interval(Duration::from_secs(3600));
    let mut session = SyncSession::new(config, transport.clone(), sink.clone());

    session.check_for_updates().unwrap();
    let report = session.download_outdated().unwrap();
    assert!(report.all_succeeded());

    let events = sink.events();
    let file_steps: Vec<(u64, u64)> = events
        .iter()
        .filter_map(|e| match e {
            SyncEvent::StepProgress { value, max, label } if label.contains("ETA") => {
                Some((*value, *max))
            }
            _ => None,
        })
        .collect();
    assert_eq!(file_steps, vec![(48, 48), (12, 12)]);

    let overall: Vec<(u64, u64)> = events
        .iter()
        .filter_map(|e| match e {
            SyncEvent::ActionProgress { value, max, label } if label.starts_with("Downloading file") => {
                Some((*value, *max))
            }
            _ => None,
        })
        .collect();
    assert_eq!(overall, vec![(48, 60), (60, 60)]);
}

// ----- clear -----

#[test]
fn test_clear_counts_and_reconciles() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("install");
    fs::create_dir_all(root.join("Paks")).unwrap();
    fs::write(root.join("Paks/a.pak"), b"a").unwrap();
    fs::write(temp.path().join("outside.txt"), b"keep").unwrap();

    let transport = MockTransport::new();
    let (mut session, sink) = session(&root, &transport);

    let tracked = vec![
        "Paks/a.pak".to_string(),
        "Paks/missing.pak".to_string(),
        "../outside.txt".to_string(),
    ];
    let report = session.clear_tracked_files(&tracked).unwrap();

    assert_eq!(report.counts(), (1, 1, 1));
    assert_eq!(report.reconciled, vec!["Paks/a.pak", "Paks/missing.pak"]);
    assert!(!root.join("Paks/a.pak").exists());
    assert!(temp.path().join("outside.txt").exists());
    assert_eq!(session.state(), SyncState::Cleared);

    let deleted: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, SyncEvent::FilesDeleted(_)))
        .collect();
    assert_eq!(
        deleted,
        vec![SyncEvent::FilesDeleted(vec![
            "Paks/a.pak".to_string(),
            "Paks/missing.pak".to_string()
        ])]
    );
    assert!(transport.requests().is_empty());
}

#[test]
fn test_clear_cancelled_still_reports_reconciled() {
    let temp = TempDir::new().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(temp.path().join(name), name).unwrap();
    }

    let token = CancelToken::new();
    let recorder = RecordingSink::new();
    let sink = CancellingSink {
        recorder: recorder.clone(),
        token: token.clone(),
        trigger: Box::new(|event| {
            matches!(event, SyncEvent::StepProgress { value: 1, label, .. } if label.starts_with("Removing"))
        }),
    };
    let mut session = SyncSession::new(common::config(temp.path()), MockTransport::new(), sink)
        .with_cancel_token(token);

    let tracked: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let err = session.clear_tracked_files(&tracked).unwrap_err();

    assert!(err.is_cancelled());
    assert!(!temp.path().join("a").exists());
    assert!(temp.path().join("b").exists());
    assert!(recorder
        .events()
        .contains(&SyncEvent::FilesDeleted(vec!["a".to_string()])));
}
