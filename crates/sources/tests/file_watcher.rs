//! File watcher behaviour against a real filesystem.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use modeglue_context::EditMode;
use modeglue_events::{EventSink, SourceEvent};
use modeglue_sources::{EditModeSource, FileWatcher};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Give the platform watcher time to settle between steps.
fn settle() {
    std::thread::sleep(Duration::from_millis(200));
}

fn drain(rx: &Receiver<()>) {
    while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}
}

#[test]
fn test_reports_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{}").unwrap();

    let (tx, rx) = unbounded();
    let _watcher = FileWatcher::watch(&path, move || {
        let _ = tx.send(());
    })
    .unwrap();
    settle();

    std::fs::write(&path, r#"{"mode":"normal"}"#).unwrap();
    assert!(rx.recv_timeout(TIMEOUT).is_ok());
}

#[test]
fn test_survives_delete_and_recreate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{}").unwrap();

    let (tx, rx) = unbounded();
    let _watcher = FileWatcher::watch(&path, move || {
        let _ = tx.send(());
    })
    .unwrap();
    settle();

    std::fs::remove_file(&path).unwrap();
    assert!(rx.recv_timeout(TIMEOUT).is_ok());
    drain(&rx);

    std::fs::write(&path, "{}").unwrap();
    assert!(rx.recv_timeout(TIMEOUT).is_ok());
    drain(&rx);

    std::fs::write(&path, r#"{"mode":"visual"}"#).unwrap();
    assert!(rx.recv_timeout(TIMEOUT).is_ok());
}

#[test]
fn test_ignores_sibling_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{}").unwrap();

    let (tx, rx) = unbounded();
    let _watcher = FileWatcher::watch(&path, move || {
        let _ = tx.send(());
    })
    .unwrap();
    settle();

    std::fs::write(dir.path().join("other.json"), "{}").unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
}

#[test]
fn test_no_callback_after_stop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{}").unwrap();

    let (tx, rx) = unbounded();
    let mut watcher = FileWatcher::watch(&path, move || {
        let _ = tx.send(());
    })
    .unwrap();
    settle();
    watcher.stop();

    std::fs::write(&path, r#"{"mode":"normal"}"#).unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
}

struct ChannelForward(crossbeam_channel::Sender<SourceEvent>);

impl EventSink for ChannelForward {
    fn send(&self, event: SourceEvent) {
        let _ = self.0.send(event);
    }
}

#[test]
fn test_edit_mode_source_follows_recreated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("environment.json");
    std::fs::write(&path, r#"{"mode":"insert"}"#).unwrap();

    let (tx, rx) = unbounded();
    let mut source = EditModeSource::start(&path, Arc::new(ChannelForward(tx))).unwrap();

    assert!(matches!(
        rx.recv_timeout(TIMEOUT),
        Ok(SourceEvent::EditModeChanged(EditMode::Insert))
    ));
    settle();

    std::fs::remove_file(&path).unwrap();
    settle();
    std::fs::write(&path, r#"{"mode":"normal"}"#).unwrap();

    let saw_normal = std::iter::from_fn(|| rx.recv_timeout(TIMEOUT).ok())
        .any(|event| matches!(event, SourceEvent::EditModeChanged(EditMode::Normal)));
    assert!(saw_normal);

    source.stop();
}
