//! Edit-mode source: the modal editor's `{"mode": ...}` state file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use modeglue_context::EditMode;
use modeglue_events::{EventSinkRef, SourceEvent};
use serde::Deserialize;

use crate::error::SourceResult;
use crate::file_watcher::FileWatcher;

pub const DEFAULT_EDIT_MODE_FILE: &str =
    "~/Library/Application Support/kindaVim/environment.json";

#[derive(Deserialize)]
struct ModeFile {
    mode: EditMode,
}

/// Read the current edit mode. An unreadable or unparseable file, or an
/// unknown mode, reads as insert.
pub fn read_edit_mode(path: &Path) -> EditMode {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read edit mode file");
            return EditMode::Insert;
        }
    };

    match serde_json::from_str::<ModeFile>(&content) {
        Ok(file) => file.mode,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed edit mode file");
            EditMode::Insert
        }
    }
}

/// Reports the edit mode once at start and again on every file change.
#[derive(Debug)]
pub struct EditModeSource {
    watcher: FileWatcher,
}

impl EditModeSource {
    pub fn start(path: impl Into<PathBuf>, sink: EventSinkRef) -> SourceResult<Self> {
        let path: PathBuf = path.into();
        let read_path = path.clone();
        let watch_sink = Arc::clone(&sink);

        let watcher = FileWatcher::watch(path.clone(), move || {
            watch_sink.send(SourceEvent::EditModeChanged(read_edit_mode(&read_path)));
        })?;

        sink.send(SourceEvent::EditModeChanged(read_edit_mode(&path)));

        Ok(Self { watcher })
    }

    pub fn stop(&mut self) {
        self.watcher.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeglue_events::InMemorySink;

    fn write(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("environment.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"mode": "normal", "other": 1}"#);
        assert_eq!(read_edit_mode(&path), EditMode::Normal);
    }

    #[test]
    fn test_malformed_reads_as_insert() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_edit_mode(&write(dir.path(), "{not json")), EditMode::Insert);
        assert_eq!(read_edit_mode(&write(dir.path(), r#"{"mode": "operator"}"#)), EditMode::Insert);
        assert_eq!(read_edit_mode(&write(dir.path(), r#"{}"#)), EditMode::Insert);
        assert_eq!(read_edit_mode(&dir.path().join("missing.json")), EditMode::Insert);
    }

    #[test]
    fn test_start_reports_initial_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"mode": "visual"}"#);
        let sink = Arc::new(InMemorySink::new());

        let mut source = EditModeSource::start(&path, sink.clone()).unwrap();
        source.stop();

        let events = sink.events();
        assert!(matches!(
            events.first(),
            Some(SourceEvent::EditModeChanged(EditMode::Visual))
        ));
    }
}
