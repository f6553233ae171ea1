//! App family source: the modal editor's preference lists.
//!
//! Each list is stored as a string holding a JSON array of bundle ids.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use modeglue_context::AppFamily;
use modeglue_events::{EventSinkRef, FamilyMap, SourceEvent};

use crate::error::{SourceError, SourceResult};
use crate::file_watcher::FileWatcher;

pub const DEFAULT_PREFERENCES_FILE: &str =
    "~/Library/Preferences/mo.com.sleeplessmind.kindaVim.plist";

/// Preference key to family, in the editor's own naming.
pub fn default_family_lists() -> Vec<(String, AppFamily)> {
    [
        ("appsToIgnore", AppFamily::Off),
        ("appsForWhichToUseHybridMode", AppFamily::Pgr),
        ("appsForWhichToEnforceElectron", AppFamily::Electron),
        ("appsForWhichToEnforceKeyboardStrategy", AppFamily::KeyMapping),
        ("appsForWhichToEnforceNineOneOne", AppFamily::NineOneOne),
    ]
    .into_iter()
    .map(|(key, family)| (key.to_string(), family))
    .collect()
}

/// Read every configured list. Missing keys and unparseable lists are
/// skipped; a later list wins for a bundle id listed twice.
pub fn read_families(path: &Path, lists: &[(String, AppFamily)]) -> SourceResult<FamilyMap> {
    let preferences: plist::Dictionary =
        plist::from_file(path).map_err(|source| SourceError::Plist {
            path: path.to_path_buf(),
            source,
        })?;

    let mut families = FamilyMap::new();

    for (key, family) in lists {
        let Some(raw) = preferences.get(key).and_then(plist::Value::as_string) else {
            continue;
        };

        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(bundle_ids) => {
                for bundle_id in bundle_ids {
                    families.insert(bundle_id, *family);
                }
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to parse app family list");
            }
        }
    }

    Ok(families)
}

/// Reports the family map once at start and again on every file change.
#[derive(Debug)]
pub struct FamilySource {
    watcher: FileWatcher,
}

impl FamilySource {
    pub fn start(
        path: impl Into<PathBuf>,
        lists: Vec<(String, AppFamily)>,
        sink: EventSinkRef,
    ) -> SourceResult<Self> {
        let path: PathBuf = path.into();
        let lists = Arc::new(lists);

        let reload = {
            let path = path.clone();
            let lists = Arc::clone(&lists);
            move |sink: &EventSinkRef| match read_families(&path, &lists) {
                Ok(families) => {
                    tracing::debug!(count = families.len(), "app families loaded");
                    sink.send(SourceEvent::FamiliesChanged(families));
                }
                Err(e) => tracing::warn!(error = %e, "failed to load app families"),
            }
        };
        let reload = Arc::new(reload);

        let watch_reload = Arc::clone(&reload);
        let watch_sink = Arc::clone(&sink);
        let watcher = FileWatcher::watch(path, move || watch_reload(&watch_sink))?;

        reload(&sink);

        Ok(Self { watcher })
    }

    pub fn stop(&mut self) {
        self.watcher.stop();
    }
}
