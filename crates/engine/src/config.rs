//! Daemon configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial (or
//! missing) file is fine. Paths may start with `~`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use modeglue_context::{AppFamily, WindowRules};
use modeglue_input::Shortcut;
use modeglue_sources::{
    default_family_lists, DEFAULT_EDIT_MODE_FILE, DEFAULT_OVERLAY_BUNDLE_ID,
    DEFAULT_PREFERENCES_FILE,
};
use modeglue_variables::{DEFAULT_CLI_PATH, DEFAULT_ENVIRONMENT_PATH, DEFAULT_PREFIX};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "MODEGLUE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// One preference list of the modal editor and the family it marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyList {
    /// Preference key holding the JSON-encoded bundle id array.
    pub key: String,
    /// Family tag (`off`, `pgr`, `electron`, `keymap`, `911`).
    pub family: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prepended to every pushed variable name.
    pub variable_prefix: String,

    /// Karabiner command line tool.
    pub karabiner_cli: PathBuf,

    /// Karabiner's generated file of committed variables.
    pub karabiner_environment: PathBuf,

    /// JSON file the modal editor writes its mode to.
    pub edit_mode_file: PathBuf,

    /// The modal editor's preferences plist.
    pub edit_mode_preferences: PathBuf,

    /// Later lists win when a bundle id appears in more than one.
    pub family_lists: Vec<FamilyList>,

    /// App names never treated as frontmost.
    pub excluded_frontmost_apps: Vec<String>,

    /// App names treated as overlay apps when focused.
    pub overlay_apps: Vec<String>,

    /// Bundle id of the overlay provider.
    pub overlay_bundle_id: String,

    pub normal_mode_shortcut: Shortcut,
    pub visual_mode_shortcut: Shortcut,

    /// Fallback between window reads when no notification arrives.
    pub window_poll_interval_ms: u64,
    pub mode_memory_debounce_ms: u64,

    /// Depth bound for the modal sheet/dialog search.
    pub modal_search_depth: usize,

    /// Unix socket receiving layer signals.
    pub control_socket: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variable_prefix: DEFAULT_PREFIX.to_string(),
            karabiner_cli: PathBuf::from(DEFAULT_CLI_PATH),
            karabiner_environment: PathBuf::from(DEFAULT_ENVIRONMENT_PATH),
            edit_mode_file: PathBuf::from(DEFAULT_EDIT_MODE_FILE),
            edit_mode_preferences: PathBuf::from(DEFAULT_PREFERENCES_FILE),
            family_lists: default_family_lists()
                .into_iter()
                .map(|(key, family)| FamilyList {
                    key,
                    family: family.as_str().to_string(),
                })
                .collect(),
            excluded_frontmost_apps: [
                "Hammerspoon",
                "Homerow",
                "Karabiner-EventViewer",
                "KeyCastr",
                "Accessibility Inspector",
                "modeglue",
            ]
            .map(String::from)
            .to_vec(),
            overlay_apps: vec!["Homerow".to_string()],
            overlay_bundle_id: DEFAULT_OVERLAY_BUNDLE_ID.to_string(),
            normal_mode_shortcut: Shortcut::normal_mode(),
            visual_mode_shortcut: Shortcut::visual_mode(),
            window_poll_interval_ms: 1000,
            mode_memory_debounce_ms: 200,
            modal_search_depth: 3,
            control_socket: PathBuf::from("/tmp/modeglue.sock"),
        }
    }
}

impl Config {
    /// `~/.config/modeglue/config.json` or the platform equivalent.
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("modeglue").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from `path`, else `$MODEGLUE_CONFIG`, else the default path.
    /// A missing file yields defaults; an unreadable or invalid one is an
    /// error.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => PathBuf::from(path),
                None => Self::default_path()?,
            },
        };
        let path = expand_home(&path);

        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default().expanded());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), "loaded config");
        tracing::debug!(?config, "config");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config.expanded())
    }

    /// Expand `~` in every path field.
    pub fn expanded(mut self) -> Self {
        for path in [
            &mut self.karabiner_cli,
            &mut self.karabiner_environment,
            &mut self.edit_mode_file,
            &mut self.edit_mode_preferences,
            &mut self.control_socket,
        ] {
            *path = expand_home(path);
        }
        self
    }

    /// Configured lists with their families. Unknown tags are skipped.
    pub fn families(&self) -> Vec<(String, AppFamily)> {
        self.family_lists
            .iter()
            .filter_map(|list| match AppFamily::parse(&list.family) {
                Some(family) => Some((list.key.clone(), family)),
                None => {
                    tracing::warn!(key = %list.key, family = %list.family, "unknown app family");
                    None
                }
            })
            .collect()
    }

    pub fn window_rules(&self) -> WindowRules {
        WindowRules {
            excluded_apps: self.excluded_frontmost_apps.clone(),
            overlay_apps: self.overlay_apps.clone(),
            overlay_bundle_id: self.overlay_bundle_id.clone(),
        }
    }

    pub fn window_poll_interval(&self) -> Duration {
        Duration::from_millis(self.window_poll_interval_ms)
    }

    pub fn mode_memory_debounce(&self) -> Duration {
        Duration::from_millis(self.mode_memory_debounce_ms)
    }
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
