//! Reader for the remapping engine's environment file.
//!
//! The file is regenerated on every variable change and can be large, so
//! values are extracted with one cached pattern per name instead of parsing
//! the whole document.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{VariableError, VariableResult};

pub const DEFAULT_ENVIRONMENT_PATH: &str =
    "/Library/Application Support/org.pqrs/tmp/karabiner_grabber_manipulator_environment.json";

#[derive(Debug)]
pub struct EnvironmentFile {
    path: PathBuf,
    patterns: HashMap<String, Regex>,
}

impl EnvironmentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            patterns: HashMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Matches a `"name": "value",` line and captures the value.
    fn pattern(&mut self, name: &str) -> VariableResult<&Regex> {
        match self.patterns.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let source = format!(r#""{}":\s*"([^\n]*)",?\n"#, regex::escape(name));
                let regex = Regex::new(&source).map_err(|source| VariableError::Pattern {
                    name: name.to_string(),
                    source,
                })?;
                Ok(entry.insert(regex))
            }
        }
    }

    /// Current string value of `name`, `None` if the file does not mention it.
    pub fn read(&mut self, name: &str) -> VariableResult<Option<String>> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| VariableError::Read {
            path: self.path.clone(),
            source,
        })?;

        let pattern = self.pattern(name)?;
        Ok(pattern
            .captures(&content)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string()))
    }

    pub fn cached_patterns(&self) -> usize {
        self.patterns.len()
    }
}
