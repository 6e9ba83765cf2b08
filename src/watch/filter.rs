use std::path::Path;

use glob::Pattern;

use crate::config::ReloadConfig;
use crate::error::{Error, Result};

use super::event::ChangeEvent;

/// Decides which change events may trigger a reload.
///
/// A pattern matches when it matches either the full path or the file name, so `*.py`
/// and `main.py` both behave as expected. Ignore patterns take precedence.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Vec<Pattern>,
    ignore: Vec<Pattern>,
    match_directories: bool,
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| Error::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

impl PathFilter {
    /// An empty include list means "everything".
    pub fn new(include: &[String], ignore: &[String], match_directories: bool) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            ignore: compile(ignore)?,
            match_directories,
        })
    }

    pub fn from_config(config: &ReloadConfig) -> Result<Self> {
        Self::new(
            &config.patterns,
            &config.ignore_patterns,
            config.match_directories,
        )
    }

    pub fn matches_path(&self, path: &Path) -> bool {
        let hit = |pattern: &Pattern| {
            pattern.matches_path(path)
                || path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| pattern.matches(name))
        };
        if self.ignore.iter().any(hit) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(hit)
    }

    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        if event.is_directory && !self.match_directories {
            return false;
        }
        event.paths().any(|path| self.matches_path(path))
    }
}
