//! AutoSaveWatcher - Creates autosaves from the game's log
//!
//! The watcher is handed the whole log every time more output arrives. It
//! only searches what it has not seen yet, and at most one autosave is made
//! per call: two floor changes in the same chunk of output produce a single
//! autosave, named after the first one.

use crate::{files, Result, AUTOSAVE_PATTERNS, AUTO_GROUP};
use log::{debug, info};
use regex::Regex;
use std::path::{Path, PathBuf};

pub struct AutoSaveWatcher {
    source: PathBuf,
    auto_dir: PathBuf,
    patterns: Vec<Regex>,
    log_index: usize,
}

impl AutoSaveWatcher {
    /// Watch for the default events, saving `source` into `slots_dir`/auto
    pub fn new(source: impl Into<PathBuf>, slots_dir: impl AsRef<Path>) -> Self {
        Self::with_patterns(source, slots_dir, AUTOSAVE_PATTERNS.clone())
    }

    /// Watch for custom events. The first capture group names the autosave.
    pub fn with_patterns(
        source: impl Into<PathBuf>,
        slots_dir: impl AsRef<Path>,
        patterns: Vec<Regex>,
    ) -> Self {
        Self {
            source: source.into(),
            auto_dir: slots_dir.as_ref().join(AUTO_GROUP),
            patterns,
            log_index: 0,
        }
    }

    /// Bytes of the log already scanned
    pub fn log_index(&self) -> usize {
        self.log_index
    }

    /// Scan the unseen part of `stream`, autosaving on the first match.
    ///
    /// Returns the name of the autosave made, if any.
    pub fn submit(&mut self, stream: &str) -> Result<Option<String>> {
        let new = stream.get(self.log_index..).unwrap_or_default();

        let event = self.patterns.iter().find_map(|p| {
            p.captures(new)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        });

        let saved = match event {
            Some(event) => Some(self.autosave(&event)?),
            None => None,
        };

        self.log_index = stream.len();
        Ok(saved)
    }

    fn autosave(&self, event: &str) -> Result<String> {
        let name = event.replace(' ', "");
        debug!("autosave triggered by '{}'", event);

        files::replace(&self.source, &self.auto_dir.join(&name))?;
        info!("autosaved {}.{}", AUTO_GROUP, name);

        Ok(name)
    }
}
