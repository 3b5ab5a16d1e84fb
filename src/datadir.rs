//! DataDir - Snapshots of game data folders
//!
//! A `DataDir` is any folder holding dat files. A `Game` is a folder holding
//! one run's `game.dat`, and a `Profile` is a full data folder: settings,
//! progress and zero or more games. Whether a folder is a game or a profile
//! is decided by the presence of its marker file.

use crate::{files, Error, Result, DAT_EXTENSION, GAME_MARKER, PROFILE_MARKER, SETTINGS_FILE};
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A directory of game data, as it was when it got scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    pub root_dir: PathBuf,
    pub name: String,
    pub dat_files: BTreeSet<String>,
    /// Newest modification time between the directory and its direct files
    pub timestamp: SystemTime,
}

impl DataDir {
    /// Scan a directory
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::DirectoryNotFound(path.to_path_buf()));
        }

        let root_dir = absolute(path)?;
        let name = root_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut dat_files = BTreeSet::new();
        let mut timestamp = files::modified(&root_dir)?;

        for entry in fs::read_dir(&root_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            timestamp = timestamp.max(files::modified(&path)?);

            if path.extension().and_then(|e| e.to_str()) == Some(DAT_EXTENSION) {
                dat_files.insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        Ok(Self {
            root_dir,
            name,
            dat_files,
            timestamp,
        })
    }

    /// Check whether a dat file was found in the directory
    pub fn has_dat(&self, dat_file: &str) -> bool {
        self.dat_files.contains(dat_file)
    }

    /// Read a dat file in this directory
    pub fn get_dat(&self, dat_file: &str) -> Result<Value> {
        files::read_dat(&self.root_dir.join(dat_file))
    }

    /// Write any serializable value into a dat file in this directory
    pub fn set_dat<T: Serialize + ?Sized>(&self, dat_file: &str, content: &T) -> Result<()> {
        files::write_dat(&self.root_dir.join(dat_file), content)
    }

    fn require(self, marker: &'static str) -> Result<Self> {
        if self.has_dat(marker) {
            Ok(self)
        } else {
            Err(Error::MissingMarker {
                dir: self.root_dir,
                marker,
            })
        }
    }
}

/// Absolute form of `path` with `.` segments dropped. Symlinks are kept, so
/// names and groups come from the path that was scanned.
fn absolute(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(path.components().collect())
}

fn has_marker(path: &Path, marker: &str) -> bool {
    path.is_dir() && path.join(marker).is_file()
}

/// A single run of the game. A profile can hold several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    dir: DataDir,
}

impl Game {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let dir = DataDir::new(path)?.require(GAME_MARKER)?;
        Ok(Self { dir })
    }

    /// Whether a folder looks like a game
    pub fn is_game_dir(path: &Path) -> bool {
        has_marker(path, GAME_MARKER)
    }
}

impl Deref for Game {
    type Target = DataDir;

    fn deref(&self) -> &DataDir {
        &self.dir
    }
}

/// A full data folder: settings, profile progress and games
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    dir: DataDir,
    /// Name of the parent directory, i.e. the slot group
    pub group: String,
    /// Games sorted newest first
    pub games: Vec<Game>,
}

impl Profile {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut dir = DataDir::new(path)?.require(PROFILE_MARKER)?;

        let group = dir
            .root_dir
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut games = Vec::new();
        for entry in fs::read_dir(&dir.root_dir)? {
            let path = entry?.path();
            if !Game::is_game_dir(&path) {
                continue;
            }

            let game = Game::new(&path)?;
            dir.timestamp = dir.timestamp.max(game.timestamp);
            games.push(game);
        }
        games.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        debug!(
            "profile {}.{} with {} games",
            group,
            dir.name,
            games.len()
        );

        Ok(Self { dir, group, games })
    }

    /// Whether a folder looks like a profile
    pub fn is_profile_dir(path: &Path) -> bool {
        has_marker(path, PROFILE_MARKER)
    }

    /// Values from settings.xml. A profile without settings yet has none.
    pub fn get_settings(&self) -> Result<BTreeMap<String, String>> {
        match files::read_settings(&self.root_dir.join(SETTINGS_FILE)) {
            Err(Error::NotFound(_)) => Ok(BTreeMap::new()),
            other => other,
        }
    }

    pub fn get_game(&self, name: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.name == name)
    }

    /// The most recently played game
    pub fn latest_game(&self) -> Option<&Game> {
        self.games.first()
    }
}

impl Deref for Profile {
    type Target = DataDir;

    fn deref(&self) -> &DataDir {
        &self.dir
    }
}
