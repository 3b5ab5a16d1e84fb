//! SpdIU - Save data management for Shattered Pixel Dungeon
//!
//! This library models the game's data folders (profiles, games and archived
//! save slots), copies them around, and watches a running game's log to
//! create autosaves whenever the hero changes floors.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;

pub mod cheats;
pub mod config;
pub mod datadir;
pub mod files;
pub mod formatters;
pub mod inspect;
pub mod process;
pub mod slots;
pub mod task_result;
pub mod tasks;
pub mod watcher;

pub use config::Config;
pub use datadir::{DataDir, Game, Profile};
pub use formatters::Formatters;
pub use process::GameProcess;
pub use slots::{SlotName, Slots};
pub use task_result::TaskResult;
pub use tasks::Task;
pub use watcher::AutoSaveWatcher;

/// Marker file of a single run's data folder
pub const GAME_MARKER: &str = "game.dat";

/// Marker file of a profile folder.
///
/// settings.xml shows up on first launch, journal.dat only once the dungeon
/// is loaded for the first time.
pub const PROFILE_MARKER: &str = "journal.dat";

/// Settings file of a profile
pub const SETTINGS_FILE: &str = "settings.xml";

/// Extension of gzipped JSON data files
pub const DAT_EXTENSION: &str = "dat";

/// Slot group for saves made by the user
pub const MANUAL_GROUP: &str = "manual";

/// Slot group for saves made by the log watcher
pub const AUTO_GROUP: &str = "auto";

/// Slot group for states preserved before they get overwritten
pub const BACKUP_GROUP: &str = "backup";

/// Every slot group, in listing order
pub const ALL_GROUPS: &[&str] = &[MANUAL_GROUP, AUTO_GROUP, BACKUP_GROUP];

pub const BULLET_A: &str = " ||> ";
pub const BULLET_B: &str = "  |> ";

pub const ICON_DISC_A: &str = "📀";
pub const ICON_DISC_B: &str = "💿";
pub const ICON_BACKUP: &str = "💾";
pub const ICON_AUTO: &str = "🤖";
pub const ICON_GAME: &str = "🕹️";
pub const ICON_DATA: &str = "🗂️";
pub const ICON_CLEAN: &str = "🧹";
pub const ICON_INSPECT: &str = "🔎";
pub const ICON_FORK: &str = "🍽️";
pub const ICON_UNKNOWN: &str = "👽";
pub const ICON_PACKAGE: &str = "📦";

pub const ICON_OBJECT: &str = "📖";
pub const ICON_ARRAY: &str = "📋";
pub const ICON_INTEGER: &str = "🧮";
pub const ICON_FLOAT: &str = "🍕";
pub const ICON_STRING: &str = "🔤";
pub const ICON_BOOL: &str = "💡";
pub const ICON_NULL: &str = "🫙";

lazy_static! {
    /// Game log lines that trigger an autosave.
    ///
    /// The first capture group names the autosave, spaces removed.
    pub static ref AUTOSAVE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"\[GAME\] @@ You \S+ to (floor \d+) of the dungeon\.").unwrap(),
    ];
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("{} has no {marker}", .dir.display())]
    MissingMarker { dir: PathBuf, marker: &'static str },

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Trouble reading {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Process error: {0}")]
    Process(String),
}

pub type Result<T> = std::result::Result<T, Error>;
