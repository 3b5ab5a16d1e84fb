//! Config - Where the game, its data and the save slots live
//!
//! Every value has a default. Overrides are read from a `spdiu.yaml` file,
//! and relative paths are resolved against `dirs.base`, which defaults to
//! the folder holding that file.

use crate::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory
pub const CONFIG_FILE: &str = "spdiu.yaml";

/// Java package of the unmodded game
pub const VANILLA_NS: &str = "com.shatteredpixel.shatteredpixeldungeon";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dirs {
    /// Base for every relative path
    pub base: PathBuf,
    /// Save slot groups
    pub slots: PathBuf,
    /// Game installation
    pub game: PathBuf,
}

impl Default for Dirs {
    fn default() -> Self {
        Self {
            base: PathBuf::from("."),
            slots: PathBuf::from("slots"),
            game: PathBuf::from("game"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// The game's active data folder
    pub data: PathBuf,
    /// Game executable relative to `dirs.game`, followed by any ` -flags`
    pub cmd: String,
    /// Java package of the game build, for forks with their own namespace
    pub ns: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            data: PathBuf::from("~/.local/share/.shatteredpixel/shattered-pixel-dungeon"),
            cmd: "bin/Shattered Pixel Dungeon".to_string(),
            ns: VANILLA_NS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dirs: Dirs,
    /// Slot used by save and load when none is given
    pub default_slot: String,
    /// Slot in the backup group holding the last overwritten active data
    pub backup_slot: String,
    pub game: GameConfig,
    /// strftime-style format for timestamps
    pub time_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dirs: Dirs::default(),
            default_slot: "default".to_string(),
            backup_slot: "bak".to_string(),
            game: GameConfig::default(),
            time_format: "🗓️ %Y %b %d 🕰️ %H:%M:%S".to_string(),
        }
    }
}

impl Config {
    /// Load a config file, or `spdiu.yaml` in the current directory.
    ///
    /// A missing default file means default values. A file that was asked
    /// for explicitly has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(cwd.join(CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let Some(file) = file else {
            debug!("no {} found, using defaults", CONFIG_FILE);
            let mut config = Self::default();
            config.dirs.base = cwd;
            return Ok(config);
        };

        debug!("loading config from {}", file.display());
        let base = file
            .parent()
            .map(|p| cwd.join(p))
            .unwrap_or_else(|| cwd.clone());

        Self::from_yaml(&fs::read_to_string(&file)?, &base)
    }

    /// Parse YAML overrides, resolving a relative `dirs.base` against `base`
    pub fn from_yaml(yaml: &str, base: &Path) -> Result<Self> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        config.dirs.base = base.join(expand_home(&config.dirs.base));
        Ok(config)
    }

    /// Resolve a configured path: `~` is the home folder, and relative
    /// paths start from `dirs.base`.
    pub fn path(&self, p: impl AsRef<Path>) -> PathBuf {
        self.dirs.base.join(expand_home(p.as_ref()))
    }

    pub fn slots_dir(&self) -> PathBuf {
        self.path(&self.dirs.slots)
    }

    pub fn slot_dir(&self, group: &str, name: &str) -> PathBuf {
        self.slots_dir().join(group).join(name)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path(&self.game.data)
    }

    pub fn install_dir(&self) -> PathBuf {
        self.path(&self.dirs.game)
    }
}

fn expand_home(p: &Path) -> PathBuf {
    match (p.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => p.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_yaml("", Path::new("/srv/spd")).unwrap();
        assert_eq!(config.default_slot, "default");
        assert_eq!(config.backup_slot, "bak");
        assert_eq!(config.slots_dir(), PathBuf::from("/srv/spd/slots"));
        assert_eq!(config.install_dir(), PathBuf::from("/srv/spd/game"));
        assert_eq!(
            config.slot_dir("auto", "floor5"),
            PathBuf::from("/srv/spd/slots/auto/floor5")
        );
    }

    #[test]
    fn yaml_overrides() {
        let yaml = "
dirs:
  slots: /var/saves
default_slot: main
game:
  data: data
";
        let config = Config::from_yaml(yaml, Path::new("/srv/spd")).unwrap();
        assert_eq!(config.default_slot, "main");
        assert_eq!(config.backup_slot, "bak");
        assert_eq!(config.slots_dir(), PathBuf::from("/var/saves"));
        assert_eq!(config.data_dir(), PathBuf::from("/srv/spd/data"));
        assert_eq!(config.game.cmd, "bin/Shattered Pixel Dungeon");
        assert_eq!(config.game.ns, VANILLA_NS);
    }

    #[test]
    fn home_is_expanded() {
        if let Some(home) = dirs::home_dir() {
            let config = Config::default();
            assert!(config.data_dir().starts_with(home));
        }
    }

    #[test]
    fn bad_yaml_is_an_error() {
        assert!(Config::from_yaml("dirs: [1, 2", Path::new("/")).is_err());
    }
}
