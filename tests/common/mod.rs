#![allow(dead_code)]

use serde_json::json;
use spdiu::{files, Config};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

pub const GROUPS: [&str; 2] = ["manual", "backup"];
pub const SAVES: [&str; 3] = ["floor3", "floor12", "tengu"];

pub fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn touch(path: &Path, secs: u64) {
    File::open(path).unwrap().set_modified(at(secs)).unwrap();
}

/// Set the modification time of a whole tree
pub fn age(path: &Path, secs: u64) {
    for entry in walkdir::WalkDir::new(path).contents_first(true) {
        touch(entry.unwrap().path(), secs);
    }
}

/// A config rooted in a temporary folder, with the active data in `data`
pub fn config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.dirs.base = tmp.path().join("base");
    config.game.data = tmp.path().join("data");
    config
}

/// Build a profile folder with settings, rankings, journal and `games` games
pub fn build_profile(path: &Path, games: usize) {
    fs::create_dir_all(path).unwrap();

    let mut settings = BTreeMap::new();
    settings.insert("scale".to_string(), "3".to_string());
    settings.insert("fullscreen".to_string(), "false".to_string());
    files::write_settings(&path.join("settings.xml"), &settings).unwrap();

    files::write_dat(
        &path.join("rankings.dat"),
        &json!({"won": 5, "total": 10, "records": []}),
    )
    .unwrap();
    files::write_dat(
        &path.join("journal.dat"),
        &json!({
            "bestiary_classes": [],
            "bestiary_seen": [],
            "catalog_uses": [],
            "documents": {},
            "bestiary_encounters": [],
            "catalog_seen": [],
            "catalog_classes": [],
        }),
    )
    .unwrap();

    for i in 1..=games {
        let game = path.join(format!("game{}", i));
        fs::create_dir_all(&game).unwrap();
        files::write_dat(&game.join("game.dat"), &json!({"won": false, "hero": {"HP": 130}}))
            .unwrap();
    }
}

/// Active data with three games
pub fn mock_game_data(config: &Config) -> PathBuf {
    let data = config.data_dir();
    build_profile(&data, 3);
    data
}

/// manual and backup slots named floor3, floor12 and tengu, two games each
pub fn mock_slots(config: &Config) -> PathBuf {
    let slots = config.slots_dir();
    for group in GROUPS {
        for save in SAVES {
            build_profile(&slots.join(group).join(save), 2);
        }
    }
    slots
}
