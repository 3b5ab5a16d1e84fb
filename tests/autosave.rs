mod common;

use common::{config, mock_game_data};
use spdiu::AutoSaveWatcher;
use tempfile::TempDir;

#[test]
fn floor_change_creates_one_autosave() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    mock_game_data(&config);

    let mut watcher = AutoSaveWatcher::new(config.data_dir(), config.slots_dir());
    let log = "[GAME] @@ You descend to floor 5 of the dungeon.";

    assert_eq!(watcher.submit(log).unwrap().as_deref(), Some("floor5"));
    let autosave = config.slot_dir("auto", "floor5");
    assert!(autosave.join("journal.dat").exists());
    assert!(autosave.join("game3").join("game.dat").exists());

    assert_eq!(watcher.submit(log).unwrap(), None);
}

#[test]
fn autosaves_are_loadable_slots() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    mock_game_data(&config);

    let mut watcher = AutoSaveWatcher::new(config.data_dir(), config.slots_dir());
    watcher
        .submit("[GAME] @@ You descend to floor 2 of the dungeon.\n")
        .unwrap();

    let slots = spdiu::Slots::new(config.slots_dir(), &["manual", "auto"], "manual").unwrap();
    let slot = slots.get_slot("auto.floor2").unwrap();
    assert_eq!(slot.group, "auto");
    assert_eq!(slot.games.len(), 3);
}
