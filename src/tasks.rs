//! Tasks - Save slot operations
//!
//! By convention, a slot is picked by name (`tengu`, a manual save) or with
//! its group (`auto.floor3`, `backup.bak`), and a game inside a slot by its
//! folder name.

use crate::{
    config::Config,
    datadir::{DataDir, Game, Profile},
    files,
    inspect::{dump_rows, select_entity},
    process::GameProcess,
    slots::Slots,
    task_result::{Operation, TaskResult},
    watcher::AutoSaveWatcher,
    Error, Result, ALL_GROUPS, AUTO_GROUP, BACKUP_GROUP, BULLET_A, BULLET_B, ICON_AUTO,
    ICON_BACKUP, ICON_CLEAN, ICON_DATA, ICON_DISC_A, ICON_DISC_B, ICON_GAME, ICON_INSPECT,
    MANUAL_GROUP,
};
use chrono::{DateTime, Local};
use log::{debug, info};
use serde_json::{json, Value};
use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

const PROFILE_DAT: &str = "rankings.dat";
pub(crate) const GAME_DAT: &str = "game.dat";

/// Groups searched by `load --last`. Backups are left out on purpose.
const LAST_GROUPS: &[&str] = &[MANUAL_GROUP, AUTO_GROUP];
const DEFAULT_GROUPS: &[&str] = &[MANUAL_GROUP];

/// Trait for runnable tasks
pub trait Task {
    fn operation(&self) -> Operation;
    fn run(&self, config: &Config) -> Result<TaskResult>;
}

fn format_time(ts: SystemTime, format: &str) -> String {
    let local: DateTime<Local> = ts.into();
    let mut out = String::new();
    if write!(out, "{}", local.format(format)).is_err() {
        out = local.to_rfc3339();
    }
    out
}

fn epoch_secs(ts: SystemTime) -> u64 {
    ts.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn slot_label(profile: &Profile) -> String {
    format!("{}.{}", profile.group, profile.name)
}

/// The active data folder, or None if the game has not made one yet
pub(crate) fn active_profile(config: &Config) -> Result<Option<Profile>> {
    match Profile::new(config.data_dir()) {
        Ok(p) => Ok(Some(p)),
        Err(Error::DirectoryNotFound(_) | Error::MissingMarker { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// A game by name, or the most recently played one for an empty name
pub(crate) fn find_game<'p>(profile: &'p Profile, name: &str) -> Option<&'p Game> {
    if name.is_empty() {
        profile.latest_game()
    } else {
        profile.get_game(name)
    }
}

fn all_slots(config: &Config) -> Result<Slots> {
    Slots::new(config.slots_dir(), ALL_GROUPS, MANUAL_GROUP)
}

/// Copy the active data into the backup slot
pub struct BackupTask;

impl Task for BackupTask {
    fn operation(&self) -> Operation {
        Operation::Backup
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let dest = config.slot_dir(BACKUP_GROUP, &config.backup_slot);

        match files::replace(&config.data_dir(), &dest) {
            Ok(()) => {
                let slot = format!("{}.{}", BACKUP_GROUP, config.backup_slot);
                info!("backed up active data to {}", slot);
                Ok(TaskResult::success(
                    Operation::Backup,
                    format!("Active state backup created! {} {}", ICON_BACKUP, slot),
                )
                .with_detail("slot", json!(slot)))
            }
            Err(Error::NotFound(_)) => Ok(TaskResult::failure(
                Operation::Backup,
                "Aborting! There seems to be no active data folder.",
            )),
            Err(e) => Err(e),
        }
    }
}

/// Delete every saved state, then back up the active data
pub struct CleanTask;

impl Task for CleanTask {
    fn operation(&self) -> Operation {
        Operation::Clean
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        if !config.data_dir().exists() {
            return Ok(TaskResult::failure(
                Operation::Clean,
                "Aborting! There seems to be no active data folder.",
            ));
        }

        let slots = all_slots(config)?;
        for profile in &slots.slots {
            files::remove(&profile.root_dir)?;
        }

        let backup = BackupTask.run(config)?;

        let mut result = TaskResult::success(
            Operation::Clean,
            format!("{} {} saved states deleted.", ICON_CLEAN, slots.len()),
        )
        .with_detail("deleted", json!(slots.len()));
        if let Some(message) = backup.message {
            result.push_line(message);
        }

        Ok(result)
    }
}

/// Copy the active data into a manual slot
pub struct SaveTask {
    pub slot: Option<String>,
}

impl Task for SaveTask {
    fn operation(&self) -> Operation {
        Operation::Save
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let slot = self.slot.as_deref().unwrap_or(&config.default_slot);

        if slot.is_empty() || !slot.chars().all(char::is_alphanumeric) {
            return Ok(TaskResult::failure(
                Operation::Save,
                "Aborting! Names can only contain alphanumeric characters.",
            ));
        }

        let src = config.data_dir();
        if !src.exists() {
            return Ok(TaskResult::failure(
                Operation::Save,
                "No game data found to save!",
            ));
        }

        let dest = config.slot_dir(MANUAL_GROUP, slot);
        let mut result = TaskResult::success(
            Operation::Save,
            format!("State saved! {} {}", ICON_DISC_B, slot),
        )
        .with_detail("slot", json!(format!("{}.{}", MANUAL_GROUP, slot)));

        // Overwritten saves survive in the backup group under the same name
        if dest.exists() {
            files::replace(&dest, &config.slot_dir(BACKUP_GROUP, slot))?;
            result.push_line(format!(
                "Previous save preserved as {} {}.{}",
                ICON_BACKUP, BACKUP_GROUP, slot
            ));
        }

        files::replace(&src, &dest)?;
        Ok(result)
    }
}

/// Restore a slot, or a single game from it, into the active data
pub struct LoadTask {
    /// Load the newest manual or auto save. Backups are never picked.
    pub last: bool,
    pub slot: Option<String>,
    /// Only replace this game, keeping the rest of the active profile
    pub game: Option<String>,
}

impl LoadTask {
    fn find_profile(&self, config: &Config) -> Result<std::result::Result<Profile, String>> {
        let slots_dir = config.slots_dir();

        if self.last {
            let slots = Slots::new(&slots_dir, LAST_GROUPS, MANUAL_GROUP)?;
            return Ok(slots
                .latest()
                .cloned()
                .ok_or_else(|| "No saves found. Make some with 'spdiu save [slot]'".to_string()));
        }

        let (groups, name) = match self.slot.as_deref() {
            Some(slot) => (ALL_GROUPS, slot),
            None => (DEFAULT_GROUPS, config.default_slot.as_str()),
        };

        let slots = Slots::new(&slots_dir, groups, MANUAL_GROUP)?;
        Ok(slots.get_slot(name).cloned().ok_or_else(|| {
            format!(
                "Invalid slot name: {} - 'spdiu ls' to list existing slots.",
                name
            )
        }))
    }
}

impl Task for LoadTask {
    fn operation(&self) -> Operation {
        Operation::Load
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let profile = match self.find_profile(config)? {
            Ok(p) => p,
            Err(message) => return Ok(TaskResult::failure(Operation::Load, message)),
        };

        let game = match self.game.as_deref() {
            None => None,
            Some(name) => match profile.get_game(name) {
                Some(g) => Some(g),
                None => {
                    return Ok(TaskResult::failure(
                        Operation::Load,
                        format!(
                            "Game not found in slot. 'spdiu show -s {}' to list existing games.",
                            slot_label(&profile)
                        ),
                    ))
                }
            },
        };

        let mut result = TaskResult::new(Operation::Load, true, None)
            .with_detail("slot", json!(slot_label(&profile)));

        if profile.name != config.backup_slot {
            if let Some(message) = BackupTask.run(config)?.message {
                result.push_line(message);
            }
        }

        let active = config.data_dir();
        match game {
            None => {
                files::replace(&profile.root_dir, &active)?;
                result.message = Some(format!(
                    "State loaded! {} {}",
                    ICON_DISC_A,
                    slot_label(&profile)
                ));
            }
            Some(game) => {
                files::replace(&game.root_dir, &active.join(&game.name))?;
                result.message = Some(format!(
                    "Game loaded! {} {} {} {}",
                    ICON_DISC_A,
                    slot_label(&profile),
                    ICON_GAME,
                    game.name
                ));
                result.add_detail("game".to_string(), json!(game.name));
            }
        }

        Ok(result)
    }
}

/// List saved states oldest to newest, then the active data
pub struct ListTask;

impl Task for ListTask {
    fn operation(&self) -> Operation {
        Operation::List
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let Some(active) = active_profile(config)? else {
            return Ok(TaskResult::failure(
                Operation::List,
                format!(
                    "No active slot found at {}. Play a little!",
                    config.data_dir().display()
                ),
            ));
        };

        let slots = all_slots(config)?;
        let latest = slots.latest();
        let active_is_latest = latest.map_or(true, |l| active.timestamp > l.timestamp);

        let mut result = TaskResult::new(Operation::List, true, None);
        result.push_line(format!(
            "Displaying {} save slots, oldest to newest:",
            slots.len()
        ));

        let mut listed = Vec::new();
        for profile in slots.slots.iter().rev() {
            let is_latest = latest == Some(profile);
            let bullet = if is_latest { BULLET_A } else { BULLET_B };
            let disc = match profile.group.as_str() {
                BACKUP_GROUP => ICON_BACKUP,
                AUTO_GROUP => ICON_AUTO,
                _ if is_latest && !active_is_latest => ICON_DISC_A,
                _ => ICON_DISC_B,
            };
            let prefix = if profile.group == MANUAL_GROUP {
                String::new()
            } else {
                format!("{}.", profile.group)
            };

            result.push_line(format!(
                "{}{} {} {}{}",
                bullet,
                format_time(profile.timestamp, &config.time_format),
                disc,
                prefix,
                profile.name
            ));
            listed.push(json!({
                "group": profile.group,
                "name": profile.name,
                "timestamp": epoch_secs(profile.timestamp),
                "games": profile.games.len(),
            }));
        }

        let (bullet, disc) = if active_is_latest {
            (BULLET_A, ICON_DISC_A)
        } else {
            (BULLET_B, ICON_DISC_B)
        };
        result.push_line("");
        result.push_line("Active slot:");
        result.push_line(format!(
            "{}{} {} {}",
            bullet,
            format_time(active.timestamp, &config.time_format),
            disc,
            active.name
        ));

        Ok(result.with_detail("slots", json!(listed)).with_detail(
            "active",
            json!({
                "name": active.name,
                "timestamp": epoch_secs(active.timestamp),
                "games": active.games.len(),
                "latest": active_is_latest,
            }),
        ))
    }
}

fn optional_dat(dir: &DataDir, dat_file: &str) -> Result<Option<Value>> {
    if dir.has_dat(dat_file) {
        dir.get_dat(dat_file).map(Some)
    } else {
        Ok(None)
    }
}

pub(crate) fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => "?".to_string(),
    }
}

fn count(value: Option<&Value>) -> usize {
    match value {
        Some(Value::Array(a)) => a.len(),
        Some(Value::Object(o)) => o.len(),
        _ => 0,
    }
}

fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

fn last_segment(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

/// One line summary of a `Rankings$Record`, matched by class name only so
/// records from forks work too.
fn summarize_record(record: &Value) -> Option<String> {
    let class_name = record.get("__className")?.as_str()?;
    if last_segment(class_name) != "Rankings$Record" {
        return None;
    }

    let score = record.get("score").and_then(Value::as_i64).unwrap_or(0);
    let mut line = format!(
        "{}  l{:<2} {:<10}{:>9}  ",
        text(record.get("date")),
        text(record.get("level")),
        text(record.get("class")),
        thousands(score)
    );

    let flag = |key: &str| record.get(key).and_then(Value::as_bool).unwrap_or(false);
    if flag("win") && flag("ascending") {
        line.push_str("Ascended with the Amulet.");
    } else if flag("win") {
        line.push_str("Obtained the Amulet.");
    } else {
        let cause = text(record.get("cause"));
        line.push_str(&format!(
            "Died by {} on depth {}.",
            last_segment(&cause),
            text(record.get("depth"))
        ));
    }

    Some(line)
}

/// Summarize a slot: settings, unlocks, rankings and games
pub struct ShowTask {
    pub slot: Option<String>,
    /// Show the active data instead of a slot
    pub active: bool,
}

impl ShowTask {
    fn profile_report(&self, profile: &Profile, config: &Config) -> Result<Vec<String>> {
        let mut lines = vec![String::new(), "Profile information:".to_string()];

        let settings = profile.get_settings()?;
        lines.push(format!("{}{} options set.", BULLET_B, settings.len()));

        if let Some(badges) = optional_dat(profile, "badges.dat")? {
            lines.push(format!(
                "{}{} badges and related unlocks.",
                BULLET_B,
                count(badges.get("badges"))
            ));
        }

        if let Some(bones) = optional_dat(profile, "bones.dat")? {
            match bones.get("hero_class") {
                None => lines.push(format!("{}No character bones are set to spawn.", BULLET_B)),
                Some(hero) => lines.push(format!(
                    "{}{} bones at level {}, branch {}.",
                    BULLET_A,
                    text(Some(hero)),
                    text(bones.get("level")),
                    text(bones.get("branch"))
                )),
            }
        }

        if let Some(journal) = optional_dat(profile, "journal.dat")? {
            lines.push(format!(
                "{}Bestiary: {} mobs seen.",
                BULLET_B,
                count(journal.get("bestiary_seen"))
            ));
            lines.push(format!(
                "{}Catalog: {} items seen.",
                BULLET_B,
                count(journal.get("catalog_seen"))
            ));

            let documents: usize = journal
                .get("documents")
                .and_then(Value::as_object)
                .map_or(0, |docs| docs.values().map(|d| count(Some(d))).sum());
            lines.push(format!(
                "{}{} tutorials and notes discovered.",
                BULLET_B, documents
            ));
        }

        if let Some(ranks) = optional_dat(profile, PROFILE_DAT)? {
            lines.push(format!(
                "{}{} games won out of {} played.",
                BULLET_A,
                text(ranks.get("won")),
                text(ranks.get("total"))
            ));

            let records = ranks.get("records").and_then(Value::as_array);
            let latest = ranks
                .get("latest")
                .and_then(Value::as_u64)
                .and_then(|i| records.and_then(|r| r.get(i as usize)));

            if let Some(record) = latest {
                lines.push(format!(
                    "{}{} stored ranking records.",
                    BULLET_A,
                    records.map_or(0, Vec::len)
                ));
                if let Some(summary) = summarize_record(record) {
                    lines.push(format!("{}Latest run:", BULLET_B));
                    lines.push(format!("    {}", summary));
                }
            }

            if let Some(summary) = ranks.get("latest_daily").and_then(summarize_record) {
                lines.push(format!("{}Latest daily:", BULLET_B));
                lines.push(format!("    {}", summary));
            }
        }

        lines.push(String::new());
        lines.push(format!("{} {} games found:", ICON_GAME, profile.games.len()));
        let newest = profile.latest_game();
        for game in profile.games.iter().rev() {
            let bullet = if Some(game) == newest { BULLET_A } else { BULLET_B };
            lines.push(format!(
                "{}{} {} {}",
                bullet,
                format_time(game.timestamp, &config.time_format),
                ICON_GAME,
                game.name
            ));
        }

        Ok(lines)
    }
}

impl Task for ShowTask {
    fn operation(&self) -> Operation {
        Operation::Show
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let (profile, heading) = if self.active {
            match active_profile(config)? {
                Some(p) => (p, format!("Showing {} Active game data", ICON_DISC_A)),
                None => {
                    return Ok(TaskResult::failure(
                        Operation::Show,
                        "No active game data found. Play a little!",
                    ))
                }
            }
        } else {
            let name = self.slot.as_deref().unwrap_or(&config.default_slot);
            match all_slots(config)?.get_slot(name) {
                Some(p) => (
                    p.clone(),
                    format!("Showing details for slot {} {}", ICON_DISC_B, name),
                ),
                None => {
                    return Ok(TaskResult::failure(
                        Operation::Show,
                        format!(
                            "Invalid slot name: {} - 'spdiu ls' to list existing slots.",
                            name
                        ),
                    ))
                }
            }
        };

        let mut result = TaskResult::new(Operation::Show, true, None)
            .with_detail("slot", json!(slot_label(&profile)))
            .with_detail(
                "games",
                json!(profile.games.iter().map(|g| &g.name).collect::<Vec<_>>()),
            );

        result.push_line(heading);
        for line in self.profile_report(&profile, config)? {
            result.push_line(line);
        }

        Ok(result)
    }
}

/// Walk through a dat file, or part of one, row by row
pub struct DumpTask {
    pub slot: Option<String>,
    /// `Some("")` picks the most recently played game
    pub game: Option<String>,
    pub file: Option<String>,
    pub entity: Option<String>,
    /// How many levels to walk below the selected value, all when unset
    pub levels: Option<usize>,
}

impl Task for DumpTask {
    fn operation(&self) -> Operation {
        Operation::Dump
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let (profile, disc) = match self.slot.as_deref() {
            None => (active_profile(config)?, ICON_DISC_A),
            Some(name) => (all_slots(config)?.get_slot(name).cloned(), ICON_DISC_B),
        };
        let Some(profile) = profile else {
            return Ok(TaskResult::failure(Operation::Dump, "Slot not found."));
        };
        let mut selection = format!("{} {}", disc, slot_label(&profile));

        let game = match self.game.as_deref() {
            None => None,
            Some(name) => match find_game(&profile, name) {
                Some(g) => Some(g),
                None => return Ok(TaskResult::failure(Operation::Dump, "Game not found in slot.")),
            },
        };

        let (parent, default_file): (&DataDir, &str) = match game {
            Some(g) => {
                selection.push_str(&format!(" {} {}", ICON_GAME, g.name));
                (&**g, GAME_DAT)
            }
            None => (&*profile, PROFILE_DAT),
        };
        let file = self.file.as_deref().unwrap_or(default_file);
        debug!("dumping {} from {}", file, parent.root_dir.display());

        let data = match parent.get_dat(file) {
            Ok(data) => data,
            Err(Error::NotFound(path)) => {
                return Ok(TaskResult::failure(
                    Operation::Dump,
                    format!(
                        "The .dat file requested does not exist: {}",
                        path.display()
                    ),
                ))
            }
            Err(e) => return Err(e),
        };

        let (value, name, title) = match self.entity.as_deref() {
            None | Some("") => (
                &data,
                format!("{} \"{}\"", ICON_INSPECT, file),
                format!("Displaying the complete {} {}", ICON_DATA, file),
            ),
            Some(entity) => match select_entity(&data, entity) {
                Ok(v) => (
                    v,
                    format!("{} {}", last_segment(entity), ICON_INSPECT),
                    format!("Inspecting {} {} in {} {}", ICON_INSPECT, entity, ICON_DATA, file),
                ),
                Err(message) => return Ok(TaskResult::failure(Operation::Dump, message)),
            },
        };

        let rows = dump_rows(value, &name, self.levels, &config.game.ns);

        let mut result = TaskResult::new(Operation::Dump, true, None)
            .with_detail("file", json!(file))
            .with_detail("value", value.clone())
            .with_detail("rows", json!(rows));
        result.push_line(title);
        result.push_line(selection);
        for row in &rows {
            result.push_line(row.render());
        }

        Ok(result)
    }
}

/// Run the game, autosaving whenever the hero changes floors
pub struct WatchTask;

impl Task for WatchTask {
    fn operation(&self) -> Operation {
        Operation::Watch
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let game = match GameProcess::new(config.install_dir(), &config.game.cmd) {
            Ok(game) => game,
            Err(Error::Process(message)) => {
                return Ok(TaskResult::failure(Operation::Watch, message))
            }
            Err(e) => return Err(e),
        };

        let mut watcher = AutoSaveWatcher::new(config.data_dir(), config.slots_dir());
        let mut autosaves = Vec::new();

        let status = game.run(|log| {
            if let Some(name) = watcher.submit(log)? {
                println!("{}Autosave {} {}.{}", BULLET_B, ICON_AUTO, AUTO_GROUP, name);
                autosaves.push(name);
            }
            Ok(())
        })?;

        Ok(TaskResult::new(
            Operation::Watch,
            status.success(),
            Some(format!("Game exited, {} autosaves made.", autosaves.len())),
        )
        .with_detail("autosaves", json!(autosaves))
        .with_detail("exit_code", json!(status.code())))
    }
}
