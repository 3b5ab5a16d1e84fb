//! Cheats - Tasks that edit the active game data
//!
//! Every cheat works on the active data folder, so make a save first. Game
//! cheats pick a game by name and default to the most recently played one.

use crate::{
    config::Config,
    datadir::{Game, Profile},
    inspect::dump_rows,
    task_result::{Operation, TaskResult},
    tasks::{active_profile, find_game, text, Task, GAME_DAT},
    Error, Result, BULLET_A, BULLET_B, ICON_DATA, ICON_DISC_A, ICON_GAME, ICON_PACKAGE,
};
use log::{info, warn};
use serde_json::{json, Map, Value};

const BONES_DAT: &str = "bones.dat";

enum Target {
    Ready(Profile),
    Refused(TaskResult),
}

fn active_target(operation: Operation, config: &Config) -> Result<Target> {
    Ok(match active_profile(config)? {
        Some(profile) => Target::Ready(profile),
        None => Target::Refused(TaskResult::failure(
            operation,
            "No active game data found. Play a little!",
        )),
    })
}

fn pick_game<'p>(
    operation: Operation,
    profile: &'p Profile,
    game: Option<&str>,
) -> std::result::Result<&'p Game, TaskResult> {
    find_game(profile, game.unwrap_or("")).ok_or_else(|| {
        TaskResult::failure(
            operation,
            "Game not found. 'spdiu show -a' to list active games.",
        )
    })
}

fn object_mut<'v>(game: &Game, data: &'v mut Value) -> Result<&'v mut Map<String, Value>> {
    data.as_object_mut().ok_or_else(|| Error::Malformed {
        path: game.root_dir.join(GAME_DAT),
        reason: "not a JSON object".to_string(),
    })
}

/// Overwrite one number in a game's `game.dat`
fn set_game_number(
    operation: Operation,
    config: &Config,
    game: Option<&str>,
    key: &str,
    label: &str,
    number: i64,
) -> Result<TaskResult> {
    let profile = match active_target(operation, config)? {
        Target::Ready(p) => p,
        Target::Refused(result) => return Ok(result),
    };
    let game = match pick_game(operation, &profile, game) {
        Ok(g) => g,
        Err(result) => return Ok(result),
    };

    let mut data = game.get_dat(GAME_DAT)?;
    let previous = data.get(key).cloned().unwrap_or(Value::Null);
    object_mut(game, &mut data)?.insert(key.to_string(), json!(number));
    game.set_dat(GAME_DAT, &data)?;
    info!("{} of {} set to {}", key, game.name, number);

    let mut result = TaskResult::success(
        operation,
        format!("{} {} set to {}!", ICON_DATA, label, number),
    );
    result.push_line(format!(
        "{} {} {} {}",
        ICON_DISC_A, profile.name, ICON_GAME, game.name
    ));
    result.push_line(format!("Previous {}: {}", label, text(Some(&previous))));

    Ok(result
        .with_detail("game", json!(game.name))
        .with_detail("previous", previous)
        .with_detail(key, json!(number)))
}

/// Set the gold of a game
pub struct GoldTask {
    pub game: Option<String>,
    pub number: i64,
}

impl Task for GoldTask {
    fn operation(&self) -> Operation {
        Operation::Gold
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        set_game_number(
            Operation::Gold,
            config,
            self.game.as_deref(),
            "gold",
            "Gold",
            self.number,
        )
    }
}

/// Set the alchemical energy of a game
pub struct EnergyTask {
    pub game: Option<String>,
    pub number: i64,
}

impl Task for EnergyTask {
    fn operation(&self) -> Operation {
        Operation::Energy
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        set_game_number(
            Operation::Energy,
            config,
            self.game.as_deref(),
            "energy",
            "Alchemical Energy",
            self.number,
        )
    }
}

/// An inventory item: an unidentified, uncursed +0 of `class`, with
/// `overrides` applied on top
pub fn item(ns: &str, class: &str, overrides: Value) -> Value {
    let mut item = json!({
        "__className": format!("{}.items.{}", ns, class),
        "cursedKnown": true,
        "quantity": 1,
        "levelKnown": false,
        "cursed": false,
        "level": 0,
        "uses_left_to_id": 10,
        "kept_lost": false,
        "curse_infusion_bonus": false,
        "augment": "NONE",
        "glyph_hardened": false,
        "mastery_potion_bonus": false,
        "available_uses": 5,
    });
    if let (Some(map), Value::Object(extra)) = (item.as_object_mut(), overrides) {
        map.extend(extra);
    }
    item
}

/// Hero class and item of a bones package. Unknown packages get food.
fn bones_package(package: &str) -> (&'static str, &'static str, Value) {
    match package {
        "plate" => (
            "WARRIOR",
            "armor.PlateArmor",
            json!({"level": 3, "mastery_potion_bonus": true}),
        ),
        "blade" => (
            "DUELIST",
            "weapon.melee.AssassinsBlade",
            json!({"level": 3, "mastery_potion_bonus": true}),
        ),
        "wealth" => ("ROGUE", "rings.RingOfWealth", json!({"level": 3})),
        "reroll" => ("CLERIC", "scrolls.ScrollOfTransmutation", json!({"quantity": 6})),
        "regrowth" => ("HUNTRESS", "wands.WandOfRegrowth", json!({"level": 3})),
        "zip" => ("ROGUE", "artifacts.EtherealChains", json!({})),
        other => {
            if !other.is_empty() {
                warn!("unknown bones package {}, packing food", other);
            }
            ("MAGE", "food.Berry", json!({"quantity": 12}))
        }
    }
}

/// Write the remains a new run finds on the first floors.
///
/// Packages: `plate`, `blade`, `wealth`, `reroll`, `regrowth` and `zip`.
/// Anything else is a dozen berries.
pub struct BonesTask {
    pub package: Option<String>,
    /// Hero class the bones belong to, overriding the package's
    pub hero: Option<String>,
    /// Only show the current bones
    pub display: bool,
}

impl Task for BonesTask {
    fn operation(&self) -> Operation {
        Operation::Bones
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let profile = match active_target(Operation::Bones, config)? {
            Target::Ready(p) => p,
            Target::Refused(result) => return Ok(result),
        };

        if self.display {
            let bones = match profile.get_dat(BONES_DAT) {
                Ok(bones) => bones,
                Err(Error::NotFound(_)) => {
                    return Ok(TaskResult::failure(
                        Operation::Bones,
                        "No bones are set to spawn.",
                    ))
                }
                Err(e) => return Err(e),
            };

            let report: String = dump_rows(&bones, BONES_DAT, None, &config.game.ns)
                .iter()
                .map(|row| format!("{}\n", row.render()))
                .collect();
            return Ok(TaskResult::new(Operation::Bones, true, None)
                .with_output(report)
                .with_detail("bones", bones));
        }

        let (hero_class, class, overrides) = bones_package(self.package.as_deref().unwrap_or(""));
        let hero_class = match self.hero.as_deref() {
            Some(hero) if !hero.is_empty() => hero.to_uppercase(),
            _ => hero_class.to_string(),
        };

        let bones = json!({
            "item": item(&config.game.ns, class, overrides),
            "hero_class": hero_class,
            "level": 1,
            "branch": 0,
        });
        profile.set_dat(BONES_DAT, &bones)?;
        info!("bones of a {} holding {} written", hero_class, class);

        let mut result = TaskResult::success(
            Operation::Bones,
            format!(
                "{} A Small Package of Value Will Come to You, Shortly",
                ICON_PACKAGE
            ),
        );
        result.push_line(format!("{} {} {} Profile data", ICON_DISC_A, profile.name, ICON_DATA));

        Ok(result.with_detail("bones", bones))
    }
}

const CONSUMABLE_KINDS: &[(&str, &str, &str)] = &[
    ("potions", "Potions", "PotionOf"),
    ("rings", "Rings", "RingOf"),
    ("scrolls", "Scrolls", "ScrollOf"),
];

/// List the random looks of potions, rings and scrolls in a game, and
/// whether each one is identified yet
pub struct ConsumablesTask {
    pub game: Option<String>,
}

impl Task for ConsumablesTask {
    fn operation(&self) -> Operation {
        Operation::Consumables
    }

    fn run(&self, config: &Config) -> Result<TaskResult> {
        let profile = match active_target(Operation::Consumables, config)? {
            Target::Ready(p) => p,
            Target::Refused(result) => return Ok(result),
        };
        let game = match pick_game(Operation::Consumables, &profile, self.game.as_deref()) {
            Ok(g) => g,
            Err(result) => return Ok(result),
        };
        let data = game.get_dat(GAME_DAT)?;

        let mut result = TaskResult::new(Operation::Consumables, true, None)
            .with_detail("game", json!(game.name));
        result.push_line(format!(
            "{} {} {} {}",
            ICON_DISC_A, profile.name, ICON_GAME, game.name
        ));
        result.push_line(format!("{}: known | {}: not known", BULLET_A, BULLET_B));

        let labels: Vec<(&String, &Value)> = data
            .as_object()
            .map(|map| map.iter().filter(|(k, _)| k.contains("_label")).collect())
            .unwrap_or_default();

        for (key, title, prefix) in CONSUMABLE_KINDS {
            result.push_line("");
            result.push_line(format!(" {} {}", ICON_DATA, title));

            let mut listed = Vec::new();
            for (label_key, label) in labels.iter().filter(|(k, _)| k.contains(prefix)) {
                let class = label_key.split('_').next().unwrap_or(label_key.as_str());
                let known = data
                    .get(format!("{}_known", class))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let name = class.strip_prefix(prefix).unwrap_or(class);
                let bullet = if known { BULLET_A } else { BULLET_B };

                result.push_line(format!("{}{}: {}", bullet, name, text(Some(*label))));
                listed.push(json!({"name": name, "label": label, "known": known}));
            }
            result.add_detail(key.to_string(), json!(listed));
        }

        Ok(result)
    }
}
