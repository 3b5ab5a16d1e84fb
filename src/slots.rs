//! Slots - Archived copies of data folders, grouped by category
//!
//! Slots live under `<root>/<group>/<name>`. Names form a flat namespace per
//! group and are addressed either as `name` (in the default group) or as
//! `group.name`.

use crate::{datadir::Profile, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// A slot reference, parsed from `name` or `group.name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotName<'a> {
    pub group: &'a str,
    pub name: &'a str,
}

impl<'a> SlotName<'a> {
    pub fn parse(input: &'a str, default_group: &'a str) -> Self {
        match input.split_once('.') {
            Some((group, name)) => Self { group, name },
            None => Self {
                group: default_group,
                name: input,
            },
        }
    }
}

impl std::fmt::Display for SlotName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Every profile found in a set of slot groups, newest first
#[derive(Debug, Clone)]
pub struct Slots {
    pub root_dir: PathBuf,
    pub subdirs: Vec<String>,
    pub default_subdir: String,
    pub slots: Vec<Profile>,
}

impl Slots {
    /// Scan `subdirs` of `root_dir` for profiles.
    ///
    /// Missing group folders count as empty, and folders that are not
    /// profiles are left out.
    pub fn new(root_dir: impl AsRef<Path>, subdirs: &[&str], default_subdir: &str) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();

        let mut slots = Vec::new();
        for subdir in subdirs {
            let group_dir = root_dir.join(subdir);
            if !group_dir.is_dir() {
                continue;
            }

            for entry in fs::read_dir(&group_dir)? {
                let path = entry?.path();
                if Profile::is_profile_dir(&path) {
                    slots.push(Profile::new(&path)?);
                }
            }
        }
        slots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        debug!("{} slots found in {}", slots.len(), subdirs.join("+"));

        Ok(Self {
            root_dir,
            subdirs: subdirs.iter().map(|s| s.to_string()).collect(),
            default_subdir: default_subdir.to_string(),
            slots,
        })
    }

    /// Slot groups represented, joined with '+'
    pub fn name(&self) -> String {
        self.subdirs.join("+")
    }

    /// Look up a slot by `name` or `group.name`
    pub fn get_slot(&self, slot_name: &str) -> Option<&Profile> {
        let wanted = SlotName::parse(slot_name, &self.default_subdir);
        self.slots
            .iter()
            .find(|p| p.name == wanted.name && p.group == wanted.group)
    }

    /// The most recently modified slot
    pub fn latest(&self) -> Option<&Profile> {
        self.slots.first()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files;
    use serde_json::json;
    use tempfile::TempDir;

    fn make_slot(root: &Path, group: &str, name: &str, journal: bool) {
        let dir = root.join(group).join(name);
        fs::create_dir_all(&dir).unwrap();
        files::write_dat(&dir.join("rankings.dat"), &json!({"won": 0})).unwrap();
        if journal {
            files::write_dat(&dir.join("journal.dat"), &json!({})).unwrap();
        }
    }

    #[test]
    fn parses_slot_names() {
        assert_eq!(
            SlotName::parse("tengu", "manual"),
            SlotName {
                group: "manual",
                name: "tengu"
            }
        );
        assert_eq!(
            SlotName::parse("auto.floor3", "manual"),
            SlotName {
                group: "auto",
                name: "floor3"
            }
        );
        assert_eq!(SlotName::parse("backup.bak", "manual").to_string(), "backup.bak");
    }

    #[test]
    fn bare_and_dotted_names_match() {
        let tmp = TempDir::new().unwrap();
        make_slot(tmp.path(), "manual", "tengu", true);
        make_slot(tmp.path(), "backup", "tengu", true);

        let slots = Slots::new(tmp.path(), &["manual", "backup"], "manual").unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.name(), "manual+backup");

        let bare = slots.get_slot("tengu").unwrap();
        let dotted = slots.get_slot("manual.tengu").unwrap();
        assert_eq!(bare, dotted);
        assert_eq!(bare.group, "manual");
        assert_eq!(slots.get_slot("backup.tengu").unwrap().group, "backup");
    }

    #[test]
    fn unknown_slots_are_none() {
        let tmp = TempDir::new().unwrap();
        make_slot(tmp.path(), "manual", "tengu", true);

        let slots = Slots::new(tmp.path(), &["manual"], "manual").unwrap();
        assert!(slots.get_slot("default").is_none());
        assert!(slots.get_slot("manuel.tengu").is_none());
        assert!(slots.get_slot("auto.tengu").is_none());
    }

    #[test]
    fn missing_groups_and_non_profiles_are_skipped() {
        let tmp = TempDir::new().unwrap();
        make_slot(tmp.path(), "manual", "tengu", true);
        make_slot(tmp.path(), "manual", "settingsonly", false);
        fs::write(tmp.path().join("manual").join("notes.txt"), "hi").unwrap();

        let slots = Slots::new(tmp.path(), &["manual", "auto", "backup"], "manual").unwrap();
        assert_eq!(slots.len(), 1);
        assert!(slots.get_slot("settingsonly").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_slots_are_found_by_link_name() {
        let tmp = TempDir::new().unwrap();
        let slots_dir = tmp.path().join("slots");
        make_slot(tmp.path(), "store", "realname", true);
        fs::create_dir_all(slots_dir.join("manual")).unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("store").join("realname"),
            slots_dir.join("manual").join("tengu"),
        )
        .unwrap();

        let slots = Slots::new(&slots_dir, &["manual"], "manual").unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots.slots[0].name, "tengu");
        assert_eq!(slots.slots[0].group, "manual");
        assert!(slots.get_slot("tengu").is_some());
        assert!(slots.get_slot("realname").is_none());
    }

    #[test]
    fn empty_root() {
        let tmp = TempDir::new().unwrap();
        let slots = Slots::new(tmp.path().join("nothing"), &["manual"], "manual").unwrap();
        assert!(slots.is_empty());
        assert!(slots.latest().is_none());
    }
}
