//! Inspect - Walking through dat file contents
//!
//! Values are flattened into rows, one per node, each carrying the path of
//! keys and indexes that leads to it. Objects and strings naming a game class
//! are tagged with the namespace they belong to.

use crate::config::VANILLA_NS;
use crate::{
    ICON_ARRAY, ICON_BOOL, ICON_FLOAT, ICON_FORK, ICON_GAME, ICON_INTEGER, ICON_NULL,
    ICON_OBJECT, ICON_STRING, ICON_UNKNOWN,
};
use log::debug;
use serde::Serialize;
use serde_json::Value;

/// A class name split from its Java package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTag<'a> {
    /// Empty when the package is not a known one
    pub namespace: &'a str,
    pub class: &'a str,
    pub vanilla: bool,
    pub icon: &'static str,
}

/// Separate a class name from the vanilla package or the configured fork's
pub fn tag_class<'a>(object_name: &'a str, fork_ns: &str) -> ClassTag<'a> {
    for ns in [fork_ns, VANILLA_NS] {
        let class = object_name
            .strip_prefix(ns)
            .and_then(|rest| rest.strip_prefix('.'));
        if let Some(class) = class {
            let vanilla = ns == VANILLA_NS;
            return ClassTag {
                namespace: &object_name[..ns.len()],
                class,
                vanilla,
                icon: if vanilla { ICON_GAME } else { ICON_FORK },
            };
        }
    }

    debug!("unknown namespace for {}, set game.ns for forks", object_name);
    ClassTag {
        namespace: "",
        class: object_name,
        vanilla: false,
        icon: ICON_UNKNOWN,
    }
}

/// One node of a walked value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpRow {
    /// Keys and indexes above this node
    pub breadcrumb: Vec<String>,
    pub title: String,
    pub kind: &'static str,
    pub summary: String,
    /// Number of children, for objects and arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl DumpRow {
    /// Indented display line. Non-empty containers get a blank line first.
    pub fn render(&self) -> String {
        let newline = if self.size.unwrap_or(0) > 0 { "\n" } else { "" };
        format!(
            "{}{}{} {} <{}> {}: {}",
            newline,
            "  ".repeat(self.breadcrumb.len()),
            self.breadcrumb.join("."),
            self.title,
            self.kind,
            kind_icon(self.kind),
            self.summary
        )
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::Bool(_) => "bool",
        Value::Null => "null",
    }
}

fn kind_icon(kind: &str) -> &'static str {
    match kind {
        "object" => ICON_OBJECT,
        "array" => ICON_ARRAY,
        "string" => ICON_STRING,
        "float" => ICON_FLOAT,
        "integer" => ICON_INTEGER,
        "bool" => ICON_BOOL,
        _ => ICON_NULL,
    }
}

fn looks_like_class(s: &str) -> bool {
    s.split('.').count() >= 3 && !s.contains(' ')
}

fn summarize(value: &Value, fork_ns: &str) -> String {
    match value {
        Value::Object(map) => match map.get("__className").and_then(Value::as_str) {
            Some(name) => {
                let tag = tag_class(name, fork_ns);
                format!("{} {}, {} values", tag.icon, tag.class, map.len())
            }
            None => format!("{} values", map.len()),
        },
        Value::Array(items) => format!("{} values", items.len()),
        Value::String(s) if looks_like_class(s) => {
            let tag = tag_class(s, fork_ns);
            format!("{} {}", tag.icon, tag.class)
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten `value` into rows, parents before their children.
///
/// `depth` limits how many levels below `value` are walked: `Some(0)` only
/// describes `value` itself, `None` walks everything.
pub fn dump_rows(value: &Value, title: &str, depth: Option<usize>, fork_ns: &str) -> Vec<DumpRow> {
    let mut rows = Vec::new();
    walk(value, title, depth, fork_ns, &mut Vec::new(), &mut rows);
    rows
}

fn walk(
    value: &Value,
    title: &str,
    depth: Option<usize>,
    fork_ns: &str,
    breadcrumb: &mut Vec<String>,
    rows: &mut Vec<DumpRow>,
) {
    let size = match value {
        Value::Object(map) => Some(map.len()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    };
    rows.push(DumpRow {
        breadcrumb: breadcrumb.clone(),
        title: title.to_string(),
        kind: kind(value),
        summary: summarize(value, fork_ns),
        size,
    });

    let depth = match depth {
        Some(0) => return,
        other => other.map(|d| d - 1),
    };

    breadcrumb.push(title.to_string());
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                walk(child, key, depth, fork_ns, breadcrumb, rows);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, &format!("[{}]", i), depth, fork_ns, breadcrumb, rows);
            }
        }
        _ => {}
    }
    breadcrumb.pop();
}

/// Walk a dot separated path (`hero.belongings.0`) into a JSON value
pub fn select_entity<'v>(
    value: &'v Value,
    entity: &str,
) -> std::result::Result<&'v Value, String> {
    let mut current = value;
    for item in entity.split('.') {
        current = match current {
            Value::Array(items) => {
                let index: usize = item
                    .parse()
                    .map_err(|_| format!("Entity {} not found.", entity))?;
                items
                    .get(index)
                    .ok_or_else(|| format!("Index {} out of range.", index))?
            }
            Value::Object(map) => map
                .get(item)
                .ok_or_else(|| format!("Entity {} not found.", entity))?,
            _ => return Err(format!("Entity {} not found.", entity)),
        };
    }
    Ok(current)
}
