//! TaskResult - Encapsulates the outcome of running a task

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Task that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Backup,
    Clean,
    Save,
    Load,
    List,
    Show,
    Dump,
    Watch,
    Gold,
    Energy,
    Bones,
    Consumables,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Backup => write!(f, "backup"),
            Operation::Clean => write!(f, "clean"),
            Operation::Save => write!(f, "save"),
            Operation::Load => write!(f, "load"),
            Operation::List => write!(f, "ls"),
            Operation::Show => write!(f, "show"),
            Operation::Dump => write!(f, "dump"),
            Operation::Watch => write!(f, "watch"),
            Operation::Gold => write!(f, "gold"),
            Operation::Energy => write!(f, "energy"),
            Operation::Bones => write!(f, "bones"),
            Operation::Consumables => write!(f, "consumables"),
        }
    }
}

/// Result of running a task.
///
/// `success` is false when a task refused to act, e.g. because there was
/// no data to copy. Errors that stop a task midway are returned as `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub operation: Operation,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Human readable report, printed before the message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(flatten)]
    pub details: HashMap<String, serde_json::Value>,
}

impl TaskResult {
    pub fn new(operation: Operation, success: bool, message: Option<String>) -> Self {
        Self {
            operation,
            success,
            message,
            output: String::new(),
            details: HashMap::new(),
        }
    }

    pub fn success(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, true, Some(message.into()))
    }

    pub fn failure(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, false, Some(message.into()))
    }

    /// Attach a report
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_detail(mut self, key: &str, value: serde_json::Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    /// Append a line to the report
    pub fn push_line(&mut self, line: impl AsRef<str>) {
        self.output.push_str(line.as_ref());
        self.output.push('\n');
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }

    pub fn add_detail(&mut self, key: String, value: serde_json::Value) {
        self.details.insert(key, value);
    }

    pub fn get_detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_details_inline() {
        let result = TaskResult::success(Operation::Save, "State saved!")
            .with_detail("slot", json!("default"));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "operation": "save",
                "success": true,
                "message": "State saved!",
                "slot": "default",
            })
        );
    }

    #[test]
    fn output_can_be_attached_whole() {
        let result =
            TaskResult::new(Operation::Bones, true, None).with_output("item <object>\n");
        assert_eq!(result.output, "item <object>\n");

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["output"], "item <object>\n");
        assert_eq!(value["operation"], "bones");
    }

    #[test]
    fn report_lines() {
        let mut result = TaskResult::new(Operation::List, true, None);
        result.push_line("first");
        result.push_line("second");
        assert_eq!(result.output, "first\nsecond\n");
        assert!(result.is_success());
    }
}
