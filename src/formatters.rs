//! Formatters - Different output formatters for task results

use crate::task_result::TaskResult;
use std::io::Write;

/// Formatter trait
pub trait Formatter {
    fn format(&self, result: &TaskResult) -> String;
    fn write_to(&self, result: &TaskResult, writer: &mut dyn Write) -> std::io::Result<()> {
        write!(writer, "{}", self.format(result))
    }
}

fn report(result: &TaskResult) -> String {
    let mut out = result.output.clone();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Shell formatter - the report followed by a colored status line
pub struct ShellFormatter;

impl Formatter for ShellFormatter {
    fn format(&self, result: &TaskResult) -> String {
        let mut out = report(result);

        if let Some(ref message) = result.message {
            let prefix = if result.success {
                "\x1b[32m✓\x1b[0m"
            } else {
                "\x1b[31m✗\x1b[0m"
            };
            out.push_str(&format!(
                "{} {}: {}\n",
                prefix,
                result.operation.to_string().to_uppercase(),
                message
            ));
        }

        out
    }
}

/// Text formatter - plain report and message
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format(&self, result: &TaskResult) -> String {
        let mut out = report(result);
        if let Some(ref message) = result.message {
            out.push_str(message);
            out.push('\n');
        }
        out
    }
}

/// JSON formatter - returns the serialized result
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, result: &TaskResult) -> String {
        let json = serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string());
        format!("{}\n", json)
    }
}

/// Formatters module - factory for creating formatters
pub struct Formatters;

impl Formatters {
    pub fn by_name(name: &str) -> Box<dyn Formatter> {
        match name.to_lowercase().as_str() {
            "shell" => Box::new(ShellFormatter),
            "text" => Box::new(TextFormatter),
            "json" => Box::new(JsonFormatter),
            _ => Box::new(ShellFormatter),
        }
    }
}
