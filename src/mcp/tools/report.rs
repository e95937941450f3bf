//! phpcs `--report=json` parsing and rendering
//!
//! Fields are read leniently: a missing, `null` or oddly typed value falls
//! back to zero or the empty string instead of rejecting the report. Files
//! are kept in the order phpcs printed them.

use serde_json::Value;

/// Text used when phpcs printed nothing parseable and nothing at all
pub const EMPTY_OUTPUT_MESSAGE: &str = "No output from phpcs.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhpcsReport {
    pub totals: Totals,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub errors: i64,
    pub warnings: i64,
    pub fixable: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub message: String,
    pub source: String,
    pub kind: String,
    pub line: i64,
    pub column: i64,
}

impl PhpcsReport {
    /// Parse phpcs JSON output; `None` when it is not a JSON object or array
    #[inline]
    pub fn parse(output: &str) -> Option<Self> {
        serde_json::from_str::<Value>(output)
            .ok()
            .and_then(|data| Self::from_value(&data))
    }

    #[inline]
    pub fn from_value(data: &Value) -> Option<Self> {
        if !data.is_object() && !data.is_array() {
            return None;
        }

        let totals = &data["totals"];
        let files = members(&data["files"])
            .into_iter()
            .map(|(path, info)| FileReport {
                path,
                messages: members(&info["messages"])
                    .into_iter()
                    .map(|(_, message)| Message::from_value(message))
                    .collect(),
            })
            .collect();

        Some(Self {
            totals: Totals {
                errors: to_int(&totals["errors"]),
                warnings: to_int(&totals["warnings"]),
                fixable: to_int(&totals["fixable"]),
            },
            files,
        })
    }

    /// True when phpcs reported any error or warning
    #[inline]
    pub fn has_findings(&self) -> bool {
        self.totals.errors.saturating_add(self.totals.warnings) > 0
    }

    /// Summary line followed by one block per file with messages
    #[inline]
    pub fn render(&self) -> String {
        let mut lines = vec![format!(
            "Errors: {} | Warnings: {} | Fixable: {}",
            self.totals.errors, self.totals.warnings, self.totals.fixable
        )];

        for file in &self.files {
            if file.messages.is_empty() {
                continue;
            }

            lines.push(String::new());
            lines.push(file.path.clone());
            lines.extend(file.messages.iter().map(Message::render));
        }

        lines.join("\n")
    }
}

impl Message {
    #[inline]
    pub fn from_value(message: &Value) -> Self {
        Self {
            message: to_text(&message["message"]),
            source: to_text(&message["source"]),
            kind: to_text(&message["type"]),
            line: to_int(&message["line"]),
            column: to_int(&message["column"]),
        }
    }

    #[inline]
    pub fn render(&self) -> String {
        format!(
            "  L{:<4} C{:<3} {:<7} {} ({})",
            self.line,
            self.column,
            self.kind.to_uppercase(),
            self.message,
            self.source
        )
    }
}

/// Render raw phpcs output, falling back to the text itself when it is not a report
#[inline]
pub fn format_output(stdout: &str) -> (String, bool) {
    match PhpcsReport::parse(stdout) {
        Some(report) => (report.render(), report.has_findings()),
        None if stdout.trim().is_empty() => (EMPTY_OUTPUT_MESSAGE.to_string(), false),
        None => (stdout.to_string(), false),
    }
}

/// Keyed entries of an object, or index-keyed entries of an array, in document order
fn members(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(key, item)| (key.clone(), item)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Vec::new(),
    }
}

fn to_int(value: &Value) -> i64 {
    match value {
        // Float to int casts saturate, which also covers integers beyond i64
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or(0),
        Value::String(text) => leading_int(text),
        Value::Bool(flag) => i64::from(*flag),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
        Value::Null => 0,
    }
}

/// Integer prefix of a string such as `"12"` or `" 7px"`; zero when there is none
fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    rest.chars()
        .map_while(|c| c.to_digit(10))
        .fold(0_i64, |acc, digit| {
            let acc = acc.saturating_mul(10);
            if negative {
                acc.saturating_sub(i64::from(digit))
            } else {
                acc.saturating_add(i64::from(digit))
            }
        })
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => "Array".to_string(),
    }
}
