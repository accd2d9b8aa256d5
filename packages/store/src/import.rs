//! # Coercing loosely-typed import rows into leads
//!
//! A CSV parser hands us string-keyed rows whose values may be strings,
//! numbers, booleans or null. [`coerce_row`] turns one such row into
//! [`LeadFields`] with fixed fallbacks:
//!
//! | Column | Rule |
//! |--------|------|
//! | `name`, `email`, `phone`, `address` | the value as text, or `""` when missing or empty |
//! | `is_active` | `false` only for a recognized false value (`false`, `"false"`, `"FALSE"`, `"False"`); anything else is active |
//! | `status` | the value if it is exactly `Open`, `Close` or `Pending`, else `Open` |
//! | `priority` | the value if it is exactly `high`, `normal` or `low`, else `normal` |
//! | `target_type` | the value if it is exactly `Target` or `Non-Target`, else the server default |
//! | `last_followup_remarks`, `next_steps` | the value as text, or `None` |
//!
//! The `is_active` rule is lossy: values such as `"no"`, `"0"` or `"inactive"`
//! still import as active. Rather than guess, every value that is present but
//! not recognized is reported as an [`ImportWarning`] next to the coerced
//! fields, so callers can surface it.

use serde_json::Value;

use crate::models::{LeadFields, LeadStatus, Priority, TargetType};

/// One parsed input row.
pub type ImportRow = serde_json::Map<String, Value>;

const TRUE_VALUES: [&str; 3] = ["true", "TRUE", "True"];
const FALSE_VALUES: [&str; 3] = ["false", "FALSE", "False"];

/// A value that was present but fell back to a default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportWarning {
    /// Zero-based index of the row in the input.
    pub row: usize,
    pub column: &'static str,
    pub value: String,
    pub fallback: String,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {}: {} value {:?} not recognized, using {:?}",
            self.row + 1,
            self.column,
            self.value,
            self.fallback
        )
    }
}

/// Result of coercing a batch of rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coerced {
    pub rows: Vec<LeadFields>,
    pub warnings: Vec<ImportWarning>,
}

/// Coerce every row, collecting warnings.
pub fn coerce_rows(rows: &[ImportRow]) -> Coerced {
    let mut out = Coerced::default();
    for (index, row) in rows.iter().enumerate() {
        let (fields, warnings) = coerce_row(index, row);
        out.rows.push(fields);
        out.warnings.extend(warnings);
    }
    out
}

/// Coerce a single row. `index` is only used to label warnings.
pub fn coerce_row(index: usize, row: &ImportRow) -> (LeadFields, Vec<ImportWarning>) {
    let mut warnings = Vec::new();
    let mut warn = |column: &'static str, value: String, fallback: &str| {
        warnings.push(ImportWarning {
            row: index,
            column,
            value,
            fallback: fallback.to_string(),
        })
    };

    let is_active = match row.get("is_active") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if TRUE_VALUES.contains(&s.as_str()) => true,
        Some(Value::String(s)) if FALSE_VALUES.contains(&s.as_str()) => false,
        Some(other) => {
            warn("is_active", raw(other), "true");
            true
        }
    };

    let status = closed_set::<LeadStatus>(row, "status", &mut warn).unwrap_or_default();
    let priority = closed_set::<Priority>(row, "priority", &mut warn).unwrap_or_default();
    let target_type = closed_set::<TargetType>(row, "target_type", &mut warn);

    let fields = LeadFields {
        name: text(row, "name").unwrap_or_default(),
        email: text(row, "email").unwrap_or_default(),
        phone: text(row, "phone").unwrap_or_default(),
        address: text(row, "address").unwrap_or_default(),
        is_active,
        status,
        priority,
        target_type,
        last_followup_remarks: text(row, "last_followup_remarks"),
        next_steps: text(row, "next_steps"),
    };
    (fields, warnings)
}

trait ClosedSet: Sized + std::str::FromStr {
    fn fallback() -> &'static str;
}

impl ClosedSet for LeadStatus {
    fn fallback() -> &'static str {
        LeadStatus::default().as_str()
    }
}

impl ClosedSet for Priority {
    fn fallback() -> &'static str {
        Priority::default().as_str()
    }
}

impl ClosedSet for TargetType {
    fn fallback() -> &'static str {
        "server default"
    }
}

fn closed_set<T: ClosedSet>(
    row: &ImportRow,
    column: &'static str,
    warn: &mut impl FnMut(&'static str, String, &str),
) -> Option<T> {
    let value = row.get(column)?;
    if let Value::String(s) = value {
        if let Ok(parsed) = s.parse() {
            return Some(parsed);
        }
    }
    if !is_blank(value) {
        warn(column, raw(value), T::fallback());
    }
    None
}

/// Text content of a cell; empty strings and non-scalars count as missing.
fn text(row: &ImportRow, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
