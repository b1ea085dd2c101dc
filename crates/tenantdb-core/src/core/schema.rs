// crates/tenantdb-core/src/core/schema.rs
// ============================================================================
// Module: Tenant Table Schema
// Description: Column types, row values, and identifier handling policy.
// Purpose: Describe schemaless tenant tables supplied per call.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Tenant tables carry no cached schema: every call supplies its own table
//! name and column map. This module maps logical column types onto native
//! `PostgreSQL` types, converts JSON scalars into bindable [`RowValue`]s, and
//! decides how caller-supplied identifiers reach SQL text.
//!
//! Security posture: [`IdentifierPolicy::Passthrough`] interpolates names
//! unchanged and is an injection vector; it exists for compatibility only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::TenantError;

// ============================================================================
// SECTION: Column Types
// ============================================================================

/// Logical column type accepted by `create_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Variable-length text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// Double-precision float.
    Real,
    /// Boolean.
    Boolean,
}

impl ColumnType {
    /// Parses a logical type name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::UnsupportedType`] for unknown names.
    pub fn parse(name: &str) -> Result<Self, TenantError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(Self::Text),
            "integer" | "int" => Ok(Self::Integer),
            "real" | "float" => Ok(Self::Real),
            "boolean" | "bool" => Ok(Self::Boolean),
            _ => Err(TenantError::UnsupportedType(name.to_string())),
        }
    }

    /// Returns the native `PostgreSQL` column type.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "BIGINT",
            Self::Real => "DOUBLE PRECISION",
            Self::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Boolean => "boolean",
        };
        f.write_str(label)
    }
}

// ============================================================================
// SECTION: Row Values
// ============================================================================

/// Scalar cell value bound as a statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    /// SQL `NULL`.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Real(f64),
    /// Text value.
    Text(String),
}

/// Tenant row keyed by column name.
pub type Row = BTreeMap<String, RowValue>;

impl RowValue {
    /// Converts a JSON object into a row.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] when the value is not an object or
    /// a cell holds a nested array or object.
    pub fn row_from_json(value: &Value) -> Result<Row, TenantError> {
        let Value::Object(map) = value else {
            return Err(TenantError::Validation("row must be a JSON object".to_string()));
        };
        map.iter()
            .map(|(column, cell)| Ok((column.clone(), Self::try_from(cell)?)))
            .collect()
    }
}

impl TryFrom<&Value> for RowValue {
    type Error = TenantError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(flag) => Ok(Self::Bool(*flag)),
            Value::Number(number) => number.as_i64().map(Self::Integer).map_or_else(
                || {
                    number.as_f64().map(Self::Real).ok_or_else(|| {
                        TenantError::Validation(format!("unrepresentable number: {number}"))
                    })
                },
                Ok,
            ),
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => Err(TenantError::Validation(
                "row values must be scalars (null, bool, number, string)".to_string(),
            )),
        }
    }
}

impl From<&str> for RowValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for RowValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for RowValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for RowValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// ============================================================================
// SECTION: Identifier Policy
// ============================================================================

/// Maximum identifier length accepted under the strict policy.
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// How caller-supplied table and column names reach SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierPolicy {
    /// Allow-list `[A-Za-z_][A-Za-z0-9_]*` (max 63) and double-quote.
    #[default]
    Strict,
    /// Interpolate names unchanged. Vulnerable to SQL injection.
    Passthrough,
}

impl IdentifierPolicy {
    /// Renders an identifier for inclusion in SQL text.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] when the strict policy rejects the
    /// name. The passthrough policy only rejects empty names.
    pub fn render(self, name: &str) -> Result<String, TenantError> {
        if name.is_empty() {
            return Err(TenantError::Validation("identifier must be non-empty".to_string()));
        }
        match self {
            Self::Passthrough => Ok(name.to_string()),
            Self::Strict => {
                if !is_plain_identifier(name) {
                    return Err(TenantError::Validation(format!("invalid identifier: {name}")));
                }
                Ok(format!("\"{name}\""))
            }
        }
    }

    /// Returns true when rendered identifiers cannot alter statement shape.
    #[must_use]
    pub const fn is_injection_safe(self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]{0,62}`.
fn is_plain_identifier(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() > MAX_IDENTIFIER_LENGTH {
        return false;
    }
    match bytes.split_first() {
        Some((first, rest)) => {
            (first.is_ascii_alphabetic() || *first == b'_')
                && rest.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_')
        }
        None => false,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use serde_json::json;

    use super::ColumnType;
    use super::IdentifierPolicy;
    use super::RowValue;
    use crate::core::error::TenantError;

    #[test]
    fn column_type_aliases_map_to_native_types() {
        assert_eq!(ColumnType::parse("TEXT").unwrap().sql_type(), "TEXT");
        assert_eq!(ColumnType::parse("string").unwrap(), ColumnType::Text);
        assert_eq!(ColumnType::parse("int").unwrap().sql_type(), "BIGINT");
        assert_eq!(ColumnType::parse("Float").unwrap().sql_type(), "DOUBLE PRECISION");
        assert_eq!(ColumnType::parse("bool").unwrap().sql_type(), "BOOLEAN");
    }

    #[test]
    fn unknown_column_type_is_unsupported() {
        assert_eq!(
            ColumnType::parse("jsonb"),
            Err(TenantError::UnsupportedType("jsonb".to_string()))
        );
    }

    #[test]
    fn row_from_json_keeps_scalar_kinds() {
        let row =
            RowValue::row_from_json(&json!({"name": "Alice", "age": 30, "score": 1.5, "x": null}))
                .unwrap();
        assert_eq!(row["name"], RowValue::Text("Alice".to_string()));
        assert_eq!(row["age"], RowValue::Integer(30));
        assert_eq!(row["score"], RowValue::Real(1.5));
        assert_eq!(row["x"], RowValue::Null);
    }

    #[test]
    fn row_from_json_rejects_nested_values() {
        let err = RowValue::row_from_json(&json!({"tags": ["a"]})).unwrap_err();
        assert_eq!(err.kind(), "validation");
        let err = RowValue::row_from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn row_values_serialize_untagged() {
        let rendered = serde_json::to_string(&vec![
            RowValue::Integer(1),
            RowValue::Text("a".to_string()),
            RowValue::Null,
        ])
        .unwrap();
        assert_eq!(rendered, "[1,\"a\",null]");
    }

    #[test]
    fn strict_policy_quotes_plain_names() {
        assert_eq!(IdentifierPolicy::Strict.render("users_2").unwrap(), "\"users_2\"");
        assert!(IdentifierPolicy::Strict.is_injection_safe());
    }

    #[test]
    fn strict_policy_rejects_hostile_names() {
        let too_long = "x".repeat(64);
        for name in ["t; DROP TABLE users", "9lives", "a\"b", "", too_long.as_str()] {
            assert!(
                matches!(IdentifierPolicy::Strict.render(name), Err(TenantError::Validation(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn passthrough_policy_interpolates_unchanged() {
        let hostile = "t; DROP TABLE users; --";
        assert_eq!(IdentifierPolicy::Passthrough.render(hostile).unwrap(), hostile);
        assert!(!IdentifierPolicy::Passthrough.is_injection_safe());
    }
}
