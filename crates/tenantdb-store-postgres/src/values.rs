// crates/tenantdb-store-postgres/src/values.rs
// ============================================================================
// Module: Postgres Value Mapping
// Description: Binding of row values as parameters and decoding of result rows.
// Purpose: Move JSON scalars in and out of tenant tables without string SQL.
// Dependencies: tenantdb-core, postgres, postgres-types, bytes
// ============================================================================

//! ## Overview
//! [`SqlValue`] binds a [`RowValue`] against whatever type the server infers
//! for a placeholder, so an integer sent for a `DOUBLE PRECISION` column or a
//! `SMALLINT` column still binds. Unsupported pairings surface as a type error
//! from the driver, which the gateway reports as `query_failed`.
//!
//! [`decode_row`] maps result columns back to scalars. Types outside the
//! supported set decode as text when the driver can read them as text, and as
//! null otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error;

use bytes::BytesMut;
use postgres::Row as PgRow;
use postgres_types::IsNull;
use postgres_types::ToSql;
use postgres_types::Type;
use postgres_types::to_sql_checked;
use tenantdb_core::Row;
use tenantdb_core::RowValue;
use tenantdb_core::TenantError;

// ============================================================================
// SECTION: Parameter Binding
// ============================================================================

/// Borrowed [`RowValue`] usable as a query parameter.
#[derive(Debug, Clone, Copy)]
pub struct SqlValue<'a>(pub &'a RowValue);

impl ToSql for SqlValue<'_> {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        reason = "JSON numbers bound to float columns follow float semantics."
    )]
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self.0 {
            RowValue::Null => Ok(IsNull::Yes),
            RowValue::Bool(value) => value.to_sql_checked(ty, out),
            RowValue::Integer(value) => match *ty {
                Type::INT2 => i16::try_from(*value)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*value)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*value as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*value as f64).to_sql_checked(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            RowValue::Real(value) => match *ty {
                Type::FLOAT4 => (*value as f32).to_sql_checked(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            RowValue::Text(value) => value.as_str().to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Wraps values for a driver call.
#[must_use]
pub fn bind(params: &[RowValue]) -> Vec<SqlValue<'_>> {
    params.iter().map(SqlValue).collect()
}

/// Borrows wrapped values as driver parameters.
#[must_use]
pub fn as_params<'a>(values: &'a [SqlValue<'a>]) -> Vec<&'a (dyn ToSql + Sync)> {
    values.iter().map(|value| value as &(dyn ToSql + Sync)).collect()
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Decodes a result row into column/value pairs.
///
/// # Errors
///
/// Returns [`TenantError::QueryFailed`] when a supported column cannot be
/// read as its declared type.
pub fn decode_row(row: &PgRow) -> Result<Row, TenantError> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, index, column.type_())
            .map_err(|err| TenantError::QueryFailed(format!("column {}: {err}", column.name())))?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

/// Decodes one column by its server type.
fn decode_column(row: &PgRow, index: usize, ty: &Type) -> Result<RowValue, postgres::Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(index)?.map(RowValue::Bool),
        Type::INT2 => row.try_get::<_, Option<i16>>(index)?.map(|v| RowValue::Integer(v.into())),
        Type::INT4 => row.try_get::<_, Option<i32>>(index)?.map(|v| RowValue::Integer(v.into())),
        Type::INT8 => row.try_get::<_, Option<i64>>(index)?.map(RowValue::Integer),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(index)?.map(|v| RowValue::Real(v.into())),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index)?.map(RowValue::Real),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(index)?.map(RowValue::Text)
        }
        _ => row.try_get::<_, Option<String>>(index).ok().flatten().map(RowValue::Text),
    };
    Ok(value.unwrap_or(RowValue::Null))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
