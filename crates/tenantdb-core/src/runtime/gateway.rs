// crates/tenantdb-core/src/runtime/gateway.rs
// ============================================================================
// Module: Tenant Data Gateway
// Description: Generic table and row operations on a tenant pool.
// Purpose: Build parameterized CRUD statements and run them per call.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`StatementBuilder`] turns a table name plus a column or row map into SQL
//! text and bound parameters. [`TenantGateway`] runs those statements on a
//! resolved [`TenantDatabase`]; every call is its own autocommit statement.
//!
//! Values are always bound as `$n` parameters. Table and column names go
//! through the configured [`IdentifierPolicy`].
//!
//! Reads are full scans without pagination.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::ColumnType;
use crate::core::IdentifierPolicy;
use crate::core::Row;
use crate::core::RowValue;
use crate::core::TenantError;
use crate::interfaces::TenantDatabase;
use crate::runtime::listing::LIST_TABLES_SQL;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Primary key column appended to every created table.
pub const ID_COLUMN: &str = "id";

/// Liveness query.
pub const PING_SQL: &str = "SELECT 1";

// ============================================================================
// SECTION: Statements
// ============================================================================

/// SQL text and its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `$n` placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<RowValue>,
}

impl Statement {
    /// Builds a statement without parameters.
    fn bare(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }
}

/// Builds CRUD statements under an identifier policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementBuilder {
    /// Identifier policy.
    policy: IdentifierPolicy,
}

impl StatementBuilder {
    /// Creates a builder using `policy`.
    #[must_use]
    pub const fn new(policy: IdentifierPolicy) -> Self {
        Self {
            policy,
        }
    }

    /// Returns the identifier policy.
    #[must_use]
    pub const fn policy(&self) -> IdentifierPolicy {
        self.policy
    }

    /// `CREATE TABLE` with mapped column types and an appended `id` key.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for an empty column set, a
    /// declared `id` column, or a rejected identifier, and
    /// [`TenantError::UnsupportedType`] for unknown type names.
    pub fn create_table(
        &self,
        table: &str,
        columns: &BTreeMap<String, String>,
    ) -> Result<Statement, TenantError> {
        if columns.is_empty() {
            return Err(TenantError::Validation("at least one column is required".to_string()));
        }
        let mut definitions = Vec::with_capacity(columns.len() + 1);
        for (name, type_name) in columns {
            reject_id_column(name)?;
            let column_type = ColumnType::parse(type_name)?;
            definitions.push(format!("{} {}", self.policy.render(name)?, column_type.sql_type()));
        }
        definitions.push(format!("{} BIGSERIAL PRIMARY KEY", self.policy.render(ID_COLUMN)?));
        Ok(Statement::bare(format!(
            "CREATE TABLE {} ({})",
            self.policy.render(table)?,
            definitions.join(", ")
        )))
    }

    /// `INSERT ... RETURNING id`; an empty row inserts defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for rejected identifiers.
    pub fn insert(&self, table: &str, row: &Row) -> Result<Statement, TenantError> {
        let table = self.policy.render(table)?;
        let id = self.policy.render(ID_COLUMN)?;
        if row.is_empty() {
            return Ok(Statement::bare(format!(
                "INSERT INTO {table} DEFAULT VALUES RETURNING {id}"
            )));
        }
        let mut columns = Vec::with_capacity(row.len());
        let mut placeholders = Vec::with_capacity(row.len());
        let mut params = Vec::with_capacity(row.len());
        for (index, (name, value)) in row.iter().enumerate() {
            columns.push(self.policy.render(name)?);
            placeholders.push(format!("${}", index + 1));
            params.push(value.clone());
        }
        Ok(Statement {
            sql: format!(
                "INSERT INTO {table} ({}) VALUES ({}) RETURNING {id}",
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        })
    }

    /// `SELECT *` over the whole table.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for a rejected table name.
    pub fn select_all(&self, table: &str) -> Result<Statement, TenantError> {
        Ok(Statement::bare(format!("SELECT * FROM {}", self.policy.render(table)?)))
    }

    /// `UPDATE ... SET ... WHERE id = $n`.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for an empty row, an `id` column,
    /// or rejected identifiers.
    pub fn update(&self, table: &str, item_id: i64, row: &Row) -> Result<Statement, TenantError> {
        if row.is_empty() {
            return Err(TenantError::Validation("update requires at least one column".to_string()));
        }
        let table = self.policy.render(table)?;
        let mut assignments = Vec::with_capacity(row.len());
        let mut params = Vec::with_capacity(row.len() + 1);
        for (index, (name, value)) in row.iter().enumerate() {
            reject_id_column(name)?;
            assignments.push(format!("{} = ${}", self.policy.render(name)?, index + 1));
            params.push(value.clone());
        }
        params.push(RowValue::Integer(item_id));
        Ok(Statement {
            sql: format!(
                "UPDATE {table} SET {} WHERE {} = ${}",
                assignments.join(", "),
                self.policy.render(ID_COLUMN)?,
                params.len()
            ),
            params,
        })
    }

    /// `DELETE ... WHERE id = $1`.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for a rejected table name.
    pub fn delete(&self, table: &str, item_id: i64) -> Result<Statement, TenantError> {
        Ok(Statement {
            sql: format!(
                "DELETE FROM {} WHERE {} = $1",
                self.policy.render(table)?,
                self.policy.render(ID_COLUMN)?
            ),
            params: vec![RowValue::Integer(item_id)],
        })
    }

    /// `DROP TABLE IF EXISTS`.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for a rejected table name.
    pub fn drop_table(&self, table: &str) -> Result<Statement, TenantError> {
        Ok(Statement::bare(format!("DROP TABLE IF EXISTS {}", self.policy.render(table)?)))
    }

    /// `SELECT * FROM {table};` for the raw SQL shell.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for a rejected table name.
    pub fn shell_select_all(&self, table: &str) -> Result<String, TenantError> {
        Ok(format!("{};", self.select_all(table)?.sql))
    }

    /// `DROP TABLE IF EXISTS {table};` for the raw SQL shell.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for a rejected table name.
    pub fn shell_drop_table(&self, table: &str) -> Result<String, TenantError> {
        Ok(format!("{};", self.drop_table(table)?.sql))
    }
}

/// Rejects caller-declared `id` columns.
fn reject_id_column(name: &str) -> Result<(), TenantError> {
    if name.eq_ignore_ascii_case(ID_COLUMN) {
        return Err(TenantError::Validation(
            "column `id` is the managed primary key and cannot be set".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// CRUD over one tenant database.
pub struct TenantGateway<'a, D: TenantDatabase + ?Sized> {
    /// Tenant database.
    db: &'a D,
    /// Statement builder.
    builder: StatementBuilder,
}

impl<'a, D: TenantDatabase + ?Sized> TenantGateway<'a, D> {
    /// Wraps a tenant database.
    #[must_use]
    pub const fn new(db: &'a D, builder: StatementBuilder) -> Self {
        Self {
            db,
            builder,
        }
    }

    /// Round-trips `SELECT 1`.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub fn test_connection(&self) -> Result<(), TenantError> {
        self.db.ping()
    }

    /// Creates a table. Not idempotent; an existing table is an engine error.
    ///
    /// # Errors
    ///
    /// Returns builder errors or [`TenantError::QueryFailed`].
    pub fn create_table(
        &self,
        table: &str,
        columns: &BTreeMap<String, String>,
    ) -> Result<(), TenantError> {
        let statement = self.builder.create_table(table, columns)?;
        self.db.execute(&statement.sql, &statement.params).map(|_| ())
    }

    /// Inserts a row and returns its assigned `id`.
    ///
    /// # Errors
    ///
    /// Returns builder errors or [`TenantError::QueryFailed`].
    pub fn insert(&self, table: &str, row: &Row) -> Result<i64, TenantError> {
        let statement = self.builder.insert(table, row)?;
        let rows = self.db.query(&statement.sql, &statement.params)?;
        match rows.first().and_then(|row| row.get(ID_COLUMN)) {
            Some(RowValue::Integer(id)) => Ok(*id),
            _ => Err(TenantError::QueryFailed("insert did not return an id".to_string())),
        }
    }

    /// Returns every row of the table.
    ///
    /// # Errors
    ///
    /// Returns builder errors or [`TenantError::QueryFailed`].
    pub fn get_all(&self, table: &str) -> Result<Vec<Row>, TenantError> {
        let statement = self.builder.select_all(table)?;
        self.db.query(&statement.sql, &statement.params)
    }

    /// Updates the row with `item_id`; returns the affected count (0 is fine).
    ///
    /// # Errors
    ///
    /// Returns builder errors or [`TenantError::QueryFailed`].
    pub fn update(&self, table: &str, item_id: i64, row: &Row) -> Result<u64, TenantError> {
        let statement = self.builder.update(table, item_id, row)?;
        self.db.execute(&statement.sql, &statement.params)
    }

    /// Deletes the row with `item_id`; returns the affected count (0 is fine).
    ///
    /// # Errors
    ///
    /// Returns builder errors or [`TenantError::QueryFailed`].
    pub fn delete(&self, table: &str, item_id: i64) -> Result<u64, TenantError> {
        let statement = self.builder.delete(table, item_id)?;
        self.db.execute(&statement.sql, &statement.params)
    }

    /// Lists public base tables through the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::QueryFailed`].
    pub fn list_tables(&self) -> Result<Vec<String>, TenantError> {
        let rows = self.db.query(LIST_TABLES_SQL, &[])?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| match row.remove("table_name") {
                Some(RowValue::Text(name)) => Some(name),
                _ => None,
            })
            .collect())
    }
}
