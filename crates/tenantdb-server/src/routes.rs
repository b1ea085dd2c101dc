// crates/tenantdb-server/src/routes.rs
// ============================================================================
// Module: HTTP Routes
// Description: axum handlers mapping HTTP requests onto the tenant service.
// Purpose: Keep the HTTP layer a thin, audited adapter over core operations.
// Dependencies: tenantdb-core, axum, tower-http, serde, serde_json
// ============================================================================

//! ## Overview
//! Two route families sit over [`TenantService`]:
//! - `/db/users/{username}/tables...` runs caller-supplied SQL through the
//!   tenant container's `psql` and returns its text output.
//! - `/users/{username}/...` performs structured table and row operations
//!   through the tenant's connection pool.
//!
//! Request bodies are parsed inside the audited section so malformed input is
//! reported with the same envelope and audit record as any other failure.
//! Service calls block on Docker and `PostgreSQL`, so each one runs on the
//! blocking pool through [`tokio::task::spawn_blocking`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tenantdb_core::PoolFactory;
use tenantdb_core::Row;
use tenantdb_core::RowValue;
use tenantdb_core::TenantError;
use tenantdb_core::TenantService;
use tower_http::cors::CorsLayer;

use crate::audit::TenantAuditEvent;
use crate::audit::TenantAuditEventParams;
use crate::audit::TenantAuditSink;
use crate::error::ApiError;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared handler state.
pub struct AppState<F: PoolFactory> {
    /// Tenant service.
    pub service: Arc<TenantService<F>>,
    /// Request audit sink.
    pub audit: Arc<dyn TenantAuditSink>,
}

impl<F: PoolFactory> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            audit: Arc::clone(&self.audit),
        }
    }
}

impl<F> AppState<F>
where
    F: PoolFactory + Send + Sync + 'static,
{
    /// Runs a service operation for `username` on the blocking pool and
    /// records its audit event.
    async fn audited<T, Op>(
        &self,
        operation: &'static str,
        username: String,
        op: Op,
    ) -> Result<T, ApiError>
    where
        T: Send + 'static,
        Op: FnOnce(&TenantService<F>, &str) -> Result<T, TenantError> + Send + 'static,
    {
        let started = Instant::now();
        let service = Arc::clone(&self.service);
        let subject = username.clone();
        let result = tokio::task::spawn_blocking(move || op(&service, &subject))
            .await
            .map_err(|err| ApiError::Internal(format!("request task failed: {err}")))
            .and_then(|result| result.map_err(ApiError::from));
        self.audit.record(&TenantAuditEvent::new(TenantAuditEventParams {
            operation,
            username: Some(username),
            error_kind: result.as_ref().err().map(ApiError::kind),
            duration_ms: started.elapsed().as_millis(),
        }));
        result
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the HTTP router.
pub fn router<F>(state: AppState<F>, max_body_bytes: usize) -> Router
where
    F: PoolFactory + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register::<F>))
        .route(
            "/db/users/{username}/tables",
            get(admin_list_tables::<F>).post(admin_create_table::<F>),
        )
        .route(
            "/db/users/{username}/tables/{table}",
            get(admin_read_table::<F>).put(admin_update_table::<F>).delete(admin_delete_table::<F>),
        )
        .route("/db/users/{username}/tables/{table}/structure", patch(admin_modify_structure::<F>))
        .route(
            "/db/users/{username}/tables/{table}/drop",
            delete(admin_drop_table::<F>),
        )
        .route("/users/{username}/test_connection", get(test_connection::<F>))
        .route("/users/{username}/create_table", post(create_table::<F>))
        .route("/users/{username}/insert_item", post(insert_item::<F>))
        .route("/users/{username}/get_items", get(get_items::<F>))
        .route("/users/{username}/update_item/{item_id}", put(update_item::<F>))
        .route(
            "/users/{username}/delete_item/{item_id}",
            delete(delete_item::<F>),
        )
        .route("/users/{username}/tables", get(list_tables::<F>))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Registration request.
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    /// Requested username.
    username: String,
    /// Tenant database password.
    password: String,
}

/// Raw SQL request for admin routes.
#[derive(Debug, Deserialize)]
struct SqlQueryRequest {
    /// SQL text passed to `psql -c`.
    sql_query: String,
}

/// Structured table creation request.
#[derive(Debug, Deserialize)]
struct CreateTableRequest {
    /// Table name.
    table_name: String,
    /// Column name to logical type.
    columns: BTreeMap<String, String>,
}

/// Row payload for insert and update.
#[derive(Debug, Deserialize)]
struct ItemRequest {
    /// Column values.
    item: Value,
}

/// `table_name` query parameter.
#[derive(Debug, Deserialize)]
struct TableQuery {
    /// Target table.
    table_name: Option<String>,
}

impl TableQuery {
    /// Returns the table name or a validation error.
    fn require(self) -> Result<String, TenantError> {
        self.table_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TenantError::Validation("table_name query parameter is required".to_string()))
    }
}

/// Message-only response.
#[derive(Debug, Serialize)]
struct MessageResponse {
    /// Outcome message.
    message: String,
}

/// Table name list response.
#[derive(Debug, Serialize)]
struct TablesResponse {
    /// Outcome message.
    message: String,
    /// Table names.
    tables: Vec<String>,
}

/// Raw table read response.
#[derive(Debug, Serialize)]
struct DataResponse {
    /// Outcome message.
    message: String,
    /// `psql` output.
    data: String,
}

/// Raw SQL result response.
#[derive(Debug, Serialize)]
struct ResultResponse {
    /// Outcome message.
    message: String,
    /// `psql` output.
    result: String,
}

/// Insert response.
#[derive(Debug, Serialize)]
struct InsertResponse {
    /// Outcome message.
    message: String,
    /// Generated row id.
    id: i64,
}

/// Row update or delete response.
#[derive(Debug, Serialize)]
struct AffectedResponse {
    /// Outcome message.
    message: String,
    /// Rows touched by the statement.
    rows_affected: u64,
}

/// Row list response.
#[derive(Debug, Serialize)]
struct ItemsResponse {
    /// Table rows.
    items: Vec<Row>,
}

/// Liveness response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    /// Always `ok`.
    status: &'static str,
}

/// Parses a JSON request body.
fn parse_body<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, TenantError> {
    serde_json::from_slice(bytes)
        .map_err(|err| TenantError::Validation(format!("invalid request body: {err}")))
}

/// Parses an item id path segment.
fn parse_item_id(raw: &str) -> Result<i64, TenantError> {
    raw.parse()
        .map_err(|_| TenantError::Validation(format!("item_id must be an integer: {raw}")))
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Liveness check.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
    })
}

/// Registers a tenant and provisions its database container.
async fn register<F>(
    State(state): State<AppState<F>>,
    bytes: Bytes,
) -> Result<Json<MessageResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let request: RegisterRequest =
        parse_body(&bytes).map_err(|err| audit_rejected(&state, "register", None, err))?;
    let username = request.username.clone();
    let record = state
        .audited("register", username, move |service, username| {
            service.register(username, &request.password)
        })
        .await?;
    Ok(Json(MessageResponse {
        message: format!("User '{}' registered successfully.", record.username),
    }))
}

/// Records a failure that happened before the service was reached.
fn audit_rejected<F: PoolFactory>(
    state: &AppState<F>,
    operation: &'static str,
    username: Option<&str>,
    err: TenantError,
) -> ApiError {
    state.audit.record(&TenantAuditEvent::new(TenantAuditEventParams {
        operation,
        username: username.map(str::to_string),
        error_kind: Some(err.kind()),
        duration_ms: 0,
    }));
    ApiError::from(err)
}

// ============================================================================
// SECTION: Admin SQL Routes
// ============================================================================

/// Lists tables from `psql` output.
async fn admin_list_tables<F>(
    State(state): State<AppState<F>>,
    Path(username): Path<String>,
) -> Result<Json<TablesResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let tables = state
        .audited("admin_list_tables", username, |service, username| {
            service.admin_list_tables(username)
        })
        .await?;
    Ok(Json(TablesResponse {
        message: "Tables retrieved successfully.".to_string(),
        tables,
    }))
}

/// Returns `SELECT *` output for a table.
async fn admin_read_table<F>(
    State(state): State<AppState<F>>,
    Path((username, table)): Path<(String, String)>,
) -> Result<Json<DataResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let target = table.clone();
    let data = state
        .audited("admin_read_table", username, move |service, username| {
            service.admin_read_table(username, &target)
        })
        .await?;
    Ok(Json(DataResponse {
        message: format!("Data from {table} retrieved successfully."),
        data,
    }))
}

/// Runs caller SQL that creates a table.
async fn admin_create_table<F>(
    State(state): State<AppState<F>>,
    Path(username): Path<String>,
    bytes: Bytes,
) -> Result<Json<ResultResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let result = state
        .audited("admin_create_table", username, move |service, username| {
            let request: SqlQueryRequest = parse_body(&bytes)?;
            service.admin_create_table(username, &request.sql_query)
        })
        .await?;
    Ok(Json(ResultResponse {
        message: "Table created successfully.".to_string(),
        result,
    }))
}

/// Runs caller SQL against a table.
async fn admin_update_table<F>(
    State(state): State<AppState<F>>,
    Path((username, table)): Path<(String, String)>,
    bytes: Bytes,
) -> Result<Json<ResultResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let target = table.clone();
    let result = state
        .audited("admin_update_table", username, move |service, username| {
            let request: SqlQueryRequest = parse_body(&bytes)?;
            service.admin_update_table(username, &target, &request.sql_query)
        })
        .await?;
    Ok(Json(ResultResponse {
        message: format!("Table {table} updated successfully."),
        result,
    }))
}

/// Runs caller SQL that alters a table.
async fn admin_modify_structure<F>(
    State(state): State<AppState<F>>,
    Path((username, table)): Path<(String, String)>,
    bytes: Bytes,
) -> Result<Json<ResultResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let target = table.clone();
    let result = state
        .audited("admin_modify_structure", username, move |service, username| {
            let request: SqlQueryRequest = parse_body(&bytes)?;
            service.admin_modify_structure(username, &target, &request.sql_query)
        })
        .await?;
    Ok(Json(ResultResponse {
        message: format!("Table {table} structure modified successfully."),
        result,
    }))
}

/// Drops a table (`DELETE /db/users/{username}/tables/{table}`).
async fn admin_delete_table<F>(
    State(state): State<AppState<F>>,
    Path((username, table)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let target = table.clone();
    state
        .audited("admin_drop_table", username, move |service, username| {
            service.admin_drop_table(username, &target)
        })
        .await?;
    Ok(Json(MessageResponse {
        message: format!("Table {table} deleted successfully."),
    }))
}

/// Drops a table (`DELETE /db/users/{username}/tables/{table}/drop`).
async fn admin_drop_table<F>(
    State(state): State<AppState<F>>,
    Path((username, table)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let target = table.clone();
    state
        .audited("admin_drop_table", username, move |service, username| {
            service.admin_drop_table(username, &target)
        })
        .await?;
    Ok(Json(MessageResponse {
        message: format!("Table {table} dropped successfully."),
    }))
}

// ============================================================================
// SECTION: Tenant Data Routes
// ============================================================================

/// Checks the tenant pool with a ping.
async fn test_connection<F>(
    State(state): State<AppState<F>>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    state
        .audited("test_connection", username.clone(), |service, username| {
            service.test_connection(username)
        })
        .await?;
    Ok(Json(MessageResponse {
        message: format!("Connection to database for user '{username}' is successful."),
    }))
}

/// Creates a table from a column map.
async fn create_table<F>(
    State(state): State<AppState<F>>,
    Path(username): Path<String>,
    bytes: Bytes,
) -> Result<Json<MessageResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let table = state
        .audited("create_table", username, move |service, username| {
            let request: CreateTableRequest = parse_body(&bytes)?;
            service.create_table(username, &request.table_name, &request.columns)?;
            Ok(request.table_name)
        })
        .await?;
    Ok(Json(MessageResponse {
        message: format!("Table {table} created successfully"),
    }))
}

/// Inserts a row.
async fn insert_item<F>(
    State(state): State<AppState<F>>,
    Path(username): Path<String>,
    Query(query): Query<TableQuery>,
    bytes: Bytes,
) -> Result<Json<InsertResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let (table, id) = state
        .audited("insert_item", username, move |service, username| {
            let table = query.require()?;
            let request: ItemRequest = parse_body(&bytes)?;
            let row = RowValue::row_from_json(&request.item)?;
            let id = service.insert_item(username, &table, &row)?;
            Ok((table, id))
        })
        .await?;
    Ok(Json(InsertResponse {
        message: format!("Item inserted successfully into table '{table}'"),
        id,
    }))
}

/// Returns every row of a table.
async fn get_items<F>(
    State(state): State<AppState<F>>,
    Path(username): Path<String>,
    Query(query): Query<TableQuery>,
) -> Result<Json<ItemsResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let items = state
        .audited("get_items", username, move |service, username| {
            let table = query.require()?;
            service.get_items(username, &table)
        })
        .await?;
    Ok(Json(ItemsResponse {
        items,
    }))
}

/// Updates a row by id.
async fn update_item<F>(
    State(state): State<AppState<F>>,
    Path((username, item_id)): Path<(String, String)>,
    Query(query): Query<TableQuery>,
    bytes: Bytes,
) -> Result<Json<AffectedResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let (id, rows_affected) = state
        .audited("update_item", username, move |service, username| {
            let table = query.require()?;
            let id = parse_item_id(&item_id)?;
            let request: ItemRequest = parse_body(&bytes)?;
            let row = RowValue::row_from_json(&request.item)?;
            Ok((id, service.update_item(username, &table, id, &row)?))
        })
        .await?;
    Ok(Json(AffectedResponse {
        message: format!("Item with ID {id} updated successfully"),
        rows_affected,
    }))
}

/// Deletes a row by id.
async fn delete_item<F>(
    State(state): State<AppState<F>>,
    Path((username, item_id)): Path<(String, String)>,
    Query(query): Query<TableQuery>,
) -> Result<Json<AffectedResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let (id, rows_affected) = state
        .audited("delete_item", username, move |service, username| {
            let table = query.require()?;
            let id = parse_item_id(&item_id)?;
            Ok((id, service.delete_item(username, &table, id)?))
        })
        .await?;
    Ok(Json(AffectedResponse {
        message: format!("Item with ID {id} deleted successfully"),
        rows_affected,
    }))
}

/// Lists tenant tables through the catalog.
async fn list_tables<F>(
    State(state): State<AppState<F>>,
    Path(username): Path<String>,
) -> Result<Json<TablesResponse>, ApiError>
where
    F: PoolFactory + Send + Sync + 'static,
{
    let tables = state
        .audited("list_tables", username, |service, username| service.list_tables(username))
        .await?;
    Ok(Json(TablesResponse {
        message: "Tables retrieved successfully.".to_string(),
        tables,
    }))
}
