//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres and the
//! [`PgStore`] implementation of [`CatalogStore`].
//!
//! Each reference collection lives in its own table; products keep their
//! reference ids in `uuid[]` columns and are expanded at read time by the
//! catalog layer. Every store call is bounded by the configured socket
//! timeout, and waiting for a pooled connection by the selection timeout.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Object, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime,
    Timeouts,
};
use rsi_core::{
    CatalogError, CatalogResult, EntityIdType, Product, ProductId, ReferenceItem,
    ReferenceItemId, ReferenceKind, References, StorageError, Timestamp,
};
use rsi_storage::CatalogStore;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_DB_NAME, DEFAULT_DB_POOL_SIZE, DEFAULT_DB_SELECTION_TIMEOUT_SECS,
    DEFAULT_DB_SOCKET_TIMEOUT_SECS,
};
use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full connection string. Takes precedence over the discrete fields.
    pub url: Option<String>,
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long to wait for a pooled connection
    pub selection_timeout: Duration,
    /// Upper bound for a single store operation
    pub socket_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            dbname: DEFAULT_DB_NAME.to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: DEFAULT_DB_POOL_SIZE,
            selection_timeout: Duration::from_secs(DEFAULT_DB_SELECTION_TIMEOUT_SECS),
            socket_timeout: Duration::from_secs(DEFAULT_DB_SOCKET_TIMEOUT_SECS),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64| {
            Duration::from_secs(lookup(key).and_then(|s| s.parse().ok()).unwrap_or(default))
        };

        Self {
            url: lookup("RSI_DATABASE_URL").filter(|s| !s.trim().is_empty()),
            host: lookup("RSI_DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: lookup("RSI_DB_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: lookup("RSI_DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            user: lookup("RSI_DB_USER").unwrap_or_else(|| "postgres".to_string()),
            password: lookup("RSI_DB_PASSWORD").unwrap_or_default(),
            max_size: lookup("RSI_DB_POOL_SIZE")
                .and_then(|s| s.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_DB_POOL_SIZE),
            selection_timeout: secs(
                "RSI_DB_SELECTION_TIMEOUT_SECS",
                DEFAULT_DB_SELECTION_TIMEOUT_SECS,
            ),
            socket_timeout: secs("RSI_DB_SOCKET_TIMEOUT_SECS", DEFAULT_DB_SOCKET_TIMEOUT_SECS),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        match &self.url {
            Some(url) => cfg.url = Some(url.clone()),
            None => {
                cfg.host = Some(self.host.clone());
                cfg.port = Some(self.port);
                cfg.dbname = Some(self.dbname.clone());
                cfg.user = Some(self.user.clone());
                cfg.password = Some(self.password.clone());
            }
        }

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts = Timeouts {
            wait: Some(self.selection_timeout),
            create: Some(self.selection_timeout),
            recycle: Some(self.selection_timeout),
        };
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

const PRODUCTS_TABLE: &str = "products";

/// Product columns in insert order. Reference columns follow
/// [`ReferenceKind::ALL`].
const PRODUCT_COLUMNS: &str = "id, name, link, description, created_at, \
     origins, colors, types, categories, raw_materials, processes";

/// Column holding a product's ids for one reference collection.
fn product_column(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Origin => "origins",
        ReferenceKind::Color => "colors",
        ReferenceKind::Type => "types",
        ReferenceKind::Category => "categories",
        ReferenceKind::RawMaterial => "raw_materials",
        ReferenceKind::ManufacturingProcess => "processes",
    }
}

fn reference_table(kind: ReferenceKind) -> String {
    format!("\"{}\"", kind.collection())
}

fn schema_sql() -> String {
    let mut sql = String::new();
    for kind in ReferenceKind::ALL {
        sql.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                id uuid PRIMARY KEY, \
                display_name text NOT NULL, \
                created_at timestamptz NOT NULL DEFAULT now()\
             );\n",
            table = reference_table(kind),
        ));
    }

    let reference_columns: Vec<String> = ReferenceKind::ALL
        .into_iter()
        .map(|kind| format!("{} uuid[] NOT NULL DEFAULT '{{}}'", product_column(kind)))
        .collect();
    sql.push_str(&format!(
        "CREATE TABLE IF NOT EXISTS {PRODUCTS_TABLE} (\
            id uuid PRIMARY KEY, \
            name text NOT NULL, \
            link text NOT NULL DEFAULT '', \
            description text NOT NULL DEFAULT '', \
            {}, \
            created_at timestamptz NOT NULL DEFAULT now()\
         );\n",
        reference_columns.join(", "),
    ));
    sql
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn pool_error(err: PoolError, selection_timeout: Duration) -> CatalogError {
    match err {
        PoolError::Timeout(_) => CatalogError::Storage(StorageError::Timeout {
            operation: "acquire connection".to_string(),
            timeout_secs: selection_timeout.as_secs(),
        }),
        other => CatalogError::unavailable(other.to_string()),
    }
}

fn query_error(collection: &str, err: tokio_postgres::Error) -> CatalogError {
    match err.as_db_error() {
        Some(db) => CatalogError::Storage(StorageError::QueryFailed {
            collection: collection.to_string(),
            reason: db.message().to_string(),
        }),
        None => CatalogError::unavailable(err.to_string()),
    }
}

fn insert_error(collection: &str, err: tokio_postgres::Error) -> CatalogError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        return CatalogError::Storage(StorageError::InsertFailed {
            collection: collection.to_string(),
            reason: "duplicate id".to_string(),
        });
    }
    query_error(collection, err)
}

fn decode_error(collection: &str, err: tokio_postgres::Error) -> CatalogError {
    CatalogError::Storage(StorageError::QueryFailed {
        collection: collection.to_string(),
        reason: format!("unexpected row shape: {}", err),
    })
}

// ============================================================================
// ROW DECODING
// ============================================================================

fn reference_from_row(kind: ReferenceKind, row: &Row) -> CatalogResult<ReferenceItem> {
    let collection = kind.collection();
    let id: Uuid = row.try_get("id").map_err(|e| decode_error(collection, e))?;
    let display_name: String = row
        .try_get("display_name")
        .map_err(|e| decode_error(collection, e))?;
    let created_at: Timestamp = row
        .try_get("created_at")
        .map_err(|e| decode_error(collection, e))?;

    Ok(ReferenceItem {
        id: ReferenceItemId::new(id),
        display_name,
        created_at,
    })
}

fn product_from_row(row: &Row) -> CatalogResult<Product> {
    let decode = |e| decode_error(PRODUCTS_TABLE, e);
    let id: Uuid = row.try_get("id").map_err(decode)?;

    let mut references = References::default();
    for kind in ReferenceKind::ALL {
        let ids: Vec<Uuid> = row.try_get(product_column(kind)).map_err(decode)?;
        references.set(kind, ids.into_iter().map(ReferenceItemId::new).collect());
    }

    Ok(Product {
        id: ProductId::new(id),
        name: row.try_get("name").map_err(decode)?,
        link: row.try_get("link").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        references,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

fn reference_arrays(product: &Product) -> Vec<Vec<Uuid>> {
    ReferenceKind::ALL
        .into_iter()
        .map(|kind| {
            product
                .references
                .get(kind)
                .iter()
                .map(|id| id.as_uuid())
                .collect()
        })
        .collect()
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// [`CatalogStore`] backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
    selection_timeout: Duration,
    socket_timeout: Duration,
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("pool_size", &self.pool_size())
            .field("selection_timeout", &self.selection_timeout)
            .field("socket_timeout", &self.socket_timeout)
            .finish()
    }
}

impl PgStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: Pool, selection_timeout: Duration, socket_timeout: Duration) -> Self {
        Self {
            pool,
            selection_timeout,
            socket_timeout,
        }
    }

    /// Create a new store from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool, config.selection_timeout, config.socket_timeout))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Create every table if it does not exist yet.
    pub async fn ensure_schema(&self) -> CatalogResult<()> {
        let sql = schema_sql();
        self.bounded("ensure_schema", "schema", async {
            let conn = self.conn().await?;
            conn.batch_execute(&sql)
                .await
                .map_err(|e| query_error("schema", e))
        })
        .await?;
        tracing::info!("Database schema ready");
        Ok(())
    }

    async fn conn(&self) -> CatalogResult<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| pool_error(e, self.selection_timeout))
    }

    /// Run one store operation under the socket timeout and record its latency.
    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        collection: &str,
        fut: F,
    ) -> CatalogResult<T>
    where
        F: Future<Output = CatalogResult<T>>,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.socket_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Storage(StorageError::Timeout {
                operation: operation.to_string(),
                timeout_secs: self.socket_timeout.as_secs(),
            })),
        };

        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_db_operation(
                operation,
                collection,
                result.is_ok(),
                start.elapsed().as_secs_f64(),
            );
        }
        if let Err(err) = &result {
            tracing::debug!(operation, collection, error = %err, "Store operation failed");
        }
        result
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    // ========================================================================
    // REFERENCE OPERATIONS
    // ========================================================================

    async fn reference_list(&self, kind: ReferenceKind) -> CatalogResult<Vec<ReferenceItem>> {
        let sql = format!(
            "SELECT id, display_name, created_at FROM {} ORDER BY created_at ASC, id ASC",
            reference_table(kind)
        );
        self.bounded("reference_list", kind.collection(), async {
            let conn = self.conn().await?;
            let rows = conn
                .query(sql.as_str(), &[])
                .await
                .map_err(|e| query_error(kind.collection(), e))?;
            rows.iter().map(|row| reference_from_row(kind, row)).collect()
        })
        .await
    }

    async fn reference_get(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
    ) -> CatalogResult<Option<ReferenceItem>> {
        let sql = format!(
            "SELECT id, display_name, created_at FROM {} WHERE id = $1",
            reference_table(kind)
        );
        let id = id.as_uuid();
        self.bounded("reference_get", kind.collection(), async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(sql.as_str(), &[&id])
                .await
                .map_err(|e| query_error(kind.collection(), e))?;
            row.as_ref().map(|row| reference_from_row(kind, row)).transpose()
        })
        .await
    }

    async fn reference_find_many(
        &self,
        kind: ReferenceKind,
        ids: &[ReferenceItemId],
    ) -> CatalogResult<Vec<ReferenceItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, display_name, created_at FROM {} WHERE id = ANY($1)",
            reference_table(kind)
        );
        let ids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        self.bounded("reference_find_many", kind.collection(), async {
            let conn = self.conn().await?;
            let rows = conn
                .query(sql.as_str(), &[&ids])
                .await
                .map_err(|e| query_error(kind.collection(), e))?;
            rows.iter().map(|row| reference_from_row(kind, row)).collect()
        })
        .await
    }

    async fn reference_insert(
        &self,
        kind: ReferenceKind,
        item: &ReferenceItem,
    ) -> CatalogResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, display_name, created_at) VALUES ($1, $2, $3)",
            reference_table(kind)
        );
        let id = item.id.as_uuid();
        self.bounded("reference_insert", kind.collection(), async {
            let conn = self.conn().await?;
            conn.execute(sql.as_str(), &[&id, &item.display_name, &item.created_at])
                .await
                .map_err(|e| insert_error(kind.collection(), e))?;
            Ok(())
        })
        .await
    }

    async fn reference_rename(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
        display_name: &str,
    ) -> CatalogResult<Option<ReferenceItem>> {
        let sql = format!(
            "UPDATE {} SET display_name = $2 WHERE id = $1 \
             RETURNING id, display_name, created_at",
            reference_table(kind)
        );
        let id = id.as_uuid();
        self.bounded("reference_rename", kind.collection(), async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(sql.as_str(), &[&id, &display_name])
                .await
                .map_err(|e| query_error(kind.collection(), e))?;
            row.as_ref().map(|row| reference_from_row(kind, row)).transpose()
        })
        .await
    }

    async fn reference_delete(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
    ) -> CatalogResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", reference_table(kind));
        let id = id.as_uuid();
        self.bounded("reference_delete", kind.collection(), async {
            let conn = self.conn().await?;
            let affected = conn
                .execute(sql.as_str(), &[&id])
                .await
                .map_err(|e| query_error(kind.collection(), e))?;
            Ok(affected > 0)
        })
        .await
    }

    async fn reference_clear(&self, kind: ReferenceKind) -> CatalogResult<u64> {
        let sql = format!("DELETE FROM {}", reference_table(kind));
        self.bounded("reference_clear", kind.collection(), async {
            let conn = self.conn().await?;
            conn.execute(sql.as_str(), &[])
                .await
                .map_err(|e| query_error(kind.collection(), e))
        })
        .await
    }

    async fn reference_count(&self, kind: ReferenceKind) -> CatalogResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", reference_table(kind));
        self.bounded("reference_count", kind.collection(), async {
            let conn = self.conn().await?;
            let row = conn
                .query_one(sql.as_str(), &[])
                .await
                .map_err(|e| query_error(kind.collection(), e))?;
            let count: i64 = row
                .try_get(0)
                .map_err(|e| decode_error(kind.collection(), e))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    // ========================================================================
    // PRODUCT OPERATIONS
    // ========================================================================

    async fn product_list(&self) -> CatalogResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM {PRODUCTS_TABLE} ORDER BY created_at DESC, id DESC"
        );
        self.bounded("product_list", PRODUCTS_TABLE, async {
            let conn = self.conn().await?;
            let rows = conn
                .query(sql.as_str(), &[])
                .await
                .map_err(|e| query_error(PRODUCTS_TABLE, e))?;
            rows.iter().map(product_from_row).collect()
        })
        .await
    }

    async fn product_get(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM {PRODUCTS_TABLE} WHERE id = $1");
        let id = id.as_uuid();
        self.bounded("product_get", PRODUCTS_TABLE, async {
            let conn = self.conn().await?;
            let row = conn
                .query_opt(sql.as_str(), &[&id])
                .await
                .map_err(|e| query_error(PRODUCTS_TABLE, e))?;
            row.as_ref().map(product_from_row).transpose()
        })
        .await
    }

    async fn product_insert(&self, product: &Product) -> CatalogResult<()> {
        let sql = format!(
            "INSERT INTO {PRODUCTS_TABLE} ({PRODUCT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        );
        let id = product.id.as_uuid();
        let arrays = reference_arrays(product);
        self.bounded("product_insert", PRODUCTS_TABLE, async {
            let mut params: Vec<&(dyn ToSql + Sync)> = vec![
                &id,
                &product.name,
                &product.link,
                &product.description,
                &product.created_at,
            ];
            params.extend(arrays.iter().map(|ids| ids as &(dyn ToSql + Sync)));

            let conn = self.conn().await?;
            conn.execute(sql.as_str(), &params)
                .await
                .map_err(|e| insert_error(PRODUCTS_TABLE, e))?;
            Ok(())
        })
        .await
    }

    async fn product_replace(&self, product: &Product) -> CatalogResult<bool> {
        let assignments: Vec<String> = ReferenceKind::ALL
            .into_iter()
            .enumerate()
            .map(|(i, kind)| format!("{} = ${}", product_column(kind), i + 5))
            .collect();
        let sql = format!(
            "UPDATE {PRODUCTS_TABLE} SET name = $2, link = $3, description = $4, {} WHERE id = $1",
            assignments.join(", ")
        );
        let id = product.id.as_uuid();
        let arrays = reference_arrays(product);
        self.bounded("product_replace", PRODUCTS_TABLE, async {
            let mut params: Vec<&(dyn ToSql + Sync)> =
                vec![&id, &product.name, &product.link, &product.description];
            params.extend(arrays.iter().map(|ids| ids as &(dyn ToSql + Sync)));

            let conn = self.conn().await?;
            let affected = conn
                .execute(sql.as_str(), &params)
                .await
                .map_err(|e| query_error(PRODUCTS_TABLE, e))?;
            Ok(affected > 0)
        })
        .await
    }

    async fn product_delete(&self, id: ProductId) -> CatalogResult<bool> {
        let sql = format!("DELETE FROM {PRODUCTS_TABLE} WHERE id = $1");
        let id = id.as_uuid();
        self.bounded("product_delete", PRODUCTS_TABLE, async {
            let conn = self.conn().await?;
            let affected = conn
                .execute(sql.as_str(), &[&id])
                .await
                .map_err(|e| query_error(PRODUCTS_TABLE, e))?;
            Ok(affected > 0)
        })
        .await
    }

    async fn product_clear(&self) -> CatalogResult<u64> {
        let sql = format!("DELETE FROM {PRODUCTS_TABLE}");
        self.bounded("product_clear", PRODUCTS_TABLE, async {
            let conn = self.conn().await?;
            conn.execute(sql.as_str(), &[])
                .await
                .map_err(|e| query_error(PRODUCTS_TABLE, e))
        })
        .await
    }

    // ========================================================================
    // HEALTH
    // ========================================================================

    async fn ping(&self) -> CatalogResult<()> {
        self.bounded("ping", "database", async {
            let conn = self.conn().await?;
            conn.simple_query("SELECT 1")
                .await
                .map_err(|e| query_error("database", e))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::from_lookup(lookup(&[]));
        assert!(config.url.is_none());
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "rsi");
        assert_eq!(config.max_size, 5);
        assert_eq!(config.selection_timeout, Duration::from_secs(30));
        assert_eq!(config.socket_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_db_config_overrides() {
        let config = DbConfig::from_lookup(lookup(&[
            ("RSI_DATABASE_URL", "postgres://rsi@db/rsi"),
            ("RSI_DB_POOL_SIZE", "0"),
            ("RSI_DB_SOCKET_TIMEOUT_SECS", "3"),
        ]));
        assert_eq!(config.url.as_deref(), Some("postgres://rsi@db/rsi"));
        assert_eq!(config.max_size, 5);
        assert_eq!(config.socket_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_product_columns_follow_kind_order() {
        let columns: Vec<&str> = PRODUCT_COLUMNS.split(", ").skip(5).collect();
        let expected: Vec<&str> = ReferenceKind::ALL.into_iter().map(product_column).collect();
        assert_eq!(columns, expected);
    }

    #[test]
    fn test_schema_quotes_camel_case_tables() {
        let sql = schema_sql();
        assert!(sql.contains("\"rawMaterial\""));
        assert!(sql.contains("\"manufactoringProcess\""));
        assert!(sql.contains("\"type\""));
        assert!(sql.contains("raw_materials uuid[] NOT NULL DEFAULT '{}'"));
    }

    #[tokio::test]
    async fn test_pool_creation_is_lazy() {
        // Creating the pool does not connect; the first query does.
        let store = PgStore::from_config(&DbConfig::default()).unwrap();
        assert_eq!(store.pool_size(), 0);
    }
}
