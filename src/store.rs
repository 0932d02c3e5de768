//! ArchiveStore - Main entry point for reading a tenant archive
//!
//! This module provides the `ArchiveStore` struct that owns the connection pool
//! and hands one pooled connection to the components for each operation.

use std::collections::BTreeMap;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions};
use tracing::instrument;

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Lookup, Result};
use crate::introspect::SchemaIntrospector;
use crate::reader::{FetchRequest, TableReader};
use crate::sql::Record;
use crate::tenant::{Tenant, TenantAggregator, TenantDetail};
use crate::types::{
    ArchiveMetadata, ColumnDescriptor, DatabaseStats, PagedResult, TableDescriptor, TableInfo,
};

/// Read-only view of a convention-named SQLite archive
///
/// Every operation acquires a single connection from the pool, runs its
/// queries on it in sequence and returns it when done.
pub struct ArchiveStore {
    /// Database connection pool
    pool: SqlitePool,
    /// Store configuration
    config: ArchiveConfig,
}

impl ArchiveStore {
    /// Open the archive read-only
    ///
    /// The database file must already exist; it is never created.
    pub async fn open(config: ArchiveConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| ArchiveError::connection(format!("Invalid database URL: {}", e)))?
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size.max(1))
            .connect_with(options)
            .await
            .map_err(|e| ArchiveError::connection(format!("Database connection failed: {}", e)))?;

        tracing::info!(url = %config.database_url, pool_size = config.pool_size, "archive opened");
        Ok(Self { pool, config })
    }

    /// Create an ArchiveStore from an existing pool
    ///
    /// The pool is used as given; read-only mode is up to the caller.
    pub fn from_pool(pool: SqlitePool, config: ArchiveConfig) -> Self {
        Self { pool, config }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| ArchiveError::connection(format!("Failed to acquire connection: {}", e)))
    }

    pub fn introspector(&self) -> SchemaIntrospector<'_> {
        SchemaIntrospector::new(&self.config)
    }

    pub fn reader(&self) -> TableReader<'_> {
        TableReader::new(&self.config)
    }

    pub fn tenants(&self) -> TenantAggregator<'_> {
        TenantAggregator::new(&self.config)
    }

    // =========================================================================
    // Schema Operations
    // =========================================================================

    /// All data tables in lexicographic order
    #[instrument(skip(self), err)]
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let mut conn = self.acquire().await?;
        self.introspector().list_tables(&mut conn).await
    }

    /// Column metadata of a table
    #[instrument(skip(self), err)]
    pub async fn describe(&self, table: &str) -> Result<Lookup<Vec<ColumnDescriptor>>> {
        let mut conn = self.acquire().await?;
        self.introspector().describe(&mut conn, table).await
    }

    /// Row count of a table
    #[instrument(skip(self), err)]
    pub async fn count(&self, table: &str) -> Result<Lookup<i64>> {
        let mut conn = self.acquire().await?;
        self.introspector().count(&mut conn, table).await
    }

    /// Columns, row count and sample rows of a table
    #[instrument(skip(self), err)]
    pub async fn table_info(&self, table: &str) -> Result<Option<TableInfo>> {
        let mut conn = self.acquire().await?;
        self.introspector().table_info(&mut conn, table).await
    }

    #[instrument(skip(self), err)]
    pub async fn database_stats(&self) -> Result<DatabaseStats> {
        let mut conn = self.acquire().await?;
        self.introspector().database_stats(&mut conn).await
    }

    /// Exporter metadata, empty when the archive has none
    #[instrument(skip(self), err)]
    pub async fn metadata(&self) -> Result<ArchiveMetadata> {
        let mut conn = self.acquire().await?;
        self.introspector().metadata(&mut conn).await
    }

    // =========================================================================
    // Data Operations
    // =========================================================================

    /// Read one page of a table
    #[instrument(skip_all, fields(table = %request.table), err)]
    pub async fn fetch(&self, request: &FetchRequest) -> Result<PagedResult> {
        let mut conn = self.acquire().await?;
        self.reader().fetch(&mut conn, request).await
    }

    /// Search every table, keyed by table name
    #[instrument(skip(self), err)]
    pub async fn search_all(
        &self,
        text: &str,
        limit_per_table: Option<i64>,
    ) -> Result<BTreeMap<String, Vec<Record>>> {
        let mut conn = self.acquire().await?;
        self.reader().search_all(&mut conn, text, limit_per_table).await
    }

    // =========================================================================
    // Tenant Operations
    // =========================================================================

    #[instrument(skip(self), err)]
    pub async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let mut conn = self.acquire().await?;
        self.tenants().list_tenants(&mut conn).await
    }

    #[instrument(skip(self), err)]
    pub async fn tenant_detail(&self, key: &str) -> Result<Option<TenantDetail>> {
        let mut conn = self.acquire().await?;
        self.tenants().tenant_detail(&mut conn, key).await
    }

    /// Tables grouped by tenant with row counts
    #[instrument(skip(self), err)]
    pub async fn table_groups(&self) -> Result<BTreeMap<String, Vec<TableDescriptor>>> {
        let mut conn = self.acquire().await?;
        self.tenants().table_groups(&mut conn).await
    }
}
