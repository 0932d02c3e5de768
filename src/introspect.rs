//! Schema introspection over the SQLite catalog
//!
//! Every lookup that names a table first checks the name against the catalog,
//! so only names the engine itself reports are ever interpolated into SQL.

use sqlx::SqliteConnection;

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Lookup, Result};
use crate::sql::row::{get_ignore_case, value_to_text};
use crate::sql::{Record, quote_identifier, row_to_record, validate_identifier};
use crate::types::{ArchiveMetadata, ColumnDescriptor, DatabaseStats, TableCount, TableInfo};

/// Reads table lists, column metadata and row counts
#[derive(Debug, Clone, Copy)]
pub struct SchemaIntrospector<'a> {
    config: &'a ArchiveConfig,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(config: &'a ArchiveConfig) -> Self {
        Self { config }
    }

    fn is_hidden(&self, table: &str) -> bool {
        table.eq_ignore_ascii_case(&self.config.metadata_table)
            || self.config.naming.is_reserved(table)
    }

    /// All data tables in lexicographic order
    ///
    /// Engine tables, reserved prefixes and the metadata table are left out.
    pub async fn list_tables(&self, conn: &mut SqliteConnection) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&mut *conn)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(name,)| name)
            .filter(|name| !self.is_hidden(name))
            .collect())
    }

    /// Catalog spelling of a table name
    ///
    /// SQLite resolves identifiers case-insensitively, so `acme_firma_dbo_firma`
    /// finds `Acme_firma_dbo_FIRMA`. Only the returned name is ever quoted into
    /// a query.
    pub async fn canonical_name(
        &self,
        conn: &mut SqliteConnection,
        table: &str,
    ) -> Result<Option<String>> {
        validate_identifier(table).map_err(ArchiveError::Validation)?;

        let name: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE LIMIT 1",
        )
        .bind(table)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(name)
    }

    /// Whether the catalog knows the table, ignoring case
    pub async fn table_exists(&self, conn: &mut SqliteConnection, table: &str) -> Result<bool> {
        Ok(self.canonical_name(conn, table).await?.is_some())
    }

    /// Column metadata of a table, in declaration order
    pub async fn describe(
        &self,
        conn: &mut SqliteConnection,
        table: &str,
    ) -> Result<Lookup<Vec<ColumnDescriptor>>> {
        let Some(table) = self.canonical_name(conn, table).await? else {
            return Ok(Lookup::Missing);
        };

        let result: std::result::Result<Vec<(String, String, i64, Option<String>, i64)>, _> =
            sqlx::query_as(
                r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#,
            )
            .bind(&table)
            .fetch_all(&mut *conn)
            .await;

        let columns = Lookup::absorb(result, &table)?.map(|rows| {
            rows.into_iter()
                .map(|(name, declared_type, not_null, default_value, pk)| ColumnDescriptor {
                    name,
                    declared_type,
                    nullable: not_null == 0,
                    default_value,
                    primary_key: pk > 0,
                })
                .collect()
        });

        Ok(columns)
    }

    /// Number of rows in a table
    pub async fn count(&self, conn: &mut SqliteConnection, table: &str) -> Result<Lookup<i64>> {
        let Some(table) = self.canonical_name(conn, table).await? else {
            return Ok(Lookup::Missing);
        };

        let count_sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&table));
        let result = sqlx::query_as::<_, (i64,)>(&count_sql)
            .fetch_one(&mut *conn)
            .await;

        Ok(Lookup::absorb(result, &table)?.map(|(count,)| count))
    }

    /// Up to `limit` rows of a table, in storage order
    pub async fn sample(
        &self,
        conn: &mut SqliteConnection,
        table: &str,
        limit: i64,
    ) -> Result<Lookup<Vec<Record>>> {
        let Some(table) = self.canonical_name(conn, table).await? else {
            return Ok(Lookup::Missing);
        };

        let select_sql = format!("SELECT * FROM {} LIMIT ?", quote_identifier(&table));
        let result = sqlx::query(&select_sql)
            .bind(limit)
            .fetch_all(&mut *conn)
            .await;

        Ok(Lookup::absorb(result, &table)?.map(|rows| rows.iter().map(row_to_record).collect()))
    }

    /// The first row of a table, which is the only one for profile tables
    pub async fn first_row(
        &self,
        conn: &mut SqliteConnection,
        table: &str,
    ) -> Result<Lookup<Option<Record>>> {
        Ok(self
            .sample(conn, table, 1)
            .await?
            .map(|rows| rows.into_iter().next()))
    }

    /// Columns, row count and a few sample rows of a table
    ///
    /// Returns `None` when the table is not in the catalog.
    pub async fn table_info(
        &self,
        conn: &mut SqliteConnection,
        table: &str,
    ) -> Result<Option<TableInfo>> {
        let Some(table) = self.canonical_name(conn, table).await? else {
            return Ok(None);
        };
        let columns = self.describe(conn, &table).await?.or_default();
        let row_count = self.count(conn, &table).await?.or_default();
        let sample_data = self
            .sample(conn, &table, self.config.info_sample_limit)
            .await?
            .or_default();

        Ok(Some(TableInfo {
            name: table,
            columns,
            row_count,
            sample_data,
        }))
    }

    /// Row counts of every data table
    pub async fn database_stats(&self, conn: &mut SqliteConnection) -> Result<DatabaseStats> {
        let tables = self.list_tables(conn).await?;

        let mut counts = Vec::with_capacity(tables.len());
        for name in tables {
            let record_count = self.count(conn, &name).await?.or_default();
            counts.push(TableCount { name, record_count });
        }

        Ok(DatabaseStats::from_counts(counts))
    }

    /// Key/value pairs written by the exporter
    ///
    /// An archive without a metadata table yields empty metadata.
    pub async fn metadata(&self, conn: &mut SqliteConnection) -> Result<ArchiveMetadata> {
        let Some(table) = self
            .canonical_name(conn, &self.config.metadata_table)
            .await?
        else {
            return Ok(ArchiveMetadata::default());
        };

        let select_sql = format!("SELECT key, value FROM {}", quote_identifier(&table));
        let result = sqlx::query(&select_sql).fetch_all(&mut *conn).await;

        let entries = Lookup::absorb(result, &table)?
            .or_default()
            .iter()
            .map(row_to_record)
            .filter_map(|record| {
                let key = value_to_text(get_ignore_case(&record, "key"))?;
                let value = value_to_text(get_ignore_case(&record, "value")).unwrap_or_default();
                Some((key, value))
            })
            .collect();

        Ok(ArchiveMetadata::from_entries(entries))
    }
}
