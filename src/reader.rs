//! Generic paginated reads over any archive table

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Lookup, Result};
use crate::introspect::SchemaIntrospector;
use crate::sql::row::bind_param_as;
use crate::sql::{
    Condition, Record, bind_param, build_condition_clause, build_search_clause, quote_identifier,
    row_to_record,
};
use crate::types::{PagedResult, text_columns};

/// Request to read one page of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub table: String,
    /// Page size; the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Number of matching rows to skip
    #[serde(default)]
    pub offset: i64,
    /// Free text matched against every textual column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Additional condition, AND-combined with the search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Condition>,
}

impl FetchRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            limit: None,
            offset: 0,
            search: None,
            filter: None,
        }
    }

    /// Request a 1-based page of `per_page` rows
    pub fn page(table: impl Into<String>, page: i64, per_page: i64) -> Self {
        Self::new(table).with_pagination(page.saturating_sub(1).saturating_mul(per_page), per_page)
    }

    /// Set pagination
    pub fn with_pagination(mut self, offset: i64, limit: i64) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_filter(mut self, filter: Condition) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Builds and runs filtered, searched, paginated queries
#[derive(Debug, Clone, Copy)]
pub struct TableReader<'a> {
    config: &'a ArchiveConfig,
    introspector: SchemaIntrospector<'a>,
}

impl<'a> TableReader<'a> {
    pub fn new(config: &'a ArchiveConfig) -> Self {
        Self {
            config,
            introspector: SchemaIntrospector::new(config),
        }
    }

    fn checked_limit(&self, limit: Option<i64>) -> Result<i64> {
        let limit = limit.unwrap_or(self.config.default_limit);
        if limit < 1 || limit > self.config.max_limit {
            return Err(ArchiveError::validation(format!(
                "limit must be between 1 and {}, got {}",
                self.config.max_limit, limit
            )));
        }
        Ok(limit)
    }

    /// Trimmed search text, `None` when blank
    fn checked_search<'r>(&self, search: Option<&'r str>) -> Result<Option<&'r str>> {
        let Some(text) = search.map(str::trim).filter(|text| !text.is_empty()) else {
            return Ok(None);
        };
        if text.chars().count() < self.config.min_search_len {
            return Err(ArchiveError::validation(format!(
                "search text must be at least {} characters",
                self.config.min_search_len
            )));
        }
        Ok(Some(text))
    }

    /// Read one page of a table
    ///
    /// A table that is missing or cannot be queried yields an empty page.
    /// Invalid pagination, search text or filter fields are rejected.
    pub async fn fetch(
        &self,
        conn: &mut SqliteConnection,
        request: &FetchRequest,
    ) -> Result<PagedResult> {
        let limit = self.checked_limit(request.limit)?;
        if request.offset < 0 {
            return Err(ArchiveError::validation(format!(
                "offset must not be negative, got {}",
                request.offset
            )));
        }
        let search = self.checked_search(request.search.as_deref())?;
        let Some(table_name) = self.introspector.canonical_name(conn, &request.table).await? else {
            tracing::debug!(table = %request.table, "table not in catalog");
            return Ok(PagedResult::empty(limit));
        };

        let columns = match self.introspector.describe(conn, &table_name).await? {
            Lookup::Found(columns) => columns,
            _ => return Ok(PagedResult::empty(limit)),
        };
        let column_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(text) = search {
            // No textual columns means no search predicate at all
            if let Some((clause, search_params)) = build_search_clause(&text_columns(&columns), text)
            {
                conditions.push(format!("({})", clause));
                params.extend(search_params);
            }
        }

        if let Some(filter) = &request.filter {
            let (clause, filter_params) = build_condition_clause(filter, &column_names)
                .map_err(ArchiveError::InvalidCondition)?;
            conditions.push(format!("({})", clause));
            params.extend(filter_params);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let table = quote_identifier(&table_name);

        // Count query
        let count_sql = format!("SELECT COUNT(*) FROM {}{}", table, where_clause);
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        for param in &params {
            count_query = bind_param_as(count_query, param);
        }
        let total = match Lookup::absorb(count_query.fetch_one(&mut *conn).await, &table_name)? {
            Lookup::Found((total,)) => total,
            _ => return Ok(PagedResult::empty(limit)),
        };

        // Select query
        let select_sql = format!("SELECT * FROM {}{} LIMIT ? OFFSET ?", table, where_clause);
        let mut select_query = sqlx::query(&select_sql);
        for param in &params {
            select_query = bind_param(select_query, param);
        }
        let result = select_query
            .bind(limit)
            .bind(request.offset)
            .fetch_all(&mut *conn)
            .await;
        let rows: Vec<Record> = match Lookup::absorb(result, &table_name)? {
            Lookup::Found(rows) => rows.iter().map(row_to_record).collect(),
            _ => return Ok(PagedResult::empty(limit)),
        };

        Ok(PagedResult::new(
            column_names,
            rows,
            total,
            limit,
            request.offset,
        ))
    }

    /// Search every table with textual columns
    ///
    /// Returns up to `limit_per_table` matches for each table that has any,
    /// keyed by table name. Tables that fail to query are skipped.
    pub async fn search_all(
        &self,
        conn: &mut SqliteConnection,
        text: &str,
        limit_per_table: Option<i64>,
    ) -> Result<BTreeMap<String, Vec<Record>>> {
        let Some(text) = self.checked_search(Some(text))? else {
            return Err(ArchiveError::validation("search text must not be empty"));
        };
        let limit = limit_per_table.unwrap_or(self.config.search_limit_per_table);
        let limit = self.checked_limit(Some(limit))?;

        let mut matches = BTreeMap::new();
        for table in self.introspector.list_tables(conn).await? {
            let Lookup::Found(columns) = self.introspector.describe(conn, &table).await? else {
                continue;
            };
            let Some((clause, params)) = build_search_clause(&text_columns(&columns), text) else {
                continue;
            };

            let select_sql = format!(
                "SELECT * FROM {} WHERE {} LIMIT ?",
                quote_identifier(&table),
                clause
            );
            let mut query = sqlx::query(&select_sql);
            for param in &params {
                query = bind_param(query, param);
            }
            let result = query.bind(limit).fetch_all(&mut *conn).await;

            if let Lookup::Found(rows) = Lookup::absorb(result, &table)? {
                if !rows.is_empty() {
                    matches.insert(table, rows.iter().map(row_to_record).collect());
                }
            }
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_config() -> ArchiveConfig {
        ArchiveConfig::builder("sqlite::memory:")
            .max_limit(500)
            .min_search_len(3)
            .build()
    }

    #[test]
    fn test_fetch_request_defaults() {
        let request = FetchRequest::new("Acme_firma_dbo_FIRMA");
        assert_eq!(request.limit, None);
        assert_eq!(request.offset, 0);
        assert!(request.search.is_none());
        assert!(request.filter.is_none());
    }

    #[test]
    fn test_fetch_request_page() {
        let request = FetchRequest::page("t", 3, 50);
        assert_eq!(request.offset, 100);
        assert_eq!(request.limit, Some(50));

        let request = FetchRequest::page("t", 1, 50);
        assert_eq!(request.offset, 0);
    }

    #[test]
    fn test_fetch_request_deserialization() {
        let json = r#"{"table":"t","offset":20,"search":"Kraków","filter":{"op":"is_null","field":"KOD"}}"#;
        let request: FetchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.table, "t");
        assert_eq!(request.limit, None);
        assert_eq!(request.offset, 20);
        assert_eq!(request.search.as_deref(), Some("Kraków"));
        assert_eq!(request.filter, Some(Condition::is_null("KOD")));
    }

    #[test]
    fn test_checked_limit() {
        let config = reader_config();
        let reader = TableReader::new(&config);
        assert_eq!(reader.checked_limit(None).unwrap(), 100);
        assert_eq!(reader.checked_limit(Some(500)).unwrap(), 500);
        assert!(reader.checked_limit(Some(0)).is_err());
        assert!(reader.checked_limit(Some(-5)).is_err());
        assert!(reader.checked_limit(Some(501)).is_err());
    }

    #[test]
    fn test_checked_search() {
        let config = reader_config();
        let reader = TableReader::new(&config);
        assert_eq!(reader.checked_search(None).unwrap(), None);
        assert_eq!(reader.checked_search(Some("")).unwrap(), None);
        assert_eq!(reader.checked_search(Some("   ")).unwrap(), None);
        assert_eq!(reader.checked_search(Some(" Łódź ")).unwrap(), Some("Łódź"));
        assert!(matches!(
            reader.checked_search(Some("ab")),
            Err(ArchiveError::Validation(_))
        ));
    }
}
