//! Core type definitions for the archive
//!
//! Includes column descriptors, table descriptors and paged results.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::naming::{Domain, ParsedTable};
use crate::sql::Record;

// ============================================================================
// Columns
// ============================================================================

/// SQLite type affinity of a declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAffinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl ColumnAffinity {
    /// Determine affinity from a declared type the way SQLite does
    ///
    /// The rules are applied in order: `INT` gives integer; `CHAR`, `CLOB` or
    /// `TEXT` give text; `BLOB` or no type gives blob; `REAL`, `FLOA` or `DOUB`
    /// give real; anything else is numeric. Legacy types such as
    /// `NVARCHAR(50)` therefore count as text.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            ColumnAffinity::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            ColumnAffinity::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            ColumnAffinity::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            ColumnAffinity::Real
        } else {
            ColumnAffinity::Numeric
        }
    }
}

/// Column metadata read from the engine catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,

    /// Declared type as written in the table definition (may be empty)
    #[serde(rename = "type")]
    pub declared_type: String,

    pub nullable: bool,

    /// Default value literal as written in the table definition
    #[serde(rename = "default")]
    pub default_value: Option<String>,

    #[serde(rename = "pk")]
    pub primary_key: bool,
}

impl ColumnDescriptor {
    pub fn affinity(&self) -> ColumnAffinity {
        ColumnAffinity::from_declared(&self.declared_type)
    }

    /// Whether free-text search applies to this column
    pub fn is_textual(&self) -> bool {
        self.affinity() == ColumnAffinity::Text
    }
}

/// Names of the textual columns, in table order
pub fn text_columns(columns: &[ColumnDescriptor]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| c.is_textual())
        .map(|c| c.name.clone())
        .collect()
}

// ============================================================================
// Tables
// ============================================================================

/// A tenant table of the logical model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub tenant: String,
    pub domain: Domain,
    pub entity: String,
    pub row_count: i64,
}

impl TableDescriptor {
    pub fn new(parsed: &ParsedTable<'_>, row_count: i64) -> Self {
        Self {
            name: parsed.name.to_string(),
            tenant: parsed.tenant.to_string(),
            domain: parsed.domain,
            entity: parsed.entity.to_string(),
            row_count,
        }
    }
}

/// Structure, size and a few rows of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub row_count: i64,
    pub sample_data: Vec<Record>,
}

/// Row count of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCount {
    pub name: String,
    pub record_count: i64,
}

/// Size statistics over the whole archive
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_tables: usize,
    pub tables_with_data: usize,
    pub total_records: i64,
    pub tables: Vec<TableCount>,
}

impl DatabaseStats {
    pub fn from_counts(tables: Vec<TableCount>) -> Self {
        Self {
            total_tables: tables.len(),
            tables_with_data: tables.iter().filter(|t| t.record_count > 0).count(),
            total_records: tables.iter().map(|t| t.record_count).sum(),
            tables,
        }
    }
}

/// Key/value pairs written by the exporter into the metadata table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    pub entries: BTreeMap<String, String>,
    /// `export_date` entry, when it parses as a local ISO-8601 date-time
    pub export_date: Option<NaiveDateTime>,
}

impl ArchiveMetadata {
    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        let export_date = entries
            .get("export_date")
            .and_then(|value| parse_local_datetime(value));
        Self {
            entries,
            export_date,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

fn parse_local_datetime(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    let value = value.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

// ============================================================================
// Paged Results
// ============================================================================

/// One page of rows from a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult {
    /// Column names of the table, in table order
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    /// Number of rows matching the filter, ignoring pagination
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl PagedResult {
    /// Assemble a page
    ///
    /// An offset past the last matching row is clamped to `total`, so
    /// `offset + rows.len() <= total` holds for every page.
    pub fn new(columns: Vec<String>, rows: Vec<Record>, total: i64, limit: i64, offset: i64) -> Self {
        let offset = offset.min(total).max(0);
        let has_more = offset + (rows.len() as i64) < total;
        Self {
            columns,
            rows,
            total,
            limit,
            offset,
            has_more,
        }
    }

    /// Page of a missing or unreadable table
    pub fn empty(limit: i64) -> Self {
        Self::new(Vec::new(), Vec::new(), 0, limit, 0)
    }

    /// Number of pages of `limit` rows needed for all matching rows
    pub fn total_pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, declared: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            declared_type: declared.to_string(),
            nullable: true,
            default_value: None,
            primary_key: false,
        }
    }

    fn record(n: i64) -> Record {
        let mut r = Record::new();
        r.insert("ID".to_string(), serde_json::json!(n));
        r
    }

    // =========================================================================
    // Affinity Tests
    // =========================================================================

    #[test]
    fn test_affinity_text_types() {
        for declared in ["TEXT", "NVARCHAR(50)", "varchar", "CHAR(2)", "NCHAR", "CLOB", "ntext"] {
            assert_eq!(
                ColumnAffinity::from_declared(declared),
                ColumnAffinity::Text,
                "{declared}"
            );
        }
    }

    #[test]
    fn test_affinity_other_types() {
        assert_eq!(ColumnAffinity::from_declared("INTEGER"), ColumnAffinity::Integer);
        assert_eq!(ColumnAffinity::from_declared("BIGINT"), ColumnAffinity::Integer);
        assert_eq!(ColumnAffinity::from_declared("REAL"), ColumnAffinity::Real);
        assert_eq!(ColumnAffinity::from_declared("FLOAT"), ColumnAffinity::Real);
        assert_eq!(ColumnAffinity::from_declared("DOUBLE"), ColumnAffinity::Real);
        assert_eq!(ColumnAffinity::from_declared("BLOB"), ColumnAffinity::Blob);
        assert_eq!(ColumnAffinity::from_declared(""), ColumnAffinity::Blob);
        assert_eq!(ColumnAffinity::from_declared("DECIMAL(10,2)"), ColumnAffinity::Numeric);
        assert_eq!(ColumnAffinity::from_declared("DATETIME"), ColumnAffinity::Numeric);
    }

    #[test]
    fn test_affinity_int_wins_over_char() {
        // SQLite checks INT first: "CHARINT" has integer affinity
        assert_eq!(ColumnAffinity::from_declared("CHARINT"), ColumnAffinity::Integer);
    }

    #[test]
    fn test_text_columns() {
        let cols = vec![
            column("ID", "INTEGER"),
            column("NAZWA", "NVARCHAR(100)"),
            column("KWOTA", "DECIMAL"),
            column("MIASTO", "TEXT"),
        ];
        assert_eq!(text_columns(&cols), vec!["NAZWA", "MIASTO"]);
        assert!(text_columns(&cols[..1]).is_empty());
    }

    #[test]
    fn test_column_descriptor_serialization() {
        let col = ColumnDescriptor {
            name: "ID".into(),
            declared_type: "INTEGER".into(),
            nullable: false,
            default_value: Some("0".into()),
            primary_key: true,
        };
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], "INTEGER");
        assert_eq!(json["default"], "0");
        assert_eq!(json["pk"], true);
        assert_eq!(json["nullable"], false);
    }

    // =========================================================================
    // PagedResult Tests
    // =========================================================================

    #[test]
    fn test_paged_result_has_more() {
        let page = PagedResult::new(vec![], vec![record(1), record(2)], 5, 2, 0);
        assert!(page.has_more);
        let page = PagedResult::new(vec![], vec![record(5)], 5, 2, 4);
        assert!(!page.has_more);
    }

    #[test]
    fn test_paged_result_offset_past_end_is_clamped() {
        let page = PagedResult::new(vec![], vec![], 1, 2, 2);
        assert_eq!(page.offset, 1);
        assert!(!page.has_more);
        assert!(page.offset + page.rows.len() as i64 <= page.total);
    }

    #[test]
    fn test_paged_result_empty() {
        let page = PagedResult::empty(50);
        assert_eq!(page.total, 0);
        assert_eq!(page.limit, 50);
        assert_eq!(page.offset, 0);
        assert!(page.rows.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(PagedResult::new(vec![], vec![], 101, 50, 0).total_pages(), 3);
        assert_eq!(PagedResult::new(vec![], vec![], 100, 50, 0).total_pages(), 2);
        assert_eq!(PagedResult::empty(50).total_pages(), 0);
    }

    #[test]
    fn test_metadata_export_date() {
        let entries = BTreeMap::from([
            ("export_date".to_string(), "2024-03-05T14:07:09.123456".to_string()),
            ("source".to_string(), "mssql".to_string()),
        ]);
        let metadata = ArchiveMetadata::from_entries(entries);
        let date = metadata.export_date.unwrap();
        assert_eq!(date.format("%Y-%m-%d %H:%M").to_string(), "2024-03-05 14:07");
        assert_eq!(metadata.get("source"), Some("mssql"));
    }

    #[test]
    fn test_metadata_export_date_variants() {
        assert!(parse_local_datetime("2024-03-05 14:07:09").is_some());
        assert!(parse_local_datetime("2024-03-05T14:07:09").is_some());
        assert!(parse_local_datetime("2024-03-05T14:07:09+01:00").is_some());
        assert!(parse_local_datetime("2024-03-05").is_some());
        assert!(parse_local_datetime("yesterday").is_none());
    }

    #[test]
    fn test_metadata_without_export_date() {
        let metadata = ArchiveMetadata::from_entries(BTreeMap::new());
        assert!(metadata.export_date.is_none());
        assert!(metadata.entries.is_empty());
    }

    #[test]
    fn test_database_stats_from_counts() {
        let stats = DatabaseStats::from_counts(vec![
            TableCount {
                name: "a".into(),
                record_count: 3,
            },
            TableCount {
                name: "b".into(),
                record_count: 0,
            },
        ]);
        assert_eq!(stats.total_tables, 2);
        assert_eq!(stats.tables_with_data, 1);
        assert_eq!(stats.total_records, 3);
    }
}
