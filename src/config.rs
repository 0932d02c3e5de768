//! Configuration for ArchiveStore
//!
//! Provides a builder pattern for configuring the archive store.

use crate::naming::NamingConvention;

/// Configuration for the archive store
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// SQLite database URL or path (e.g. `sqlite://dane_archiwalne.db`)
    pub database_url: String,
    /// Maximum number of pooled connections
    pub pool_size: u32,
    /// Name of the exporter's key/value table (default: "_metadata")
    pub metadata_table: String,
    /// Page size when the caller gives none
    pub default_limit: i64,
    /// Largest page size a caller may request
    pub max_limit: i64,
    /// Shortest accepted search text, after trimming
    pub min_search_len: usize,
    /// Rows sampled from each child table of a tenant detail
    pub detail_sample_limit: i64,
    /// Rows sampled by table info
    pub info_sample_limit: i64,
    /// Matches returned per table by a search across all tables
    pub search_limit_per_table: i64,
    /// Table naming convention
    pub naming: NamingConvention,
}

impl ArchiveConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> ArchiveConfigBuilder {
        ArchiveConfigBuilder::new(database_url)
    }
}

/// Builder for ArchiveConfig
#[derive(Debug)]
pub struct ArchiveConfigBuilder {
    config: ArchiveConfig,
}

impl ArchiveConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            config: ArchiveConfig {
                database_url: database_url.into(),
                pool_size: 4,
                metadata_table: "_metadata".to_string(),
                default_limit: 100,
                max_limit: 1000,
                min_search_len: 1,
                detail_sample_limit: 20,
                info_sample_limit: 3,
                search_limit_per_table: 10,
                naming: NamingConvention::default(),
            },
        }
    }

    /// Set the maximum pool size (default: 4)
    pub fn pool_size(mut self, size: u32) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the metadata table name (default: "_metadata")
    pub fn metadata_table(mut self, name: impl Into<String>) -> Self {
        self.config.metadata_table = name.into();
        self
    }

    /// Set the default page size (default: 100)
    pub fn default_limit(mut self, limit: i64) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Set the largest accepted page size (default: 1000)
    pub fn max_limit(mut self, limit: i64) -> Self {
        self.config.max_limit = limit;
        self
    }

    /// Set the shortest accepted search text (default: 1)
    pub fn min_search_len(mut self, len: usize) -> Self {
        self.config.min_search_len = len;
        self
    }

    /// Set the number of child rows in a tenant detail (default: 20)
    pub fn detail_sample_limit(mut self, limit: i64) -> Self {
        self.config.detail_sample_limit = limit;
        self
    }

    /// Set the number of sample rows in table info (default: 3)
    pub fn info_sample_limit(mut self, limit: i64) -> Self {
        self.config.info_sample_limit = limit;
        self
    }

    /// Set the number of matches per table in a global search (default: 10)
    pub fn search_limit_per_table(mut self, limit: i64) -> Self {
        self.config.search_limit_per_table = limit;
        self
    }

    /// Replace the table naming convention
    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.config.naming = naming;
        self
    }

    /// Build the configuration
    ///
    /// The maximum page size is at least 1 and the default page size is
    /// clamped into `1..=max_limit`, so a request without a limit is always
    /// accepted.
    pub fn build(mut self) -> ArchiveConfig {
        self.config.max_limit = self.config.max_limit.max(1);
        self.config.default_limit = self.config.default_limit.clamp(1, self.config.max_limit);
        self.config
    }
}
