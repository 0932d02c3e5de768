//! # tenant-archive
//!
//! A read-only, multi-tenant access layer over a convention-named SQLite archive.
//!
//! Many small per-company databases were migrated from a legacy RDBMS into a
//! single SQLite file. Every table is named `{tenant}{marker}{entity}`, for
//! example `Acme_firma_dbo_FIRMA` or `Acme_Magazyn_dbo_dokTOW`. This crate
//! infers the tenants from those names and serves paginated, searchable reads
//! over any table.
//!
//! ## Features
//!
//! - **Tenant Discovery**: Summaries and details of every company, assembled from its tables
//! - **Schema Introspection**: Column metadata, row counts and samples from the SQLite catalog
//! - **Generic Reads**: Paginated fetches with free-text search and typed filter conditions
//! - **Best-Effort Lookups**: Missing or unreadable tables degrade to empty results
//! - **SQL Injection Prevention**: Identifiers are validated against the catalog and quoted
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tenant_archive::{ArchiveConfig, ArchiveStore, Condition, FetchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ArchiveConfig::builder("sqlite://dane_archiwalne.db").build();
//!     let store = ArchiveStore::open(config).await?;
//!
//!     for tenant in store.list_tenants().await? {
//!         println!("{} ({} documents)", tenant.name, tenant.documents_count);
//!     }
//!
//!     let page = store
//!         .fetch(
//!             &FetchRequest::new("Acme_firma_dbo_SlwKONTRAHENT")
//!                 .with_pagination(0, 20)
//!                 .with_search("Kraków")
//!                 .with_filter(Condition::is_null("KOD")),
//!         )
//!         .await?;
//!     println!("{} of {} rows", page.rows.len(), page.total);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use tenant_archive::ArchiveConfig;
//!
//! let config = ArchiveConfig::builder("sqlite://dane_archiwalne.db")
//!     .pool_size(2)               // Pooled read-only connections
//!     .max_limit(500)             // Largest accepted page size
//!     .min_search_len(2)          // Shortest accepted search text
//!     .detail_sample_limit(50)    // Rows sampled per child table
//!     .build();
//! ```

pub mod config;
pub mod error;
pub mod introspect;
pub mod naming;
pub mod reader;
pub mod sql;
pub mod store;
pub mod tenant;
pub mod types;

// Re-export main types for convenience
pub use config::{ArchiveConfig, ArchiveConfigBuilder};
pub use error::{ArchiveError, Lookup, Result};
pub use introspect::SchemaIntrospector;
pub use naming::{Domain, NamingConvention, ParsedTable};
pub use reader::{FetchRequest, TableReader};
pub use store::ArchiveStore;
pub use tenant::{Tenant, TenantAggregator, TenantDetail};
pub use types::{
    ArchiveMetadata, ColumnAffinity, ColumnDescriptor, DatabaseStats, PagedResult,
    TableCount, TableDescriptor, TableInfo,
};

// Re-export SQL utilities for advanced users
pub use sql::condition::{Condition, build_condition_clause, build_search_clause};
pub use sql::row::Record;
pub use sql::sanitize::{quote_identifier, validate_identifier};
