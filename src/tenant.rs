//! Tenant summaries and details assembled from the naming convention

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::introspect::SchemaIntrospector;
use crate::naming::ParsedTable;
use crate::sql::row::{get_ignore_case, value_to_text};
use crate::sql::{Record, validate_identifier};
use crate::types::TableDescriptor;

/// Summary of one company in the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant key taken from the table names
    #[serde(rename = "db_name")]
    pub key: String,
    /// Display name, the key when the profile has none
    #[serde(rename = "nazwa")]
    pub name: String,
    /// Tax identification number
    pub nip: Option<String>,
    /// Business registry number
    pub regon: Option<String>,
    #[serde(rename = "miasto")]
    pub city: Option<String>,
    #[serde(rename = "ulica")]
    pub street: Option<String>,
    #[serde(rename = "kod")]
    pub postal_code: Option<String>,
    #[serde(rename = "kontrahenci_count")]
    pub contacts_count: i64,
    #[serde(rename = "dokumenty_count")]
    pub documents_count: i64,
}

impl Tenant {
    /// Build a summary from the profile root row and the optional address row
    pub fn from_rows(
        key: &str,
        root: &Record,
        address: Option<&Record>,
        contacts_count: i64,
        documents_count: i64,
    ) -> Self {
        let root_field = |column: &str| value_to_text(get_ignore_case(root, column));
        let address_field =
            |column: &str| address.and_then(|row| value_to_text(get_ignore_case(row, column)));
        Self {
            key: key.to_string(),
            name: root_field("NAZWA").unwrap_or_else(|| key.to_string()),
            nip: root_field("NIP"),
            regon: root_field("REGON"),
            city: address_field("MIASTO"),
            street: address_field("ULICA"),
            postal_code: address_field("KOD"),
            contacts_count,
            documents_count,
        }
    }
}

/// Everything the archive holds about one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantDetail {
    #[serde(rename = "db_name")]
    pub key: String,
    /// Profile root row
    #[serde(rename = "firma")]
    pub profile: Option<Record>,
    #[serde(rename = "adres")]
    pub address: Option<Record>,
    /// Sampled contractors
    #[serde(rename = "kontrahenci")]
    pub contacts: Vec<Record>,
    /// Sampled warehouse documents
    #[serde(rename = "dokumenty")]
    pub documents: Vec<Record>,
    /// Every table of the tenant with its row count
    pub tables: Vec<TableDescriptor>,
}

/// Composes tenant views out of introspection lookups
#[derive(Debug, Clone, Copy)]
pub struct TenantAggregator<'a> {
    config: &'a ArchiveConfig,
    introspector: SchemaIntrospector<'a>,
}

impl<'a> TenantAggregator<'a> {
    pub fn new(config: &'a ArchiveConfig) -> Self {
        Self {
            config,
            introspector: SchemaIntrospector::new(config),
        }
    }

    /// Summaries of every tenant that has a profile root row, by table name
    pub async fn list_tenants(&self, conn: &mut SqliteConnection) -> Result<Vec<Tenant>> {
        let naming = &self.config.naming;
        let mut tenants = Vec::new();

        for table in self.introspector.list_tables(conn).await? {
            let Some(key) = naming.root_tenant(&table) else {
                continue;
            };
            if validate_identifier(&table).is_err() {
                tracing::warn!(table = %table, "skipping tenant with unusable table name");
                continue;
            }

            let root = self.introspector.first_row(conn, &table).await?;
            let Some(root) = root.found().flatten() else {
                tracing::debug!(tenant = key, "skipping tenant without profile row");
                continue;
            };

            let address = self
                .introspector
                .first_row(conn, &naming.address_table(key))
                .await?
                .found()
                .flatten();
            let contacts_count = self
                .introspector
                .count(conn, &naming.contacts_table(key))
                .await?
                .or_default();
            let documents_count = self
                .introspector
                .count(conn, &naming.ledger_table(key))
                .await?
                .or_default();

            tenants.push(Tenant::from_rows(
                key,
                &root,
                address.as_ref(),
                contacts_count,
                documents_count,
            ));
        }

        Ok(tenants)
    }

    /// Full view of one tenant, `None` when the key owns no tables
    pub async fn tenant_detail(
        &self,
        conn: &mut SqliteConnection,
        key: &str,
    ) -> Result<Option<TenantDetail>> {
        validate_identifier(key).map_err(ArchiveError::Validation)?;
        let naming = &self.config.naming;

        let tables = self.introspector.list_tables(conn).await?;
        let owned: Vec<ParsedTable<'_>> = tables
            .iter()
            .filter_map(|table| naming.parse(table))
            .filter(|parsed| parsed.tenant == key)
            .collect();
        if owned.is_empty() {
            return Ok(None);
        }

        let descriptors = self.describe_tables(conn, &owned).await?;
        let profile = self
            .introspector
            .first_row(conn, &naming.root_table(key))
            .await?
            .found()
            .flatten();
        let address = self
            .introspector
            .first_row(conn, &naming.address_table(key))
            .await?
            .found()
            .flatten();
        let contacts = self
            .introspector
            .sample(conn, &naming.contacts_table(key), self.config.detail_sample_limit)
            .await?
            .or_default();
        let documents = self
            .introspector
            .sample(conn, &naming.ledger_table(key), self.config.detail_sample_limit)
            .await?
            .or_default();

        Ok(Some(TenantDetail {
            key: key.to_string(),
            profile,
            address,
            contacts,
            documents,
            tables: descriptors,
        }))
    }

    /// Every parseable table grouped by tenant, with row counts
    pub async fn table_groups(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<BTreeMap<String, Vec<TableDescriptor>>> {
        let tables = self.introspector.list_tables(conn).await?;
        let groups = self
            .config
            .naming
            .group_by_tenant(tables.iter().map(String::as_str));

        let mut described = BTreeMap::new();
        for (tenant, parsed) in groups {
            let descriptors = self.describe_tables(conn, &parsed).await?;
            described.insert(tenant, descriptors);
        }
        Ok(described)
    }

    async fn describe_tables(
        &self,
        conn: &mut SqliteConnection,
        tables: &[ParsedTable<'_>],
    ) -> Result<Vec<TableDescriptor>> {
        let mut descriptors = Vec::with_capacity(tables.len());
        for parsed in tables {
            // Names with quote characters cannot be counted safely
            let row_count = match validate_identifier(parsed.name) {
                Ok(()) => self.introspector.count(conn, parsed.name).await?.or_default(),
                Err(_) => 0,
            };
            descriptors.push(TableDescriptor::new(parsed, row_count));
        }
        Ok(descriptors)
    }
}
