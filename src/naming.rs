//! Table naming convention of the archive
//!
//! Every migrated table is named `{tenant}{marker}{entity}`, where the marker
//! identifies one of two domains: `_firma_` for the company profile database
//! and `_Magazyn_` for the warehouse/ledger database. For example
//! `Acme_firma_dbo_FIRMA` is the `dbo_FIRMA` entity of tenant `Acme`.
//!
//! A tenant key that itself contains a marker is split at the first marker and
//! therefore misparsed. The convention has no escape mechanism, so such keys
//! are unsupported.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Table group a table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    /// Company profile tables (`_firma_`)
    #[serde(rename = "firma")]
    Profile,
    /// Warehouse and ledger tables (`_Magazyn_`)
    #[serde(rename = "magazyn")]
    Ledger,
}

/// A table name split into its convention parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTable<'a> {
    pub name: &'a str,
    pub tenant: &'a str,
    pub domain: Domain,
    pub entity: &'a str,
}

/// The naming convention used to discover tenants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    pub profile_marker: String,
    pub ledger_marker: String,
    /// Tables starting with any of these never belong to a tenant
    pub reserved_prefixes: Vec<String>,
    /// Profile entity holding the company's own record
    pub root_entity: String,
    /// Profile entity holding the company's address
    pub address_entity: String,
    /// Profile entity holding contractors
    pub contacts_entity: String,
    /// Ledger entity holding warehouse documents
    pub ledger_entity: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            profile_marker: "_firma_".to_string(),
            ledger_marker: "_Magazyn_".to_string(),
            reserved_prefixes: vec!["sqlite_".to_string(), "_".to_string()],
            root_entity: "dbo_FIRMA".to_string(),
            address_entity: "dbo_ADRESY".to_string(),
            contacts_entity: "dbo_SlwKONTRAHENT".to_string(),
            ledger_entity: "dbo_dokTOW".to_string(),
        }
    }
}

impl NamingConvention {
    pub fn marker(&self, domain: Domain) -> &str {
        match domain {
            Domain::Profile => &self.profile_marker,
            Domain::Ledger => &self.ledger_marker,
        }
    }

    pub fn is_reserved(&self, table: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| table.starts_with(prefix.as_str()))
    }

    /// Split a table name into tenant, domain and entity
    ///
    /// Returns `None` for reserved tables, tables without a marker, and
    /// names that would leave the tenant or the entity empty. The profile
    /// marker takes precedence when both are present.
    pub fn parse<'a>(&self, table: &'a str) -> Option<ParsedTable<'a>> {
        if self.is_reserved(table) {
            return None;
        }

        let (tenant, domain, entity) = [Domain::Profile, Domain::Ledger]
            .into_iter()
            .find_map(|domain| {
                table
                    .split_once(self.marker(domain))
                    .map(|(tenant, entity)| (tenant, domain, entity))
            })?;

        if tenant.is_empty() || entity.is_empty() {
            return None;
        }

        Some(ParsedTable {
            name: table,
            tenant,
            domain,
            entity,
        })
    }

    /// Build the conventional table name of a tenant entity
    pub fn table_name(&self, tenant: &str, domain: Domain, entity: &str) -> String {
        format!("{}{}{}", tenant, self.marker(domain), entity)
    }

    pub fn root_table(&self, tenant: &str) -> String {
        self.table_name(tenant, Domain::Profile, &self.root_entity)
    }

    pub fn address_table(&self, tenant: &str) -> String {
        self.table_name(tenant, Domain::Profile, &self.address_entity)
    }

    pub fn contacts_table(&self, tenant: &str) -> String {
        self.table_name(tenant, Domain::Profile, &self.contacts_entity)
    }

    pub fn ledger_table(&self, tenant: &str) -> String {
        self.table_name(tenant, Domain::Ledger, &self.ledger_entity)
    }

    /// Whether the table is a tenant's profile root, returning the tenant key
    pub fn root_tenant<'a>(&self, table: &'a str) -> Option<&'a str> {
        self.parse(table)
            .filter(|parsed| parsed.domain == Domain::Profile && parsed.entity == self.root_entity)
            .map(|parsed| parsed.tenant)
    }

    /// Group table names by tenant, preserving input order within each group
    pub fn group_by_tenant<'a, I>(&self, tables: I) -> BTreeMap<String, Vec<ParsedTable<'a>>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut groups: BTreeMap<String, Vec<ParsedTable<'a>>> = BTreeMap::new();
        for parsed in tables.into_iter().filter_map(|table| self.parse(table)) {
            groups
                .entry(parsed.tenant.to_string())
                .or_default()
                .push(parsed);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_table() {
        let naming = NamingConvention::default();
        let parsed = naming.parse("Acme_firma_dbo_FIRMA").unwrap();
        assert_eq!(parsed.tenant, "Acme");
        assert_eq!(parsed.domain, Domain::Profile);
        assert_eq!(parsed.entity, "dbo_FIRMA");
        assert_eq!(parsed.name, "Acme_firma_dbo_FIRMA");
    }

    #[test]
    fn test_parse_ledger_table() {
        let naming = NamingConvention::default();
        let parsed = naming.parse("Acme_Magazyn_dbo_dokTOW").unwrap();
        assert_eq!(parsed.tenant, "Acme");
        assert_eq!(parsed.domain, Domain::Ledger);
        assert_eq!(parsed.entity, "dbo_dokTOW");
    }

    #[test]
    fn test_parse_tenant_with_underscores() {
        let naming = NamingConvention::default();
        let parsed = naming.parse("Big_Co_2019_firma_dbo_ADRESY").unwrap();
        assert_eq!(parsed.tenant, "Big_Co_2019");
        assert_eq!(parsed.entity, "dbo_ADRESY");
    }

    #[test]
    fn test_parse_without_marker() {
        let naming = NamingConvention::default();
        assert!(naming.parse("orders").is_none());
        assert!(naming.parse("Acme_magazyn_dbo_x").is_none()); // markers are case sensitive
    }

    #[test]
    fn test_parse_reserved_prefixes() {
        let naming = NamingConvention::default();
        assert!(naming.parse("sqlite_sequence").is_none());
        assert!(naming.parse("_metadata").is_none());
        assert!(naming.parse("_x_firma_dbo_FIRMA").is_none());
    }

    #[test]
    fn test_parse_empty_parts() {
        let naming = NamingConvention::default();
        assert!(naming.parse("Acme_firma_").is_none());
        assert!(naming.parse("x_firma_").is_none());
    }

    #[test]
    fn test_parse_splits_at_first_marker() {
        // Known limitation: a tenant key containing the marker is cut short.
        let naming = NamingConvention::default();
        let parsed = naming.parse("My_firma_Co_firma_dbo_FIRMA").unwrap();
        assert_eq!(parsed.tenant, "My");
        assert_eq!(parsed.entity, "Co_firma_dbo_FIRMA");
    }

    #[test]
    fn test_profile_marker_wins() {
        let naming = NamingConvention::default();
        let parsed = naming.parse("A_Magazyn_B_firma_C").unwrap();
        assert_eq!(parsed.domain, Domain::Profile);
        assert_eq!(parsed.tenant, "A_Magazyn_B");
    }

    #[test]
    fn test_conventional_table_names() {
        let naming = NamingConvention::default();
        assert_eq!(naming.root_table("Acme"), "Acme_firma_dbo_FIRMA");
        assert_eq!(naming.address_table("Acme"), "Acme_firma_dbo_ADRESY");
        assert_eq!(naming.contacts_table("Acme"), "Acme_firma_dbo_SlwKONTRAHENT");
        assert_eq!(naming.ledger_table("Acme"), "Acme_Magazyn_dbo_dokTOW");
    }

    #[test]
    fn test_root_tenant() {
        let naming = NamingConvention::default();
        assert_eq!(naming.root_tenant("Acme_firma_dbo_FIRMA"), Some("Acme"));
        assert_eq!(naming.root_tenant("Acme_firma_dbo_ADRESY"), None);
        assert_eq!(naming.root_tenant("Acme_Magazyn_dbo_FIRMA"), None);
    }

    #[test]
    fn test_group_by_tenant() {
        let naming = NamingConvention::default();
        let tables = [
            "Acme_firma_dbo_FIRMA",
            "Acme_Magazyn_dbo_dokTOW",
            "Beta_firma_dbo_FIRMA",
            "_metadata",
            "loose_table",
        ];
        let groups = naming.group_by_tenant(tables);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Acme"].len(), 2);
        assert_eq!(groups["Acme"][1].domain, Domain::Ledger);
        assert_eq!(groups["Beta"].len(), 1);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["Acme", "Beta"]);
    }

    #[test]
    fn test_domain_serialization() {
        assert_eq!(serde_json::to_string(&Domain::Profile).unwrap(), "\"firma\"");
        assert_eq!(serde_json::to_string(&Domain::Ledger).unwrap(), "\"magazyn\"");
    }

    #[test]
    fn test_custom_convention() {
        let naming = NamingConvention {
            profile_marker: "__p__".to_string(),
            ..NamingConvention::default()
        };
        let parsed = naming.parse("t1__p__users").unwrap();
        assert_eq!(parsed.tenant, "t1");
        assert_eq!(parsed.entity, "users");
    }
}
