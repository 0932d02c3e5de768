//! SQL Identifier Sanitization Utilities
//!
//! Table and column names of the archive are only known at runtime, so they are
//! interpolated into query text. Every such name must pass [`validate_identifier`]
//! and be present in the engine catalog before it reaches a query.

use std::sync::LazyLock;

use regex::Regex;

/// Characters that could terminate or confuse a quoted identifier
static FORBIDDEN_IDENTIFIER_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["\[\]`\x00-\x1F\x7F]"#).expect("valid identifier regex"));

/// Quote a SQL identifier to make it safe for use in queries
///
/// # Example
/// ```
/// use tenant_archive::sql::quote_identifier;
///
/// let quoted = quote_identifier("Acme_firma_dbo_FIRMA");
/// assert_eq!(quoted, "\"Acme_firma_dbo_FIRMA\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    // Escape any double quotes in the identifier by doubling them
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Validate a table or column name taken from a caller
///
/// Rules:
/// - Cannot be empty
/// - Cannot contain quoting characters (`"`, `[`, `]`, `` ` ``)
/// - Cannot contain control characters
///
/// Unlike names created by an application, archive names keep their legacy
/// casing and may contain spaces or non-ASCII letters, so nothing else is
/// restricted.
///
/// # Example
/// ```
/// use tenant_archive::sql::validate_identifier;
///
/// assert!(validate_identifier("Acme_firma_dbo_FIRMA").is_ok());
/// assert!(validate_identifier("x\"; DROP TABLE y; --").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if FORBIDDEN_IDENTIFIER_CHARS.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Quote and control characters are not allowed.",
            name.escape_debug()
        ));
    }

    Ok(())
}

/// Escape `LIKE` wildcards so the text matches literally
///
/// Pair the pattern with `ESCAPE '\'` in the query.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
