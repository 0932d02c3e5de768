//! Conversion between SQLite values and JSON

use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

/// One table row keyed by column name, in result-set column order
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Convert a row of any table into a [`Record`]
///
/// Values follow their runtime storage class: INTEGER and REAL become
/// numbers, TEXT a string, BLOB a lowercase hex string and NULL null.
pub fn row_to_record(row: &SqliteRow) -> Record {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), column_value(row, column.ordinal())))
        .collect()
}

fn column_value(row: &SqliteRow, index: usize) -> serde_json::Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return serde_json::Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return serde_json::Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get::<i64, _>(index)
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::Null),
        "REAL" => row
            .try_get::<f64, _>(index)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|bytes| serde_json::Value::String(to_hex(&bytes)))
            .unwrap_or(serde_json::Value::Null),
        _ => row
            .try_get::<String, _>(index)
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Render a scalar JSON value as display text
///
/// Tax identifiers and postal codes are sometimes stored as numbers by the
/// migration, so numbers are rendered too. Null and empty strings give `None`.
pub fn value_to_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Look up a column of a record the way SQLite resolves column names
///
/// An exact match wins; otherwise the first column equal up to ASCII case.
pub fn get_ignore_case<'r>(record: &'r Record, column: &str) -> Option<&'r serde_json::Value> {
    record.get(column).or_else(|| {
        record
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}

/// Bind a JSON literal to a query with the matching SQLite type
pub fn bind_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &serde_json::Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        serde_json::Value::Null => query.bind(None::<String>),
        serde_json::Value::Bool(b) => query.bind(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        serde_json::Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

/// [`bind_param`] for typed queries
pub fn bind_param_as<'q, O>(
    query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    value: &serde_json::Value,
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    match value {
        serde_json::Value::Null => query.bind(None::<String>),
        serde_json::Value::Bool(b) => query.bind(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        serde_json::Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn test_get_ignore_case() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "Nazwa": "Acme Sp.",
            "nip": "123",
            "KOD": null,
        }))
        .unwrap();
        assert_eq!(get_ignore_case(&record, "NAZWA"), Some(&serde_json::json!("Acme Sp.")));
        assert_eq!(get_ignore_case(&record, "NIP"), Some(&serde_json::json!("123")));
        assert_eq!(get_ignore_case(&record, "kod"), Some(&serde_json::Value::Null));
        assert_eq!(get_ignore_case(&record, "REGON"), None);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(
            value_to_text(Some(&serde_json::json!("Warszawa"))),
            Some("Warszawa".to_string())
        );
        assert_eq!(
            value_to_text(Some(&serde_json::json!(5260250995_i64))),
            Some("5260250995".to_string())
        );
        assert_eq!(value_to_text(Some(&serde_json::json!(""))), None);
        assert_eq!(value_to_text(Some(&serde_json::Value::Null)), None);
        assert_eq!(value_to_text(None), None);
    }
}
