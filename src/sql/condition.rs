//! Condition building for SQL WHERE clauses
//!
//! Converts a [`Condition`] tree and free-text search into SQLite WHERE clauses
//! with `?` placeholders. Field names are checked against the table's column
//! list before they are quoted into the clause.

use serde::{Deserialize, Serialize};

use crate::sql::sanitize::{escape_like, quote_identifier};

/// Filter condition over the columns of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Eq { field: String, value: serde_json::Value },
    Ne { field: String, value: serde_json::Value },
    Gt { field: String, value: serde_json::Value },
    Lt { field: String, value: serde_json::Value },
    Gte { field: String, value: serde_json::Value },
    Lte { field: String, value: serde_json::Value },
    /// Case-insensitive (ASCII) substring match
    Contains { field: String, value: String },
    StartsWith { field: String, value: String },
    EndsWith { field: String, value: String },
    In { field: String, values: Vec<serde_json::Value> },
    IsNull { field: String },
    IsNotNull { field: String },
    And { conditions: Vec<Condition> },
    Or { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Condition::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Condition::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Condition::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Condition::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::StartsWith {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        Condition::In {
            field: field.into(),
            values,
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Condition::IsNull {
            field: field.into(),
        }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And { conditions }
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or { conditions }
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not {
            condition: Box::new(condition),
        }
    }
}

/// Build SQL WHERE clause from a Condition
///
/// Returns `(clause, params)` where `clause` uses `?` placeholders in the
/// order of `params`. `columns` is the allow-list of field names; any other
/// field is rejected.
pub fn build_condition_clause(
    condition: &Condition,
    columns: &[String],
) -> Result<(String, Vec<serde_json::Value>), String> {
    let mut params = Vec::new();
    let clause = build_clause(condition, columns, &mut params)?;
    Ok((clause, params))
}

fn build_clause(
    condition: &Condition,
    columns: &[String],
    params: &mut Vec<serde_json::Value>,
) -> Result<String, String> {
    match condition {
        Condition::And { conditions } => join_clauses("AND", conditions, columns, params),
        Condition::Or { conditions } => join_clauses("OR", conditions, columns, params),
        Condition::Not { condition } => {
            let clause = build_clause(condition, columns, params)?;
            Ok(format!("NOT ({})", clause))
        }
        Condition::Eq { field, value } | Condition::Ne { field, value } => {
            let column = checked_field(field, columns)?;
            let negated = matches!(condition, Condition::Ne { .. });
            if value.is_null() {
                let null_operator = if negated { "IS NOT NULL" } else { "IS NULL" };
                return Ok(format!("{} {}", column, null_operator));
            }
            params.push(value.clone());
            Ok(format!("{} {} ?", column, if negated { "!=" } else { "=" }))
        }
        Condition::Gt { field, value }
        | Condition::Lt { field, value }
        | Condition::Gte { field, value }
        | Condition::Lte { field, value } => {
            let column = checked_field(field, columns)?;
            if value.is_null() {
                return Err(format!("Comparison on '{}' with NULL is not supported", field));
            }
            let operator = match condition {
                Condition::Gt { .. } => ">",
                Condition::Lt { .. } => "<",
                Condition::Gte { .. } => ">=",
                _ => "<=",
            };
            params.push(value.clone());
            Ok(format!("{} {} ?", column, operator))
        }
        Condition::Contains { field, value } => {
            like_clause(field, format!("%{}%", escape_like(value)), columns, params)
        }
        Condition::StartsWith { field, value } => {
            like_clause(field, format!("{}%", escape_like(value)), columns, params)
        }
        Condition::EndsWith { field, value } => {
            like_clause(field, format!("%{}", escape_like(value)), columns, params)
        }
        Condition::In { field, values } => {
            let column = checked_field(field, columns)?;
            if values.is_empty() {
                return Err(format!("IN on '{}' requires at least one value", field));
            }
            params.extend(values.iter().cloned());
            let placeholders = vec!["?"; values.len()].join(", ");
            Ok(format!("{} IN ({})", column, placeholders))
        }
        Condition::IsNull { field } => Ok(format!("{} IS NULL", checked_field(field, columns)?)),
        Condition::IsNotNull { field } => {
            Ok(format!("{} IS NOT NULL", checked_field(field, columns)?))
        }
    }
}

fn join_clauses(
    operator: &str,
    conditions: &[Condition],
    columns: &[String],
    params: &mut Vec<serde_json::Value>,
) -> Result<String, String> {
    if conditions.is_empty() {
        return Err(format!("{} requires at least one condition", operator));
    }
    let clauses = conditions
        .iter()
        .map(|c| build_clause(c, columns, params).map(|clause| format!("({})", clause)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(clauses.join(&format!(" {} ", operator)))
}

fn like_clause(
    field: &str,
    pattern: String,
    columns: &[String],
    params: &mut Vec<serde_json::Value>,
) -> Result<String, String> {
    let column = checked_field(field, columns)?;
    params.push(serde_json::Value::String(pattern));
    Ok(format!("{} LIKE ? ESCAPE '\\'", column))
}

/// Quote the table's own spelling of a field after checking the allow-list
///
/// Column names match case-insensitively, as SQLite resolves them.
fn checked_field(field: &str, columns: &[String]) -> Result<String, String> {
    let column = columns
        .iter()
        .find(|c| c.as_str() == field)
        .or_else(|| columns.iter().find(|c| c.eq_ignore_ascii_case(field)))
        .ok_or_else(|| format!("Unknown field '{}'", field))?;
    Ok(quote_identifier(column))
}

/// Build the free-text search predicate
///
/// OR-combines a substring match of `text` over `text_columns`. Returns `None`
/// when there are no columns to search.
pub fn build_search_clause(
    text_columns: &[String],
    text: &str,
) -> Option<(String, Vec<serde_json::Value>)> {
    if text_columns.is_empty() {
        return None;
    }
    let pattern = format!("%{}%", escape_like(text));
    let clause = text_columns
        .iter()
        .map(|column| format!("{} LIKE ? ESCAPE '\\'", quote_identifier(column)))
        .collect::<Vec<_>>()
        .join(" OR ");
    let params = vec![serde_json::Value::String(pattern); text_columns.len()];
    Some((clause, params))
}
