//! SQL utilities for the archive
//!
//! Provides identifier sanitization, filter conditions, search predicates and
//! row decoding.

pub mod condition;
pub mod row;
pub mod sanitize;

pub use condition::{Condition, build_condition_clause, build_search_clause};
pub use row::{Record, bind_param, get_ignore_case, row_to_record};
pub use sanitize::{escape_like, quote_identifier, validate_identifier};
