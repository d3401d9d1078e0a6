//! Validation of schema and table names
//!
//! Schema and table names end up inside DDL and DML text because PostgreSQL
//! cannot bind them as parameters. [`SqlIdentifier`] is the only way to get a
//! name into a statement, and it can only be built from a name that passed
//! [`validate_identifier`] and fits PostgreSQL's identifier length, so two
//! different configured names can never end up naming the same object.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Maximum identifier length in characters
pub const MAX_IDENTIFIER_CHARS: usize = 128;

/// PostgreSQL truncates longer identifiers (NAMEDATALEN - 1)
pub const MAX_POSTGRES_IDENTIFIER_BYTES: usize = 63;

const IDENTIFIER_PATTERN: &str = r"^[\p{L}_][\p{L}\p{N}@$#_]{0,127}$";

fn identifier_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(IDENTIFIER_PATTERN).expect("Failed to create regex pattern for SQL identifiers")
    })
}

/// Returns true if `name` can be safely interpolated into SQL text.
///
/// Accepts 1 to 128 characters: a Unicode letter or `_`, followed by Unicode
/// letters, digits, `@`, `$`, `#` or `_`.
pub fn validate_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

/// Which configured name an identifier stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// Schema name
    Schema,
    /// Table name
    Table,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Schema => f.write_str("schema"),
            IdentifierKind::Table => f.write_str("table"),
        }
    }
}

/// A schema or table name that passed [`validate_identifier`] and is at most
/// [`MAX_POSTGRES_IDENTIFIER_BYTES`] bytes long
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlIdentifier(String);

impl SqlIdentifier {
    /// Validates `name` and wraps it.
    ///
    /// Fails with [`Error::Config`] naming the kind of identifier and the reason.
    pub fn new(kind: IdentifierKind, name: &str) -> Result<Self> {
        if !validate_identifier(name) {
            return Err(Error::Config(format!(
                "{} name '{}' is invalid: {}",
                kind,
                name,
                rejection_reason(name)
            )));
        }

        if name.len() > MAX_POSTGRES_IDENTIFIER_BYTES {
            return Err(Error::Config(format!(
                "{} name '{}' is invalid: name is {} bytes long, PostgreSQL truncates identifiers to {} bytes",
                kind,
                name,
                name.len(),
                MAX_POSTGRES_IDENTIFIER_BYTES
            )));
        }

        Ok(Self(name.to_string()))
    }

    /// The raw, unquoted name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a double-quoted SQL identifier
    pub fn quoted(&self) -> String {
        // validated names never contain '"'
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for SqlIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn rejection_reason(name: &str) -> String {
    let length = name.chars().count();
    if length == 0 {
        return "name is empty".to_string();
    }
    if length > MAX_IDENTIFIER_CHARS {
        return format!(
            "name is {} characters long, the limit is {}",
            length, MAX_IDENTIFIER_CHARS
        );
    }

    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !(first == '_' || first.is_alphabetic()) {
            return format!("must start with a letter or '_', found {:?}", first);
        }
    }
    match chars.find(|c| !(c.is_alphanumeric() || matches!(c, '@' | '$' | '#' | '_'))) {
        Some(c) => format!(
            "character {:?} is not allowed, use letters, digits, '@', '$', '#' or '_'",
            c
        ),
        None => "only letters, digits, '@', '$', '#' and '_' are allowed".to_string(),
    }
}
