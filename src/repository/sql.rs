//! Statement text for the PostgreSQL repository
//!
//! Schema and table names can only enter statement text as [`SqlIdentifier`]s.
//! Everything else, including record names and payloads, is bound.

use crate::identifier::SqlIdentifier;

/// Maximum friendly name length in characters; keeps primary key entries
/// under the b-tree entry size limit even for 4-byte characters
pub const FRIENDLY_NAME_MAX_CHARS: usize = 449;

pub(crate) const SET_SERIALIZABLE: &str = "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE";

pub(crate) const SCHEMA_EXISTS_QUERY: &str =
    "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)";

pub(crate) const TABLE_EXISTS_QUERY: &str = "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
     WHERE table_schema = $1 AND table_name = $2)";

/// Statements bound to one schema and table
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub(crate) qualified_table: String,
    pub(crate) create_schema: String,
    pub(crate) create_table: String,
    pub(crate) select_all: String,
    pub(crate) upsert_record: String,
}

impl Statements {
    pub(crate) fn new(schema: &SqlIdentifier, table: &SqlIdentifier) -> Self {
        let qualified_table = format!("{}.{}", schema.quoted(), table.quoted());

        let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {}", schema.quoted());
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             \"FriendlyName\" VARCHAR({}) NOT NULL, \
             \"XmlData\" TEXT NOT NULL, \
             PRIMARY KEY (\"FriendlyName\"))",
            qualified_table, FRIENDLY_NAME_MAX_CHARS
        );
        let select_all = format!(
            "SELECT \"FriendlyName\", \"XmlData\" FROM {}",
            qualified_table
        );
        // one statement: a separate existence check takes predicate locks that
        // make writers of unrelated names conflict under SERIALIZABLE
        let upsert_record = format!(
            "INSERT INTO {} (\"FriendlyName\", \"XmlData\") VALUES ($1, $2) \
             ON CONFLICT (\"FriendlyName\") DO UPDATE SET \"XmlData\" = EXCLUDED.\"XmlData\" \
             RETURNING (xmax = 0) AS inserted",
            qualified_table
        );

        Self {
            qualified_table,
            create_schema,
            create_table,
            select_all,
            upsert_record,
        }
    }
}
