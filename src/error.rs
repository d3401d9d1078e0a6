use thiserror::Error;

/// Result type for key repository operations
pub type Result<T> = std::result::Result<T, Error>;

/// SQLSTATE codes that indicate a lost race between concurrent writers
const CONTENTION_SQLSTATES: [&str; 3] = [
    // serialization_failure
    "40001",
    // deadlock_detected
    "40P01",
    // unique_violation
    "23505",
];

/// Errors that can occur in the key repository
#[derive(Error, Debug)]
pub enum Error {
    /// Blank or unsafe configuration values; never retried
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid argument supplied to a repository operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A payload that is not a well-formed XML document
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// The schema or table could not be created
    #[error("Unable to provision storage {schema}.{table}: {source}")]
    Provisioning {
        /// Configured schema name
        schema: String,
        /// Configured table name
        table: String,
        /// Underlying database error
        #[source]
        source: sqlx::Error,
    },

    /// Connectivity, permission or query failure during an operation
    #[error("Storage error during {operation}: {source}")]
    Storage {
        /// Operation that failed, including the record name where one applies
        operation: String,
        /// Underlying database error
        #[source]
        source: sqlx::Error,
    },

    /// A stored payload is no longer well-formed XML
    #[error("Stored record '{name}' is corrupt: {reason}")]
    DataIntegrity {
        /// Friendly name of the offending record
        name: String,
        /// Parser diagnostic
        reason: String,
    },

    /// Serialization failure, deadlock or duplicate key under concurrent writes.
    /// The caller may retry the operation.
    #[error("Concurrent write conflict during {operation}: {source}")]
    Transient {
        /// Operation that failed, including the record name
        operation: String,
        /// Underlying database error
        #[source]
        source: sqlx::Error,
    },
}

impl Error {
    /// Returns true when retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }

    /// Classifies a database error raised on the write path
    pub(crate) fn from_write(operation: String, source: sqlx::Error) -> Self {
        if is_contention(&source) {
            Error::Transient { operation, source }
        } else {
            Error::Storage { operation, source }
        }
    }
}

/// Checks whether a database error reports write contention
pub(crate) fn is_contention(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err
            .code()
            .map(|code| is_contention_code(&code))
            .unwrap_or(false);
    }
    false
}

fn is_contention_code(code: &str) -> bool {
    CONTENTION_SQLSTATES.contains(&code)
}
