use std::fmt::Debug;

use async_trait::async_trait;

use super::dialect::{Dialect, Statement};
use super::value::Row;

/// Wrapper for conversion of database-specific error codes into actual errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Table or column doesn't exist: {0}")]
    UndefinedObject(sqlx::Error),

    #[error("Unsupported type {type_name:?} in column {column:?}")]
    UnsupportedColumnType { column: String, type_name: String },

    // All other errors
    #[error("Internal SQL error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Runs rendered statements against a store.
///
/// Every method acquires its own connection from the underlying pool and
/// hands it back before returning, on success and on error alike.
#[async_trait]
pub trait Executor: Send + Sync + Debug {
    fn dialect(&self) -> Dialect;

    /// Run a write and return the number of affected rows.
    async fn execute(&self, statement: &Statement<'_>) -> Result<u64>;

    /// Run several writes in one transaction, returning the affected row
    /// count of each. Nothing is committed if any statement fails.
    async fn execute_in_transaction(&self, statements: &[Statement<'_>]) -> Result<Vec<u64>>;

    /// First column of the first row as bytes; `None` for no row or NULL.
    async fn fetch_bytes(&self, statement: &Statement<'_>) -> Result<Option<Vec<u8>>>;

    /// First column of the first row as text; `None` for no row or NULL.
    async fn fetch_text(&self, statement: &Statement<'_>) -> Result<Option<String>>;

    /// Run a row query followed by a `COUNT(*)` query on the same connection.
    /// The two aren't wrapped in a transaction.
    async fn fetch_page(
        &self,
        rows: &Statement<'_>,
        count: &Statement<'_>,
    ) -> Result<(Vec<Row>, i64)>;
}
