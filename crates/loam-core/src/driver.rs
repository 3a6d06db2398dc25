mod rows;
pub use rows::{QueryResult, Row};

use crate::{async_trait, stmt::Value, Result};

use std::fmt::Debug;

/// The abstract relational executor the mapping layer runs against.
///
/// The host platform owns the concrete storage engine (open/close, raw
/// statement execution, transactions); this contract only moves SQL text in
/// and tabular results out.
#[async_trait]
pub trait Executor: Debug + Send + Sync + 'static {
    /// Execute a schema statement with no result.
    async fn execute_ddl(&self, sql: &str) -> Result<()>;

    /// Write one row of column values into `table`, returning the number of
    /// affected rows.
    async fn execute_mutation(&self, table: &str, values: &[(String, Value)]) -> Result<u64>;

    /// Execute a query, returning its full tabular result.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;
}
