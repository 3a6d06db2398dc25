mod db;
pub use db::{ColumnDump, Database, ForeignKeyDump, MigrationPolicy, SchemaDump, TableDump};

mod instance;
pub use instance::Instance;

mod materialize;
pub use materialize::Materializer;

mod query;
pub use query::{Expr, Path, Query, QueryBuilder, Root};

pub use loam_core::driver::{Executor, QueryResult, Row};
pub use loam_core::{schema, stmt, Error, Result};

pub use async_trait::async_trait;
