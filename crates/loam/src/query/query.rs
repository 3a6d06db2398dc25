use crate::{Database, Instance, Materializer};

use loam_core::schema::EntityId;
use loam_core::Result;

/// A compiled, executable query.
#[derive(Debug)]
pub struct Query<'a> {
    db: &'a Database,

    /// The entity rows materialize into; its concrete subtype is chosen
    /// per row by discriminator.
    target: EntityId,

    /// The target root's alias; projection output names hang off it.
    alias: String,

    sql: String,
}

impl<'a> Query<'a> {
    pub(crate) fn new(db: &'a Database, target: EntityId, alias: String, sql: String) -> Self {
        Self {
            db,
            target,
            alias,
            sql,
        }
    }

    /// The emitted query text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Execute and materialize every row. A row that fails to decode fails
    /// the call without corrupting rows already materialized.
    pub async fn all(&self) -> Result<Vec<Instance>> {
        let result = self.db.executor().execute_query(&self.sql).await?;
        let materializer = Materializer::new(self.db.schema());

        result
            .iter()
            .map(|row| materializer.row(self.target, &self.alias, row))
            .collect()
    }

    /// Execute and materialize the first row, if any.
    pub async fn one(&self) -> Result<Option<Instance>> {
        Ok(self.all().await?.into_iter().next())
    }
}
