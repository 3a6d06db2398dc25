mod dump;
pub use dump::{ColumnDump, ForeignKeyDump, SchemaDump, TableDump};

use crate::{Instance, QueryBuilder};

use loam_core::driver::Executor;
use loam_core::schema::{Column, Schema};
use loam_core::stmt::Value;
use loam_core::{async_trait, bail, Error, Result};
use loam_sql::Serializer;

use std::sync::Arc;

/// A runtime handle coupling the resolved schema with the host's relational
/// executor.
#[derive(Debug, Clone)]
pub struct Database {
    schema: Arc<Schema>,
    executor: Arc<dyn Executor>,
}

/// Invoked when the persisted schema version lags behind the declared one.
/// The policy runs before any table is created.
#[async_trait]
pub trait MigrationPolicy: Send + Sync {
    async fn migrate(&self, executor: &dyn Executor, from: i64, to: i64) -> Result<()>;
}

impl Database {
    pub fn new(schema: Arc<Schema>, executor: Arc<dyn Executor>) -> Self {
        Self { schema, executor }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// Bring the live database up to the declared schema: run the migration
    /// policy if the persisted version lags, create every table, then stamp
    /// the declared version.
    pub async fn init(&self, migration: Option<&dyn MigrationPolicy>) -> Result<()> {
        let persisted = self.persisted_version().await?;
        let declared = self.schema.version;

        if persisted > declared {
            return Err(Error::configuration(format!(
                "persisted schema version {persisted} is newer than the declared {declared}"
            )));
        }

        if persisted != 0 && persisted < declared {
            match migration {
                Some(policy) => {
                    log::info!(
                        "[database \"{}\"] migrating schema from version {persisted} to {declared}",
                        self.schema.name
                    );
                    policy
                        .migrate(self.executor.as_ref(), persisted, declared)
                        .await?;
                }
                None => {
                    return Err(Error::configuration(format!(
                        "schema version went from {persisted} to {declared} without a migration policy"
                    )));
                }
            }
        }

        let serializer = Serializer::new(&self.schema);

        for entity in self.schema.entities() {
            self.executor
                .execute_ddl(&serializer.create_table(entity))
                .await?;
        }

        // Join tables reference both sides, so they are created last.
        for join_table in &self.schema.join_tables {
            self.executor
                .execute_ddl(&serializer.create_join_table(join_table))
                .await?;
        }

        self.executor
            .execute_ddl(&format!("PRAGMA user_version = {declared}"))
            .await?;

        log::info!(
            "[database \"{}\"] schema initialized at version {declared}",
            self.schema.name
        );
        Ok(())
    }

    async fn persisted_version(&self) -> Result<i64> {
        let result = self.executor.execute_query("PRAGMA user_version").await?;
        let version = match result.iter().next() {
            Some(row) => row.as_i64(&result.columns[0]),
            None => Ok(0),
        };
        version
    }

    /// A query builder whose results materialize into `entity`.
    pub fn query(&self, entity: &str) -> Result<QueryBuilder<'_>> {
        let id = self.schema.entity_by_name(entity)?.id;
        Ok(QueryBuilder::new(self, id))
    }

    /// Write one instance, level by level from the hierarchy root down to
    /// the instance's concrete entity. Each level that has subtypes gets
    /// the discriminator value of the next level on the path.
    pub async fn persist(&self, instance: &Instance) -> Result<()> {
        let chain = self.schema.chain_to_root(instance.entity());

        for (position, entity) in chain.iter().enumerate().rev() {
            let mut values: Vec<(String, Value)> = vec![];

            for column in &entity.columns {
                let raw = instance.get(&column.field)?;
                values.push((column.name.clone(), encode(entity, column, raw)?));
            }

            if let Some(index) = entity.discriminator_column {
                if position > 0 {
                    let name = &entity.columns[index].name;
                    let expected = chain[position - 1]
                        .discriminator_value
                        .clone()
                        .expect("resolved schema");

                    let slot = values
                        .iter_mut()
                        .find(|(column, _)| column == name)
                        .expect("discriminator column present");

                    // A manually-assigned discriminator must agree with the
                    // instance's entity.
                    if !slot.1.is_null() && slot.1 != expected {
                        return Err(Error::materialization(format!(
                            "wrong discriminator value: expected {expected:?}, found {:?}",
                            slot.1
                        )));
                    }

                    slot.1 = expected;
                }
            }

            if values.is_empty() {
                continue;
            }

            let affected = self
                .executor
                .execute_mutation(&entity.table, &values)
                .await?;

            if affected == 0 {
                bail!("no row written into table \"{}\"", entity.table);
            }
        }

        Ok(())
    }
}

/// Encode a declared-type value into its storage form, splitting record
/// values across the columns of a join-column group.
fn encode(
    entity: &loam_core::schema::Entity,
    column: &Column,
    value: Value,
) -> Result<Value> {
    if column.is_join() {
        let group: Vec<&Column> = entity
            .columns
            .iter()
            .filter(|c| c.origin == column.origin && c.field == column.field && c.is_join())
            .collect();

        if group.len() > 1 {
            return match value {
                Value::Record(fields) if fields.len() == group.len() => {
                    let position = group
                        .iter()
                        .position(|c| c.name == column.name)
                        .expect("column in its own group");
                    encode_scalar(column, fields[position].clone())
                }
                Value::Null => Ok(Value::Null),
                _ => Err(Error::materialization(format!(
                    "field \"{}\" needs a record value with {} entries",
                    column.field,
                    group.len()
                ))),
            };
        }
    }

    encode_scalar(column, value)
}

fn encode_scalar(column: &Column, value: Value) -> Result<Value> {
    Ok(match value {
        Value::Null => Value::Null,
        Value::Bool(value) => Value::I64(value.into()),
        Value::Timestamp(millis) => Value::I64(millis),
        Value::Enum(constant) => Value::Text(constant),
        Value::Record(_) => {
            return Err(Error::materialization(format!(
                "field \"{}\" cannot hold a record value",
                column.field
            )))
        }
        other => other,
    })
}
