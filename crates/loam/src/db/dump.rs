use super::Database;

use loam_core::stmt::StorageClass;
use loam_core::Result;

use std::collections::BTreeMap;

/// A live-schema snapshot, introspected from the executor's metadata
/// pragmas rather than from the in-memory model, so it reflects what a
/// previously persisted schema version actually created.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDump {
    pub tables: Vec<TableDump>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDump {
    pub name: String,
    pub columns: Vec<ColumnDump>,
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyDump>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDump {
    pub name: String,
    pub storage: StorageClass,
    pub default_value: Option<String>,
    pub primary_key: bool,
    pub nullable: bool,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDump {
    pub source_table: String,
    pub source_columns: Vec<String>,
    pub target_table: String,
    pub target_columns: Vec<String>,
    pub on_update: String,
    pub on_delete: String,
}

impl SchemaDump {
    pub fn table(&self, name: &str) -> Option<&TableDump> {
        self.tables.iter().find(|table| table.name == name)
    }
}

impl TableDump {
    pub fn column(&self, name: &str) -> Option<&ColumnDump> {
        self.columns.iter().find(|column| column.name == name)
    }
}

impl Database {
    /// Introspect the live schema through the executor's metadata pragmas.
    pub async fn dump(&self) -> Result<SchemaDump> {
        let result = self
            .executor()
            .execute_query("SELECT name FROM sqlite_master WHERE type='table'")
            .await?;

        let mut tables = vec![];
        for row in result.iter() {
            let name = row.as_text("name")?.to_string();
            tables.push(self.dump_table(&name).await?);
        }

        Ok(SchemaDump { tables })
    }

    async fn dump_table(&self, table: &str) -> Result<TableDump> {
        let unique = self.unique_columns(table).await?;

        let info = self
            .executor()
            .execute_query(&format!("PRAGMA table_info({})", quote(table)))
            .await?;

        let mut columns = vec![];
        let mut primary_keys = vec![];

        for row in info.iter() {
            let name = row.as_text("name")?.to_string();
            let primary_key = row.as_i64("pk")? != 0;

            if primary_key {
                primary_keys.push(name.clone());
            }

            columns.push(ColumnDump {
                storage: StorageClass::from_metadata(row.as_text("type")?),
                default_value: row.as_opt_text("dflt_value")?.map(str::to_string),
                primary_key,
                nullable: row.as_i64("notnull")? == 0,
                unique: unique.contains(&name),
                name,
            });
        }

        Ok(TableDump {
            name: table.to_string(),
            columns,
            primary_keys,
            foreign_keys: self.dump_foreign_keys(table).await?,
        })
    }

    /// Columns covered by a single-column unique index.
    async fn unique_columns(&self, table: &str) -> Result<Vec<String>> {
        let indexes = self
            .executor()
            .execute_query(&format!("PRAGMA index_list({})", quote(table)))
            .await?;

        let mut unique = vec![];
        for row in indexes.iter() {
            if row.as_i64("unique")? != 1 {
                continue;
            }

            let index_name = row.as_text("name")?;
            let info = self
                .executor()
                .execute_query(&format!("PRAGMA index_info({})", quote(index_name)))
                .await?;

            if info.rows.len() == 1 {
                let row = info.iter().next().expect("one row");
                unique.push(row.as_text("name")?.to_string());
            }
        }

        Ok(unique)
    }

    async fn dump_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDump>> {
        let result = self
            .executor()
            .execute_query(&format!("PRAGMA foreign_key_list({})", quote(table)))
            .await?;

        // One constraint spans several rows for composite keys; rows of a
        // constraint share an id.
        let mut constraints: BTreeMap<i64, ForeignKeyDump> = BTreeMap::new();

        for row in result.iter() {
            let id = row.as_i64("id")?;
            let source_column = row.as_text("from")?.to_string();
            let target_column = row.as_text("to")?.to_string();

            match constraints.get_mut(&id) {
                Some(constraint) => {
                    constraint.source_columns.push(source_column);
                    constraint.target_columns.push(target_column);
                }
                None => {
                    constraints.insert(
                        id,
                        ForeignKeyDump {
                            source_table: table.to_string(),
                            source_columns: vec![source_column],
                            target_table: row.as_text("table")?.to_string(),
                            target_columns: vec![target_column],
                            on_update: row.as_text("on_update")?.to_string(),
                            on_delete: row.as_text("on_delete")?.to_string(),
                        },
                    );
                }
            }
        }

        Ok(constraints.into_values().collect())
    }
}

/// Double-quote identifier escaping for pragma arguments.
fn quote(identifier: &str) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push('"');
    for ch in identifier.chars() {
        if ch == '"' {
            quoted.push('"');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
