use crate::stmt::{StorageClass, Value};
use crate::{err, Result};

/// A fully-materialized tabular query result: column names plus rows of
/// storage values.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            result: self,
            values,
        })
    }
}

/// One row of a [`QueryResult`], addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    result: &'a QueryResult,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Result<&'a Value> {
        let index = self
            .result
            .column_index(column)
            .ok_or_else(|| err!("column \"{column}\" not present in result"))?;
        Ok(&self.values[index])
    }

    /// The storage class of the cell, which for dynamically-typed storage
    /// varies per row.
    pub fn storage_class(&self, column: &str) -> Result<StorageClass> {
        Ok(self.get(column)?.storage_class())
    }

    pub fn as_i64(&self, column: &str) -> Result<i64> {
        match self.get(column)? {
            Value::I64(v) => Ok(*v),
            other => Err(err!(
                "column \"{column}\": expected integer storage, found {}",
                other.storage_class()
            )),
        }
    }

    pub fn as_text(&self, column: &str) -> Result<&'a str> {
        match self.get(column)? {
            Value::Text(v) => Ok(v),
            other => Err(err!(
                "column \"{column}\": expected text storage, found {}",
                other.storage_class()
            )),
        }
    }

    pub fn as_opt_text(&self, column: &str) -> Result<Option<&'a str>> {
        match self.get(column)? {
            Value::Null => Ok(None),
            Value::Text(v) => Ok(Some(v)),
            other => Err(err!(
                "column \"{column}\": expected text storage, found {}",
                other.storage_class()
            )),
        }
    }
}
