use loam::stmt::Value;
use loam::{async_trait, Executor, QueryResult, Result};

use std::collections::VecDeque;
use std::sync::Mutex;

/// An executor double: records every statement it is asked to run and
/// answers queries from a scripted queue, falling back to an empty result
/// when the queue runs dry.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub ddl: Mutex<Vec<String>>,
    pub mutations: Mutex<Vec<(String, Vec<(String, Value)>)>>,
    pub queries: Mutex<Vec<String>>,
    results: Mutex<VecDeque<QueryResult>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result the next query will receive.
    pub fn script(&self, result: QueryResult) {
        self.results.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute_ddl(&self, sql: &str) -> Result<()> {
        self.ddl.lock().unwrap().push(sql.to_string());
        Ok(())
    }

    async fn execute_mutation(&self, table: &str, values: &[(String, Value)]) -> Result<u64> {
        self.mutations
            .lock()
            .unwrap()
            .push((table.to_string(), values.to_vec()));
        Ok(1)
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.queries.lock().unwrap().push(sql.to_string());
        Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
    }
}
