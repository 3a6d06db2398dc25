use std::fmt;

/// A query builder state or expression that cannot be compiled to SQL.
#[derive(Debug)]
pub(crate) struct QueryCompilationError {
    message: String,
}

impl QueryCompilationError {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for QueryCompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query compilation failed: {}", self.message)
    }
}
