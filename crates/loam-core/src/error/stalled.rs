use std::fmt;

/// A resolution task exceeded its deadline. The task was blocked on a fact
/// that was never published, typically a cyclic or unsatisfiable
/// configuration.
#[derive(Debug)]
pub(crate) struct StalledError {
    task: String,
}

impl StalledError {
    pub(crate) fn new(task: String) -> Self {
        Self { task }
    }
}

impl fmt::Display for StalledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resolution stalled: {}", self.task)
    }
}
