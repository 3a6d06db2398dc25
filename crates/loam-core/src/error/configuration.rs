use std::fmt;

/// Fatal mapping misconfiguration: missing or duplicate declarations,
/// unresolvable references, type/default mismatches.
#[derive(Debug)]
pub(crate) struct ConfigurationError {
    message: String,
}

impl ConfigurationError {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}
