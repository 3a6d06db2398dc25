use std::fmt;

/// A get/set against a field the target entity does not declare.
#[derive(Debug)]
pub(crate) struct FieldAccessError {
    message: String,
}

impl FieldAccessError {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for FieldAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field access failed: {}", self.message)
    }
}
