use std::fmt;

/// A result row that cannot be decoded: unknown discriminator value or a
/// storage class incompatible with the declared column type.
#[derive(Debug)]
pub(crate) struct MaterializationError {
    message: String,
}

impl MaterializationError {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for MaterializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "materialization failed: {}", self.message)
    }
}
