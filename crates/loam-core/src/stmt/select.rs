use super::{Expr, ExprColumn, Source};

/// A compiled SELECT statement. Everything is resolved: table names,
/// aliases and column names are final strings ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// Projection, in hierarchy order: target entity, ancestors bottom-up,
    /// then descendants depth-first.
    pub columns: Vec<SelectColumn>,

    pub source: Source,

    pub filter: Option<Expr>,
}

/// One projected column, output under the `alias.column` naming convention
/// so a row can be decoded per hierarchy level.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub column: ExprColumn,

    /// The output name: `<alias>.<column>`.
    pub output: String,
}
