use super::{EntityId, Propagation};
use crate::stmt::Type;

/// One mapped attribute of an entity's table.
///
/// Immutable: all lazily-resolved properties (the declared type in
/// particular) were settled during resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, unique within the owning table.
    pub name: String,

    /// The field the column is generated from. Inherited primary-key
    /// columns keep the declaring ancestor's field name.
    pub field: String,

    /// The entity that declared this column. Differs from the owning entity
    /// for inherited primary-key columns.
    pub origin: EntityId,

    pub ty: Type,

    pub nullable: bool,

    pub primary_key: bool,

    pub unique: bool,

    /// Textual default, re-serialized against `ty` during resolution.
    pub default_value: Option<String>,

    /// Raw DDL override. When present it replaces everything after the
    /// column name.
    pub custom_definition: Option<String>,

    pub kind: ColumnKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    /// Plain attribute column.
    Simple,

    /// Foreign-key column originated by a relationship field. The linked
    /// column is a lookup relation into the target entity's column set,
    /// not an owned value.
    Join {
        target: EntityId,

        /// Name of the linked column on the target entity (or one of its
        /// ancestors).
        referenced: String,

        propagation: Propagation,
    },
}

impl Column {
    /// Whether the column carries a relationship. Such columns are skipped
    /// by row materialization and handled by the lazy-loading collaborator.
    pub fn is_join(&self) -> bool {
        matches!(self.kind, ColumnKind::Join { .. })
    }
}
