use super::EntityId;

/// A relationship-annotated field.
#[derive(Debug, Clone)]
pub struct Relation {
    pub field: String,

    pub target: EntityId,

    pub kind: RelationKind,

    /// Whether the relationship may be absent. Drives join-column
    /// nullability and, through it, the referential actions.
    pub optional: bool,

    /// Indices of the join columns this relationship put on the owning
    /// table. Empty for inverse and many-to-many sides.
    pub columns: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelationKind {
    OneToOne {
        /// Set on the inverse side: the owning field on the target.
        mapped_by: Option<String>,
    },
    ManyToOne,
    OneToMany {
        /// The owning field on the target.
        mapped_by: String,
    },
    ManyToMany {
        /// Set on the inverse side.
        mapped_by: Option<String>,
    },
}

impl Relation {
    /// The owning side physically carries the join columns.
    pub fn is_owning(&self) -> bool {
        match &self.kind {
            RelationKind::OneToOne { mapped_by } => mapped_by.is_none(),
            RelationKind::ManyToOne => true,
            RelationKind::OneToMany { .. } => false,
            RelationKind::ManyToMany { mapped_by } => mapped_by.is_none(),
        }
    }
}
