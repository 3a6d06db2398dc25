use super::{EntityId, Propagation};

/// A relationship-originated foreign-key constraint: one per join column or
/// join-column group.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    /// Local column names, in group order.
    pub columns: Vec<String>,

    pub target: EntityId,

    /// Referenced column names on the target's table, parallel to
    /// `columns`.
    pub target_columns: Vec<String>,

    pub propagation: Propagation,
}
