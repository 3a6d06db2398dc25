use super::Path;

use loam_core::schema::EntityId;

/// An aliased occurrence of one entity within one query. Roots form a tree:
/// the query's FROM root plus every root joined to it, explicitly or through
/// predicate-driven join insertion.
#[derive(Debug, Clone)]
pub struct Root {
    pub(crate) entity: EntityId,
    pub(crate) alias: String,
    pub(crate) joins: Vec<JoinEdge>,
}

#[derive(Debug, Clone)]
pub(crate) struct JoinEdge {
    /// Relationship field on the source root's entity.
    pub(crate) field: String,
    pub(crate) node: Root,
}

impl Root {
    pub(crate) fn new(entity: EntityId, alias: String) -> Self {
        Self {
            entity,
            alias,
            joins: vec![],
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// A reference to one of the entity's properties.
    pub fn field(&self, field: &str) -> Path {
        Path::new(self, field)
    }

    /// Join another root through a relationship field of this root's
    /// entity. Validation happens at build time.
    pub fn join(mut self, node: Root, field: &str) -> Self {
        self.joins.push(JoinEdge {
            field: field.to_string(),
            node,
        });
        self
    }

    pub(crate) fn contains_alias(&self, alias: &str) -> bool {
        self.alias == alias || self.joins.iter().any(|edge| edge.node.contains_alias(alias))
    }

    /// Attach `node` under the root whose alias is `parent_alias`.
    pub(crate) fn join_at(&mut self, parent_alias: &str, field: &str, node: Root) -> bool {
        if self.alias == parent_alias {
            self.joins.push(JoinEdge {
                field: field.to_string(),
                node,
            });
            return true;
        }

        for edge in &mut self.joins {
            if edge.node.join_at(parent_alias, field, node.clone()) {
                return true;
            }
        }

        false
    }
}
