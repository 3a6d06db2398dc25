pub mod def;

mod builder;
pub use builder::Builder;

mod column;
pub use column::{Column, ColumnKind};

mod entity;
pub use entity::{Entity, EntityId};

mod foreign_key;
pub use foreign_key::ForeignKey;

mod join_table;
pub use join_table::JoinTable;

mod propagation;
pub use propagation::{Action, Propagation};

mod relation;
pub use relation::{Relation, RelationKind};

use crate::{Error, Result};

use indexmap::IndexMap;

/// The resolved mapping of one logical database: the closed set of entities
/// plus the join tables their many-to-many relationships require.
///
/// Everything here is immutable; concurrent resolution happened inside
/// [`Builder::build`] and the result is safe to share across threads.
#[derive(Debug)]
pub struct Schema {
    pub name: String,

    /// Declared schema version, checked against the persisted one at
    /// initialization time.
    pub version: i64,

    entities: Vec<Entity>,

    by_name: IndexMap<String, EntityId>,

    pub join_tables: Vec<JoinTable>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn new(
        name: String,
        version: i64,
        entities: Vec<Entity>,
        by_name: IndexMap<String, EntityId>,
        join_tables: Vec<JoinTable>,
    ) -> Self {
        Self {
            name,
            version,
            entities,
            by_name,
            join_tables,
        }
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    /// Look up an entity by its class name. The schema is a closed world:
    /// asking for an unmapped class is a hard error.
    pub fn entity_by_name(&self, name: &str) -> Result<&Entity> {
        self.by_name
            .get(name)
            .map(|id| self.entity(*id))
            .ok_or_else(|| Error::configuration(format!("entity \"{name}\" is not mapped")))
    }

    pub fn entities(&self) -> impl ExactSizeIterator<Item = &Entity> {
        self.entities.iter()
    }

    /// The entity's ancestors, nearest first.
    pub fn ancestors(&self, id: EntityId) -> Vec<&Entity> {
        let mut ancestors = vec![];
        let mut current = self.entity(id).parent;

        while let Some(parent) = current {
            let entity = self.entity(parent);
            ancestors.push(entity);
            current = entity.parent;
        }

        ancestors
    }

    /// The entity's descendants, depth first. This is the order in which a
    /// query projects subtree columns.
    pub fn descendants_depth_first(&self, id: EntityId) -> Vec<&Entity> {
        let mut descendants = vec![];
        let mut stack = vec![id];

        while let Some(next) = stack.pop() {
            for child in self.entity(next).children.iter().copied() {
                descendants.push(self.entity(child));
                if !self.entity(child).children.is_empty() {
                    stack.push(child);
                }
            }
        }

        descendants
    }

    /// The inheritance chain from `leaf` up to its root, leaf first.
    pub fn chain_to_root(&self, leaf: EntityId) -> Vec<&Entity> {
        let mut chain = vec![self.entity(leaf)];
        chain.extend(self.ancestors(leaf));
        chain
    }
}
