use super::{Column, ForeignKey, Relation};
use crate::stmt::Value;

use std::fmt;

/// The resolved mapping of one entity class.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Uniquely identifies the entity within the schema.
    pub id: EntityId,

    /// Class name, e.g. `ThrillerFilm`.
    pub name: String,

    /// Table backing this entity.
    pub table: String,

    /// Parent entity. Parent links form a forest; the chain is acyclic.
    pub parent: Option<EntityId>,

    /// Child entities, populated while each child resolved its parent.
    pub children: Vec<EntityId>,

    /// Present iff the entity has a parent, already converted to the
    /// discriminator column's type.
    pub discriminator_value: Option<Value>,

    /// Index of the discriminator column. Present iff the entity has
    /// children.
    pub discriminator_column: Option<usize>,

    /// All columns of the backing table: own declared columns in
    /// declaration order, then inherited primary keys.
    pub columns: Vec<Column>,

    /// Multi-column uniqueness constraints, as column indices.
    pub unique_constraints: Vec<Vec<usize>>,

    /// Relationship fields declared on this entity.
    pub relations: Vec<Relation>,

    /// Relationship-originated foreign keys (one per join column group).
    /// The inheritance foreign key is derived from `parent` instead.
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub usize);

impl Entity {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// The columns generated from a field this entity declared. A simple
    /// field maps to one column, a join-column group to several.
    pub fn columns_for_field(&self, field: &str) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|column| column.origin == self.id && column.field == field)
            .collect()
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| column.primary_key)
    }

    pub fn relation(&self, field: &str) -> Option<&Relation> {
        self.relations.iter().find(|rel| rel.field == field)
    }

    pub fn discriminator(&self) -> Option<&Column> {
        self.discriminator_column.map(|index| &self.columns[index])
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "EntityId({})", self.0)
    }
}

impl From<&Entity> for EntityId {
    fn from(value: &Entity) -> Self {
        value.id
    }
}
