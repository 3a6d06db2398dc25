use loam_core::schema::{EntityId, Schema};
use loam_core::stmt::Value;
use loam_core::{Error, Result};

use indexmap::IndexMap;

/// A populated data object.
///
/// Instances are dynamic records validated against the entity's resolved
/// field set (the entity's own fields plus everything inherited), replacing
/// reflective field access: touching a field the entity does not declare is
/// a field-access error, while a declared-but-unset field reads as null.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    entity: EntityId,

    entity_name: String,

    /// Accessible field names, computed once from the inheritance chain.
    fields: Vec<String>,

    values: IndexMap<String, Value>,
}

impl Instance {
    pub fn new(schema: &Schema, entity: &str) -> Result<Self> {
        let entity = schema.entity_by_name(entity)?;
        Ok(Self::for_entity(schema, entity.id))
    }

    pub(crate) fn for_entity(schema: &Schema, id: EntityId) -> Self {
        let entity = schema.entity(id);
        let mut fields: Vec<String> = vec![];

        for level in schema.chain_to_root(id) {
            for column in &level.columns {
                if !fields.contains(&column.field) {
                    fields.push(column.field.clone());
                }
            }
            for relation in &level.relations {
                if !fields.contains(&relation.field) {
                    fields.push(relation.field.clone());
                }
            }
        }

        Self {
            entity: id,
            entity_name: entity.name.clone(),
            fields,
            values: IndexMap::new(),
        }
    }

    /// The concrete entity this instance belongs to. For rows materialized
    /// through a polymorphic query this is the leaf subtype.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.check_field(field)?;
        self.values.insert(field.to_string(), value.into());
        Ok(())
    }

    /// The field's value; null when the field has never been assigned.
    pub fn get(&self, field: &str) -> Result<Value> {
        self.check_field(field)?;
        Ok(self.values.get(field).cloned().unwrap_or(Value::Null))
    }

    fn check_field(&self, field: &str) -> Result<()> {
        if self.fields.iter().any(|f| f == field) {
            Ok(())
        } else {
            Err(Error::field_access(format!(
                "entity \"{}\" has no field \"{field}\"",
                self.entity_name
            )))
        }
    }
}
