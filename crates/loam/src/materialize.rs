use crate::Instance;

use loam_core::driver::Row;
use loam_core::schema::{Column, Entity, EntityId, Schema};
use loam_core::stmt::{EnumType, StorageClass, Type, Value};
use loam_core::{Error, Result};

/// Turns one result row into a populated [`Instance`].
///
/// The target entity may be abstract: the concrete subtype is chosen by
/// walking down the inheritance tree along matching discriminator values,
/// then the instance is populated level by level walking back up. Read-only
/// against the resolved schema, so freely shared once resolution completed.
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    schema: &'a Schema,
}

impl<'a> Materializer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Decode one row projected under `alias` into an instance of the
    /// concrete subtype of `target` the row encodes.
    pub fn row(&self, target: EntityId, alias: &str, row: Row<'_>) -> Result<Instance> {
        let mut entity = self.schema.entity(target);

        // Descend: each step reads the current entity's discriminator and
        // picks the child it names.
        while !entity.children.is_empty() {
            let discriminator = entity.discriminator().expect("resolved schema");
            let column = format!("{}.{}", level_alias(alias, target, entity), discriminator.name);
            let value = row
                .get(&column)
                .map_err(|err| err.context(Error::materialization("discriminator missing")))?;

            entity = entity
                .children
                .iter()
                .map(|child| self.schema.entity(*child))
                .find(|child| child.discriminator_value.as_ref() == Some(value))
                .ok_or_else(|| {
                    Error::materialization(format!(
                        "entity \"{}\" has no subtype with discriminator value {value:?}",
                        entity.name
                    ))
                })?;
        }

        // The leaf is instantiated without any user constructor; fields are
        // populated afterwards, ascending from leaf to root.
        let mut instance = Instance::for_entity(self.schema, entity.id);

        for level in self.schema.chain_to_root(entity.id) {
            let level_alias = level_alias(alias, target, level);

            for column in &level.columns {
                if column.is_join() {
                    // Relationships are loaded separately.
                    continue;
                }

                let key = format!("{level_alias}.{}", column.name);
                let raw = row
                    .get(&key)
                    .map_err(|err| err.context(Error::materialization("projection incomplete")))?;

                instance.set(&column.field, decode(column, raw)?)?;
            }
        }

        Ok(instance)
    }
}

/// Parents and children have their entity name appended to the root alias;
/// the queried entity itself uses the bare alias.
fn level_alias(alias: &str, target: EntityId, entity: &Entity) -> String {
    if entity.id == target {
        alias.to_string()
    } else {
        format!("{alias}{}", entity.name)
    }
}

/// Coerce a storage value into the column's declared type.
fn decode(column: &Column, raw: &Value) -> Result<Value> {
    let incompatible = |found: StorageClass| {
        Error::materialization(format!(
            "column \"{}\": incompatible data type: expected {}, found {found}",
            column.name, column.ty
        ))
    };

    Ok(match raw {
        Value::Null => Value::Null,
        Value::I64(value) => match &column.ty {
            Type::Int | Type::BigInt => Value::I64(*value),
            Type::Bool => Value::Bool(*value != 0),
            Type::Timestamp => Value::Timestamp(*value),
            Type::Enum(ty) => decode_enum_ordinal(column, ty, *value)?,
            _ => return Err(incompatible(StorageClass::Integer)),
        },
        Value::F64(value) => match &column.ty {
            Type::Float | Type::Double => Value::F64(*value),
            _ => return Err(incompatible(StorageClass::Real)),
        },
        Value::Text(value) => match &column.ty {
            Type::Text => Value::Text(value.clone()),
            Type::Enum(ty) => {
                if ty.variants.iter().any(|variant| variant == value) {
                    Value::Enum(value.clone())
                } else {
                    return Err(Error::materialization(format!(
                        "column \"{}\": \"{value}\" is not a constant of enum {}",
                        column.name, ty.name
                    )));
                }
            }
            _ => return Err(incompatible(StorageClass::Text)),
        },
        Value::Blob(value) => match &column.ty {
            Type::Blob => Value::Blob(value.clone()),
            _ => return Err(incompatible(StorageClass::Blob)),
        },
        other => return Err(incompatible(other.storage_class())),
    })
}

fn decode_enum_ordinal(column: &Column, ty: &EnumType, ordinal: i64) -> Result<Value> {
    usize::try_from(ordinal)
        .ok()
        .and_then(|index| ty.variants.get(index))
        .map(|variant| Value::Enum(variant.clone()))
        .ok_or_else(|| {
            Error::materialization(format!(
                "column \"{}\": ordinal {ordinal} is out of range for enum {}",
                column.name, ty.name
            ))
        })
}
