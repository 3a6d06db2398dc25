use super::Resolution;
use crate::resolve::Slot;
use crate::schema::{def, Column, ColumnKind, EntityId, Propagation};
use crate::stmt::Type;
use crate::{Error, Result};

use std::sync::Arc;

/// Mutable per-column state during resolution. Each property is a fact of
/// its own: a join column's type becomes available only once the referenced
/// column has resolved, and other columns may be waiting on it.
pub(crate) struct ColumnState {
    pub(crate) name: String,

    pub(crate) field: String,

    /// The entity that declared the column. Inherited primary keys are
    /// shared into child tables without changing their origin.
    pub(crate) origin_entity: usize,

    pub(crate) origin: Origin,

    pub(crate) ty: Slot<Type>,

    pub(crate) nullable: Slot<bool>,

    pub(crate) primary_key: Slot<bool>,

    pub(crate) unique: Slot<bool>,

    pub(crate) default_value: Slot<Option<String>>,

    pub(crate) definition: Slot<Option<String>>,

    /// `Some` for join columns once the linked column is known.
    pub(crate) link: Slot<Option<Link>>,

    /// Set when every property has been resolved.
    pub(crate) mapped: Slot<()>,
}

#[derive(Clone)]
pub(crate) struct Link {
    pub(crate) target: usize,
    pub(crate) referenced: String,
    pub(crate) propagation: Propagation,
}

pub(crate) enum Origin {
    Simple(def::Column),
    Join {
        target: String,
        def: def::JoinColumn,
        optional: bool,
    },
}

impl ColumnState {
    pub(crate) fn new(origin_entity: usize, field: &str, name: String, origin: Origin) -> Self {
        Self {
            name,
            field: field.to_string(),
            origin_entity,
            origin,
            ty: Slot::new(),
            nullable: Slot::new(),
            primary_key: Slot::new(),
            unique: Slot::new(),
            default_value: Slot::new(),
            definition: Slot::new(),
            link: Slot::new(),
            mapped: Slot::new(),
        }
    }
}

pub(crate) async fn resolve(cx: Arc<Resolution>, column: Arc<ColumnState>) -> Result<()> {
    match &column.origin {
        Origin::Simple(def) => resolve_simple(&column, def)?,
        Origin::Join {
            target,
            def,
            optional,
        } => resolve_join(&cx, &column, target, def, *optional).await?,
    }

    column.mapped.set(());
    Ok(())
}

/// All properties of a plain column come from local declaration data.
fn resolve_simple(column: &ColumnState, def: &def::Column) -> Result<()> {
    column.definition.set(def.definition.clone());
    column.ty.set(def.ty.clone());
    column.nullable.set(def.nullable);
    column.primary_key.set(def.primary_key);
    column.unique.set(def.unique);

    let default = def
        .default_value
        .as_deref()
        .map(|raw| revalidate_default(&column.name, &def.ty, raw))
        .transpose()?;
    column.default_value.set(default);

    column.link.set(None);
    Ok(())
}

/// A join column takes its type from the referenced column, which may live
/// anywhere up the target entity's hierarchy and may not have resolved yet.
async fn resolve_join(
    cx: &Arc<Resolution>,
    column: &ColumnState,
    target: &str,
    def: &def::JoinColumn,
    optional: bool,
) -> Result<()> {
    column.definition.set(def.definition.clone());

    // A column that is not nullable by itself may still be null when the
    // relationship is optional.
    let nullable = def.nullable || optional;
    column.nullable.set(nullable);
    column.primary_key.set(def.primary_key);
    column.unique.set(def.unique);

    let propagation = Propagation::from_nullability(nullable);

    let target_state = cx.lookup(target).ok_or_else(|| {
        Error::configuration(format!(
            "field \"{}\": unknown entity \"{}\"",
            column.field, target
        ))
    })?;
    let target_index = target_state.index;

    let linked = chase_referenced(cx, target, &def.referenced, &column.field).await?;
    let ty = linked.ty.get().await;
    column.ty.set(ty);

    column.default_value.set(def.default_value.clone());
    column.link.set(Some(Link {
        target: target_index,
        referenced: def.referenced.clone(),
        propagation,
    }));

    Ok(())
}

/// Walk up the referenced entity's parent chain until a column with the
/// required name appears. Each hop waits for that entity to declare its own
/// columns and to resolve its parent.
async fn chase_referenced(
    cx: &Arc<Resolution>,
    target: &str,
    referenced: &str,
    field: &str,
) -> Result<Arc<ColumnState>> {
    let mut current = cx
        .lookup(target)
        .ok_or_else(|| {
            Error::configuration(format!("field \"{field}\": unknown entity \"{target}\""))
        })?
        .clone();

    loop {
        current.declared.get().await;

        if let Some(found) = current.columns.read(|table| table.get(referenced).cloned()) {
            return Ok(found);
        }

        match current.parent.get().await {
            Some(parent) => current = cx.entities[parent].clone(),
            None => {
                return Err(Error::configuration(format!(
                    "field \"{field}\": referenced column \"{referenced}\" not found"
                )))
            }
        }
    }
}

/// Parse and re-serialize a textual default against the resolved type.
fn revalidate_default(name: &str, ty: &Type, raw: &str) -> Result<String> {
    let incompatible = || {
        Error::configuration(format!(
            "column \"{name}\": default value \"{raw}\" is incompatible with type {ty}"
        ))
    };

    Ok(match ty {
        Type::Int => raw
            .parse::<i32>()
            .map_err(|_| incompatible())?
            .to_string(),
        Type::BigInt | Type::Timestamp => raw
            .parse::<i64>()
            .map_err(|_| incompatible())?
            .to_string(),
        Type::Float => raw
            .parse::<f32>()
            .map_err(|_| incompatible())?
            .to_string(),
        Type::Double => raw
            .parse::<f64>()
            .map_err(|_| incompatible())?
            .to_string(),
        Type::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" => "1".to_string(),
            "false" => "0".to_string(),
            _ => return Err(incompatible()),
        },
        Type::Text | Type::Enum(_) | Type::Blob => raw.to_string(),
    })
}

pub(crate) fn freeze(column: &Arc<ColumnState>) -> Column {
    let kind = match column.link.peek().expect("resolved") {
        None => ColumnKind::Simple,
        Some(link) => ColumnKind::Join {
            target: EntityId(link.target),
            referenced: link.referenced,
            propagation: link.propagation,
        },
    };

    Column {
        name: column.name.clone(),
        field: column.field.clone(),
        origin: EntityId(column.origin_entity),
        ty: column.ty.peek().expect("resolved"),
        nullable: column.nullable.peek().expect("resolved"),
        primary_key: column.primary_key.peek().expect("resolved"),
        unique: column.unique.peek().expect("resolved"),
        default_value: column.default_value.peek().expect("resolved"),
        custom_definition: column.definition.peek().expect("resolved"),
        kind,
    }
}
