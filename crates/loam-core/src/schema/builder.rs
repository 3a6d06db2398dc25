mod column;
mod entity;

use super::{def, Column, ColumnKind, Entity, EntityId, ForeignKey, JoinTable, Relation, RelationKind, Schema};
use crate::resolve::Session;
use crate::stmt::{Type, Value};
use crate::{Error, Result};

use entity::EntityState;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;

/// Resolves declarative metadata into an immutable [`Schema`].
///
/// Resolution runs one concurrent task per entity; tasks block on facts
/// published by other entities (referenced column types, parent links,
/// inherited primary keys) until everything reaches a fixed point. The
/// deadline bounds each task so an unsatisfiable configuration is rejected
/// instead of hanging.
#[derive(Debug)]
pub struct Builder {
    deadline: Duration,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            deadline: Duration::from_secs(10),
        }
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn build(self, def: def::Schema) -> Result<Schema> {
        let def::Schema {
            name,
            version,
            entities,
        } = def;

        let mut by_name = IndexMap::new();
        for (index, entity) in entities.iter().enumerate() {
            if by_name.insert(entity.name.clone(), index).is_some() {
                return Err(Error::configuration(format!(
                    "entity \"{}\" mapped twice",
                    entity.name
                )));
            }
        }

        let session = Session::new(self.deadline);
        let states: Vec<_> = entities
            .into_iter()
            .enumerate()
            .map(|(index, entity)| Arc::new(EntityState::new(index, entity)))
            .collect();

        let cx = Arc::new(Resolution {
            db_name: name.clone(),
            entities: states,
            by_name,
            session: session.clone(),
        });

        for state in &cx.entities {
            let label = format!("entity {}", state.def.name);
            let cx = cx.clone();
            let state = state.clone();
            session.submit(label, async move { entity::resolve(cx, state).await });
        }

        session.join_all().await?;

        freeze(name, version, &cx)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state of one resolution run.
pub(crate) struct Resolution {
    pub(crate) db_name: String,
    pub(crate) entities: Vec<Arc<EntityState>>,
    pub(crate) by_name: IndexMap<String, usize>,
    pub(crate) session: Session,
}

impl Resolution {
    pub(crate) fn lookup(&self, name: &str) -> Option<&Arc<EntityState>> {
        self.by_name.get(name).map(|index| &self.entities[*index])
    }
}

/// Turn the fully-resolved mutable state into the immutable schema.
fn freeze(name: String, version: i64, cx: &Resolution) -> Result<Schema> {
    let mut entities = Vec::with_capacity(cx.entities.len());
    for state in &cx.entities {
        entities.push(freeze_entity(state)?);
    }

    // Discriminator values need the parent's resolved column type, so they
    // are settled once every entity is frozen.
    for index in 0..entities.len() {
        let children = entities[index].children.clone();
        if children.is_empty() {
            continue;
        }

        let parent_name = entities[index].name.clone();
        let disc = entities[index]
            .discriminator_column
            .expect("validated during resolution");
        let disc_ty = entities[index].columns[disc].ty.clone();

        let mut seen: Vec<Value> = vec![];
        for child in children {
            let child_name = entities[child.0].name.clone();
            let raw = cx.entities[child.0]
                .discriminator_value
                .peek()
                .flatten()
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "class {child_name} has no discriminator value"
                    ))
                })?;

            let value = convert_discriminator(&child_name, &disc_ty, &raw)?;

            if seen.contains(&value) {
                return Err(Error::configuration(format!(
                    "duplicate discriminator value \"{raw}\" among children of {parent_name}"
                )));
            }

            seen.push(value.clone());
            entities[child.0].discriminator_value = Some(value);
        }
    }

    let join_tables = freeze_join_tables(cx, &entities)?;

    let by_name = cx
        .by_name
        .iter()
        .map(|(name, index)| (name.clone(), EntityId(*index)))
        .collect();

    Ok(Schema::new(name, version, entities, by_name, join_tables))
}

fn freeze_entity(state: &EntityState) -> Result<Entity> {
    let id = EntityId(state.index);
    let def = &state.def;

    let table = state.table_name.peek().expect("resolved");
    let parent = state.parent.peek().expect("resolved").map(EntityId);

    let mut children: Vec<EntityId> =
        state.children.read(|c| c.iter().copied().map(EntityId).collect());
    children.sort();

    let mut columns: Vec<Column> =
        state.columns.read(|table| table.iter().map(column::freeze).collect());

    let discriminator_column = match state.discriminator.peek().expect("resolved") {
        Some(name) => {
            let index = columns
                .iter()
                .position(|column| column.name == name)
                .expect("validated during resolution");
            // Rows of every subtype must be classifiable.
            columns[index].nullable = false;
            Some(index)
        }
        None => None,
    };

    let table_def = def.table.as_ref().expect("validated during resolution");
    let mut unique_constraints = vec![];
    for set in &table_def.unique_constraints {
        let mut indices = vec![];
        for column_name in set {
            let index = columns
                .iter()
                .position(|column| &column.name == column_name)
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "unique constraint: column \"{column_name}\" not found"
                    ))
                })?;
            indices.push(index);
        }
        unique_constraints.push(indices);
    }

    let relations: Vec<Relation> = state.relations.read(|seeds| {
        seeds
            .iter()
            .map(|seed| Relation {
                field: seed.field.clone(),
                target: EntityId(seed.target),
                kind: convert_relation_kind(&seed.def.kind),
                optional: seed.def.optional,
                columns: columns
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.origin == id && c.field == seed.field)
                    .map(|(index, _)| index)
                    .collect(),
            })
            .collect()
    });

    // One foreign key per join-column group. Inherited join columns keep
    // their constraint in the child table as well.
    let mut groups: IndexMap<(EntityId, String), Vec<usize>> = IndexMap::new();
    for (index, column) in columns.iter().enumerate() {
        if column.is_join() {
            groups
                .entry((column.origin, column.field.clone()))
                .or_default()
                .push(index);
        }
    }

    let mut foreign_keys = vec![];
    for indices in groups.into_values() {
        let ColumnKind::Join {
            target,
            propagation,
            ..
        } = columns[indices[0]].kind.clone()
        else {
            unreachable!()
        };

        foreign_keys.push(ForeignKey {
            columns: indices.iter().map(|i| columns[*i].name.clone()).collect(),
            target,
            target_columns: indices
                .iter()
                .map(|i| match &columns[*i].kind {
                    ColumnKind::Join { referenced, .. } => referenced.clone(),
                    ColumnKind::Simple => unreachable!(),
                })
                .collect(),
            propagation,
        });
    }

    Ok(Entity {
        id,
        name: def.name.clone(),
        table,
        parent,
        children,
        discriminator_value: None,
        discriminator_column,
        columns,
        unique_constraints,
        relations,
        foreign_keys,
    })
}

fn convert_relation_kind(kind: &def::RelationKind) -> RelationKind {
    match kind {
        def::RelationKind::OneToOne { mapped_by } => RelationKind::OneToOne {
            mapped_by: mapped_by.clone(),
        },
        def::RelationKind::ManyToOne => RelationKind::ManyToOne,
        def::RelationKind::OneToMany { mapped_by } => RelationKind::OneToMany {
            mapped_by: mapped_by.clone(),
        },
        def::RelationKind::ManyToMany { mapped_by } => RelationKind::ManyToMany {
            mapped_by: mapped_by.clone(),
        },
    }
}

fn convert_discriminator(child: &str, ty: &Type, raw: &str) -> Result<Value> {
    match ty {
        Type::Int | Type::BigInt => raw.parse::<i64>().map(Value::I64).map_err(|_| {
            Error::configuration(format!(
                "class {child}: discriminator value \"{raw}\" is not an integer"
            ))
        }),
        Type::Text => Ok(Value::Text(raw.to_string())),
        other => Err(Error::configuration(format!(
            "discriminator column type must be integer or text, found {other}"
        ))),
    }
}

fn freeze_join_tables(cx: &Resolution, entities: &[Entity]) -> Result<Vec<JoinTable>> {
    let mut join_tables: Vec<JoinTable> = vec![];

    for state in &cx.entities {
        let seeds = state.relations.read(|seeds| seeds.clone());

        for seed in seeds {
            let def::Join::Table(table_def) = &seed.def.join else {
                continue;
            };

            if matches!(
                &seed.def.kind,
                def::RelationKind::ManyToMany { mapped_by: Some(_) }
                    | def::RelationKind::OneToOne { mapped_by: Some(_) }
            ) {
                continue;
            }

            if join_tables.iter().any(|jt| jt.name == table_def.name) {
                return Err(Error::configuration(format!(
                    "join table \"{}\" declared twice",
                    table_def.name
                )));
            }

            join_tables.push(freeze_join_table(
                entities,
                &entities[state.index],
                &entities[seed.target],
                &seed.field,
                table_def,
            )?);
        }
    }

    Ok(join_tables)
}

fn freeze_join_table(
    entities: &[Entity],
    owner: &Entity,
    target: &Entity,
    field: &str,
    def: &def::JoinTableDef,
) -> Result<JoinTable> {
    let mut columns = vec![];
    let mut foreign_keys = vec![];

    for (side, joins) in [(owner, &def.joins), (target, &def.inverse_joins)] {
        let mut names = vec![];
        let mut referenced = vec![];
        let mut propagation = None;

        for join in joins {
            let linked = find_column_on_chain(entities, side, &join.referenced).ok_or_else(
                || {
                    Error::configuration(format!(
                        "join table \"{}\": referenced column \"{}\" not found in {}",
                        def.name, join.referenced, side.name
                    ))
                },
            )?;

            let name = join.name.clone().ok_or_else(|| {
                Error::configuration(format!(
                    "join table \"{}\": column referencing \"{}\" needs an explicit name",
                    def.name, join.referenced
                ))
            })?;

            let derived = super::Propagation::from_nullability(join.nullable);
            propagation.get_or_insert(derived);

            names.push(name.clone());
            referenced.push(join.referenced.clone());

            columns.push(Column {
                name,
                field: field.to_string(),
                origin: side.id,
                ty: linked.ty.clone(),
                nullable: join.nullable,
                // The pair of references is the row's identity.
                primary_key: true,
                unique: join.unique,
                default_value: join.default_value.clone(),
                custom_definition: join.definition.clone(),
                kind: ColumnKind::Join {
                    target: side.id,
                    referenced: join.referenced.clone(),
                    propagation: derived,
                },
            });
        }

        if let Some(propagation) = propagation {
            foreign_keys.push(ForeignKey {
                columns: names,
                target: side.id,
                target_columns: referenced,
                propagation,
            });
        }
    }

    Ok(JoinTable {
        name: def.name.clone(),
        columns,
        foreign_keys,
    })
}

fn find_column_on_chain<'a>(
    entities: &'a [Entity],
    start: &'a Entity,
    name: &str,
) -> Option<&'a Column> {
    let mut current = Some(start);

    while let Some(entity) = current {
        if let Some(column) = entity.column(name) {
            return Some(column);
        }
        current = entity.parent.map(|parent| &entities[parent.0]);
    }

    None
}
