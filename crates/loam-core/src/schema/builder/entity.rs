use super::column::{ColumnState, Origin};
use super::Resolution;
use crate::resolve::{Published, Slot};
use crate::schema::def;
use crate::{Error, Result};

use heck::ToSnakeCase;
use indexmap::IndexMap;
use std::sync::Arc;

/// Mutable per-entity state during resolution. Frozen into
/// [`crate::schema::Entity`] once the session completes.
pub(crate) struct EntityState {
    pub(crate) index: usize,

    pub(crate) def: def::Entity,

    pub(crate) table_name: Slot<String>,

    /// Parent entity index. `Some(None)` once resolved without a parent.
    pub(crate) parent: Slot<Option<usize>>,

    /// Populated by each child as a side effect of its parent resolution.
    pub(crate) children: Published<Vec<usize>>,

    pub(crate) discriminator_value: Slot<Option<String>>,

    pub(crate) relations: Published<Vec<RelationSeed>>,

    pub(crate) columns: Published<ColumnTable>,

    /// Set once every own column name is in `columns`. Other entities
    /// chasing a referenced column wait on this before deciding to walk up
    /// the hierarchy.
    pub(crate) declared: Slot<()>,

    /// Set once inherited primary keys have been appended.
    pub(crate) inherited: Slot<()>,

    /// Resolved discriminator column name, `Some` iff the entity has
    /// children.
    pub(crate) discriminator: Slot<Option<String>>,
}

#[derive(Clone)]
pub(crate) struct RelationSeed {
    pub(crate) field: String,
    pub(crate) target: usize,
    pub(crate) def: def::Relation,
}

/// Own declared columns plus, eventually, inherited primary keys. Keyed by
/// column name, in insertion order.
#[derive(Default)]
pub(crate) struct ColumnTable {
    columns: IndexMap<String, Arc<ColumnState>>,
}

impl ColumnTable {
    pub(crate) fn insert(&mut self, column: Arc<ColumnState>) -> Result<()> {
        if self.columns.contains_key(&column.name) {
            return Err(Error::configuration(format!(
                "column \"{}\" already defined",
                column.name
            )));
        }
        self.columns.insert(column.name.clone(), column);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<ColumnState>> {
        self.columns.get(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<ColumnState>> {
        self.columns.values()
    }
}

impl EntityState {
    pub(crate) fn new(index: usize, def: def::Entity) -> Self {
        Self {
            index,
            def,
            table_name: Slot::new(),
            parent: Slot::new(),
            children: Published::new(vec![]),
            discriminator_value: Slot::new(),
            relations: Published::new(vec![]),
            columns: Published::new(ColumnTable::default()),
            declared: Slot::new(),
            inherited: Slot::new(),
            discriminator: Slot::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.def.name
    }
}

/// Run the five resolution stages for one entity. The stage order is fixed;
/// concurrency happens across entities and across column tasks.
pub(crate) async fn resolve(cx: Arc<Resolution>, state: Arc<EntityState>) -> Result<()> {
    log::debug!(
        "[database \"{}\"] mapping class {}",
        cx.db_name,
        state.name()
    );

    load_table_name(&state)?;
    load_parent(&cx, &state);
    load_discriminator_value(&state);
    load_relations(&cx, &state)?;
    load_columns(&cx, &state).await?;

    Ok(())
}

fn load_table_name(state: &EntityState) -> Result<()> {
    let table = state.def.table.as_ref().ok_or_else(|| {
        Error::configuration(format!(
            "class {} has no table declaration",
            state.name()
        ))
    })?;

    let name = match &table.name {
        Some(name) => name.clone(),
        None => {
            log::warn!(
                "[class \"{}\"] table name not specified, deriving it from the class name",
                state.name()
            );
            state.name().to_snake_case()
        }
    };

    state.table_name.set(name);
    Ok(())
}

/// Walk up the superclass chain until a mapped ancestor is found. There can
/// be unmapped classes between the child and the parent entity.
fn load_parent(cx: &Resolution, state: &EntityState) {
    let mut parent = None;

    for superclass in &state.def.extends {
        if let Some(ancestor) = cx.lookup(superclass) {
            parent = Some(ancestor.index);
            break;
        }
    }

    if let Some(parent) = parent {
        let parent = &cx.entities[parent];
        log::debug!(
            "[entity \"{}\"] found child {}",
            parent.name(),
            state.name()
        );
        parent.children.publish(|children| children.push(state.index));
    }

    state.parent.set(parent);
}

fn load_discriminator_value(state: &EntityState) {
    state
        .discriminator_value
        .set(state.def.discriminator_value.clone());
}

fn load_relations(cx: &Resolution, state: &EntityState) -> Result<()> {
    let mut seeds = vec![];

    for field in &state.def.fields {
        if let def::FieldKind::Relation(relation) = &field.kind {
            let target = cx.lookup(&relation.target).ok_or_else(|| {
                Error::configuration(format!(
                    "relationship field \"{}\": unknown entity \"{}\"",
                    field.name, relation.target
                ))
            })?;

            seeds.push(RelationSeed {
                field: field.name.clone(),
                target: target.index,
                def: relation.clone(),
            });
        }
    }

    state.relations.publish(|relations| *relations = seeds);
    Ok(())
}

async fn load_columns(cx: &Arc<Resolution>, state: &Arc<EntityState>) -> Result<()> {
    let own = collect_own_columns(state)?;

    state.columns.publish(|table| {
        for column in &own {
            table.insert(column.clone())?;
        }
        Ok::<(), Error>(())
    })?;
    state.declared.set(());

    for column in &own {
        let label = format!("entity {} / column {}", state.name(), column.name);
        let cx = cx.clone();
        let column = column.clone();
        cx.session
            .clone()
            .submit(label, async move { super::column::resolve(cx, column).await });
    }

    for column in &own {
        column.mapped.get().await;
    }
    log::info!("[entity \"{}\"] own columns mapped", state.name());

    // Inherited primary keys can only be computed once the whole hierarchy
    // is known, so this is a global barrier on the parent stage.
    for entity in &cx.entities {
        entity.parent.get().await;
    }

    if let Some(parent) = state.parent.get().await {
        let parent = cx.entities[parent].clone();
        parent.inherited.get().await;

        let primary_keys: Vec<Arc<ColumnState>> = parent.columns.read(|table| {
            table
                .iter()
                .filter(|column| column.primary_key.peek() == Some(true))
                .cloned()
                .collect()
        });

        state.columns.publish(|table| {
            for column in primary_keys {
                table.insert(column)?;
            }
            Ok::<(), Error>(())
        })?;
    }

    state.inherited.set(());
    log::info!("[entity \"{}\"] inherited columns added", state.name());

    // Children are final here: every entity passed its parent stage.
    let has_children = state.children.read(|children| !children.is_empty());

    if has_children {
        let name = state.def.discriminator_column.clone().ok_or_else(|| {
            Error::configuration(format!(
                "class {} has children but no discriminator column",
                state.name()
            ))
        })?;

        if !state.columns.read(|table| table.contains(&name)) {
            return Err(Error::configuration(format!(
                "class {}: discriminator column \"{name}\" not found",
                state.name()
            )));
        }

        state.discriminator.set(Some(name));
    } else {
        state.discriminator.set(None);
    }

    log::debug!("[entity \"{}\"] all columns loaded", state.name());
    Ok(())
}

/// Columns originated by this entity's own fields: plain columns plus the
/// join columns of owning-side to-one relationships. Inverse sides and
/// join-table relationships put no columns on this table.
fn collect_own_columns(state: &EntityState) -> Result<Vec<Arc<ColumnState>>> {
    let mut own = vec![];

    for field in &state.def.fields {
        match &field.kind {
            def::FieldKind::Column(column) => {
                own.push(Arc::new(ColumnState::new(
                    state.index,
                    &field.name,
                    column_name(column, &field.name),
                    Origin::Simple(column.clone()),
                )));
            }
            def::FieldKind::Relation(relation) => {
                let owning = matches!(
                    &relation.kind,
                    def::RelationKind::OneToOne { mapped_by: None } | def::RelationKind::ManyToOne
                );
                if !owning {
                    continue;
                }

                match &relation.join {
                    def::Join::Columns(joins) => {
                        for join in joins {
                            own.push(Arc::new(ColumnState::new(
                                state.index,
                                &field.name,
                                join_column_name(join, &field.name),
                                Origin::Join {
                                    target: relation.target.clone(),
                                    def: join.clone(),
                                    optional: relation.optional,
                                },
                            )));
                        }
                    }
                    def::Join::Table(_) => {}
                    def::Join::None => {
                        return Err(Error::configuration(format!(
                            "relationship field \"{}\" declares no join columns",
                            field.name
                        )));
                    }
                }
            }
        }
    }

    Ok(own)
}

fn column_name(column: &def::Column, field: &str) -> String {
    column
        .name
        .clone()
        .unwrap_or_else(|| field.to_snake_case())
}

fn join_column_name(join: &def::JoinColumn, field: &str) -> String {
    join.name.clone().unwrap_or_else(|| field.to_snake_case())
}
