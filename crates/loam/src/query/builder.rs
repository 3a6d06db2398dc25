use super::expr::ExprKind;
use super::{Expr, Path, Query, Root};
use crate::Database;

use loam_core::schema::{Column, ColumnKind, Entity, EntityId, Relation, RelationKind, Schema};
use loam_core::stmt;
use loam_core::stmt::{BinaryOp, Value};
use loam_core::{Error, Result};

use std::cell::Cell;

/// Compiles a fluent query into an executable SELECT statement.
///
/// A builder moves from → filter → build; `build` consumes it, so every
/// builder is used exactly once. Roots created through [`root`] get
/// builder-unique aliases `a0`, `a1`, …
///
/// [`root`]: QueryBuilder::root
#[derive(Debug)]
pub struct QueryBuilder<'a> {
    db: &'a Database,

    /// The entity the query materializes into.
    result: EntityId,

    root_counter: Cell<usize>,

    from: Option<Root>,

    filter: Option<Expr>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(db: &'a Database, result: EntityId) -> Self {
        Self {
            db,
            result,
            root_counter: Cell::new(0),
            from: None,
            filter: None,
        }
    }

    /// A new root over `entity` with a builder-unique alias.
    pub fn root(&self, entity: &str) -> Result<Root> {
        let entity = self.db.schema().entity_by_name(entity)?;
        let alias = format!("a{}", self.root_counter.get());
        self.root_counter.set(self.root_counter.get() + 1);
        Ok(Root::new(entity.id, alias))
    }

    pub fn from(mut self, root: Root) -> Self {
        self.from = Some(root);
        self
    }

    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Compile the query, resolving the joins its predicates require.
    pub fn build(self, target: &Root) -> Result<Query<'a>> {
        let schema = self.db.schema();

        let Some(mut from) = self.from else {
            return Err(Error::query_compilation("\"FROM\" clause not set"));
        };

        if !from.contains_alias(&target.alias) {
            return Err(Error::query_compilation(
                "the target root does not belong to the \"FROM\" structure",
            ));
        }

        if target.entity != self.result {
            return Err(Error::query_compilation(
                "the target root must be an occurrence of the query's result entity",
            ));
        }

        // A predicate referencing a relationship implies a join to the
        // referenced entity under a deterministic alias; synthesize the
        // joins the caller did not write, never duplicating existing ones.
        if let Some(filter) = &self.filter {
            for path in filter.join_paths() {
                let Some((_, relation)) = relation_on_chain(schema, path.entity, &path.field)
                else {
                    continue;
                };

                let implied = format!("{}{}", path.alias, path.field);
                if !from.contains_alias(&implied) {
                    let node = Root::new(relation.target, implied);
                    if !from.join_at(&path.alias, &path.field, node) {
                        return Err(Error::query_compilation(format!(
                            "root \"{}\" is not part of the query",
                            path.alias
                        )));
                    }
                }
            }
        }

        let columns = compile_projection(schema, self.result, &target.alias);
        let source = compile_source(schema, &from)?;
        let filter = self
            .filter
            .as_ref()
            .map(|filter| compile_filter(schema, filter))
            .transpose()?;

        let select = stmt::Select {
            columns,
            source,
            filter,
        };
        let sql = loam_sql::Serializer::new(schema).select(&select);

        Ok(Query::new(
            self.db,
            self.result,
            target.alias.clone(),
            sql,
        ))
    }
}

/// Find a relationship field on the entity or one of its ancestors,
/// together with the entity that declares it.
fn relation_on_chain<'s>(
    schema: &'s Schema,
    entity: EntityId,
    field: &str,
) -> Option<(&'s Entity, &'s Relation)> {
    let mut current = Some(schema.entity(entity));

    while let Some(entity) = current {
        if let Some(relation) = entity.relation(field) {
            return Some((entity, relation));
        }
        current = entity.parent.map(|parent| schema.entity(parent));
    }

    None
}

/// The projection walks the target's full inheritance context so one query
/// returns enough data to materialize any concrete subtype: own columns,
/// every ancestor's columns, then every descendant's columns depth first.
fn compile_projection(
    schema: &Schema,
    target: EntityId,
    alias: &str,
) -> Vec<stmt::SelectColumn> {
    let mut columns = vec![];

    push_entity_columns(&mut columns, schema.entity(target), alias);

    for ancestor in schema.ancestors(target) {
        push_entity_columns(&mut columns, ancestor, &format!("{alias}{}", ancestor.name));
    }

    for descendant in schema.descendants_depth_first(target) {
        push_entity_columns(
            &mut columns,
            descendant,
            &format!("{alias}{}", descendant.name),
        );
    }

    columns
}

fn push_entity_columns(out: &mut Vec<stmt::SelectColumn>, entity: &Entity, alias: &str) {
    for column in &entity.columns {
        out.push(stmt::SelectColumn {
            column: stmt::ExprColumn {
                alias: alias.to_string(),
                column: column.name.clone(),
            },
            output: format!("{alias}.{}", column.name),
        });
    }
}

fn compile_source(schema: &Schema, from: &Root) -> Result<stmt::Source> {
    let entity = schema.entity(from.entity);

    let mut source = stmt::Source {
        table: entity.table.clone(),
        alias: from.alias.clone(),
        joins: vec![],
    };

    push_hierarchy_joins(schema, entity, &from.alias, &mut source.joins);
    push_relation_joins(schema, from, &mut source.joins)?;

    Ok(source)
}

/// Make every alias the projection references available: ancestor tables
/// joined on the shared primary key, descendant tables left-joined because
/// a row lives in at most one subtree.
fn push_hierarchy_joins(
    schema: &Schema,
    entity: &Entity,
    alias: &str,
    joins: &mut Vec<stmt::Join>,
) {
    let keys: Vec<&str> = entity.primary_keys().map(|pk| pk.name.as_str()).collect();
    if keys.is_empty() {
        return;
    }

    for ancestor in schema.ancestors(entity.id) {
        let ancestor_alias = format!("{alias}{}", ancestor.name);
        joins.push(stmt::Join {
            kind: stmt::JoinKind::Inner,
            table: ancestor.table.clone(),
            on: key_equality(alias, &ancestor_alias, &keys),
            alias: ancestor_alias,
        });
    }

    for descendant in schema.descendants_depth_first(entity.id) {
        let descendant_alias = format!("{alias}{}", descendant.name);
        joins.push(stmt::Join {
            kind: stmt::JoinKind::Left,
            table: descendant.table.clone(),
            on: key_equality(alias, &descendant_alias, &keys),
            alias: descendant_alias,
        });
    }
}

fn key_equality(lhs_alias: &str, rhs_alias: &str, keys: &[&str]) -> stmt::Expr {
    stmt::Expr::and_from_vec(
        keys.iter()
            .map(|key| {
                stmt::Expr::eq(
                    stmt::Expr::column(lhs_alias, *key),
                    stmt::Expr::column(rhs_alias, *key),
                )
            })
            .collect(),
    )
}

fn push_relation_joins(
    schema: &Schema,
    root: &Root,
    joins: &mut Vec<stmt::Join>,
) -> Result<()> {
    for edge in &root.joins {
        let (declaring, relation) =
            relation_on_chain(schema, root.entity, &edge.field).ok_or_else(|| {
                Error::query_compilation(format!(
                    "\"{}\" is not a relationship field of {}",
                    edge.field,
                    schema.entity(root.entity).name
                ))
            })?;

        if relation.target != edge.node.entity {
            return Err(Error::query_compilation(format!(
                "root \"{}\" is not an occurrence of the relationship's target entity",
                edge.node.alias
            )));
        }

        let target = schema.entity(edge.node.entity);

        joins.push(stmt::Join {
            kind: stmt::JoinKind::Inner,
            table: target.table.clone(),
            alias: edge.node.alias.clone(),
            on: join_condition(schema, root, declaring, relation, &edge.node)?,
        });

        push_hierarchy_joins(schema, target, &edge.node.alias, joins);
        push_relation_joins(schema, &edge.node, joins)?;
    }

    Ok(())
}

/// The ON condition of a relationship join: equalities between the owning
/// side's join columns and the columns they reference.
fn join_condition(
    schema: &Schema,
    source: &Root,
    declaring: &Entity,
    relation: &Relation,
    node: &Root,
) -> Result<stmt::Expr> {
    // Join columns physically live on the table of the entity declaring the
    // relationship, which for inherited relationships is an ancestor alias.
    let declaring_alias = |root_alias: &str, root_entity: EntityId, declaring: &Entity| {
        if declaring.id == root_entity {
            root_alias.to_string()
        } else {
            format!("{root_alias}{}", declaring.name)
        }
    };

    match &relation.kind {
        RelationKind::OneToOne { mapped_by: None } | RelationKind::ManyToOne => {
            let local_alias = declaring_alias(&source.alias, source.entity, declaring);

            Ok(stmt::Expr::and_from_vec(
                relation
                    .columns
                    .iter()
                    .map(|index| {
                        let column = &declaring.columns[*index];
                        let ColumnKind::Join { referenced, .. } = &column.kind else {
                            unreachable!()
                        };
                        stmt::Expr::eq(
                            stmt::Expr::column(local_alias.as_str(), column.name.as_str()),
                            stmt::Expr::column(node.alias.as_str(), referenced.as_str()),
                        )
                    })
                    .collect(),
            ))
        }
        RelationKind::OneToOne {
            mapped_by: Some(owner_field),
        }
        | RelationKind::OneToMany {
            mapped_by: owner_field,
        } => {
            // Inverse side: the join columns sit on the target.
            let (owning_entity, owning) = relation_on_chain(schema, node.entity, owner_field)
                .ok_or_else(|| {
                    Error::query_compilation(format!(
                        "\"{owner_field}\" is not a relationship field of {}",
                        schema.entity(node.entity).name
                    ))
                })?;

            let owning_alias = declaring_alias(&node.alias, node.entity, owning_entity);

            Ok(stmt::Expr::and_from_vec(
                owning
                    .columns
                    .iter()
                    .map(|index| {
                        let column = &owning_entity.columns[*index];
                        let ColumnKind::Join { referenced, .. } = &column.kind else {
                            unreachable!()
                        };
                        stmt::Expr::eq(
                            stmt::Expr::column(owning_alias.as_str(), column.name.as_str()),
                            stmt::Expr::column(source.alias.as_str(), referenced.as_str()),
                        )
                    })
                    .collect(),
            ))
        }
        RelationKind::ManyToMany { .. } => Err(Error::query_compilation(
            "joining through a join table is not supported",
        )),
    }
}

fn compile_filter(schema: &Schema, filter: &Expr) -> Result<stmt::Expr> {
    match &filter.kind {
        ExprKind::And(operands) => Ok(stmt::Expr::and_from_vec(
            operands
                .iter()
                .map(|operand| compile_filter(schema, operand))
                .collect::<Result<_>>()?,
        )),
        ExprKind::Or(operands) => Ok(stmt::Expr::or_from_vec(
            operands
                .iter()
                .map(|operand| compile_filter(schema, operand))
                .collect::<Result<_>>()?,
        )),
        ExprKind::Binary { path, op, value } => compile_comparison(schema, path, *op, value),
        ExprKind::IsNull { path } => compile_null_check(schema, path),
    }
}

enum PathTarget<'s> {
    /// A plain column, on the root itself or an ancestor alias.
    Column { alias: String, column: &'s Column },

    /// A relationship: the referenced entity under its implied alias.
    Relation {
        alias: String,
        entity: &'s Entity,
        attribute: Option<String>,
    },
}

fn classify_path<'s>(schema: &'s Schema, path: &Path) -> Result<PathTarget<'s>> {
    if let Some((_, relation)) = relation_on_chain(schema, path.entity, &path.field) {
        return Ok(PathTarget::Relation {
            alias: format!("{}{}", path.alias, path.field),
            entity: schema.entity(relation.target),
            attribute: path.attribute.clone(),
        });
    }

    if path.attribute.is_some() {
        return Err(Error::query_compilation(format!(
            "\"{}\" is not a relationship field, it has no attributes",
            path.field
        )));
    }

    let entity = schema.entity(path.entity);
    if let Some(column) = entity.columns.iter().find(|c| c.field == path.field) {
        return Ok(PathTarget::Column {
            alias: path.alias.clone(),
            column,
        });
    }

    // Non-key ancestor fields live only in the ancestor's table, which the
    // hierarchy joins expose under the ancestor alias.
    for ancestor in schema.ancestors(path.entity) {
        if let Some(column) = ancestor.columns.iter().find(|c| c.field == path.field) {
            return Ok(PathTarget::Column {
                alias: format!("{}{}", path.alias, ancestor.name),
                column,
            });
        }
    }

    Err(Error::query_compilation(format!(
        "unknown field \"{}\" on entity {}",
        path.field, entity.name
    )))
}

/// Resolve an attribute by field name on the target entity, falling back to
/// its ancestors under their hierarchy aliases.
fn resolve_attribute<'s>(
    schema: &'s Schema,
    alias: &str,
    entity: &'s Entity,
    attribute: &str,
) -> Result<(String, &'s Column)> {
    if let Some(column) = entity.columns.iter().find(|c| c.field == attribute) {
        return Ok((alias.to_string(), column));
    }

    for ancestor in schema.ancestors(entity.id) {
        if let Some(column) = ancestor.columns.iter().find(|c| c.field == attribute) {
            return Ok((format!("{alias}{}", ancestor.name), column));
        }
    }

    Err(Error::query_compilation(format!(
        "unknown attribute \"{attribute}\" on entity {}",
        entity.name
    )))
}

fn compile_comparison(
    schema: &Schema,
    path: &Path,
    op: BinaryOp,
    value: &Value,
) -> Result<stmt::Expr> {
    match classify_path(schema, path)? {
        PathTarget::Column { alias, column } => {
            check_value_type(column, value)?;
            Ok(stmt::Expr::binary_op(
                stmt::Expr::column(alias, column.name.clone()),
                op,
                stmt::Expr::Value(value.clone()),
            ))
        }
        PathTarget::Relation {
            alias,
            entity,
            attribute: Some(attribute),
        } => {
            let (alias, column) = resolve_attribute(schema, &alias, entity, &attribute)?;
            check_value_type(column, value)?;
            Ok(stmt::Expr::binary_op(
                stmt::Expr::column(alias, column.name.clone()),
                op,
                stmt::Expr::Value(value.clone()),
            ))
        }
        PathTarget::Relation {
            alias,
            entity,
            attribute: None,
        } => {
            // Comparing the relationship itself compares the referenced
            // entity's primary key.
            let keys: Vec<&Column> = entity.primary_keys().collect();

            match value {
                Value::Record(values) if values.len() == keys.len() => {
                    Ok(stmt::Expr::and_from_vec(
                        keys.iter()
                            .zip(values)
                            .map(|(key, value)| {
                                stmt::Expr::binary_op(
                                    stmt::Expr::column(alias.clone(), key.name.clone()),
                                    op,
                                    stmt::Expr::Value(value.clone()),
                                )
                            })
                            .collect(),
                    ))
                }
                value if keys.len() == 1 && !value.is_null() => Ok(stmt::Expr::binary_op(
                    stmt::Expr::column(alias, keys[0].name.clone()),
                    op,
                    stmt::Expr::Value(value.clone()),
                )),
                _ => Err(Error::query_compilation(format!(
                    "comparing \"{}\" requires {} key value(s) for entity {}",
                    path.field,
                    keys.len(),
                    entity.name
                ))),
            }
        }
    }
}

fn compile_null_check(schema: &Schema, path: &Path) -> Result<stmt::Expr> {
    match classify_path(schema, path)? {
        PathTarget::Column { alias, column } => Ok(stmt::Expr::is_null(stmt::Expr::column(
            alias,
            column.name.clone(),
        ))),
        PathTarget::Relation {
            alias,
            entity,
            attribute: Some(attribute),
        } => {
            let (alias, column) = resolve_attribute(schema, &alias, entity, &attribute)?;
            Ok(stmt::Expr::is_null(stmt::Expr::column(
                alias,
                column.name.clone(),
            )))
        }
        PathTarget::Relation {
            attribute: None, ..
        } => {
            // An absent relationship is visible on the local join columns,
            // no join required.
            let (declaring, relation) =
                relation_on_chain(schema, path.entity, &path.field).expect("classified");

            if relation.columns.is_empty() {
                return Err(Error::query_compilation(format!(
                    "\"{}\" carries no local join columns to null-check",
                    path.field
                )));
            }

            let local_alias = if declaring.id == path.entity {
                path.alias.clone()
            } else {
                format!("{}{}", path.alias, declaring.name)
            };

            Ok(stmt::Expr::and_from_vec(
                relation
                    .columns
                    .iter()
                    .map(|index| {
                        stmt::Expr::is_null(stmt::Expr::column(
                            local_alias.clone(),
                            declaring.columns[*index].name.clone(),
                        ))
                    })
                    .collect(),
            ))
        }
    }
}

/// Reject expression values whose storage class cannot compare against the
/// column's declared type.
fn check_value_type(column: &Column, value: &Value) -> Result<()> {
    if value.is_null() || matches!(value, Value::Record(_)) {
        return Err(Error::query_compilation(format!(
            "column \"{}\" cannot compare against {value:?}",
            column.name
        )));
    }

    if value.storage_class() != column.ty.storage_class() {
        return Err(Error::query_compilation(format!(
            "column \"{}\" ({}) cannot compare against a {} value",
            column.name,
            column.ty,
            value.storage_class()
        )));
    }

    Ok(())
}
