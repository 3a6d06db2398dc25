use tests::films::films_schema;
use tests::init_logging;

use loam::schema::{def, Action, Builder, ColumnKind, Propagation};
use loam::stmt::{Type, Value};

use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn derives_table_and_column_names() {
    init_logging();
    let schema = films_schema().await;

    // ThrillerFilm declares no table name.
    let thriller = schema.entity_by_name("ThrillerFilm").unwrap();
    assert_eq!(thriller.table, "thriller_film");

    // firstName declares no column name.
    let person = schema.entity_by_name("Person").unwrap();
    let column = person.column("first_name").unwrap();
    assert_eq!(column.field, "firstName");
}

#[tokio::test]
async fn inheritance_closure() {
    let schema = films_schema().await;
    let film = schema.entity_by_name("Film").unwrap();

    assert_eq!(film.children.len(), 2);

    let discriminator = film.discriminator().unwrap();
    assert_eq!(discriminator.name, "genre");
    assert!(!discriminator.nullable);

    let mut seen = vec![];
    for child in &film.children {
        let child = schema.entity(*child);

        assert_eq!(child.parent, Some(film.id));
        assert!(child.discriminator().is_none());

        let value = child.discriminator_value.clone().unwrap();
        assert!(!seen.contains(&value), "duplicate discriminator value");
        seen.push(value);

        // The parent's primary key is inherited into the child table.
        let id = child.column("id").unwrap();
        assert!(id.primary_key);
        assert_eq!(id.origin, film.id);
        assert_eq!(id.ty, Type::Int);
    }

    assert!(seen.contains(&Value::Text("thriller".to_string())));
    assert!(seen.contains(&Value::Text("horror".to_string())));
}

#[tokio::test]
async fn join_column_type_follows_referenced_column() {
    let schema = films_schema().await;

    // people.country takes its type from countries.name.
    let person = schema.entity_by_name("Person").unwrap();
    let country = person.column("country").unwrap();
    assert_eq!(country.ty, Type::Text);
    assert!(country.nullable);

    match &country.kind {
        ColumnKind::Join {
            referenced,
            propagation,
            target,
        } => {
            assert_eq!(referenced, "name");
            assert_eq!(*target, schema.entity_by_name("Country").unwrap().id);
            // Optional relationship: clear the link when the target goes.
            assert_eq!(
                *propagation,
                Propagation::new(Action::Cascade, Action::SetNull)
            );
        }
        other => panic!("expected a join column, found {other:?}"),
    }

    // films.director_* is a required composite group.
    let film = schema.entity_by_name("Film").unwrap();
    let first = film.column("director_first_name").unwrap();
    assert_eq!(first.ty, Type::Text);
    assert!(!first.nullable);

    match &first.kind {
        ColumnKind::Join { propagation, .. } => {
            assert_eq!(
                *propagation,
                Propagation::new(Action::Cascade, Action::Restrict)
            );
        }
        other => panic!("expected a join column, found {other:?}"),
    }

    let fk = film
        .foreign_keys
        .iter()
        .find(|fk| fk.columns.contains(&"director_first_name".to_string()))
        .unwrap();
    assert_eq!(fk.columns, ["director_first_name", "director_last_name"]);
    assert_eq!(fk.target_columns, ["first_name", "last_name"]);
}

#[tokio::test]
async fn rejects_duplicate_column_names() {
    let def = def::Schema {
        name: "bad".to_string(),
        version: 1,
        entities: vec![def::Entity::new("Thing")
            .table_name("things")
            .column("value", def::Column::new(Type::Int).named("value").primary_key())
            .column("other", def::Column::new(Type::Int).named("value"))],
    };

    let err = Builder::new().build(def).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: column \"value\" already defined"
    );
}

#[tokio::test]
async fn rejects_unknown_unique_constraint_column() {
    let def = def::Schema {
        name: "bad".to_string(),
        version: 1,
        entities: vec![def::Entity::new("Thing")
            .table_name("things")
            .unique_constraint(&["missing"])
            .column("id", def::Column::new(Type::Int).primary_key())],
    };

    let err = Builder::new().build(def).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: unique constraint: column \"missing\" not found"
    );
}

#[tokio::test]
async fn rejects_missing_table_declaration() {
    let def = def::Schema {
        name: "bad".to_string(),
        version: 1,
        entities: vec![
            def::Entity::new("Thing").column("id", def::Column::new(Type::Int).primary_key())
        ],
    };

    let err = Builder::new().build(def).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: class Thing has no table declaration"
    );
}

#[tokio::test]
async fn rejects_parent_without_discriminator_column() {
    let def = def::Schema {
        name: "bad".to_string(),
        version: 1,
        entities: vec![
            def::Entity::new("Parent")
                .table_name("parents")
                .column("id", def::Column::new(Type::Int).primary_key()),
            def::Entity::new("Child")
                .extends("Parent")
                .with_table()
                .discriminator_value("c"),
        ],
    };

    let err = Builder::new().build(def).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: class Parent has children but no discriminator column"
    );
}

#[tokio::test]
async fn rejects_child_without_discriminator_value() {
    let def = def::Schema {
        name: "bad".to_string(),
        version: 1,
        entities: vec![
            def::Entity::new("Parent")
                .table_name("parents")
                .discriminator_column("kind")
                .column("id", def::Column::new(Type::Int).primary_key())
                .column("kind", def::Column::new(Type::Text)),
            def::Entity::new("Child").extends("Parent").with_table(),
        ],
    };

    let err = Builder::new().build(def).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: class Child has no discriminator value"
    );
}

#[tokio::test]
async fn rejects_duplicate_discriminator_values() {
    let def = def::Schema {
        name: "bad".to_string(),
        version: 1,
        entities: vec![
            def::Entity::new("Parent")
                .table_name("parents")
                .discriminator_column("kind")
                .column("id", def::Column::new(Type::Int).primary_key())
                .column("kind", def::Column::new(Type::Text)),
            def::Entity::new("Left")
                .extends("Parent")
                .with_table()
                .discriminator_value("same"),
            def::Entity::new("Right")
                .extends("Parent")
                .with_table()
                .discriminator_value("same"),
        ],
    };

    let err = Builder::new().build(def).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: duplicate discriminator value \"same\" among children of Parent"
    );
}

#[tokio::test]
async fn rejects_unresolvable_foreign_key_target() {
    let def = def::Schema {
        name: "bad".to_string(),
        version: 1,
        entities: vec![
            def::Entity::new("Target")
                .table_name("targets")
                .column("id", def::Column::new(Type::Int).primary_key()),
            def::Entity::new("Source")
                .table_name("sources")
                .column("id", def::Column::new(Type::Int).primary_key())
                .relation(
                    "target",
                    def::Relation::many_to_one("Target")
                        .join(def::JoinColumn::new("nope").named("target_id")),
                ),
        ],
    };

    let err = Builder::new().build(def).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: field \"target\": referenced column \"nope\" not found"
    );
}

#[tokio::test]
async fn rejects_incompatible_default_value() {
    let def = def::Schema {
        name: "bad".to_string(),
        version: 1,
        entities: vec![def::Entity::new("Thing")
            .table_name("things")
            .column("id", def::Column::new(Type::Int).primary_key())
            .column("count", def::Column::new(Type::Int).default_value("many"))],
    };

    let err = Builder::new().build(def).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn cyclic_type_dependency_stalls_instead_of_hanging() {
    // Each join column takes its type from the other: no task can ever
    // publish, so resolution must surface a stall, not hang.
    let def = def::Schema {
        name: "cyclic".to_string(),
        version: 1,
        entities: vec![
            def::Entity::new("A")
                .table_name("a")
                .column("id", def::Column::new(Type::Int).primary_key())
                .relation(
                    "b",
                    def::Relation::many_to_one("B")
                        .join(def::JoinColumn::new("a_ref").named("b_ref")),
                ),
            def::Entity::new("B")
                .table_name("b")
                .column("id", def::Column::new(Type::Int).primary_key())
                .relation(
                    "a",
                    def::Relation::many_to_one("A")
                        .join(def::JoinColumn::new("b_ref").named("a_ref")),
                ),
        ],
    };

    let err = Builder::new()
        .deadline(Duration::from_millis(50))
        .build(def)
        .await
        .unwrap_err();
    assert!(err.is_stalled(), "expected a stall, got: {err}");
}
