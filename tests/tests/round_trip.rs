use tests::films::films_db;

use loam::stmt::Value;
use loam::{Instance, QueryResult};

use pretty_assertions::assert_eq;

#[tokio::test]
async fn persist_then_query_back_by_primary_key() {
    let (db, executor) = films_db().await;

    let mut film = Instance::new(db.schema(), "ThrillerFilm").unwrap();
    film.set("id", 7).unwrap();
    film.set("title", "Vertigo").unwrap();
    film.set("year", 1958).unwrap();
    film.set("rating", Value::Enum("PG".to_string())).unwrap();
    film.set("tension", 9).unwrap();
    film.set(
        "director",
        Value::Record(vec![
            Value::Text("Alfred".to_string()),
            Value::Text("Hitchcock".to_string()),
        ]),
    )
    .unwrap();

    db.persist(&film).await.unwrap();

    let mutations = executor.mutations.lock().unwrap().clone();
    assert_eq!(mutations.len(), 2);

    // The root table is written first, with the discriminator injected for
    // the subtype on the path.
    let (table, films_row) = &mutations[0];
    assert_eq!(table, "films");
    assert!(films_row.contains(&("genre".to_string(), Value::Text("thriller".to_string()))));
    assert!(films_row.contains(&(
        "director_first_name".to_string(),
        Value::Text("Alfred".to_string())
    )));
    assert!(films_row.contains(&(
        "director_last_name".to_string(),
        Value::Text("Hitchcock".to_string())
    )));

    let (table, thriller_row) = &mutations[1];
    assert_eq!(table, "thriller_film");
    assert!(thriller_row.contains(&("tension".to_string(), Value::I64(9))));
    assert!(thriller_row.contains(&("id".to_string(), Value::I64(7))));

    // Answer the polymorphic lookup with exactly what was persisted.
    let builder = db.query("Film").unwrap();
    let root = builder.root("Film").unwrap();
    let query = builder
        .from(root.clone())
        .filter(root.field("id").eq(7))
        .build(&root)
        .unwrap();

    let lookup = |row: &[(String, Value)], name: &str| {
        row.iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null)
    };

    let mut columns = vec![];
    let mut values = vec![];
    for column in [
        "id",
        "title",
        "year",
        "genre",
        "rating",
        "director_first_name",
        "director_last_name",
    ] {
        columns.push(format!("a0.{column}"));
        values.push(lookup(films_row, column));
    }
    for column in ["tension", "id"] {
        columns.push(format!("a0ThrillerFilm.{column}"));
        values.push(lookup(thriller_row, column));
    }
    for column in ["jump_scares", "id"] {
        columns.push(format!("a0HorrorFilm.{column}"));
        values.push(Value::Null);
    }
    executor.script(QueryResult::new(columns, vec![values]));

    let found = query.one().await.unwrap().unwrap();

    assert_eq!(found.entity_name(), "ThrillerFilm");
    assert_eq!(found.get("id").unwrap(), film.get("id").unwrap());
    assert_eq!(found.get("title").unwrap(), film.get("title").unwrap());
    assert_eq!(found.get("year").unwrap(), film.get("year").unwrap());
    assert_eq!(found.get("rating").unwrap(), film.get("rating").unwrap());
    assert_eq!(found.get("tension").unwrap(), film.get("tension").unwrap());
}

#[tokio::test]
async fn persist_rejects_a_mismatched_discriminator() {
    let (db, _) = films_db().await;

    let mut film = Instance::new(db.schema(), "ThrillerFilm").unwrap();
    film.set("id", 1).unwrap();
    film.set("title", "Psycho").unwrap();
    film.set("genre", "horror").unwrap();

    let err = db.persist(&film).await.unwrap_err();
    assert!(err.is_materialization());
    assert!(err.to_string().contains("wrong discriminator value"));
}
