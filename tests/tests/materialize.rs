use tests::films::films_schema;

use loam::schema::{def, Builder};
use loam::stmt::{Type, Value};
use loam::{Materializer, QueryResult};

use pretty_assertions::assert_eq;

fn film_columns() -> Vec<String> {
    [
        "a0.id",
        "a0.title",
        "a0.year",
        "a0.genre",
        "a0.rating",
        "a0.director_first_name",
        "a0.director_last_name",
        "a0ThrillerFilm.tension",
        "a0ThrillerFilm.id",
        "a0HorrorFilm.jump_scares",
        "a0HorrorFilm.id",
    ]
    .map(String::from)
    .to_vec()
}

fn thriller_row() -> Vec<Value> {
    vec![
        Value::I64(7),
        Value::Text("Vertigo".to_string()),
        Value::I64(1958),
        Value::Text("thriller".to_string()),
        Value::Text("PG".to_string()),
        Value::Text("Alfred".to_string()),
        Value::Text("Hitchcock".to_string()),
        Value::I64(9),
        Value::I64(7),
        Value::Null,
        Value::Null,
    ]
}

#[tokio::test]
async fn discriminator_picks_the_concrete_subtype() {
    let schema = films_schema().await;
    let film = schema.entity_by_name("Film").unwrap().id;

    let result = QueryResult::new(film_columns(), vec![thriller_row()]);
    let row = result.iter().next().unwrap();

    let instance = Materializer::new(&schema).row(film, "a0", row).unwrap();

    assert_eq!(instance.entity_name(), "ThrillerFilm");
    assert_eq!(instance.get("id").unwrap(), Value::I64(7));
    assert_eq!(instance.get("title").unwrap(), Value::Text("Vertigo".to_string()));
    assert_eq!(instance.get("year").unwrap(), Value::I64(1958));
    assert_eq!(instance.get("rating").unwrap(), Value::Enum("PG".to_string()));
    assert_eq!(instance.get("tension").unwrap(), Value::I64(9));

    // Relationship columns are left to the lazy loader.
    assert_eq!(instance.get("director").unwrap(), Value::Null);

    // A thriller has no horror fields.
    let err = instance.get("jumpScares").unwrap_err();
    assert!(err.is_field_access());
}

#[tokio::test]
async fn unknown_discriminator_value_is_fatal() {
    let schema = films_schema().await;
    let film = schema.entity_by_name("Film").unwrap().id;

    let mut row = thriller_row();
    row[3] = Value::Text("comedy".to_string());

    let result = QueryResult::new(film_columns(), vec![row]);
    let err = Materializer::new(&schema)
        .row(film, "a0", result.iter().next().unwrap())
        .unwrap_err();

    assert!(err.is_materialization());
    assert!(err.to_string().contains("no subtype with discriminator value"));
}

#[tokio::test]
async fn storage_class_mismatch_is_fatal() {
    let schema = films_schema().await;
    let film = schema.entity_by_name("Film").unwrap().id;

    let mut row = thriller_row();
    row[1] = Value::I64(5);

    let result = QueryResult::new(film_columns(), vec![row]);
    let err = Materializer::new(&schema)
        .row(film, "a0", result.iter().next().unwrap())
        .unwrap_err();

    assert!(err.is_materialization());
    assert_eq!(
        err.to_string(),
        "materialization failed: column \"title\": incompatible data type: expected text, found INTEGER"
    );
}

#[tokio::test]
async fn enums_decode_by_ordinal_and_by_name() {
    let schema = films_schema().await;
    let film = schema.entity_by_name("Film").unwrap().id;
    let materializer = Materializer::new(&schema);

    // Integer storage decodes by ordinal.
    let mut row = thriller_row();
    row[4] = Value::I64(1);
    let result = QueryResult::new(film_columns(), vec![row]);
    let instance = materializer
        .row(film, "a0", result.iter().next().unwrap())
        .unwrap();
    assert_eq!(instance.get("rating").unwrap(), Value::Enum("PG".to_string()));

    // A name outside the constant set is corrupt data.
    let mut row = thriller_row();
    row[4] = Value::Text("NC-17".to_string());
    let result = QueryResult::new(film_columns(), vec![row]);
    let err = materializer
        .row(film, "a0", result.iter().next().unwrap())
        .unwrap_err();
    assert!(err.is_materialization());
    assert!(err.to_string().contains("not a constant of enum Rating"));
}

#[tokio::test]
async fn timestamps_and_booleans_decode_from_integer_storage() {
    let def = def::Schema {
        name: "gadgets".to_string(),
        version: 1,
        entities: vec![def::Entity::new("Gadget")
            .table_name("gadgets")
            .column("id", def::Column::new(Type::Int).primary_key())
            .column("enabled", def::Column::new(Type::Bool))
            .column("builtAt", def::Column::new(Type::Timestamp))],
    };
    let schema = Builder::new().build(def).await.unwrap();
    let gadget = schema.entity_by_name("Gadget").unwrap().id;

    let result = QueryResult::new(
        ["a0.id", "a0.enabled", "a0.built_at"].map(String::from).to_vec(),
        vec![vec![Value::I64(1), Value::I64(1), Value::I64(1_200_000_000_000)]],
    );

    let instance = Materializer::new(&schema)
        .row(gadget, "a0", result.iter().next().unwrap())
        .unwrap();

    assert_eq!(instance.get("enabled").unwrap(), Value::Bool(true));
    assert_eq!(
        instance.get("builtAt").unwrap(),
        Value::Timestamp(1_200_000_000_000)
    );
}
