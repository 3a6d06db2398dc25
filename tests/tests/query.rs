use tests::films::films_db;

use pretty_assertions::assert_eq;

#[tokio::test]
async fn implicit_join_from_predicate() {
    let (db, _) = films_db().await;

    let builder = db.query("Person").unwrap();
    let root = builder.root("Person").unwrap();
    let filter = root.field("country").attr("name").eq("Italy");

    let query = builder.from(root.clone()).filter(filter).build(&root).unwrap();

    assert_eq!(
        query.sql(),
        "SELECT \"a0\".\"first_name\" AS \"a0.first_name\", \
         \"a0\".\"last_name\" AS \"a0.last_name\", \
         \"a0\".\"birth_date\" AS \"a0.birth_date\", \
         \"a0\".\"country\" AS \"a0.country\" \
         FROM \"people\" AS \"a0\" \
         INNER JOIN \"countries\" AS \"a0country\" ON \"a0\".\"country\" = \"a0country\".\"name\" \
         WHERE \"a0country\".\"name\" = 'Italy'"
    );
}

#[tokio::test]
async fn no_duplicate_join_for_repeated_references() {
    let (db, _) = films_db().await;

    let builder = db.query("Person").unwrap();
    let root = builder.root("Person").unwrap();
    let filter = root
        .field("country")
        .attr("name")
        .eq("Italy")
        .or(root.field("country").attr("name").eq("France"));

    let query = builder.from(root.clone()).filter(filter).build(&root).unwrap();

    assert_eq!(query.sql().matches("INNER JOIN \"countries\"").count(), 1);
    assert_eq!(
        query.sql().matches("WHERE (\"a0country\".\"name\" = 'Italy' OR \"a0country\".\"name\" = 'France')").count(),
        1
    );
}

#[tokio::test]
async fn explicit_join_keeps_its_alias() {
    let (db, _) = films_db().await;

    let builder = db.query("Person").unwrap();
    let root = builder.root("Person").unwrap();
    let country = builder.root("Country").unwrap();
    let joined = root.join(country, "country");

    let query = builder.from(joined.clone()).build(&joined).unwrap();

    assert!(query
        .sql()
        .contains("INNER JOIN \"countries\" AS \"a1\" ON \"a0\".\"country\" = \"a1\".\"name\""));
}

#[tokio::test]
async fn polymorphic_projection_covers_the_hierarchy() {
    let (db, _) = films_db().await;

    let builder = db.query("Film").unwrap();
    let root = builder.root("Film").unwrap();
    let query = builder.from(root.clone()).build(&root).unwrap();

    assert_eq!(
        query.sql(),
        "SELECT \"a0\".\"id\" AS \"a0.id\", \
         \"a0\".\"title\" AS \"a0.title\", \
         \"a0\".\"year\" AS \"a0.year\", \
         \"a0\".\"genre\" AS \"a0.genre\", \
         \"a0\".\"rating\" AS \"a0.rating\", \
         \"a0\".\"director_first_name\" AS \"a0.director_first_name\", \
         \"a0\".\"director_last_name\" AS \"a0.director_last_name\", \
         \"a0ThrillerFilm\".\"tension\" AS \"a0ThrillerFilm.tension\", \
         \"a0ThrillerFilm\".\"id\" AS \"a0ThrillerFilm.id\", \
         \"a0HorrorFilm\".\"jump_scares\" AS \"a0HorrorFilm.jump_scares\", \
         \"a0HorrorFilm\".\"id\" AS \"a0HorrorFilm.id\" \
         FROM \"films\" AS \"a0\" \
         LEFT JOIN \"thriller_film\" AS \"a0ThrillerFilm\" ON \"a0\".\"id\" = \"a0ThrillerFilm\".\"id\" \
         LEFT JOIN \"horror_film\" AS \"a0HorrorFilm\" ON \"a0\".\"id\" = \"a0HorrorFilm\".\"id\""
    );
}

#[tokio::test]
async fn querying_a_subtype_projects_its_ancestors() {
    let (db, _) = films_db().await;

    let builder = db.query("ThrillerFilm").unwrap();
    let root = builder.root("ThrillerFilm").unwrap();
    let query = builder.from(root.clone()).build(&root).unwrap();

    // Own columns under the bare alias, the parent under alias + name.
    assert!(query.sql().contains("\"a0\".\"tension\" AS \"a0.tension\""));
    assert!(query.sql().contains("\"a0Film\".\"title\" AS \"a0Film.title\""));
    assert!(query
        .sql()
        .contains("INNER JOIN \"films\" AS \"a0Film\" ON \"a0\".\"id\" = \"a0Film\".\"id\""));
}

#[tokio::test]
async fn build_requires_a_from_root() {
    let (db, _) = films_db().await;

    let builder = db.query("Person").unwrap();
    let root = builder.root("Person").unwrap();

    let err = builder.build(&root).unwrap_err();
    assert!(err.is_query_compilation());
    assert_eq!(
        err.to_string(),
        "query compilation failed: \"FROM\" clause not set"
    );
}

#[tokio::test]
async fn build_rejects_a_target_outside_the_from_tree() {
    let (db, _) = films_db().await;

    let builder = db.query("Person").unwrap();
    let root = builder.root("Person").unwrap();
    let stray = builder.root("Person").unwrap();

    let err = builder.from(root).build(&stray).unwrap_err();
    assert!(err.is_query_compilation());
    assert_eq!(
        err.to_string(),
        "query compilation failed: the target root does not belong to the \"FROM\" structure"
    );
}

#[tokio::test]
async fn build_rejects_unknown_fields() {
    let (db, _) = films_db().await;

    let builder = db.query("Person").unwrap();
    let root = builder.root("Person").unwrap();
    let filter = root.field("shoeSize").eq(43);

    let err = builder.from(root.clone()).filter(filter).build(&root).unwrap_err();
    assert!(err.is_query_compilation());
    assert_eq!(
        err.to_string(),
        "query compilation failed: unknown field \"shoeSize\" on entity Person"
    );
}

#[tokio::test]
async fn build_rejects_incompatible_expression_values() {
    let (db, _) = films_db().await;

    let builder = db.query("Film").unwrap();
    let root = builder.root("Film").unwrap();
    let filter = root.field("title").eq(42);

    let err = builder.from(root.clone()).filter(filter).build(&root).unwrap_err();
    assert!(err.is_query_compilation());
}

#[tokio::test]
async fn unmapped_entity_is_a_hard_error() {
    let (db, _) = films_db().await;

    let err = db.query("Robot").unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: entity \"Robot\" is not mapped"
    );
}
