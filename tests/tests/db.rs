use tests::films::{films, films_db};
use tests::RecordingExecutor;

use loam::schema::Builder;
use loam::stmt::{StorageClass, Value};
use loam::{async_trait, Database, Executor, MigrationPolicy, QueryResult, Result};

use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn t(text: &str) -> Value {
    Value::Text(text.to_string())
}

fn i(value: i64) -> Value {
    Value::I64(value)
}

#[tokio::test]
async fn init_creates_tables_and_stamps_version() {
    let (db, executor) = films_db().await;

    db.init(None).await.unwrap();

    let ddl = executor.ddl.lock().unwrap().clone();
    assert_eq!(ddl.len(), 6);

    assert_eq!(
        ddl[0],
        "CREATE TABLE IF NOT EXISTS \"countries\" (\
         \"name\" TEXT NOT NULL, \
         PRIMARY KEY (\"name\"));"
    );
    assert_eq!(
        ddl[1],
        "CREATE TABLE IF NOT EXISTS \"people\" (\
         \"first_name\" TEXT NOT NULL, \
         \"last_name\" TEXT NOT NULL, \
         \"birth_date\" INTEGER, \
         \"country\" TEXT, \
         PRIMARY KEY (\"first_name\", \"last_name\"), \
         FOREIGN KEY (\"country\") REFERENCES \"countries\" (\"name\") \
         ON UPDATE CASCADE ON DELETE SET NULL DEFERRABLE INITIALLY DEFERRED);"
    );
    assert_eq!(
        ddl[2],
        "CREATE TABLE IF NOT EXISTS \"films\" (\
         \"id\" INTEGER NOT NULL, \
         \"title\" TEXT NOT NULL, \
         \"year\" INTEGER, \
         \"genre\" TEXT NOT NULL, \
         \"rating\" TEXT, \
         \"director_first_name\" TEXT NOT NULL, \
         \"director_last_name\" TEXT NOT NULL, \
         PRIMARY KEY (\"id\"), \
         UNIQUE (\"title\", \"year\"), \
         FOREIGN KEY (\"director_first_name\", \"director_last_name\") \
         REFERENCES \"people\" (\"first_name\", \"last_name\") \
         ON UPDATE CASCADE ON DELETE RESTRICT DEFERRABLE INITIALLY DEFERRED);"
    );
    assert_eq!(
        ddl[3],
        "CREATE TABLE IF NOT EXISTS \"thriller_film\" (\
         \"tension\" INTEGER, \
         \"id\" INTEGER NOT NULL, \
         PRIMARY KEY (\"id\"), \
         FOREIGN KEY (\"id\") REFERENCES \"films\" (\"id\") \
         ON UPDATE CASCADE ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED);"
    );

    assert_eq!(ddl.last().unwrap(), "PRAGMA user_version = 1");
}

#[tokio::test]
async fn schema_generation_is_deterministic() {
    let (first_db, first_executor) = films_db().await;
    let (second_db, second_executor) = films_db().await;

    first_db.init(None).await.unwrap();
    second_db.init(None).await.unwrap();

    assert_eq!(
        first_executor.ddl.lock().unwrap().clone(),
        second_executor.ddl.lock().unwrap().clone()
    );
}

#[derive(Debug, Default)]
struct RecordingPolicy {
    calls: Mutex<Vec<(i64, i64)>>,
}

#[async_trait]
impl MigrationPolicy for RecordingPolicy {
    async fn migrate(&self, _executor: &dyn Executor, from: i64, to: i64) -> Result<()> {
        self.calls.lock().unwrap().push((from, to));
        Ok(())
    }
}

#[tokio::test]
async fn outdated_version_triggers_migration() {
    let mut def = films();
    def.version = 2;

    let schema = Arc::new(Builder::new().build(def).await.unwrap());
    let executor = Arc::new(RecordingExecutor::new());
    executor.script(QueryResult::new(
        vec!["user_version".to_string()],
        vec![vec![i(1)]],
    ));

    let db = Database::new(schema, executor.clone());
    let policy = RecordingPolicy::default();
    db.init(Some(&policy)).await.unwrap();

    assert_eq!(policy.calls.lock().unwrap().clone(), vec![(1, 2)]);
    assert_eq!(
        executor.ddl.lock().unwrap().last().unwrap(),
        "PRAGMA user_version = 2"
    );
}

#[tokio::test]
async fn outdated_version_without_policy_is_an_error() {
    let mut def = films();
    def.version = 2;

    let schema = Arc::new(Builder::new().build(def).await.unwrap());
    let executor = Arc::new(RecordingExecutor::new());
    executor.script(QueryResult::new(
        vec!["user_version".to_string()],
        vec![vec![i(1)]],
    ));

    let db = Database::new(schema, executor);
    let err = db.init(None).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn newer_persisted_version_is_rejected() {
    let (db, executor) = films_db().await;
    executor.script(QueryResult::new(
        vec!["user_version".to_string()],
        vec![vec![i(9)]],
    ));

    let err = db.init(None).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "invalid configuration: persisted schema version 9 is newer than the declared 1"
    );
}

#[tokio::test]
async fn dump_parses_metadata_pragmas() {
    let (db, executor) = films_db().await;

    // Table list.
    executor.script(QueryResult::new(
        vec!["name".to_string()],
        vec![vec![t("people")]],
    ));
    // index_list(people): one single-column unique index.
    executor.script(QueryResult::new(
        ["seq", "name", "unique"].map(String::from).to_vec(),
        vec![vec![i(0), t("idx_people_code"), i(1)]],
    ));
    // index_info(idx_people_code)
    executor.script(QueryResult::new(
        ["seqno", "cid", "name"].map(String::from).to_vec(),
        vec![vec![i(0), i(3), t("code")]],
    ));
    // table_info(people)
    executor.script(QueryResult::new(
        ["cid", "name", "type", "notnull", "dflt_value", "pk"]
            .map(String::from)
            .to_vec(),
        vec![
            vec![i(0), t("first_name"), t("TEXT"), i(1), Value::Null, i(1)],
            vec![i(1), t("last_name"), t("TEXT"), i(1), Value::Null, i(2)],
            vec![i(2), t("birth_date"), t("INTEGER"), i(0), Value::Null, i(0)],
            vec![i(3), t("code"), t("TEXT"), i(0), t("'xx'"), i(0)],
            vec![i(4), t("country"), t("TEXT"), i(0), Value::Null, i(0)],
        ],
    ));
    // foreign_key_list(people)
    executor.script(QueryResult::new(
        ["id", "seq", "table", "from", "to", "on_update", "on_delete"]
            .map(String::from)
            .to_vec(),
        vec![vec![
            i(0),
            i(0),
            t("countries"),
            t("country"),
            t("name"),
            t("CASCADE"),
            t("SET NULL"),
        ]],
    ));

    let dump = db.dump().await.unwrap();
    let people = dump.table("people").unwrap();

    assert_eq!(
        people.primary_keys,
        vec!["first_name".to_string(), "last_name".to_string()]
    );

    let code = people.column("code").unwrap();
    assert!(code.unique);
    assert!(code.nullable);
    assert_eq!(code.storage, StorageClass::Text);
    assert_eq!(code.default_value.as_deref(), Some("'xx'"));

    let birth_date = people.column("birth_date").unwrap();
    assert_eq!(birth_date.storage, StorageClass::Integer);
    assert!(!birth_date.primary_key);
    assert!(!birth_date.unique);

    assert_eq!(people.foreign_keys.len(), 1);
    let fk = &people.foreign_keys[0];
    assert_eq!(fk.source_table, "people");
    assert_eq!(fk.source_columns, vec!["country".to_string()]);
    assert_eq!(fk.target_table, "countries");
    assert_eq!(fk.target_columns, vec!["name".to_string()]);
    assert_eq!(fk.on_update, "CASCADE");
    assert_eq!(fk.on_delete, "SET NULL");

    let queries = executor.queries.lock().unwrap().clone();
    assert!(queries.contains(&"PRAGMA table_info(\"people\")".to_string()));
    assert!(queries.contains(&"PRAGMA foreign_key_list(\"people\")".to_string()));
}
