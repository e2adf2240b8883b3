use doxa_core::db::migrations::{latest_version, table_has_column};
use doxa_core::db::{open_db, open_db_in_memory, reset_database, DbError, Store};
use doxa_core::{
    DocumentRepository, MetaScope, MetadataRepository, NewDocument, RepoError,
    SqliteDocumentRepository, SqliteMetadataRepository,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["docs", "users", "metadata", "validate"] {
        assert_table_exists(&conn, table);
    }
    assert!(table_has_column(&conn, "docs", "cache").unwrap());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doxa.db");

    let conn_first = open_db(&path).unwrap();
    SqliteDocumentRepository::new(&conn_first)
        .create_document(&NewDocument::new(1, "d1", "c1", "new", "u", "f.xml", "<a/>"))
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let content = SqliteDocumentRepository::new(&conn_second)
        .get_doc_content(1)
        .unwrap();
    assert_eq!(content, "<a/>");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn legacy_database_without_cache_column_is_upgraded_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let legacy = Connection::open(&path).unwrap();
    legacy
        .execute_batch(
            "CREATE TABLE docs (id INTEGER PRIMARY KEY AUTOINCREMENT, name text, corpus text,
                status text, assignee_username text, filename text, content text, mode text,
                schema text, validation text, timestamp text);
             INSERT INTO docs (id, name, corpus, status, assignee_username, filename, content,
                mode, schema, validation)
             VALUES (7, 'old', 'c', 'done', 'u', 'old.xml', '<x/>', 'xml', '--none--', 'ok');",
        )
        .unwrap();
    drop(legacy);

    let conn = open_db(&path).unwrap();
    assert!(table_has_column(&conn, "docs", "cache").unwrap());

    let repo = SqliteDocumentRepository::new(&conn);
    let doc = repo.get_document(7).unwrap().unwrap();
    assert_eq!(doc.name, "old");
    assert_eq!(doc.validation.as_deref(), Some("ok"));
    assert_eq!(doc.cache, None);

    repo.set_cache(7, Some("<rendered/>")).unwrap();
    assert_eq!(repo.get_cache(7).unwrap().as_deref(), Some("<rendered/>"));
}

#[test]
fn database_that_already_has_cache_column_opens_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_cache.db");

    let legacy = Connection::open(&path).unwrap();
    legacy
        .execute_batch(
            "CREATE TABLE docs (id INTEGER PRIMARY KEY AUTOINCREMENT, name text, corpus text,
                status text, assignee_username text, filename text, content text, mode text,
                schema text, validation text, timestamp text, cache text);",
        )
        .unwrap();
    drop(legacy);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
}

#[test]
fn legacy_duplicate_corpus_metadata_collapses_to_newest_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_meta.db");

    let legacy = Connection::open(&path).unwrap();
    legacy
        .execute_batch(
            "CREATE TABLE metadata (docid INTEGER, metaid INTEGER PRIMARY KEY AUTOINCREMENT,
                key text, value text, corpus_meta text,
                UNIQUE (docid, metaid) ON CONFLICT REPLACE,
                UNIQUE (docid, key) ON CONFLICT REPLACE);
             INSERT INTO metadata (docid, key, value, corpus_meta) VALUES (NULL, 'lang', 'en', 'c1');
             INSERT INTO metadata (docid, key, value, corpus_meta) VALUES (NULL, 'lang', 'cop', 'c1');
             INSERT INTO metadata (docid, key, value, corpus_meta) VALUES (NULL, 'lang', 'en', 'c2');",
        )
        .unwrap();
    drop(legacy);

    let conn = open_db(&path).unwrap();
    SqliteDocumentRepository::new(&conn)
        .create_document(&NewDocument::new(1, "d1", "c1", "new", "u", "f.xml", ""))
        .unwrap();

    let entries = SqliteMetadataRepository::new(&conn)
        .get_doc_meta(1, MetaScope::Corpus)
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value, "cop");

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM metadata", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 2);
}

#[test]
fn legacy_rule_domains_are_normalized_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_rules.db");

    let legacy = open_db(&path).unwrap();
    legacy
        .execute_batch(
            "INSERT INTO validate (doc, corpus, domain, name, operator, argument)
             VALUES ('%', '%', 'XML', 'a', 'o', ''),
                    ('%', '%', ' Meta ', 'b', 'o', ''),
                    ('%', '%', 'schema', 'c', 'o', '');
             PRAGMA user_version = 3;",
        )
        .unwrap();
    drop(legacy);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let mut stmt = conn
        .prepare("SELECT domain FROM validate ORDER BY id")
        .unwrap();
    let domains: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(domains, vec!["xml", "meta", "schema"]);
}

#[test]
fn reset_database_discards_all_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::new(&conn);
    repo.create_document(&NewDocument::new(1, "d1", "c1", "new", "u", "f.xml", "<a/>"))
        .unwrap();
    drop(repo);

    reset_database(&mut conn).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    let repo = SqliteDocumentRepository::new(&conn);
    assert!(repo.get_doc_info(1).unwrap().is_none());
    assert!(table_has_column(&conn, "docs", "cache").unwrap());
}

#[test]
fn store_releases_connection_per_call_and_sees_committed_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("store.db")).unwrap();

    store
        .with_connection(|conn| {
            SqliteDocumentRepository::new(conn).create_document(&NewDocument::new(
                3, "d3", "c1", "new", "u", "f.xml", "<c/>",
            ))
        })
        .unwrap();

    let content = store
        .with_connection(|conn| SqliteDocumentRepository::new(conn).get_doc_content(3))
        .unwrap();
    assert_eq!(content, "<c/>");

    let err = store
        .with_connection(|conn| SqliteDocumentRepository::new(conn).get_doc_content(4))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(4)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
