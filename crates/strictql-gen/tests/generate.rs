//! End-to-end generation runs against an in-memory catalog: publishing,
//! manifest checks, failure isolation and `check`.

mod common;
use common::*;

use std::collections::BTreeMap;
use std::fs;
use std::time::{Duration, Instant};

use strictql_core::{QueryMode, ResolveError};
use strictql_gen::{GenerateError, Generator, Manifest, MANIFEST_FILE};
use tempfile::TempDir;

const USERS_SQL: &str = "select id, name from users where id = $1";
const RENAME_SQL: &str = "update users set name = $1 where id = $2";
const INSERT_SQL: &str = "insert into users (id, name) values ($1, $2)";

fn catalog() -> FakeCatalog {
    FakeCatalog::new()
        .statement(USERS_SQL, &["int4"], &[("id", "int4"), ("name", "text")])
        .statement(RENAME_SQL, &["text", "int4"], &[])
        .statement(INSERT_SQL, &["int4", "text"], &[])
        .table("users", &[("id", true, "int4"), ("name", false, "text")])
}

fn queries() -> Vec<strictql_gen::QueryToGenerate> {
    vec![
        query("fetch_user", USERS_SQL, "users/fetch_user.py", QueryMode::FetchRow, &["user_id"]),
        query("rename_user", RENAME_SQL, "users/write/rename_user.py", QueryMode::Execute, &["name", "user_id"]),
        query("create_user", INSERT_SQL, "create_user.py", QueryMode::Execute, &["user_id", "name"]),
    ]
}

#[tokio::test]
async fn generate_writes_modules_and_manifest() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");

    let manifest = generator(catalog()).generate(&queries(), &out).await.unwrap();

    let files = tree(&out);
    let names: Vec<_> = files.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "create_user.py",
            MANIFEST_FILE,
            "users/fetch_user.py",
            "users/write/rename_user.py",
        ]
    );

    let keys: Vec<_> = manifest.files_checksums.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["create_user.py", "users/fetch_user.py", "users/write/rename_user.py"]
    );
    assert_eq!(Manifest::load(&out).unwrap(), Some(manifest));

    let fetch = &files["users/fetch_user.py"];
    assert!(fetch.contains("class FetchUserModel(BaseModel):"));
    assert!(fetch.contains(
        "async def fetch_user(connection: Connection, user_id: int | None) -> FetchUserModel | None:"
    ));

    let create = &files["create_user.py"];
    assert!(create.contains(
        "async def create_user(connection: Connection, user_id: int, name: str | None) -> str:"
    ));

    assert_eq!(entries(dir.path()), vec!["generated"]);
}

#[tokio::test]
async fn rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    let generator = generator(catalog());

    let first = generator.generate(&queries(), &out).await.unwrap();
    let first_tree = tree(&out);
    let second = generator.generate(&queries(), &out).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first_tree, tree(&out));
}

#[tokio::test]
async fn existing_directory_without_manifest_is_untouched() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    fs::create_dir_all(out.join("pkg")).unwrap();
    fs::write(out.join("pkg/handwritten.py"), "x = 1\n").unwrap();
    let before = tree(&out);

    let err = generator(catalog())
        .generate(&queries(), &out)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::MissingManifest(_)), "{err}");
    assert_eq!(tree(&out), before);
}

#[tokio::test]
async fn existing_empty_directory_without_manifest_is_rejected() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    fs::create_dir(&out).unwrap();

    let err = generator(catalog())
        .generate(&queries(), &out)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::MissingManifest(_)), "{err}");
    assert!(entries(&out).is_empty());
    assert_eq!(entries(dir.path()), vec!["generated"]);
}

#[tokio::test]
async fn bytecode_cache_does_not_count_as_drift() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    let generator = generator(catalog());
    let first = generator.generate(&queries(), &out).await.unwrap();

    fs::create_dir_all(out.join("__pycache__")).unwrap();
    fs::write(out.join("__pycache__/create_user.cpython-312.pyc"), [0x42, 0x0d, 0x0d, 0x0a]).unwrap();
    fs::create_dir_all(out.join("users/__pycache__")).unwrap();
    fs::write(out.join("users/__pycache__/fetch_user.cpython-312.pyc"), [0x42]).unwrap();

    assert!(generator.check(&queries(), &out).await.unwrap().is_empty());
    let second = generator.generate(&queries(), &out).await.unwrap();
    assert_eq!(first, second);
    assert!(!out.join("__pycache__").exists());
}

#[tokio::test]
async fn edited_output_is_reported_as_drift() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    let generator = generator(catalog());
    generator.generate(&queries(), &out).await.unwrap();

    fs::write(out.join("create_user.py"), "# edited by hand\n").unwrap();
    fs::write(out.join("scratch.py"), "print(1)\n").unwrap();
    let before = tree(&out);

    let err = generator.generate(&queries(), &out).await.unwrap_err();
    match err {
        GenerateError::ManifestDrift { changed, .. } => {
            assert_eq!(changed, vec!["create_user.py", "scratch.py"]);
        }
        other => panic!("Expected drift, got {other}"),
    }
    assert_eq!(tree(&out), before);
}

#[tokio::test]
async fn one_failing_query_publishes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    let generator = generator(catalog());
    generator.generate(&queries()[..1], &out).await.unwrap();
    let before = tree(&out);

    let mut with_bad = queries();
    with_bad.push(query(
        "broken",
        "selec nonsense",
        "broken.py",
        QueryMode::FetchAll,
        &[],
    ));

    let err = generator.generate(&with_bad, &out).await.unwrap_err();
    match &err {
        GenerateError::Syntax { function, sql, .. } => {
            assert_eq!(function, "broken");
            assert_eq!(sql, "selec nonsense");
        }
        other => panic!("Expected syntax error, got {other}"),
    }
    assert_eq!(tree(&out), before);
    assert_eq!(entries(dir.path()), vec!["generated"]);
}

#[tokio::test]
async fn failure_without_previous_output_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    let slow = catalog().with_delay(Duration::from_millis(50));
    let generator = Generator::new(
        BTreeMap::from([("main".to_string(), slow)]),
        strictql_gen::Passthrough,
        true,
    );

    let mut with_bad = queries();
    with_bad.insert(0, query("mismatch", USERS_SQL, "mismatch.py", QueryMode::FetchAll, &[]));

    let err = generator.generate(&with_bad, &out).await.unwrap_err();
    assert!(
        matches!(
            err,
            GenerateError::Resolve {
                source: ResolveError::ParameterCountMismatch {
                    expected: 1,
                    actual: 0
                },
                ..
            }
        ),
        "{err}"
    );
    assert!(!out.exists());
    assert!(entries(dir.path()).is_empty());
}

#[tokio::test]
async fn first_failure_cancels_slow_siblings() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    let slow = catalog().with_delay(Duration::from_secs(5));
    let generator = Generator::new(
        BTreeMap::from([
            ("main".to_string(), catalog()),
            ("replica".to_string(), slow.clone()),
        ]),
        strictql_gen::Passthrough,
        true,
    );

    let mut sibling = query("fetch_user", USERS_SQL, "fetch_user.py", QueryMode::FetchRow, &["id"]);
    sibling.database = "replica".into();
    let broken = query("broken", "selec nonsense", "broken.py", QueryMode::Execute, &[]);

    let started = Instant::now();
    let err = generator.generate(&[sibling, broken], &out).await.unwrap_err();

    assert!(matches!(err, GenerateError::Syntax { .. }), "{err}");
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    assert!(!slow.answered());
    assert!(!out.exists());
}

#[tokio::test]
async fn quality_failure_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    let generator = Generator::new(BTreeMap::from([("main".to_string(), catalog())]), RejectAll, true);

    let err = generator.generate(&queries(), &out).await.unwrap_err();
    assert!(matches!(err, GenerateError::Quality { .. }), "{err}");
    assert!(err.to_string().contains("E501 line too long"));
    assert!(!out.exists());
}

#[tokio::test]
async fn results_land_in_their_own_files() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");

    let mut catalog = FakeCatalog::new().with_delay(Duration::from_millis(5));
    let mut many = Vec::new();
    for index in 0..20 {
        let sql = format!("select {index}::int4 as value_{index}");
        let column = format!("value_{index}");
        catalog = catalog.statement(&sql, &[], &[(column.as_str(), "int4")]);
        many.push(query(
            &format!("query_{index}"),
            &sql,
            &format!("q{index}.py"),
            QueryMode::FetchAll,
            &[],
        ));
    }

    generator(catalog).generate(&many, &out).await.unwrap();
    let files = tree(&out);
    for index in 0..20 {
        let module = &files[&format!("q{index}.py")];
        assert!(module.contains(&format!("async def query_{index}(")));
        assert!(module.contains(&format!("    value_{index}: int | None\n")));
    }
}

#[tokio::test]
async fn insert_into_missing_table() {
    let catalog = FakeCatalog::new().statement("insert into ghosts (id) values ($1)", &["int4"], &[]);
    let q = query(
        "add_ghost",
        "insert into ghosts (id) values ($1)",
        "add_ghost.py",
        QueryMode::Execute,
        &["id"],
    );
    let err = generator(catalog).render(&q).await.unwrap_err();
    assert!(
        matches!(
            err,
            GenerateError::Resolve {
                source: ResolveError::MissingRelation { ref relation },
                ..
            } if relation == "ghosts"
        ),
        "{err}"
    );
}

#[tokio::test]
async fn unknown_result_type_names_column() {
    let catalog = FakeCatalog::new().statement("select 'kek' as kek", &[], &[("kek", "unknown")]);
    let q = query("get_kek", "select 'kek' as kek", "kek.py", QueryMode::FetchRow, &[]);
    let err = generator(catalog).render(&q).await.unwrap_err();
    assert!(
        err.to_string()
            .contains("Unsupported type 'unknown' of result column 'kek'"),
        "{err}"
    );
}

#[tokio::test]
async fn unknown_database() {
    let mut q = query("fetch_user", USERS_SQL, "a.py", QueryMode::FetchRow, &["id"]);
    q.database = "elsewhere".into();
    let err = generator(catalog()).render(&q).await.unwrap_err();
    assert!(matches!(err, GenerateError::Config(_)), "{err}");
}

#[tokio::test]
async fn check_reports_differences_without_writing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("generated");
    let generator = generator(catalog());

    let diff = generator.check(&queries(), &out).await.unwrap();
    assert_eq!(diff.missing.len(), 3);
    assert!(!out.exists());

    generator.generate(&queries(), &out).await.unwrap();
    assert!(generator.check(&queries(), &out).await.unwrap().is_empty());

    let fewer = &queries()[..2];
    let diff = generator.check(fewer, &out).await.unwrap();
    assert_eq!(diff.extra, vec!["create_user.py"]);
    assert!(diff.changed.is_empty());
    assert!(diff.missing.is_empty());
}
