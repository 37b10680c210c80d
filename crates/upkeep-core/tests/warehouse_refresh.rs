mod common;

use common::FakeSessions;
use std::io::Write;
use tempfile::NamedTempFile;
use upkeep_core::{Error, WarehouseJob};

fn script(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const THREE_STATEMENTS: &str = "\
-- rebuild the fact table
DROP TABLE IF EXISTS dwh_fact_events;

CREATE TABLE dwh_fact_events (task_id INT, done_at DATETIME);
INSERT INTO dwh_fact_events SELECT task_id, done_at FROM maintenance_events;
";

#[tokio::test]
async fn test_dry_run_executes_nothing() {
    let file = script("-- comment\nCREATE TABLE t(x int);\nINSERT INTO t VALUES(1);");
    let sessions = FakeSessions::default();

    let summary = WarehouseJob::new(file.path())
        .run(&sessions, true)
        .await
        .unwrap();

    assert!(summary.ok);
    assert!(summary.dry_run);
    assert_eq!(summary.statements, 2);
    assert_eq!(summary.executed, None);
    assert_eq!(*sessions.opened.lock().unwrap(), 0);
    assert!(sessions.executed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_run_executes_in_order_on_one_session() {
    let file = script(THREE_STATEMENTS);
    let sessions = FakeSessions::default();

    let summary = WarehouseJob::new(file.path())
        .run(&sessions, false)
        .await
        .unwrap();

    assert!(!summary.dry_run);
    assert_eq!(summary.statements, 3);
    assert_eq!(summary.executed, Some(3));
    assert!(summary.elapsed_sec.is_some());
    assert_eq!(*sessions.opened.lock().unwrap(), 1);

    let executed = sessions.executed.lock().unwrap();
    assert!(executed[0].starts_with("DROP TABLE"));
    assert!(executed[1].starts_with("CREATE TABLE"));
    assert!(executed[2].starts_with("INSERT INTO"));
}

#[tokio::test]
async fn test_failure_aborts_remaining_statements() {
    let file = script(THREE_STATEMENTS);
    let sessions = FakeSessions {
        fail_at: Some(2),
        ..Default::default()
    };

    let err = WarehouseJob::new(file.path())
        .run(&sessions, false)
        .await
        .unwrap_err();

    match err {
        Error::StatementFailed { index, total, .. } => {
            assert_eq!(index, 2);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Statement 1 ran and stays applied; statement 3 never ran.
    let executed = sessions.executed.lock().unwrap();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].starts_with("DROP TABLE"));
}

#[tokio::test]
async fn test_missing_script_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = FakeSessions::default();

    let err = WarehouseJob::new(dir.path().join("missing.sql"))
        .run(&sessions, true)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ScriptNotFound(path) if path.ends_with("missing.sql")));
    assert_eq!(*sessions.opened.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_shipped_script_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../sql/executions/dwh_executions.sql");
    let statements = WarehouseJob::new(path).load().await.unwrap();
    assert!(!statements.is_empty());
}
