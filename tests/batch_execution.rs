//! Statement batching driven through a session: accumulation, prepare,
//! the execute-without-prepare shortcut, and the HANA block path.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sqlmux::driver::MemoryDriver;
use sqlmux::prelude::*;

fn source(dialect: Dialect) -> DataSource {
    DataSource::new(dialect, "localhost", "Proof").with_credentials("sa", "pw")
}

fn session(dialect: Dialect) -> (Arc<MemoryDriver>, Session) {
    let driver = Arc::new(MemoryDriver::new());
    let session = Session::new(driver.clone(), source(dialect)).unwrap();
    (driver, session)
}

#[test]
fn test_plain_batch_collapses_to_a_semicolon_script() {
    let (driver, mut session) = session(Dialect::SqlServer);
    session.add_statement("INSERT INTO t VALUES (1)");
    session.add_statement("UPDATE t SET x = 2");

    let text = session.prepare_command_text().to_string();
    assert_eq!(text, "INSERT INTO t VALUES (1);\nUPDATE t SET x = 2;\n");

    session.execute_non_query().unwrap();
    assert!(driver
        .journal()
        .contains(&format!("non-query: {text}")));
}

#[test]
fn test_execute_without_prepare_runs_the_last_added_statement() {
    let (driver, mut session) = session(Dialect::SqlServer);
    session.add_statement("INSERT INTO t VALUES (1)");
    session.add_statement("UPDATE t SET x = 2");

    session.execute_non_query().unwrap();
    assert!(driver
        .journal()
        .contains(&"non-query: UPDATE t SET x = 2".to_string()));
}

#[test]
fn test_prepare_with_nothing_batched_leaves_the_text_alone() {
    let (_driver, mut session) = session(Dialect::SqlServer);
    session.set_command_text("SELECT 1");
    assert_eq!(session.prepare_command_text(), "SELECT 1");
}

#[test]
fn test_hana_batch_builds_a_block_and_drains_parameters() {
    let (driver, mut session) = session(Dialect::Hana);
    session.add_parameter("p1", "hi");
    session.add_statement("INSERT INTO t VALUES (:p1)");
    session.add_statement("UPDATE t SET x = :p1");

    let text = session.prepare_command_text().to_string();
    assert_eq!(
        text,
        "DO BEGIN\nDECLARE p1 VARCHAR(2) := 'hi';\nINSERT INTO t VALUES (p1);\nUPDATE t SET x = p1;\nEND;"
    );
    assert!(session.parameters().is_empty());

    session.execute_non_query().unwrap();
    assert!(driver.journal().contains(&format!("non-query: {text}")));
}

#[test]
fn test_add_query_resolves_the_session_dialect() {
    let (_driver, mut session) = session(Dialect::Hana);
    let query = Query::new(Dialect::SqlServer, "UPDATE [t] SET [x] = ISNULL([x], 0)");
    let resolved = session.add_query(&query);
    assert_eq!(resolved, "UPDATE \"t\" SET \"x\" = IFNULL(\"x\", 0)");
    assert_eq!(session.command_text(), resolved);
}

#[test]
fn test_releasing_the_connection_ends_the_accumulation_cycle() {
    let (_driver, mut session) = session(Dialect::SqlServer);
    session.add_statement("INSERT INTO t VALUES (1)");
    // The execute releases the connection, abandoning the cycle.
    session.execute_non_query().unwrap();

    session.set_command_text("SELECT 2");
    assert_eq!(session.prepare_command_text(), "SELECT 2");
}

#[test]
fn test_batched_statements_strip_stray_markers_inside_the_block() {
    let (_driver, mut session) = session(Dialect::Hana);
    session.add_statement("UPDATE t SET x = :p1 WHERE y = @p2");
    let text = session.prepare_command_text();
    assert_eq!(text, "DO BEGIN\nUPDATE t SET x = p1 WHERE y = p2;\nEND;");
}
