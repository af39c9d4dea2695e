//! Tool handlers.
//!
//! Each handler runs exactly one statement on an already-open session.
//! Statements and table names are passed through untouched: callers of this
//! server are trusted.

use crate::db::{Session, StatementOutcome};
use crate::error::DbResult;
use crate::models::OperationCall;
use tracing::debug;

pub const LIST_TABLES_SQL: &str = "SHOW TABLES";

/// `DESCRIBE` statement for `table`, interpolated as-is.
pub fn describe_table_sql(table: &str) -> String {
    format!("DESCRIBE {}", table)
}

/// Execute `query` verbatim.
pub async fn run_query<S: Session>(session: &mut S, query: &str) -> DbResult<StatementOutcome> {
    debug!(sql_len = query.len(), "Running query");
    session.execute(query).await
}

/// Column metadata rows for `table`.
pub async fn describe_table<S: Session>(
    session: &mut S,
    table: &str,
) -> DbResult<StatementOutcome> {
    debug!(table = %table, "Describing table");
    session
        .execute(&describe_table_sql(table))
        .await
        .map(into_rows)
}

/// Table name rows for the connection's database.
pub async fn list_tables<S: Session>(session: &mut S) -> DbResult<StatementOutcome> {
    session.execute(LIST_TABLES_SQL).await.map(into_rows)
}

/// `DESCRIBE` and `SHOW TABLES` always answer with rows; a bare status means none matched.
fn into_rows(outcome: StatementOutcome) -> StatementOutcome {
    match outcome {
        StatementOutcome::Status(_) => StatementOutcome::Rows(Vec::new()),
        rows => rows,
    }
}

/// Route a parsed call to its handler.
pub async fn execute_call<S: Session>(
    session: &mut S,
    call: &OperationCall,
) -> DbResult<StatementOutcome> {
    match call {
        OperationCall::RunQuery { query } => run_query(session, query).await,
        OperationCall::DescribeTable { table } => describe_table(session, table).await,
        OperationCall::ListTables => list_tables(session).await,
    }
}
