//! Single-use MySQL connections.
//!
//! A `Connector` opens one `Session` per tool call. The session is consumed
//! by `close`, so it cannot be closed twice or reused by a later call.

use crate::db::types::row_to_json;
use crate::error::{DbError, DbResult};
use crate::models::ConnectionParams;
use futures_util::TryStreamExt;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Either, Executor, Statement};
use std::future::Future;
use tracing::{debug, warn};

/// What a single statement produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatementOutcome {
    /// Result set rows, in driver order. Empty for a query that matched nothing.
    Rows(Vec<Map<String, JsonValue>>),
    /// Status of a statement without a result set (INSERT, UPDATE, DDL, ...).
    Status(StatementStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementStatus {
    pub affected_rows: u64,
    pub insert_id: u64,
}

/// Opens connections from per-call parameters.
pub trait Connector: Send + Sync {
    type Session: Session;

    /// Open a new connection. Errors are `DbError::Connection`.
    fn connect(
        &self,
        params: &ConnectionParams,
    ) -> impl Future<Output = DbResult<Self::Session>> + Send;
}

/// An open connection, good for one tool call.
pub trait Session: Send {
    /// Run `sql` exactly as given. Errors are `DbError::Query`.
    fn execute(&mut self, sql: &str) -> impl Future<Output = DbResult<StatementOutcome>> + Send;

    /// Close the connection. Failures are logged, never returned.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Connector backed by a plain `sqlx` MySQL connection (no pool).
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    pub fn new() -> Self {
        Self
    }

    fn connect_options(params: &ConnectionParams) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database)
    }
}

impl Connector for MySqlConnector {
    type Session = MySqlSession;

    async fn connect(&self, params: &ConnectionParams) -> DbResult<MySqlSession> {
        let options = Self::connect_options(params);
        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(DbError::from_connect_error)?;
        debug!(target_db = %params.target(), "MySQL connection opened");
        Ok(MySqlSession { conn })
    }
}

#[derive(Debug)]
pub struct MySqlSession {
    conn: MySqlConnection,
}

impl Session for MySqlSession {
    async fn execute(&mut self, sql: &str) -> DbResult<StatementOutcome> {
        // Text protocol, same as an interactive client: no binding, any statement type
        let results: Vec<_> = sqlx::raw_sql(sql)
            .fetch_many(&mut self.conn)
            .try_collect()
            .await?;

        let mut rows = Vec::new();
        let mut status = StatementStatus {
            affected_rows: 0,
            insert_id: 0,
        };
        for item in results {
            match item {
                Either::Left(done) => {
                    status.affected_rows += done.rows_affected();
                    status.insert_id = done.last_insert_id();
                }
                Either::Right(row) => rows.push(row_to_json(&row)),
            }
        }

        if !rows.is_empty() || reads_rows(sql) || self.returns_result_set(sql).await {
            Ok(StatementOutcome::Rows(rows))
        } else {
            Ok(StatementOutcome::Status(status))
        }
    }

    async fn close(self) {
        if let Err(e) = self.conn.close().await {
            warn!(error = %e, "Failed to close MySQL connection cleanly");
        } else {
            debug!("MySQL connection closed");
        }
    }
}

/// Leading keywords of statements that always answer with a result set.
const ROW_KEYWORDS: [&str; 8] = [
    "SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH", "VALUES", "TABLE",
];

/// Whether `sql` starts with a keyword that always yields rows.
///
/// Some servers (MySQL 5.7, MariaDB) prepare `SHOW` statements with zero
/// declared columns, so the prepared metadata alone cannot be trusted for them.
pub(crate) fn reads_rows(sql: &str) -> bool {
    let keyword = leading_keyword(sql);
    ROW_KEYWORDS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(keyword))
}

/// First word of `sql`, skipping whitespace, comments and opening parentheses.
fn leading_keyword(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(comment) = rest.strip_prefix("/*") {
            rest = comment.split_once("*/").map_or("", |(_, after)| after);
        } else if rest.starts_with("--") || rest.starts_with('#') {
            rest = rest.split_once('\n').map_or("", |(_, after)| after);
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

impl MySqlSession {
    /// Whether `sql` declares result columns, which tells an empty `SELECT`
    /// apart from a statement without a result set.
    ///
    /// Statements the server refuses to prepare are treated as having none.
    async fn returns_result_set(&mut self, sql: &str) -> bool {
        match (&mut self.conn).prepare(sql).await {
            Ok(statement) => !statement.columns().is_empty(),
            Err(e) => {
                debug!(error = %e, "Statement not preparable, reporting status");
                false
            }
        }
    }
}
