//! Per-call request dispatcher.
//!
//! One tool call moves through Idle -> Connecting -> Executing -> Idle:
//! resolve the tool, parse its arguments, open a connection, run the handler,
//! close the connection. The connection is local to the call and is closed
//! before the call returns, whatever the handler's outcome.

use crate::db::{ConnectionTracker, Connector, Session, StatementOutcome};
use crate::error::DbResult;
use crate::models::{Invocation, Operation};
use crate::tools::{execute_call, into_call_tool_result, to_pretty_json};
use rmcp::model::{CallToolResult, JsonObject};
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

pub struct Dispatcher<C> {
    connector: C,
    tracker: ConnectionTracker,
}

impl<C: Connector> Dispatcher<C> {
    pub fn new(connector: C) -> Self {
        Self::with_tracker(connector, ConnectionTracker::new())
    }

    /// Create a dispatcher that reports open connections to `tracker`.
    pub fn with_tracker(connector: C, tracker: ConnectionTracker) -> Self {
        Self { connector, tracker }
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Handle a tool call and wrap the outcome as a text result.
    ///
    /// Operation-level failures never escape: they become `Error: ...` text.
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        into_call_tool_result(self.dispatch(name, arguments).await)
    }

    /// Handle a tool call, returning the JSON text or the error.
    pub async fn dispatch(&self, name: &str, arguments: Option<JsonObject>) -> DbResult<String> {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("tool_call", %invocation_id, operation = %name);

        async move {
            let start = Instant::now();
            let result = self.resolve_and_run(name, arguments).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => info!(elapsed_ms, "Tool call completed"),
                Err(e) => warn!(elapsed_ms, kind = e.kind(), error = %e, "Tool call failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn resolve_and_run(&self, name: &str, arguments: Option<JsonObject>) -> DbResult<String> {
        let operation = Operation::from_name(name)?;
        let invocation = Invocation::parse(operation, arguments)?;
        let outcome = self.run(invocation).await?;
        to_pretty_json(&outcome)
    }

    async fn run(&self, invocation: Invocation) -> DbResult<StatementOutcome> {
        let target = invocation.params.target();
        debug!(target_db = %target, "Connecting");
        // Held from before the handshake so shutdown also waits for calls still connecting
        let _open = self.tracker.track(target);
        let mut session = self.connector.connect(&invocation.params).await?;

        debug!("Executing");
        let result = execute_call(&mut session, &invocation.call).await;

        // Always runs: the handler result is only returned after the close
        session.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::models::ConnectionParams;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    struct FakeConnector {
        counters: Arc<Counters>,
        refuse: bool,
    }

    struct FakeSession {
        counters: Arc<Counters>,
    }

    impl Connector for FakeConnector {
        type Session = FakeSession;

        async fn connect(&self, params: &ConnectionParams) -> DbResult<FakeSession> {
            if self.refuse {
                return Err(DbError::connection(format!(
                    "Access denied for user '{}'",
                    params.user
                )));
            }
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(FakeSession {
                counters: self.counters.clone(),
            })
        }
    }

    impl Session for FakeSession {
        async fn execute(&mut self, sql: &str) -> DbResult<StatementOutcome> {
            if sql.starts_with("DESCRIBE") {
                return Err(DbError::query("Table 'shop.ghost' doesn't exist", None));
            }
            let mut row = serde_json::Map::new();
            row.insert("x".to_string(), json!(1));
            Ok(StatementOutcome::Rows(vec![row]))
        }

        async fn close(self) {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn dispatcher(refuse: bool) -> (Dispatcher<FakeConnector>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let connector = FakeConnector {
            counters: counters.clone(),
            refuse,
        };
        (Dispatcher::new(connector), counters)
    }

    fn args(extra: serde_json::Value) -> Option<JsonObject> {
        let mut base = json!({"user": "root", "password": "pw", "database": "shop"});
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        base.as_object().cloned()
    }

    #[tokio::test]
    async fn test_success_closes_once() {
        let (dispatcher, counters) = dispatcher(false);
        let text = dispatcher
            .dispatch("run_query", args(json!({"query": "SELECT 1 AS x"})))
            .await
            .unwrap();
        assert_eq!(text, "[\n  {\n    \"x\": 1\n  }\n]");
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.tracker().open_count(), 0);
    }

    #[tokio::test]
    async fn test_query_failure_still_closes() {
        let (dispatcher, counters) = dispatcher(false);
        let err = dispatcher
            .dispatch("describe_table", args(json!({"table": "ghost"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_operation_never_connects() {
        let (dispatcher, counters) = dispatcher(false);
        let err = dispatcher
            .dispatch("drop_database", args(json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: drop_database");
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
    }

    /// Connector whose handshake waits for a permit.
    struct SlowConnector {
        inner: FakeConnector,
        handshake: Arc<tokio::sync::Semaphore>,
    }

    impl Connector for SlowConnector {
        type Session = FakeSession;

        async fn connect(&self, params: &ConnectionParams) -> DbResult<FakeSession> {
            self.handshake.acquire().await.unwrap().forget();
            self.inner.connect(params).await
        }
    }

    #[tokio::test]
    async fn test_tracker_counts_call_while_connecting() {
        let counters = Arc::new(Counters::default());
        let handshake = Arc::new(tokio::sync::Semaphore::new(0));
        let tracker = ConnectionTracker::new();
        let dispatcher = Arc::new(Dispatcher::with_tracker(
            SlowConnector {
                inner: FakeConnector {
                    counters: counters.clone(),
                    refuse: false,
                },
                handshake: handshake.clone(),
            },
            tracker.clone(),
        ));

        let call = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.dispatch("list_tables", args(json!({}))).await }
        });

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while tracker.open_count() == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.open_targets(), ["localhost:3306/shop"]);
        assert!(
            !tracker
                .wait_until_closed(std::time::Duration::from_millis(20))
                .await
        );

        handshake.add_permits(1);
        call.await.unwrap().unwrap();
        assert!(tracker.wait_until_closed(std::time::Duration::from_secs(5)).await);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refused_connection_releases_tracker() {
        let (dispatcher, _counters) = dispatcher(true);
        dispatcher
            .dispatch("list_tables", args(json!({})))
            .await
            .unwrap_err();
        assert_eq!(dispatcher.tracker().open_count(), 0);
        assert!(dispatcher.tracker().open_targets().is_empty());
    }

    #[tokio::test]
    async fn test_refused_connection_renders_error_text() {
        let (dispatcher, counters) = dispatcher(true);
        let result = dispatcher.call("list_tables", args(json!({}))).await;
        let value = serde_json::to_value(&result).unwrap();
        let text = value["content"][0]["text"].as_str().unwrap();
        assert_eq!(
            text,
            "Error: Failed to connect to MySQL: Access denied for user 'root'"
        );
        assert_eq!(counters.closed.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.tracker().open_count(), 0);
    }
}
