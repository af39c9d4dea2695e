//! Stdio transport for the MCP server.
//!
//! JSON-RPC messages are read from stdin and responses written to stdout.
//! Logs go to stderr so they never interleave with protocol traffic.

use crate::db::ConnectionTracker;
use crate::error::{DbError, DbResult};
use crate::mcp::MySqlService;
use rmcp::{ServiceExt, transport::stdio};
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

pub struct StdioTransport {
    tracker: ConnectionTracker,
    /// Grace period for in-flight connections on shutdown
    shutdown_timeout: Duration,
}

impl StdioTransport {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            tracker: ConnectionTracker::new(),
            shutdown_timeout,
        }
    }

    pub fn name(&self) -> &'static str {
        "stdio"
    }

    /// Serve until stdin closes or a termination signal arrives.
    pub async fn run(&self) -> DbResult<()> {
        let service = MySqlService::new(self.tracker.clone());

        let running_service = service
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        info!("MySQL MCP server running on stdio");

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => info!("Stdio transport completed normally"),
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        self.drain_connections().await;
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        self.drain_connections().await;

        if shutdown_requested {
            // stdin reads cannot be interrupted, so leave without waiting on them
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    /// Wait for connections opened by in-flight calls to close.
    async fn drain_connections(&self) {
        let open = self.tracker.open_count();
        if open == 0 {
            return;
        }
        info!(
            open,
            timeout_secs = self.shutdown_timeout.as_secs(),
            "Waiting for open database connections to close"
        );
        if !self.tracker.wait_until_closed(self.shutdown_timeout).await {
            let abandoned = self.tracker.open_targets();
            warn!(
                open = abandoned.len(),
                "Shutdown timeout reached, abandoning open connections"
            );
            for target in &abandoned {
                warn!(target_db = %target, "Abandoning connection without close");
            }
        }
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_transport_creation() {
        let transport = StdioTransport::new(Duration::from_secs(5));
        assert_eq!(transport.name(), "stdio");
        assert_eq!(transport.shutdown_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_drain_returns_when_idle() {
        let transport = StdioTransport::new(Duration::from_secs(5));
        tokio::time::timeout(Duration::from_secs(1), transport.drain_connections())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_timeout() {
        let transport = StdioTransport::new(Duration::from_millis(20));
        let _open = transport.tracker.track("localhost:3306/shop");
        tokio::time::timeout(Duration::from_secs(1), transport.drain_connections())
            .await
            .unwrap();
        assert_eq!(transport.tracker.open_count(), 1);
        assert_eq!(transport.tracker.open_targets(), ["localhost:3306/shop"]);
    }
}
