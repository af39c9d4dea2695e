//! Configuration handling for the MySQL MCP Server.
//!
//! Only process-level settings live here. Connection parameters always
//! arrive with each tool call and are never read from the environment.

use clap::Parser;
use std::time::Duration;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Command line configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "mysql-mcp-server", version, about)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = DEFAULT_LOG_LEVEL, env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Seconds to wait for in-flight connections to close on shutdown.
    /// Connections still open afterwards are logged and dropped without a close.
    #[arg(
        long = "shutdown-timeout",
        default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        env = "MCP_SHUTDOWN_TIMEOUT"
    )]
    pub shutdown_timeout: u64,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }

    /// Get the shutdown grace period as a Duration.
    pub fn shutdown_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
        assert_eq!(
            config.shutdown_timeout_duration(),
            Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_parse_flags() {
        let config = Config::try_parse_from([
            "mysql-mcp-server",
            "--log-level",
            "debug",
            "--json-logs",
            "--shutdown-timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
        assert_eq!(config.shutdown_timeout_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_unknown_flag() {
        let result = Config::try_parse_from(["mysql-mcp-server", "--database", "x"]);
        assert!(result.is_err());
    }
}
