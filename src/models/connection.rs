//! Connection-related data models.
//!
//! Connection parameters are built fresh for every tool call from the
//! caller's argument bag and dropped when the call completes.

use schemars::JsonSchema;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;

fn default_host() -> Option<String> {
    Some(DEFAULT_HOST.to_string())
}

fn default_port() -> Option<u16> {
    Some(DEFAULT_PORT)
}

/// Credential fields shared by every tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConnectionArgs {
    /// MySQL host
    #[serde(default = "default_host")]
    pub host: Option<String>,
    /// MySQL port
    #[serde(default = "default_port")]
    pub port: Option<u16>,
    /// MySQL username
    pub user: String,
    /// MySQL password
    pub password: String,
    /// Database name
    pub database: String,
}

/// Resolved parameters for a single MySQL connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Sensitive - never log
    pub password: String,
    pub database: String,
}

impl ConnectionParams {
    /// `host:port/database` for log fields. Contains no credentials.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl From<ConnectionArgs> for ConnectionParams {
    /// Empty hosts and a zero port fall back to the defaults.
    fn from(args: ConnectionArgs) -> Self {
        let host = args
            .host
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = args.port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT);

        Self {
            host,
            port,
            user: args.user,
            password: args.password,
            database: args.database,
        }
    }
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ConnectionParams {
        serde_json::from_value::<ConnectionArgs>(value)
            .unwrap()
            .into()
    }

    #[test]
    fn test_defaults_applied_when_absent() {
        let params = parse(json!({"user": "root", "password": "pw", "database": "shop"}));
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 3306);
        assert_eq!(params.target(), "localhost:3306/shop");
    }

    #[test]
    fn test_explicit_values_kept() {
        let params = parse(json!({
            "host": "db.internal",
            "port": 3307,
            "user": "app",
            "password": "pw",
            "database": "sales"
        }));
        assert_eq!(params.host, "db.internal");
        assert_eq!(params.port, 3307);
        assert_eq!(params.user, "app");
        assert_eq!(params.database, "sales");
    }

    #[test]
    fn test_falsy_values_fall_back() {
        let params = parse(json!({
            "host": "",
            "port": 0,
            "user": "root",
            "password": "",
            "database": "shop"
        }));
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 3306);
        assert_eq!(params.password, "");
    }

    #[test]
    fn test_null_host_and_port_fall_back() {
        let params = parse(json!({
            "host": null,
            "port": null,
            "user": "root",
            "password": "pw",
            "database": "shop"
        }));
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 3306);
    }

    #[test]
    fn test_missing_user_is_rejected() {
        let err = serde_json::from_value::<ConnectionArgs>(json!({
            "password": "pw",
            "database": "shop"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn test_debug_hides_password() {
        let params = parse(json!({"user": "root", "password": "hunter2", "database": "shop"}));
        let debug = format!("{:?}", params);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}
