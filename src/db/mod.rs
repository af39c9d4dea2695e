//! Database access layer.
//!
//! This module provides database access functionality:
//! - Single-use MySQL connections behind the `Connector`/`Session` traits
//! - Row to JSON type mapping
//! - Open connection accounting for graceful shutdown

pub mod connection;
pub mod tracker;
pub mod types;

pub use connection::{
    Connector, MySqlConnector, MySqlSession, Session, StatementOutcome, StatementStatus,
};
pub use tracker::{ConnectionTracker, OpenConnectionGuard};
