//! MCP tool implementations.
//!
//! This module contains the tool catalog and handlers:
//! - `run_query`: Execute any SQL statement verbatim
//! - `describe_table`: Column metadata via `DESCRIBE`
//! - `list_tables`: Table names via `SHOW TABLES`

pub mod catalog;
pub mod format;
pub mod handlers;

pub use catalog::{OperationDescriptor, list_operations, list_tools};
pub use format::{ERROR_PREFIX, into_call_tool_result, to_pretty_json};
pub use handlers::{describe_table, execute_call, list_tables, run_query};
