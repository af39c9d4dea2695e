//! MCP server integration module.
//!
//! This module provides the integration between the MCP protocol and
//! the tool handlers using the rmcp framework.

pub mod dispatcher;
pub mod service;

pub use dispatcher::Dispatcher;
pub use service::MySqlService;
