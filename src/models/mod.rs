//! Data models for the MySQL MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod operation;

pub use connection::{ConnectionArgs, ConnectionParams, DEFAULT_HOST, DEFAULT_PORT};
pub use operation::{
    DescribeTableArgs, Invocation, ListTablesArgs, Operation, OperationCall, RunQueryArgs,
};
