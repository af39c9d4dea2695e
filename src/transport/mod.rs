//! Transport layer for the MCP server.
//!
//! Only stdio is provided: the server is launched as a child process by the
//! MCP host and talks over its standard streams.

pub mod stdio;

pub use stdio::StdioTransport;
