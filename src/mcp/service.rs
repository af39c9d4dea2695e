//! MCP service implementation using rmcp.
//!
//! Tools are listed from the static catalog and every call is handed to the
//! dispatcher, which always answers with a single text content item.

use crate::db::{ConnectionTracker, Connector, MySqlConnector};
use crate::mcp::dispatcher::Dispatcher;
use crate::tools::list_tools;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use std::sync::Arc;

pub struct MySqlService<C = MySqlConnector> {
    /// Shared dispatcher; every call still opens its own connection
    dispatcher: Arc<Dispatcher<C>>,
}

impl MySqlService<MySqlConnector> {
    /// Create a service backed by real MySQL connections.
    pub fn new(tracker: ConnectionTracker) -> Self {
        Self::with_connector(MySqlConnector::new(), tracker)
    }
}

impl<C: Connector> MySqlService<C> {
    pub fn with_connector(connector: C, tracker: ConnectionTracker) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::with_tracker(connector, tracker)),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }
}

impl<C> Clone for MySqlService<C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<C: Connector + 'static> ServerHandler for MySqlService<C> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mysql-mcp-server".to_owned(),
                title: Some("MySQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MySQL tools. Every call carries its own credentials \
                (`user`, `password`, `database`, optional `host`/`port`) and opens a \
                fresh connection that is closed when the call returns.\n\
                \n\
                - `run_query`: execute any SQL statement verbatim\n\
                - `describe_table`: column metadata for a table\n\
                - `list_tables`: tables in the database\n\
                \n\
                Results are JSON text. Failures are text starting with `Error: `."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(list_tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .dispatcher
            .call(&request.name, request.arguments)
            .await)
    }
}
