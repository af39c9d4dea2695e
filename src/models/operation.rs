//! Operation data models.
//!
//! The three tools, their typed argument structs, and the parsed form of a
//! single invocation.

use crate::error::{DbError, DbResult};
use crate::models::connection::{ConnectionArgs, ConnectionParams};
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

/// The fixed set of tools, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RunQuery,
    DescribeTable,
    ListTables,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::RunQuery,
        Operation::DescribeTable,
        Operation::ListTables,
    ];

    /// Tool name as advertised to callers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RunQuery => "run_query",
            Self::DescribeTable => "describe_table",
            Self::ListTables => "list_tables",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::RunQuery => "Execute a MySQL query and return results",
            Self::DescribeTable => "Describe the structure of a MySQL table",
            Self::ListTables => "List all tables in the database",
        }
    }

    /// Resolve a tool name. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> DbResult<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| DbError::unknown_operation(name))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments for `run_query`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunQueryArgs {
    /// SQL query to execute
    pub query: String,
    #[serde(flatten)]
    pub connection: ConnectionArgs,
}

/// Arguments for `describe_table`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableArgs {
    /// Table name to describe
    pub table: String,
    #[serde(flatten)]
    pub connection: ConnectionArgs,
}

/// Arguments for `list_tables`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesArgs {
    #[serde(flatten)]
    pub connection: ConnectionArgs,
}

/// What to run once the connection is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationCall {
    RunQuery { query: String },
    DescribeTable { table: String },
    ListTables,
}

impl OperationCall {
    pub fn operation(&self) -> Operation {
        match self {
            Self::RunQuery { .. } => Operation::RunQuery,
            Self::DescribeTable { .. } => Operation::DescribeTable,
            Self::ListTables => Operation::ListTables,
        }
    }
}

/// A fully parsed tool call: the operation plus its connection parameters.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub call: OperationCall,
    pub params: ConnectionParams,
}

impl Invocation {
    /// Parse the argument bag for `operation`.
    ///
    /// Only the advertised shape is enforced; an absent bag is treated as empty
    /// and surfaces as a missing-field error.
    pub fn parse(operation: Operation, arguments: Option<Map<String, JsonValue>>) -> DbResult<Self> {
        let arguments = arguments.unwrap_or_default();
        let invocation = match operation {
            Operation::RunQuery => {
                let args: RunQueryArgs = decode(operation, arguments)?;
                Self {
                    call: OperationCall::RunQuery { query: args.query },
                    params: args.connection.into(),
                }
            }
            Operation::DescribeTable => {
                let args: DescribeTableArgs = decode(operation, arguments)?;
                Self {
                    call: OperationCall::DescribeTable { table: args.table },
                    params: args.connection.into(),
                }
            }
            Operation::ListTables => {
                let args: ListTablesArgs = decode(operation, arguments)?;
                Self {
                    call: OperationCall::ListTables,
                    params: args.connection.into(),
                }
            }
        };
        Ok(invocation)
    }
}

fn decode<T: DeserializeOwned>(operation: Operation, arguments: Map<String, JsonValue>) -> DbResult<T> {
    serde_json::from_value(JsonValue::Object(arguments))
        .map_err(|e| DbError::invalid_arguments(operation.name(), e.to_string()))
}
