//! Tool catalog.
//!
//! The three tools and their input schemas, built once from the typed
//! argument structs so the advertised contract matches what is parsed.

use crate::models::{DescribeTableArgs, ListTablesArgs, Operation, RunQueryArgs};
use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use std::sync::{Arc, LazyLock};

/// Static description of one tool.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub operation: Operation,
    pub input_schema: Arc<JsonObject>,
}

impl OperationDescriptor {
    fn new<T: JsonSchema>(operation: Operation) -> Self {
        Self {
            operation,
            input_schema: Arc::new(schema_object::<T>()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.operation.name()
    }

    pub fn description(&self) -> &'static str {
        self.operation.description()
    }

    /// Field names the caller must supply.
    pub fn required(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(|v| v.as_array())
            .map(|fields| fields.iter().filter_map(|f| f.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name(), self.description(), self.input_schema.clone())
    }
}

static CATALOG: LazyLock<Vec<OperationDescriptor>> = LazyLock::new(|| {
    Operation::ALL
        .into_iter()
        .map(|operation| match operation {
            Operation::RunQuery => OperationDescriptor::new::<RunQueryArgs>(operation),
            Operation::DescribeTable => OperationDescriptor::new::<DescribeTableArgs>(operation),
            Operation::ListTables => OperationDescriptor::new::<ListTablesArgs>(operation),
        })
        .collect()
});

/// All tools, in catalog order. The same slice is returned on every call.
pub fn list_operations() -> &'static [OperationDescriptor] {
    &CATALOG
}

/// The catalog as MCP tool definitions.
pub fn list_tools() -> Vec<Tool> {
    list_operations()
        .iter()
        .map(OperationDescriptor::to_tool)
        .collect()
}

fn schema_object<T: JsonSchema>() -> JsonObject {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(mut object)) => {
            // Type name and struct docs are internal; the tool carries its own description
            for key in ["$schema", "title", "description"] {
                object.remove(key);
            }
            object
        }
        _ => JsonObject::new(),
    }
}
