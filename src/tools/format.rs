//! Output formatting for tool results.
//!
//! Every tool call, successful or not, answers with a single text content
//! item. Failures are told apart only by the `Error: ` prefix.

use crate::db::StatementOutcome;
use crate::error::{DbError, DbResult};
use rmcp::model::{CallToolResult, Content};

/// Prefix marking a failed call.
pub const ERROR_PREFIX: &str = "Error: ";

/// Pretty-print with 2-space indentation, keeping driver key order.
pub fn to_pretty_json(outcome: &StatementOutcome) -> DbResult<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

pub fn error_text(err: &DbError) -> String {
    format!("{}{}", ERROR_PREFIX, err)
}

/// Wrap an outcome into the uniform text result.
pub fn into_call_tool_result(result: DbResult<String>) -> CallToolResult {
    let text = match result {
        Ok(text) => text,
        Err(err) => error_text(&err),
    };
    CallToolResult::success(vec![Content::text(text)])
}
