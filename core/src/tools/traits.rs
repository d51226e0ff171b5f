use super::error::ToolResult;
use async_trait::async_trait;
use serde_json::Value;

/// A JSON-in/JSON-out entry point for RPC-style callers
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable dotted name (e.g., "speech.generate")
    fn name(&self) -> String;

    fn description(&self) -> String;

    /// JSON Schema for `call` arguments
    fn parameters(&self) -> Value;

    async fn call(&self, arguments: Value) -> ToolResult<Value>;
}
