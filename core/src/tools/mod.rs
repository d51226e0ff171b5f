pub mod error;
pub mod speech;
pub mod traits;

// Re-export common types
pub use error::{ToolError, ToolResult};
pub use speech::SpeechGenerateTool;
pub use traits::Tool;
