use crate::IntoneError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Caller mistakes map to 4xx; everything else to 5xx.
    pub fn status_code(&self) -> u16 {
        match self {
            ToolError::InvalidArguments(_) => 400,
            ToolError::Timeout => 504,
            ToolError::ExecutionFailed(_) => 502,
            ToolError::Internal(_) => 500,
        }
    }
}

impl From<IntoneError> for ToolError {
    fn from(err: IntoneError) -> Self {
        match err {
            IntoneError::InvalidInput(msg) => ToolError::InvalidArguments(msg),
            e @ IntoneError::SynthesisFailure { .. } => ToolError::ExecutionFailed(e.to_string()),
            e @ IntoneError::CapabilityError(_) => ToolError::ExecutionFailed(e.to_string()),
            other => ToolError::Internal(other.to_string()),
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
