// Intone Core Library
// Expressive text-to-speech: tag segmentation, per-segment synthesis, WAV assembly

pub mod audio;
pub mod envelope;
pub mod expression;
pub mod speech;
pub mod telemetry;
pub mod tools;

// Export core types
pub use audio::wav::{AudioFormat, RawAudioBuffer};
pub use envelope::DataUri;
pub use expression::{segment, Expression, Segment};
pub use speech::{
    HttpSpeechCapability, OrchestratorConfig, SegmentSynthesizer, SpeechCapability,
    SpeechCapabilityConfig, SpeechOrchestrator, SpeechOutput, SpeechRequest,
};
pub use tools::{SpeechGenerateTool, Tool, ToolError, ToolResult};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntoneError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Synthesis failed for segment \"{segment_text}\": {reason}")]
    SynthesisFailure {
        segment_text: String,
        reason: String,
    },

    #[error("Format mismatch: {0}")]
    FormatMismatch(String),

    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Capability error: {0}")]
    CapabilityError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl IntoneError {
    /// True for errors caused by the caller's request (4xx-equivalent).
    /// Everything else is an internal or upstream failure (5xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(self, IntoneError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, IntoneError>;
