use crate::speech::SpeechOrchestrator;
use crate::tools::{Tool, ToolError, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Voice used when a call does not name one.
pub const DEFAULT_VOICE: &str = "Algenib";

#[derive(Debug, Deserialize)]
struct GenerateArgs {
    text: String,
    #[serde(default)]
    voice: Option<String>,
}

/// `speech.generate`: `{ text, voice? }` → `{ audioDataUri, ... }`
pub struct SpeechGenerateTool {
    orchestrator: SpeechOrchestrator,
    default_voice: String,
    deadline: Option<Duration>,
}

impl SpeechGenerateTool {
    pub fn new(orchestrator: SpeechOrchestrator) -> Self {
        Self {
            orchestrator,
            default_voice: DEFAULT_VOICE.to_string(),
            deadline: None,
        }
    }

    pub fn with_default_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }

    /// Bound the whole request, on top of the per-segment timeout.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[async_trait]
impl Tool for SpeechGenerateTool {
    fn name(&self) -> String {
        "speech.generate".to_string()
    }

    fn description(&self) -> String {
        "Synthesizes expressive speech from text with inline [Emotion] tags into a single WAV"
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to speak, e.g. '[Happy] Hello there [Sad] but then...'"
                },
                "voice": {
                    "type": "string",
                    "description": "Prebuilt voice name"
                }
            },
            "required": ["text"]
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let args: GenerateArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let voice = args
            .voice
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.default_voice.clone());

        debug!(target: "speech_tool", voice = %voice, "Generating speech");

        let run = self.orchestrator.generate_speech(&args.text, &voice);
        let output = match self.deadline {
            Some(deadline) => timeout(deadline, run).await.map_err(|_| {
                warn!(target: "speech_tool", deadline_ms = deadline.as_millis() as u64, "Speech request timed out");
                ToolError::Timeout
            })?,
            None => run.await,
        }?;

        Ok(json!({
            "audioDataUri": output.to_data_uri(),
            "segments": output.segments,
            "durationMs": output.duration_ms,
            "sampleRateHz": output.format.sample_rate_hz,
        }))
    }
}
