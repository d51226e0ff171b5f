use crate::{IntoneError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Output modality requested from the speech model.
pub const AUDIO_MODALITY: &str = "AUDIO";

/// Configuration for HttpSpeechCapability loaded from environment variables
#[derive(Debug, Clone)]
pub struct SpeechCapabilityConfig {
    pub base_url: String, // e.g., http://localhost:3400/v1
    pub model: String,    // e.g., gemini-2.5-flash-preview-tts
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for SpeechCapabilityConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("INTONE_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "http://localhost:3400/v1".to_string()),
            model: std::env::var("INTONE_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "gemini-2.5-flash-preview-tts".to_string()),
            api_key: std::env::var("INTONE_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            request_timeout_ms: std::env::var("INTONE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub voice_name: String,
}

/// One synthesis call: prompt text plus voice, always single-channel audio out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub response_modality: String,
    pub voice_config: VoiceConfig,
    pub prompt: String,
}

impl SpeechRequest {
    pub fn new(prompt: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            response_modality: AUDIO_MODALITY.to_string(),
            voice_config: VoiceConfig {
                voice_name: voice.into(),
            },
            prompt: prompt.into(),
        }
    }

    pub fn voice(&self) -> &str {
        &self.voice_config.voice_name
    }
}

/// Media returned by the capability; `url` is a data URI envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechMedia {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl SpeechMedia {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
        }
    }
}

/// The remote speech-generation model.
///
/// `Ok(None)` means the call went through but produced no media.
#[async_trait]
pub trait SpeechCapability: Send + Sync {
    async fn generate(&self, request: SpeechRequest) -> Result<Option<SpeechMedia>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    model: &'a str,
    #[serde(flatten)]
    request: &'a SpeechRequest,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    media: Option<SpeechMedia>,
}

/// HTTP client for a speech endpoint accepting `POST {base_url}/generate`
#[derive(Clone)]
pub struct HttpSpeechCapability {
    pub(crate) http: Client,
    pub(crate) cfg: SpeechCapabilityConfig,
}

impl HttpSpeechCapability {
    pub fn new(cfg: SpeechCapabilityConfig) -> Result<Self> {
        if cfg.base_url.trim().is_empty() {
            return Err(IntoneError::ConfigError("base_url must not be empty".into()));
        }
        if cfg.model.trim().is_empty() {
            return Err(IntoneError::ConfigError("model must not be empty".into()));
        }
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| IntoneError::CapabilityError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SpeechCapabilityConfig::default())
    }

    pub fn config(&self) -> &SpeechCapabilityConfig {
        &self.cfg
    }

    /// Serialize the wire body for a request (model id + request fields).
    pub fn request_body(&self, request: &SpeechRequest) -> Result<serde_json::Value> {
        let body = GenerateBody {
            model: &self.cfg.model,
            request,
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[async_trait]
impl SpeechCapability for HttpSpeechCapability {
    async fn generate(&self, request: SpeechRequest) -> Result<Option<SpeechMedia>> {
        let url = format!("{}/generate", self.cfg.base_url.trim_end_matches('/'));
        debug!(target: "capability", voice = %request.voice(), "POST {}", url);

        let mut req = self
            .http
            .post(&url)
            .header("content-type", "application/json");
        if let Some(key) = &self.cfg.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .json(&self.request_body(&request)?)
            .send()
            .await
            .map_err(|e| IntoneError::CapabilityError(format!("Speech HTTP error: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target: "capability", %status, body = %text, "Speech generation error");
            return Err(IntoneError::CapabilityError(format!(
                "Speech generation error: status={} body={}",
                status, text
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| IntoneError::CapabilityError(format!("Failed to read response: {e}")))?;
        parse_generate_response(&body)
    }
}

/// Parse `{ "media": { "url": ... } }`, `null`, or an empty body.
pub(crate) fn parse_generate_response(body: &str) -> Result<Option<SpeechMedia>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let parsed: Option<GenerateResponse> = serde_json::from_str(body)?;
    Ok(parsed
        .and_then(|r| r.media)
        .filter(|m| !m.url.trim().is_empty()))
}
