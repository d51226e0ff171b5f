//! Assembly orchestrator: validate → segment → synthesize (bounded, ordered) → concatenate → encode.
//!
//! Env overrides:
//! - INTONE_MAX_CONCURRENCY (in-flight segment requests, 1–16, default 4)
//! - INTONE_SEGMENT_TIMEOUT_MS (per-segment deadline, default 60000)
//! - INTONE_MIN_TEXT_CHARS (minimum trimmed input length, default and floor 2)

use super::capability::SpeechCapability;
use super::synthesizer::SegmentSynthesizer;
use crate::audio::wav::{AudioFormat, RawAudioBuffer};
use crate::envelope::DataUri;
use crate::expression::segment;
use crate::{IntoneError, Result};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::time::Duration;
use tracing::{error, info, Span};

const MAX_CONCURRENCY_CAP: usize = 16;

/// Inputs shorter than this (after trimming) are always rejected.
pub const MIN_TEXT_CHARS_FLOOR: usize = 2;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_concurrency: usize,
    pub segment_timeout_ms: u64,
    pub min_text_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let max_concurrency = std::env::var("INTONE_MAX_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, MAX_CONCURRENCY_CAP);
        let segment_timeout_ms = std::env::var("INTONE_SEGMENT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60_000);
        let min_text_chars = std::env::var("INTONE_MIN_TEXT_CHARS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MIN_TEXT_CHARS_FLOOR)
            .max(MIN_TEXT_CHARS_FLOOR);

        Self {
            max_concurrency,
            segment_timeout_ms,
            min_text_chars,
        }
    }
}

/// A finished request: one WAV container plus what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechOutput {
    pub container: Vec<u8>,
    pub format: AudioFormat,
    pub segments: usize,
    pub duration_ms: u64,
}

impl SpeechOutput {
    /// `data:audio/wav;base64,...` for the caller.
    pub fn to_data_uri(&self) -> String {
        DataUri::wav(self.container.clone()).to_string()
    }
}

/// Drives a whole request. Stateless between calls; share freely.
#[derive(Clone)]
pub struct SpeechOrchestrator {
    synthesizer: SegmentSynthesizer,
    cfg: OrchestratorConfig,
}

impl SpeechOrchestrator {
    pub fn new(capability: Arc<dyn SpeechCapability>, cfg: OrchestratorConfig) -> Self {
        let synthesizer =
            SegmentSynthesizer::new(capability, Duration::from_millis(cfg.segment_timeout_ms));
        Self { synthesizer, cfg }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.cfg
    }

    /// Produce one WAV container for `text` spoken in `voice`.
    ///
    /// All-or-nothing: the first failing segment aborts the request, in-flight
    /// siblings are dropped and no audio is returned.
    #[tracing::instrument(
        skip(self, text),
        fields(request_id = %request_id(), chars = text.chars().count(), segments)
    )]
    pub async fn generate_speech(&self, text: &str, voice: &str) -> Result<SpeechOutput> {
        let trimmed = text.trim();
        let min_chars = self.cfg.min_text_chars.max(MIN_TEXT_CHARS_FLOOR);
        if trimmed.chars().count() < min_chars {
            return Err(IntoneError::InvalidInput(format!(
                "text must be at least {min_chars} characters"
            )));
        }
        if voice.trim().is_empty() {
            return Err(IntoneError::InvalidInput("voice must not be empty".into()));
        }

        let segments = segment(trimmed);
        if segments.is_empty() {
            return Err(IntoneError::InvalidInput(
                "text contains no speakable segments".into(),
            ));
        }
        Span::current().record("segments", segments.len());
        info!(target: "speech", segments = segments.len(), voice, "Starting speech generation");

        let started = Instant::now();
        // futures own their inputs; the request future must stay Send
        // buffered() yields in submission order, so results line up with segment indices
        let buffers: Vec<RawAudioBuffer> = stream::iter(segments.iter().cloned())
            .map(|seg| {
                let synthesizer = self.synthesizer.clone();
                let voice = voice.to_string();
                async move { synthesizer.synthesize(&seg, &voice).await }
            })
            .buffered(self.cfg.max_concurrency.max(1))
            .try_collect()
            .await?;

        let combined = RawAudioBuffer::concat(buffers).map_err(|e| {
            error!(target: "speech", error = %e, "Segment formats disagree");
            e
        })?;
        let container = combined.to_wav().map_err(|e| {
            error!(target: "speech", error = %e, "Failed to encode combined audio");
            e
        })?;

        let output = SpeechOutput {
            format: combined.format(),
            segments: segments.len(),
            duration_ms: combined.duration_ms(),
            container,
        };
        info!(
            target: "speech",
            segments = output.segments,
            duration_ms = output.duration_ms,
            bytes = output.container.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Speech generation done"
        );
        Ok(output)
    }

    /// Same as [`generate_speech`](Self::generate_speech), wrapped as an outbound data URI.
    pub async fn generate_speech_data_uri(&self, text: &str, voice: &str) -> Result<String> {
        Ok(self.generate_speech(text, voice).await?.to_data_uri())
    }
}

fn request_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{:x}", nanos)
}
