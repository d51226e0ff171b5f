//! Speech module: external capability client, per-segment synthesis and assembly
//!
//! This module provides:
//! - `SpeechCapability` trait plus `HttpSpeechCapability` for the remote speech model
//! - `SegmentSynthesizer` turning one `Segment` into a `RawAudioBuffer`
//! - `SpeechOrchestrator` driving segment → synthesize → concatenate → encode

mod capability;
mod orchestrator;
mod synthesizer;

pub use capability::{
    HttpSpeechCapability, SpeechCapability, SpeechCapabilityConfig, SpeechMedia, SpeechRequest,
    VoiceConfig, AUDIO_MODALITY,
};
pub use orchestrator::{
    OrchestratorConfig, SpeechOrchestrator, SpeechOutput, MIN_TEXT_CHARS_FLOOR,
};
pub use synthesizer::{tone_prompt, SegmentSynthesizer};
