use super::capability::{SpeechCapability, SpeechMedia, SpeechRequest};
use crate::audio::wav::{AudioFormat, RawAudioBuffer};
use crate::envelope::DataUri;
use crate::expression::Segment;
use crate::{IntoneError, Result};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Prompt sent upstream for a segment.
///
/// Named expressions get a trailing tone directive; `Default` segments are
/// sent as-is so neutral delivery is not biased.
pub fn tone_prompt(segment: &Segment) -> String {
    if segment.expression.is_default() {
        return segment.text.clone();
    }
    let tone = segment.expression.label().to_lowercase();
    let article = match tone.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    };
    format!("{} (Say this in {} {} tone)", segment.text, article, tone)
}

/// Synthesizes one segment at a time. Cheap to clone; holds no per-call state.
#[derive(Clone)]
pub struct SegmentSynthesizer {
    capability: Arc<dyn SpeechCapability>,
    timeout: Duration,
}

impl SegmentSynthesizer {
    pub fn new(capability: Arc<dyn SpeechCapability>, timeout: Duration) -> Self {
        Self {
            capability,
            timeout,
        }
    }

    pub fn build_request(segment: &Segment, voice: &str) -> SpeechRequest {
        SpeechRequest::new(tone_prompt(segment), voice)
    }

    /// Synthesize `segment` with `voice`, returning mono 16-bit PCM.
    ///
    /// Every failure (transport, timeout, no media, bad envelope, bad payload)
    /// comes back as [`IntoneError::SynthesisFailure`] carrying the segment text.
    pub async fn synthesize(&self, segment: &Segment, voice: &str) -> Result<RawAudioBuffer> {
        let request = Self::build_request(segment, voice);
        debug!(
            target: "synthesizer",
            expression = %segment.expression,
            chars = segment.text.chars().count(),
            "Synthesizing segment"
        );

        let failure = |reason: String| {
            warn!(target: "synthesizer", segment = %segment.text, %reason, "Segment synthesis failed");
            IntoneError::SynthesisFailure {
                segment_text: segment.text.clone(),
                reason,
            }
        };

        let media = match timeout(self.timeout, self.capability.generate(request)).await {
            Err(_) => {
                return Err(failure(format!(
                    "timed out after {} ms",
                    self.timeout.as_millis()
                )))
            }
            Ok(Err(e)) => return Err(failure(e.to_string())),
            Ok(Ok(None)) => return Err(failure("capability returned no media".into())),
            Ok(Ok(Some(media))) => media,
        };

        decode_media(&media).map_err(|e| failure(e.to_string()))
    }
}

/// Unwrap a capability envelope into raw samples.
///
/// WAV payloads are decoded through the container codec and must be mono
/// 16-bit; anything else under `audio/*` is taken as little-endian 16-bit mono
/// PCM at the envelope's rate.
fn decode_media(media: &SpeechMedia) -> Result<RawAudioBuffer> {
    let uri = DataUri::parse(&media.url)?;
    if uri.is_wav() {
        let buffer = RawAudioBuffer::from_wav(&uri.data)?;
        let format = buffer.format();
        if format != AudioFormat::mono_pcm16(format.sample_rate_hz) {
            return Err(IntoneError::MalformedEnvelope(format!(
                "expected mono 16-bit WAV, got {format}"
            )));
        }
        return Ok(buffer);
    }
    if !uri.is_audio() {
        return Err(IntoneError::MalformedEnvelope(format!(
            "expected audio media, got {}",
            uri.mime
        )));
    }
    let rate = uri.sample_rate_hz()?;
    RawAudioBuffer::new(AudioFormat::mono_pcm16(rate), uri.data)
}
