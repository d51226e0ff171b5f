//! Canonical RIFF/WAVE container codec.
//!
//! `encode` always writes the 44-byte canonical layout:
//!
//! ```text
//! "RIFF" | size-8 | "WAVE" | "fmt " | 16 | fmt=1 | channels | rate | byte_rate | block_align | bits
//! "data" | data_len | samples...
//! ```
//!
//! `decode` accepts anything `encode` produces plus files that carry extra
//! chunks (`LIST`, `fact`, ...) before the data chunk.

use crate::{IntoneError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Size of the canonical header written by [`encode`].
pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT_CODE: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// How raw interleaved sample bytes are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate_hz: u32,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    pub const fn new(channels: u16, sample_rate_hz: u32, bits_per_sample: u16) -> Self {
        Self {
            channels,
            sample_rate_hz,
            bits_per_sample,
        }
    }

    /// Single-channel signed 16-bit PCM, the shape every synthesized segment has.
    pub const fn mono_pcm16(sample_rate_hz: u32) -> Self {
        Self::new(1, sample_rate_hz, 16)
    }

    /// Bytes per frame (one sample across all channels).
    pub fn frame_size(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    pub fn byte_rate(&self) -> u64 {
        self.sample_rate_hz as u64 * self.frame_size() as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(IntoneError::MalformedContainer(
                "channel count must be positive".into(),
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err(IntoneError::MalformedContainer(
                "sample rate must be positive".into(),
            ));
        }
        if self.bits_per_sample == 0 || self.bits_per_sample % 8 != 0 {
            return Err(IntoneError::MalformedContainer(format!(
                "bits per sample must be a positive multiple of 8, got {}",
                self.bits_per_sample
            )));
        }
        // block_align and byte_rate are stored in 16 and 32 bits respectively
        if self.frame_size() > u16::MAX as usize || self.byte_rate() > u32::MAX as u64 {
            return Err(IntoneError::MalformedContainer(format!(
                "format {self} does not fit a WAV header"
            )));
        }
        Ok(())
    }

    fn check_aligned(&self, len: usize) -> Result<()> {
        let frame = self.frame_size();
        if len % frame != 0 {
            return Err(IntoneError::MalformedContainer(format!(
                "{len} sample bytes is not a whole number of {frame}-byte frames"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ch/{}Hz/{}bit",
            self.channels, self.sample_rate_hz, self.bits_per_sample
        )
    }
}

/// Raw interleaved PCM together with the format describing it.
///
/// Never mutated after construction; [`RawAudioBuffer::concat`] builds a new buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudioBuffer {
    format: AudioFormat,
    samples: Vec<u8>,
}

impl RawAudioBuffer {
    pub fn new(format: AudioFormat, samples: Vec<u8>) -> Result<Self> {
        format.validate()?;
        format.check_aligned(samples.len())?;
        Ok(Self { format, samples })
    }

    /// Parse a WAV container into a buffer.
    pub fn from_wav(bytes: &[u8]) -> Result<Self> {
        let (format, samples) = decode(bytes)?;
        Ok(Self { format, samples })
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.frame_size()
    }

    pub fn duration_ms(&self) -> u64 {
        self.frames() as u64 * 1000 / self.format.sample_rate_hz as u64
    }

    pub fn to_wav(&self) -> Result<Vec<u8>> {
        encode(&self.format, &self.samples)
    }

    /// Join buffers end to end, in iteration order.
    ///
    /// Every buffer must share the first buffer's format; the first disagreement
    /// is reported as [`IntoneError::FormatMismatch`] naming both positions.
    pub fn concat<I>(buffers: I) -> Result<Self>
    where
        I: IntoIterator<Item = RawAudioBuffer>,
    {
        let mut iter = buffers.into_iter();
        let first = iter.next().ok_or_else(|| {
            IntoneError::InvalidInput("no audio buffers to concatenate".into())
        })?;
        let format = first.format;
        let mut samples = first.samples;

        for (offset, buf) in iter.enumerate() {
            if buf.format != format {
                return Err(IntoneError::FormatMismatch(format!(
                    "buffer {} is {} but buffer 0 is {}",
                    offset + 1,
                    buf.format,
                    format
                )));
            }
            samples.extend_from_slice(&buf.samples);
        }

        Ok(Self { format, samples })
    }
}

/// Write `samples` behind a canonical 44-byte WAV header.
pub fn encode(format: &AudioFormat, samples: &[u8]) -> Result<Vec<u8>> {
    format.validate()?;
    format.check_aligned(samples.len())?;

    let data_len = u32::try_from(samples.len())
        .ok()
        .filter(|len| *len <= u32::MAX - 36)
        .ok_or_else(|| {
            IntoneError::MalformedContainer(format!(
                "{} sample bytes exceed the WAV size limit",
                samples.len()
            ))
        })?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + samples.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate_hz.to_le_bytes());
    out.extend_from_slice(&(format.byte_rate() as u32).to_le_bytes());
    out.extend_from_slice(&(format.frame_size() as u16).to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(samples);

    debug!(target: "wav", format = %format, data_len, "Encoded WAV container");
    Ok(out)
}

/// Parse a WAV container into its format and raw sample bytes.
pub fn decode(bytes: &[u8]) -> Result<(AudioFormat, Vec<u8>)> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(IntoneError::MalformedContainer(
            "missing RIFF/WAVE marker".into(),
        ));
    }

    let mut idx = 12;
    let mut format: Option<AudioFormat> = None;

    while idx + 8 <= bytes.len() {
        let chunk_id = &bytes[idx..idx + 4];
        let size = read_u32(bytes, idx + 4) as usize;
        let body = idx + 8;
        let remaining = bytes.len() - body;

        if chunk_id == b"data" {
            let format = format.ok_or_else(|| {
                IntoneError::MalformedContainer("data chunk precedes fmt chunk".into())
            })?;
            if size > remaining {
                return Err(IntoneError::MalformedContainer(format!(
                    "data chunk declares {size} bytes but only {remaining} remain"
                )));
            }
            format.check_aligned(size)?;
            return Ok((format, bytes[body..body + size].to_vec()));
        }

        if size > remaining {
            return Err(IntoneError::MalformedContainer(format!(
                "chunk {:?} declares {size} bytes but only {remaining} remain",
                String::from_utf8_lossy(chunk_id)
            )));
        }

        if chunk_id == b"fmt " {
            format = Some(parse_fmt(&bytes[body..body + size])?);
        }

        // chunks are word aligned
        idx = body + size + (size & 1);
    }

    Err(IntoneError::MalformedContainer("missing data chunk".into()))
}

fn parse_fmt(chunk: &[u8]) -> Result<AudioFormat> {
    if chunk.len() < FMT_CHUNK_LEN as usize {
        return Err(IntoneError::MalformedContainer(format!(
            "fmt chunk is {} bytes, expected at least 16",
            chunk.len()
        )));
    }
    let code = read_u16(chunk, 0);
    if code != PCM_FORMAT_CODE {
        return Err(IntoneError::MalformedContainer(format!(
            "unsupported format code {code}, only integer PCM is handled"
        )));
    }
    let format = AudioFormat {
        channels: read_u16(chunk, 2),
        sample_rate_hz: read_u32(chunk, 4),
        bits_per_sample: read_u16(chunk, 14),
    };
    format.validate()?;

    let block_align = read_u16(chunk, 12) as usize;
    if block_align != format.frame_size() {
        return Err(IntoneError::MalformedContainer(format!(
            "block align {block_align} disagrees with {format}"
        )));
    }
    Ok(format)
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
