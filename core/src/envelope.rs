//! Data URI envelopes exchanged with the speech capability and the caller.
//!
//! The capability answers with `data:audio/L16;codec=pcm;rate=24000;base64,<pcm>`
//! (or occasionally a whole WAV under `audio/wav`). Callers receive
//! `data:audio/wav;base64,<container>`.

use crate::{IntoneError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt;
use std::str::FromStr;

/// Sample rate assumed when an envelope carries no `rate` parameter.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 24_000;

pub const WAV_MIME: &str = "audio/wav";

const WAV_MIME_ALIASES: [&str; 4] = ["audio/wav", "audio/x-wav", "audio/wave", "audio/vnd.wave"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    /// `key=value` parameters between the MIME type and `;base64`, in order
    pub params: Vec<(String, String)>,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            params: Vec::new(),
            data,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Wrap a finished WAV container for the caller.
    pub fn wav(container: Vec<u8>) -> Self {
        Self::new(WAV_MIME, container)
    }

    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let rest = strip_prefix_ignore_case(input, "data:")
            .ok_or_else(|| IntoneError::MalformedEnvelope("missing data: scheme".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| IntoneError::MalformedEnvelope("missing payload section".into()))?;

        let mut parts = header.split(';').map(str::trim);
        let mime = parts.next().unwrap_or_default();
        if !is_mime_type(mime) {
            return Err(IntoneError::MalformedEnvelope(format!(
                "invalid MIME type {mime:?}"
            )));
        }

        let mut params = Vec::new();
        let mut base64_marked = false;
        for part in parts {
            if base64_marked {
                return Err(IntoneError::MalformedEnvelope(
                    "parameters after ;base64 marker".into(),
                ));
            }
            if part.eq_ignore_ascii_case("base64") {
                base64_marked = true;
                continue;
            }
            match part.split_once('=') {
                Some((k, v)) => params.push((k.trim().to_ascii_lowercase(), v.trim().to_string())),
                None if part.is_empty() => {}
                None => {
                    return Err(IntoneError::MalformedEnvelope(format!(
                        "malformed parameter {part:?}"
                    )))
                }
            }
        }
        if !base64_marked {
            return Err(IntoneError::MalformedEnvelope(
                "only base64 payloads are supported".into(),
            ));
        }

        let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if payload.is_empty() {
            return Err(IntoneError::MalformedEnvelope("empty payload".into()));
        }
        let data = BASE64
            .decode(payload.as_bytes())
            .map_err(|e| IntoneError::MalformedEnvelope(format!("invalid base64 payload: {e}")))?;

        Ok(Self {
            mime: mime.to_ascii_lowercase(),
            params,
            data,
        })
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// The declared `rate` parameter, or [`DEFAULT_SAMPLE_RATE_HZ`] when absent.
    pub fn sample_rate_hz(&self) -> Result<u32> {
        match self.param("rate") {
            None => Ok(DEFAULT_SAMPLE_RATE_HZ),
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|r| *r > 0)
                .ok_or_else(|| {
                    IntoneError::MalformedEnvelope(format!("invalid rate parameter {raw:?}"))
                }),
        }
    }

    pub fn is_wav(&self) -> bool {
        WAV_MIME_ALIASES.contains(&self.mime.as_str())
    }

    pub fn is_audio(&self) -> bool {
        self.mime.starts_with("audio/")
    }
}

impl FromStr for DataUri {
    type Err = IntoneError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{}", self.mime)?;
        for (k, v) in &self.params {
            write!(f, ";{k}={v}")?;
        }
        write!(f, ";base64,{}", BASE64.encode(&self.data))
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn is_mime_type(s: &str) -> bool {
    match s.split_once('/') {
        Some((kind, sub)) => {
            let token = |t: &str| {
                !t.is_empty()
                    && t.chars()
                        .all(|c| c.is_ascii_alphanumeric() || "!#$&^_.+-".contains(c))
            };
            token(kind) && token(sub)
        }
        None => false,
    }
}
