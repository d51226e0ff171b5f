//! Scripted speech capability shared by integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use intone_core::envelope::DataUri;
use intone_core::speech::{SpeechCapability, SpeechMedia, SpeechRequest};
use intone_core::{IntoneError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

pub const RATE: u32 = 24_000;

/// What the fake does for one request.
pub struct Reply {
    pub delay: Duration,
    pub outcome: Result<Option<SpeechMedia>>,
}

impl Reply {
    pub fn audio(prompt: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(Some(pcm_media(&pcm_for(prompt), RATE))),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn nothing() -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(None),
        }
    }

    pub fn error(msg: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(IntoneError::CapabilityError(msg.to_string())),
        }
    }

    pub fn media(url: impl Into<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(Some(SpeechMedia::new(url))),
        }
    }
}

type Script = Box<dyn Fn(&SpeechRequest) -> Reply + Send + Sync>;

/// Fake capability driven by a closure; records calls, voices, in-flight peaks
/// and completion order.
pub struct ScriptedCapability {
    script: Script,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub voices: Mutex<Vec<String>>,
    pub completed: Mutex<Vec<String>>,
}

impl ScriptedCapability {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&SpeechRequest) -> Reply + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            voices: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        })
    }

    /// Answers every prompt with its own bytes as PCM, immediately.
    pub fn echo() -> Arc<Self> {
        Self::new(|req| Reply::audio(&req.prompt))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechCapability for ScriptedCapability {
    async fn generate(&self, request: SpeechRequest) -> Result<Option<SpeechMedia>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices.lock().unwrap().push(request.voice().to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let reply = (self.script)(&request);
        if !reply.delay.is_zero() {
            sleep(reply.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().unwrap().push(request.prompt.clone());
        reply.outcome
    }
}

/// Deterministic PCM for a prompt: its UTF-8 bytes, zero-padded to whole frames.
pub fn pcm_for(prompt: &str) -> Vec<u8> {
    let mut bytes = prompt.as_bytes().to_vec();
    if bytes.len() % 2 == 1 {
        bytes.push(0);
    }
    bytes
}

pub fn pcm_media(samples: &[u8], rate: u32) -> SpeechMedia {
    SpeechMedia::new(
        DataUri::new("audio/L16", samples.to_vec())
            .with_param("codec", "pcm")
            .with_param("rate", rate)
            .to_string(),
    )
}
