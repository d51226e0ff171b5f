use std::fs;
use std::path::Path;

use intone_core::speech::{OrchestratorConfig, SpeechCapabilityConfig, MIN_TEXT_CHARS_FLOOR};
use intone_core::tools::speech::DEFAULT_VOICE;

/// High-level configuration for the CLI
#[derive(Clone, Debug)]
pub struct IntoneCliConfig {
    pub capability: SpeechCapabilityConfig,
    pub orchestrator: OrchestratorConfig,
    /// Voice used when `--voice` is not given
    pub voice: String,
}

impl Default for IntoneCliConfig {
    fn default() -> Self {
        // Start from module defaults (which already consider env vars)
        Self {
            capability: SpeechCapabilityConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            voice: std::env::var("INTONE_VOICE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        }
    }
}

impl IntoneCliConfig {
    /// Load configuration from a TOML file (path via INTONE_CONFIG or ./intone.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path = std::env::var("INTONE_CONFIG").unwrap_or_else(|_| "intone.toml".into());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(p: &Path) -> Self {
        let default = Self::default();
        if !p.exists() {
            tracing::info!(target: "intone_cli", path = %p.display(), "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<IntoneToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    tracing::warn!(target: "intone_cli", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "intone_cli", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct IntoneToml {
    pub voice: Option<String>,
    pub capability: Option<CapabilityToml>,
    pub orchestrator: Option<OrchestratorToml>,
}

impl IntoneToml {
    fn overlay(self, mut base: IntoneCliConfig) -> IntoneCliConfig {
        if let Some(v) = self.voice.filter(|v| !v.trim().is_empty()) {
            base.voice = v;
        }
        if let Some(c) = self.capability {
            c.apply(&mut base.capability);
        }
        if let Some(o) = self.orchestrator {
            o.apply(&mut base.orchestrator);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CapabilityToml {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
}
impl CapabilityToml {
    fn apply(self, c: &mut SpeechCapabilityConfig) {
        if let Some(x) = self.base_url {
            c.base_url = x;
        }
        if let Some(x) = self.model {
            c.model = x;
        }
        if let Some(x) = self.api_key.filter(|k| !k.is_empty()) {
            c.api_key = Some(x);
        }
        if let Some(x) = self.request_timeout_ms {
            c.request_timeout_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct OrchestratorToml {
    pub max_concurrency: Option<usize>,
    pub segment_timeout_ms: Option<u64>,
    pub min_text_chars: Option<usize>,
}
impl OrchestratorToml {
    fn apply(self, o: &mut OrchestratorConfig) {
        if let Some(x) = self.max_concurrency {
            o.max_concurrency = x.clamp(1, 16);
        }
        if let Some(x) = self.segment_timeout_ms {
            o.segment_timeout_ms = x;
        }
        if let Some(x) = self.min_text_chars {
            o.min_text_chars = x.max(MIN_TEXT_CHARS_FLOOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn toml_overlays_defaults() {
        std::env::remove_var("INTONE_VOICE");
        let t: IntoneToml = toml::from_str(
            r#"
            voice = "Kore"

            [capability]
            base_url = "http://tts.internal/v1"
            request_timeout_ms = 9000

            [orchestrator]
            max_concurrency = 64
            "#,
        )
        .unwrap();

        let cfg = t.overlay(IntoneCliConfig::default());
        assert_eq!(cfg.voice, "Kore");
        assert_eq!(cfg.capability.base_url, "http://tts.internal/v1");
        assert_eq!(cfg.capability.request_timeout_ms, 9000);
        assert_eq!(cfg.orchestrator.max_concurrency, 16);
        assert_eq!(cfg.orchestrator.min_text_chars, 2);
    }

    #[test]
    #[serial]
    fn toml_cannot_lower_min_text_chars() {
        let t: IntoneToml = toml::from_str("[orchestrator]\nmin_text_chars = 0\n").unwrap();
        let cfg = t.overlay(IntoneCliConfig::default());
        assert_eq!(cfg.orchestrator.min_text_chars, MIN_TEXT_CHARS_FLOOR);

        let t: IntoneToml = toml::from_str("[orchestrator]\nmin_text_chars = 5\n").unwrap();
        assert_eq!(t.overlay(IntoneCliConfig::default()).orchestrator.min_text_chars, 5);
    }

    #[test]
    #[serial]
    fn missing_file_keeps_defaults() {
        std::env::remove_var("INTONE_VOICE");
        let cfg = IntoneCliConfig::load_from(Path::new("/nonexistent/intone.toml"));
        assert_eq!(cfg.voice, DEFAULT_VOICE);
    }
}
