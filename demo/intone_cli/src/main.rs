mod config;

use config::IntoneCliConfig;
use intone_core::speech::{HttpSpeechCapability, SpeechOrchestrator};
use intone_core::telemetry::init_tracing;
use intone_core::{SpeechGenerateTool, Tool};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

const USAGE: &str = "\
Usage: intone [--voice NAME] [--out FILE | --json] <TEXT | ->

Synthesizes TEXT (with optional [Emotion] tags) into one WAV file.
Reads TEXT from stdin when it is '-' or omitted.

Options:
  --voice NAME   voice to use (default from config / INTONE_VOICE)
  --out FILE     WAV output path (default speech.wav)
  --json         print {\"audioDataUri\": ...} instead of writing a file
  -h, --help     show this help";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    voice: Option<String>,
    out: Option<PathBuf>,
    json: bool,
    help: bool,
    text: Option<String>,
}

impl CliArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut parsed = CliArgs::default();
        let mut words = Vec::new();
        let mut it = args.into_iter();
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--json" => parsed.json = true,
                "--voice" => {
                    parsed.voice = Some(it.next().ok_or("--voice needs a value")?);
                }
                "--out" => {
                    parsed.out = Some(it.next().ok_or("--out needs a value")?.into());
                }
                flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
                _ => words.push(arg),
            }
        }
        if parsed.json && parsed.out.is_some() {
            return Err("--json and --out are mutually exclusive".into());
        }
        if !words.is_empty() {
            parsed.text = Some(words.join(" "));
        }
        Ok(parsed)
    }
}

fn read_text(arg: Option<String>) -> std::io::Result<String> {
    match arg {
        Some(t) if t != "-" => Ok(t),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing("info,intone_core=info,intone_cli=info");

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) if e.is_client_error() => {
            error!(target: "intone_cli", error = %e, "Rejected input");
            ExitCode::from(2)
        }
        Err(e) => {
            error!(target: "intone_cli", error = %e, "Speech generation failed");
            ExitCode::FAILURE
        }
    }
}

/// 4xx-class tool failures are the caller's fault (exit 2); the rest exit 1.
fn exit_code_for_status(status: u16) -> u8 {
    if (400..500).contains(&status) {
        2
    } else {
        1
    }
}

async fn run(args: CliArgs) -> intone_core::Result<ExitCode> {
    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = IntoneCliConfig::load();
    let voice = args.voice.clone().unwrap_or_else(|| cfg.voice.clone());
    let text = read_text(args.text)?;

    let capability = Arc::new(HttpSpeechCapability::new(cfg.capability.clone())?);
    let orchestrator = SpeechOrchestrator::new(capability, cfg.orchestrator.clone());
    info!(
        target: "intone_cli",
        base_url = %cfg.capability.base_url,
        model = %cfg.capability.model,
        voice = %voice,
        "Generating speech"
    );

    if args.json {
        let tool = SpeechGenerateTool::new(orchestrator).with_default_voice(voice.clone());
        return match tool.call(json!({ "text": text, "voice": voice })).await {
            Ok(out) => {
                println!("{}", serde_json::to_string(&out)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                let status = e.status_code();
                error!(target: "intone_cli", tool = %tool.name(), error = %e, status, "Tool call failed");
                Ok(ExitCode::from(exit_code_for_status(status)))
            }
        };
    }

    let output = orchestrator.generate_speech(&text, &voice).await?;
    let path = args.out.unwrap_or_else(|| PathBuf::from("speech.wav"));
    tokio::fs::write(&path, &output.container).await?;
    info!(
        target: "intone_cli",
        path = %path.display(),
        segments = output.segments,
        duration_ms = output.duration_ms,
        "Wrote WAV"
    );
    Ok(ExitCode::SUCCESS)
}
