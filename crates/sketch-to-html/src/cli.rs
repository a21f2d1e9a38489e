use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use inference_harness::vendors::azure_inference::{AzureInferenceRequestOptions, DEFAULT_ENDPOINT};

pub const DEFAULT_IMAGE: &str = "contoso_layout_sketch.jpg";
pub const DEFAULT_MODEL: &str = "Llama-4-Maverick-17B-128E-Instruct-FP8";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a frontend developer who likes clean, semantic HTML and CSS.";
/// Failures are reported once on stderr; raise with `HARNESS_LOG_LEVEL` or `RUST_LOG`.
pub const DEFAULT_LOG_LEVEL: &str = "error";
pub const DEFAULT_INSTRUCTION: &str =
    "Write HTML and CSS code for a web page based on the following handdrawn sketch";

/// Turn a hand-drawn page sketch into HTML and CSS with a vision model.
#[derive(Debug, Parser)]
#[command(name = "sketch-to-html", version)]
pub struct Cli {
    /// Sketch image to send, relative to the working directory.
    #[arg(long, default_value = DEFAULT_IMAGE)]
    pub image: PathBuf,
    #[arg(long, env = "SKETCH_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
    /// Chat-completions base URL.
    #[arg(long, env = "AZURE_INFERENCE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,
    #[arg(long, default_value = DEFAULT_INSTRUCTION)]
    pub instruction: String,
    #[arg(long)]
    pub temperature: Option<f32>,
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Abort the request after this many seconds. No limit by default.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl Cli {
    pub fn request_options(&self) -> AzureInferenceRequestOptions {
        AzureInferenceRequestOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            include_usage: Some(true),
            ..AzureInferenceRequestOptions::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_quiet_by_default() {
        let level: tracing::Level = DEFAULT_LOG_LEVEL.parse().expect("level");
        assert_eq!(level, tracing::Level::ERROR);
    }

    #[test]
    fn defaults_match_the_sketch_sample() {
        let cli = Cli::try_parse_from(["sketch-to-html"]).expect("parse");
        assert_eq!(cli.image, PathBuf::from(DEFAULT_IMAGE));
        assert_eq!(cli.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(cli.timeout(), None);
        assert_eq!(cli.request_options().include_usage, Some(true));
        assert_eq!(cli.request_options().temperature, None);
    }

    #[test]
    fn overrides_are_parsed() {
        let cli = Cli::try_parse_from([
            "sketch-to-html",
            "--image",
            "drawings/home.png",
            "--model",
            "gpt-4o",
            "--max-tokens",
            "2048",
            "--timeout-secs",
            "90",
        ])
        .expect("parse");
        assert_eq!(cli.model, "gpt-4o");
        assert_eq!(cli.request_options().max_tokens, Some(2048));
        assert_eq!(cli.timeout(), Some(Duration::from_secs(90)));
    }
}
