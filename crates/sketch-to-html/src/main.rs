//! Streams an HTML/CSS rendition of a hand-drawn page sketch.
//!
//! The model's answer is printed as it arrives, followed by token usage and
//! the first extracted ```` ```html ```` block.

mod cli;
mod config;
mod report;

use std::error::Error;
use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser as _;
use inference_harness::observability::init_observability;
use inference_harness::vendors::azure_inference::{
    AZURE_INFERENCE_PROVIDER, AzureInferenceProvider, AzureInferenceRunBuilderExt as _,
};
use inference_harness::{Harness, ModelRef, StreamEvent};
use tracing::{debug, info};

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    config::init();
    init_observability(cli::DEFAULT_LOG_LEVEL);

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = %err, "sketch-to-html failed");
            eprintln!("The sample encountered an error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let image = config::read_image(&cli.image).await?;
    let provider = AzureInferenceProvider::new(config::provider_config(&cli)?)?;
    let harness = Harness::builder()
        .register_provider(Arc::new(provider))
        .build()?;

    let mut builder = harness
        .run(ModelRef::new(AZURE_INFERENCE_PROVIDER, cli.model.clone()))
        .system_prompt(cli.system_prompt.clone())
        .user_text(cli.instruction.clone())
        .user_image(image)
        .azure_inference_options(cli.request_options());
    if let Some(timeout) = cli.timeout() {
        builder = builder.timeout(timeout);
    }

    let mut stream = builder.start_stream().await?;
    info!(run_id = %stream.run_id(), model = %stream.model(), image = %cli.image.display(), "streaming completion");

    let stdout = std::io::stdout();
    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::OutputDelta { text, .. } => {
                let mut out = stdout.lock();
                out.write_all(text.as_bytes())?;
                out.flush()?;
            }
            StreamEvent::Error { error, .. } => {
                debug!(error = %error, "completion stream ended with an error");
            }
            StreamEvent::RunStarted { .. } | StreamEvent::Completed { .. } => {}
        }
    }

    let output = stream.finish().await?;
    report::write_summary(&mut stdout.lock(), &output)?;
    Ok(())
}
