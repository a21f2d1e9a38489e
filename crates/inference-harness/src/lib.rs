//! Streaming multimodal chat-completions harness with a builder-first async API.
//!
//! A run sends one system prompt plus one user turn (text and inline images),
//! decodes the server-sent-event response, and folds the streamed deltas into
//! a final [`RunOutput`] with the last reported token usage.
//!
//! Vendor-specific APIs are namespaced under `vendors::*`.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use inference_harness::prelude::*;
//! use inference_harness::vendors::azure_inference::{
//!     AZURE_INFERENCE_PROVIDER, AzureInferenceProvider,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), HarnessError> {
//! let harness = Harness::builder()
//!     .register_provider(Arc::new(AzureInferenceProvider::from_env()?))
//!     .build()?;
//!
//! let mut run = harness
//!     .run(ModelRef::new(AZURE_INFERENCE_PROVIDER, "gpt-4o"))
//!     .system_prompt("You are a frontend developer.")
//!     .user_text("Write HTML for this sketch")
//!     .user_image(ImageInput::jpeg(std::fs::read("sketch.jpg").unwrap_or_default()))
//!     .start_stream()
//!     .await?;
//!
//! while let Some(event) = run.next_event().await {
//!     if let StreamEvent::OutputDelta { text, .. } = event {
//!         print!("{text}");
//!     }
//! }
//! let output = run.finish().await?;
//! println!("\n{:?}", output.html());
//! # Ok(())
//! # }
//! ```

/// Folding of decoded completion chunks into text and usage.
pub mod accumulate;
/// Input content and final run output types.
pub mod content;
/// Public error types used by the harness API.
pub mod errors;
/// Fenced HTML block extraction.
pub mod extract;
/// Harness entry point and builder.
pub mod harness;
/// Model and provider identifiers plus generic run options.
pub mod model;
/// Process-wide tracing subscriber setup.
pub mod observability;
/// Chat-completions request body types.
pub mod payload;
/// Common imports for typical usage.
pub mod prelude;
/// Provider adapter contract used by vendor integrations.
pub mod provider;
/// Run builder, streaming handle, and the run task.
pub mod run;
/// Server-sent-event framing.
pub mod sse;
/// Normalized public stream events.
pub mod stream;
/// Vendor-specific integrations and extension traits.
pub mod vendors;

pub use accumulate::{ResponseAccumulator, Step};
pub use content::{ImageInput, InputPart, RunOutput, UsageRecord};
pub use errors::{HarnessError, ProviderError, RunFailure};
pub use extract::extract_html;
pub use harness::{Harness, HarnessBuilder};
pub use model::{ModelRef, ProviderId, RunOptions};
pub use payload::{ChatCompletionRequest, build_vision_request};
pub use provider::{ProviderAdapter, ProviderRequest, ProviderResponseMeta, ProviderStreamHandle};
pub use run::{RunBuilder, RunStream};
pub use sse::{SseDecoder, SseFrame};
pub use stream::StreamEvent;
