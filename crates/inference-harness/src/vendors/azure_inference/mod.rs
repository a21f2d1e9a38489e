//! Azure AI Inference chat-completions provider (also serves GitHub Models).
//!
//! Vendor-specific configuration lives here so the root harness API stays
//! provider-agnostic.
mod adapter;
mod config;
mod options;

pub use adapter::{AZURE_INFERENCE_PROVIDER, AzureInferenceProvider};
pub use config::{ApiKey, AzureInferenceConfig, DEFAULT_ENDPOINT, TOKEN_ENV};
pub use options::AzureInferenceRequestOptions;

use crate::ProviderId;
use crate::run::RunBuilder;

/// Extension trait for attaching Azure AI Inference options to a `RunBuilder`.
pub trait AzureInferenceRunBuilderExt {
    /// Stored under the `azure-inference` provider key and read only by
    /// `AzureInferenceProvider`.
    fn azure_inference_options(self, options: AzureInferenceRequestOptions) -> Self;
}

impl AzureInferenceRunBuilderExt for RunBuilder {
    fn azure_inference_options(self, options: AzureInferenceRequestOptions) -> Self {
        let value = serde_json::to_value(options)
            .expect("AzureInferenceRequestOptions serialization should be infallible");
        self.set_vendor_options_json(ProviderId::new(AZURE_INFERENCE_PROVIDER), value)
    }
}
