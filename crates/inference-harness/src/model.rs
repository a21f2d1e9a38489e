use std::fmt;
use std::time::Duration;

/// Stable identifier for a registered provider (for example `azure-inference`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Model selection for a run: which registered provider, and the model name
/// sent in the request body.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelRef {
    pub provider: ProviderId,
    /// Deployment/model name as the endpoint knows it
    /// (for example `Llama-4-Maverick-17B-128E-Instruct-FP8`).
    pub model: String,
}

impl ModelRef {
    pub fn new(provider: impl Into<ProviderId>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Provider-independent run behavior.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RunOptions {
    /// Whole-request timeout. `None` lets a stream run as long as the server keeps it open.
    pub timeout: Option<Duration>,
    /// Capacity of the channel between the run task and `RunStream`.
    pub stream_buffer_capacity: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            stream_buffer_capacity: 128,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_options_default_has_no_timeout() {
        let options = RunOptions::default();
        assert_eq!(options.timeout, None);
        assert_eq!(options.stream_buffer_capacity, 128);
    }

    #[test]
    fn model_ref_displays_provider_and_model() {
        let model = ModelRef::new("azure-inference", "gpt-4o");
        assert_eq!(model.to_string(), "azure-inference/gpt-4o");
    }
}
