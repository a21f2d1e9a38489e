use std::fmt;
use std::time::Duration;

use crate::errors::HarnessError;

/// Endpoint used when none is configured (GitHub Models, Azure AI Inference API).
pub const DEFAULT_ENDPOINT: &str = "https://models.inference.ai.azure.com";
/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Secret token sent as a bearer credential. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Client settings for the Azure AI Inference provider.
#[derive(Clone, Debug)]
pub struct AzureInferenceConfig {
    pub api_key: ApiKey,
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,
    /// Client-wide request timeout. Off unless set.
    pub timeout: Option<Duration>,
}

impl AzureInferenceConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }

    /// Reads the token from `GITHUB_TOKEN`.
    pub fn from_env() -> Result<Self, HarnessError> {
        let api_key = std::env::var(TOKEN_ENV).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(HarnessError::Config(format!(
                "missing {TOKEN_ENV} for Azure AI Inference provider"
            )));
        }
        Ok(Self::new(api_key))
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let config = AzureInferenceConfig::new("k").endpoint("http://localhost:8080/");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:8080/chat/completions"
        );
        assert_eq!(
            AzureInferenceConfig::new("k").chat_completions_url(),
            "https://models.inference.ai.azure.com/chat/completions"
        );
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let config = AzureInferenceConfig::new("ghp_secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
