use crate::model::ProviderId;

/// Errors returned by a provider adapter before they are normalized for the
/// public run stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Endpoint answered with a non-success HTTP status (auth, quota, model name).
    #[error("provider error ({provider}): {message}")]
    Provider {
        provider: ProviderId,
        message: String,
        status_code: Option<u16>,
    },
    /// Connecting, sending, or reading the response body failed.
    #[error("transport error ({provider}): {message}")]
    Transport {
        provider: ProviderId,
        message: String,
    },
    /// An event payload was not a valid completion chunk.
    #[error("malformed event ({provider}): {message}")]
    MalformedEvent {
        provider: ProviderId,
        message: String,
    },
    /// The response carried no readable event stream.
    #[error("unexpected response shape ({provider}): {message}")]
    ResponseShape {
        provider: ProviderId,
        message: String,
    },
}

impl ProviderError {
    /// Creates a provider-level error.
    pub fn provider(
        provider: impl Into<ProviderId>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Creates a transport-level error.
    pub fn transport(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed-event error.
    pub fn malformed_event(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a response-shape error.
    pub fn response_shape(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::ResponseShape {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns the provider associated with this error.
    pub fn provider_id(&self) -> &ProviderId {
        match self {
            Self::Provider { provider, .. }
            | Self::Transport { provider, .. }
            | Self::MalformedEvent { provider, .. }
            | Self::ResponseShape { provider, .. } => provider,
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Provider { message, .. }
            | Self::Transport { message, .. }
            | Self::MalformedEvent { message, .. }
            | Self::ResponseShape { message, .. } => message,
        }
    }
}

/// Terminal run failure sent through `StreamEvent::Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum RunFailure {
    /// Endpoint rejected the request.
    #[error("provider failure ({provider}): {message}")]
    Provider {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },
    /// Network/stream transport failed.
    #[error("transport failure ({provider}): {message}")]
    Transport { provider: String, message: String },
    /// A stream event could not be parsed; nothing after it was consumed.
    #[error("malformed event ({provider}): {message}")]
    MalformedEvent { provider: String, message: String },
    /// The response was not an event stream.
    #[error("unexpected response shape ({provider}): {message}")]
    ResponseShape { provider: String, message: String },
    /// The run loop detected an invariant violation.
    #[error("protocol failure: {message}")]
    Protocol { message: String },
}

/// Top-level error type for the public harness API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarnessError {
    /// Missing credential, unreadable input file, or invalid client settings.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid user input to the builder API.
    #[error("validation error: {0}")]
    Validation(String),
    /// Requested provider is not registered in the harness.
    #[error("provider not found: {provider}")]
    ProviderNotFound { provider: ProviderId },
    /// Terminal failure returned from a started run.
    #[error(transparent)]
    RunFailed(RunFailure),
    /// Internal protocol misuse or invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl HarnessError {
    pub(crate) fn run_failed(failure: RunFailure) -> Self {
        Self::RunFailed(failure)
    }

    pub(crate) fn protocol_msg(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

impl From<RunFailure> for HarnessError {
    fn from(value: RunFailure) -> Self {
        HarnessError::RunFailed(value)
    }
}

pub(crate) fn run_failure_from_provider_error(err: &ProviderError) -> RunFailure {
    match err {
        ProviderError::Provider {
            provider,
            message,
            status_code,
        } => RunFailure::Provider {
            provider: provider.to_string(),
            message: message.clone(),
            status_code: *status_code,
        },
        ProviderError::Transport { provider, message } => RunFailure::Transport {
            provider: provider.to_string(),
            message: message.clone(),
        },
        ProviderError::MalformedEvent { provider, message } => RunFailure::MalformedEvent {
            provider: provider.to_string(),
            message: message.clone(),
        },
        ProviderError::ResponseShape { provider, message } => RunFailure::ResponseShape {
            provider: provider.to_string(),
            message: message.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_keep_their_kind_when_normalized() {
        let malformed = ProviderError::malformed_event("azure-inference", "expected value");
        assert!(matches!(
            run_failure_from_provider_error(&malformed),
            RunFailure::MalformedEvent { provider, .. } if provider == "azure-inference"
        ));

        let rejected = ProviderError::provider("azure-inference", "401 Unauthorized", Some(401));
        assert!(matches!(
            run_failure_from_provider_error(&rejected),
            RunFailure::Provider {
                status_code: Some(401),
                ..
            }
        ));
    }

    #[test]
    fn message_accessor_covers_every_variant() {
        let err = ProviderError::response_shape("p", "content-type text/html");
        assert_eq!(err.message(), "content-type text/html");
        assert_eq!(err.provider_id().as_str(), "p");
    }
}
