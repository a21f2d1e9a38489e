use crate::{RunOutput, errors::RunFailure, model::ProviderId};

/// Normalized stream events exposed by `RunStream`.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// First event for every run.
    RunStarted {
        run_id: uuid::Uuid,
        provider: ProviderId,
        model: String,
    },
    /// Incremental text fragment, in generation order. Empty fragments are not sent.
    OutputDelta {
        run_id: uuid::Uuid,
        seq: u64,
        text: String,
    },
    /// Terminal success event with the accumulated output and usage.
    Completed {
        run_id: uuid::Uuid,
        output: RunOutput,
    },
    /// Terminal failure event. Deltas already sent stay valid.
    Error {
        run_id: uuid::Uuid,
        error: RunFailure,
    },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }

    pub fn as_text_delta(&self) -> Option<&str> {
        match self {
            Self::OutputDelta { text, .. } => Some(text),
            _ => None,
        }
    }
}
