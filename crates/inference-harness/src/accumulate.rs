//! Folds decoded chat-completion chunks into the final run output.

use serde::Deserialize;

use crate::content::{RunOutput, UsageRecord};
use crate::sse::SseFrame;

/// Payload that marks the normal end of a completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One streamed chat-completion chunk. Only the fields the accumulator reads
/// are modelled; anything else on the wire is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Option<Vec<DeltaChoice>>,
    #[serde(default)]
    pub usage: Option<UsageRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeltaChoice {
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    Open,
    Closed,
}

/// Result of applying one frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Text fragments carried by the frame, one per choice, in choice order.
    Continue(Vec<String>),
    /// Sentinel seen; the stream must not be read further.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccumulateError {
    #[error("invalid completion chunk: {0}")]
    MalformedEvent(String),
    #[error("event received after the stream was closed")]
    Closed,
}

/// Owns the accumulated text and the single usage slot for one run.
#[derive(Debug)]
pub struct ResponseAccumulator {
    state: AccumulatorState,
    text: String,
    usage: Option<UsageRecord>,
    finish_reason: Option<String>,
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self {
            state: AccumulatorState::Open,
            text: String::new(),
            usage: None,
            finish_reason: None,
        }
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn usage(&self) -> Option<&UsageRecord> {
        self.usage.as_ref()
    }

    /// Applies one frame in arrival order.
    ///
    /// A payload that is not valid chunk JSON is fatal: the accumulator stays
    /// as it was and the caller must stop reading.
    pub fn apply(&mut self, frame: &SseFrame) -> Result<Step, AccumulateError> {
        if self.state == AccumulatorState::Closed {
            return Err(AccumulateError::Closed);
        }
        if frame.data == DONE_SENTINEL {
            self.state = AccumulatorState::Closed;
            return Ok(Step::Finished);
        }

        let chunk: CompletionChunk = serde_json::from_str(&frame.data)
            .map_err(|e| AccumulateError::MalformedEvent(e.to_string()))?;

        let mut fragments = Vec::new();
        for choice in chunk.choices.unwrap_or_default() {
            let content = choice
                .delta
                .and_then(|delta| delta.content)
                .unwrap_or_default();
            self.text.push_str(&content);
            fragments.push(content);
            if choice.finish_reason.is_some() {
                self.finish_reason = choice.finish_reason;
            }
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }
        Ok(Step::Continue(fragments))
    }

    /// Closes the accumulator (stream exhaustion is a normal end too) and
    /// returns what was gathered.
    pub fn finish(mut self) -> RunOutput {
        self.state = AccumulatorState::Closed;
        RunOutput {
            text: self.text,
            usage: self.usage,
            finish_reason: self.finish_reason,
        }
    }
}

/// Folds a whole frame sequence, stopping at the sentinel.
pub fn accumulate<'a, I>(frames: I) -> Result<RunOutput, AccumulateError>
where
    I: IntoIterator<Item = &'a SseFrame>,
{
    let mut acc = ResponseAccumulator::new();
    for frame in frames {
        if acc.apply(frame)? == Step::Finished {
            break;
        }
    }
    Ok(acc.finish())
}
