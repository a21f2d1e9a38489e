//! Server-sent-event framing.
//!
//! Turns an HTTP body byte stream into one [`SseFrame`] per blank-line
//! separated block. Lines may end in CRLF, LF, or a bare CR. Payloads are
//! not interpreted here.

use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::errors::ProviderError;
use crate::model::ProviderId;

pub(crate) type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// One dispatched SSE block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field, when the server names the event.
    pub event: Option<String>,
    /// All `data:` lines of the block joined with `\n`.
    pub data: String,
}

impl SseFrame {
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }
}

/// Fields of the block currently being read.
#[derive(Default)]
struct PendingBlock {
    event: Option<String>,
    data: Vec<String>,
    bytes: usize,
}

impl PendingBlock {
    fn feed(&mut self, line: &[u8]) {
        self.bytes += line.len();
        // Line terminators are ASCII, so a complete line never splits a UTF-8 sequence.
        let line = String::from_utf8_lossy(line);
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
    }

    /// Ends the block. A block without data is not dispatched.
    fn dispatch(&mut self) -> Option<SseFrame> {
        let block = std::mem::take(self);
        if block.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: block.event,
            data: block.data.join("\n"),
        })
    }
}

/// Incremental line reader. Bytes are buffered until a full line arrives,
/// so multi-byte characters split across chunks decode correctly.
#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    block: PendingBlock,
    /// Previous chunk ended in CR; a leading LF in the next chunk belongs to it.
    after_cr: bool,
}

impl SseDecoder {
    pub fn push_chunk(&mut self, mut chunk: &[u8]) -> Vec<SseFrame> {
        if chunk.is_empty() {
            return Vec::new();
        }
        if std::mem::take(&mut self.after_cr) && chunk[0] == b'\n' {
            chunk = &chunk[1..];
        }
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some((len, consumed)) = next_line(&self.buf[start..]) {
            let line = &self.buf[start..start + len];
            if line.is_empty() {
                frames.extend(self.block.dispatch());
            } else {
                self.block.feed(line);
            }
            start += consumed;
        }
        self.after_cr = start > 0 && start == self.buf.len() && self.buf[start - 1] == b'\r';
        self.buf.drain(..start);
        frames
    }

    /// Bytes received after the last dispatched block.
    pub fn pending_len(&self) -> usize {
        self.buf.len() + self.block.bytes
    }
}

/// Length of the next line and the bytes it consumes including its terminator.
fn next_line(buf: &[u8]) -> Option<(usize, usize)> {
    let end = buf.iter().position(|b| matches!(b, b'\n' | b'\r'))?;
    if buf[end] == b'\r' && buf.get(end + 1) == Some(&b'\n') {
        Some((end, end + 2))
    } else {
        Some((end, end + 1))
    }
}

/// Lazy, single-pass frame sequence over a response body.
///
/// Ends when the body ends; a read error ends it with
/// [`ProviderError::Transport`]. Dropping the stream drops the body.
pub(crate) fn frame_stream(
    provider_id: ProviderId,
    bytes_stream: ByteStream,
) -> impl futures::Stream<Item = Result<SseFrame, ProviderError>> + Send {
    frame_stream_from(provider_id, bytes_stream)
}

fn frame_stream_from<S, E>(
    provider_id: ProviderId,
    bytes_stream: S,
) -> impl futures::Stream<Item = Result<SseFrame, ProviderError>> + Send
where
    S: futures::Stream<Item = Result<bytes::Bytes, E>> + Send + Unpin,
    E: std::fmt::Display + Send,
{
    struct State<S> {
        provider_id: ProviderId,
        bytes_stream: S,
        decoder: SseDecoder,
        pending: std::collections::VecDeque<SseFrame>,
        done: bool,
    }

    stream::try_unfold(
        State {
            provider_id,
            bytes_stream,
            decoder: SseDecoder::default(),
            pending: std::collections::VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(frame) = state.pending.pop_front() {
                    return Ok(Some((frame, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        state.pending.extend(state.decoder.push_chunk(&chunk));
                    }
                    Some(Err(e)) => {
                        return Err(ProviderError::transport(
                            state.provider_id,
                            format!("event stream read failed: {e}"),
                        ));
                    }
                    None => {
                        if state.decoder.pending_len() > 0 {
                            debug!(
                                provider = %state.provider_id,
                                bytes = state.decoder.pending_len(),
                                "discarding unterminated trailing event block"
                            );
                        }
                        state.done = true;
                    }
                }
            }
        },
    )
}
