use std::collections::HashMap;
use std::pin::Pin;

use crate::content::InputPart;
use crate::errors::ProviderError;
use crate::model::{ModelRef, ProviderId, RunOptions};
use crate::sse::SseFrame;

/// Validated request handed to a provider adapter.
#[derive(Clone, Debug)]
pub struct ProviderRequest {
    pub run_id: uuid::Uuid,
    pub model: ModelRef,
    pub system_prompt: Option<String>,
    /// Non-empty, in send order.
    pub input_parts: Vec<InputPart>,
    pub options: RunOptions,
    /// Vendor option blobs keyed by provider id; each adapter reads its own.
    pub vendor_options: HashMap<ProviderId, serde_json::Value>,
}

/// Response metadata captured before the body is streamed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderResponseMeta {
    pub status_code: Option<u16>,
    /// Server-assigned request id, when the endpoint returns one.
    pub request_id: Option<String>,
}

pub type FrameStream =
    Pin<Box<dyn futures::Stream<Item = Result<SseFrame, ProviderError>> + Send + 'static>>;

/// Open response stream returned by `ProviderAdapter::start_stream`.
///
/// Dropping the handle releases the underlying connection.
pub struct ProviderStreamHandle {
    pub frames: FrameStream,
    pub metadata: ProviderResponseMeta,
}

/// Contract between the run loop and a concrete chat-completions endpoint.
///
/// An adapter sends the request and yields the decoded SSE frames of the
/// response in wire order. It does not interpret frame payloads.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn start_stream(
        &self,
        req: ProviderRequest,
    ) -> Result<ProviderStreamHandle, ProviderError>;
}
