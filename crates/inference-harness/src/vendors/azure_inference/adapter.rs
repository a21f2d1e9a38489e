use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use tracing::debug;

use crate::ProviderId;
use crate::errors::{HarnessError, ProviderError};
use crate::payload::ChatCompletionRequest;
use crate::provider::{ProviderAdapter, ProviderRequest, ProviderResponseMeta, ProviderStreamHandle};
use crate::sse::{ByteStream, frame_stream};

use super::config::AzureInferenceConfig;
use super::options::AzureInferenceRequestOptions;

/// Provider id under which the adapter registers.
pub const AZURE_INFERENCE_PROVIDER: &str = "azure-inference";

const EVENT_STREAM: &str = "text/event-stream";

/// Provider adapter for the Azure AI Inference chat-completions API (streaming).
pub struct AzureInferenceProvider {
    client: reqwest::Client,
    config: AzureInferenceConfig,
}

impl AzureInferenceProvider {
    pub fn new(config: AzureInferenceConfig) -> Result<Self, HarnessError> {
        if config.api_key.is_blank() {
            return Err(HarnessError::Config(
                "Azure AI Inference api_key must not be empty".into(),
            ));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            HarnessError::Config(format!("failed to build Azure AI Inference client: {e}"))
        })?;
        Ok(Self { client, config })
    }

    /// Creates a provider using `GITHUB_TOKEN` and the default endpoint.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::new(AzureInferenceConfig::from_env()?)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for AzureInferenceProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new(AZURE_INFERENCE_PROVIDER)
    }

    async fn start_stream(
        &self,
        req: ProviderRequest,
    ) -> Result<ProviderStreamHandle, ProviderError> {
        let provider_id = self.id();
        let request_options = read_options(&req, &provider_id)?;
        let body = build_request_body(&req, &request_options)?;
        debug!(
            run_id = %req.run_id,
            model = %req.model.model,
            parts = req.input_parts.len(),
            "starting chat completions stream"
        );

        let mut http_req = self
            .client
            .post(self.config.chat_completions_url())
            .bearer_auth(self.config.api_key.expose())
            .header(ACCEPT, EVENT_STREAM)
            .json(&body);
        if let Some(timeout) = req.options.timeout {
            http_req = http_req.timeout(timeout);
        }

        let response = http_req.send().await.map_err(|e| {
            ProviderError::transport(provider_id.clone(), format!("chat completions request failed: {e}"))
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::provider(
                provider_id,
                format!("chat completions request failed with status {status}: {body}"),
                Some(status.as_u16()),
            ));
        }
        check_event_stream(&provider_id, response.headers())?;

        let metadata = ProviderResponseMeta {
            status_code: Some(status.as_u16()),
            request_id: request_id(response.headers()),
        };
        let bytes_stream: ByteStream = Box::pin(response.bytes_stream());
        Ok(ProviderStreamHandle {
            frames: Box::pin(frame_stream(provider_id, bytes_stream)),
            metadata,
        })
    }
}

fn read_options(
    req: &ProviderRequest,
    provider_id: &ProviderId,
) -> Result<AzureInferenceRequestOptions, ProviderError> {
    match req.vendor_options.get(provider_id) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            ProviderError::provider(
                provider_id.clone(),
                format!("invalid Azure AI Inference options: {e}"),
                None,
            )
        }),
        None => Ok(AzureInferenceRequestOptions::default()),
    }
}

pub(crate) fn build_request_body(
    req: &ProviderRequest,
    options: &AzureInferenceRequestOptions,
) -> Result<ChatCompletionRequest, ProviderError> {
    ChatCompletionRequest::from_parts(
        req.model.model.clone(),
        req.system_prompt.as_deref(),
        &req.input_parts,
        options.include_usage.unwrap_or(true),
    )
    .map(|body| body.with_sampling(options.sampling()))
    .ok_or_else(|| {
        ProviderError::provider(
            AZURE_INFERENCE_PROVIDER,
            "request has no user content",
            None,
        )
    })
}

/// A success response must carry an event stream; a missing content type is tolerated.
fn check_event_stream(provider_id: &ProviderId, headers: &HeaderMap) -> Result<(), ProviderError> {
    let Some(content_type) = headers.get(CONTENT_TYPE) else {
        return Ok(());
    };
    let content_type = content_type.to_str().unwrap_or_default();
    if content_type.trim().to_ascii_lowercase().starts_with(EVENT_STREAM) {
        return Ok(());
    }
    Err(ProviderError::response_shape(
        provider_id.clone(),
        format!("expected {EVENT_STREAM} response, got content-type {content_type:?}"),
    ))
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    ["x-request-id", "apim-request-id"]
        .into_iter()
        .find_map(|name| headers.get(name))
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ImageInput, InputPart};
    use crate::model::{ModelRef, RunOptions};
    use crate::vendors::azure_inference::AzureInferenceRunBuilderExt as _;
    use crate::{Harness, HarnessError, RunFailure};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::{TcpListener, TcpStream};

    fn request_with_parts(parts: Vec<InputPart>) -> ProviderRequest {
        ProviderRequest {
            run_id: uuid::Uuid::new_v4(),
            model: ModelRef::new(AZURE_INFERENCE_PROVIDER, "Llama-4-Maverick-17B-128E-Instruct-FP8"),
            system_prompt: Some("sys".into()),
            input_parts: parts,
            options: RunOptions::default(),
            vendor_options: HashMap::new(),
        }
    }

    #[test]
    fn request_body_streams_with_usage_by_default() {
        let req = request_with_parts(vec![
            InputPart::Text("draw".into()),
            InputPart::Image(ImageInput::jpeg(vec![9])),
        ]);
        let body = build_request_body(&req, &AzureInferenceRequestOptions::default()).expect("body");
        let value = serde_json::to_value(&body).expect("json");
        assert_eq!(value["stream"], serde_json::json!(true));
        assert_eq!(value["stream_options"]["include_usage"], serde_json::json!(true));
        assert_eq!(value["model"], serde_json::json!("Llama-4-Maverick-17B-128E-Instruct-FP8"));
        assert_eq!(value["messages"][0]["role"], serde_json::json!("system"));
        assert_eq!(value["messages"][1]["content"][1]["type"], serde_json::json!("image_url"));
    }

    #[test]
    fn request_options_are_applied_when_present() {
        let req = request_with_parts(vec![InputPart::Text("draw".into())]);
        let body = build_request_body(
            &req,
            &AzureInferenceRequestOptions::default()
                .temperature(0.2)
                .include_usage(false),
        )
        .expect("body");
        assert_eq!(body.sampling.temperature, Some(0.2));
        assert!(!body.stream_options.include_usage);
    }

    #[test]
    fn non_event_stream_content_type_is_a_shape_error() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().expect("header"));
        let err = check_event_stream(&ProviderId::new("p"), &headers).expect_err("shape");
        assert!(matches!(err, ProviderError::ResponseShape { .. }));

        headers.insert(CONTENT_TYPE, "text/event-stream; charset=utf-8".parse().expect("header"));
        assert!(check_event_stream(&ProviderId::new("p"), &headers).is_ok());
    }

    #[test]
    fn blank_api_key_is_a_config_error() {
        let result = AzureInferenceProvider::new(AzureInferenceConfig::new("  "));
        assert!(matches!(result, Err(HarnessError::Config(_))));
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serves one canned HTTP response and hands back the raw request it received.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.expect("write");
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{addr}"), task)
    }

    fn sse_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nx-request-id: req-1\r\nconnection: close\r\n\r\n{body}"
        )
    }

    fn harness_for(endpoint: &str) -> Harness {
        let provider = AzureInferenceProvider::new(
            AzureInferenceConfig::new("test-token").endpoint(endpoint),
        )
        .expect("provider");
        Harness::builder()
            .register_provider(Arc::new(provider))
            .build()
            .expect("harness")
    }

    #[tokio::test]
    async fn streams_completion_from_local_endpoint() {
        let (endpoint, server) = serve_once(sse_response(concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}],\"usage\":null}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"```html\\n<h1>Contoso</h1>\\n\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"```\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":40,\"completion_tokens\":8,\"total_tokens\":48}}\n\n",
            "data: [DONE]\n\n",
        )))
        .await;

        let output = harness_for(&endpoint)
            .run(ModelRef::new(AZURE_INFERENCE_PROVIDER, "gpt-4o"))
            .system_prompt("You write HTML.")
            .user_text("Build it")
            .user_image(ImageInput::jpeg(vec![0xff, 0xd8, 0xff]))
            .azure_inference_options(AzureInferenceRequestOptions::default().max_tokens(256))
            .collect_output()
            .await
            .expect("collect");

        assert_eq!(output.text, "```html\n<h1>Contoso</h1>\n```");
        assert_eq!(output.html().as_deref(), Some("<h1>Contoso</h1>"));
        assert_eq!(output.finish_reason.as_deref(), Some("stop"));
        let usage = output.usage.expect("usage");
        assert_eq!(usage.count("total_tokens"), Some(48));

        let request = server.await.expect("server");
        assert!(request.starts_with("POST /chat/completions HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer test-token"));
        assert!(request.contains("\"stream\":true"));
        assert!(request.contains("\"max_tokens\":256"));
        assert!(request.contains("data:image/jpeg;base64,/9j/"));
    }

    #[tokio::test]
    async fn http_error_status_is_a_provider_failure() {
        let (endpoint, _server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\ncontent-type: application/json\r\ncontent-length: 27\r\nconnection: close\r\n\r\n{\"error\":\"bad credentials\"}"
                .to_string(),
        )
        .await;
        let result = harness_for(&endpoint)
            .run(ModelRef::new(AZURE_INFERENCE_PROVIDER, "gpt-4o"))
            .user_text("hi")
            .collect_text()
            .await;
        assert!(matches!(
            result,
            Err(HarnessError::RunFailed(RunFailure::Provider { status_code: Some(401), ref message, .. })) if message.contains("bad credentials")
        ));
    }

    #[tokio::test]
    async fn json_success_body_is_a_shape_failure() {
        let (endpoint, _server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}"
                .to_string(),
        )
        .await;
        let result = harness_for(&endpoint)
            .run(ModelRef::new(AZURE_INFERENCE_PROVIDER, "gpt-4o"))
            .user_text("hi")
            .collect_text()
            .await;
        assert!(matches!(
            result,
            Err(HarnessError::RunFailed(RunFailure::ResponseShape { .. }))
        ));
    }

    #[tokio::test]
    async fn malformed_frame_from_endpoint_aborts_run() {
        let (endpoint, _server) = serve_once(sse_response(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: <html>oops\n\n",
        ))
        .await;
        let result = harness_for(&endpoint)
            .run(ModelRef::new(AZURE_INFERENCE_PROVIDER, "gpt-4o"))
            .user_text("hi")
            .collect_text()
            .await;
        assert!(matches!(
            result,
            Err(HarnessError::RunFailed(RunFailure::MalformedEvent { .. }))
        ));
    }

    #[tokio::test]
    async fn env_gated_smoke_collect_text_if_token_present() {
        if std::env::var(super::super::TOKEN_ENV)
            .unwrap_or_default()
            .trim()
            .is_empty()
        {
            eprintln!("skipping Azure AI Inference smoke test (GITHUB_TOKEN missing)");
            return;
        }

        let harness = Harness::builder()
            .register_provider(Arc::new(AzureInferenceProvider::from_env().expect("provider")))
            .build()
            .expect("harness");

        let result = harness
            .run(ModelRef::new(AZURE_INFERENCE_PROVIDER, "gpt-4o-mini"))
            .timeout(std::time::Duration::from_secs(60))
            .system_prompt("Return exactly the word: ok")
            .user_text("ok")
            .collect_output()
            .await;

        assert!(result.is_ok(), "smoke run failed: {result:?}");
    }
}
