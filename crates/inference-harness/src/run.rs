use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt as _;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::accumulate::{AccumulateError, ResponseAccumulator, Step};
use crate::content::{ImageInput, InputPart, RunOutput};
use crate::errors::{HarnessError, ProviderError, RunFailure, run_failure_from_provider_error};
use crate::harness::HarnessInner;
use crate::model::{ModelRef, ProviderId, RunOptions};
use crate::provider::{ProviderAdapter, ProviderRequest};
use crate::stream::StreamEvent;

/// Builder for configuring and starting a single streaming completion.
///
/// Collects the system prompt, the ordered user input parts, and run options,
/// then either hands back a `RunStream` or drives the run to completion.
pub struct RunBuilder {
    harness: Arc<HarnessInner>,
    model: ModelRef,
    system_prompt: Option<String>,
    input_parts: Vec<InputPart>,
    options: RunOptions,
    vendor_options: HashMap<ProviderId, serde_json::Value>,
}

impl RunBuilder {
    pub(crate) fn new(harness: Arc<HarnessInner>, model: ModelRef) -> Self {
        Self {
            harness,
            model,
            system_prompt: None,
            input_parts: Vec::new(),
            options: RunOptions::default(),
            vendor_options: HashMap::new(),
        }
    }

    pub fn system_prompt(mut self, text: impl Into<String>) -> Self {
        self.system_prompt = Some(text.into());
        self
    }

    /// Appends a text part to the user turn.
    pub fn user_text(mut self, text: impl Into<String>) -> Self {
        self.input_parts.push(InputPart::Text(text.into()));
        self
    }

    /// Appends an inline image part to the user turn.
    pub fn user_image(mut self, image: ImageInput) -> Self {
        self.input_parts.push(InputPart::Image(image));
        self
    }

    /// Replaces all input parts with the provided list.
    pub fn input_parts(mut self, parts: Vec<InputPart>) -> Self {
        self.input_parts = parts;
        self
    }

    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn stream_buffer_capacity(mut self, capacity: usize) -> Self {
        self.options.stream_buffer_capacity = capacity;
        self
    }

    pub(crate) fn set_vendor_options_json(
        mut self,
        provider: ProviderId,
        value: serde_json::Value,
    ) -> Self {
        self.vendor_options.insert(provider, value);
        self
    }

    #[cfg(test)]
    pub(crate) fn vendor_options_value(&self, provider: &ProviderId) -> Option<&serde_json::Value> {
        self.vendor_options.get(provider)
    }

    /// Validates the builder and starts the run.
    ///
    /// Events arrive as `RunStarted`, zero or more `OutputDelta`, then exactly
    /// one `Completed` or `Error`. Dropping the returned stream abandons the
    /// run and closes the HTTP response.
    pub async fn start_stream(self) -> Result<RunStream, HarnessError> {
        let harness = self.harness.clone();
        let request = self.validate_and_build_request()?;
        let provider = harness
            .provider(&request.model.provider)
            .ok_or_else(|| HarnessError::ProviderNotFound {
                provider: request.model.provider.clone(),
            })?;

        let (tx, rx) = mpsc::channel(request.options.stream_buffer_capacity);
        let (final_tx, final_rx) = oneshot::channel();

        let run_id = request.run_id;
        let model = request.model.clone();
        tokio::spawn(run_task(provider, request, tx, final_tx));

        Ok(RunStream {
            run_id,
            model,
            rx,
            final_rx,
            saw_terminal: false,
        })
    }

    /// Runs to completion and returns the accumulated output.
    pub async fn collect_output(self) -> Result<RunOutput, HarnessError> {
        let stream = self.start_stream().await?;
        stream.finish().await
    }

    pub async fn collect_text(self) -> Result<String, HarnessError> {
        Ok(self.collect_output().await?.text)
    }

    fn validate_and_build_request(self) -> Result<ProviderRequest, HarnessError> {
        if self.model.provider.as_str().trim().is_empty() {
            return Err(HarnessError::Validation(
                "model provider must not be empty".into(),
            ));
        }
        if self.model.model.trim().is_empty() {
            return Err(HarnessError::Validation("model must not be empty".into()));
        }
        if self.options.stream_buffer_capacity == 0 {
            return Err(HarnessError::Validation(
                "stream_buffer_capacity must be greater than 0".into(),
            ));
        }
        if self
            .system_prompt
            .as_deref()
            .is_some_and(|prompt| prompt.trim().is_empty())
        {
            return Err(HarnessError::Validation(
                "system prompt must not be blank".into(),
            ));
        }
        if self.input_parts.is_empty() {
            return Err(HarnessError::Validation(
                "at least one input part is required".into(),
            ));
        }
        for part in &self.input_parts {
            match part {
                InputPart::Text(text) if text.trim().is_empty() => {
                    return Err(HarnessError::Validation(
                        "text input must not be empty".into(),
                    ));
                }
                InputPart::Image(image) if image.data.is_empty() => {
                    return Err(HarnessError::Validation(
                        "image input must not be empty".into(),
                    ));
                }
                InputPart::Image(image) if !image.mime_type.starts_with("image/") => {
                    return Err(HarnessError::Validation(format!(
                        "unsupported image MIME type: {}",
                        image.mime_type
                    )));
                }
                _ => {}
            }
        }

        Ok(ProviderRequest {
            run_id: uuid::Uuid::new_v4(),
            model: self.model,
            system_prompt: self.system_prompt,
            input_parts: self.input_parts,
            options: self.options,
            vendor_options: self.vendor_options,
        })
    }
}

/// Streaming handle returned by `RunBuilder::start_stream`.
///
/// Use `next_event()` to consume events as they arrive and `finish()` to obtain
/// the final result after the terminal event.
pub struct RunStream {
    run_id: uuid::Uuid,
    model: ModelRef,
    rx: mpsc::Receiver<StreamEvent>,
    final_rx: oneshot::Receiver<Result<RunOutput, HarnessError>>,
    saw_terminal: bool,
}

impl RunStream {
    pub fn run_id(&self) -> uuid::Uuid {
        self.run_id
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Waits for the next event. Returns `None` once the run task has finished.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let event = self.rx.recv().await;
        if event.as_ref().is_some_and(StreamEvent::is_terminal) {
            self.saw_terminal = true;
        }
        event
    }

    /// Drains remaining events (if any) and returns the terminal result.
    pub async fn finish(mut self) -> Result<RunOutput, HarnessError> {
        while !self.saw_terminal {
            match self.rx.recv().await {
                Some(event) if event.is_terminal() => self.saw_terminal = true,
                Some(_) => {}
                None => break,
            }
        }

        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(HarnessError::protocol_msg(format!(
                "run task ended without final result (model={})",
                self.model
            ))),
        }
    }
}

type FinalSender = oneshot::Sender<Result<RunOutput, HarnessError>>;

async fn run_task(
    provider: Arc<dyn ProviderAdapter>,
    request: ProviderRequest,
    tx: mpsc::Sender<StreamEvent>,
    final_tx: FinalSender,
) {
    let run_id = request.run_id;
    let provider_id = request.model.provider.clone();
    let model_name = request.model.model.clone();

    if !send_event(
        &tx,
        StreamEvent::RunStarted {
            run_id,
            provider: provider_id.clone(),
            model: model_name.clone(),
        },
    )
    .await
    {
        let _ = final_tx.send(Err(HarnessError::protocol_msg(
            "run stream receiver dropped before RunStarted",
        )));
        return;
    }

    let mut handle = match provider.start_stream(request).await {
        Ok(handle) => handle,
        Err(err) => {
            warn!(run_id = %run_id, provider = %provider_id, error = %err, "completion request failed");
            fail_run(&tx, final_tx, run_id, run_failure_from_provider_error(&err)).await;
            return;
        }
    };
    debug!(
        run_id = %run_id,
        status = ?handle.metadata.status_code,
        request_id = ?handle.metadata.request_id,
        "completion stream opened"
    );

    let mut accumulator = ResponseAccumulator::new();
    let mut seq = 0_u64;
    loop {
        tokio::select! {
            _ = tx.closed() => {
                debug!(run_id = %run_id, "run stream dropped by consumer; closing response");
                return;
            }
            next = handle.frames.next() => {
                match next {
                    Some(Ok(frame)) => match accumulator.apply(&frame) {
                        Ok(Step::Continue(fragments)) => {
                            for text in fragments {
                                if text.is_empty() {
                                    continue;
                                }
                                debug!(run_id = %run_id, model = %model_name, seq, "output delta");
                                if !send_event(&tx, StreamEvent::OutputDelta { run_id, seq, text }).await {
                                    let _ = final_tx.send(Err(HarnessError::protocol_msg("run stream receiver dropped during output")));
                                    return;
                                }
                                seq = seq.saturating_add(1);
                            }
                        }
                        Ok(Step::Finished) => break,
                        Err(err) => {
                            warn!(run_id = %run_id, provider = %provider_id, error = %err, "aborting run on bad event");
                            let failure = match err {
                                AccumulateError::MalformedEvent(message) => run_failure_from_provider_error(
                                    &ProviderError::malformed_event(provider_id.clone(), message),
                                ),
                                AccumulateError::Closed => RunFailure::Protocol {
                                    message: AccumulateError::Closed.to_string(),
                                },
                            };
                            fail_run(&tx, final_tx, run_id, failure).await;
                            return;
                        }
                    },
                    Some(Err(err)) => {
                        warn!(run_id = %run_id, provider = %provider_id, error = %err, "completion stream failed");
                        fail_run(&tx, final_tx, run_id, run_failure_from_provider_error(&err)).await;
                        return;
                    }
                    None => break,
                }
            }
        }
    }
    drop(handle);

    let output = accumulator.finish();
    info!(
        run_id = %run_id,
        model = %model_name,
        deltas = seq,
        chars = output.text.len(),
        usage = output.usage.is_some(),
        "completion finished"
    );
    let sent = send_event(
        &tx,
        StreamEvent::Completed {
            run_id,
            output: output.clone(),
        },
    )
    .await;
    let _ = final_tx.send(if sent {
        Ok(output)
    } else {
        Err(HarnessError::protocol_msg(
            "run stream receiver dropped before completion",
        ))
    });
}

async fn fail_run(
    tx: &mpsc::Sender<StreamEvent>,
    final_tx: FinalSender,
    run_id: uuid::Uuid,
    failure: RunFailure,
) {
    let _ = send_event(
        tx,
        StreamEvent::Error {
            run_id,
            error: failure.clone(),
        },
    )
    .await;
    let _ = final_tx.send(Err(HarnessError::run_failed(failure)));
}

async fn send_event(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> bool {
    tx.send(event).await.is_ok()
}
