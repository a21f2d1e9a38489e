//! Chat-completions request body.
//!
//! The wire types serialize to the `messages` form shared by OpenAI-compatible
//! chat-completions endpoints (Azure AI Inference, GitHub Models).

use crate::content::{ImageInput, InputPart};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message content: either a plain string or a non-empty list of parts.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(image: &ImageInput) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl {
                url: image.data_uri(),
            },
        }
    }
}

impl From<&InputPart> for ContentPart {
    fn from(part: &InputPart) -> Self {
        match part {
            InputPart::Text(text) => ContentPart::text(text.clone()),
            InputPart::Image(image) => ContentPart::image(image),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Builds a multi-part user message. Returns `None` for an empty part list.
    pub fn user_parts(parts: Vec<ContentPart>) -> Option<Self> {
        if parts.is_empty() {
            return None;
        }
        Some(Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

/// Sampling knobs forwarded verbatim when set.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Outbound streaming chat-completions request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub stream: bool,
    pub stream_options: StreamOptions,
    #[serde(flatten)]
    pub sampling: SamplingOptions,
}

impl ChatCompletionRequest {
    /// General form: optional system prompt, then one user message holding
    /// `parts` in order. Always streams; `include_usage` controls whether the
    /// server appends a usage chunk.
    pub fn from_parts(
        model: impl Into<String>,
        system_prompt: Option<&str>,
        parts: &[InputPart],
        include_usage: bool,
    ) -> Option<Self> {
        let user = ChatMessage::user_parts(parts.iter().map(ContentPart::from).collect())?;
        Some(Self::assemble(
            model.into(),
            system_prompt.map(ChatMessage::system),
            user,
            include_usage,
        ))
    }

    fn assemble(
        model: String,
        system: Option<ChatMessage>,
        user: ChatMessage,
        include_usage: bool,
    ) -> Self {
        Self {
            messages: system.into_iter().chain([user]).collect(),
            model,
            stream: true,
            stream_options: StreamOptions { include_usage },
            sampling: SamplingOptions::default(),
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }
}

/// System prompt plus one user turn of `[instruction, image]`, streaming with
/// usage reporting enabled.
pub fn build_vision_request(
    model: impl Into<String>,
    system_prompt: impl Into<String>,
    instruction: impl Into<String>,
    image: &ImageInput,
) -> ChatCompletionRequest {
    let user = ChatMessage {
        role: Role::User,
        content: MessageContent::Parts(vec![
            ContentPart::text(instruction),
            ContentPart::image(image),
        ]),
    };
    ChatCompletionRequest::assemble(
        model.into(),
        Some(ChatMessage::system(system_prompt)),
        user,
        true,
    )
}
