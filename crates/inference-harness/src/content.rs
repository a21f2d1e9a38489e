use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;

/// MIME type assumed when an image is attached without one.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Input content for the user turn of a run, in the order it is sent.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum InputPart {
    /// Plain text instruction.
    Text(String),
    /// Inline image, sent as a base64 data URI.
    Image(ImageInput),
}

/// Raw image bytes plus the MIME type used in the data URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInput {
    pub mime_type: String,
    pub data: Bytes,
}

impl ImageInput {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn jpeg(data: impl Into<Bytes>) -> Self {
        Self::new(DEFAULT_IMAGE_MIME, data)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }
}

/// Token usage statistics reported by the server.
///
/// Metric order follows the wire. Values are kept as JSON so nested detail
/// objects some endpoints send survive untouched.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UsageRecord(serde_json::Map<String, serde_json::Value>);

impl UsageRecord {
    /// Iterates `(metric, value)` pairs in wire order.
    pub fn metrics(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, metric: &str) -> Option<&serde_json::Value> {
        self.0.get(metric)
    }

    /// Numeric metric as `u64`, when it is one.
    pub fn count(&self, metric: &str) -> Option<u64> {
        self.0.get(metric).and_then(serde_json::Value::as_u64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for UsageRecord {
    fn from(value: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(value)
    }
}

/// Final aggregated output for a completed run.
#[derive(Clone, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RunOutput {
    /// Concatenation of every streamed delta, in arrival order.
    pub text: String,
    /// Last usage record seen on the stream, if any.
    pub usage: Option<UsageRecord>,
    /// Last non-null `finish_reason` reported by a choice (for example `stop`).
    pub finish_reason: Option<String>,
}

impl RunOutput {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// First ```` ```html ```` block of the output, trimmed.
    pub fn html(&self) -> Option<String> {
        crate::extract::extract_html(&self.text)
    }
}
