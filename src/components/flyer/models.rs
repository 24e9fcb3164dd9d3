use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Placeholder title for events the extractor did not name
pub const UNNAMED_EVENT: &str = "Unnamed Event";

/// Field names the extractor is asked to produce
pub const FIELD_EVENT_NAME: &str = "event name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_ORGANIZER: &str = "organizer";
pub const FIELD_LOCATION: &str = "location";
pub const FIELD_DATE: &str = "date";
pub const FIELD_START_TIME: &str = "start time";
pub const FIELD_END_TIME: &str = "end time";

/// One untrusted event record as returned by the extractor.
///
/// Wraps whatever JSON value the extractor produced for a single event. The
/// value is usually an object, but nothing is guaranteed, so every read goes
/// through [`RawEventRecord::text`] which treats anything unexpected as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEventRecord(Value);

impl RawEventRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON value
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Read a field as text, or `None` when it is missing or `null`
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Read a field as text, falling back to `default`
    pub fn text_or(&self, field: &str, default: &str) -> String {
        self.text(field).unwrap_or_else(|| default.to_string())
    }
}

impl From<Value> for RawEventRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Validated internal form of one extracted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub title: String,
    pub description: String,
    pub organizer: String,
    pub location: String,
    /// Start, only when date and start time parsed
    pub start: Option<NaiveDateTime>,
    /// End, only when date and end time parsed
    pub end: Option<NaiveDateTime>,
    /// Freshly generated identifier, never derived from content
    pub uid: String,
}

/// Ordered events plus calendar-level metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDocument {
    /// Calendar display name
    pub name: String,
    pub events: Vec<NormalizedEvent>,
}

impl CalendarDocument {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Image reference inside a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multi-part user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Message body, either plain text or a list of parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Everything needed for one extractor call.
///
/// The credential travels with the request but is skipped when the request is
/// serialized as the JSON body.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionRequest {
    #[serde(skip)]
    pub credential: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl ExtractionRequest {
    /// The image data URI carried by the user message, if any
    pub fn image_url(&self) -> Option<&str> {
        self.messages.iter().find_map(|message| match &message.content {
            MessageContent::Parts(parts) => parts.iter().find_map(|part| match part {
                ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
                ContentPart::Text { .. } => None,
            }),
            MessageContent::Text(_) => None,
        })
    }
}

impl fmt::Debug for ExtractionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionRequest")
            .field("credential", &"<redacted>")
            .field("model", &self.model)
            .field("messages", &self.messages.len())
            .field("image_url_len", &self.image_url().map(str::len))
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
