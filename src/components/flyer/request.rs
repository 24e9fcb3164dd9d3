use super::models::{
    ChatMessage, ContentPart, ExtractionRequest, ImageUrl, MessageContent, Role,
};
use crate::config::ExtractorSettings;
use crate::error::{input_missing, FlyerResult};
use base64::engine::{general_purpose::STANDARD, Engine};
use std::path::Path;
use tracing::{info, warn};

/// Image extensions the upload form advertises
pub const ACCEPTED_FORMATS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Persona given to the extractor
pub const SYSTEM_PROMPT: &str = "You are a highly proficient assistant tasked parsing event flyer photos for information. You parse data and return JSON.";

/// Instructions sent alongside the flyer image
pub const USER_PROMPT: &str = r#"Analyze this event flyer and extract the event information. Format the response as JSON.
Ensure there are fields for "date", "start time", "end time", "description", "organizer", "event name", and "location" in the JSON response.
- Use the YYYY-MM-DD format for dates.
- Ensure that %I:%M %p format is used for times (for example 06:30 PM).
- Assume it is this year if no year provided.
- Nothing else but JSON in the response. Do not include ```json ``` (triple tick marks).
- There might be more than one event on a flyer.
- For the JSON, contain the events inside an array called "events".
- Ensure it is compliant with JSON rules."#;

/// Builds the extractor request for one flyer image
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    model: String,
    max_tokens: u32,
}

impl RequestBuilder {
    pub fn new(settings: &ExtractorSettings) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        }
    }

    /// Build the system + user messages with the image embedded as a data URI
    pub fn build_request(
        &self,
        image_bytes: &[u8],
        image_format: &str,
        credential: &str,
    ) -> ExtractionRequest {
        let url = image_data_uri(image_bytes, image_format);
        info!(
            bytes = image_bytes.len(),
            format = image_format,
            model = %self.model,
            "Building extraction request"
        );

        ExtractionRequest {
            credential: credential.to_string(),
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: Role::User,
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: USER_PROMPT.to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl { url },
                        },
                    ]),
                },
            ],
            max_tokens: self.max_tokens,
        }
    }
}

/// `data:image/<format>;base64,<payload>`
pub fn image_data_uri(image_bytes: &[u8], image_format: &str) -> String {
    format!(
        "data:image/{};base64,{}",
        image_format,
        STANDARD.encode(image_bytes)
    )
}

/// Work out the data URI format tag for an upload.
///
/// Uses the lowercased file extension when there is one, otherwise sniffs
/// the bytes.
pub fn image_format_for(filename: &str, image_bytes: &[u8]) -> FlyerResult<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .filter(|ext| !ext.is_empty());

    if let Some(extension) = extension {
        if !ACCEPTED_FORMATS.contains(&extension.as_str()) {
            warn!(format = %extension, "Uploaded file has an unexpected image extension");
        }
        return Ok(extension);
    }

    let guessed = image::guess_format(image_bytes)
        .map_err(|_| input_missing("Unsupported image format"))?;
    guessed
        .extensions_str()
        .first()
        .map(|ext| ext.to_string())
        .ok_or_else(|| input_missing("Unsupported image format"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0];

    fn builder() -> RequestBuilder {
        RequestBuilder::new(&ExtractorSettings::default())
    }

    #[test]
    fn test_data_uri_is_base64_tagged_with_format() {
        assert_eq!(image_data_uri(b"hello", "png"), "data:image/png;base64,aGVsbG8=");
        assert_eq!(image_data_uri(b"", "jpg"), "data:image/jpg;base64,");
    }

    #[test]
    fn test_request_has_system_and_user_parts() {
        let request = builder().build_request(b"hello", "jpeg", "sk-test");

        assert_eq!(request.credential, "sk-test");
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 450);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(
            request.messages[0].content,
            MessageContent::Text(SYSTEM_PROMPT.to_string())
        );
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.image_url(), Some("data:image/jpeg;base64,aGVsbG8="));

        match &request.messages[1].content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(&parts[0], ContentPart::Text { text } if text == USER_PROMPT));
            }
            other => panic!("unexpected user content: {:?}", other),
        }
    }

    #[test]
    fn test_user_prompt_names_every_field() {
        for field in [
            "\"date\"",
            "\"start time\"",
            "\"end time\"",
            "\"description\"",
            "\"organizer\"",
            "\"event name\"",
            "\"location\"",
            "\"events\"",
        ] {
            assert!(USER_PROMPT.contains(field), "prompt is missing {}", field);
        }
        assert!(USER_PROMPT.contains("%I:%M %p"));
    }

    #[test]
    fn test_max_tokens_follows_settings() {
        let settings = ExtractorSettings {
            max_tokens: 2000,
            model: "gpt-4o".to_string(),
            ..ExtractorSettings::default()
        };
        let request = RequestBuilder::new(&settings).build_request(b"x", "png", "k");
        assert_eq!(request.max_tokens, 2000);
        assert_eq!(request.model, "gpt-4o");
    }

    #[test]
    fn test_format_from_extension_is_lowercased() {
        assert_eq!(image_format_for("flyer.JPG", b"").unwrap(), "jpg");
        assert_eq!(image_format_for("dir.v2/flyer.Png", b"").unwrap(), "png");
        assert_eq!(image_format_for("flyer.jpeg", b"").unwrap(), "jpeg");
    }

    #[test]
    fn test_format_sniffed_without_extension() {
        assert_eq!(image_format_for("flyer", PNG_MAGIC).unwrap(), "png");
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = image_format_for("flyer", b"plain text").unwrap_err();
        assert!(matches!(err, Error::InputMissing(_)));
    }
}
