use super::request::image_format_for;
use super::FlyerPipeline;
use crate::error::{input_missing, Error, FlyerResult};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Status shown before anything was extracted
pub const EMPTY_STATUS: &str = "Upload an image to extract event information.";
/// Label placed above the raw extractor response
pub const EXTRACTED_LABEL: &str = "Extracted Event Information:";

pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image first.";
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Please enter your OpenAI API key.";
pub const IMAGE_READ_MESSAGE: &str = "Image read successfully.";

/// What a session currently holds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Empty,
    /// Raw extractor response, stored verbatim
    Extracted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A short message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Where the uploaded bytes live
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Already in memory, as received from a form
    Bytes(Vec<u8>),
    /// On disk, read when the upload is processed
    Path(PathBuf),
}

/// An uploaded flyer image
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original filename, used to tag the image format
    pub filename: String,
    pub source: UploadSource,
}

impl Upload {
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            source: UploadSource::Bytes(bytes),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            filename,
            source: UploadSource::Path(path),
        }
    }

    /// Read the image bytes
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            UploadSource::Bytes(bytes) => Ok(bytes.clone()),
            UploadSource::Path(path) => tokio::fs::read(path).await,
        }
    }
}

/// Per-user state: the stored extraction plus pending notifications.
///
/// `Empty -> Extracted(text)` happens on a successful upload. Downloads are
/// recomputed from the stored text every time and never change the state.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    notifications: Vec<Notification>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The stored raw response, if any
    pub fn raw_text(&self) -> Option<&str> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Extracted(text) => Some(text),
        }
    }

    /// Human-readable status for the current state
    pub fn status_text(&self) -> String {
        match &self.state {
            SessionState::Empty => EMPTY_STATUS.to_string(),
            SessionState::Extracted(text) => format!("{}\n{}", EXTRACTED_LABEL, text),
        }
    }

    pub fn notify(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => info!(message = %notification.message, "Notification"),
            NotificationLevel::Error => warn!(message = %notification.message, "Notification"),
        }
        self.notifications.push(notification);
    }

    /// Drain notifications that have not been shown yet
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Handle a new upload. Returns whether the state moved to `Extracted`.
    ///
    /// Every failure is turned into an error notification and leaves the
    /// current state untouched.
    pub async fn upload(
        &mut self,
        pipeline: &FlyerPipeline,
        upload: Option<Upload>,
        credential: Option<&str>,
    ) -> bool {
        match self.extract(pipeline, upload, credential).await {
            Ok(raw_text) => {
                info!(chars = raw_text.len(), "Stored extractor response");
                self.state = SessionState::Extracted(raw_text);
                true
            }
            Err(err) => {
                error!("Extraction failed: {}", err);
                self.notify(Notification::error(upload_error_message(&err)));
                false
            }
        }
    }

    async fn extract(
        &mut self,
        pipeline: &FlyerPipeline,
        upload: Option<Upload>,
        credential: Option<&str>,
    ) -> FlyerResult<String> {
        let upload = upload.ok_or_else(|| input_missing(MISSING_IMAGE_MESSAGE))?;
        let credential = pipeline
            .resolve_credential(credential)
            .ok_or_else(|| input_missing(MISSING_CREDENTIAL_MESSAGE))?;

        let image_bytes = upload.read().await?;
        self.notify(Notification::info(IMAGE_READ_MESSAGE));

        let format = image_format_for(&upload.filename, &image_bytes)?;
        let request = pipeline
            .builder()
            .build_request(&image_bytes, &format, &credential);

        pipeline.extractor().extract(&request).await
    }

    /// Produce the calendar file for the stored extraction.
    ///
    /// `None` when nothing was extracted yet or the stored text is not valid
    /// JSON; the latter is logged and the raw text stays visible in the status.
    pub fn download(&self) -> Option<Vec<u8>> {
        let raw_text = self.raw_text()?;
        match super::convert(raw_text) {
            Ok(document) => {
                info!(events = document.len(), "Prepared calendar download");
                Some(document.to_bytes())
            }
            Err(err) => {
                error!("Error decoding JSON: {}", err);
                None
            }
        }
    }
}

fn upload_error_message(err: &Error) -> String {
    match err {
        Error::InputMissing(message) => message.clone(),
        Error::Io(e) => format!("Error reading the image file: {}", e),
        other => format!("Error: {}", other),
    }
}
