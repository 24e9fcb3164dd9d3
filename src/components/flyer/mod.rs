//! Flyer extraction pipeline.
//!
//! Image bytes are sent to an [`Extractor`] once per upload and the raw
//! response is stored in a [`Session`]. Each download parses that text again,
//! normalizes every record and assembles a calendar.

pub mod calendar;
pub mod extractor;
pub mod models;
pub mod normalize;
pub mod request;
pub mod response;
pub mod session;

pub use calendar::{assemble, ICS_CONTENT_TYPE, ICS_FILENAME};
pub use extractor::{Extractor, OpenAiExtractor};
pub use models::{CalendarDocument, NormalizedEvent, RawEventRecord};
pub use normalize::normalize;
pub use request::RequestBuilder;
pub use session::{Notification, NotificationLevel, Session, SessionState, Upload};

use crate::config::Config;
use crate::error::FlyerResult;
use std::sync::Arc;

/// Parse, normalize and assemble a stored extractor response
pub fn convert(raw_text: &str) -> FlyerResult<CalendarDocument> {
    let records = response::parse(raw_text)?;
    let events = records.iter().map(normalize).collect();
    Ok(assemble(events))
}

/// Shared, read-only collaborators used by every session
#[derive(Clone)]
pub struct FlyerPipeline {
    extractor: Arc<dyn Extractor>,
    builder: RequestBuilder,
    default_credential: Option<String>,
}

impl FlyerPipeline {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        builder: RequestBuilder,
        default_credential: Option<String>,
    ) -> Self {
        Self {
            extractor,
            builder,
            default_credential,
        }
    }

    /// Pipeline talking to the configured OpenAI-compatible endpoint
    pub fn from_config(config: &Config) -> FlyerResult<Self> {
        let extractor = OpenAiExtractor::new(&config.extractor)?;
        Ok(Self::new(
            Arc::new(extractor),
            RequestBuilder::new(&config.extractor),
            config.default_credential().map(str::to_string),
        ))
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn has_default_credential(&self) -> bool {
        self.default_credential.is_some()
    }

    /// The user's credential, or the configured default when left blank.
    /// A non-blank credential is forwarded exactly as supplied.
    pub fn resolve_credential(&self, supplied: Option<&str>) -> Option<String> {
        supplied
            .filter(|credential| !credential.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.default_credential.clone())
    }
}
