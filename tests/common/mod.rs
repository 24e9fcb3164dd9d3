#![allow(dead_code)]

use async_trait::async_trait;
use flyercal::components::flyer::models::ExtractionRequest;
use flyercal::components::flyer::{Extractor, RequestBuilder};
use flyercal::config::ExtractorSettings;
use flyercal::error::{Error, FlyerResult};
use flyercal::FlyerPipeline;
use icalendar::{Calendar, CalendarComponent, Event};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock extractor that replies with a fixed text or a fixed failure
#[derive(Debug, Default)]
pub struct MockExtractor {
    reply: Mutex<Option<Result<String, String>>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ExtractionRequest>>,
}

impl MockExtractor {
    /// Create a mock that returns the given text
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Some(Ok(text.to_string()))),
            ..Default::default()
        })
    }

    /// Create a mock whose call fails with the given message
    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Some(Err(message.to_string()))),
            ..Default::default()
        })
    }

    /// Change what the next call returns
    pub fn set_reply(&self, reply: Result<&str, &str>) {
        *self.reply.lock().unwrap() = Some(reply.map(str::to_string).map_err(str::to_string));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ExtractionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> FlyerResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match self.reply.lock().unwrap().clone() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(Error::Extractor(message)),
            None => Err(Error::Extractor("no reply configured".to_string())),
        }
    }
}

/// Pipeline wired to a mock extractor
pub fn pipeline(extractor: Arc<MockExtractor>, default_credential: Option<&str>) -> FlyerPipeline {
    FlyerPipeline::new(
        extractor,
        RequestBuilder::new(&ExtractorSettings::default()),
        default_credential.map(str::to_string),
    )
}

/// Parse ICS bytes back into their events
pub fn events_in(bytes: &[u8]) -> Vec<Event> {
    let text = std::str::from_utf8(bytes).unwrap();
    let calendar: Calendar = text.parse().unwrap();
    calendar
        .components
        .into_iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            _ => None,
        })
        .collect()
}
