use super::models::{
    NormalizedEvent, RawEventRecord, FIELD_DATE, FIELD_DESCRIPTION, FIELD_END_TIME,
    FIELD_EVENT_NAME, FIELD_LOCATION, FIELD_ORGANIZER, FIELD_START_TIME, UNNAMED_EVENT,
};
use chrono::NaiveDateTime;
use tracing::debug;
use uuid::Uuid;

/// Date and 12-hour clock pattern the extractor is asked to follow
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// Turn one raw record into a complete event. Never fails.
pub fn normalize(raw: &RawEventRecord) -> NormalizedEvent {
    let date = raw.text_or(FIELD_DATE, "");
    let start_time = raw.text_or(FIELD_START_TIME, "");
    let end_time = raw.text_or(FIELD_END_TIME, "");

    let event = NormalizedEvent {
        title: raw.text_or(FIELD_EVENT_NAME, UNNAMED_EVENT),
        description: raw.text_or(FIELD_DESCRIPTION, ""),
        organizer: raw.text_or(FIELD_ORGANIZER, ""),
        location: raw.text_or(FIELD_LOCATION, ""),
        start: parse_date_time(&date, &start_time),
        end: parse_date_time(&date, &end_time),
        uid: Uuid::new_v4().to_string(),
    };

    debug!(
        uid = %event.uid,
        title = %event.title,
        start = ?event.start,
        end = ?event.end,
        "Normalized event"
    );

    event
}

/// Join a date and a time with a single space and parse the result
pub fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let combined = format!("{} {}", date, time);
    NaiveDateTime::parse_from_str(&combined, DATE_TIME_FORMAT).ok()
}
