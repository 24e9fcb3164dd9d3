//! Calendar assembly and ICS serialization.

use super::models::{CalendarDocument, NormalizedEvent};
use icalendar::{Calendar, Component, Event, EventLike};
use tracing::debug;

/// Filename the calendar is offered under
pub const ICS_FILENAME: &str = "itinerary.ics";
/// Content type of the serialized calendar
pub const ICS_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";
/// Display name written into the calendar wrapper
pub const CALENDAR_NAME: &str = "Event Flyer";

/// Wrap events into a calendar, keeping their order. Zero events is fine.
pub fn assemble(events: Vec<NormalizedEvent>) -> CalendarDocument {
    debug!(events = events.len(), "Assembling calendar");
    CalendarDocument {
        name: CALENDAR_NAME.to_string(),
        events,
    }
}

impl CalendarDocument {
    /// Build the iCalendar representation
    pub fn to_calendar(&self) -> Calendar {
        let mut calendar = Calendar::new();
        calendar.name(&self.name);
        for event in &self.events {
            calendar.push(to_vevent(event));
        }
        calendar.done()
    }

    /// Serialize as ICS text
    pub fn to_ics(&self) -> String {
        self.to_calendar().to_string()
    }

    /// Serialize as ICS bytes, ready to offer as a download
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_ics().into_bytes()
    }
}

fn to_vevent(event: &NormalizedEvent) -> Event {
    let mut vevent = Event::new();
    vevent
        .summary(&event.title)
        .add_property("NAME", escape_text(&event.title))
        .description(&event.description)
        .add_property("ORGANIZER", escape_text(&event.organizer))
        .location(&event.location)
        .uid(&event.uid);

    // Floating local times, the flyer carries no timezone
    if let Some(start) = event.start {
        vevent.starts(start);
    }
    if let Some(end) = event.end {
        vevent.ends(end);
    }

    vevent.done()
}

/// Escape a TEXT value for properties written through `add_property`
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\r' => {
                // CRLF counts as one line break
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("\\n");
            }
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use icalendar::{CalendarComponent, CalendarDateTime, DatePerhapsTime};

    fn event(title: &str, start: Option<NaiveDateTime>) -> NormalizedEvent {
        NormalizedEvent {
            title: title.to_string(),
            description: "Outdoor".to_string(),
            organizer: "Club".to_string(),
            location: "Park".to_string(),
            start,
            end: None,
            uid: format!("uid-{}", title),
        }
    }

    fn parsed_events(ics: &str) -> Vec<Event> {
        let calendar: Calendar = ics.parse().unwrap();
        calendar
            .components
            .into_iter()
            .filter_map(|component| match component {
                CalendarComponent::Event(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_assemble_preserves_order_and_count() {
        assert!(assemble(vec![]).is_empty());

        let single = assemble(vec![event("A", None)]);
        assert_eq!(single.len(), 1);
        assert_eq!(single.events[0].title, "A");

        let input = vec![event("C", None), event("A", None), event("B", None)];
        let doc = assemble(input.clone());
        assert_eq!(doc.events, input);
    }

    #[test]
    fn test_empty_calendar_serializes() {
        let ics = assemble(vec![]).to_ics();
        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(ics.trim_end().ends_with("END:VCALENDAR"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }

    #[test]
    fn test_event_properties_written() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        let ics = assemble(vec![event("Picnic", Some(start))]).to_ics();

        assert!(ics.contains("SUMMARY:Picnic"));
        assert!(ics.contains("NAME:Picnic"));
        assert!(ics.contains("DESCRIPTION:Outdoor"));
        assert!(ics.contains("ORGANIZER:Club"));
        assert!(ics.contains("LOCATION:Park"));
        assert!(ics.contains("UID:uid-Picnic"));
        assert!(ics.contains("DTSTART:20240615T183000"));
        assert!(!ics.contains("DTEND"));
    }

    #[test]
    fn test_events_round_trip_in_order_without_times() {
        let ics = assemble(vec![event("A", None), event("B", None)]).to_ics();
        let events = parsed_events(&ics);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get_summary(), Some("A"));
        assert_eq!(events[1].get_summary(), Some("B"));
        assert!(events.iter().all(|e| e.get_start().is_none()));
        assert!(events.iter().all(|e| e.get_end().is_none()));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("Jazz, Blues; Soul"), "Jazz\\, Blues\\; Soul");
        assert_eq!(escape_text("a\\b"), "a\\\\b");
        assert_eq!(escape_text("one\ntwo\r\nthree\rfour"), "one\\ntwo\\nthree\\nfour");
        assert_eq!(escape_text("plain"), "plain");
    }

    #[test]
    fn test_line_breaks_in_fields_cannot_add_components() {
        let mut injected = event("Gala\nEND:VEVENT\nBEGIN:VEVENT\nSUMMARY:Injected", None);
        injected.organizer = "Club\nDTSTART:19990101T000000".to_string();
        let ics = assemble(vec![injected]).to_ics();

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
        assert_eq!(ics.matches("END:VEVENT").count(), 1);
        assert!(!ics.contains("DTSTART"));
        assert!(!ics.lines().any(|line| line.starts_with("SUMMARY:Injected")));
        assert!(ics.contains("ORGANIZER:Club\\nDTSTART:19990101T000000"));
    }

    #[test]
    fn test_name_and_organizer_escape_separators() {
        let mut jazz = event("Jazz, Blues; Soul", None);
        jazz.organizer = "Smith, Jones; Co".to_string();
        let ics = assemble(vec![jazz]).to_ics();

        assert!(ics.contains("NAME:Jazz\\, Blues\\; Soul"));
        assert!(ics.contains("ORGANIZER:Smith\\, Jones\\; Co"));
    }

    #[test]
    fn test_start_is_floating_time() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        let ics = assemble(vec![event("Talk", Some(start))]).to_ics();
        let events = parsed_events(&ics);

        match events[0].get_start() {
            Some(DatePerhapsTime::DateTime(CalendarDateTime::Floating(parsed))) => {
                assert_eq!(parsed, start)
            }
            other => panic!("unexpected start: {:?}", other),
        }
    }
}
