//! Event records as published upstream and as served to clients.
//!
//! [`RawEventRecord`] mirrors the scraper's JSON output field for field.
//! [`Event`] is the normalized form handed out by the API; it is built once
//! per refresh by [`Event::from_raw`] and never mutated afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use time::PrimitiveDateTime;

use crate::error::Result;
use crate::id::derive_event_id;
use crate::time::parse_local_date_time;

/// Raw event data as found in the release asset.
///
/// Every field is optional on the wire: missing keys and `null` values both
/// become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_display: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub month: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub weekday: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub start_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub end_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub organizer: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A served event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date_display: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub organizer: String,
    pub description: String,
    pub url: String,
    pub is_upcoming: bool,
}

impl Event {
    /// Normalize a raw record, evaluating `is_upcoming` against `now`.
    pub fn from_raw(raw: RawEventRecord, now: PrimitiveDateTime) -> Self {
        let id = match raw.event_id {
            Some(id) if !id.is_empty() => id,
            _ => derive_event_id(&raw.title, &raw.start_date),
        };
        let date_display = compose_date_display(&raw.date_display, &raw.month, &raw.weekday);
        let is_upcoming = starts_after(&raw.start_date, now);

        Self {
            id,
            title: raw.title,
            date_display,
            start_date: raw.start_date,
            end_date: raw.end_date,
            location: raw.location,
            organizer: raw.organizer,
            description: raw.description,
            url: raw.url,
            is_upcoming,
        }
    }
}

/// `"<day> <month> (<weekday>)"`.
///
/// The scraper's `date_display` usually already contains the month, so the
/// result repeats it (`"07 nov. nov. (jeu.)"`). Clients rely on this exact
/// string.
pub fn compose_date_display(day: &str, month: &str, weekday: &str) -> String {
    format!("{day} {month} ({weekday})")
}

fn starts_after(start_date: &str, now: PrimitiveDateTime) -> bool {
    parse_local_date_time(start_date)
        .map(|start| start > now)
        .unwrap_or(false)
}

/// Transform a whole batch against a single reference time, preserving order.
pub fn transform_records(records: Vec<RawEventRecord>, now: PrimitiveDateTime) -> Vec<Event> {
    records
        .into_iter()
        .map(|raw| Event::from_raw(raw, now))
        .collect()
}

/// Parse a release asset body into raw records.
///
/// An empty body or a JSON `null` is a valid, empty feed.
pub fn parse_raw_events(body: &[u8]) -> Result<Vec<RawEventRecord>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let records: Option<Vec<RawEventRecord>> = serde_json::from_slice(body)?;
    Ok(records.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use serde_json::json;
    use time::macros::datetime;

    const NOW: PrimitiveDateTime = datetime!(2025-06-01 12:00:00);

    fn raw(title: &str, start_date: &str) -> RawEventRecord {
        RawEventRecord {
            date_display: "07 nov.".into(),
            month: "nov.".into(),
            weekday: "jeu.".into(),
            title: title.into(),
            url: "https://srrc.ch/events/1".into(),
            event_id: None,
            location: "Lausanne".into(),
            start_date: start_date.into(),
            end_date: "2099-11-07T18:00:00".into(),
            description: "Soirée rock".into(),
            organizer: "SRRC".into(),
        }
    }

    #[test]
    fn test_end_to_end_example_record() {
        let record: RawEventRecord = serde_json::from_value(json!({
            "date_display": "07 nov.",
            "month": "nov.",
            "weekday": "jeu.",
            "title": "Test Event",
            "url": "https://test.com",
            "event_id": "",
            "location": "Test City",
            "start_date": "2099-11-07T10:00:00",
            "end_date": "2099-11-07T18:00:00",
            "description": "Test description",
            "organizer": "Test Org"
        }))
        .unwrap();

        let event = Event::from_raw(record, NOW);

        assert_eq!(event.id, "20991107-test-event");
        assert_eq!(event.date_display, "07 nov. nov. (jeu.)");
        assert!(event.is_upcoming);
        assert_eq!(event.title, "Test Event");
        assert_eq!(event.start_date, "2099-11-07T10:00:00");
        assert_eq!(event.end_date, "2099-11-07T18:00:00");
        assert_eq!(event.location, "Test City");
        assert_eq!(event.organizer, "Test Org");
        assert_eq!(event.description, "Test description");
        assert_eq!(event.url, "https://test.com");
    }

    #[test]
    fn test_upstream_id_is_reused_verbatim() {
        let mut record = raw("Test Event", "2099-11-07T10:00:00");
        record.event_id = Some("EVT-42".into());
        assert_eq!(Event::from_raw(record, NOW).id, "EVT-42");
    }

    #[test]
    fn test_past_event_is_not_upcoming() {
        let event = Event::from_raw(raw("Old", "2020-01-01T10:00:00"), NOW);
        assert!(!event.is_upcoming);
    }

    #[test]
    fn test_event_starting_now_is_not_upcoming() {
        let event = Event::from_raw(raw("Now", "2025-06-01T12:00:00"), NOW);
        assert!(!event.is_upcoming);
    }

    #[test]
    fn test_unparseable_start_date_is_not_upcoming() {
        let event = Event::from_raw(raw("Broken", "someday"), NOW);
        assert!(!event.is_upcoming);
        assert_eq!(event.start_date, "someday");
    }

    #[test]
    fn test_serialized_field_names() {
        let event = Event::from_raw(raw("Test Event", "2099-11-07T10:00:00"), NOW);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["dateDisplay"], "07 nov. nov. (jeu.)");
        assert_eq!(value["startDate"], "2099-11-07T10:00:00");
        assert_eq!(value["endDate"], "2099-11-07T18:00:00");
        assert_eq!(value["isUpcoming"], true);
    }

    #[test]
    fn test_missing_and_null_fields_become_empty() {
        let record: RawEventRecord =
            serde_json::from_value(json!({"title": "Bare", "location": null})).unwrap();
        assert_eq!(record.title, "Bare");
        assert_eq!(record.location, "");
        assert_eq!(record.event_id, None);

        let event = Event::from_raw(record, NOW);
        assert_eq!(event.id, "-bare");
        assert_eq!(event.date_display, "  ()");
        assert!(!event.is_upcoming);
    }

    #[test]
    fn test_transform_records_preserves_order() {
        let records = vec![
            raw("First", "2099-01-01T10:00:00"),
            raw("Second", "2020-01-01T10:00:00"),
            raw("Third", "2099-02-01T10:00:00"),
        ];
        let events = transform_records(records, NOW);
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
        assert_eq!(
            events.iter().map(|e| e.is_upcoming).collect::<Vec<_>>(),
            [true, false, true]
        );
    }

    #[test]
    fn test_parse_raw_events_empty_body() {
        assert!(parse_raw_events(b"").unwrap().is_empty());
        assert!(parse_raw_events(b"  \n").unwrap().is_empty());
        assert!(parse_raw_events(b"null").unwrap().is_empty());
        assert!(parse_raw_events(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_raw_events_list() {
        let body = br#"[{"title": "A", "start_date": "2099-01-01T10:00:00"}, {"title": "B"}]"#;
        let records = parse_raw_events(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "A");
        assert_eq!(records[1].title, "B");
    }

    #[test]
    fn test_parse_raw_events_malformed() {
        let err = parse_raw_events(b"{\"not\": \"a list\"}").unwrap_err();
        assert!(matches!(err, CoreError::JsonError(_)));
        assert!(parse_raw_events(b"[{").is_err());
    }
}
