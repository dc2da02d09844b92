//! Timeline documents
//!
//! A timeline is a JSON object with an `events` array:
//!
//! ```json
//! { "events": [
//!     { "type": "playthrough", "name": "intro", "time": 0.0 },
//!     { "type": "toggle", "name": "flash", "start_time": 1.0, "end_time": 2.0 }
//! ] }
//! ```
//!
//! Entries are validated in full before a [`Timeline`] is returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{Result, SequenceError};
use crate::event::{EventDecl, EventKind, PlaythroughEvent, ToggleEvent};

/// A validated list of declared events, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub events: Vec<EventDecl>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a playthrough event
    pub fn with_playthrough(mut self, name: impl Into<String>, time: f64) -> Self {
        self.events.push(PlaythroughEvent::new(name, time).into());
        self
    }

    /// Add a toggle event
    pub fn with_toggle(mut self, name: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        self.events
            .push(ToggleEvent::new(name, start_time, end_time).into());
        self
    }

    /// Read and validate a timeline file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|e| SequenceError::io(path, e))?;
        Self::from_json_str(&source)
    }

    /// Parse and validate a timeline document
    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed document
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value
            .get("events")
            .and_then(Value::as_array)
            .ok_or(SequenceError::NotAnArray("events"))?;

        let events = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_entry(index, entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { events })
    }

    /// Check every event, as a load would
    pub fn validate(&self) -> Result<()> {
        self.events.iter().try_for_each(EventDecl::validate)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn playthrough_events(&self) -> impl Iterator<Item = &PlaythroughEvent> {
        self.events.iter().filter_map(|e| match e {
            EventDecl::Playthrough(p) => Some(p),
            EventDecl::Toggle(_) => None,
        })
    }

    pub fn toggle_events(&self) -> impl Iterator<Item = &ToggleEvent> {
        self.events.iter().filter_map(|e| match e {
            EventDecl::Toggle(t) => Some(t),
            EventDecl::Playthrough(_) => None,
        })
    }

    /// Distinct event names in document order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for event in &self.events {
            if !names.contains(&event.name()) {
                names.push(event.name());
            }
        }
        names
    }

    /// Time of the last point at which anything happens
    pub fn end_time(&self) -> f64 {
        self.events
            .iter()
            .map(|e| match e {
                EventDecl::Playthrough(p) => p.time,
                EventDecl::Toggle(t) => t.end_time,
            })
            .fold(0.0, f64::max)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn parse_entry(index: usize, entry: &Value) -> Result<EventDecl> {
    let tag = entry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SequenceError::MissingField {
            field: "type",
            context: format!("event #{}", index),
        })?;

    // Unknown tags are reported as such rather than as a generic serde error
    tag.parse::<EventKind>()?;

    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| SequenceError::MissingField {
            field: "name",
            context: format!("event #{}", index),
        })?;

    let decl: EventDecl = serde_json::from_value(entry.clone())
        .map_err(|e| SequenceError::invalid_event(name, e.to_string()))?;
    decl.validate()?;
    Ok(decl)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "events": [
            { "type": "toggle", "name": "flash", "start_time": 1.0, "end_time": 2.0 },
            { "type": "playthrough", "name": "intro", "time": 0.0 }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let timeline = Timeline::from_json_str(SAMPLE).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.events[0].kind(), EventKind::Toggle);
        assert_eq!(timeline.events[1].name(), "intro");
        assert_eq!(timeline.end_time(), 2.0);
    }

    #[test]
    fn test_events_must_be_array() {
        let err = Timeline::from_json_str(r#"{ "events": { "a": 1 } }"#).unwrap_err();
        assert!(matches!(err, SequenceError::NotAnArray("events")));

        let err = Timeline::from_json_str(r#"{}"#).unwrap_err();
        assert!(matches!(err, SequenceError::NotAnArray("events")));
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = Timeline::from_json_str(
            r#"{ "events": [ { "type": "loop", "name": "x", "time": 1 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SequenceError::UnknownEventType(t) if t == "loop"));
    }

    #[test]
    fn test_missing_fields_fail() {
        let err = Timeline::from_json_str(r#"{ "events": [ { "name": "x" } ] }"#).unwrap_err();
        assert!(matches!(err, SequenceError::MissingField { field: "type", .. }));

        let err = Timeline::from_json_str(
            r#"{ "events": [ { "type": "toggle", "name": "x", "start_time": 1 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SequenceError::InvalidEvent { name, .. } if name == "x"));
    }

    #[test]
    fn test_inverted_toggle_fails() {
        let err = Timeline::from_json_str(
            r#"{ "events": [ { "type": "toggle", "name": "x", "start_time": 3, "end_time": 1 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SequenceError::InvalidEvent { .. }));
    }

    #[test]
    fn test_integer_times_accepted() {
        let timeline = Timeline::from_json_str(
            r#"{ "events": [ { "type": "playthrough", "name": "x", "time": 4 } ] }"#,
        )
        .unwrap();
        assert_eq!(timeline.playthrough_events().next().unwrap().time, 4.0);
    }

    #[test]
    fn test_builder_and_json_roundtrip() {
        let timeline = Timeline::new()
            .with_playthrough("intro", 0.0)
            .with_toggle("flash", 1.0, 2.0)
            .with_toggle("flash", 5.0, 6.0);

        assert_eq!(timeline.names(), vec!["intro", "flash"]);
        assert_eq!(timeline.toggle_events().count(), 2);

        let json = timeline.to_json_string().unwrap();
        let parsed = Timeline::from_json_str(&json).unwrap();
        assert_eq!(parsed, timeline);
    }
}
