//! Declared sequence events

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SequenceError};

/// Kind of a declared event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Fires once at a point in time
    Playthrough,
    /// Active over a closed time interval
    Toggle,
}

impl EventKind {
    /// Tag used in timeline documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playthrough => "playthrough",
            Self::Toggle => "toggle",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "playthrough" => Ok(Self::Playthrough),
            "toggle" => Ok(Self::Toggle),
            other => Err(SequenceError::UnknownEventType(other.to_string())),
        }
    }
}

/// A named occurrence fired once, at the first tick where `t >= time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaythroughEvent {
    pub name: String,
    pub time: f64,
}

impl PlaythroughEvent {
    pub fn new(name: impl Into<String>, time: f64) -> Self {
        Self {
            name: name.into(),
            time,
        }
    }
}

/// A named occurrence active while `start_time <= t <= end_time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleEvent {
    pub name: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl ToggleEvent {
    pub fn new(name: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            name: name.into(),
            start_time,
            end_time,
        }
    }

    /// Closed-interval activity predicate
    pub fn is_active(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }

    /// Length of the activity window
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

impl fmt::Display for ToggleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event: {} ({}, {})", self.name, self.start_time, self.end_time)
    }
}

/// A timeline entry, tagged by `"type"` in documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventDecl {
    Playthrough(PlaythroughEvent),
    Toggle(ToggleEvent),
}

impl EventDecl {
    pub fn name(&self) -> &str {
        match self {
            Self::Playthrough(e) => &e.name,
            Self::Toggle(e) => &e.name,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Playthrough(_) => EventKind::Playthrough,
            Self::Toggle(_) => EventKind::Toggle,
        }
    }

    /// Earliest time at which the event has any effect
    pub fn start_time(&self) -> f64 {
        match self {
            Self::Playthrough(e) => e.time,
            Self::Toggle(e) => e.start_time,
        }
    }

    /// Check times are usable for dispatch
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Playthrough(e) => {
                if !e.time.is_finite() {
                    return Err(SequenceError::invalid_event(&e.name, "time must be finite"));
                }
            }
            Self::Toggle(e) => {
                if !e.start_time.is_finite() || !e.end_time.is_finite() {
                    return Err(SequenceError::invalid_event(
                        &e.name,
                        "start_time and end_time must be finite",
                    ));
                }
                if e.start_time > e.end_time {
                    return Err(SequenceError::invalid_event(
                        &e.name,
                        format!(
                            "start_time {} is after end_time {}",
                            e.start_time, e.end_time
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl From<PlaythroughEvent> for EventDecl {
    fn from(e: PlaythroughEvent) -> Self {
        Self::Playthrough(e)
    }
}

impl From<ToggleEvent> for EventDecl {
    fn from(e: ToggleEvent) -> Self {
        Self::Toggle(e)
    }
}

/// Stable handle to a toggle event within one scheduler generation
///
/// The handle is the event's index in the sorted toggle list, so two toggle
/// events with identical name and times still get independent signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToggleHandle(pub(crate) usize);

impl ToggleHandle {
    /// Index into the sorted toggle list
    pub fn index(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_interval_is_closed() {
        let flash = ToggleEvent::new("flash", 1.0, 2.0);

        assert!(flash.is_active(1.0));
        assert!(flash.is_active(1.5));
        assert!(flash.is_active(2.0));
        assert!(!flash.is_active(0.999));
        assert!(!flash.is_active(2.001));
    }

    #[test]
    fn test_zero_length_toggle() {
        let blink = ToggleEvent::new("blink", 3.0, 3.0);
        assert!(blink.is_active(3.0));
        assert_eq!(blink.duration(), 0.0);
        assert!(EventDecl::from(blink).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let decl = EventDecl::from(ToggleEvent::new("bad", 2.0, 1.0));
        assert!(matches!(
            decl.validate(),
            Err(SequenceError::InvalidEvent { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let decl = EventDecl::from(PlaythroughEvent::new("nan", f64::NAN));
        assert!(decl.validate().is_err());
    }

    #[test]
    fn test_tagged_serialization() {
        let decl = EventDecl::from(PlaythroughEvent::new("intro", 0.5));
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["type"], "playthrough");
        assert_eq!(json["name"], "intro");
        assert_eq!(json["time"], 0.5);

        let decl = EventDecl::from(ToggleEvent::new("flash", 1.0, 2.0));
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["type"], "toggle");
        assert_eq!(json["start_time"], 1.0);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("toggle".parse::<EventKind>().unwrap(), EventKind::Toggle);
        assert!(matches!(
            "loop".parse::<EventKind>(),
            Err(SequenceError::UnknownEventType(t)) if t == "loop"
        ));
    }
}
