//! Layout marks and pairing into timelines

use std::collections::{HashMap, VecDeque};
use void_sequence::{EventDecl, EventKind, PlaythroughEvent, Timeline, ToggleEvent};

use crate::error::{LayoutError, Result};

/// What a mark on the layout does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkAction {
    /// `*key`
    Playthrough,
    /// `>key`
    ToggleOn,
    /// `<key`
    ToggleOff,
}

impl MarkAction {
    pub fn symbol(&self) -> char {
        match self {
            Self::Playthrough => '*',
            Self::ToggleOn => '>',
            Self::ToggleOff => '<',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '*' => Some(Self::Playthrough),
            '>' => Some(Self::ToggleOn),
            '<' => Some(Self::ToggleOff),
            _ => None,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Playthrough => EventKind::Playthrough,
            Self::ToggleOn | Self::ToggleOff => EventKind::Toggle,
        }
    }

    // Opens sort before closes at equal times
    fn rank(&self) -> u8 {
        match self {
            Self::Playthrough | Self::ToggleOn => 0,
            Self::ToggleOff => 1,
        }
    }
}

/// A single mark at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutMark {
    pub key: String,
    pub name: String,
    pub time: f64,
    pub action: MarkAction,
}

impl LayoutMark {
    pub fn new(key: impl Into<String>, name: impl Into<String>, time: f64, action: MarkAction) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            time,
            action,
        }
    }

    /// Text drawn on an event row, e.g. `*g`
    pub fn label(&self) -> String {
        format!("{}{}", self.action.symbol(), self.key)
    }
}

/// A free-text note at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutComment {
    pub text: String,
    pub time: f64,
}

impl LayoutComment {
    pub fn new(text: impl Into<String>, time: f64) -> Self {
        Self {
            text: text.into(),
            time,
        }
    }
}

/// Check a key can be drawn and read back
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(LayoutError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Pair marks into a timeline.
///
/// Marks are taken in time order. Each `ToggleOff` closes the earliest open
/// `ToggleOn` with the same name.
pub fn marks_to_timeline(marks: &[LayoutMark]) -> Result<Timeline> {
    let mut ordered: Vec<&LayoutMark> = marks.iter().collect();
    ordered.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then(a.action.rank().cmp(&b.action.rank()))
    });

    let mut open: HashMap<&str, VecDeque<f64>> = HashMap::new();
    let mut events: Vec<EventDecl> = Vec::new();

    for mark in ordered {
        match mark.action {
            MarkAction::Playthrough => {
                events.push(PlaythroughEvent::new(&mark.name, mark.time).into());
            }
            MarkAction::ToggleOn => {
                open.entry(mark.name.as_str()).or_default().push_back(mark.time);
            }
            MarkAction::ToggleOff => {
                let start = open
                    .get_mut(mark.name.as_str())
                    .and_then(VecDeque::pop_front)
                    .ok_or_else(|| LayoutError::UnopenedToggle(mark.name.clone()))?;
                events.push(ToggleEvent::new(&mark.name, start, mark.time).into());
            }
        }
    }

    // Report the earliest open left unclosed
    let unclosed = open
        .iter()
        .filter_map(|(name, starts)| starts.front().map(|start| (*start, *name)))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    if let Some((_, name)) = unclosed {
        return Err(LayoutError::UnclosedToggle(name.to_string()));
    }

    events.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));

    let timeline = Timeline { events };
    timeline.validate()?;
    Ok(timeline)
}

/// Expand a timeline into marks, using `key_for` to pick each name's key
pub fn timeline_to_marks<F>(timeline: &Timeline, mut key_for: F) -> Result<Vec<LayoutMark>>
where
    F: FnMut(&str, EventKind) -> Result<String>,
{
    let mut marks = Vec::new();
    for event in &timeline.events {
        let key = key_for(event.name(), event.kind())?;
        match event {
            EventDecl::Playthrough(e) => {
                marks.push(LayoutMark::new(key, &e.name, e.time, MarkAction::Playthrough));
            }
            EventDecl::Toggle(e) => {
                marks.push(LayoutMark::new(&key, &e.name, e.start_time, MarkAction::ToggleOn));
                marks.push(LayoutMark::new(key, &e.name, e.end_time, MarkAction::ToggleOff));
            }
        }
    }
    Ok(marks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(name: &str, time: f64, action: MarkAction) -> LayoutMark {
        LayoutMark::new("k", name, time, action)
    }

    #[test]
    fn test_symbols() {
        for action in [MarkAction::Playthrough, MarkAction::ToggleOn, MarkAction::ToggleOff] {
            assert_eq!(MarkAction::from_symbol(action.symbol()), Some(action));
        }
        assert_eq!(MarkAction::from_symbol('~'), None);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("csb").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("Ab").is_err());
        assert!(validate_key("a1").is_err());
    }

    #[test]
    fn test_pairing() {
        let marks = vec![
            mark("burn", 3.0, MarkAction::ToggleOff),
            mark("grab", 0.0, MarkAction::Playthrough),
            mark("burn", 2.0, MarkAction::ToggleOn),
        ];
        let timeline = marks_to_timeline(&marks).unwrap();

        assert_eq!(
            timeline,
            Timeline::new()
                .with_playthrough("grab", 0.0)
                .with_toggle("burn", 2.0, 3.0)
        );
    }

    #[test]
    fn test_back_to_back_windows() {
        let marks = vec![
            mark("pulse", 1.0, MarkAction::ToggleOn),
            mark("pulse", 2.0, MarkAction::ToggleOff),
            mark("pulse", 2.0, MarkAction::ToggleOn),
            mark("pulse", 3.0, MarkAction::ToggleOff),
        ];
        let timeline = marks_to_timeline(&marks).unwrap();
        let windows: Vec<_> = timeline
            .toggle_events()
            .map(|t| (t.start_time, t.end_time))
            .collect();
        assert_eq!(windows, vec![(1.0, 2.0), (2.0, 3.0)]);
    }

    #[test]
    fn test_unpaired_toggles() {
        let err = marks_to_timeline(&[mark("x", 1.0, MarkAction::ToggleOn)]).unwrap_err();
        assert!(matches!(err, LayoutError::UnclosedToggle(n) if n == "x"));

        let err = marks_to_timeline(&[mark("x", 1.0, MarkAction::ToggleOff)]).unwrap_err();
        assert!(matches!(err, LayoutError::UnopenedToggle(n) if n == "x"));
    }

    #[test]
    fn test_earliest_unclosed_toggle_is_reported() {
        let marks = vec![
            mark("zeta", 5.0, MarkAction::ToggleOn),
            mark("gamma", 4.0, MarkAction::ToggleOn),
            mark("alpha", 3.0, MarkAction::ToggleOn),
            mark("alpha", 3.5, MarkAction::ToggleOff),
            mark("beta", 1.0, MarkAction::ToggleOn),
            mark("delta", 2.0, MarkAction::ToggleOn),
        ];

        for _ in 0..8 {
            let err = marks_to_timeline(&marks).unwrap_err();
            assert!(matches!(err, LayoutError::UnclosedToggle(n) if n == "beta"));
        }
    }

    #[test]
    fn test_timeline_to_marks() {
        let timeline = Timeline::new()
            .with_playthrough("grab", 0.0)
            .with_toggle("burn", 2.0, 3.0);
        let marks = timeline_to_marks(&timeline, |name, _| Ok(name[..1].to_string())).unwrap();

        assert_eq!(marks.len(), 3);
        assert_eq!(marks[0].label(), "*g");
        assert_eq!(marks[1].label(), ">b");
        assert_eq!(marks[2].label(), "<b");
        assert_eq!(marks_to_timeline(&marks).unwrap(), timeline);
    }
}
