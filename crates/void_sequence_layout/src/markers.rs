//! Timeline marker import
//!
//! Reads the tab-separated marker list exported by a DCC timeline:
//!
//! ```text
//! Time (s)	Marker Name
//! 0.00	grab cigs
//! 2.50	>cig burning
//! 6.00	<cig burning
//! ```
//!
//! `>` and `<` prefixes open and close a toggle; anything else is a
//! playthrough event.

use log::debug;
use void_sequence::Timeline;

use crate::error::{LayoutError, Result};
use crate::mark::{marks_to_timeline, LayoutMark, MarkAction};

const HEADER_PREFIX: &str = "Time";

/// One exported marker
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub time: f64,
    pub name: String,
    pub action: MarkAction,
}

impl Marker {
    /// Classify a raw marker name by its prefix
    pub fn new(time: f64, raw_name: &str) -> Self {
        let raw_name = raw_name.trim();
        let (action, name) = match raw_name.chars().next() {
            Some('>') => (MarkAction::ToggleOn, &raw_name[1..]),
            Some('<') => (MarkAction::ToggleOff, &raw_name[1..]),
            _ => (MarkAction::Playthrough, raw_name),
        };

        Self {
            time,
            name: name.trim().to_string(),
            action,
        }
    }
}

/// Parse a marker export. Blank lines and the header row are skipped.
pub fn parse_markers(text: &str) -> Result<Vec<Marker>> {
    let mut markers = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || (index == 0 && line.starts_with(HEADER_PREFIX)) {
            continue;
        }

        let (time, name) = line
            .split_once('\t')
            .ok_or_else(|| malformed(line_no, "expected '<time>\\t<name>'"))?;
        let time: f64 = time
            .trim()
            .parse()
            .map_err(|_| malformed(line_no, "time is not a number"))?;
        if !time.is_finite() {
            return Err(malformed(line_no, "time is not finite"));
        }

        let marker = Marker::new(time, name);
        if marker.name.is_empty() {
            return Err(malformed(line_no, "marker has no name"));
        }
        markers.push(marker);
    }

    debug!("Parsed {} markers", markers.len());
    Ok(markers)
}

/// Pair markers into a timeline
pub fn markers_to_timeline(markers: &[Marker]) -> Result<Timeline> {
    let marks: Vec<LayoutMark> = markers
        .iter()
        .map(|m| LayoutMark::new(String::new(), m.name.clone(), m.time, m.action))
        .collect();
    marks_to_timeline(&marks)
}

fn malformed(line: usize, reason: &str) -> LayoutError {
    LayoutError::MalformedMarker {
        line,
        reason: reason.to_string(),
    }
}
