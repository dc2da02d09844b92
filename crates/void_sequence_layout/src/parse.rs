//! Layout parsing
//!
//! Reads a rendered (or hand-edited) layout back into marks. Each block
//! between separator rows needs a timeline ruler and a frame row; mark times
//! are the block's frame offset plus the mark's column over the ruler's
//! subdivisions.

use log::{debug, trace};
use void_sequence::Timeline;

use crate::error::{LayoutError, Result};
use crate::legend::Legend;
use crate::mark::{marks_to_timeline, LayoutMark, MarkAction};
use crate::render::{EVENTS_PREFIX, SEPARATOR_PREFIX};

const TIMELINE_LABEL: &str = "| timeline";
const FRAME_LABEL: &str = "| frame:";

/// Marks and legend read from a layout
#[derive(Debug, Clone, Default)]
pub struct ParsedLayout {
    pub legend: Legend,
    pub marks: Vec<LayoutMark>,
}

impl ParsedLayout {
    /// Pair the marks into a timeline
    pub fn to_timeline(&self) -> Result<Timeline> {
        marks_to_timeline(&self.marks)
    }
}

/// Layout parser with an optional base legend
#[derive(Debug, Clone, Default)]
pub struct LayoutParser {
    legend: Legend,
}

impl LayoutParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys known before reading the document. The document's own legend
    /// overrides these.
    pub fn with_legend(mut self, legend: Legend) -> Self {
        self.legend = legend;
        self
    }

    pub fn parse(&self, text: &str) -> Result<ParsedLayout> {
        let mut legend = self.legend.clone();
        legend.extend(&Legend::parse(text)?);

        let mut marks = Vec::new();
        let blocks = split_blocks(text);
        for (index, block) in blocks.iter().enumerate() {
            parse_block(index, block, &legend, &mut marks)?;
        }

        debug!(
            "Parsed {} marks from {} layout blocks",
            marks.len(),
            blocks.len()
        );
        Ok(ParsedLayout { legend, marks })
    }

    pub fn compile(&self, text: &str) -> Result<Timeline> {
        self.parse(text)?.to_timeline()
    }
}

/// Parse a layout using only its own legend
pub fn parse_layout(text: &str) -> Result<ParsedLayout> {
    LayoutParser::new().parse(text)
}

/// Parse a layout and pair its marks into a timeline
pub fn compile_layout(text: &str) -> Result<Timeline> {
    LayoutParser::new().compile(text)
}

// Non-empty runs of lines between separator rows, after the first separator
fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in text.lines() {
        if line.starts_with(SEPARATOR_PREFIX) {
            if let Some(block) = current.take() {
                if !block.is_empty() {
                    blocks.push(block);
                }
            }
            current = Some(Vec::new());
        } else if let Some(block) = current.as_mut() {
            block.push(line);
        }
    }

    if let Some(block) = current {
        if !block.is_empty() {
            blocks.push(block);
        }
    }
    blocks
}

fn parse_block(
    index: usize,
    lines: &[&str],
    legend: &Legend,
    marks: &mut Vec<LayoutMark>,
) -> Result<()> {
    let ruler_row = lines
        .iter()
        .position(|line| line.starts_with(TIMELINE_LABEL))
        .ok_or(LayoutError::MissingTimelineRow(index))?;
    let subdivisions = ruler_subdivisions(lines[ruler_row]);
    let offset = lines
        .iter()
        .find_map(|line| frame_offset(line))
        .ok_or(LayoutError::MissingFrameOffset(index))?;

    trace!(
        "Layout block {}: offset {}, {} columns per unit",
        index,
        offset,
        subdivisions
    );

    for line in &lines[..ruler_row] {
        // Comment rows and anything else unrecognised are skipped
        let Some(body) = line.strip_prefix(EVENTS_PREFIX) else {
            continue;
        };

        for (column, action, key) in scan_marks(body) {
            let entry = legend.get(&key).ok_or_else(|| LayoutError::UnknownKey {
                key: key.clone(),
                block: index,
            })?;
            if entry.kind != action.kind() {
                return Err(LayoutError::KindMismatch {
                    key,
                    expected: entry.kind,
                    found: action.kind(),
                });
            }

            let time = offset + column as f64 / subdivisions as f64;
            marks.push(LayoutMark::new(key, entry.name.clone(), time, action));
        }
    }

    Ok(())
}

/// Columns between the first two ticks of a ruler row
fn ruler_subdivisions(line: &str) -> usize {
    let body = line.split_once("| |").map(|(_, rest)| rest).unwrap_or("");
    match body.find('|') {
        Some(position) => position + 1,
        None => body.chars().count() + 1,
    }
}

/// Offset in seconds from `| frame: NNN | ...`
fn frame_offset(line: &str) -> Option<f64> {
    let rest = line.strip_prefix(FRAME_LABEL)?;
    let (number, _) = rest.split_once('|')?;
    number.trim().parse::<f64>().ok()
}

/// Every `*key`, `>key` and `<key` on an event row, with its column
fn scan_marks(body: &str) -> Vec<(usize, MarkAction, String)> {
    let chars: Vec<char> = body.chars().collect();
    let mut found = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if let Some(action) = MarkAction::from_symbol(chars[i]) {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && chars[end].is_ascii_lowercase() {
                end += 1;
            }
            if end > start {
                found.push((i, action, chars[start..end].iter().collect()));
                i = end;
                continue;
            }
        }
        i += 1;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_marks() {
        let found = scan_marks("*g   >csb~~~<csb  < *");
        assert_eq!(
            found,
            vec![
                (0, MarkAction::Playthrough, "g".to_string()),
                (5, MarkAction::ToggleOn, "csb".to_string()),
                (12, MarkAction::ToggleOff, "csb".to_string()),
            ]
        );
    }

    #[test]
    fn test_ruler_subdivisions() {
        assert_eq!(ruler_subdivisions("| timeline   | |---------|---------"), 10);
        assert_eq!(ruler_subdivisions("| timeline   | |---|---|---"), 4);
        assert_eq!(ruler_subdivisions("| timeline   | |-----"), 6);
    }

    #[test]
    fn test_frame_offset() {
        assert_eq!(frame_offset("| frame: 020 | 0---------1"), Some(20.0));
        assert_eq!(frame_offset("| frame: abc | 0"), None);
        assert_eq!(frame_offset("| events     | *g"), None);
    }

    #[test]
    fn test_split_blocks() {
        let text = "legend\nframe_unit: 1s\nx---\na\nb\nx---\nx---\nc\nx---\n";
        assert_eq!(split_blocks(text), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_missing_rows() {
        let legend = Legend::new();
        let mut marks = Vec::new();

        let err = parse_block(3, &["| frame: 000 | 0"], &legend, &mut marks).unwrap_err();
        assert!(matches!(err, LayoutError::MissingTimelineRow(3)));

        let err = parse_block(1, &["| timeline   | |---"], &legend, &mut marks).unwrap_err();
        assert!(matches!(err, LayoutError::MissingFrameOffset(1)));
    }
}
