//! Text timeline rendering
//!
//! Renders marks and comments as a fixed-width text layout, one block per
//! segment of `units_per_segment` seconds, each second split into
//! `subdivisions` columns:
//!
//! ```text
//! x-------------------------------------------------------------------------------------------------------------------
//! | comments   | grab      light     burn
//! | events     | *g        *lu       >csb~~~~~<csb
//! | timeline   | |---------|---------|---------|---------|---------|---------|---------|---------|---------|---------
//! | frame: 000 | 0---------1---------2---------3---------4---------5---------6---------7---------8---------9---------
//! x-------------------------------------------------------------------------------------------------------------------
//! ```
//!
//! Overlapping labels are spread over extra rows.

use log::debug;
use void_sequence::{EventKind, Timeline};

use crate::channels::assign_channels;
use crate::error::Result;
use crate::legend::Legend;
use crate::mark::{marks_to_timeline, timeline_to_marks, LayoutComment, LayoutMark, MarkAction};

pub const EVENTS_PREFIX: &str = "| events     | ";
pub const COMMENTS_PREFIX: &str = "| comments   | ";
pub const TIMELINE_PREFIX: &str = "| timeline   | ";

/// Prefix of separator rows between blocks
pub const SEPARATOR_PREFIX: &str = "x-";

/// Authoring view of a sequence as marks on a text timeline
#[derive(Debug, Clone)]
pub struct LayoutTimeline {
    units_per_segment: usize,
    subdivisions: usize,
    legend: Legend,
    marks: Vec<LayoutMark>,
    comments: Vec<LayoutComment>,
}

impl LayoutTimeline {
    /// Ten seconds per segment, ten columns per second
    pub fn new() -> Self {
        Self {
            units_per_segment: 10,
            subdivisions: 10,
            legend: Legend::new(),
            marks: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Set segment length in seconds and columns per second
    pub fn with_resolution(mut self, units_per_segment: usize, subdivisions: usize) -> Self {
        self.units_per_segment = units_per_segment.max(1);
        self.subdivisions = subdivisions.max(1);
        self
    }

    /// Lay out an existing timeline with derived keys
    pub fn from_timeline(timeline: &Timeline) -> Result<Self> {
        let mut layout = Self::new();
        layout.extend_from_timeline(timeline)?;
        Ok(layout)
    }

    /// Add every event of a timeline, deriving keys for new names
    pub fn extend_from_timeline(&mut self, timeline: &Timeline) -> Result<()> {
        let legend = &mut self.legend;
        let marks = timeline_to_marks(timeline, |name, kind: EventKind| {
            let key = legend.derive_key(name);
            legend.insert(&key, name, kind)?;
            Ok(key)
        })?;
        self.marks.extend(marks);
        Ok(())
    }

    /// Add a mark under an explicit key
    pub fn add_mark(&mut self, key: &str, name: &str, time: f64, action: MarkAction) -> Result<()> {
        self.legend.insert(key, name, action.kind())?;
        self.marks.push(LayoutMark::new(key, name, time, action));
        Ok(())
    }

    /// Add a mark, deriving the key from the name. Returns the key used.
    pub fn add_mark_auto_key(&mut self, name: &str, time: f64, action: MarkAction) -> Result<String> {
        let key = self.legend.derive_key(name);
        self.add_mark(&key, name, time, action)?;
        Ok(key)
    }

    /// Add a comment
    pub fn add_comment(&mut self, text: impl Into<String>, time: f64) {
        self.comments.push(LayoutComment::new(text, time));
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn marks(&self) -> &[LayoutMark] {
        &self.marks
    }

    pub fn comments(&self) -> &[LayoutComment] {
        &self.comments
    }

    /// Pair marks into a playable timeline
    pub fn to_timeline(&self) -> Result<Timeline> {
        marks_to_timeline(&self.marks)
    }

    /// Columns per segment
    pub fn width(&self) -> usize {
        self.units_per_segment * self.subdivisions
    }

    /// Segment index and column of a time, rounded to the nearest column
    pub fn locate(&self, time: f64) -> (usize, usize) {
        let total = (time.max(0.0) * self.subdivisions as f64).round() as usize;
        (total / self.width(), total % self.width())
    }

    fn segment_count(&self) -> usize {
        let last_mark = self.marks.iter().map(|m| self.locate(m.time).0);
        let last_comment = self.comments.iter().map(|c| self.locate(c.time).0);
        last_mark.chain(last_comment).max().unwrap_or(0) + 1
    }

    /// Render the legend followed by every segment block
    pub fn render(&self) -> String {
        format!("{}\n{}", self.legend.render(), self.render_segments())
    }

    /// Render segment blocks only
    pub fn render_segments(&self) -> String {
        let separator = format!(
            "x{}",
            "-".repeat(TIMELINE_PREFIX.len() - 1 + self.width())
        );
        let ruler = format!(
            "{}{}",
            TIMELINE_PREFIX,
            format!("|{}", "-".repeat(self.subdivisions - 1)).repeat(self.units_per_segment)
        );

        let segments = self.segment_count();
        debug!(
            "Rendering {} marks and {} comments over {} segments",
            self.marks.len(),
            self.comments.len(),
            segments
        );

        let mut lines = Vec::new();
        for segment in 0..segments {
            lines.push(separator.clone());
            lines.extend(self.comment_rows(segment));
            lines.extend(self.event_rows(segment));
            lines.push(ruler.clone());
            lines.push(self.frame_row(segment));
            lines.push(separator.clone());
        }

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }

    fn frame_row(&self, segment: usize) -> String {
        let mut row = format!("| frame: {:03} | ", segment * self.units_per_segment);
        for unit in 0..self.units_per_segment {
            let label: String = unit.to_string().chars().take(self.subdivisions).collect();
            row.push_str(&label);
            row.push_str(&"-".repeat(self.subdivisions - label.len()));
        }
        row
    }

    fn comment_rows(&self, segment: usize) -> Vec<String> {
        let items = self
            .comments
            .iter()
            .filter_map(|comment| {
                let (s, column) = self.locate(comment.time);
                (s == segment).then(|| (column, comment.text.clone()))
            })
            .collect();
        self.pack(items, COMMENTS_PREFIX)
    }

    fn event_rows(&self, segment: usize) -> Vec<String> {
        let mut in_segment: Vec<(usize, &LayoutMark)> = self
            .marks
            .iter()
            .filter_map(|mark| {
                let (s, column) = self.locate(mark.time);
                (s == segment).then_some((column, mark))
            })
            .collect();
        in_segment.sort_by(|a, b| a.1.time.total_cmp(&b.1.time));

        let mut closed = vec![false; in_segment.len()];
        let mut items: Vec<(usize, String)> = Vec::new();

        for (index, &(column, mark)) in in_segment.iter().enumerate() {
            match mark.action {
                MarkAction::Playthrough => items.push((column, mark.label())),
                MarkAction::ToggleOn => {
                    let close = in_segment.iter().enumerate().position(|(j, (_, other))| {
                        j > index
                            && !closed[j]
                            && other.action == MarkAction::ToggleOff
                            && other.key == mark.key
                    });

                    let label = mark.label();
                    let span = match close {
                        Some(j) => {
                            closed[j] = true;
                            let (end_column, end_mark) = in_segment[j];
                            let fill = end_column.saturating_sub(column + label.len());
                            format!("{}{}{}", label, "~".repeat(fill), end_mark.label())
                        }
                        // Runs to the end of the segment; closes in a later one
                        None => {
                            let fill = self.width().saturating_sub(column + label.len());
                            format!("{}{}", label, "~".repeat(fill))
                        }
                    };
                    items.push((column, span));
                }
                MarkAction::ToggleOff => {}
            }
        }

        // Closes whose open lies in an earlier segment stand alone
        for (index, &(column, mark)) in in_segment.iter().enumerate() {
            if mark.action == MarkAction::ToggleOff && !closed[index] {
                items.push((column, mark.label()));
            }
        }

        self.pack(items, EVENTS_PREFIX)
    }

    fn pack(&self, items: Vec<(usize, String)>, prefix: &str) -> Vec<String> {
        let intervals: Vec<(usize, usize)> = items
            .iter()
            .map(|(column, text)| (*column, column + text.chars().count()))
            .collect();
        let assignment = assign_channels(&intervals);

        let mut rows = vec![vec![' '; self.width()]; assignment.count];
        for ((column, text), channel) in items.iter().zip(&assignment.channels) {
            clobber(&mut rows[*channel], *column, text);
        }

        rows.into_iter()
            .map(|row| format!("{}{}", prefix, row.into_iter().collect::<String>()))
            .collect()
    }
}

impl Default for LayoutTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Overwrite `row` with `text` starting at `at`, growing the row if needed
fn clobber(row: &mut Vec<char>, at: usize, text: &str) {
    for (offset, c) in text.chars().enumerate() {
        let position = at + offset;
        if position < row.len() {
            row[position] = c;
        } else {
            row.push(c);
        }
    }
}
