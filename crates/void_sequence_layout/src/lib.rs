//! Void Sequence Layout - Text Timelines for Authoring Sequences
//!
//! Sequences are easier to review as a picture than as a list of times.
//! This crate renders a [`Timeline`](void_sequence::Timeline) as a fixed-width
//! text layout and compiles hand-edited layouts back into timelines.
//!
//! # Features
//!
//! - Legend of short keys to event names
//! - Playthrough marks (`*key`) and toggle spans (`>key~~~<key`)
//! - Overlapping marks spread over the fewest rows
//! - Marker list import from DCC timeline exports
//!
//! # Example
//!
//! ```ignore
//! use void_sequence_layout::prelude::*;
//!
//! let mut layout = LayoutTimeline::new();
//! layout.add_mark("g", "grab cigs", 0.0, MarkAction::Playthrough)?;
//! layout.add_mark("csb", "cig starts burning", 2.0, MarkAction::ToggleOn)?;
//! layout.add_mark("csb", "cig starts burning", 6.5, MarkAction::ToggleOff)?;
//!
//! let text = layout.render();
//! let timeline = compile_layout(&text)?;
//! ```

pub mod channels;
pub mod error;
pub mod legend;
pub mod mark;
pub mod markers;
pub mod parse;
pub mod render;

pub mod prelude {
    pub use crate::channels::{assign_channels, ChannelAssignment};
    pub use crate::error::{LayoutError, Result};
    pub use crate::legend::{Legend, LegendEntry};
    pub use crate::mark::{marks_to_timeline, timeline_to_marks, LayoutComment, LayoutMark, MarkAction};
    pub use crate::markers::{markers_to_timeline, parse_markers, Marker};
    pub use crate::parse::{compile_layout, parse_layout, LayoutParser, ParsedLayout};
    pub use crate::render::LayoutTimeline;
}

pub use prelude::*;
