//! Void Sequence - Scripted Sequence Playback
//!
//! This crate drives cutscenes, tutorials and scripted encounters from a
//! declarative timeline, one host frame at a time.
//!
//! # Features
//!
//! - Playthrough events fired exactly once when their time is reached
//! - Toggle events with first/ongoing/last call semantics over a closed window
//! - Edge-detecting signals for on/off transitions
//! - Cumulative scene-state patches with previous/current snapshots
//! - Generations: reload or reset to replay a sequence
//!
//! # Example
//!
//! ```ignore
//! use void_sequence::prelude::*;
//!
//! let timeline = Timeline::from_path("sequences/intro.json")?;
//! let mut scheduler = EventScheduler::from_timeline(&timeline)?;
//!
//! let mut callbacks = EventCallbacks::new()
//!     .on("intro", |_, _| println!("intro"))
//!     .on("flash", |just_on, just_off| {
//!         if just_on { println!("flash start"); }
//!         if just_off { println!("flash end"); }
//!     });
//!
//! // Once per frame
//! scheduler.run(elapsed_seconds, &mut callbacks);
//! ```

pub mod callbacks;
pub mod config;
pub mod error;
pub mod event;
pub mod patch;
pub mod scheduler;
pub mod signal;
pub mod timeline;

pub mod prelude {
    pub use crate::callbacks::{EventCallback, EventCallbacks};
    pub use crate::config::{SequenceConfig, SequenceLoader};
    pub use crate::error::{Result, SequenceError};
    pub use crate::event::{EventDecl, EventKind, PlaythroughEvent, ToggleEvent, ToggleHandle};
    pub use crate::patch::{ScenePatch, ScenePatcher, SceneScript, SceneState};
    pub use crate::scheduler::EventScheduler;
    pub use crate::signal::{Edge, EdgeSignal};
    pub use crate::timeline::Timeline;
}

pub use prelude::*;
