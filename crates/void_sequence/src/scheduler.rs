//! Event scheduler
//!
//! Drives playthrough and toggle events against a monotonically advancing
//! time. Each load produces a new generation: sorted event lists, an empty
//! fired-set, a zeroed playthrough cursor and one [`EdgeSignal`] per toggle
//! event.
//!
//! Per tick, playthrough dispatch runs first and only walks forward from the
//! cursor. Toggle dispatch then rechecks every toggle event, since activity
//! windows are evaluated against the current time alone.

use log::{debug, warn};
use std::collections::HashSet;
use std::path::Path;

use crate::callbacks::EventCallbacks;
use crate::config::SequenceConfig;
use crate::error::Result;
use crate::event::{EventDecl, EventKind, PlaythroughEvent, ToggleEvent, ToggleHandle};
use crate::signal::{Edge, EdgeSignal};
use crate::timeline::Timeline;

/// Scheduler for one timeline generation at a time
#[derive(Debug, Clone)]
pub struct EventScheduler {
    /// Playthrough events, ascending by time
    playthrough_events: Vec<PlaythroughEvent>,
    /// Toggle events, ascending by start time
    toggle_events: Vec<ToggleEvent>,
    /// One signal per toggle event, indexed by handle
    signals: Vec<EdgeSignal>,
    /// Next playthrough event to examine
    cursor: usize,
    /// Names of playthrough events that have fired this generation
    fired: HashSet<String>,
    /// Number of successful loads
    generation: u64,
    /// Time passed to the previous tick
    last_time: Option<f64>,
    /// Whether unregistered names are reported
    warn_missing_callbacks: bool,
}

impl EventScheduler {
    /// Create an empty scheduler (generation 0, nothing loaded)
    pub fn new() -> Self {
        Self {
            playthrough_events: Vec::new(),
            toggle_events: Vec::new(),
            signals: Vec::new(),
            cursor: 0,
            fired: HashSet::new(),
            generation: 0,
            last_time: None,
            warn_missing_callbacks: true,
        }
    }

    /// Create a scheduler using the diagnostic settings from a config
    pub fn with_config(config: &SequenceConfig) -> Self {
        Self::new().with_missing_callback_warnings(config.warn_missing_callbacks)
    }

    /// Create a scheduler and load a timeline into it
    pub fn from_timeline(timeline: &Timeline) -> Result<Self> {
        let mut scheduler = Self::new();
        scheduler.load(timeline)?;
        Ok(scheduler)
    }

    /// Enable or disable missing-callback warnings
    pub fn with_missing_callback_warnings(mut self, enabled: bool) -> Self {
        self.warn_missing_callbacks = enabled;
        self
    }

    /// Replace all state with a new generation built from `timeline`.
    ///
    /// On error the scheduler is left exactly as it was.
    pub fn load(&mut self, timeline: &Timeline) -> Result<()> {
        timeline.validate()?;

        let mut playthrough_events = Vec::new();
        let mut toggle_events = Vec::new();
        for event in &timeline.events {
            match event {
                EventDecl::Playthrough(e) => playthrough_events.push(e.clone()),
                EventDecl::Toggle(e) => toggle_events.push(e.clone()),
            }
        }

        // Stable sorts keep document order for equal times
        playthrough_events.sort_by(|a, b| a.time.total_cmp(&b.time));
        toggle_events.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        self.signals = vec![EdgeSignal::new(); toggle_events.len()];
        self.playthrough_events = playthrough_events;
        self.toggle_events = toggle_events;
        self.cursor = 0;
        self.fired.clear();
        self.last_time = None;
        self.generation += 1;

        debug!(
            "Loaded sequence generation {}: {} playthrough, {} toggle events",
            self.generation,
            self.playthrough_events.len(),
            self.toggle_events.len()
        );

        Ok(())
    }

    /// Read a timeline file and load it
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let timeline = Timeline::from_path(path)?;
        self.load(&timeline)
    }

    /// Advance to `current_time`, invoking callbacks inline.
    ///
    /// A panicking callback propagates out of this call.
    pub fn run(&mut self, current_time: f64, callbacks: &mut EventCallbacks) {
        if let Some(last) = self.last_time {
            if current_time < last {
                debug!(
                    "Sequence time went backwards ({} -> {}); fired events are not replayed",
                    last, current_time
                );
            }
        }
        self.last_time = Some(current_time);

        self.dispatch_playthrough(current_time, callbacks);
        self.dispatch_toggles(current_time, callbacks);
    }

    fn dispatch_playthrough(&mut self, current_time: f64, callbacks: &mut EventCallbacks) {
        while let Some(event) = self.playthrough_events.get(self.cursor) {
            if event.time > current_time {
                break;
            }

            match callbacks.get_mut(&event.name) {
                Some(callback) => {
                    if !self.fired.contains(&event.name) {
                        callback(true, true);
                        self.fired.insert(event.name.clone());
                    }
                }
                None => {
                    if self.warn_missing_callbacks {
                        warn_missing(EventKind::Playthrough, &event.name);
                    }
                }
            }

            // Advance regardless: an event whose callback was absent is skipped for good
            self.cursor += 1;
        }
    }

    fn dispatch_toggles(&mut self, current_time: f64, callbacks: &mut EventCallbacks) {
        let warn_enabled = self.warn_missing_callbacks;

        for (event, signal) in self.toggle_events.iter().zip(self.signals.iter_mut()) {
            // Every signal commits every tick so a window that closes between
            // two ticks still yields its off edge
            signal.set(event.is_active(current_time));
            let edge = signal.process();

            let Some(callback) = callbacks.get_mut(&event.name) else {
                if warn_enabled {
                    warn_missing(EventKind::Toggle, &event.name);
                }
                continue;
            };

            match edge {
                Edge::JustOn => callback(true, false),
                Edge::UnchangedOn => callback(false, false),
                Edge::JustOff => callback(false, true),
                Edge::UnchangedOff => {}
            }
        }
    }

    /// Rewind the playthrough cursor and clear the fired-set.
    ///
    /// Toggle signals are left alone; they recompute from the next tick.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.fired.clear();
        self.last_time = None;
    }

    /// Number of successful loads so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether any timeline has been loaded
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    /// Index of the next playthrough event to examine
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Playthrough events not yet reached by the cursor
    pub fn pending_playthrough(&self) -> &[PlaythroughEvent] {
        &self.playthrough_events[self.cursor..]
    }

    /// Sorted playthrough events of this generation
    pub fn playthrough_events(&self) -> &[PlaythroughEvent] {
        &self.playthrough_events
    }

    /// Sorted toggle events of this generation
    pub fn toggle_events(&self) -> &[ToggleEvent] {
        &self.toggle_events
    }

    /// Toggle events paired with their handles
    pub fn toggles(&self) -> impl Iterator<Item = (ToggleHandle, &ToggleEvent)> + '_ {
        self.toggle_events
            .iter()
            .enumerate()
            .map(|(index, event)| (ToggleHandle(index), event))
    }

    /// Whether a playthrough event with this name has fired this generation
    pub fn has_fired(&self, name: &str) -> bool {
        self.fired.contains(name)
    }

    /// Committed state of a toggle event's signal
    pub fn is_toggle_active(&self, handle: ToggleHandle) -> bool {
        self.signals
            .get(handle.0)
            .map(EdgeSignal::is_on)
            .unwrap_or(false)
    }

    /// Edge reported by a toggle event's signal on the last tick
    pub fn toggle_edge(&self, handle: ToggleHandle) -> Option<Edge> {
        self.signals.get(handle.0).map(EdgeSignal::last_edge)
    }

    /// Time passed to the most recent tick
    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn warn_missing(kind: EventKind, name: &str) {
    warn!("No callback registered for {} event: {}", kind, name);
}
