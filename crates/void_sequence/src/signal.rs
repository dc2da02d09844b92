//! Edge-detecting latch
//!
//! An [`EdgeSignal`] holds a committed on/off state and a staged one. Staging
//! with [`EdgeSignal::set_on`] / [`EdgeSignal::set_off`] has no visible effect
//! until [`EdgeSignal::process`] commits it, which reports the transition as an
//! [`Edge`]. `process` must run exactly once per tick for every live signal,
//! whatever the caller decides to do with the result.

use serde::{Deserialize, Serialize};

/// Outcome of committing a staged state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Was off, still off
    #[default]
    UnchangedOff,
    /// Was off, now on
    JustOn,
    /// Was on, still on
    UnchangedOn,
    /// Was on, now off
    JustOff,
}

impl Edge {
    /// Classify a transition between two committed states
    pub fn between(was_on: bool, is_on: bool) -> Self {
        match (was_on, is_on) {
            (false, false) => Self::UnchangedOff,
            (false, true) => Self::JustOn,
            (true, true) => Self::UnchangedOn,
            (true, false) => Self::JustOff,
        }
    }

    /// Whether the committed state is on after this edge
    pub fn is_on(&self) -> bool {
        matches!(self, Self::JustOn | Self::UnchangedOn)
    }

    /// Whether this edge is a transition
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::JustOn | Self::JustOff)
    }
}

/// Two-state latch with deferred commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeSignal {
    staged: bool,
    committed: bool,
    last_edge: Edge,
}

impl EdgeSignal {
    /// Create a signal that starts off
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the on state for the next commit
    pub fn set_on(&mut self) {
        self.staged = true;
    }

    /// Stage the off state for the next commit
    pub fn set_off(&mut self) {
        self.staged = false;
    }

    /// Stage either state
    pub fn set(&mut self, on: bool) {
        self.staged = on;
    }

    /// Commit the staged state and report the transition.
    ///
    /// Without an intervening `set_*` call this re-commits the current state
    /// and reports no transition.
    pub fn process(&mut self) -> Edge {
        self.last_edge = Edge::between(self.committed, self.staged);
        self.committed = self.staged;
        self.last_edge
    }

    /// Committed state
    pub fn is_on(&self) -> bool {
        self.committed
    }

    /// Whether the last commit went off to on
    pub fn is_just_on(&self) -> bool {
        self.last_edge == Edge::JustOn
    }

    /// Whether the last commit went on to off
    pub fn is_just_off(&self) -> bool {
        self.last_edge == Edge::JustOff
    }

    /// Result of the last commit
    pub fn last_edge(&self) -> Edge {
        self.last_edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_starts_off() {
        let signal = EdgeSignal::new();
        assert!(!signal.is_on());
        assert!(!signal.is_just_on());
        assert!(!signal.is_just_off());
    }

    #[test]
    fn test_staging_is_deferred() {
        let mut signal = EdgeSignal::new();
        signal.set_on();
        assert!(!signal.is_on());

        assert_eq!(signal.process(), Edge::JustOn);
        assert!(signal.is_on());
        assert!(signal.is_just_on());
    }

    #[test]
    fn test_full_cycle() {
        let mut signal = EdgeSignal::new();

        signal.set_on();
        assert_eq!(signal.process(), Edge::JustOn);

        signal.set_on();
        assert_eq!(signal.process(), Edge::UnchangedOn);
        assert!(!signal.is_just_on());

        signal.set_off();
        assert_eq!(signal.process(), Edge::JustOff);
        assert!(signal.is_just_off());

        signal.set_off();
        assert_eq!(signal.process(), Edge::UnchangedOff);
        assert!(!signal.is_just_off());
    }

    #[test]
    fn test_process_without_stage_recommits() {
        let mut signal = EdgeSignal::new();
        signal.set(true);
        signal.process();

        assert_eq!(signal.process(), Edge::UnchangedOn);
        assert_eq!(signal.process(), Edge::UnchangedOn);
        assert!(signal.is_on());
    }

    #[test]
    fn test_default_edge_is_unchanged_off() {
        assert_eq!(Edge::default(), Edge::UnchangedOff);
        assert_eq!(EdgeSignal::new().last_edge(), Edge::UnchangedOff);
    }

    #[test]
    fn test_edge_classification() {
        assert!(Edge::JustOn.is_on());
        assert!(Edge::UnchangedOn.is_on());
        assert!(!Edge::JustOff.is_on());
        assert!(Edge::JustOff.is_transition());
        assert!(!Edge::UnchangedOff.is_transition());
    }
}
