//! Cumulative scene patching
//!
//! A scene script holds a baseline state and a list of timestamped partial
//! overwrites. The [`ScenePatcher`] merges every patch whose time has been
//! reached into its current state, in time order, and hands the caller the
//! state before and after each tick. Keys are only ever overwritten, never
//! removed, so state at time `t` is the baseline folded with every patch
//! where `time <= t`.
//!
//! ```json
//! { "state": { "hp": 0, "mp": 0 },
//!   "changes": [ { "time": 0, "change": { "hp": 10 } },
//!                { "time": 5, "change": { "mp": 5 } } ] }
//! ```

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, SequenceError};

/// Scene state: ordered mapping from key to an opaque value
pub type SceneState = BTreeMap<String, Value>;

/// A timestamped partial overwrite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePatch {
    pub time: f64,
    pub change: SceneState,
}

impl ScenePatch {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            change: SceneState::new(),
        }
    }

    /// Add a key to overwrite
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.change.insert(key.into(), value.into());
        self
    }

    /// Overwrite this patch's keys in `state`
    pub fn apply_to(&self, state: &mut SceneState) {
        for (key, value) in &self.change {
            state.insert(key.clone(), value.clone());
        }
    }
}

/// A scene document: baseline state plus patches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneScript {
    #[serde(default)]
    pub state: SceneState,
    pub changes: Vec<ScenePatch>,
}

impl SceneScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a baseline key
    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    /// Append a patch
    pub fn with_change(mut self, patch: ScenePatch) -> Self {
        self.changes.push(patch);
        self
    }

    /// Read and validate a scene file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|e| SequenceError::io(path, e))?;
        Self::from_json_str(&source)
    }

    /// Parse and validate a scene document
    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed document
    pub fn from_value(value: &Value) -> Result<Self> {
        let state = match value.get("state") {
            None | Some(Value::Null) => SceneState::new(),
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Some(_) => return Err(SequenceError::NotAnObject("state")),
        };

        let entries = value
            .get("changes")
            .and_then(Value::as_array)
            .ok_or(SequenceError::NotAnArray("changes"))?;

        let changes = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_patch(index, entry))
            .collect::<Result<Vec<_>>>()?;

        let script = Self { state, changes };
        script.validate()?;
        Ok(script)
    }

    /// Check every patch time is usable
    pub fn validate(&self) -> Result<()> {
        for (index, patch) in self.changes.iter().enumerate() {
            if !patch.time.is_finite() {
                return Err(SequenceError::InvalidPatch {
                    index,
                    reason: "time must be finite".into(),
                });
            }
        }
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn parse_patch(index: usize, entry: &Value) -> Result<ScenePatch> {
    let time = entry
        .get("time")
        .ok_or_else(|| SequenceError::MissingField {
            field: "time",
            context: format!("change #{}", index),
        })?
        .as_f64()
        .ok_or_else(|| SequenceError::InvalidPatch {
            index,
            reason: "time must be a number".into(),
        })?;

    let change = match entry.get("change") {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Some(_) => return Err(SequenceError::NotAnObject("change")),
        None => {
            return Err(SequenceError::MissingField {
                field: "change",
                context: format!("change #{}", index),
            })
        }
    };

    Ok(ScenePatch { time, change })
}

/// Merges scene patches into a running state as time advances
#[derive(Debug, Clone, Default)]
pub struct ScenePatcher {
    /// State before any patch
    baseline: SceneState,
    /// State after the latest tick
    current: SceneState,
    /// State before the latest tick
    previous: SceneState,
    /// Patches, ascending by time
    patches: Vec<ScenePatch>,
    /// Next patch to apply
    cursor: usize,
    /// Number of successful loads
    generation: u64,
}

impl ScenePatcher {
    /// Create an empty patcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a patcher and load a script into it
    pub fn from_script(script: &SceneScript) -> Result<Self> {
        let mut patcher = Self::new();
        patcher.load(script)?;
        Ok(patcher)
    }

    /// Replace baseline, patches and cursor. On error nothing changes.
    pub fn load(&mut self, script: &SceneScript) -> Result<()> {
        script.validate()?;

        let mut patches = script.changes.clone();
        patches.sort_by(|a, b| a.time.total_cmp(&b.time));

        self.baseline = script.state.clone();
        self.current = script.state.clone();
        self.previous = script.state.clone();
        self.patches = patches;
        self.cursor = 0;
        self.generation += 1;

        debug!(
            "Loaded scene generation {}: {} baseline keys, {} changes",
            self.generation,
            self.baseline.len(),
            self.patches.len()
        );

        Ok(())
    }

    /// Read a scene file and load it
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let script = SceneScript::from_path(path)?;
        self.load(&script)
    }

    /// Apply every patch reached by `current_time`, then call
    /// `sink(current_time, current, previous)`.
    ///
    /// The sink runs every tick, whether or not anything changed.
    pub fn run<F>(&mut self, current_time: f64, mut sink: F)
    where
        F: FnMut(f64, &SceneState, &SceneState),
    {
        self.previous.clone_from(&self.current);

        while let Some(patch) = self.patches.get(self.cursor) {
            if patch.time > current_time {
                break;
            }
            trace!(
                "Applying scene change at {} ({} keys)",
                patch.time,
                patch.change.len()
            );
            patch.apply_to(&mut self.current);
            self.cursor += 1;
        }

        sink(current_time, &self.current, &self.previous);
    }

    /// Restore the baseline and rewind the cursor
    pub fn reset(&mut self) {
        self.current.clone_from(&self.baseline);
        self.previous.clone_from(&self.baseline);
        self.cursor = 0;
    }

    /// State at `time`, computed from the baseline without touching the cursor
    pub fn state_at(&self, time: f64) -> SceneState {
        let mut state = self.baseline.clone();
        self.patches
            .iter()
            .take_while(|patch| patch.time <= time)
            .for_each(|patch| patch.apply_to(&mut state));
        state
    }

    /// Keys whose value differs between the previous and current state
    pub fn changed_keys(&self) -> Vec<&str> {
        self.current
            .iter()
            .filter(|(key, value)| self.previous.get(*key) != Some(*value))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    pub fn current(&self) -> &SceneState {
        &self.current
    }

    pub fn previous(&self) -> &SceneState {
        &self.previous
    }

    pub fn baseline(&self) -> &SceneState {
        &self.baseline
    }

    pub fn patches(&self) -> &[ScenePatch] {
        &self.patches
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SceneScript {
        SceneScript::new()
            .with_state("hp", 0)
            .with_state("mp", 0)
            .with_change(ScenePatch::new(5.0).with("mp", 5))
            .with_change(ScenePatch::new(0.0).with("hp", 10))
    }

    #[test]
    fn test_cumulative_merge() {
        let mut patcher = ScenePatcher::from_script(&sample()).unwrap();

        patcher.run(3.0, |_, _, _| {});
        assert_eq!(patcher.current()["hp"], json!(10));
        assert_eq!(patcher.current()["mp"], json!(0));

        patcher.run(5.0, |_, _, _| {});
        assert_eq!(patcher.current()["hp"], json!(10));
        assert_eq!(patcher.current()["mp"], json!(5));
    }

    #[test]
    fn test_sink_sees_previous_and_current() {
        let mut patcher = ScenePatcher::from_script(&sample()).unwrap();
        let mut seen = Vec::new();

        patcher.run(0.0, |t, current, previous| {
            seen.push((t, current["hp"].clone(), previous["hp"].clone()));
        });
        patcher.run(1.0, |t, current, previous| {
            seen.push((t, current["hp"].clone(), previous["hp"].clone()));
        });

        assert_eq!(
            seen,
            vec![(0.0, json!(10), json!(0)), (1.0, json!(10), json!(10))]
        );
    }

    #[test]
    fn test_changed_keys() {
        let mut patcher = ScenePatcher::from_script(&sample()).unwrap();

        patcher.run(0.0, |_, _, _| {});
        assert_eq!(patcher.changed_keys(), vec!["hp"]);

        patcher.run(1.0, |_, _, _| {});
        assert!(patcher.changed_keys().is_empty());
    }

    #[test]
    fn test_new_keys_are_created() {
        let script = SceneScript::new().with_change(ScenePatch::new(1.0).with("door", "open"));
        let mut patcher = ScenePatcher::from_script(&script).unwrap();

        patcher.run(0.5, |_, current, _| assert!(current.is_empty()));
        patcher.run(1.0, |_, current, _| assert_eq!(current["door"], json!("open")));
    }

    #[test]
    fn test_later_patch_wins() {
        let script = SceneScript::new()
            .with_change(ScenePatch::new(1.0).with("light", "red"))
            .with_change(ScenePatch::new(2.0).with("light", "green"));
        let mut patcher = ScenePatcher::from_script(&script).unwrap();

        patcher.run(10.0, |_, _, _| {});
        assert_eq!(patcher.current()["light"], json!("green"));
        assert_eq!(patcher.cursor(), 2);
    }

    #[test]
    fn test_state_at_matches_stepping() {
        let script = SceneScript::new()
            .with_state("a", 0)
            .with_change(ScenePatch::new(1.0).with("a", 1))
            .with_change(ScenePatch::new(2.0).with("b", 2))
            .with_change(ScenePatch::new(3.0).with("a", 3));

        let mut stepped = ScenePatcher::from_script(&script).unwrap();
        for tick in 0..=25 {
            stepped.run(tick as f64 * 0.1, |_, _, _| {});
        }

        let mut jumped = ScenePatcher::from_script(&script).unwrap();
        jumped.run(2.5, |_, _, _| {});

        assert_eq!(stepped.current(), jumped.current());
        assert_eq!(stepped.current(), &stepped.state_at(2.5));
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut patcher = ScenePatcher::from_script(&sample()).unwrap();
        patcher.run(10.0, |_, _, _| {});
        patcher.reset();

        assert_eq!(patcher.current(), patcher.baseline());
        assert_eq!(patcher.cursor(), 0);
    }

    #[test]
    fn test_parse_document() {
        let script = SceneScript::from_json_str(
            r#"{ "state": { "hp": 0 }, "changes": [ { "time": 2, "change": { "hp": 4 } } ] }"#,
        )
        .unwrap();
        assert_eq!(script.state["hp"], json!(0));
        assert_eq!(script.changes[0].time, 2.0);
    }

    #[test]
    fn test_changes_must_be_array() {
        let err = SceneScript::from_json_str(r#"{ "state": {}, "changes": 3 }"#).unwrap_err();
        assert!(matches!(err, SequenceError::NotAnArray("changes")));
    }

    #[test]
    fn test_change_must_be_object() {
        let err = SceneScript::from_json_str(r#"{ "changes": [ { "time": 1, "change": [1] } ] }"#)
            .unwrap_err();
        assert!(matches!(err, SequenceError::NotAnObject("change")));
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let mut patcher = ScenePatcher::from_script(&sample()).unwrap();
        patcher.run(0.0, |_, _, _| {});

        let bad = SceneScript::new().with_change(ScenePatch::new(f64::INFINITY));
        assert!(patcher.load(&bad).is_err());
        assert_eq!(patcher.generation(), 1);
        assert_eq!(patcher.current()["hp"], json!(10));
    }
}
