//! Key legend
//!
//! Layout rows only have room for short keys. The legend maps each key to an
//! event name and kind, and is written at the top of a rendered layout:
//!
//! ```text
//! legend
//! - cig starts burning
//!   - key: csb
//!   - type: toggle
//! frame_unit: 1s
//! ```

use std::collections::BTreeMap;
use void_sequence::EventKind;

use crate::error::{LayoutError, Result};
use crate::mark::validate_key;

/// Legend entry for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub name: String,
    pub kind: EventKind,
}

/// Mapping from layout key to event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Legend {
    entries: BTreeMap<String, LegendEntry>,
}

impl Legend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a key. Rebinding to the same name and kind is a no-op.
    pub fn insert(&mut self, key: &str, name: &str, kind: EventKind) -> Result<()> {
        validate_key(key)?;

        if let Some(existing) = self.entries.get(key) {
            if existing.name != name {
                return Err(LayoutError::ConflictingKey {
                    key: key.to_string(),
                    existing: existing.name.clone(),
                    name: name.to_string(),
                });
            }
            if existing.kind != kind {
                return Err(LayoutError::KindMismatch {
                    key: key.to_string(),
                    expected: existing.kind,
                    found: kind,
                });
            }
            return Ok(());
        }

        self.entries.insert(
            key.to_string(),
            LegendEntry {
                name: name.to_string(),
                kind,
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&LegendEntry> {
        self.entries.get(key)
    }

    /// Key already bound to `name`, if any
    pub fn key_for(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(key, _)| key.as_str())
    }

    /// Pick a key for `name`: its existing key, else a fresh abbreviation.
    ///
    /// Abbreviations start from the initials of the name's words, grow with
    /// the name's remaining letters, then take an alphabetic suffix.
    pub fn derive_key(&self, name: &str) -> String {
        if let Some(key) = self.key_for(name) {
            return key.to_string();
        }

        let letters: Vec<char> = name
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let initials: String = name
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter_map(|word| word.chars().find(|c| c.is_ascii_alphabetic()))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let mut key = if initials.is_empty() {
            "e".to_string()
        } else {
            initials
        };

        let mut extra = letters.iter().skip(1);
        while self.entries.contains_key(&key) {
            match extra.next() {
                Some(c) => key.push(*c),
                None => break,
            }
        }

        let base = key.clone();
        let mut n = 0;
        while self.entries.contains_key(&key) {
            key = format!("{}{}", base, alpha_suffix(n));
            n += 1;
        }
        key
    }

    /// Merge another legend's entries in, overriding on conflict
    pub fn extend(&mut self, other: &Legend) {
        for (key, entry) in &other.entries {
            self.entries.insert(key.clone(), entry.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LegendEntry)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the legend section
    pub fn render(&self) -> String {
        let mut output = String::from("legend\n");
        for (key, entry) in &self.entries {
            output.push_str(&format!("- {}\n", entry.name));
            output.push_str(&format!("  - key: {}\n", key));
            output.push_str(&format!("  - type: {}\n", entry.kind));
        }
        output.push_str("frame_unit: 1s\n");
        output
    }

    /// Read the legend section out of a layout document.
    ///
    /// Returns an empty legend when the document has no `legend` line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut legend = Self::new();
        let mut in_legend = false;
        let mut pending: Option<(usize, String, Option<String>, Option<EventKind>)> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end();

            if !in_legend {
                in_legend = line.trim() == "legend";
                continue;
            }

            if line.starts_with("frame_unit:") || line.starts_with("x-") {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            if let Some(field) = line.strip_prefix("  - ") {
                let Some((_, _, key, kind)) = pending.as_mut() else {
                    return Err(malformed(line_no, "field outside of an entry"));
                };
                if let Some(value) = field.strip_prefix("key:") {
                    *key = Some(value.trim().to_string());
                } else if let Some(value) = field.strip_prefix("type:") {
                    *kind = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| malformed(line_no, "unknown event type"))?,
                    );
                } else {
                    return Err(malformed(line_no, "expected 'key:' or 'type:'"));
                }
            } else if let Some(name) = line.strip_prefix("- ") {
                if let Some(entry) = pending.take() {
                    legend.insert_pending(entry)?;
                }
                pending = Some((line_no, name.trim().to_string(), None, None));
            } else {
                return Err(malformed(line_no, "expected an entry"));
            }
        }

        if let Some(entry) = pending.take() {
            legend.insert_pending(entry)?;
        }

        Ok(legend)
    }

    fn insert_pending(
        &mut self,
        (line, name, key, kind): (usize, String, Option<String>, Option<EventKind>),
    ) -> Result<()> {
        let key = key.ok_or_else(|| malformed(line, "entry has no key"))?;
        let kind = kind.ok_or_else(|| malformed(line, "entry has no type"))?;
        self.insert(&key, &name, kind)
    }
}

fn malformed(line: usize, reason: &str) -> LayoutError {
    LayoutError::MalformedLegend {
        line,
        reason: reason.to_string(),
    }
}

/// Bijective base-26: 0 -> "a", 25 -> "z", 26 -> "aa"
fn alpha_suffix(mut n: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push((b'a' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_conflicts() {
        let mut legend = Legend::new();
        legend.insert("g", "grab", EventKind::Playthrough).unwrap();
        legend.insert("g", "grab", EventKind::Playthrough).unwrap();

        assert!(matches!(
            legend.insert("g", "glow", EventKind::Playthrough),
            Err(LayoutError::ConflictingKey { .. })
        ));
        assert!(matches!(
            legend.insert("g", "grab", EventKind::Toggle),
            Err(LayoutError::KindMismatch { .. })
        ));
        assert_eq!(legend.len(), 1);
    }

    #[test]
    fn test_derive_key() {
        let mut legend = Legend::new();
        assert_eq!(legend.derive_key("cig starts burning"), "csb");

        legend.insert("csb", "cig starts burning", EventKind::Toggle).unwrap();
        assert_eq!(legend.derive_key("cig starts burning"), "csb");
        assert_eq!(legend.derive_key("cold steel blade"), "csbo");
        assert_eq!(legend.derive_key("42"), "e");
    }

    #[test]
    fn test_derive_key_falls_back_to_suffix() {
        let mut legend = Legend::new();
        legend.insert("a", "a", EventKind::Playthrough).unwrap();
        assert_eq!(legend.derive_key("A!"), "aa");
    }

    #[test]
    fn test_alpha_suffix() {
        assert_eq!(alpha_suffix(0), "a");
        assert_eq!(alpha_suffix(25), "z");
        assert_eq!(alpha_suffix(26), "aa");
        assert_eq!(alpha_suffix(27), "ab");
    }

    #[test]
    fn test_render_and_parse() {
        let mut legend = Legend::new();
        legend.insert("g", "grab cigs", EventKind::Playthrough).unwrap();
        legend.insert("csb", "cig starts burning", EventKind::Toggle).unwrap();

        let text = legend.render();
        assert!(text.starts_with("legend\n- cig starts burning\n  - key: csb\n"));
        assert!(text.ends_with("frame_unit: 1s\n"));

        assert_eq!(Legend::parse(&text).unwrap(), legend);
    }

    #[test]
    fn test_parse_without_legend() {
        assert!(Legend::parse("x----\n| timeline   | |---\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        let err = Legend::parse("legend\n- grab\n  - type: loop\n").unwrap_err();
        assert!(matches!(err, LayoutError::MalformedLegend { line: 3, .. }));

        let err = Legend::parse("legend\n- grab\n  - type: playthrough\n").unwrap_err();
        assert!(matches!(err, LayoutError::MalformedLegend { line: 2, .. }));
    }
}
