use crate::error::{BudgetError, Result};
use crate::schema::Period;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Key of an hour map entry: a period and, in element mode, the element id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HourKey {
    pub period: Period,
    pub element_id: Option<String>,
}

impl HourKey {
    pub fn aggregate(period: Period) -> Self {
        Self {
            period,
            element_id: None,
        }
    }

    pub fn for_element(period: Period, element_id: impl Into<String>) -> Self {
        Self {
            period,
            element_id: Some(element_id.into()),
        }
    }
}

/// A (period, element?, hours) triple, as produced by an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourEntry {
    pub period: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    pub hours: f64,
}

impl HourEntry {
    pub fn key(&self) -> HourKey {
        HourKey {
            period: self.period,
            element_id: self.element_id.clone(),
        }
    }
}

/// Hours keyed by (period, element?). A missing key means zero hours; no
/// stored value is ever negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HourEntry>", into = "Vec<HourEntry>")]
pub struct HourMap {
    entries: BTreeMap<HourKey, f64>,
}

impl HourMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hours stored under `key`, zero when absent.
    pub fn get(&self, key: &HourKey) -> f64 {
        self.entries.get(key).copied().unwrap_or(0.0)
    }

    pub fn hours(&self, period: Period, element_id: Option<&str>) -> f64 {
        self.get(&HourKey {
            period,
            element_id: element_id.map(str::to_string),
        })
    }

    pub fn contains(&self, key: &HourKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Overwrites the value of a single key.
    pub fn set(&mut self, key: HourKey, hours: f64) -> Result<()> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(BudgetError::InvalidArgument(format!(
                "hours for {} must be a non-negative number, got {}",
                key.period, hours
            )));
        }
        self.entries.insert(key, hours);
        Ok(())
    }

    pub(crate) fn insert_unchecked(&mut self, key: HourKey, hours: f64) {
        debug_assert!(hours >= 0.0);
        self.entries.insert(key, hours);
    }

    pub fn remove(&mut self, key: &HourKey) -> Option<f64> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HourKey, f64)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    /// Column total: all hours in `period` across elements.
    pub fn total_for_period(&self, period: Period) -> f64 {
        self.entries
            .iter()
            .filter(|(k, _)| k.period == period)
            .map(|(_, v)| v)
            .sum()
    }

    /// Row total: all hours attributed to `element_id` (`None` for
    /// project-level hours).
    pub fn total_for_element(&self, element_id: Option<&str>) -> f64 {
        self.entries
            .iter()
            .filter(|(k, _)| k.element_id.as_deref() == element_id)
            .map(|(_, v)| v)
            .sum()
    }

    pub fn periods(&self) -> BTreeSet<Period> {
        self.entries.keys().map(|k| k.period).collect()
    }

    pub fn to_entries(&self) -> Vec<HourEntry> {
        self.entries
            .iter()
            .map(|(k, v)| HourEntry {
                period: k.period,
                element_id: k.element_id.clone(),
                hours: *v,
            })
            .collect()
    }
}

impl From<Vec<HourEntry>> for HourMap {
    fn from(entries: Vec<HourEntry>) -> Self {
        merge(&HourMap::new(), &entries)
    }
}

impl From<HourMap> for Vec<HourEntry> {
    fn from(map: HourMap) -> Self {
        map.to_entries()
    }
}

/// Adds `incoming` hours onto a copy of `existing`, summing on key
/// collision. `existing` is left untouched.
///
/// Merging the same entries twice counts them twice: re-importing a file
/// doubles its rows unless the caller clears the map first.
pub fn merge(existing: &HourMap, incoming: &[HourEntry]) -> HourMap {
    let mut merged = existing.clone();
    let mut skipped = 0usize;

    for entry in incoming {
        if !entry.hours.is_finite() || entry.hours < 0.0 {
            skipped += 1;
            continue;
        }
        *merged.entries.entry(entry.key()).or_insert(0.0) += entry.hours;
    }

    if skipped > 0 {
        warn!("Skipped {} negative or non-numeric entries while merging", skipped);
    }
    debug!(
        "Merged {} entries into a map of {} keys ({} keys after merge)",
        incoming.len() - skipped,
        existing.len(),
        merged.len()
    );

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan() -> Period {
        Period::new(2025, 1).unwrap()
    }

    fn feb() -> Period {
        Period::new(2025, 2).unwrap()
    }

    fn entry(period: Period, element_id: Option<&str>, hours: f64) -> HourEntry {
        HourEntry {
            period,
            element_id: element_id.map(str::to_string),
            hours,
        }
    }

    #[test]
    fn test_merge_accumulates_on_reimport() {
        let incoming = vec![entry(jan(), None, 10.0)];
        let once = merge(&HourMap::new(), &incoming);
        let twice = merge(&once, &incoming);

        assert_eq!(once.hours(jan(), None), 10.0);
        assert_eq!(twice.hours(jan(), None), 20.0);
    }

    #[test]
    fn test_merge_does_not_mutate_existing() {
        let mut existing = HourMap::new();
        existing.set(HourKey::aggregate(jan()), 5.0).unwrap();

        let merged = merge(&existing, &[entry(jan(), None, 3.0)]);

        assert_eq!(existing.hours(jan(), None), 5.0);
        assert_eq!(merged.hours(jan(), None), 8.0);
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let mut existing = HourMap::new();
        existing.set(HourKey::for_element(feb(), "e1"), 12.5).unwrap();
        assert_eq!(merge(&existing, &[]), existing);
    }

    #[test]
    fn test_merge_keeps_element_keys_apart() {
        let merged = merge(
            &HourMap::new(),
            &[
                entry(jan(), Some("e1"), 4.0),
                entry(jan(), Some("e2"), 6.0),
                entry(jan(), None, 1.0),
            ],
        );
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.total_for_period(jan()), 11.0);
        assert_eq!(merged.total_for_element(Some("e1")), 4.0);
        assert_eq!(merged.total_for_element(None), 1.0);
    }

    #[test]
    fn test_merge_skips_negative_hours() {
        let merged = merge(&HourMap::new(), &[entry(jan(), None, -4.0)]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_set_rejects_negative() {
        let mut map = HourMap::new();
        assert!(map.set(HourKey::aggregate(jan()), -1.0).is_err());
        assert!(map.set(HourKey::aggregate(jan()), f64::NAN).is_err());
        assert!(map.is_empty());
    }

    #[test]
    fn test_missing_key_reads_as_zero() {
        let map = HourMap::new();
        assert_eq!(map.hours(jan(), Some("e1")), 0.0);
    }

    #[test]
    fn test_json_roundtrip_as_entry_list() {
        let map = merge(
            &HourMap::new(),
            &[entry(jan(), Some("e1"), 4.0), entry(feb(), None, 2.0)],
        );
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.starts_with('['));
        let back: HourMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
