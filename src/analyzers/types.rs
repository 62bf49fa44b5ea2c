//! Data types produced by the aggregator.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::analyzers::utility::{mean, stddev};

/// Ordered mapping from group key to value.
///
/// Keys iterate in the order they were first seen in the input, so grouping is
/// stable with respect to the record order.
#[derive(Debug, Clone)]
pub struct Grouped<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for Grouped<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> Grouped<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `key`, inserting `init()` at the end if it is new.
    pub fn entry_or_insert_with(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        let pos = match self.index.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.index.insert(key.clone(), pos);
                self.entries.push((key, init()));
                pos
            }
        };
        &mut self.entries[pos].1
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Applies `f` to every value, dropping the groups for which it returns `None`.
    pub fn filter_map_values<W>(self, mut f: impl FnMut(&K, V) -> Option<W>) -> Grouped<K, W> {
        let mut out = Grouped::new();
        for (key, value) in self.entries {
            if let Some(w) = f(&key, value) {
                out.entry_or_insert_with(key, || w);
            }
        }
        out
    }

    pub fn map_values<W>(self, mut f: impl FnMut(&K, V) -> W) -> Grouped<K, W> {
        self.filter_map_values(|k, v| Some(f(k, v)))
    }
}

impl<K, V> Grouped<K, V> {
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<(K, V)> {
        self.entries
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Grouped<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Serialize, V: Serialize> Serialize for Grouped<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Count, mean, extremes and spread of one numeric series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub stddev: f64,
}

impl Summary {
    /// Summarizes `values`. An empty slice gives the all-zero summary.
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let average = mean(values);
        Self {
            count: values.len(),
            average,
            highest: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            lowest: values.iter().copied().fold(f64::INFINITY, f64::min),
            stddev: stddev(values, average),
        }
    }
}

/// Sort order for rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

/// How a missing or non-numeric value contributes to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingValues {
    /// Counted as `0`, which pulls averages down.
    #[default]
    AsZero,
    /// Left out of the aggregate entirely, denominator included.
    Skip,
}

/// An item in a ranking together with its 1-based position and sort value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub rank: usize,
    pub value: f64,
    pub item: T,
}

/// A histogram bucket together with its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share<K> {
    pub bucket: K,
    pub count: usize,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_keeps_first_seen_order() {
        let mut g: Grouped<&str, usize> = Grouped::new();
        *g.entry_or_insert_with("b", || 0) += 1;
        *g.entry_or_insert_with("a", || 0) += 1;
        *g.entry_or_insert_with("b", || 0) += 1;

        assert_eq!(g.keys().copied().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(g.get("b"), Some(&2));
        assert_eq!(g.get("c"), None);
    }

    #[test]
    fn test_grouped_serializes_as_object() {
        let mut g: Grouped<String, f64> = Grouped::new();
        g.entry_or_insert_with("10B".to_string(), || 90.0);
        g.entry_or_insert_with("10A".to_string(), || 80.0);

        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, r#"{"10B":90.0,"10A":80.0}"#);
    }

    #[test]
    fn test_filter_map_values_drops_groups() {
        let mut g: Grouped<&str, i32> = Grouped::new();
        g.entry_or_insert_with("keep", || 1);
        g.entry_or_insert_with("drop", || 0);

        let g = g.filter_map_values(|_, v| (v > 0).then_some(v));
        assert_eq!(g.len(), 1);
        assert!(g.contains_key("keep"));
    }

    #[test]
    fn test_summary_of_empty_is_default() {
        assert_eq!(Summary::of(&[]), Summary::default());
    }

    #[test]
    fn test_summary_of_values() {
        let s = Summary::of(&[85.0, 75.0, 90.0]);
        assert_eq!(s.count, 3);
        assert!((s.average - 83.333333).abs() < 1e-5);
        assert_eq!(s.highest, 90.0);
        assert_eq!(s.lowest, 75.0);
    }
}
