//! Inner join of keyed metric slices.
//!
//! The ranking queries compare two slices of the same table (two years, or
//! boys against girls) location by location. Both sides are reduced to
//! `(key, value)` pairs first; the right side is indexed in a lookup map and
//! the left side drives the output order.

use std::collections::{HashMap, HashSet};

use log::debug;

/// One side of a join: keys with their metric, in table order.
pub type KeyedValues = Vec<(String, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedPair {
    pub key: String,
    pub left: f64,
    pub right: f64,
}

/// Pairs every left key that also appears on the right. Keys present on
/// one side only are dropped. When a key repeats within a side, its first
/// occurrence is used.
pub fn inner_join(left: &KeyedValues, right: &KeyedValues) -> Vec<JoinedPair> {
    let right_lookup = build_lookup(right);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut joined = Vec::new();
    for (key, left_value) in left {
        if !seen.insert(key.as_str()) {
            continue;
        }
        if let Some(right_value) = right_lookup.get(key.as_str()) {
            joined.push(JoinedPair {
                key: key.clone(),
                left: *left_value,
                right: *right_value,
            });
        }
    }
    debug!(
        "Inner join: {} left key(s), {} right key(s), {} matched",
        seen.len(),
        right_lookup.len(),
        joined.len()
    );
    joined
}

fn build_lookup(side: &KeyedValues) -> HashMap<&str, f64> {
    let mut map = HashMap::with_capacity(side.len());
    for (key, value) in side {
        map.entry(key.as_str()).or_insert(*value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(pairs: &[(&str, f64)]) -> KeyedValues {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn keeps_only_keys_on_both_sides_in_left_order() {
        let left = side(&[("SWE", 1.0), ("FIN", 2.0), ("NOR", 3.0)]);
        let right = side(&[("NOR", 30.0), ("SWE", 10.0), ("DNK", 40.0)]);
        let joined = inner_join(&left, &right);
        let keys = joined.iter().map(|p| p.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["SWE", "NOR"]);
        assert_eq!(joined[1].right, 30.0);
    }

    #[test]
    fn duplicate_keys_use_first_occurrence() {
        let left = side(&[("SWE", 1.0), ("SWE", 5.0)]);
        let right = side(&[("SWE", 2.0), ("SWE", 9.0)]);
        assert_eq!(
            inner_join(&left, &right),
            vec![JoinedPair {
                key: "SWE".into(),
                left: 1.0,
                right: 2.0
            }]
        );
    }
}
