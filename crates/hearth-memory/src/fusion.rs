// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reciprocal Rank Fusion.

use std::collections::HashMap;
use std::hash::Hash;

/// RRF smoothing constant.
pub const RRF_K: f64 = 60.0;

/// Merge ranked lists: each item scores `1 / (RRF_K + rank + 1)` per list it
/// appears in, with `rank` 0-based.
///
/// Output is sorted by score descending. Equal scores keep the order in which
/// items were first seen (earlier lists, then earlier ranks). An item repeated
/// within one list only counts at its best rank.
pub fn reciprocal_rank_fusion<K>(lists: &[Vec<K>]) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
{
    let mut scores: HashMap<K, (f64, usize)> = HashMap::new();
    let mut next_seen = 0usize;

    for list in lists {
        let mut counted: std::collections::HashSet<&K> = std::collections::HashSet::new();
        for (rank, key) in list.iter().enumerate() {
            if !counted.insert(key) {
                continue;
            }
            let entry = scores.entry(key.clone()).or_insert_with(|| {
                next_seen += 1;
                (0.0, next_seen)
            });
            entry.0 += 1.0 / (RRF_K + rank as f64 + 1.0);
        }
    }

    let mut fused: Vec<(K, f64, usize)> = scores
        .into_iter()
        .map(|(key, (score, seen))| (key, score, seen))
        .collect();
    fused.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });
    fused.into_iter().map(|(key, score, _)| (key, score)).collect()
}
