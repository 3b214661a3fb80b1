use std::collections::HashMap;

use crate::core::record::BlockStatsRecord;

/// Appends `batch` after `existing` and drops every record whose height
/// appears again later on.
///
/// Survivors keep the position of their last occurrence, so a re-fetched
/// height moves to where the newer copy sits.
pub fn merge_last_wins(
    existing: Vec<BlockStatsRecord>,
    batch: Vec<BlockStatsRecord>,
) -> Vec<BlockStatsRecord> {
    let combined: Vec<BlockStatsRecord> = existing.into_iter().chain(batch).collect();

    let mut last_index: HashMap<u64, usize> = HashMap::with_capacity(combined.len());
    for (idx, rec) in combined.iter().enumerate() {
        last_index.insert(rec.height, idx);
    }

    combined
        .into_iter()
        .enumerate()
        .filter(|(idx, rec)| last_index.get(&rec.height) == Some(idx))
        .map(|(_, rec)| rec)
        .collect()
}
