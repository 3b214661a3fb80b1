use crate::core::dataset::LocalDataset;
use crate::error::{Result, SyncError};

/// Rejects a dataset whose consecutive heights jump by more than one.
///
/// Heights are compared in storage order. Repeated or decreasing heights are
/// not gaps. On failure the first offending pair is reported together with the
/// largest jump found anywhere in the dataset.
pub fn ensure_contiguous(dataset: &LocalDataset) -> Result<()> {
    let mut first: Option<(u64, u64)> = None;
    let mut largest_gap = 0u64;

    for pair in dataset.rows().windows(2) {
        let (prev, next) = (pair[0].height, pair[1].height);
        let diff = next.saturating_sub(prev);
        if diff > 1 {
            first.get_or_insert((prev, next));
            largest_gap = largest_gap.max(diff);
        }
    }

    match first {
        None => Ok(()),
        Some((after, next)) => Err(SyncError::DataIntegrity { after, next, largest_gap }),
    }
}
