use std::ops::RangeInclusive;

use tracing::{info, warn};

use crate::core::record::BlockStatsRecord;
use crate::core::source::ChainStatsSource;

/// Result of asking the source for one height.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(BlockStatsRecord),
    /// The source answered but had nothing to record.
    Empty,
    Failed(String),
}

impl FetchOutcome {
    /// One request, no retry. Stats for any other height than the one asked
    /// for count as a failure of the requested height.
    pub fn request<S: ChainStatsSource + ?Sized>(source: &S, height: u64) -> Self {
        match source.block_stats(height) {
            Ok(Some(record)) if record.height != height => {
                FetchOutcome::Failed(format!("provider returned height {}", record.height))
            }
            Ok(Some(record)) => FetchOutcome::Fetched(record),
            Ok(None) => FetchOutcome::Empty,
            Err(e) => FetchOutcome::Failed(format!("{e:#}")),
        }
    }
}

/// Records collected from one window plus what was left behind.
#[derive(Debug, Default)]
pub struct FetchedBatch {
    pub records: Vec<BlockStatsRecord>,
    pub empty: Vec<u64>,
    pub failed: Vec<(u64, String)>,
}

impl FetchedBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failed_heights(&self) -> Vec<u64> {
        self.failed.iter().map(|(h, _)| *h).collect()
    }
}

/// Requests every height of `range` in ascending order, exactly once each.
///
/// A failing height is logged and skipped; it never aborts the batch.
pub fn fetch_batch<S: ChainStatsSource + ?Sized>(
    source: &S,
    range: RangeInclusive<u64>,
) -> FetchedBatch {
    let total = range.end().saturating_sub(*range.start()) + 1;
    let mut batch = FetchedBatch::default();

    for height in range {
        match FetchOutcome::request(source, height) {
            FetchOutcome::Fetched(record) => {
                batch.records.push(record);
            }
            FetchOutcome::Empty => {
                batch.empty.push(height);
            }
            FetchOutcome::Failed(reason) => {
                warn!(height, error = %reason, "failed to fetch block");
                batch.failed.push((height, reason));
                continue;
            }
        }
        info!(height, fetched = batch.records.len(), total, "fetched block");
    }

    batch
}
