use std::fs;
use std::path::PathBuf;

use time::{Date, OffsetDateTime};
use tracing::{debug, info};

use crate::core::merge::merge_last_wins;
use crate::core::record::BlockStatsRecord;
use crate::error::Result;
use crate::runtime::dataset::DatasetLayout;
use crate::runtime::store;

/// Current UTC calendar day, which names the partition a run writes to.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionWrite {
    pub path: PathBuf,
    /// Rows in the partition after the merge.
    pub rows: usize,
    /// Rows that were already in the partition before this write.
    pub previous_rows: usize,
}

/// Folds `batch` into the partition for `day` and rewrites it.
///
/// Existing rows come first, the batch after them, duplicates resolved in
/// favor of the later copy. The file is replaced as a whole.
pub fn persist_batch(
    layout: &DatasetLayout,
    day: Date,
    batch: Vec<BlockStatsRecord>,
) -> Result<PartitionWrite> {
    fs::create_dir_all(layout.incremental_dir())?;
    let path = layout.partition_path(day);

    let (merged, previous_rows) = if path.exists() {
        let existing = store::read_records(&path)?;
        let previous_rows = existing.len();
        debug!(path = %path.display(), rows = previous_rows, "merging into existing partition");
        (merge_last_wins(existing, batch), previous_rows)
    } else {
        (batch, 0)
    };

    store::write_records(&path, &merged)?;
    info!(path = %path.display(), rows = merged.len(), previous_rows, "partition written");
    Ok(PartitionWrite { path, rows: merged.len(), previous_rows })
}
