use std::time::Instant;

use time::Date;
use tracing::{debug, info, info_span, warn};

use crate::core::fetcher::fetch_batch;
use crate::core::planner::{DEFAULT_MAX_BLOCKS, SyncPlan};
use crate::core::source::ChainStatsSource;
use crate::core::timestamps::normalize_dataset;
use crate::core::validate::ensure_contiguous;
use crate::error::{Result, SyncError};
use crate::runtime::dataset::DatasetLayout;
use crate::runtime::partition::{PartitionWrite, persist_batch};
use crate::stage_timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub max_blocks: u64,
    pub include_incremental: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { max_blocks: DEFAULT_MAX_BLOCKS, include_incremental: true }
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Remote tip is not ahead of the local dataset.
    UpToDate(SyncPlan),
    /// Every height in the window failed or came back empty.
    NothingFetched { plan: SyncPlan, failed: Vec<u64> },
    Saved { plan: SyncPlan, write: PartitionWrite, fetched: usize, failed: Vec<u64> },
}

impl SyncOutcome {
    pub fn plan(&self) -> &SyncPlan {
        match self {
            SyncOutcome::UpToDate(plan) => plan,
            SyncOutcome::NothingFetched { plan, .. } => plan,
            SyncOutcome::Saved { plan, .. } => plan,
        }
    }
}

/// One incremental sync pass.
///
/// The dataset is read and checked before the remote is contacted, so a gap
/// aborts the run without any network traffic. `day` names the partition the
/// batch lands in.
pub fn run_sync<S: ChainStatsSource + ?Sized>(
    source: &S,
    layout: &DatasetLayout,
    options: &SyncOptions,
    day: Date,
) -> Result<SyncOutcome> {
    let span = info_span!("sync_run", max_blocks = options.max_blocks);
    let _enter = span.enter();
    let started = Instant::now();

    let dataset = {
        stage_timer!("read_dataset");
        layout.load_local_dataset(options.include_incremental)?
    };
    {
        stage_timer!("validate");
        ensure_contiguous(&dataset)?;
    }
    let normalized = {
        stage_timer!("normalize");
        normalize_dataset(&dataset)?
    };
    if let Some((first, last)) = normalized.time_range() {
        debug!(first_time_us = first, last_time_us = last, "normalized dataset timestamps");
    }
    let local_last_height = normalized
        .last_height()
        .ok_or_else(|| SyncError::EmptyDataset(layout.data_dir().to_path_buf()))?;

    let remote_height = source
        .chain_info()
        .map_err(|e| SyncError::Remote(format!("failed to query chain tip: {e:#}")))?
        .blocks;
    info!(remote_height, "current blockchain height");
    info!(local_last_height, "last saved height");

    let plan = SyncPlan::new(remote_height, local_last_height, options.max_blocks);
    let Some(range) = plan.fetch_range() else {
        info!("no new blocks to fetch, data is up to date");
        return Ok(SyncOutcome::UpToDate(plan));
    };

    info!(
        start = *range.start(),
        end = *range.end(),
        blocks_to_fetch = plan.blocks_to_fetch,
        still_behind = plan.remaining_after(),
        "fetching blocks"
    );
    let batch = {
        stage_timer!("fetch");
        fetch_batch(source, range)
    };
    let failed = batch.failed_heights();

    if batch.is_empty() {
        warn!(failed = failed.len(), empty = batch.empty.len(), "no blocks were successfully fetched");
        return Ok(SyncOutcome::NothingFetched { plan, failed });
    }

    let fetched = batch.records.len();
    let write = {
        stage_timer!("merge");
        persist_batch(layout, day, batch.records)?
    };

    info!(
        saved = fetched,
        failed = failed.len(),
        path = %write.path.display(),
        elapsed_secs = %format!("{:.2}", started.elapsed().as_secs_f64()),
        "saved blocks"
    );
    Ok(SyncOutcome::Saved { plan, write, fetched, failed })
}
