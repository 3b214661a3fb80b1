use std::ops::RangeInclusive;

/// Default ceiling on blocks fetched by one invocation.
pub const DEFAULT_MAX_BLOCKS: u64 = 5;

/// How far the local dataset lags the remote tip, and what to do about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPlan {
    pub remote_height: u64,
    pub local_last_height: u64,
    pub blocks_to_fetch: u64,
}

impl SyncPlan {
    /// `min(remote - local, max_blocks)`, clamped at zero when the remote
    /// tip is at or behind the local dataset.
    pub fn new(remote_height: u64, local_last_height: u64, max_blocks: u64) -> Self {
        let blocks_to_fetch = remote_height.saturating_sub(local_last_height).min(max_blocks);
        Self { remote_height, local_last_height, blocks_to_fetch }
    }

    pub fn is_up_to_date(&self) -> bool {
        self.blocks_to_fetch == 0
    }

    /// Inclusive window of heights to request, `None` when there is nothing to do.
    pub fn fetch_range(&self) -> Option<RangeInclusive<u64>> {
        if self.is_up_to_date() {
            return None;
        }
        let start = self.local_last_height + 1;
        Some(start..=self.local_last_height + self.blocks_to_fetch)
    }

    /// Blocks the remote is ahead by, beyond this run's window.
    pub fn remaining_after(&self) -> u64 {
        self.remote_height
            .saturating_sub(self.local_last_height)
            .saturating_sub(self.blocks_to_fetch)
    }
}
