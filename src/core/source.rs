use anyhow::Result;
use serde::Deserialize;

use crate::core::record::BlockStatsRecord;

/// Subset of `getblockchaininfo` the sync needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChainInfo {
    /// Height of the provider's best block.
    pub blocks: u64,
}

/// Source of per-block statistics for a chain.
pub trait ChainStatsSource {
    /// Current chain tip as seen by the provider.
    fn chain_info(&self) -> Result<ChainInfo>;

    /// Stats for the block at `height`; `Ok(None)` when the provider has
    /// nothing to report for it.
    fn block_stats(&self, height: u64) -> Result<Option<BlockStatsRecord>>;
}

impl<T: ChainStatsSource + ?Sized> ChainStatsSource for &T {
    fn chain_info(&self) -> Result<ChainInfo> {
        (**self).chain_info()
    }

    fn block_stats(&self, height: u64) -> Result<Option<BlockStatsRecord>> {
        (**self).block_stats(height)
    }
}
