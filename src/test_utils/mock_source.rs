use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use anyhow::{Result, anyhow};

use crate::core::record::BlockStatsRecord;
use crate::core::source::{ChainInfo, ChainStatsSource};
use crate::test_utils::fixtures::sample_block_stats;

/// What the mock answers for one height.
#[derive(Debug, Clone)]
pub enum MockBlock {
    Stats(BlockStatsRecord),
    Empty,
    Fail(String),
}

/// Mock stats provider for testing
/// Serves canned answers per height and records every request it sees
pub struct MockChainSource {
    blocks: RefCell<HashMap<u64, MockBlock>>,
    tip: Cell<u64>,
    chain_info_error: RefCell<Option<String>>,
    chain_info_calls: Cell<usize>,
    requested: RefCell<Vec<u64>>,
}

impl MockChainSource {
    /// Create a new empty mock with tip 0
    pub fn new() -> Self {
        Self {
            blocks: RefCell::new(HashMap::new()),
            tip: Cell::new(0),
            chain_info_error: RefCell::new(None),
            chain_info_calls: Cell::new(0),
            requested: RefCell::new(Vec::new()),
        }
    }

    /// Stats for every height in `first..=tip`, tip set to `tip`
    pub fn with_chain(first: u64, tip: u64) -> Self {
        let mock = Self::new();
        for height in first..=tip {
            mock.add_block(height, MockBlock::Stats(sample_block_stats(height)));
        }
        mock.tip.set(tip);
        mock
    }

    pub fn add_block(&self, height: u64, block: MockBlock) {
        self.blocks.borrow_mut().insert(height, block);
        if height > self.tip.get() {
            self.tip.set(height);
        }
    }

    pub fn set_stats(&self, record: BlockStatsRecord) {
        self.add_block(record.height, MockBlock::Stats(record));
    }

    pub fn fail_at(&self, height: u64, reason: &str) {
        self.add_block(height, MockBlock::Fail(reason.to_string()));
    }

    pub fn empty_at(&self, height: u64) {
        self.add_block(height, MockBlock::Empty);
    }

    /// Tip reported by `chain_info`, independent of which heights have answers
    pub fn set_tip(&self, tip: u64) {
        self.tip.set(tip);
    }

    pub fn fail_chain_info(&self, reason: &str) {
        *self.chain_info_error.borrow_mut() = Some(reason.to_string());
    }

    /// Heights passed to `block_stats`, in call order
    pub fn requested(&self) -> Vec<u64> {
        self.requested.borrow().clone()
    }

    pub fn chain_info_calls(&self) -> usize {
        self.chain_info_calls.get()
    }

    /// Total calls of either kind
    pub fn network_calls(&self) -> usize {
        self.chain_info_calls() + self.requested.borrow().len()
    }
}

impl Default for MockChainSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainStatsSource for MockChainSource {
    fn chain_info(&self) -> Result<ChainInfo> {
        self.chain_info_calls.set(self.chain_info_calls.get() + 1);
        if let Some(reason) = self.chain_info_error.borrow().as_ref() {
            return Err(anyhow!("{reason}"));
        }
        Ok(ChainInfo { blocks: self.tip.get() })
    }

    fn block_stats(&self, height: u64) -> Result<Option<BlockStatsRecord>> {
        self.requested.borrow_mut().push(height);
        match self.blocks.borrow().get(&height) {
            Some(MockBlock::Stats(record)) => Ok(Some(record.clone())),
            Some(MockBlock::Empty) => Ok(None),
            Some(MockBlock::Fail(reason)) => Err(anyhow!("{reason}")),
            None => Err(anyhow!("Target block height {height} after current tip {}", self.tip.get())),
        }
    }
}
