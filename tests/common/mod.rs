// Common utilities for integration tests

mod test_harness;

// Re-export test utilities for convenience in integration tests
#[allow(unused_imports)]
pub use statsync::test_utils::{MockChainSource, TestConfigBuilder, sample_block_stats};

// Re-export the full test harness
pub use test_harness::SyncTestHarness;
