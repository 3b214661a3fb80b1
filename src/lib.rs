pub mod bitcoind_flexible;
pub mod config;
pub mod core;
pub mod debug;
pub mod error;
pub mod runtime;

// Test utilities available for testing
// Always compiled to support both unit tests and integration tests
pub mod test_utils;

pub use crate::core::record::BlockStatsRecord;
pub use crate::core::source::{ChainInfo, ChainStatsSource};
pub use crate::core::sync::{SyncOptions, SyncOutcome, run_sync};
pub use crate::error::{SyncError, StorageError};
