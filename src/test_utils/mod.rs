// Test utilities for sync integration testing

pub use tempfile::TempDir;

pub mod config_builder;
pub mod fixtures;
pub mod mock_source;

// Re-export commonly used items
pub use config_builder::TestConfigBuilder;
pub use fixtures::{
    GENESIS_TIME, contiguous_dataset, contiguous_rows, sample_block_stats, write_height_time_file,
    write_heights_only_file,
};
pub use mock_source::{MockBlock, MockChainSource};
