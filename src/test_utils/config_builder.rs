use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use crate::config::AppConfig;
use crate::core::planner::DEFAULT_MAX_BLOCKS;
use crate::runtime::dataset::DEFAULT_INCREMENTAL_SUBDIR;

/// Builder for creating test AppConfig instances with a temporary dataset root
pub struct TestConfigBuilder {
    config: AppConfig,
    temp_dirs: Vec<TempDir>,
}

impl TestConfigBuilder {
    /// Create a new test config builder with sensible defaults
    pub fn new() -> Self {
        let data_temp = TempDir::new().expect("create temp data dir");

        let config = AppConfig {
            data_dir: data_temp.path().to_path_buf(),
            incremental_subdir: DEFAULT_INCREMENTAL_SUBDIR.to_string(),
            max_blocks: DEFAULT_MAX_BLOCKS,
            include_incremental: true,
            rpc_timeout: Duration::from_secs(5),
            endpoints: vec!["http://127.0.0.1:8332/".to_string()], // Placeholder
        };

        Self { config, temp_dirs: vec![data_temp] }
    }

    pub fn with_max_blocks(mut self, max_blocks: u64) -> Self {
        self.config.max_blocks = max_blocks;
        self
    }

    pub fn with_incremental_in_dataset(mut self, enabled: bool) -> Self {
        self.config.include_incremental = enabled;
        self
    }

    pub fn with_endpoints(mut self, endpoints: &[&str]) -> Self {
        self.config.endpoints = endpoints.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Path of the dataset root the config points at
    pub fn data_dir(&self) -> PathBuf {
        self.config.data_dir.clone()
    }

    /// Build and return the config along with temp directory handles
    /// The caller must keep the TempDir handles alive to prevent cleanup
    pub fn build(self) -> (AppConfig, Vec<TempDir>) {
        (self.config, self.temp_dirs)
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
