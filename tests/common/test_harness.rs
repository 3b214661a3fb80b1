/// Integration test harness for sync runs
///
/// Combines a temporary dataset root seeded with Parquet files, a
/// MockChainSource standing in for the provider, and a fixed partition day
/// so runs are reproducible.
use anyhow::Result;
use statsync::config::AppConfig;
use statsync::core::dataset::RawTimestamp;
use statsync::core::record::BlockStatsRecord;
use statsync::runtime::dataset::DatasetLayout;
use statsync::runtime::store;
use statsync::test_utils::{MockChainSource, TestConfigBuilder, contiguous_rows, write_height_time_file};
use statsync::{SyncError, SyncOutcome, run_sync};
use tempfile::TempDir;
use time::Date;
use time::macros::date;

pub const RUN_DAY: Date = date!(2024 - 04 - 20);

pub struct SyncTestHarness {
    pub source: MockChainSource,
    pub config: AppConfig,
    pub layout: DatasetLayout,
    files_written: usize,

    // Resource cleanup
    _temp_dirs: Vec<TempDir>,
}

#[allow(dead_code)]
impl SyncTestHarness {
    pub fn new() -> Self {
        Self::with_builder(TestConfigBuilder::new())
    }

    pub fn with_builder(builder: TestConfigBuilder) -> Self {
        let (config, temp_dirs) = builder.build();
        let layout = config.layout();
        Self { source: MockChainSource::new(), config, layout, files_written: 0, _temp_dirs: temp_dirs }
    }

    /// Adds one base dataset file holding `start..=end`.
    pub fn seed_contiguous(&mut self, start: u64, end: u64) -> Result<()> {
        self.seed_rows(&contiguous_rows(start, end))
    }

    /// Adds one base dataset file with exactly these rows.
    pub fn seed_rows(&mut self, rows: &[(u64, RawTimestamp)]) -> Result<()> {
        self.files_written += 1;
        let path = self
            .layout
            .data_dir()
            .join(format!("block_stats_{:04}.parquet", self.files_written));
        write_height_time_file(&path, rows)
    }

    /// Provider has stats for `first..=tip` and reports `tip`.
    pub fn remote_chain(&mut self, first: u64, tip: u64) {
        self.source = MockChainSource::with_chain(first, tip);
    }

    pub fn run(&self) -> Result<SyncOutcome, SyncError> {
        self.run_on(RUN_DAY)
    }

    pub fn run_on(&self, day: Date) -> Result<SyncOutcome, SyncError> {
        run_sync(&self.source, &self.layout, &self.config.sync_options(), day)
    }

    pub fn partition(&self) -> Result<Vec<BlockStatsRecord>> {
        self.partition_on(RUN_DAY)
    }

    pub fn partition_on(&self, day: Date) -> Result<Vec<BlockStatsRecord>> {
        Ok(store::read_records(&self.layout.partition_path(day))?)
    }

    pub fn partition_heights(&self) -> Result<Vec<u64>> {
        self.partition_heights_on(RUN_DAY)
    }

    pub fn partition_heights_on(&self, day: Date) -> Result<Vec<u64>> {
        Ok(self.partition_on(day)?.iter().map(|r| r.height).collect())
    }

    pub fn partition_exists(&self) -> bool {
        self.layout.partition_path(RUN_DAY).exists()
    }
}
