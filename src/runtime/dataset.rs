use std::path::{Path, PathBuf};

use time::Date;
use tracing::{debug, info};

use crate::core::dataset::LocalDataset;
use crate::error::{Result, SyncError};
use crate::runtime::store::{self, PARQUET_EXTENSION};

pub const DEFAULT_INCREMENTAL_SUBDIR: &str = "incremental";
pub const PARTITION_PREFIX: &str = "incremental_block_stats_";

/// On-disk layout of the block stats dataset.
///
/// ```text
/// <data_dir>/*.parquet                                       base dataset
/// <data_dir>/incremental/incremental_block_stats_YYYY-MM-DD.parquet
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    data_dir: PathBuf,
    incremental_dir: PathBuf,
}

impl DatasetLayout {
    pub fn new(data_dir: impl AsRef<Path>, incremental_subdir: &str) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        let incremental_dir = data_dir.join(incremental_subdir);
        Self { data_dir, incremental_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn incremental_dir(&self) -> &Path {
        &self.incremental_dir
    }

    /// Path of the partition holding blocks fetched on `day` (UTC).
    pub fn partition_path(&self, day: Date) -> PathBuf {
        self.incremental_dir.join(format!(
            "{PARTITION_PREFIX}{}.{PARQUET_EXTENSION}",
            partition_day_label(day)
        ))
    }

    pub fn base_files(&self) -> Result<Vec<PathBuf>> {
        store::list_parquet_files(&self.data_dir)
    }

    /// Existing partitions, oldest day first.
    pub fn partition_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = store::list_parquet_files(&self.incremental_dir)?;
        files.retain(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(PARTITION_PREFIX))
        });
        Ok(files)
    }

    /// Loads the height/time projection of the local dataset.
    ///
    /// Base files come first in file-name order. With `include_incremental`
    /// the day partitions are appended after them.
    pub fn load_local_dataset(&self, include_incremental: bool) -> Result<LocalDataset> {
        if !self.data_dir.is_dir() {
            return Err(SyncError::Config(format!(
                "data directory does not exist: {}",
                self.data_dir.display()
            )));
        }

        let mut files = self.base_files()?;
        if include_incremental {
            files.extend(self.partition_files()?);
        }

        let mut dataset = LocalDataset::default();
        for file in &files {
            let rows = store::read_height_time(file)?;
            debug!(path = %file.display(), rows = rows.len(), "read dataset file");
            dataset.extend(rows);
        }

        if dataset.is_empty() {
            return Err(SyncError::EmptyDataset(self.data_dir.clone()));
        }
        info!(files = files.len(), rows = dataset.len(), "loaded local dataset");
        Ok(dataset)
    }
}

/// `YYYY-MM-DD`
pub fn partition_day_label(day: Date) -> String {
    format!("{:04}-{:02}-{:02}", day.year(), u8::from(day.month()), day.day())
}
