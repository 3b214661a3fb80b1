use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::core::planner::DEFAULT_MAX_BLOCKS;
use crate::core::sync::SyncOptions;
use crate::error::SyncError;
use crate::runtime::dataset::{DEFAULT_INCREMENTAL_SUBDIR, DatasetLayout};

pub const DEFAULT_ENDPOINT_ENV_PREFIX: &str = "quicknode_endpoint_";
pub const DEFAULT_ENDPOINT_SLOTS: u32 = 10;

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/onchain/BTC/block_stats_fragments")
}

fn default_incremental_subdir() -> String {
    DEFAULT_INCREMENTAL_SUBDIR.to_string()
}

fn default_max_blocks() -> u64 {
    DEFAULT_MAX_BLOCKS
}

fn default_include_incremental() -> bool {
    true
}

fn default_rpc_timeout_secs() -> u64 {
    120
}

fn default_endpoint_env_prefix() -> String {
    DEFAULT_ENDPOINT_ENV_PREFIX.to_string()
}

fn default_endpoint_slots() -> u32 {
    DEFAULT_ENDPOINT_SLOTS
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_incremental_subdir")]
    pub incremental_subdir: String,
    #[serde(default = "default_max_blocks")]
    pub max_blocks: u64,
    #[serde(default = "default_include_incremental")]
    pub include_incremental: bool,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    #[serde(default = "default_endpoint_env_prefix")]
    pub endpoint_env_prefix: String,
    #[serde(default = "default_endpoint_slots")]
    pub endpoint_slots: u32,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            incremental_subdir: default_incremental_subdir(),
            max_blocks: default_max_blocks(),
            include_incremental: default_include_incremental(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            endpoint_env_prefix: default_endpoint_env_prefix(),
            endpoint_slots: default_endpoint_slots(),
        }
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(version, about = "Pull new Bitcoin block stats into a day-partitioned Parquet dataset", long_about = None)]
pub struct CliArgs {
    /// Path to an optional JSON config file.
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Dataset root; overrides the config file.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Most blocks fetched by one run; overrides the config file.
    #[arg(long)]
    pub max_blocks: Option<u64>,

    /// Count existing day partitions as part of the local dataset
    /// (`--include-incremental=false` to turn off); overrides the config file.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub include_incremental: Option<bool>,

    /// Read only the base files, ignoring day partitions.
    #[arg(long, conflicts_with = "include_incremental")]
    pub base_only: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Fully resolved settings for one run. Nothing downstream reads the
/// environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub incremental_subdir: String,
    pub max_blocks: u64,
    pub include_incremental: bool,
    pub rpc_timeout: Duration,
    /// Provider endpoint URLs in slot order.
    pub endpoints: Vec<String>,
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_json::from_str(&raw).context("failed to parse config JSON")
}

/// Collects `<prefix>1 ..= <prefix><slots>`, skipping unset or blank slots.
pub fn scan_endpoints<F>(prefix: &str, slots: u32, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    (1..=slots)
        .filter_map(|i| lookup(&format!("{prefix}{i}")))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl AppConfig {
    /// Merges file values, CLI overrides and the credential slots.
    ///
    /// Fails with [`SyncError::Config`] when no endpoint is configured or a
    /// value is out of range.
    pub fn resolve<F>(cli: &CliArgs, file: ConfigFile, lookup: F) -> std::result::Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_blocks = cli.max_blocks.unwrap_or(file.max_blocks);
        if max_blocks == 0 {
            return Err(SyncError::Config("max_blocks must be greater than 0".into()));
        }
        if file.rpc_timeout_secs == 0 {
            return Err(SyncError::Config("rpc_timeout_secs must be greater than 0".into()));
        }
        if file.incremental_subdir.trim().is_empty() {
            return Err(SyncError::Config("incremental_subdir must not be empty".into()));
        }

        let endpoints = scan_endpoints(&file.endpoint_env_prefix, file.endpoint_slots, lookup);
        if endpoints.is_empty() {
            return Err(SyncError::Config(format!(
                "No provider endpoints found ({prefix}1..{prefix}{slots})",
                prefix = file.endpoint_env_prefix,
                slots = file.endpoint_slots
            )));
        }

        Ok(Self {
            data_dir: cli.data_dir.clone().unwrap_or(file.data_dir),
            incremental_subdir: file.incremental_subdir,
            max_blocks,
            include_incremental: !cli.base_only
                && cli.include_incremental.unwrap_or(file.include_incremental),
            rpc_timeout: Duration::from_secs(file.rpc_timeout_secs),
            endpoints,
        })
    }

    /// Reads the optional config file and the process environment once.
    pub fn load(cli: &CliArgs) -> Result<Self> {
        let file = match &cli.config_path {
            Some(path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };
        Ok(Self::resolve(cli, file, |key| std::env::var(key).ok())?)
    }

    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.data_dir, &self.incremental_subdir)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions { max_blocks: self.max_blocks, include_incremental: self.include_incremental }
    }
}
