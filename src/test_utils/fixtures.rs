/// Shared test fixtures and data
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, Float64Array, Int64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use serde_json::json;

use crate::core::dataset::{DatasetRow, LocalDataset, RawTimestamp};
use crate::core::record::BlockStatsRecord;

/// Genesis block timestamp, seconds.
pub const GENESIS_TIME: u64 = 1_231_006_505;

/// A `getblockstats`-shaped record for `height`, deterministic in `height`.
pub fn sample_block_stats(height: u64) -> BlockStatsRecord {
    let txs = 1_000 + height % 3_000;
    BlockStatsRecord::new(height, GENESIS_TIME + height * 600)
        .with_field("blockhash", format!("{:064x}", height.wrapping_mul(0x9e37_79b9_7f4a_7c15)))
        .with_field("txs", txs)
        .with_field("ins", txs * 2)
        .with_field("outs", txs * 3)
        .with_field("avgfee", 2_500 + height % 100)
        .with_field("avgfeerate", 12)
        .with_field("mediantime", GENESIS_TIME + height * 600 - 3_000)
        .with_field("subsidy", 312_500_000u64)
        .with_field("total_weight", 3_990_000u64)
        .with_field("feerate_percentiles", json!([3, 5, 8, 13, 21]))
}

/// Writes a minimal base dataset file holding only `height` and `time`.
///
/// `time` is written as Int64 unless any row carries a float, in which case
/// the whole column is Float64.
pub fn write_height_time_file(path: &Path, rows: &[(u64, RawTimestamp)]) -> Result<()> {
    let heights: ArrayRef = Arc::new(Int64Array::from_iter_values(rows.iter().map(|(h, _)| *h as i64)));
    let any_float = rows.iter().any(|(_, t)| matches!(t, RawTimestamp::Float(_)));

    let (time_type, times): (DataType, ArrayRef) = if any_float {
        let values = rows.iter().map(|(_, t)| match *t {
            RawTimestamp::Int(v) => v as f64,
            RawTimestamp::Float(v) => v,
        });
        (DataType::Float64, Arc::new(Float64Array::from_iter_values(values)))
    } else {
        let values = rows.iter().map(|(_, t)| match *t {
            RawTimestamp::Int(v) => v,
            RawTimestamp::Float(v) => v as i64,
        });
        (DataType::Int64, Arc::new(Int64Array::from_iter_values(values)))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("height", DataType::Int64, false),
        Field::new("time", time_type, false),
    ]));
    let batch = RecordBatch::try_new(schema.clone(), vec![heights, times])?;
    let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Seconds-resolution rows for `start..=end`, ten minutes apart.
pub fn contiguous_rows(start: u64, end: u64) -> Vec<(u64, RawTimestamp)> {
    (start..=end)
        .map(|h| (h, RawTimestamp::Int((GENESIS_TIME + h * 600) as i64)))
        .collect()
}

/// In-memory counterpart of [`contiguous_rows`].
pub fn contiguous_dataset(start: u64, end: u64) -> LocalDataset {
    contiguous_rows(start, end)
        .into_iter()
        .map(|(height, time)| DatasetRow { height, time })
        .collect()
}

/// A file with `height` only, for schema error paths.
pub fn write_heights_only_file(path: &Path, heights: &[u64]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![Field::new("height", DataType::Int64, false)]));
    let col: ArrayRef = Arc::new(Int64Array::from_iter_values(heights.iter().map(|h| *h as i64)));
    let batch = RecordBatch::try_new(schema.clone(), vec![col])?;
    let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
