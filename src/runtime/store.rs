// Parquet read/write for block stats tables.
// Rows cross the Arrow boundary as JSON objects so provider fields stay opaque.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::json::{ArrayWriter, ReaderBuilder};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::core::dataset::{DatasetRow, RawTimestamp};
use crate::core::record::BlockStatsRecord;
use crate::error::{Result, SyncError};

pub const HEIGHT_COLUMN: &str = "height";
pub const TIME_COLUMN: &str = "time";
pub const PARQUET_EXTENSION: &str = "parquet";

/// Rows per encoded record batch.
const WRITE_BATCH_ROWS: usize = 8_192;

fn schema_err(path: &Path, reason: impl Into<String>) -> SyncError {
    SyncError::Schema { path: path.to_path_buf(), reason: reason.into() }
}

/// `*.parquet` files directly inside `dir`, sorted by file name.
///
/// A missing directory yields an empty list.
pub fn list_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file()
            && path.extension().is_some_and(|ext| ext == PARQUET_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn column<'a>(batch: &'a RecordBatch, name: &str, path: &Path) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| schema_err(path, format!("missing column `{name}`")))
}

/// Reads only the `height` and `time` columns of one file.
pub fn read_height_time(path: &Path) -> Result<Vec<DatasetRow>> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let height_idx = schema
        .index_of(HEIGHT_COLUMN)
        .map_err(|_| schema_err(path, format!("missing column `{HEIGHT_COLUMN}`")))?;
    let time_idx = schema
        .index_of(TIME_COLUMN)
        .map_err(|_| schema_err(path, format!("missing column `{TIME_COLUMN}`")))?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), [height_idx, time_idx]);
    let reader = builder.with_projection(mask).build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let heights = cast(column(&batch, HEIGHT_COLUMN, path)?, &DataType::Int64)?;
        let heights = heights.as_primitive::<Int64Type>();
        let times = time_cells(column(&batch, TIME_COLUMN, path)?, path)?;

        for (i, time) in times.into_iter().enumerate() {
            if heights.is_null(i) {
                return Err(schema_err(path, format!("null or out-of-range height at row {i}")));
            }
            let height = u64::try_from(heights.value(i))
                .map_err(|_| schema_err(path, format!("negative height at row {i}")))?;
            let time = time.ok_or_else(|| schema_err(path, format!("null time at height {height}")))?;
            rows.push(DatasetRow { height, time });
        }
    }
    Ok(rows)
}

fn time_cells(col: &ArrayRef, path: &Path) -> Result<Vec<Option<RawTimestamp>>> {
    let dt = col.data_type();
    if dt.is_integer() {
        let ints = cast(col, &DataType::Int64)?;
        Ok(ints.as_primitive::<Int64Type>().iter().map(|v| v.map(RawTimestamp::Int)).collect())
    } else if dt.is_floating() {
        let floats = cast(col, &DataType::Float64)?;
        Ok(floats
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.map(RawTimestamp::Float))
            .collect())
    } else {
        Err(schema_err(path, format!("unsupported `{TIME_COLUMN}` type {dt}")))
    }
}

fn batch_to_json_rows(batch: &RecordBatch) -> Result<Vec<Value>> {
    let mut writer = ArrayWriter::new(Vec::new());
    writer.write(batch)?;
    writer.finish()?;
    let buf = writer.into_inner();
    Ok(serde_json::from_slice(&buf)?)
}

/// Reads every column of one file back into records.
pub fn read_records(path: &Path) -> Result<Vec<BlockStatsRecord>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        for row in batch_to_json_rows(&batch?)? {
            let record = serde_json::from_value(row)
                .map_err(|e| schema_err(path, format!("unreadable row: {e}")))?;
            records.push(record);
        }
    }
    Ok(records)
}

/// Puts `height` then `time` first, the rest in inferred order.
fn leading_height_time(schema: Schema) -> Schema {
    let (mut lead, rest): (Vec<_>, Vec<_>) = schema
        .fields()
        .iter()
        .cloned()
        .partition(|f| f.name() == HEIGHT_COLUMN || f.name() == TIME_COLUMN);
    lead.sort_by_key(|f| f.name() != HEIGHT_COLUMN);
    Schema::new(lead.into_iter().chain(rest).collect::<Vec<_>>())
}

fn writer_properties() -> Result<WriterProperties> {
    Ok(WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(1)?))
        .build())
}

/// Writes `records` to `path`, replacing any previous file in one rename.
///
/// The schema is inferred from the rows themselves.
pub fn write_records(path: &Path, records: &[BlockStatsRecord]) -> Result<()> {
    if records.is_empty() {
        return Err(schema_err(path, "refusing to write a file with no rows"));
    }
    let rows = records
        .iter()
        .map(|r| r.to_row().map(Value::Object))
        .collect::<serde_json::Result<Vec<_>>>()?;

    let inferred = infer_json_schema_from_iterator(rows.iter().cloned().map(Ok::<Value, ArrowError>))?;
    let schema: SchemaRef = Arc::new(leading_height_time(inferred));
    let mut decoder = ReaderBuilder::new(schema.clone())
        .with_batch_size(WRITE_BATCH_ROWS)
        .build_decoder()?;

    let dir = path
        .parent()
        .ok_or_else(|| schema_err(path, "output path has no parent directory"))?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = ArrowWriter::try_new(tmp.as_file_mut(), schema, Some(writer_properties()?))?;
        for chunk in rows.chunks(WRITE_BATCH_ROWS) {
            decoder.serialize(chunk)?;
            if let Some(batch) = decoder.flush()? {
                writer.write(&batch)?;
            }
        }
        writer.close()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_block_stats, write_height_time_file, write_heights_only_file};
    use tempfile::TempDir;

    #[test]
    fn test_projection_reads_int_and_float_time() {
        let dir = TempDir::new().unwrap();
        let ints = dir.path().join("a.parquet");
        write_height_time_file(&ints, &[(1, RawTimestamp::Int(1_600_000_000))]).unwrap();
        let floats = dir.path().join("b.parquet");
        write_height_time_file(&floats, &[(2, RawTimestamp::Float(1.6e15))]).unwrap();

        assert_eq!(
            read_height_time(&ints).unwrap(),
            vec![DatasetRow { height: 1, time: RawTimestamp::Int(1_600_000_000) }]
        );
        assert_eq!(
            read_height_time(&floats).unwrap(),
            vec![DatasetRow { height: 2, time: RawTimestamp::Float(1.6e15) }]
        );
    }

    #[test]
    fn test_full_rows_survive_write_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.parquet");
        let records: Vec<_> = (100..103).map(sample_block_stats).collect();
        write_records(&path, &records).unwrap();

        let back = read_records(&path).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[1].height, 101);
        assert_eq!(back[1].time, records[1].time);
        assert_eq!(back[1].fields["blockhash"], records[1].fields["blockhash"]);
        assert_eq!(back[1].fields["txs"], records[1].fields["txs"]);

        // The written file is also a valid dataset file.
        let projected = read_height_time(&path).unwrap();
        assert_eq!(projected.iter().map(|r| r.height).collect::<Vec<_>>(), vec![100, 101, 102]);
    }

    #[test]
    fn test_missing_time_column_is_a_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_time.parquet");
        write_heights_only_file(&path, &[1, 2]).unwrap();
        assert!(matches!(read_height_time(&path), Err(SyncError::Schema { .. })));
    }

    #[test]
    fn test_listing_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.parquet", "a.parquet", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("incremental")).unwrap();
        let names: Vec<_> = list_parquet_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.parquet", "b.parquet"]);
        assert!(list_parquet_files(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_empty_write_is_refused() {
        let dir = TempDir::new().unwrap();
        assert!(write_records(&dir.path().join("x.parquet"), &[]).is_err());
    }
}
