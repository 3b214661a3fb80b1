use crate::core::dataset::{LocalDataset, RawTimestamp};
use crate::error::{Result, SyncError};

/// Below this a value is taken to be seconds.
pub const SECONDS_CEILING: i64 = 10_000_000_000;
/// Below this (after the first step) a value is taken to be milliseconds.
pub const MILLIS_CEILING: i64 = 10_000_000_000_000;

/// A block height paired with its timestamp in microseconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedRow {
    pub height: u64,
    pub time_us: i64,
}

/// Dataset keyed by normalized time, storage order preserved.
#[derive(Debug, Clone, Default)]
pub struct NormalizedDataset {
    pub rows: Vec<NormalizedRow>,
}

impl NormalizedDataset {
    pub fn last_height(&self) -> Option<u64> {
        self.rows.iter().map(|r| r.height).max()
    }

    pub fn time_range(&self) -> Option<(i64, i64)> {
        let min = self.rows.iter().map(|r| r.time_us).min()?;
        let max = self.rows.iter().map(|r| r.time_us).max()?;
        Some((min, max))
    }
}

/// Applies the promotion ladder to an integer timestamp.
///
/// `< 1e10` is scaled by 10^6, then anything still `< 1e13` by 10^3. Both
/// bounds are exclusive. Returns `None` on overflow.
pub fn normalize_int(raw: i64) -> Option<i64> {
    let mut t = raw;
    if t < SECONDS_CEILING {
        t = t.checked_mul(1_000_000)?;
    }
    if t < MILLIS_CEILING {
        t = t.checked_mul(1_000)?;
    }
    Some(t)
}

/// Float variant of [`normalize_int`]; the result is rounded to whole microseconds.
pub fn normalize_float(raw: f64) -> Option<i64> {
    if !raw.is_finite() {
        return None;
    }
    let mut t = raw;
    if t < SECONDS_CEILING as f64 {
        t *= 1e6;
    }
    if t < MILLIS_CEILING as f64 {
        t *= 1e3;
    }
    let t = t.round();
    if t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return None;
    }
    Some(t as i64)
}

pub fn normalize(raw: RawTimestamp) -> Option<i64> {
    match raw {
        RawTimestamp::Int(v) => normalize_int(v),
        RawTimestamp::Float(v) => normalize_float(v),
    }
}

/// Normalizes every row independently, so datasets mixing eras of
/// different units come out in one unit.
pub fn normalize_dataset(dataset: &LocalDataset) -> Result<NormalizedDataset> {
    let rows = dataset
        .rows()
        .iter()
        .map(|row| {
            let time_us = normalize(row.time).ok_or_else(|| SyncError::InvalidTimestamp {
                height: row.height,
                reason: format!("{:?} cannot be expressed in microseconds", row.time),
            })?;
            Ok(NormalizedRow { height: row.height, time_us })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(NormalizedDataset { rows })
}
