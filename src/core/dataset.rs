/// Raw `time` cell as stored, before unit normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawTimestamp {
    Int(i64),
    Float(f64),
}

/// Height/time projection of one stored block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetRow {
    pub height: u64,
    pub time: RawTimestamp,
}

/// Previously synced blocks, in storage order.
#[derive(Debug, Clone, Default)]
pub struct LocalDataset {
    rows: Vec<DatasetRow>,
}

impl LocalDataset {
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = DatasetRow>) {
        self.rows.extend(rows);
    }

    /// Highest height present, regardless of position.
    pub fn last_height(&self) -> Option<u64> {
        self.rows.iter().map(|r| r.height).max()
    }
}

impl FromIterator<DatasetRow> for LocalDataset {
    fn from_iter<I: IntoIterator<Item = DatasetRow>>(iter: I) -> Self {
        Self { rows: iter.into_iter().collect() }
    }
}
