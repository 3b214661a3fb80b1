use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// One block's `getblockstats` snapshot.
///
/// Only `height` and `time` are interpreted. Every other field the provider
/// returns is carried through untouched in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStatsRecord {
    pub height: u64,
    /// Raw timestamp as delivered; unit is not known until normalized.
    pub time: Number,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl BlockStatsRecord {
    pub fn new(height: u64, time: impl Into<Number>) -> Self {
        Self { height, time: time.into(), fields: Map::new() }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Interprets a provider response.
    ///
    /// `null` and `{}` mean "nothing to record" and yield `Ok(None)`.
    pub fn from_response(value: Value) -> serde_json::Result<Option<Self>> {
        match &value {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            _ => serde_json::from_value(value).map(Some),
        }
    }

    /// Flattens the record into a single JSON object row.
    pub fn to_row(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "block stats record serialized to non-object: {other}"
            ))),
        }
    }
}
