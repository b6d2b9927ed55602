//! Wire model of the collection query API.
//!
//! `POST /api/collections/{collection}/query?start=..&end=..&query=..`
//! answers with a [`QueryResponse`]. Rows are free-form JSON objects; the
//! helpers here pull the synthetic columns out of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One result row, keyed by column name in backend order.
pub type Row = serde_json::Map<String, Value>;

/// Synthetic column holding the group identifier of a series row.
pub const GROUP_ID_COLUMN: &str = "_group_id";

/// Synthetic column holding the bucket timestamp of a series row.
pub const TIMESTAMP_COLUMN: &str = "_ts";

/// Synthetic column holding the identifier of an event row.
pub const EVENT_ID_COLUMN: &str = "_id";

/// Whether a column is a synthetic key rather than a data column.
pub fn is_synthetic_key(column: &str) -> bool {
    column == GROUP_ID_COLUMN || column == EVENT_ID_COLUMN
}

/// Response body of a collection query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Time-bucketed rows, one per (bucket, group).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub series: Vec<Row>,

    /// Aggregate rows over the whole range, absent when not requested.
    #[serde(default)]
    pub summary: Option<Vec<Row>>,

    /// Raw events, absent when the query aggregates.
    #[serde(default)]
    pub events: Option<Vec<Row>>,

    /// The query as the backend executed it.
    pub query: QueryDesc,
}

/// The executed query description echoed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDesc {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub columns: Vec<ColumnDesc>,

    /// Bucket size; zero means no time series were computed.
    #[serde(default, alias = "pointSize")]
    pub point_size: i64,

    /// Authoritative time range, possibly clamped or truncated by the backend.
    #[serde(alias = "timeRange")]
    pub time_range: TimeRange,
}

/// A requested column and its aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    #[serde(default)]
    pub aggregate: String,
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>, aggregate: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aggregate: aggregate.into(),
        }
    }

    /// Field name of this column in result rows, e.g. `avg(cpu)`.
    pub fn field_name(&self) -> String {
        format!("{}({})", self.aggregate, self.name)
    }
}

/// Start and end instants of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            start: DateTime::UNIX_EPOCH,
            end: DateTime::UNIX_EPOCH,
        }
    }
}

/// Group identifier of a row.
///
/// Strings are returned as-is, other scalars are rendered as JSON, and a
/// missing column yields an empty id.
pub fn row_group_id(row: &Row) -> String {
    match row.get(GROUP_ID_COLUMN) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Timestamp of a row.
///
/// Accepts RFC 3339 strings and epoch-millisecond numbers.
pub fn row_timestamp(row: &Row) -> Option<DateTime<Utc>> {
    match row.get(TIMESTAMP_COLUMN)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Numeric value of a column in a row.
pub fn row_number(row: &Row, column: &str) -> Option<f64> {
    row.get(column).and_then(Value::as_f64)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
