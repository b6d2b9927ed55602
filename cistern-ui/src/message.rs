use chrono::{DateTime, Utc};

use cistern_common::QueryResponse;

/// Messages for the dashboard application.
#[derive(Debug, Clone)]
pub enum Message {
    /// A query finished. Carries the generation it was issued under.
    QueryCompleted(u64, Result<QueryResponse, String>),

    /// A time range was brushed on a chart.
    RangeSelected(DateTime<Utc>, DateTime<Utc>),

    // Query form
    CollectionEdited(String),
    CollectionSubmitted,
    StartEdited(String),
    StartSubmitted,
    EndEdited(String),
    EndSubmitted,
    QueryEdited(String),
    QuerySubmitted,

    /// Step back through visited locations.
    HistoryBack,

    /// Step forward through visited locations.
    HistoryForward,
}
