//! Query session state: the current collection, query and time range, the
//! charts built from the last response, and the location history.

use chrono::{DateTime, Duration, Utc};

use cistern_common::{
    ChartConfig, ParsedInstant, QueryResponse, Row, row_group_id, row_number, row_timestamp,
};

use crate::location::{History, Location};
use crate::message::Message;
use crate::view::chart::{ChartState, DataPoint, SeriesByGroup};

/// Longest trailing window a click may select, about a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

const DEFAULT_WINDOW_DAYS: i64 = 90;

/// One backend round-trip to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Tag echoed back with the result so stale responses can be dropped.
    pub generation: u64,
    pub collection: String,
    /// Epoch seconds, floored.
    pub start: i64,
    /// Epoch seconds, floored.
    pub end: i64,
    pub query: String,
}

/// Orchestrates the query lifecycle of the dashboard.
#[derive(Debug)]
pub struct ChartContainer {
    config: ChartConfig,
    collection: String,
    query: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    charts: Vec<ChartState>,
    summary_rows: Option<Vec<Row>>,
    events: Option<Vec<Row>>,
    history: History,
    generation: u64,
    last_error: Option<String>,
}

impl ChartContainer {
    /// Start a session from a location.
    ///
    /// Missing or invalid dates default to `now`. Returns the first request.
    pub fn new(config: ChartConfig, location: Location, now: DateTime<Utc>) -> (Self, QueryRequest) {
        let params = location.params();

        if window_days(config.default_window_days) != config.default_window_days {
            tracing::warn!(
                days = config.default_window_days,
                fallback = DEFAULT_WINDOW_DAYS,
                "default_window_days out of range, using fallback"
            );
        }

        let mut container = Self {
            config,
            collection: params.collection.unwrap_or_default(),
            query: params.query,
            start: params.start.unwrap_or(now),
            end: params.end.unwrap_or(now),
            charts: Vec::new(),
            summary_rows: None,
            events: None,
            history: History::new(location),
            generation: 0,
            last_error: None,
        };

        let request = container.refresh();
        (container, request)
    }

    /// Issue a request for the current session state.
    pub fn refresh(&mut self) -> QueryRequest {
        self.generation += 1;

        let request = QueryRequest {
            generation: self.generation,
            collection: self.collection.clone(),
            start: self.start.timestamp(),
            end: self.end.timestamp(),
            query: self.query.clone(),
        };

        tracing::info!(
            generation = request.generation,
            collection = %request.collection,
            start = request.start,
            end = request.end,
            query = %request.query,
            "Refreshing charts"
        );

        request
    }

    /// Apply a successful response. Returns `false` when it was stale.
    pub fn apply_response(&mut self, generation: u64, response: QueryResponse) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                latest = self.generation,
                "Discarding stale query response"
            );
            return false;
        }

        self.charts = build_charts(&response, &self.config);
        self.summary_rows = response.summary;
        self.events = response.events;
        self.start = response.query.time_range.start;
        self.end = response.query.time_range.end;
        self.last_error = None;

        tracing::debug!(
            charts = self.charts.len(),
            summary_rows = self.summary_rows.as_ref().map(Vec::len),
            events = self.events.as_ref().map(Vec::len),
            "Applied query response"
        );

        true
    }

    /// Record a failed request. Previous charts and tables are kept.
    pub fn apply_failure(&mut self, generation: u64, error: String) {
        if generation != self.generation {
            tracing::debug!(generation, error = %error, "Ignoring stale query failure");
            return;
        }

        tracing::warn!(generation, error = %error, "Query failed");
        self.last_error = Some(error);
    }

    /// Feedback from a brushed chart.
    pub fn on_range_selected(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> QueryRequest {
        self.start = start;
        self.end = end;
        let request = self.refresh();
        self.update_location();
        request
    }

    pub fn set_collection(&mut self, collection: String) -> QueryRequest {
        self.collection = collection;
        let request = self.refresh();
        self.update_location();
        request
    }

    pub fn set_query(&mut self, query: String) -> QueryRequest {
        self.query = query;
        let request = self.refresh();
        self.update_location();
        request
    }

    /// Apply a typed start date. Anything but a valid instant is ignored.
    pub fn set_start(&mut self, raw: &str) -> Option<QueryRequest> {
        let start = parse_edit("start", raw)?;
        self.start = start;
        let request = self.refresh();
        self.update_location();
        Some(request)
    }

    /// Apply a typed end date. Anything but a valid instant is ignored.
    pub fn set_end(&mut self, raw: &str) -> Option<QueryRequest> {
        let end = parse_edit("end", raw)?;
        self.end = end;
        let request = self.refresh();
        self.update_location();
        Some(request)
    }

    /// Write the session into the current location and push it.
    pub fn update_location(&mut self) {
        let location = self.history.current().with_session(
            self.start,
            self.end,
            &self.query,
            &self.collection,
        );
        tracing::debug!(location = %location, "Pushing location");
        self.history.push(location);
    }

    /// Restore the previous location and refresh.
    pub fn history_back(&mut self, now: DateTime<Utc>) -> Option<QueryRequest> {
        let location = self.history.back()?.clone();
        Some(self.restore(&location, now))
    }

    /// Restore the next location and refresh.
    pub fn history_forward(&mut self, now: DateTime<Utc>) -> Option<QueryRequest> {
        let location = self.history.forward()?.clone();
        Some(self.restore(&location, now))
    }

    fn restore(&mut self, location: &Location, now: DateTime<Utc>) -> QueryRequest {
        let params = location.params();
        self.collection = params.collection.unwrap_or_default();
        self.query = params.query;
        self.start = params.start.unwrap_or(now);
        self.end = params.end.unwrap_or(now);
        self.refresh()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn charts(&self) -> &[ChartState] {
        &self.charts
    }

    /// Summary rows of the last response, `None` when the backend omitted them.
    pub fn summary_rows(&self) -> Option<&[Row]> {
        self.summary_rows.as_deref()
    }

    /// Events of the last response, `None` when the backend omitted them.
    pub fn events(&self) -> Option<&[Row]> {
        self.events.as_deref()
    }

    pub fn location(&self) -> &Location {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Error of the last failed request, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Trailing window selected by a click on a chart.
    ///
    /// Values outside `1..=MAX_WINDOW_DAYS` fall back to the default length.
    pub fn default_window(&self) -> Duration {
        Duration::days(window_days(self.config.default_window_days))
    }
}

fn window_days(days: i64) -> i64 {
    if (1..=MAX_WINDOW_DAYS).contains(&days) {
        days
    } else {
        DEFAULT_WINDOW_DAYS
    }
}

fn parse_edit(field: &str, raw: &str) -> Option<DateTime<Utc>> {
    match ParsedInstant::parse(raw) {
        ParsedInstant::Valid(instant) => Some(instant),
        ParsedInstant::Empty => {
            tracing::debug!(field, "Ignoring empty date");
            None
        }
        ParsedInstant::Invalid(text) => {
            tracing::debug!(field, input = %text, "Ignoring invalid date");
            None
        }
    }
}

/// Build one chart per requested column.
///
/// No charts are built when the backend computed no time series
/// (`point_size` of zero). Rows are grouped by group id; rows without a
/// timestamp or a numeric value still register their group.
pub fn build_charts(response: &QueryResponse, config: &ChartConfig) -> Vec<ChartState> {
    if response.query.point_size <= 0 {
        return Vec::new();
    }

    let mut names: Vec<String> = Vec::new();
    for column in &response.query.columns {
        let name = column.field_name();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let range = response.query.time_range;

    names
        .into_iter()
        .map(|name| {
            let mut series_by_group = SeriesByGroup::new();

            for row in &response.series {
                let points = series_by_group.entry(row_group_id(row)).or_default();
                if let (Some(timestamp), Some(value)) = (row_timestamp(row), row_number(row, &name)) {
                    points.push(DataPoint::new(timestamp, value));
                }
            }

            for points in series_by_group.values_mut() {
                points.sort_by_key(|point| point.timestamp);
            }

            ChartState::build(
                config.width,
                config.height,
                range.start,
                range.end,
                series_by_group,
                name,
                Message::RangeSelected,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use cistern_common::{ColumnDesc, QueryDesc, TimeRange};
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn response(point_size: i64, columns: Vec<ColumnDesc>, series: Vec<Row>) -> QueryResponse {
        QueryResponse {
            series,
            summary: None,
            events: None,
            query: QueryDesc {
                columns,
                point_size,
                time_range: TimeRange {
                    start: at(0),
                    end: at(180),
                },
            },
        }
    }

    fn container() -> (ChartContainer, QueryRequest) {
        let location =
            Location::parse("collection=web&query=group+by+host&start=1970-01-01T00:00:00Z&end=1970-01-01T00:03:00Z")
                .unwrap();
        ChartContainer::new(ChartConfig::default(), location, at(1_000))
    }

    #[test]
    fn test_new_reads_location() {
        let (container, request) = container();

        assert_eq!(container.collection(), "web");
        assert_eq!(container.query(), "group by host");
        assert_eq!(container.start(), at(0));
        assert_eq!(container.end(), at(180));
        assert_eq!(
            request,
            QueryRequest {
                generation: 1,
                collection: "web".to_string(),
                start: 0,
                end: 180,
                query: "group by host".to_string(),
            }
        );
    }

    #[test]
    fn test_new_defaults_to_now() {
        let location = Location::parse("start=garbage").unwrap();
        let (container, request) =
            ChartContainer::new(ChartConfig::default(), location, at(1_000));

        assert_eq!(container.collection(), "");
        assert_eq!(container.query(), "");
        assert_eq!(container.start(), at(1_000));
        assert_eq!(container.end(), at(1_000));
        assert_eq!((request.start, request.end), (1_000, 1_000));
    }

    #[test]
    fn test_request_floors_epoch_seconds() {
        let location = Location::parse("start=1970-01-01T00:00:10.900Z").unwrap();
        let (_, request) = ChartContainer::new(ChartConfig::default(), location, at(0));
        assert_eq!(request.start, 10);
    }

    #[test]
    fn test_end_to_end_two_groups() {
        let (mut container, request) = container();

        let series = vec![
            row(json!({"_group_id": "a8", "_ts": "1970-01-01T00:01:00Z", "avg(cpu)": 2.0})),
            row(json!({"_group_id": "ff", "_ts": "1970-01-01T00:00:00Z", "avg(cpu)": 7.0})),
            row(json!({"_group_id": "a8", "_ts": "1970-01-01T00:00:00Z", "avg(cpu)": 1.0})),
            row(json!({"_group_id": "ff", "_ts": "1970-01-01T00:01:00Z", "avg(cpu)": 8.0})),
        ];
        let response = response(60, vec![ColumnDesc::new("cpu", "avg")], series);

        assert!(container.apply_response(request.generation, response));

        let charts = container.charts();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].name(), "avg(cpu)");
        assert_eq!(charts[0].series_by_group().len(), 2);

        let a8 = charts[0].series("a8").unwrap();
        assert_eq!(a8, &[DataPoint::new(at(0), 1.0), DataPoint::new(at(60), 2.0)]);
        let ff = charts[0].series("ff").unwrap();
        assert_eq!(ff, &[DataPoint::new(at(0), 7.0), DataPoint::new(at(60), 8.0)]);

        // Charts are wired back to the container
        let message = charts[0].range_selected(at(10), at(20));
        assert!(matches!(message, Message::RangeSelected(..)));
    }

    #[test]
    fn test_zero_point_size_builds_no_charts() {
        let (mut container, request) = container();
        let series = vec![row(json!({"_group_id": "a", "_ts": 0, "avg(cpu)": 1.0}))];
        let mut response = response(0, vec![ColumnDesc::new("cpu", "avg")], series);
        response.summary = Some(vec![row(json!({"_group_id": "a", "avg(cpu)": 1.0}))]);

        assert!(container.apply_response(request.generation, response));
        assert!(container.charts().is_empty());
        assert_eq!(container.summary_rows().map(<[Row]>::len), Some(1));
    }

    #[test]
    fn test_response_sets_range_and_tables() {
        let (mut container, request) = container();
        let mut response = response(60, vec![ColumnDesc::new("cpu", "avg")], Vec::new());
        response.query.time_range = TimeRange {
            start: at(60),
            end: at(120),
        };
        response.events = Some(vec![row(json!({"_id": "1", "msg": "hello"}))]);

        container.apply_response(request.generation, response);

        assert_eq!(container.start(), at(60));
        assert_eq!(container.end(), at(120));
        assert_eq!(container.events().map(<[Row]>::len), Some(1));
        assert!(container.summary_rows().is_none());
    }

    #[test]
    fn test_duplicate_columns_and_order() {
        let columns = vec![
            ColumnDesc::new("mem", "max"),
            ColumnDesc::new("cpu", "avg"),
            ColumnDesc::new("mem", "max"),
        ];
        let charts = build_charts(&response(60, columns, Vec::new()), &ChartConfig::default());

        let names: Vec<&str> = charts.iter().map(ChartState::name).collect();
        assert_eq!(names, vec!["max(mem)", "avg(cpu)"]);
    }

    #[test]
    fn test_non_numeric_values_register_group() {
        let series = vec![
            row(json!({"_group_id": "a", "_ts": 0, "avg(cpu)": "n/a"})),
            row(json!({"_group_id": "b", "_ts": 0, "avg(cpu)": 3.0})),
            row(json!({"_group_id": "b", "_ts": 1000})),
        ];
        let charts = build_charts(
            &response(60, vec![ColumnDesc::new("cpu", "avg")], series),
            &ChartConfig::default(),
        );

        assert_eq!(charts[0].series("a").map(<[DataPoint]>::len), Some(0));
        assert_eq!(charts[0].series("b").map(<[DataPoint]>::len), Some(1));
    }

    #[test]
    fn test_equal_timestamps_keep_row_order() {
        let series = vec![
            row(json!({"_group_id": "a", "_ts": 1000, "avg(cpu)": 1.0})),
            row(json!({"_group_id": "a", "_ts": 0, "avg(cpu)": 0.0})),
            row(json!({"_group_id": "a", "_ts": 1000, "avg(cpu)": 2.0})),
        ];
        let charts = build_charts(
            &response(60, vec![ColumnDesc::new("cpu", "avg")], series),
            &ChartConfig::default(),
        );

        let values: Vec<f64> = charts[0]
            .series("a")
            .unwrap()
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_stale_response_discarded() {
        let (mut container, first) = container();
        let second = container.set_query("avg(cpu)".to_string());

        let late = response(60, vec![ColumnDesc::new("cpu", "avg")], Vec::new());
        assert!(!container.apply_response(first.generation, late));
        assert!(container.charts().is_empty());

        let fresh = response(60, vec![ColumnDesc::new("mem", "max")], Vec::new());
        assert!(container.apply_response(second.generation, fresh));
        assert_eq!(container.charts()[0].name(), "max(mem)");
    }

    #[test]
    fn test_failure_keeps_previous_state() {
        let (mut container, request) = container();
        container.apply_response(
            request.generation,
            response(60, vec![ColumnDesc::new("cpu", "avg")], Vec::new()),
        );

        let retry = container.refresh();
        container.apply_failure(retry.generation, "status 500".to_string());

        assert_eq!(container.charts().len(), 1);
        assert_eq!(container.last_error(), Some("status 500"));

        // A stale failure does not clobber the status
        container.apply_failure(request.generation, "old".to_string());
        assert_eq!(container.last_error(), Some("status 500"));
    }

    #[test]
    fn test_range_selected_refreshes_and_pushes_location() {
        let (mut container, first) = container();
        let request = container.on_range_selected(at(60), at(120));

        assert_eq!(request.generation, first.generation + 1);
        assert_eq!((request.start, request.end), (60, 120));
        assert_eq!(container.history().len(), 2);
        assert_eq!(
            container.location().param("start").as_deref(),
            Some("1970-01-01T00:01:00Z")
        );
        assert_eq!(
            container.location().param("end").as_deref(),
            Some("1970-01-01T00:02:00Z")
        );
    }

    #[test]
    fn test_invalid_date_edit_issues_no_request() {
        let (mut container, first) = container();

        assert!(container.set_start("not a date").is_none());
        assert!(container.set_end("").is_none());
        assert_eq!(container.start(), at(0));
        assert_eq!(container.generation(), first.generation);
        assert_eq!(container.history().len(), 1);

        let request = container.set_end("1970-01-01T00:05:00Z").unwrap();
        assert_eq!(request.end, 300);
    }

    #[test]
    fn test_update_location_keeps_unrelated_keys() {
        let location = Location::parse("theme=dark&collection=web").unwrap();
        let (mut container, _) = ChartContainer::new(ChartConfig::default(), location, at(0));

        container.set_collection("logs".to_string());

        assert_eq!(container.location().param("theme").as_deref(), Some("dark"));
        assert_eq!(container.location().param("collection").as_deref(), Some("logs"));
    }

    #[test]
    fn test_history_back_and_forward_restore_params() {
        let (mut container, _) = container();
        container.set_collection("logs".to_string());
        container.set_query("avg(cpu)".to_string());

        let back = container.history_back(at(5_000)).unwrap();
        assert_eq!(back.collection, "logs");
        assert_eq!(back.query, "group by host");
        assert_eq!(container.query(), "group by host");

        let back = container.history_back(at(5_000)).unwrap();
        assert_eq!(back.collection, "web");
        assert!(container.history_back(at(5_000)).is_none());

        let forward = container.history_forward(at(5_000)).unwrap();
        assert_eq!(forward.collection, "logs");
        assert_eq!(forward.generation, container.generation());
    }

    #[test]
    fn test_default_window() {
        let (container, _) = container();
        assert_eq!(container.default_window(), Duration::days(90));
    }

    #[test]
    fn test_default_window_out_of_range_falls_back() {
        for days in [0, -5, 100_000_000, 200_000_000_000, i64::MIN, i64::MAX] {
            let config = ChartConfig {
                default_window_days: days,
                ..ChartConfig::default()
            };
            let (container, _) = ChartContainer::new(config, Location::default(), at(0));
            assert_eq!(container.default_window(), Duration::days(90), "days = {days}");
        }
    }

    #[test]
    fn test_default_window_upper_bound() {
        let config = ChartConfig {
            default_window_days: MAX_WINDOW_DAYS,
            ..ChartConfig::default()
        };
        let (container, _) = ChartContainer::new(config, Location::default(), at(0));
        assert_eq!(container.default_window(), Duration::days(MAX_WINDOW_DAYS));
    }

    #[test]
    fn test_empty_response_tables_are_kept_apart_from_omitted() {
        let (mut container, request) = container();
        assert!(container.summary_rows().is_none());

        let mut response = response(60, Vec::new(), Vec::new());
        response.summary = Some(Vec::new());
        container.apply_response(request.generation, response);

        assert_eq!(container.summary_rows(), Some(&[][..]));
        assert!(container.events().is_none());
    }

    #[test]
    fn test_update_location_round_trips_params() {
        let location = Location::parse(
            "start=2024-01-01T00:00:00Z&end=2024-01-02T00:00:00Z&collection=hosts&query=foo",
        )
        .unwrap();
        let (mut container, _) = ChartContainer::new(ChartConfig::default(), location, at(0));

        container.update_location();

        let location = container.location();
        assert_eq!(location.param("start").as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(location.param("end").as_deref(), Some("2024-01-02T00:00:00Z"));
        assert_eq!(location.param("collection").as_deref(), Some("hosts"));
        assert_eq!(location.param("query").as_deref(), Some("foo"));
    }
}
