//! Time-series chart: view model, scales, tooltip, brush and canvas program.

pub mod brush;
pub mod scale;
pub mod tooltip;
pub mod view;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use iced::widget::canvas::Cache;

use crate::message::Message;

pub use brush::Brush;
pub use scale::{ChartLayout, LinearScale, TimeScale};
pub use tooltip::{TooltipEntry, interpolate, tooltip_entries};
pub use view::{ChartInteraction, ChartView, chart_view};

/// Smallest value ceiling, so flat or empty charts keep a usable scale.
pub const MIN_VALUE_CEILING: f64 = 10.0;

/// A data point for the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl DataPoint {
    /// Create a new data point.
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Series of one chart, keyed by group id.
pub type SeriesByGroup = BTreeMap<String, Vec<DataPoint>>;

/// Builds the message published when a time range is brushed.
pub type RangeSelectedFn = Arc<dyn Fn(DateTime<Utc>, DateTime<Utc>) -> Message + Send + Sync>;

/// View model for one chart.
///
/// Built once per query response and never mutated afterwards; a new time
/// range produces a new instance.
pub struct ChartState {
    width: f32,
    height: f32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    series_by_group: SeriesByGroup,
    name: String,
    value_ceiling: f64,
    on_range_selected: RangeSelectedFn,
    /// Geometry of the lines and axes, owned by this chart alone.
    cache: Cache,
}

impl ChartState {
    /// Build a chart state and compute its value ceiling.
    ///
    /// Single-point series are left out of the ceiling scan: a lone point
    /// draws no line.
    pub fn build(
        width: f32,
        height: f32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        series_by_group: SeriesByGroup,
        name: impl Into<String>,
        on_range_selected: impl Fn(DateTime<Utc>, DateTime<Utc>) -> Message + Send + Sync + 'static,
    ) -> Self {
        let value_ceiling = series_by_group
            .values()
            .filter(|points| points.len() > 1)
            .flatten()
            .map(|point| point.value)
            .filter(|value| value.is_finite())
            .fold(MIN_VALUE_CEILING, f64::max);

        Self {
            width,
            height,
            start,
            end,
            series_by_group,
            name: name.into(),
            value_ceiling,
            on_range_selected: Arc::new(on_range_selected),
            cache: Cache::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Chart name, e.g. `avg(cpu)`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn series_by_group(&self) -> &SeriesByGroup {
        &self.series_by_group
    }

    /// Points of one group, if present.
    pub fn series(&self, group_id: &str) -> Option<&[DataPoint]> {
        self.series_by_group.get(group_id).map(Vec::as_slice)
    }

    /// Largest plotted value, never below [`MIN_VALUE_CEILING`].
    pub fn value_ceiling(&self) -> f64 {
        self.value_ceiling
    }

    /// Message reporting a brushed time range.
    pub fn range_selected(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Message {
        (self.on_range_selected)(start, end)
    }

    pub(crate) fn cache(&self) -> &Cache {
        &self.cache
    }
}

impl fmt::Debug for ChartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartState")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("groups", &self.series_by_group.len())
            .field("value_ceiling", &self.value_ceiling)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn build(series: SeriesByGroup) -> ChartState {
        ChartState::build(
            100.0,
            200.0,
            at(0),
            at(60),
            series,
            "avg(cpu)",
            Message::RangeSelected,
        )
    }

    #[test]
    fn test_ceiling_skips_single_point_series() {
        let mut series = SeriesByGroup::new();
        series.insert("a".to_string(), vec![DataPoint::new(at(0), 5.0)]);
        series.insert(
            "b".to_string(),
            vec![DataPoint::new(at(0), 1.0), DataPoint::new(at(10), 50.0)],
        );

        assert_eq!(build(series).value_ceiling(), 50.0);
    }

    #[test]
    fn test_ceiling_ignores_tall_single_point() {
        let mut series = SeriesByGroup::new();
        series.insert("a".to_string(), vec![DataPoint::new(at(0), 500.0)]);
        series.insert(
            "b".to_string(),
            vec![DataPoint::new(at(0), 1.0), DataPoint::new(at(10), 20.0)],
        );

        assert_eq!(build(series).value_ceiling(), 20.0);
    }

    #[test]
    fn test_ceiling_floor() {
        assert_eq!(build(SeriesByGroup::new()).value_ceiling(), MIN_VALUE_CEILING);

        let mut low = SeriesByGroup::new();
        low.insert(
            "a".to_string(),
            vec![DataPoint::new(at(0), 1.0), DataPoint::new(at(10), 9.5)],
        );
        low.insert("b".to_string(), Vec::new());
        assert_eq!(build(low).value_ceiling(), MIN_VALUE_CEILING);
    }

    #[test]
    fn test_ceiling_ignores_nan() {
        let mut series = SeriesByGroup::new();
        series.insert(
            "a".to_string(),
            vec![DataPoint::new(at(0), f64::NAN), DataPoint::new(at(10), 12.0)],
        );

        assert_eq!(build(series).value_ceiling(), 12.0);
    }

    #[test]
    fn test_range_selected_uses_stored_constructor() {
        let chart = build(SeriesByGroup::new());
        let message = chart.range_selected(at(10), at(20));

        assert!(matches!(
            message,
            Message::RangeSelected(start, end) if start == at(10) && end == at(20)
        ));
    }

    #[test]
    fn test_accessors() {
        let mut series = SeriesByGroup::new();
        series.insert("ff".to_string(), vec![DataPoint::new(at(5), 3.0)]);
        let chart = build(series);

        assert_eq!(chart.name(), "avg(cpu)");
        assert_eq!(chart.height(), 200.0);
        assert_eq!(chart.start(), at(0));
        assert_eq!(chart.end(), at(60));
        assert_eq!(chart.series("ff").map(<[DataPoint]>::len), Some(1));
        assert!(chart.series("missing").is_none());
    }
}
