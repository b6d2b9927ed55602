//! Scales mapping instants and values to canvas pixels.

use chrono::{DateTime, Utc};
use iced::{Point, Size};

use super::{ChartState, DataPoint};

/// Base margin around the plot area.
pub const MARGIN: f32 = 35.0;
/// Left margin, leaving room for the value axis labels.
pub const LEFT_MARGIN: f32 = 2.0 * MARGIN;
pub const RIGHT_MARGIN: f32 = MARGIN;
pub const BOTTOM_MARGIN: f32 = MARGIN;

/// Headroom above the value ceiling.
pub const HEADROOM: f64 = 1.1;

/// Number of ticks requested on the time axis.
pub const TIME_TICKS: usize = 4;
/// Number of ticks requested on the value axis.
pub const VALUE_TICKS: usize = 3;

/// Upper bound on generated ticks, whatever the domain.
const MAX_TICKS: usize = 64;

const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Candidate time tick intervals in milliseconds.
const TIME_INTERVALS: [i64; 19] = [
    SECOND,
    5 * SECOND,
    15 * SECOND,
    30 * SECOND,
    MINUTE,
    5 * MINUTE,
    15 * MINUTE,
    30 * MINUTE,
    HOUR,
    3 * HOUR,
    6 * HOUR,
    12 * HOUR,
    DAY,
    2 * DAY,
    7 * DAY,
    30 * DAY,
    90 * DAY,
    365 * DAY,
    10 * 365 * DAY,
];

/// Milliseconds since the epoch, with sub-millisecond precision.
pub(crate) fn to_millis(instant: DateTime<Utc>) -> f64 {
    instant.timestamp() as f64 * 1_000.0 + instant.timestamp_subsec_nanos() as f64 / 1_000_000.0
}

fn from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64)
}

/// Replace non-finite coordinates with 0.
fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

/// Linear map from a time domain to a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    range: (f32, f32),
}

impl TimeScale {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, range: (f32, f32)) -> Self {
        Self { start, end, range }
    }

    pub fn domain(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start, self.end)
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    /// Pixel position of an instant. A zero-length domain maps to the middle
    /// of the range.
    pub fn project(&self, instant: DateTime<Utc>) -> f32 {
        let (r0, r1) = self.range;
        let d0 = to_millis(self.start);
        let span = to_millis(self.end) - d0;

        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }

        let t = (to_millis(instant) - d0) / span;
        finite_or_zero(r0 + (t * (r1 - r0) as f64) as f32)
    }

    /// Instant at a pixel position.
    pub fn invert(&self, x: f32) -> DateTime<Utc> {
        let (r0, r1) = self.range;
        if r1 == r0 {
            return self.start;
        }

        let d0 = to_millis(self.start);
        let span = to_millis(self.end) - d0;
        let t = ((x - r0) / (r1 - r0)) as f64;

        from_millis(d0 + t * span).unwrap_or(self.start)
    }

    /// Tick interval in milliseconds for roughly `count` ticks.
    pub fn tick_interval(&self, count: usize) -> Option<i64> {
        let span = to_millis(self.end) - to_millis(self.start);
        if span <= 0.0 || !span.is_finite() || count == 0 {
            return None;
        }

        let target = span / count as f64;
        TIME_INTERVALS
            .iter()
            .copied()
            .find(|interval| *interval as f64 >= target)
            .or(TIME_INTERVALS.last().copied())
    }

    /// Tick instants aligned to a calendar-friendly interval.
    pub fn ticks(&self, count: usize) -> Vec<DateTime<Utc>> {
        let Some(interval) = self.tick_interval(count) else {
            return Vec::new();
        };

        let start = self.start.timestamp_millis();
        let end = self.end.timestamp_millis();
        let first = start.div_euclid(interval) + i64::from(start.rem_euclid(interval) != 0);

        (first..)
            .map(|i| i.saturating_mul(interval))
            .take_while(|millis| *millis <= end)
            .take(MAX_TICKS)
            .filter_map(DateTime::from_timestamp_millis)
            .collect()
    }
}

/// Linear map from a value domain to a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    pub fn project(&self, value: f64) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;

        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }

        let t = (value - d0) / (d1 - d0);
        finite_or_zero(r0 + (t * (r1 - r0) as f64) as f32)
    }

    pub fn invert(&self, pixel: f32) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;

        if r1 == r0 {
            return d0;
        }

        let value = d0 + ((pixel - r0) / (r1 - r0)) as f64 * (d1 - d0);
        if value.is_finite() { value } else { 0.0 }
    }

    /// Round-valued ticks (multiples of 1, 2 or 5 times a power of ten).
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };

        let span = hi - lo;
        if count == 0 || span <= 0.0 || !span.is_finite() {
            return Vec::new();
        }

        let step = tick_step(span / count as f64);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;

        (first..=last)
            .take(MAX_TICKS)
            .map(|i| i as f64 * step)
            .collect()
    }
}

fn tick_step(raw: f64) -> f64 {
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;

    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    factor * power
}

/// Scales of one chart at one canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub size: Size,
    pub x: TimeScale,
    pub y: LinearScale,
}

impl ChartLayout {
    pub fn new(state: &ChartState, size: Size) -> Self {
        let x = TimeScale::new(
            state.start(),
            state.end(),
            (LEFT_MARGIN, size.width - RIGHT_MARGIN),
        );
        let y = LinearScale::new(
            (0.0, state.value_ceiling() * HEADROOM),
            (size.height - BOTTOM_MARGIN, 0.0),
        );

        Self { size, x, y }
    }

    /// Left edge of the plot area.
    pub fn plot_left(&self) -> f32 {
        LEFT_MARGIN
    }

    /// Right edge of the plot area.
    pub fn plot_right(&self) -> f32 {
        self.size.width - RIGHT_MARGIN
    }

    /// Bottom edge of the plot area.
    pub fn plot_bottom(&self) -> f32 {
        self.size.height - BOTTOM_MARGIN
    }

    /// Horizontal extent of the brush.
    pub fn brush_extent(&self) -> (f32, f32) {
        (self.plot_left(), self.plot_right().max(self.plot_left()))
    }

    /// Whether a canvas-relative position lies in the plot area.
    pub fn contains(&self, position: Point) -> bool {
        let (left, right) = self.brush_extent();
        position.x >= left
            && position.x <= right
            && position.y >= 0.0
            && position.y <= self.plot_bottom()
    }

    /// Canvas position of a data point.
    pub fn project(&self, point: &DataPoint) -> Point {
        Point::new(self.x.project(point.timestamp), self.y.project(point.value))
    }
}
