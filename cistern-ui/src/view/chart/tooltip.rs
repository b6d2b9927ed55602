//! Pointer-driven value interpolation.
//!
//! Brackets are half-open: a hovered instant `h` falls between `p1` and
//! `p2` when `p1.timestamp <= h < p2.timestamp`. Hovering exactly on the
//! last sample of a series therefore has no bracket.

use chrono::{DateTime, Utc};

use super::scale::to_millis;
use super::{DataPoint, SeriesByGroup};
use crate::view::color::{GroupColor, color_for};

/// One line of the tooltip overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipEntry {
    pub group_id: String,
    pub value: f64,
    pub color: GroupColor,
}

/// The pair of points around `at`: the first point later than `at` and its
/// predecessor.
pub fn bracket(points: &[DataPoint], at: DateTime<Utc>) -> Option<(&DataPoint, &DataPoint)> {
    let next = points.iter().position(|point| point.timestamp > at)?;
    let previous = next.checked_sub(1)?;
    Some((&points[previous], &points[next]))
}

/// Linearly interpolated value of a series at `at`.
///
/// Returns exactly `0.0` when there is no bracket or the arithmetic is not
/// finite.
pub fn interpolate(points: &[DataPoint], at: DateTime<Utc>) -> f64 {
    let Some((p1, p2)) = bracket(points, at) else {
        return 0.0;
    };

    let t1 = to_millis(p1.timestamp);
    let fraction = (to_millis(at) - t1) / (to_millis(p2.timestamp) - t1);
    let value = p1.value + fraction * (p2.value - p1.value);

    if value.is_finite() { value } else { 0.0 }
}

/// Tooltip lines at `at`, largest value first, zero values omitted.
pub fn tooltip_entries(series_by_group: &SeriesByGroup, at: DateTime<Utc>) -> Vec<TooltipEntry> {
    let mut entries: Vec<TooltipEntry> = series_by_group
        .iter()
        .map(|(group_id, points)| TooltipEntry {
            group_id: group_id.clone(),
            value: interpolate(points, at),
            color: color_for(group_id),
        })
        .filter(|entry| entry.value != 0.0)
        .collect();

    entries.sort_by(|a, b| b.value.total_cmp(&a.value));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn series(points: &[(i64, f64)]) -> Vec<DataPoint> {
        points
            .iter()
            .map(|(secs, value)| DataPoint::new(at(*secs), *value))
            .collect()
    }

    #[test]
    fn test_interpolate_midpoint() {
        let points = series(&[(0, 10.0), (10, 20.0)]);
        assert_eq!(interpolate(&points, at(5)), 15.0);
    }

    #[test]
    fn test_interpolate_outside_range() {
        let points = series(&[(0, 10.0), (10, 20.0)]);
        assert_eq!(interpolate(&points, at(-1)), 0.0);
        assert_eq!(interpolate(&points, at(11)), 0.0);
    }

    #[test]
    fn test_half_open_bracket() {
        let points = series(&[(0, 10.0), (10, 20.0), (20, 40.0)]);

        // Exactly on a sample: bracket starts at that sample
        assert_eq!(interpolate(&points, at(0)), 10.0);
        assert_eq!(interpolate(&points, at(10)), 20.0);
        // The last sample closes no bracket
        assert_eq!(interpolate(&points, at(20)), 0.0);

        let (p1, p2) = bracket(&points, at(10)).unwrap();
        assert_eq!(p1.timestamp, at(10));
        assert_eq!(p2.timestamp, at(20));
    }

    #[test]
    fn test_degenerate_series() {
        assert_eq!(interpolate(&[], at(0)), 0.0);
        assert_eq!(interpolate(&series(&[(0, 5.0)]), at(0)), 0.0);
        assert_eq!(interpolate(&series(&[(0, f64::NAN), (10, 1.0)]), at(5)), 0.0);
    }

    #[test]
    fn test_entries_sorted_descending() {
        let mut by_group = SeriesByGroup::new();
        by_group.insert("a".to_string(), series(&[(0, 10.0), (10, 20.0)]));
        by_group.insert("b".to_string(), series(&[(0, 20.0), (10, 40.0)]));

        let entries = tooltip_entries(&by_group, at(5));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].group_id, "b");
        assert_eq!(entries[0].value, 30.0);
        assert_eq!(entries[1].group_id, "a");
        assert_eq!(entries[1].value, 15.0);
        assert_eq!(entries[1].color, color_for("a"));
    }

    #[test]
    fn test_zero_entries_omitted() {
        let mut by_group = SeriesByGroup::new();
        by_group.insert("a".to_string(), series(&[(0, 10.0), (10, 20.0)]));
        by_group.insert("flat".to_string(), series(&[(0, 0.0), (10, 0.0)]));
        by_group.insert("late".to_string(), series(&[(30, 1.0), (40, 2.0)]));

        let entries = tooltip_entries(&by_group, at(5));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].group_id, "a");
    }

    #[test]
    fn test_negative_values_sort_last() {
        let mut by_group = SeriesByGroup::new();
        by_group.insert("neg".to_string(), series(&[(0, -10.0), (10, -10.0)]));
        by_group.insert("pos".to_string(), series(&[(0, 1.0), (10, 1.0)]));

        let entries = tooltip_entries(&by_group, at(5));
        let order: Vec<&str> = entries.iter().map(|e| e.group_id.as_str()).collect();
        assert_eq!(order, vec!["pos", "neg"]);
    }
}
