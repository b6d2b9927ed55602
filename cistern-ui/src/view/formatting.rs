//! Shared formatting utilities for the dashboard views.

use chrono::{DateTime, Utc};
use serde_json::Value;

const MINUTE_MS: i64 = 60_000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// SI prefixes from yocto (1e-24) to yotta (1e24).
const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Format a value with `significant` significant digits and an SI prefix.
///
/// Trailing zeros are kept, so `format_si(15.0, 4)` is `"15.00"` and
/// `format_si(20_000.0, 1)` is `"20k"`. Non-finite values print as-is.
pub fn format_si(value: f64, significant: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let precision = significant.clamp(1, 21);

    // Scientific notation does the rounding, including 9.99 -> 1.0e1
    let scientific = format!("{:.*e}", precision - 1, value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    let group = if digits.bytes().all(|b| b == b'0') {
        0
    } else {
        exponent.div_euclid(3).clamp(-8, 8)
    };
    let integer_len = exponent - group * 3 + 1;

    let number = if integer_len <= 0 {
        format!("0.{}{}", "0".repeat(integer_len.unsigned_abs() as usize), digits)
    } else if integer_len as usize >= digits.len() {
        format!("{}{}", digits, "0".repeat(integer_len as usize - digits.len()))
    } else {
        let (int, frac) = digits.split_at(integer_len as usize);
        format!("{int}.{frac}")
    };

    let sign = if value.is_sign_negative() && digits.bytes().any(|b| b != b'0') {
        "-"
    } else {
        ""
    };

    format!("{sign}{number}{}", SI_PREFIXES[(group + 8) as usize])
}

/// Label for a time axis tick, coarser for wider tick intervals.
pub fn format_time_tick(instant: &DateTime<Utc>, interval_ms: i64) -> String {
    let pattern = if interval_ms >= 365 * DAY_MS {
        "%Y"
    } else if interval_ms >= 30 * DAY_MS {
        "%b %Y"
    } else if interval_ms >= DAY_MS {
        "%b %d"
    } else if interval_ms >= MINUTE_MS {
        "%H:%M"
    } else {
        "%H:%M:%S"
    };

    instant.format(pattern).to_string()
}

/// Header line of the chart tooltip.
pub fn format_hover_instant(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Text of a table cell. Strings are shown without quotes, null as empty.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_format_si_tooltip_precision() {
        assert_eq!(format_si(15.0, 4), "15.00");
        assert_eq!(format_si(1234.6, 4), "1.235k");
        assert_eq!(format_si(0.5, 4), "500.0m");
        assert_eq!(format_si(42_000_000.0, 4), "42.00M");
        assert_eq!(format_si(0.0, 4), "0.000");
    }

    #[test]
    fn test_format_si_axis_precision() {
        assert_eq!(format_si(0.0, 1), "0");
        assert_eq!(format_si(5.0, 1), "5");
        assert_eq!(format_si(20_000.0, 1), "20k");
        assert_eq!(format_si(1_500.0, 1), "2k");
        // Zero precision behaves like one significant digit
        assert_eq!(format_si(40_000.0, 0), "40k");
    }

    #[test]
    fn test_format_si_rounding_bump() {
        assert_eq!(format_si(999.96, 4), "1.000k");
        assert_eq!(format_si(9.99, 1), "10");
    }

    #[test]
    fn test_format_si_small_and_negative() {
        assert_eq!(format_si(0.000_002, 1), "2µ");
        assert_eq!(format_si(-30.0, 4), "-30.00");
        assert_eq!(format_si(-0.0, 1), "0");
        assert_eq!(format_si(f64::NAN, 4), "NaN");
    }

    #[test]
    fn test_format_si_extreme_exponents() {
        assert_eq!(format_si(1e27, 1), "1000Y");
        assert_eq!(format_si(1e-27, 1), "0.001y");
    }

    #[test]
    fn test_format_time_tick() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 15).unwrap();

        assert_eq!(format_time_tick(&t, 15_000), "14:30:15");
        assert_eq!(format_time_tick(&t, 15 * MINUTE_MS), "14:30");
        assert_eq!(format_time_tick(&t, 7 * DAY_MS), "Mar 05");
        assert_eq!(format_time_tick(&t, 30 * DAY_MS), "Mar 2024");
        assert_eq!(format_time_tick(&t, 365 * DAY_MS), "2024");
    }

    #[test]
    fn test_format_hover_instant() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 15).unwrap();
        assert_eq!(format_hover_instant(&t), "2024-03-05 14:30:15 UTC");
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&json!("web-1")), "web-1");
        assert_eq!(format_cell(&json!(12.5)), "12.5");
        assert_eq!(format_cell(&json!(3)), "3");
        assert_eq!(format_cell(&json!(null)), "");
        assert_eq!(format_cell(&json!(true)), "true");
    }
}
