//! Typed parsing and formatting of instants entered by users or read from a location.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Outcome of parsing a date/time string.
///
/// Lenient callers fall back to a default on anything but `Valid`, and the
/// fallback is visible at the call site instead of hidden in an error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInstant {
    /// The input parsed to an instant.
    Valid(DateTime<Utc>),
    /// The input was empty or whitespace.
    Empty,
    /// The input could not be parsed; holds the offending text.
    Invalid(String),
}

impl ParsedInstant {
    /// Parse an instant.
    ///
    /// Accepts RFC 3339 (any offset, converted to UTC), a zone-less
    /// `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC, and a bare `YYYY-MM-DD`
    /// read as midnight UTC.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Self::Empty;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Self::Valid(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
            return Self::Valid(naive.and_utc());
        }

        if let Some(midnight) = NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Self::Valid(midnight.and_utc());
        }

        Self::Invalid(input.to_string())
    }

    /// The parsed instant, if any.
    pub fn valid(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Valid(dt) => Some(dt),
            Self::Empty | Self::Invalid(_) => None,
        }
    }

    /// The parsed instant, or `default` when empty or invalid.
    pub fn unwrap_or(self, default: DateTime<Utc>) -> DateTime<Utc> {
        self.valid().unwrap_or(default)
    }
}

/// Format an instant as ISO-8601 in UTC with a `Z` suffix.
///
/// Fractional seconds are only emitted when non-zero, so whole-second
/// instants round-trip byte for byte through [`ParsedInstant::parse`].
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
