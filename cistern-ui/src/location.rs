//! Page location and navigation history.
//!
//! The dashboard state worth sharing lives in four query parameters:
//! `start`, `end`, `query` and `collection`. Any other parameter is carried
//! along untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::Url;

use cistern_common::{Error, ParsedInstant, Result, format_instant};

/// Base used when a location is given as a bare query string.
pub const DEFAULT_BASE: &str = "cistern://dashboard/";

const START_KEY: &str = "start";
const END_KEY: &str = "end";
const QUERY_KEY: &str = "query";
const COLLECTION_KEY: &str = "collection";

/// Session parameters read from a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParams {
    pub start: ParsedInstant,
    pub end: ParsedInstant,
    pub query: String,
    pub collection: Option<String>,
}

/// An absolute URL holding the dashboard session in its query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Parse a full URL or a bare query string (with or without `?`).
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.contains("://") {
            let url = Url::parse(input).map_err(|e| Error::url(format!("{input}: {e}")))?;
            return Ok(Self { url });
        }

        let mut url = Url::parse(DEFAULT_BASE).map_err(|e| Error::url(e.to_string()))?;
        let query = input.trim_start_matches('?');
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// First value of a query parameter.
    pub fn param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Read the session parameters. Missing dates parse as `Empty`.
    pub fn params(&self) -> LocationParams {
        let instant = |key| {
            self.param(key)
                .map_or(ParsedInstant::Empty, |raw| ParsedInstant::parse(&raw))
        };

        LocationParams {
            start: instant(START_KEY),
            end: instant(END_KEY),
            query: self.param(QUERY_KEY).unwrap_or_default(),
            collection: self.param(COLLECTION_KEY),
        }
    }

    /// A copy with the session parameters replaced.
    ///
    /// Existing session keys are rewritten in place, missing ones are
    /// appended, and every other key keeps its value and position.
    pub fn with_session(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        query: &str,
        collection: &str,
    ) -> Self {
        let mut session = [
            (START_KEY, Some(format_instant(&start))),
            (END_KEY, Some(format_instant(&end))),
            (QUERY_KEY, Some(query.to_string())),
            (COLLECTION_KEY, Some(collection.to_string())),
        ];

        let mut pairs: Vec<(String, String)> = Vec::new();
        for (key, value) in self.url.query_pairs() {
            match session.iter_mut().find(|(k, _)| *k == key) {
                // Duplicates of a session key are dropped
                Some((k, slot)) => match slot.take() {
                    Some(new_value) => pairs.push((k.to_string(), new_value)),
                    None => continue,
                },
                None => pairs.push((key.into_owned(), value.into_owned())),
            }
        }
        for (key, value) in session {
            if let Some(value) = value {
                pairs.push((key.to_string(), value));
            }
        }

        let mut url = self.url.clone();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        Self { url }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_BASE).expect("DEFAULT_BASE is a valid URL"),
        }
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Visited locations with a cursor, like browser history.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
    cursor: usize,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.cursor]
    }

    /// Visit a new location, dropping any forward entries.
    pub fn push(&mut self, location: Location) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(location);
        self.cursor = self.entries.len() - 1;
    }

    /// Step back and return the restored location.
    pub fn back(&mut self) -> Option<&Location> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    /// Step forward and return the restored location.
    pub fn forward(&mut self) -> Option<&Location> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
