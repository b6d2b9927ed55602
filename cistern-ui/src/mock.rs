//! Demo query backend.
//!
//! Synthesises plausible responses so the dashboard runs without a Cistern
//! server: random walks for a handful of hex group ids, bucketed to about
//! sixty points per window.

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use cistern_common::{
    ColumnDesc, GROUP_ID_COLUMN, QueryDesc, QueryResponse, Row, TIMESTAMP_COLUMN, TimeRange,
    format_instant,
};

use crate::container::QueryRequest;

/// Points per chart the demo aims for.
pub const TARGET_POINTS: i64 = 60;

/// Window used when the request range is empty or inverted.
const FALLBACK_WINDOW_SECS: i64 = 3_600;

const DEFAULT_GROUPS: [&str; 3] = ["3f2a9c01d4e5b687", "a8", "0c7d"];

/// Offline stand-in for the query API.
#[derive(Debug, Clone)]
pub struct DemoBackend {
    groups: Vec<String>,
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new(DEFAULT_GROUPS.iter().map(|id| id.to_string()).collect())
    }
}

impl DemoBackend {
    pub fn new(groups: Vec<String>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Answer a request with fresh random data.
    pub fn query(&self, request: &QueryRequest) -> QueryResponse {
        let mut rng = SmallRng::from_os_rng();
        self.response_for(request, &mut rng)
    }

    /// Answer a request using the given random source.
    pub fn response_for(&self, request: &QueryRequest, rng: &mut impl Rng) -> QueryResponse {
        let (start, end) = if request.end > request.start {
            (request.start, request.end)
        } else {
            (request.end - FALLBACK_WINDOW_SECS, request.end)
        };

        let step = ((end - start) / TARGET_POINTS).max(1);
        let start = start.div_euclid(step) * step;
        let end = end.div_euclid(step) * step;

        tracing::debug!(
            collection = %request.collection,
            query = %request.query,
            start,
            end,
            step,
            "Generating demo response"
        );

        let columns = vec![ColumnDesc::new("cpu", "avg"), ColumnDesc::new("mem", "max")];

        let mut walks: Vec<Walk> = self.groups.iter().map(|_| Walk::new(rng)).collect();
        let mut series = Vec::new();

        let mut ts = start;
        while ts <= end {
            let Some(instant) = DateTime::<Utc>::from_timestamp(ts, 0) else {
                break;
            };

            for (group, walk) in self.groups.iter().zip(walks.iter_mut()) {
                let (cpu, mem) = walk.step(rng);
                series.push(row([
                    (GROUP_ID_COLUMN, json!(group)),
                    (TIMESTAMP_COLUMN, json!(format_instant(&instant))),
                    ("avg(cpu)", json!(cpu)),
                    ("max(mem)", json!(mem)),
                ]));
            }

            ts += step;
        }

        let summary = self
            .groups
            .iter()
            .zip(&walks)
            .map(|(group, walk)| {
                row([
                    (GROUP_ID_COLUMN, json!(group)),
                    ("avg(cpu)", json!(walk.cpu_mean())),
                    ("max(mem)", json!(walk.mem_max)),
                ])
            })
            .collect();

        QueryResponse {
            series,
            summary: Some(summary),
            events: None,
            query: QueryDesc {
                columns,
                // Microseconds, as the API reports it
                point_size: step * 1_000_000,
                time_range: TimeRange {
                    start: DateTime::from_timestamp(start, 0).unwrap_or_default(),
                    end: DateTime::from_timestamp(end, 0).unwrap_or_default(),
                },
            },
        }
    }
}

fn row<const N: usize>(fields: [(&str, Value); N]) -> Row {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Random walk state of one group.
#[derive(Debug, Clone)]
struct Walk {
    cpu: f64,
    mem: f64,
    cpu_sum: f64,
    samples: u32,
    mem_max: f64,
}

impl Walk {
    fn new(rng: &mut impl Rng) -> Self {
        Self {
            cpu: rng.random_range(10.0..60.0),
            mem: rng.random_range(1.0e9..4.0e9),
            cpu_sum: 0.0,
            samples: 0,
            mem_max: 0.0,
        }
    }

    fn step(&mut self, rng: &mut impl Rng) -> (f64, f64) {
        self.cpu = (self.cpu + rng.random_range(-5.0..5.0)).clamp(0.0, 100.0);
        self.mem = (self.mem + rng.random_range(-1.0e8..1.0e8)).clamp(2.5e8, 8.0e9);

        self.cpu_sum += self.cpu;
        self.samples += 1;
        self.mem_max = self.mem_max.max(self.mem);

        (self.cpu, self.mem)
    }

    fn cpu_mean(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.cpu_sum / self.samples as f64
        }
    }
}
