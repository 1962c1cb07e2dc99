//! End-of-session summaries.
//!
//! When a session log is kept, a [`Summarizer`] gets a chance to write a
//! companion file next to it. [`StatsSummarizer`] produces `summary.json`
//! with per-column ranges and packet accounting.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use leolink_frame::{unit_for, LOG_HEADER};
use serde::Serialize;

use crate::error::StoreError;

pub const SUMMARY_FILE_NAME: &str = "summary.json";

const SECONDS_PER_DAY: i64 = 86_400;

/// Hook invoked once when a non-empty session log is closed.
pub trait Summarizer: Send {
    /// Summarize the log at `log_path`, returning the written file if any.
    fn summarize(&self, log_path: &Path) -> Result<Option<PathBuf>, StoreError>;
}

/// Writes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSummary;

impl Summarizer for NoSummary {
    fn summarize(&self, _log_path: &Path) -> Result<Option<PathBuf>, StoreError> {
        Ok(None)
    }
}

/// Writes `summary.json` beside the session log.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatsSummarizer;

impl Summarizer for StatsSummarizer {
    fn summarize(&self, log_path: &Path) -> Result<Option<PathBuf>, StoreError> {
        let text = fs::read_to_string(log_path)?;
        let mut summary = summarize_log(&text);
        summary.log_file = log_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let out = log_path.with_file_name(SUMMARY_FILE_NAME);
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|err| StoreError::Summary(err.to_string()))?;
        fs::write(&out, json)?;
        Ok(Some(out))
    }
}

/// Range of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub unit: &'static str,
    pub samples: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub log_file: String,
    pub records: usize,
    pub first_mission_time: Option<String>,
    pub last_mission_time: Option<String>,
    /// Mission time covered by the log; a single midnight rollover is assumed.
    pub elapsed_seconds: Option<i64>,
    pub first_packet: Option<u32>,
    pub last_packet: Option<u32>,
    /// Packet counters expected between first and last but never logged.
    pub missing_packets: u64,
    pub columns: BTreeMap<String, ColumnStats>,
}

#[derive(Default)]
struct Accumulator {
    samples: usize,
    min: f64,
    max: f64,
    sum: f64,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        if self.samples == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.samples += 1;
    }
}

/// Summarize the text of a session log. The first line is the header.
pub fn summarize_log(text: &str) -> SessionSummary {
    let mut lines = text.lines();
    let header: Vec<&str> = match lines.next() {
        Some(line) => line.split(',').map(str::trim).collect(),
        None => LOG_HEADER.to_vec(),
    };
    let column = |name: &str| header.iter().position(|heading| *heading == name);
    let time_col = column("MISSION_TIME");
    let count_col = column("PACKET_COUNT");

    let unit_columns: Vec<(usize, &str, &'static str)> = header
        .iter()
        .enumerate()
        .filter_map(|(index, name)| unit_for(name).map(|unit| (index, *name, unit)))
        .collect();
    let mut accumulators: Vec<Accumulator> =
        unit_columns.iter().map(|_| Accumulator::default()).collect();

    let mut summary = SessionSummary::default();
    let mut counts = Vec::new();

    for line in lines.filter(|line| !line.trim().is_empty()) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        summary.records += 1;

        if let Some(time) = time_col.and_then(|index| fields.get(index)) {
            if summary.first_mission_time.is_none() {
                summary.first_mission_time = Some(time.to_string());
            }
            summary.last_mission_time = Some(time.to_string());
        }
        if let Some(count) = count_col
            .and_then(|index| fields.get(index))
            .and_then(|value| value.parse::<u32>().ok())
        {
            counts.push(count);
        }
        for ((index, _, _), acc) in unit_columns.iter().zip(accumulators.iter_mut()) {
            if let Some(value) = fields
                .get(*index)
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite())
            {
                acc.push(value);
            }
        }
    }

    summary.elapsed_seconds = match (&summary.first_mission_time, &summary.last_mission_time) {
        (Some(first), Some(last)) => elapsed_seconds(first, last),
        _ => None,
    };
    summary.first_packet = counts.first().copied();
    summary.last_packet = counts.last().copied();
    summary.missing_packets = missing_packets(&counts);
    summary.columns = unit_columns
        .iter()
        .zip(accumulators)
        .filter(|(_, acc)| acc.samples > 0)
        .map(|((_, name, unit), acc)| {
            (
                name.to_string(),
                ColumnStats {
                    unit: *unit,
                    samples: acc.samples,
                    min: acc.min,
                    max: acc.max,
                    mean: acc.sum / acc.samples as f64,
                },
            )
        })
        .collect();
    summary
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f").ok()
}

fn elapsed_seconds(first: &str, last: &str) -> Option<i64> {
    let delta = (parse_time(last)? - parse_time(first)?).num_seconds();
    Some(if delta < 0 {
        delta + SECONDS_PER_DAY
    } else {
        delta
    })
}

// Forward gaps only; a backwards jump starts a new run.
fn missing_packets(counts: &[u32]) -> u64 {
    counts
        .windows(2)
        .map(|pair| match pair[1].checked_sub(pair[0]) {
            Some(step) if step > 1 => u64::from(step - 1),
            _ => 0,
        })
        .sum()
}
