//! Write simulation output: roster tables as CSV, the tracked history as JSON,
//! and a plain-text report for terminals.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::data::loader::Field;
use crate::engine::calendar::format_day_first;
use crate::engine::driver::{SimulationResult, TrackedStatus};
use crate::engine::events::Event;
use crate::engine::roster::Member;

pub const ACTIVE_FILE: &str = "active.csv";
pub const RETIRED_FILE: &str = "retired.csv";
pub const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(format_day_first).unwrap_or_default()
}

/// Write members with the loader's canonical header so the file loads again.
pub fn write_roster<W: io::Write>(
    writer: W,
    members: &[Member],
    extra_columns: &[String],
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    let header: Vec<&str> = Field::ALL
        .iter()
        .map(|field| field.header())
        .chain(extra_columns.iter().map(String::as_str))
        .collect();
    csv.write_record(&header)?;

    for member in members {
        let mut record = vec![
            member.registration.map(|id| id.to_string()).unwrap_or_default(),
            member.rank.clone(),
            member.seniority.map(|s| s.to_string()).unwrap_or_default(),
            date_cell(member.last_promotion),
            date_cell(member.admission),
            date_cell(member.birth),
            if member.supernumerary { "x".to_string() } else { String::new() },
        ];
        record.extend(
            (0..extra_columns.len()).map(|i| member.extra.get(i).cloned().unwrap_or_default()),
        );
        csv.write_record(&record)?;
    }
    csv.flush().map_err(|source| ExportError::Io {
        path: "<csv writer>".to_string(),
        source,
    })?;
    Ok(())
}

pub fn write_roster_csv(
    path: impl AsRef<Path>,
    members: &[Member],
    extra_columns: &[String],
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(io_error(path))?;
    write_roster(file, members, extra_columns)
}

#[derive(Debug, Serialize)]
struct HistoryDocument<'a> {
    tracked: u64,
    start: NaiveDate,
    target: NaiveDate,
    status: &'a TrackedStatus,
    status_text: String,
    cycles: &'a [NaiveDate],
    events: &'a [Event],
}

pub fn history_json(result: &SimulationResult) -> Result<String, ExportError> {
    let document = HistoryDocument {
        tracked: result.tracked,
        start: result.start,
        target: result.target,
        status: &result.status,
        status_text: result.status.to_string(),
        cycles: &result.cycles,
        events: &result.events,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn write_history_json(path: impl AsRef<Path>, result: &SimulationResult) -> Result<(), ExportError> {
    let path = path.as_ref();
    fs::write(path, history_json(result)?).map_err(io_error(path))
}

/// Write `active.csv`, `retired.csv` (skipped when nobody retired) and `history.json`
/// into `dir`, creating it if needed. Returns the files written.
pub fn export_result(dir: impl AsRef<Path>, result: &SimulationResult) -> Result<Vec<PathBuf>, ExportError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let mut written = Vec::new();
    let active = dir.join(ACTIVE_FILE);
    write_roster_csv(&active, &result.active, &result.extra_columns)?;
    written.push(active);

    if !result.retired.is_empty() {
        let retired = dir.join(RETIRED_FILE);
        write_roster_csv(&retired, &result.retired, &result.extra_columns)?;
        written.push(retired);
    }

    let history = dir.join(HISTORY_FILE);
    write_history_json(&history, result)?;
    written.push(history);
    Ok(written)
}

pub fn render_report(result: &SimulationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Simulation {} -> {} ({} cycles)",
        format_day_first(result.start),
        format_day_first(result.target),
        result.cycles.len()
    );
    let _ = writeln!(out, "History of registration {}:", result.tracked);
    if result.events.is_empty() {
        let _ = writeln!(out, "  no events in the simulated period");
    }
    for event in &result.events {
        let _ = writeln!(out, "  {event}");
    }
    let _ = writeln!(out, "Final status: {}", result.status);
    let _ = writeln!(
        out,
        "Active: {}  Retired: {}",
        result.active.len(),
        result.retired.len()
    );
    out
}
