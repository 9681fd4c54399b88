use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::rules_file;
use crate::engine::calendar::parse_day_first;
use crate::engine::driver::{simulate, SimulationConfig, SimulationError, SimulationResult};
use crate::engine::roster::{Member, Roster};
use crate::engine::rules::{RuleSet, PRESET_NAMES};
use crate::engine::schedule::cycle_dates;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("failed to encode response: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            Self::Parse(_) | Self::Validation(_) => (400, "Bad Request"),
            Self::NotFound(_) => (404, "Not Found"),
            Self::Simulation(_) => (422, "Unprocessable Entity"),
            Self::Serialize(_) => (500, "Internal Server Error"),
        }
    }
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "ranksim-api",
        "version": env!("CARGO_PKG_VERSION"),
        "presets": PRESET_NAMES,
    }))
}

/// Value of `key` in the query string of `path`, with `+` read as a space.
fn query_param(path: &str, key: &str) -> Option<String> {
    let query = path.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        k.trim()
            .eq_ignore_ascii_case(key)
            .then(|| v.trim().replace('+', " ").replace("%20", " "))
    })
}

fn date_param(raw: &str, name: &str) -> Result<NaiveDate, ApiError> {
    parse_day_first(raw).ok_or_else(|| ApiError::Validation(format!("{name}: invalid date '{raw}'")))
}

fn preset_rules(name: Option<&str>) -> Result<RuleSet, ApiError> {
    let name = name.unwrap_or("cbm");
    RuleSet::preset(name).ok_or_else(|| {
        ApiError::NotFound(format!(
            "unknown preset '{name}' (available: {})",
            rules_file::preset_list()
        ))
    })
}

pub fn rules_payload(path: &str) -> Result<String, ApiError> {
    let preset = query_param(path, "preset");
    let rules = preset_rules(preset.as_deref())?;
    serde_json::to_string_pretty(&serde_json::json!({
        "preset": preset.as_deref().unwrap_or("cbm"),
        "rules": rules,
    }))
    .map_err(ApiError::Serialize)
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub start: NaiveDate,
    pub target: NaiveDate,
    pub cycles: Vec<NaiveDate>,
}

pub fn schedule_payload(path: &str) -> Result<String, ApiError> {
    let target = query_param(path, "target")
        .ok_or_else(|| ApiError::Validation("target is required".to_string()))?;
    let target = date_param(&target, "target")?;
    let start = match query_param(path, "today") {
        Some(raw) => date_param(&raw, "today")?,
        None => Local::now().date_naive(),
    };
    let rules = preset_rules(query_param(path, "preset").as_deref())?;

    let response = ScheduleResponse {
        start,
        target,
        cycles: cycle_dates(start, target, &rules.cycle_days),
    };
    serde_json::to_string_pretty(&response).map_err(ApiError::Serialize)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateRequest {
    pub members: Vec<Member>,
    pub tracked: u64,
    pub target: String,
    #[serde(default)]
    pub today: Option<String>,
    #[serde(default)]
    pub preset: Option<String>,
    /// Inline rule table; takes precedence over `preset`.
    #[serde(default)]
    pub rules: Option<RuleSet>,
    #[serde(default)]
    pub extra_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulateResponse {
    pub status: &'static str,
    pub summary: String,
    pub result: SimulationResult,
}

pub fn simulate_payload(body: &str) -> Result<String, ApiError> {
    let request: SimulateRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;

    let target = date_param(&request.target, "target")?;
    let start = match request.today.as_deref() {
        Some(raw) => date_param(raw, "today")?,
        None => Local::now().date_naive(),
    };
    let rules = match request.rules {
        Some(rules) => rules,
        None => preset_rules(request.preset.as_deref())?,
    };

    let config = SimulationConfig {
        start,
        target,
        tracked: request.tracked,
    };
    let roster = Roster::with_extra_columns(request.members, request.extra_columns);
    let result = simulate(roster, &rules, &config)?;

    let response = SimulateResponse {
        status: "ok",
        summary: result.status.to_string(),
        result,
    };
    serde_json::to_string_pretty(&response).map_err(ApiError::Serialize)
}
