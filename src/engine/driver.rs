//! Chronological driver: promotion, then absorption, then retirement for every cycle date.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::engine::absorption::run_absorption;
use crate::engine::events::Event;
use crate::engine::promotion::run_promotions;
use crate::engine::retirement::run_retirements;
use crate::engine::roster::{Member, Roster, UnknownRank};
use crate::engine::rules::{RuleSet, RulesError};
use crate::engine::schedule::cycle_dates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationConfig {
    /// First day a cycle may fall on (normally today).
    pub start: NaiveDate,
    pub target: NaiveDate,
    /// Registration whose history is reported.
    pub tracked: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("invalid rule table: {0}")]
    Rules(#[from] RulesError),
    #[error(transparent)]
    UnknownRank(#[from] UnknownRank),
}

/// Per-cycle counts handed to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub index: usize,
    pub total: usize,
    pub date: NaiveDate,
    pub promotions: usize,
    pub absorptions: usize,
    pub retirements: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackedStatus {
    Active { rank: String, supernumerary: bool },
    Retired { last_rank: String },
    NotFound,
}

impl TrackedStatus {
    fn locate(roster: &Roster, registration: u64) -> Self {
        if let Some(member) = roster.find_active(registration) {
            Self::Active {
                rank: member.rank.clone(),
                supernumerary: member.supernumerary,
            }
        } else if let Some(member) = roster.find_retired(registration) {
            Self::Retired {
                last_rank: member.rank.clone(),
            }
        } else {
            Self::NotFound
        }
    }
}

impl fmt::Display for TrackedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active {
                rank,
                supernumerary: true,
            } => write!(f, "{rank} (supernumerary)"),
            Self::Active { rank, .. } => write!(f, "{rank} (regular)"),
            Self::Retired { last_rank } => write!(f, "retired (last rank: {last_rank})"),
            Self::NotFound => write!(f, "registration not found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationResult {
    pub start: NaiveDate,
    pub target: NaiveDate,
    pub tracked: u64,
    pub cycles: Vec<NaiveDate>,
    pub events: Vec<Event>,
    pub status: TrackedStatus,
    pub active: Vec<Member>,
    /// Everyone retired across all cycles, in retirement order.
    pub retired: Vec<Member>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_columns: Vec<String>,
}

/// Apply one cycle to `roster`: all pairs top-down, then absorption, then retirement.
pub fn run_cycle(
    roster: &mut Roster,
    rules: &RuleSet,
    date: NaiveDate,
    tracked: Option<u64>,
    events: &mut Vec<Event>,
) -> CycleReport {
    let promotions = run_promotions(roster, rules, date, tracked, events);
    let absorptions = run_absorption(roster, rules, date, tracked, events);
    let retirements = run_retirements(roster, &rules.retirement, date, tracked, events);
    CycleReport {
        index: 0,
        total: 1,
        date,
        promotions,
        absorptions,
        retirements,
    }
}

pub fn simulate(
    roster: Roster,
    rules: &RuleSet,
    config: &SimulationConfig,
) -> Result<SimulationResult, SimulationError> {
    simulate_with_observer(roster, rules, config, |_| {})
}

/// Run every cycle between `config.start` and `config.target`, calling `observer`
/// after each one. The observer cannot influence the run.
///
/// Rules and member ranks are checked before the first cycle; an unknown rank
/// aborts the run since vacancy counts would otherwise be wrong.
pub fn simulate_with_observer(
    mut roster: Roster,
    rules: &RuleSet,
    config: &SimulationConfig,
    mut observer: impl FnMut(&CycleReport),
) -> Result<SimulationResult, SimulationError> {
    rules.validate()?;
    roster.ensure_ranks_known(rules)?;

    let cycles = cycle_dates(config.start, config.target, &rules.cycle_days);
    let tracked = Some(config.tracked);
    let mut events = Vec::new();

    for (index, &date) in cycles.iter().enumerate() {
        let report = CycleReport {
            index,
            total: cycles.len(),
            ..run_cycle(&mut roster, rules, date, tracked, &mut events)
        };
        observer(&report);
    }

    let status = TrackedStatus::locate(&roster, config.tracked);
    let (active, retired, extra_columns) = roster.into_parts();
    info!(
        target: "ranksim::driver",
        cycles = cycles.len(),
        events = events.len(),
        active = active.len(),
        retired = retired.len(),
        "simulation finished"
    );

    Ok(SimulationResult {
        start: config.start,
        target: config.target,
        tracked: config.tracked,
        cycles,
        events,
        status,
        active,
        retired,
        extra_columns,
    })
}

impl SimulationResult {
    /// Final state as a roster again, e.g. to continue from the target date.
    pub fn roster(&self) -> Roster {
        let mut roster = Roster::with_extra_columns(
            self.active.iter().chain(&self.retired).cloned().collect(),
            self.extra_columns.clone(),
        );
        let retired_from = self.active.len();
        let mut position = 0;
        roster.retire_where(|_| {
            position += 1;
            position > retired_from
        });
        roster
    }
}
