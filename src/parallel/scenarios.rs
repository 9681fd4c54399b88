//! Side-by-side runs of the same roster under different rule tables or horizons.
//!
//! Each scenario works on its own clone of the roster, so runs never observe
//! one another. Output order matches input order.

use chrono::NaiveDate;
use rayon::prelude::*;
use rayon::ThreadPoolBuildError;
use tracing::debug;

use crate::engine::driver::{simulate, SimulationConfig, SimulationError, SimulationResult};
use crate::engine::roster::Roster;
use crate::engine::rules::RuleSet;
use crate::parallel::pool::WorkerPool;

#[derive(Debug, Clone)]
pub struct Scenario {
    pub label: String,
    pub rules: RuleSet,
    pub target: NaiveDate,
}

impl Scenario {
    pub fn new(label: impl Into<String>, rules: RuleSet, target: NaiveDate) -> Self {
        Self {
            label: label.into(),
            rules,
            target,
        }
    }
}

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub label: String,
    pub result: Result<SimulationResult, SimulationError>,
}

pub fn run_scenarios(
    roster: &Roster,
    start: NaiveDate,
    tracked: u64,
    scenarios: &[Scenario],
    pool: &WorkerPool,
) -> Result<Vec<ScenarioOutcome>, ThreadPoolBuildError> {
    pool.install(|| {
        scenarios
            .par_iter()
            .map(|scenario| {
                let config = SimulationConfig {
                    start,
                    target: scenario.target,
                    tracked,
                };
                debug!(target: "ranksim::parallel", label = %scenario.label, "scenario started");
                ScenarioOutcome {
                    label: scenario.label.clone(),
                    result: simulate(roster.clone(), &scenario.rules, &config),
                }
            })
            .collect()
    })
}
