pub mod absorption;
pub mod calendar;
pub mod driver;
pub mod events;
pub mod promotion;
pub mod retirement;
pub mod roster;
pub mod rules;
pub mod schedule;

pub use absorption::run_absorption;
pub use calendar::{format_day_first, parse_day_first, whole_years_between};
pub use driver::{
    run_cycle, simulate, simulate_with_observer, CycleReport, SimulationConfig, SimulationError,
    SimulationResult, TrackedStatus,
};
pub use events::{Event, EventKind};
pub use promotion::{decide, run_promotions, Decision};
pub use retirement::{must_retire, run_retirements};
pub use roster::{Member, Roster, Seniority, UnknownRank};
pub use rules::{Ceiling, CycleDay, Rank, RetirementRules, RuleSet, RulesError, PRESET_NAMES};
pub use schedule::cycle_dates;
