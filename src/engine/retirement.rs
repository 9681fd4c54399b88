//! Per-cycle retirement by age or length of service.

use chrono::NaiveDate;
use tracing::debug;

use crate::engine::events::{Event, EventKind};
use crate::engine::promotion::reached;
use crate::engine::roster::{Member, Roster};
use crate::engine::rules::RetirementRules;

/// True when either threshold is met on `date`. A missing date never meets its threshold.
pub fn must_retire(member: &Member, rules: &RetirementRules, date: NaiveDate) -> bool {
    let too_old = member.age(date).is_some_and(|age| reached(age, rules.max_age));
    let served_out = member
        .service_years(date)
        .is_some_and(|years| reached(years, rules.max_service_years));
    too_old || served_out
}

/// Evaluate every active member against the thresholds and retire them in one batch.
/// Returns the number retired.
pub fn run_retirements(
    roster: &mut Roster,
    rules: &RetirementRules,
    date: NaiveDate,
    tracked: Option<u64>,
    events: &mut Vec<Event>,
) -> usize {
    let batch = roster.retire_where(|member| must_retire(member, rules, date));
    let retired = &roster.retired()[batch];

    if let Some(member) = tracked.and_then(|id| retired.iter().find(|m| m.is(id))) {
        events.push(Event::new(
            date,
            EventKind::Retired {
                rank: member.rank.clone(),
            },
        ));
    }
    if !retired.is_empty() {
        debug!(target: "ranksim::retirement", %date, retired = retired.len(), "members retired");
    }
    retired.len()
}
