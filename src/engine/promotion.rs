//! Per-cycle promotion cascade.
//!
//! Adjacent rank pairs are processed from the top pair down so that seats freed
//! at the top are visible to the ranks below within the same cycle. Each pair
//! works on a candidate list captured before any of its own promotions, so a
//! member moves at most one rank per cycle.

use chrono::NaiveDate;
use tracing::debug;

use crate::engine::events::{Event, EventKind};
use crate::engine::roster::Roster;
use crate::engine::rules::{Rank, RuleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Promote into an excess seat, regardless of open regular seats.
    Supernumerary,
    /// Promote into a regular seat.
    Regular,
    Stay,
}

/// Outcome for one candidate of `current` given `occupied` regular seats in `next`.
///
/// The supernumerary rule is checked first: once the threshold is reached on an
/// excess-eligible rank the promotion is supernumerary even when a regular seat
/// is open.
pub fn decide(
    current: &Rank,
    next: &Rank,
    years_in_rank: i32,
    occupied: usize,
    supernumerary_after_years: u32,
) -> Decision {
    if current.supernumerary && reached(years_in_rank, supernumerary_after_years) {
        return Decision::Supernumerary;
    }
    let served = current
        .min_years
        .is_some_and(|min| reached(years_in_rank, min));
    if served && next.ceiling.has_room(occupied) {
        Decision::Regular
    } else {
        Decision::Stay
    }
}

/// `years >= threshold` without narrowing the threshold.
pub(crate) fn reached(years: i32, threshold: u32) -> bool {
    i64::from(years) >= i64::from(threshold)
}

/// Run every adjacent pair for `date`, top pair first. Events for `tracked` are
/// appended to `events`. Returns the number of promotions.
pub fn run_promotions(
    roster: &mut Roster,
    rules: &RuleSet,
    date: NaiveDate,
    tracked: Option<u64>,
    events: &mut Vec<Event>,
) -> usize {
    let mut promoted = 0;
    for pair in rules.ranks.windows(2).rev() {
        let (current, next) = (&pair[0], &pair[1]);
        let moved = promote_pair(roster, rules, current, next, date, tracked, events);
        if moved > 0 {
            debug!(
                target: "ranksim::promotion",
                %date,
                from = %current.label,
                to = %next.label,
                moved,
                "pair promoted"
            );
        }
        promoted += moved;
    }
    promoted
}

fn promote_pair(
    roster: &mut Roster,
    rules: &RuleSet,
    current: &Rank,
    next: &Rank,
    date: NaiveDate,
    tracked: Option<u64>,
    events: &mut Vec<Event>,
) -> usize {
    let candidates = roster.holders_by_seniority(&current.label, false);
    // Nobody leaves `next` while this pair runs, so only our own regular promotions move the count.
    let mut occupied = roster.regular_count(&next.label);
    let mut moved = 0;

    for index in candidates {
        let Some(years) = roster.active()[index].years_in_rank(date) else {
            continue;
        };
        let supernumerary = match decide(current, next, years, occupied, rules.supernumerary_after_years) {
            Decision::Supernumerary => true,
            Decision::Regular => {
                occupied += 1;
                false
            }
            Decision::Stay => continue,
        };

        let member = roster.member_mut(index);
        member.rank = next.label.clone();
        member.last_promotion = Some(date);
        member.supernumerary = supernumerary;
        moved += 1;

        if tracked.is_some_and(|id| member.is(id)) {
            events.push(Event::new(
                date,
                EventKind::Promoted {
                    rank: next.label.clone(),
                    supernumerary,
                },
            ));
        }
    }
    moved
}
