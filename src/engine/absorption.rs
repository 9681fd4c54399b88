//! Per-cycle conversion of supernumerary holders into freed regular seats.
//!
//! Runs once per cycle after all promotions, lowest rank first. Rank and
//! promotion date are left untouched; only the excess flag clears.

use chrono::NaiveDate;
use tracing::debug;

use crate::engine::events::{Event, EventKind};
use crate::engine::roster::Roster;
use crate::engine::rules::RuleSet;

/// Absorb supernumerary holders for `date`. Returns the number absorbed.
pub fn run_absorption(
    roster: &mut Roster,
    rules: &RuleSet,
    date: NaiveDate,
    tracked: Option<u64>,
    events: &mut Vec<Event>,
) -> usize {
    let mut absorbed = 0;
    for rank in &rules.ranks {
        let waiting = roster.holders_by_seniority(&rank.label, true);
        if waiting.is_empty() {
            continue;
        }
        let open = rank
            .ceiling
            .open_seats(roster.regular_count(&rank.label))
            .unwrap_or(waiting.len());
        if open == 0 {
            continue;
        }

        let mut taken = 0;
        for index in waiting.into_iter().take(open) {
            let member = roster.member_mut(index);
            member.supernumerary = false;
            taken += 1;
            if tracked.is_some_and(|id| member.is(id)) {
                events.push(Event::new(
                    date,
                    EventKind::Absorbed {
                        rank: rank.label.clone(),
                    },
                ));
            }
        }
        debug!(target: "ranksim::absorption", %date, rank = %rank.label, taken, "excess absorbed");
        absorbed += taken;
    }
    absorbed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::roster::Member;
    use crate::engine::rules::{Ceiling, Rank};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    fn member(id: u64, rank: &str, seniority: i64, supernumerary: bool) -> Member {
        Member {
            registration: Some(id),
            rank: rank.to_string(),
            seniority: Some(seniority.into()),
            last_promotion: Some(d(2020, 6, 26)),
            admission: None,
            birth: None,
            supernumerary,
            extra: Vec::new(),
        }
    }

    fn rules() -> RuleSet {
        RuleSet::with_ranks(vec![
            Rank::new("A", Ceiling::Limited(3), Some(2), true),
            Rank::new("B", Ceiling::Unbounded, None, false),
        ])
    }

    #[test]
    fn most_senior_excess_fills_open_seats_only() {
        let date = d(2026, 11, 29);
        let mut roster = Roster::new(vec![
            member(1, "A", 1, false),
            member(2, "A", 30, true),
            member(3, "A", 20, true),
            member(4, "A", 10, true),
        ]);
        let mut events = Vec::new();
        let absorbed = run_absorption(&mut roster, &rules(), date, Some(3), &mut events);

        assert_eq!(absorbed, 2);
        assert_eq!(roster.regular_count("A"), 3);
        assert!(roster.find_active(2).is_some_and(|m| m.supernumerary));
        assert!(roster.find_active(3).is_some_and(|m| !m.supernumerary));
        assert!(roster.find_active(4).is_some_and(|m| !m.supernumerary));
        assert_eq!(roster.find_active(3).and_then(|m| m.last_promotion), Some(d(2020, 6, 26)));
        assert_eq!(events, vec![Event::new(date, EventKind::Absorbed { rank: "A".into() })]);
    }

    #[test]
    fn second_pass_without_new_vacancies_changes_nothing() {
        let date = d(2026, 11, 29);
        let mut roster = Roster::new(vec![
            member(1, "A", 1, false),
            member(2, "A", 2, true),
            member(3, "A", 3, true),
            member(4, "A", 4, true),
            member(5, "A", 5, true),
        ]);
        run_absorption(&mut roster, &rules(), date, None, &mut Vec::new());
        let after_first = roster.clone();
        let again = run_absorption(&mut roster, &rules(), date, None, &mut Vec::new());
        assert_eq!(again, 0);
        assert_eq!(roster, after_first);
    }

    #[test]
    fn unbounded_rank_absorbs_everyone() {
        let mut roster = Roster::new(vec![member(1, "B", 2, true), member(2, "B", 1, true)]);
        let absorbed = run_absorption(&mut roster, &rules(), d(2026, 6, 26), None, &mut Vec::new());
        assert_eq!(absorbed, 2);
        assert_eq!(roster.supernumerary_count("B"), 0);
    }

    #[test]
    fn over_ceiling_regulars_leave_excess_waiting() {
        let mut roster = Roster::new(vec![
            member(1, "A", 1, false),
            member(2, "A", 2, false),
            member(3, "A", 3, false),
            member(4, "A", 4, false),
            member(5, "A", 5, true),
        ]);
        let absorbed = run_absorption(&mut roster, &rules(), d(2026, 6, 26), None, &mut Vec::new());
        assert_eq!(absorbed, 0);
        assert_eq!(roster.supernumerary_count("A"), 1);
    }
}
