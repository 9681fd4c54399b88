//! Rank hierarchy and the static rule tables the engines read.
//!
//! A [RuleSet] is immutable for the duration of a run. Presets mirror the two
//! published CBM tables; anything else is loaded through [crate::data::rules_file].

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default years-in-rank after which an excess-eligible rank promotes as supernumerary.
pub const DEFAULT_SUPERNUMERARY_AFTER_YEARS: u32 = 6;
pub const DEFAULT_MAX_AGE: u32 = 63;
pub const DEFAULT_MAX_SERVICE_YEARS: u32 = 35;

/// Maximum number of regular seats in a rank. Serialized as an integer, or `null` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum Ceiling {
    Limited(u32),
    Unbounded,
}

impl Ceiling {
    /// True when one more regular seat fits next to `occupied` regular holders.
    pub fn has_room(self, occupied: usize) -> bool {
        match self {
            Self::Limited(limit) => occupied < limit as usize,
            Self::Unbounded => true,
        }
    }

    /// Regular seats still open given `occupied` regular holders; `None` when unbounded.
    pub fn open_seats(self, occupied: usize) -> Option<usize> {
        match self {
            Self::Limited(limit) => Some((limit as usize).saturating_sub(occupied)),
            Self::Unbounded => None,
        }
    }
}

impl From<Option<u32>> for Ceiling {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Self::Unbounded, Self::Limited)
    }
}

impl From<Ceiling> for Option<u32> {
    fn from(value: Ceiling) -> Self {
        match value {
            Ceiling::Limited(limit) => Some(limit),
            Ceiling::Unbounded => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub label: String,
    pub ceiling: Ceiling,
    /// Minimum whole years in this rank before an ordinary promotion. `None` only on the top rank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_years: Option<u32>,
    /// Whether holders of this rank may be promoted as supernumerary.
    #[serde(default)]
    pub supernumerary: bool,
}

impl Rank {
    pub fn new(label: &str, ceiling: Ceiling, min_years: Option<u32>, supernumerary: bool) -> Self {
        Self {
            label: label.to_string(),
            ceiling,
            min_years,
            supernumerary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementRules {
    pub max_age: u32,
    pub max_service_years: u32,
}

impl Default for RetirementRules {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            max_service_years: DEFAULT_MAX_SERVICE_YEARS,
        }
    }
}

/// Calendar day (month, day) on which a decision cycle falls every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CycleDay {
    pub month: u32,
    pub day: u32,
}

impl CycleDay {
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    /// The date in `year`, or `None` when it does not exist (Feb 29 outside leap years).
    pub fn in_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

pub fn default_cycle_days() -> Vec<CycleDay> {
    vec![CycleDay::new(6, 26), CycleDay::new(11, 29)]
}

fn default_supernumerary_after_years() -> u32 {
    DEFAULT_SUPERNUMERARY_AFTER_YEARS
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("rank hierarchy is empty")]
    Empty,
    #[error("rank '{0}' appears more than once")]
    DuplicateRank(String),
    #[error("rank '{0}' has no minimum time in rank")]
    MissingMinYears(String),
    #[error("rank '{0}' has a vacancy ceiling of zero")]
    ZeroCeiling(String),
    #[error("top rank '{0}' cannot promote as supernumerary")]
    SupernumeraryAtTop(String),
    #[error("no cycle days configured")]
    NoCycleDays,
    #[error("invalid cycle day {month:02}/{day:02}")]
    InvalidCycleDay { month: u32, day: u32 },
}

/// Ordered hierarchy (lowest first) plus the thresholds every engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub ranks: Vec<Rank>,
    #[serde(default = "default_supernumerary_after_years")]
    pub supernumerary_after_years: u32,
    #[serde(default)]
    pub retirement: RetirementRules,
    #[serde(default = "default_cycle_days")]
    pub cycle_days: Vec<CycleDay>,
}

pub const PRESET_NAMES: &[&str] = &["cbm", "cbm-revised"];

impl RuleSet {
    /// Hierarchy with default thresholds and cycle days.
    pub fn with_ranks(ranks: Vec<Rank>) -> Self {
        Self {
            ranks,
            supernumerary_after_years: DEFAULT_SUPERNUMERARY_AFTER_YEARS,
            retirement: RetirementRules::default(),
            cycle_days: default_cycle_days(),
        }
    }

    /// CBM table with an unbounded top rank.
    pub fn cbm() -> Self {
        use Ceiling::{Limited, Unbounded};
        Self::with_ranks(vec![
            Rank::new("SD 1", Limited(600), Some(5), false),
            Rank::new("CB", Limited(600), Some(3), true),
            Rank::new("3º SGT", Limited(573), Some(3), true),
            Rank::new("2º SGT", Limited(409), Some(3), true),
            Rank::new("1º SGT", Limited(245), Some(2), false),
            Rank::new("SUB TEN", Limited(96), Some(2), false),
            Rank::new("2º TEN", Limited(34), Some(3), true),
            Rank::new("1º TEN", Limited(29), Some(3), true),
            Rank::new("CAP", Limited(24), Some(3), true),
            Rank::new("MAJ", Limited(10), Some(3), false),
            Rank::new("TEN CEL", Limited(1), Some(30), false),
            Rank::new("CEL", Unbounded, None, false),
        ])
    }

    /// Revised CBM table: three TEN CEL seats and a single CEL seat.
    pub fn cbm_revised() -> Self {
        let mut rules = Self::cbm();
        for rank in &mut rules.ranks {
            match rank.label.as_str() {
                "TEN CEL" => rank.ceiling = Ceiling::Limited(3),
                "CEL" => rank.ceiling = Ceiling::Limited(1),
                _ => {}
            }
        }
        rules
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cbm" => Some(Self::cbm()),
            "cbm-revised" | "cbm_revised" => Some(Self::cbm_revised()),
            _ => None,
        }
    }

    /// Ordinal of `label` in the hierarchy.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.ranks.iter().position(|rank| rank.label == label)
    }

    pub fn rank(&self, label: &str) -> Option<&Rank> {
        self.ranks.iter().find(|rank| rank.label == label)
    }

    pub fn top(&self) -> Option<&Rank> {
        self.ranks.last()
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        let Some(top) = self.ranks.last() else {
            return Err(RulesError::Empty);
        };

        let mut seen = HashSet::new();
        for (index, rank) in self.ranks.iter().enumerate() {
            if !seen.insert(rank.label.as_str()) {
                return Err(RulesError::DuplicateRank(rank.label.clone()));
            }
            if rank.ceiling == Ceiling::Limited(0) {
                return Err(RulesError::ZeroCeiling(rank.label.clone()));
            }
            if index + 1 < self.ranks.len() && rank.min_years.is_none() {
                return Err(RulesError::MissingMinYears(rank.label.clone()));
            }
        }
        if top.supernumerary {
            return Err(RulesError::SupernumeraryAtTop(top.label.clone()));
        }

        if self.cycle_days.is_empty() {
            return Err(RulesError::NoCycleDays);
        }
        for day in &self.cycle_days {
            // 2000 is a leap year, so Feb 29 passes here and is skipped per year later.
            if day.in_year(2000).is_none() {
                return Err(RulesError::InvalidCycleDay {
                    month: day.month,
                    day: day.day,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for name in PRESET_NAMES {
            let rules = RuleSet::preset(name).expect("preset should exist");
            assert_eq!(rules.validate(), Ok(()), "preset {name}");
            assert_eq!(rules.ranks.len(), 12);
        }
    }

    #[test]
    fn cbm_revised_bounds_the_top_rank() {
        let rules = RuleSet::cbm_revised();
        assert_eq!(rules.rank("CEL").map(|r| r.ceiling), Some(Ceiling::Limited(1)));
        assert_eq!(rules.rank("TEN CEL").map(|r| r.ceiling), Some(Ceiling::Limited(3)));
        assert_eq!(RuleSet::cbm().top().map(|r| r.ceiling), Some(Ceiling::Unbounded));
    }

    #[test]
    fn excess_eligible_ranks_match_table() {
        let rules = RuleSet::cbm();
        let eligible: Vec<&str> = rules
            .ranks
            .iter()
            .filter(|r| r.supernumerary)
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(eligible, vec!["CB", "3º SGT", "2º SGT", "2º TEN", "1º TEN", "CAP"]);
    }

    #[test]
    fn ceiling_room_and_open_seats() {
        assert!(Ceiling::Limited(2).has_room(1));
        assert!(!Ceiling::Limited(2).has_room(2));
        assert!(Ceiling::Unbounded.has_room(usize::MAX));
        assert_eq!(Ceiling::Limited(2).open_seats(3), Some(0));
        assert_eq!(Ceiling::Unbounded.open_seats(3), None);
    }

    #[test]
    fn validate_rejects_broken_tables() {
        assert_eq!(RuleSet::with_ranks(Vec::new()).validate(), Err(RulesError::Empty));

        let dup = RuleSet::with_ranks(vec![
            Rank::new("A", Ceiling::Limited(1), Some(1), false),
            Rank::new("A", Ceiling::Unbounded, None, false),
        ]);
        assert_eq!(dup.validate(), Err(RulesError::DuplicateRank("A".into())));

        let no_min = RuleSet::with_ranks(vec![
            Rank::new("A", Ceiling::Limited(1), None, false),
            Rank::new("B", Ceiling::Unbounded, None, false),
        ]);
        assert_eq!(no_min.validate(), Err(RulesError::MissingMinYears("A".into())));

        let mut bad_day = RuleSet::cbm();
        bad_day.cycle_days = vec![CycleDay::new(2, 30)];
        assert_eq!(
            bad_day.validate(),
            Err(RulesError::InvalidCycleDay { month: 2, day: 30 })
        );
    }

    #[test]
    fn ceiling_serializes_unbounded_as_null() {
        let json = serde_json::to_string(&Rank::new("CEL", Ceiling::Unbounded, None, false))
            .expect("serialize");
        assert!(json.contains("\"ceiling\":null"), "{json}");
        let back: Rank = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.ceiling, Ceiling::Unbounded);
    }
}
