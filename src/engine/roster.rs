//! Personnel records and the active/retired working set a run mutates.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::engine::calendar::whole_years_between;
use crate::engine::rules::RuleSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Registration number. Missing when the source cell did not parse.
    pub registration: Option<u64>,
    pub rank: String,
    /// Lower is more senior. Missing keys sort after every present key.
    pub seniority: Option<Seniority>,
    pub last_promotion: Option<NaiveDate>,
    pub admission: Option<NaiveDate>,
    pub birth: Option<NaiveDate>,
    /// Holds the rank as an excess seat rather than a regular one.
    #[serde(default)]
    pub supernumerary: bool,
    /// Pass-through cells, aligned with [Roster::extra_columns].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl Member {
    pub fn is(&self, registration: u64) -> bool {
        self.registration == Some(registration)
    }

    /// Whole years since the last promotion; `None` without a promotion date.
    pub fn years_in_rank(&self, on: NaiveDate) -> Option<i32> {
        self.last_promotion.map(|date| whole_years_between(date, on))
    }

    pub fn age(&self, on: NaiveDate) -> Option<i32> {
        self.birth.map(|date| whole_years_between(date, on))
    }

    pub fn service_years(&self, on: NaiveDate) -> Option<i32> {
        self.admission.map(|date| whole_years_between(date, on))
    }

    fn seniority_order(&self) -> (bool, Option<Seniority>) {
        (self.seniority.is_none(), self.seniority)
    }
}

/// Hierarchical position within a rank. Fractional keys are kept and ordered
/// with `total_cmp`; whole keys print without a decimal part.
#[derive(Debug, Clone, Copy)]
pub struct Seniority(f64);

impl Seniority {
    /// `None` for NaN or infinite values.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    fn whole(self) -> Option<i64> {
        (self.0.fract() == 0.0 && self.0.abs() < 9.0e15).then_some(self.0 as i64)
    }
}

impl From<i64> for Seniority {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl PartialEq for Seniority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Seniority {}

impl PartialOrd for Seniority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Seniority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.whole() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Seniority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.whole() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Seniority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| serde::de::Error::custom("seniority must be a finite number"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("member {} holds rank '{rank}' which is not in the hierarchy", display_registration(.registration))]
pub struct UnknownRank {
    pub registration: Option<u64>,
    pub rank: String,
}

pub(crate) fn display_registration(registration: &Option<u64>) -> String {
    registration.map_or_else(|| "<unregistered>".to_string(), |id| id.to_string())
}

/// Live collection of members split into active and retired.
///
/// Members only ever move from active to retired. Indices into
/// [Roster::active] stay valid until the next retirement batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    active: Vec<Member>,
    #[serde(default)]
    retired: Vec<Member>,
    #[serde(default)]
    extra_columns: Vec<String>,
}

impl Roster {
    pub fn new(members: Vec<Member>) -> Self {
        Self {
            active: members,
            retired: Vec::new(),
            extra_columns: Vec::new(),
        }
    }

    pub fn with_extra_columns(members: Vec<Member>, extra_columns: Vec<String>) -> Self {
        Self {
            extra_columns,
            ..Self::new(members)
        }
    }

    pub fn active(&self) -> &[Member] {
        &self.active
    }

    pub fn retired(&self) -> &[Member] {
        &self.retired
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.retired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.retired.is_empty()
    }

    pub(crate) fn member_mut(&mut self, index: usize) -> &mut Member {
        &mut self.active[index]
    }

    /// Active members holding `rank` in a regular seat.
    pub fn regular_count(&self, rank: &str) -> usize {
        self.active
            .iter()
            .filter(|m| m.rank == rank && !m.supernumerary)
            .count()
    }

    pub fn supernumerary_count(&self, rank: &str) -> usize {
        self.active
            .iter()
            .filter(|m| m.rank == rank && m.supernumerary)
            .count()
    }

    /// Indices of active holders of `rank`, most senior first. `only_supernumerary`
    /// restricts to excess seats. Ties keep input order.
    pub fn holders_by_seniority(&self, rank: &str, only_supernumerary: bool) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .active
            .iter()
            .enumerate()
            .filter(|(_, m)| m.rank == rank && (!only_supernumerary || m.supernumerary))
            .map(|(index, _)| index)
            .collect();
        indices.sort_by_key(|&index| self.active[index].seniority_order());
        indices
    }

    /// Move every active member matching `should_retire` to the retired list in one batch,
    /// keeping relative order. Returns the batch's range within [Roster::retired].
    pub(crate) fn retire_where(&mut self, mut should_retire: impl FnMut(&Member) -> bool) -> Range<usize> {
        let start = self.retired.len();
        let (leaving, staying): (Vec<Member>, Vec<Member>) =
            std::mem::take(&mut self.active).into_iter().partition(|m| should_retire(m));
        self.active = staying;
        self.retired.extend(leaving);
        start..self.retired.len()
    }

    pub fn find_active(&self, registration: u64) -> Option<&Member> {
        self.active.iter().find(|m| m.is(registration))
    }

    pub fn find_retired(&self, registration: u64) -> Option<&Member> {
        self.retired.iter().find(|m| m.is(registration))
    }

    /// Fails on the first member whose rank is not in `rules`.
    pub fn ensure_ranks_known(&self, rules: &RuleSet) -> Result<(), UnknownRank> {
        match self
            .active
            .iter()
            .chain(&self.retired)
            .find(|m| rules.position(&m.rank).is_none())
        {
            Some(member) => Err(UnknownRank {
                registration: member.registration,
                rank: member.rank.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn into_parts(self) -> (Vec<Member>, Vec<Member>, Vec<String>) {
        (self.active, self.retired, self.extra_columns)
    }
}
