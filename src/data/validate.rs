use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::engine::roster::{display_registration, Member, Roster};
use crate::engine::rules::{Ceiling, RuleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

fn row_context(index: usize, member: &Member) -> String {
    format!("row[{index}] ({})", display_registration(&member.registration))
}

/// Check a loaded roster against a rule table before running it.
///
/// Only unknown ranks are errors; a run would abort on them. Everything else
/// is reported so the operator knows which records will be treated as missing.
pub fn validate_roster(roster: &Roster, rules: &RuleSet) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen: HashMap<u64, usize> = HashMap::new();

    for (index, member) in roster.active().iter().enumerate() {
        let context = row_context(index, member);

        let rank = rules.rank(&member.rank);
        if rank.is_none() {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                format!("rank '{}' is not in the hierarchy", member.rank),
            );
        }

        match member.registration {
            Some(id) => {
                if let Some(first) = seen.insert(id, index) {
                    report.push(
                        ValidationSeverity::Warning,
                        context.clone(),
                        format!("registration {id} already used by row[{first}]; status reports the first"),
                    );
                }
            }
            None => report.push(
                ValidationSeverity::Warning,
                context.clone(),
                "missing registration; member cannot be tracked",
            ),
        }

        if member.seniority.is_none() {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                "missing seniority; sorts after everyone in rank",
            );
        }
        if member.last_promotion.is_none() {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                "missing last promotion date; never eligible for promotion",
            );
        }
        if member.admission.is_none() {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                "missing admission date; service limit never applies",
            );
        }
        if member.birth.is_none() {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                "missing birth date; age limit never applies",
            );
        }

        if member.supernumerary && rank.is_some_and(|r| !r.supernumerary) {
            report.push(
                ValidationSeverity::Info,
                context,
                format!("marked supernumerary at '{}', which has no excess seats", member.rank),
            );
        }
    }

    for rank in &rules.ranks {
        if let Ceiling::Limited(limit) = rank.ceiling {
            let regular = roster.regular_count(&rank.label);
            if regular > limit as usize {
                report.push(
                    ValidationSeverity::Info,
                    format!("rank '{}'", rank.label),
                    format!("{regular} regular holders exceed the ceiling of {limit}; no promotions into it until it drains"),
                );
            }
        }
    }

    report
}
