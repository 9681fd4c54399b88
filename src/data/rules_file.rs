//! Rule tables from YAML or JSON files.
//!
//! A file either spells out the whole table or names a preset and overrides
//! the pieces that differ:
//!
//! ```yaml
//! preset: cbm
//! supernumerary_after_years: 5
//! retirement: { max_age: 65, max_service_years: 35 }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::engine::rules::{CycleDay, Rank, RetirementRules, RuleSet, RulesError, PRESET_NAMES};

#[derive(Debug, Error)]
pub enum RulesFileError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML rule file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON rule file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("rule file must define either 'preset' or 'ranks'")]
    NoRanks,
    #[error(transparent)]
    Rules(#[from] RulesError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesDocument {
    #[serde(default)]
    preset: Option<String>,
    #[serde(default)]
    ranks: Option<Vec<Rank>>,
    #[serde(default)]
    supernumerary_after_years: Option<u32>,
    #[serde(default)]
    retirement: Option<RetirementRules>,
    #[serde(default)]
    cycle_days: Option<Vec<CycleDay>>,
}

impl RulesDocument {
    fn into_rules(self) -> Result<RuleSet, RulesFileError> {
        let mut rules = match (self.preset, self.ranks) {
            (Some(name), ranks) => {
                let mut base = preset(&name)?;
                if let Some(ranks) = ranks {
                    base.ranks = ranks;
                }
                base
            }
            (None, Some(ranks)) => RuleSet::with_ranks(ranks),
            (None, None) => return Err(RulesFileError::NoRanks),
        };
        if let Some(years) = self.supernumerary_after_years {
            rules.supernumerary_after_years = years;
        }
        if let Some(retirement) = self.retirement {
            rules.retirement = retirement;
        }
        if let Some(days) = self.cycle_days {
            rules.cycle_days = days;
        }
        rules.validate()?;
        Ok(rules)
    }
}

/// Built-in table by name.
pub fn preset(name: &str) -> Result<RuleSet, RulesFileError> {
    RuleSet::preset(name).ok_or_else(|| RulesFileError::UnknownPreset(name.to_string()))
}

/// Load and validate a rule file. `.json` files parse as JSON, anything else as YAML.
pub fn load_rules_file(path: impl AsRef<Path>) -> Result<RuleSet, RulesFileError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| RulesFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        parse_rules_json(&raw)
    } else {
        parse_rules_yaml(&raw)
    }
}

pub fn parse_rules_yaml(raw: &str) -> Result<RuleSet, RulesFileError> {
    serde_yaml::from_str::<RulesDocument>(raw)?.into_rules()
}

pub fn parse_rules_json(raw: &str) -> Result<RuleSet, RulesFileError> {
    serde_json::from_str::<RulesDocument>(raw)?.into_rules()
}

pub fn rules_to_yaml(rules: &RuleSet) -> Result<String, RulesFileError> {
    Ok(serde_yaml::to_string(rules)?)
}

/// Comma-separated list of preset names for help text.
pub fn preset_list() -> String {
    PRESET_NAMES.join(", ")
}
