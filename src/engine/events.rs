use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::engine::calendar::format_day_first;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Promoted { rank: String, supernumerary: bool },
    /// Supernumerary holder took a freed regular seat.
    Absorbed { rank: String },
    Retired { rank: String },
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Promoted {
                rank,
                supernumerary: true,
            } => write!(f, "Promoted to {rank} (supernumerary)"),
            Self::Promoted { rank, .. } => write!(f, "Promoted to {rank}"),
            Self::Absorbed { rank } => write!(f, "Took a regular seat in {rank}"),
            Self::Retired { rank } => write!(f, "Retired as {rank}"),
        }
    }
}

/// State change touching the tracked member. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub date: NaiveDate,
    pub kind: EventKind,
}

impl Event {
    pub fn new(date: NaiveDate, kind: EventKind) -> Self {
        Self { date, kind }
    }

    pub fn description(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", format_day_first(self.date), self.kind)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct EventPayload<'a> {
            date: NaiveDate,
            description: String,
            kind: &'a EventKind,
        }
        EventPayload {
            date: self.date,
            description: self.description(),
            kind: &self.kind,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_read_naturally() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 26).expect("valid date");
        let promoted = Event::new(
            date,
            EventKind::Promoted {
                rank: "CB".into(),
                supernumerary: true,
            },
        );
        assert_eq!(promoted.to_string(), "26/06/2026: Promoted to CB (supernumerary)");
        assert_eq!(
            Event::new(date, EventKind::Absorbed { rank: "CB".into() }).description(),
            "Took a regular seat in CB"
        );
        assert_eq!(
            Event::new(date, EventKind::Retired { rank: "MAJ".into() }).description(),
            "Retired as MAJ"
        );
    }

    #[test]
    fn serializes_with_description() {
        let date = NaiveDate::from_ymd_opt(2026, 11, 29).expect("valid date");
        let event = Event::new(date, EventKind::Retired { rank: "CAP".into() });
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["date"], "2026-11-29");
        assert_eq!(json["description"], "Retired as CAP");
        assert_eq!(json["kind"]["type"], "retired");
    }
}
