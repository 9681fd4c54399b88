pub mod export;
pub mod loader;
pub mod rules_file;
pub mod validate;

pub use export::{export_result, render_report, write_history_json, write_roster_csv, ExportError};
pub use loader::{load_roster, parse_csv_str, LoadError, DEFAULT_ROSTER_PATH};
pub use rules_file::{load_rules_file, preset, rules_to_yaml, RulesFileError};
pub use validate::{validate_roster, ValidationReport, ValidationSeverity};
