use std::io::Write as _;

use chrono::{Local, NaiveDate};

use crate::data::export::{export_result, history_json, render_report};
use crate::data::loader::load_roster;
use crate::data::rules_file::{self, load_rules_file, rules_to_yaml, RulesFileError};
use crate::data::validate::validate_roster;
use crate::engine::calendar::{format_day_first, parse_day_first};
use crate::engine::driver::{simulate_with_observer, SimulationConfig};
use crate::engine::roster::Roster;
use crate::engine::rules::RuleSet;
use crate::engine::schedule::cycle_dates;
use crate::parallel::{run_scenarios, Scenario, WorkerPool};
use crate::server;

const USAGE: &str = "usage: ranksim <simulate|schedule|rules|validate|compare|serve>";

/// Flags that consume the following argument as their value.
const VALUE_FLAGS: &[&str] = &["--rules", "--preset", "--today", "--sheet", "--out", "--workers"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Schedule,
    Rules,
    Validate,
    Compare,
    Serve,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("schedule") => Some(Command::Schedule),
        Some("rules") => Some(Command::Rules),
        Some("validate") => Some(Command::Validate),
        Some("compare") => Some(Command::Compare),
        Some("serve") => Some(Command::Serve),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Schedule) => handle_schedule(args),
        Some(Command::Rules) => handle_rules(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Compare) => handle_compare(args),
        Some(Command::Serve) => handle_serve(),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

/// Value following `name`, e.g. `--today 01/02/2026`.
fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == name)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

/// Arguments after the subcommand that are neither flags nor flag values.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args.iter().skip(2) {
        if skip_next {
            skip_next = false;
        } else if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_date_arg(raw: &str, name: &str) -> Option<NaiveDate> {
    let parsed = parse_day_first(raw);
    if parsed.is_none() {
        eprintln!("invalid {name} '{raw}': expected dd/mm/yyyy or yyyy-mm-dd");
    }
    parsed
}

/// `--today` if given, otherwise the local calendar date.
fn start_date(args: &[String]) -> Option<NaiveDate> {
    match flag_value(args, "--today") {
        Some(raw) => parse_date_arg(raw, "--today"),
        None => Some(Local::now().date_naive()),
    }
}

fn resolve_rules(args: &[String]) -> Result<RuleSet, RulesFileError> {
    match flag_value(args, "--rules") {
        Some(path) => load_rules_file(path),
        None => rules_file::preset(flag_value(args, "--preset").unwrap_or("cbm")),
    }
}

fn rules_or_report(args: &[String]) -> Result<RuleSet, i32> {
    resolve_rules(args).map_err(|err| {
        eprintln!("rules error: {err}");
        1
    })
}

fn roster_or_report(path: &str, args: &[String]) -> Result<Roster, i32> {
    load_roster(path, flag_value(args, "--sheet")).map_err(|err| {
        eprintln!("failed to load roster '{path}': {err}");
        1
    })
}

fn handle_serve() -> i32 {
    let bind_addr = server::bind_addr_from_env();
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_simulate(args: &[String]) -> i32 {
    let [roster_path, tracked, target] = positionals(args)[..] else {
        eprintln!("usage: ranksim simulate <roster> <registration> <target-date> [--rules file|--preset name] [--today date] [--sheet name] [--out dir] [--json]");
        return 2;
    };
    let Ok(tracked) = tracked.parse::<u64>() else {
        eprintln!("invalid registration '{tracked}'");
        return 2;
    };
    let (Some(target), Some(start)) = (parse_date_arg(target, "target date"), start_date(args)) else {
        return 2;
    };
    let rules = match rules_or_report(args) {
        Ok(rules) => rules,
        Err(code) => return code,
    };
    let roster = match roster_or_report(roster_path, args) {
        Ok(roster) => roster,
        Err(code) => return code,
    };

    let config = SimulationConfig { start, target, tracked };
    let result = simulate_with_observer(roster, &rules, &config, |report| {
        eprint!(
            "\rcycle {}/{} ({})",
            report.index + 1,
            report.total,
            format_day_first(report.date)
        );
        let _ = std::io::stderr().flush();
    });
    let result = match result {
        Ok(result) => {
            if !result.cycles.is_empty() {
                eprintln!();
            }
            result
        }
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };

    if has_flag(args, "--json") {
        match history_json(&result) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize simulation result: {err}");
                return 1;
            }
        }
    } else {
        print!("{}", render_report(&result));
    }

    if let Some(dir) = flag_value(args, "--out") {
        match export_result(dir, &result) {
            Ok(paths) => {
                for path in paths {
                    eprintln!("wrote {}", path.display());
                }
            }
            Err(err) => {
                eprintln!("export failed: {err}");
                return 1;
            }
        }
    }
    0
}

fn handle_schedule(args: &[String]) -> i32 {
    let [target] = positionals(args)[..] else {
        eprintln!("usage: ranksim schedule <target-date> [--today date] [--rules file|--preset name]");
        return 2;
    };
    let (Some(target), Some(start)) = (parse_date_arg(target, "target date"), start_date(args)) else {
        return 2;
    };
    let rules = match rules_or_report(args) {
        Ok(rules) => rules,
        Err(code) => return code,
    };

    let dates = cycle_dates(start, target, &rules.cycle_days);
    for date in &dates {
        println!("{}", format_day_first(*date));
    }
    eprintln!("{} cycle(s) between {} and {}", dates.len(), format_day_first(start), format_day_first(target));
    0
}

fn handle_rules(args: &[String]) -> i32 {
    let rules = match rules_or_report(args) {
        Ok(rules) => rules,
        Err(code) => return code,
    };
    match rules_to_yaml(&rules) {
        Ok(yaml) => {
            print!("{yaml}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize rules: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let [roster_path] = positionals(args)[..] else {
        eprintln!("usage: ranksim validate <roster> [--rules file|--preset name] [--sheet name]");
        return 2;
    };
    let rules = match rules_or_report(args) {
        Ok(rules) => rules,
        Err(code) => return code,
    };
    let roster = match roster_or_report(roster_path, args) {
        Ok(roster) => roster,
        Err(code) => return code,
    };

    let report = validate_roster(&roster, &rules);
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    if report.has_errors() {
        eprintln!("validation failed: {} diagnostic(s)", report.diagnostics.len());
        1
    } else {
        println!("validation passed: {roster_path} ({} members)", roster.len());
        0
    }
}

fn handle_compare(args: &[String]) -> i32 {
    let [roster_path, tracked, target, presets] = positionals(args)[..] else {
        eprintln!("usage: ranksim compare <roster> <registration> <target-date> <preset,preset,...> [--today date] [--workers n]");
        return 2;
    };
    let Ok(tracked) = tracked.parse::<u64>() else {
        eprintln!("invalid registration '{tracked}'");
        return 2;
    };
    let (Some(target), Some(start)) = (parse_date_arg(target, "target date"), start_date(args)) else {
        return 2;
    };
    let workers = match flag_value(args, "--workers").map(str::parse::<usize>) {
        None => 0,
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            eprintln!("invalid --workers value");
            return 2;
        }
    };

    let mut scenarios = Vec::new();
    for name in presets.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match rules_file::preset(name) {
            Ok(rules) => scenarios.push(Scenario::new(name, rules, target)),
            Err(err) => {
                eprintln!("{err} (available: {})", rules_file::preset_list());
                return 2;
            }
        }
    }
    let roster = match roster_or_report(roster_path, args) {
        Ok(roster) => roster,
        Err(code) => return code,
    };

    let outcomes = match run_scenarios(&roster, start, tracked, &scenarios, &WorkerPool::with_workers(workers)) {
        Ok(outcomes) => outcomes,
        Err(err) => {
            eprintln!("failed to start worker pool: {err}");
            return 1;
        }
    };

    let mut failed = false;
    println!("scenario\tstatus\tevents\tactive\tretired");
    for outcome in outcomes {
        match outcome.result {
            Ok(result) => println!(
                "{}\t{}\t{}\t{}\t{}",
                outcome.label,
                result.status,
                result.events.len(),
                result.active.len(),
                result.retired.len()
            ),
            Err(err) => {
                failed = true;
                eprintln!("{}: {err}", outcome.label);
            }
        }
    }
    i32::from(failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn positionals_skip_flag_values() {
        let a = args(&["ranksim", "simulate", "r.csv", "--today", "01/01/2026", "7", "--json", "31/12/2027"]);
        assert_eq!(positionals(&a), vec!["r.csv", "7", "31/12/2027"]);
        assert_eq!(flag_value(&a, "--today"), Some("01/01/2026"));
        assert!(has_flag(&a, "--json"));
        assert_eq!(flag_value(&a, "--out"), None);
    }

    #[test]
    fn resolves_preset_and_rejects_unknown() {
        let revised = resolve_rules(&args(&["ranksim", "rules", "--preset", "cbm-revised"])).expect("preset");
        assert_eq!(revised, RuleSet::cbm_revised());
        assert!(resolve_rules(&args(&["ranksim", "rules", "--preset", "nope"])).is_err());
    }

    #[test]
    fn unknown_command_is_usage_error() {
        assert_eq!(parse_command(&args(&["ranksim", "launch"])), None);
        assert_eq!(run_with_args(&args(&["ranksim"])), 2);
        assert_eq!(run_with_args(&args(&["ranksim", "schedule"])), 2);
    }
}
