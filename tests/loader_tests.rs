use std::fs;

use chrono::NaiveDate;
use ranksim::data::{export_result, load_roster, LoadError};
use ranksim::engine::{simulate, RuleSet, SimulationConfig};

fn sample_roster() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample_roster.csv")
}

#[test]
fn sample_roster_loads_with_names_passed_through() {
    let roster = load_roster(sample_roster(), None).expect("sample should load");
    assert_eq!(roster.active().len(), 14);
    assert_eq!(roster.extra_columns(), ["Nome".to_string()]);

    let ana = roster.find_active(1001).expect("1001 present");
    assert_eq!(ana.rank, "CB");
    assert_eq!(ana.extra, vec!["Ana Souza".to_string()]);
    assert_eq!(ana.last_promotion, NaiveDate::from_ymd_opt(2019, 6, 26));
    assert!(roster.ensure_ranks_known(&RuleSet::cbm()).is_ok());
}

#[test]
fn exported_active_table_loads_back() {
    let roster = load_roster(sample_roster(), None).expect("sample should load");
    let config = SimulationConfig {
        start: NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"),
        target: NaiveDate::from_ymd_opt(2028, 12, 31).expect("date"),
        tracked: 1001,
    };
    let result = simulate(roster, &RuleSet::cbm(), &config).expect("run should succeed");

    let dir = tempfile::tempdir().expect("tempdir");
    export_result(dir.path(), &result).expect("export");

    let active = load_roster(dir.path().join("active.csv"), None).expect("active.csv reloads");
    assert_eq!(active.active(), result.active.as_slice());
    assert_eq!(active.extra_columns(), result.extra_columns.as_slice());

    let retired = load_roster(dir.path().join("retired.csv"), None).expect("retired.csv reloads");
    assert_eq!(retired.active(), result.retired.as_slice());
}

#[test]
fn semicolon_file_with_bom_and_blank_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("roster.csv");
    fs::write(
        &path,
        "\u{feff}Matricula;Posto_Graduacao;Pos_Hierarquica;Ultima_promocao;Data_Admissao;Data_Nascimento;Excedente\n\
         1;CB;2;26/06/2020;01.02.2005;1985-04-03;sim\n\
         ;;;;;;\n\
         2;SD 1;;;;;\n",
    )
    .expect("fixture should be written");

    let roster = load_roster(&path, None).expect("should load");
    assert_eq!(roster.active().len(), 2);
    let first = &roster.active()[0];
    assert!(first.supernumerary);
    assert_eq!(first.admission, NaiveDate::from_ymd_opt(2005, 2, 1));
    assert_eq!(first.birth, NaiveDate::from_ymd_opt(1985, 4, 3));
    let second = &roster.active()[1];
    assert_eq!(second.seniority, None);
    assert_eq!(second.last_promotion, None);
}

#[test]
fn load_errors_are_typed() {
    let dir = tempfile::tempdir().expect("tempdir");

    let missing = dir.path().join("absent.csv");
    assert!(matches!(load_roster(&missing, None), Err(LoadError::Io { .. })));

    let unsupported = dir.path().join("roster.json");
    fs::write(&unsupported, "[]").expect("fixture should be written");
    assert!(matches!(
        load_roster(&unsupported, None),
        Err(LoadError::UnsupportedFormat(_))
    ));

    let two_digit_year = dir.path().join("short.csv");
    fs::write(
        &two_digit_year,
        "Matricula,Posto_Graduacao,Pos_Hierarquica,Ultima_promocao,Data_Admissao,Data_Nascimento\n\
         1,CB,1,26/06/20,01/02/2005,03/04/1985\n",
    )
    .expect("fixture should be written");
    let err = load_roster(&two_digit_year, None).expect_err("two-digit years are rejected");
    assert!(err.to_string().contains("row 2"), "{err}");
}
