//! Scenario batches: sequential pool vs all cores.
//!
//! Run with: `cargo bench --bench scenarios_parallel`

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ranksim::engine::{Member, Roster, RuleSet};
use ranksim::parallel::{run_scenarios, Scenario, WorkerPool};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

fn roster(rules: &RuleSet) -> Roster {
    let members = rules
        .ranks
        .iter()
        .enumerate()
        .flat_map(|(r, rank)| {
            (0..40).map(move |k| Member {
                registration: Some((r * 1000 + k) as u64),
                rank: rank.label.clone(),
                seniority: Some((k as i64).into()),
                last_promotion: Some(d(2010 + (k % 15) as i32, 11, 29)),
                admission: Some(d(1995 + (k % 25) as i32, 1, 10)),
                birth: Some(d(1970 + (k % 30) as i32, 7, 1)),
                supernumerary: false,
                extra: Vec::new(),
            })
        })
        .collect();
    Roster::new(members)
}

fn bench_scenarios(c: &mut Criterion) {
    let roster = roster(&RuleSet::cbm());
    let scenarios: Vec<Scenario> = (0..8)
        .map(|i| {
            let rules = if i % 2 == 0 { RuleSet::cbm() } else { RuleSet::cbm_revised() };
            Scenario::new(format!("s{i}"), rules, d(2030 + i, 12, 31))
        })
        .collect();

    let mut group = c.benchmark_group("scenarios");
    group.sample_size(20);
    for (name, pool) in [("one_worker", WorkerPool::with_workers(1)), ("all_cores", WorkerPool::default())] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(run_scenarios(&roster, d(2026, 1, 1), 1, &scenarios, &pool)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scenarios);
criterion_main!(benches);
