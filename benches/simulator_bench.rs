//! Cycle throughput on a synthetic full-strength roster.
//!
//! Run with: `cargo bench --bench simulator`

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use ranksim::engine::{run_cycle, simulate, Ceiling, Member, Roster, RuleSet, SimulationConfig};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

/// Every rank filled to its ceiling, with dates spread so each cycle has work to do.
fn full_roster(rules: &RuleSet) -> Roster {
    let mut members = Vec::new();
    let mut next_id = 1_u64;
    for rank in &rules.ranks {
        let seats = match rank.ceiling {
            Ceiling::Limited(limit) => limit as usize,
            Ceiling::Unbounded => 5,
        };
        for k in 0..seats {
            let k = k as i32;
            members.push(Member {
                registration: Some(next_id),
                rank: rank.label.clone(),
                seniority: Some((next_id as i64).into()),
                last_promotion: Some(d(2012 + k % 12, 6, 26)),
                admission: Some(d(1992 + k % 30, 2, 1)),
                birth: Some(d(1964 + k % 35, 3, 15)),
                supernumerary: false,
                extra: Vec::new(),
            });
            next_id += 1;
        }
    }
    Roster::new(members)
}

fn bench_simulator(c: &mut Criterion) {
    let rules = RuleSet::cbm();
    let roster = full_roster(&rules);

    let mut group = c.benchmark_group("simulator");
    group.sample_size(30);
    group.throughput(Throughput::Elements(roster.len() as u64));

    group.bench_function("single_cycle", |b| {
        b.iter_batched(
            || roster.clone(),
            |mut roster| {
                let mut events = Vec::new();
                black_box(run_cycle(&mut roster, &rules, d(2026, 6, 26), Some(1), &mut events))
            },
            BatchSize::LargeInput,
        )
    });

    let config = SimulationConfig {
        start: d(2026, 1, 1),
        target: d(2045, 12, 31),
        tracked: 1,
    };
    group.bench_function("twenty_years", |b| {
        b.iter_batched(
            || roster.clone(),
            |roster| black_box(simulate(roster, &rules, &config)),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_simulator);
criterion_main!(benches);
