use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use villa_split::allocation::{allocate, UnitUsage};
use villa_split::config::Config;
use villa_split::form::UnitInput;
use villa_split::session::SettlementSession;
use villa_split::storage::MemoryStore;

fn build_units(count: usize) -> Vec<UnitUsage> {
    (0..count)
        .map(|idx| UnitUsage {
            unit_id: format!("{}호", 101 + idx),
            // repeat every 7th usage so some tie groups form
            usage: 9_900.0 + ((idx * 37) % 7 + idx / 7) as f64,
            fixed_maintenance_fee: 5_000.0,
        })
        .collect()
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");
    for count in [2usize, 12, 120] {
        let units = build_units(count);
        let water = 10.0 * (497 * count) as f64;
        let electricity = 10.0 * (5 * count) as f64;
        group.bench_with_input(BenchmarkId::from_parameter(count), &units, |b, units| {
            b.iter(|| {
                let allocation =
                    allocate(black_box(units), black_box(water), black_box(electricity))
                        .expect("allocate");
                black_box(allocation);
            })
        });
    }
    group.finish();
}

fn bench_session_calculate(c: &mut Criterion) {
    let mut session = SettlementSession::open(Box::new(MemoryStore::new()), Config::default())
        .expect("open session");
    session.set_totals("40000", "20000", "5000");
    session
        .set_reading("301호", UnitInput::new("100", "50", "105", "55"))
        .expect("reading");
    session
        .set_reading("302호", UnitInput::new("200", "80", "215", "95"))
        .expect("reading");
    let at = NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .expect("timestamp");

    // history stays at capacity after the first ten iterations
    c.bench_function("session_calculate_with_history", |b| {
        b.iter(|| {
            let allocation = session.calculate(black_box(at)).expect("calculate");
            black_box(allocation.residual);
        })
    });
}

criterion_group!(benches, bench_allocate, bench_session_calculate);
criterion_main!(benches);
