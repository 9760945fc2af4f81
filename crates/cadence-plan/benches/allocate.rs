use cadence_core::model::{CapacityConfig, ProjectContext, TeamMember, WorkItem};
use cadence_plan::allocate;
use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const SIZES: [usize; 3] = [50, 200, 1000];

/// Deterministic backlog: every fifth item is an epic, the next three are
/// its stories, and every seventh item depends on an earlier one.
fn synthetic_backlog(size: usize, with_hierarchy: bool) -> Vec<WorkItem> {
    (0..size)
        .map(|i| {
            #[allow(clippy::cast_possible_truncation)]
            let score = |k: usize| ((i * k) % 5 + 1) as u8;
            let points = u32::try_from(i % 8 + 1).unwrap_or(1);
            let mut item = WorkItem::new(format!("w{i}"), format!("Work item {i}"), points)
                .with_scores(score(3), score(7), score(11), score(13));
            if with_hierarchy && i % 5 != 0 && i % 5 != 4 {
                item = item.with_parent(format!("w{}", i - i % 5));
            }
            if i % 7 == 0 && i > 0 {
                item = item.with_dependencies([format!("w{}", i / 2)]);
            }
            item
        })
        .collect()
}

fn team() -> Vec<TeamMember> {
    (0..6)
        .map(|i| TeamMember::new(format!("dev-{i}")).with_hours(40.0))
        .collect()
}

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");
    let team = team();
    let config = CapacityConfig::default();
    let context = ProjectContext::starting(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap_or_default());

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));

        let flat = synthetic_backlog(size, false);
        group.bench_with_input(BenchmarkId::new("simple", size), &flat, |b, items| {
            b.iter(|| black_box(allocate(items, &team, &config, &context)));
        });

        let nested = synthetic_backlog(size, true);
        group.bench_with_input(
            BenchmarkId::new("dependency_aware", size),
            &nested,
            |b, items| b.iter(|| black_box(allocate(items, &team, &config, &context))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_allocate);
criterion_main!(benches);
