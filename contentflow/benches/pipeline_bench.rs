//! Benchmarks for the task registry and pipeline runs.

use std::time::Duration;

use contentflow::core::OrchestrationResult;
use contentflow::tasks::TaskRegistry;
use contentflow::testing::{fixed_orchestrator, sample_request};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn registry_benchmark(c: &mut Criterion) {
    c.bench_function("registry_lifecycle", |b| {
        let registry = TaskRegistry::new();
        b.iter(|| {
            let task_id = registry.create(sample_request());
            registry.transition_to_in_progress(&task_id);
            registry.complete_with_result(&task_id, OrchestrationResult::empty("AI"));
            black_box(registry.get(&task_id))
        });
    });

    c.bench_function("registry_evict_10k", |b| {
        b.iter_batched(
            || {
                let registry = TaskRegistry::new();
                for _ in 0..10_000 {
                    registry.create(sample_request());
                }
                registry
            },
            |registry| black_box(registry.evict_older_than(Duration::ZERO)),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let orchestrator = fixed_orchestrator();
    let request = sample_request();

    c.bench_function("fixed_pipeline_run", |b| {
        b.iter(|| black_box(runtime.block_on(orchestrator.run(&request))));
    });
}

criterion_group!(benches, registry_benchmark, pipeline_benchmark);
criterion_main!(benches);
