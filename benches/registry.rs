use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use modelsrv::events::{DiscardSink, EventForwarder};
use modelsrv::{CircularQueue, ForwarderConfig, Model, ResourceId};

fn seeded_model(systems: usize) -> Model {
    let model = Model::new(Arc::new(DiscardSink::new()));
    for _ in 0..systems {
        let system = model.new_system(ResourceId::new());
        model.add_system(&system).unwrap();
    }
    model
}

fn bench_add_system(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/add_system");
    group.throughput(Throughput::Elements(1));
    group.bench_function("discard_sink", |b| {
        let model = seeded_model(1_000);
        b.iter_batched(
            || model.new_system(ResourceId::new()),
            |system| model.add_system(&system).unwrap(),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_list_snapshot(c: &mut Criterion) {
    let model = seeded_model(1_000);
    c.bench_function("registry/list_cached", |b| {
        b.iter(|| black_box(model.systems().len()));
    });
}

fn bench_lazy_resolution(c: &mut Criterion) {
    let model = seeded_model(0);
    let parent = model.new_context(ResourceId::new());
    model.add_context(&parent).unwrap();
    let child = model.new_context(ResourceId::new());
    child.set_parent_by_id(parent.id()).unwrap();

    c.bench_function("registry/resolve_cached_parent", |b| {
        b.iter(|| black_box(child.parent().unwrap()));
    });
}

fn bench_forwarding(c: &mut Criterion) {
    let mut group = c.benchmark_group("forwarding");
    group.throughput(Throughput::Elements(1));
    group.bench_function("update_to_queue", |b| {
        let forwarder = EventForwarder::shared(&ForwarderConfig {
            queue_capacity: 1 << 16,
        });
        let model = Model::new(forwarder.clone());
        let system = model.new_system(ResourceId::new());
        model.add_system(&system).unwrap();
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            system.set_description(n.to_string()).unwrap();
            // keep the queue from filling up
            let _ = forwarder.dequeue();
        });
    });
    group.finish();
}

fn bench_queue_cycle(c: &mut Criterion) {
    c.bench_function("queue/enqueue_dequeue", |b| {
        let mut q = CircularQueue::new(1024);
        b.iter(|| {
            q.enqueue(black_box(7u64)).unwrap();
            black_box(q.dequeue().unwrap())
        });
    });
}

criterion_group!(
    registry,
    bench_add_system,
    bench_list_snapshot,
    bench_lazy_resolution,
    bench_forwarding,
    bench_queue_cycle
);
criterion_main!(registry);
