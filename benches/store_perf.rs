use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use stickyboard::model::{NewNote, NotePatch, Point};
use stickyboard::storage::NoteStore;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn seeded_store(rt: &Runtime, notes: usize) -> NoteStore {
    rt.block_on(async {
        let store = NoteStore::in_memory();
        store.open().await.expect("open");
        for index in 0..notes {
            store
                .create(NewNote::new("#fff740", format!("note {index}")))
                .await
                .expect("create");
        }
        store
    })
}

fn bench_create(c: &mut Criterion) {
    let rt = runtime();
    let store = seeded_store(&rt, 0);
    c.bench_function("create_note", |b| {
        b.iter(|| {
            rt.block_on(store.create(NewNote::new("#ff7eb9", "benchmark")))
                .expect("create")
        });
    });
}

fn bench_update(c: &mut Criterion) {
    let rt = runtime();
    let store = seeded_store(&rt, 100);
    let id = rt.block_on(store.read_all()).expect("read_all")[50].id;
    let mut step = 0.0;
    c.bench_function("update_position", |b| {
        b.iter(|| {
            step += 1.0;
            rt.block_on(store.update(id, NotePatch::position(Point::new(step, step))))
                .expect("update")
        });
    });
}

fn bench_read_all(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("read_all");
    for size in [10, 100, 1000] {
        let store = seeded_store(&rt, size);
        group.bench_function(format!("{size}_notes"), |b| {
            b.iter(|| black_box(rt.block_on(store.read_all()).expect("read_all")));
        });
    }
    group.finish();
}

fn bench_open(c: &mut Criterion) {
    let rt = runtime();
    c.bench_function("open_fresh_store", |b| {
        b.iter_batched(
            NoteStore::in_memory,
            |store| rt.block_on(store.open()).expect("open"),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_create, bench_update, bench_read_all, bench_open);
criterion_main!(benches);
