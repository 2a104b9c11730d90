//! Performance benchmarks for queueing, game formation and status reads

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pug_room::game::JoinOrderPartitioner;
use pug_room::metrics::MetricsCollector;
use pug_room::store::InMemoryMatchmakingStore;
use pug_room::types::Outcome;
use pug_room::{MatchmakingManager, NoopEventPublisher};
use std::sync::Arc;

fn create_bench_system() -> MatchmakingManager {
    MatchmakingManager::with_components(
        Arc::new(InMemoryMatchmakingStore::new()),
        Arc::new(JoinOrderPartitioner),
        Arc::new(NoopEventPublisher),
        Arc::new(MetricsCollector::new().unwrap()),
    )
}

fn bench_single_add(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("single_add", |b| {
        b.iter(|| {
            rt.block_on(async {
                let manager = create_bench_system();
                manager.create_queue("LTpug", 10).await.unwrap();

                black_box(manager.add_player("bench_player", None).await)
            })
        })
    });
}

fn bench_queue_pop(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("queue_of_ten_pops", |b| {
        b.iter(|| {
            rt.block_on(async {
                let manager = create_bench_system();
                manager.create_queue("LTunrated", 10).await.unwrap();

                for i in 0..10 {
                    let _ = manager.add_player(&format!("player_{}", i), None).await;
                }

                black_box(manager.finish_game("player_0", Outcome::Win).await)
            })
        })
    });
}

fn bench_status_with_load(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let manager = create_bench_system();

    rt.block_on(async {
        manager.create_queue("LTpug", 4).await.unwrap();
        manager.create_queue("LTunrated", 10).await.unwrap();
        // 20 players in games, 3 left waiting in each queue
        for i in 0..23 {
            let _ = manager.add_player(&format!("player_{}", i), None).await;
        }
    });

    c.bench_function("status_with_load", |b| {
        b.iter(|| rt.block_on(async { black_box(manager.status().await) }))
    });
}

criterion_group!(benches, bench_single_add, bench_queue_pop, bench_status_with_load);
criterion_main!(benches);
