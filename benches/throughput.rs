//! Produce/fetch dispatch throughput, run with `cargo bench`.

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use kbroker::backend::{Backend, DirectBackend};
use kbroker::batch::{BatchAggregator, BatchAggregatorConfig};
use kbroker::dispatcher::Dispatcher;
use kbroker::group::ConsumerGroupCoordinator;
use kbroker::produce_waiter::ProduceWaiter;
use kbroker::producer_id::ProducerIdManager;
use kbroker::protocol::messages::produce::{
    ProduceRequest, ProduceRequestPartitionData, ProduceRequestTopicData,
};
use kbroker::txn::TransactionCoordinator;

fn dispatcher() -> Dispatcher {
    Dispatcher {
        backend: Arc::new(DirectBackend::new()),
        producer_ids: Arc::new(ProducerIdManager::new()),
        txn_coordinator: Arc::new(TransactionCoordinator::new()),
        produce_waiter: ProduceWaiter::new(),
        groups: Arc::new(ConsumerGroupCoordinator::new()),
        batches: Arc::new(BatchAggregator::new(BatchAggregatorConfig {
            max_size: 1000,
            max_bytes: 1 << 20,
            linger: Duration::from_millis(5),
            adaptive_max_size: 10_000,
        })),
        default_ack_timeout_ms: 1000,
        broker_id: 1,
        host: "localhost".into(),
        port: 9092,
        replica_lag_max_messages: 0,
        min_insync_replicas: 1,
    }
}

fn produce_acks_one(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let d = dispatcher();
    rt.block_on(d.backend.create_topic("bench", 1, vec![1])).unwrap();

    c.bench_function("produce acks=1, single partition", |b| {
        b.to_async(&rt).iter_batched(
            || ProduceRequest {
                transactional_id: None,
                acks: 1,
                timeout_ms: 1000,
                topic_data: vec![ProduceRequestTopicData {
                    name: "bench".into(),
                    partition_data: vec![ProduceRequestPartitionData {
                        index: 0,
                        records: vec![0u8; 128],
                    }],
                }],
            },
            |req| async { d.handle_produce(req).await },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, produce_acks_one);
criterion_main!(benches);
