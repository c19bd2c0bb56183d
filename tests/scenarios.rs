//! End-to-end scenarios exercising the dispatcher against a real
//! `DirectBackend`, each built from a literal pre-state/input/expected-output
//! triple rather than a generic round-trip.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kbroker::backend::{Backend, DirectBackend};
use kbroker::batch::{BatchAggregator, BatchAggregatorConfig, Record};
use kbroker::dispatcher::Dispatcher;
use kbroker::group::ConsumerGroupCoordinator;
use kbroker::produce_waiter::ProduceWaiter;
use kbroker::producer_id::ProducerIdManager;
use kbroker::protocol::error_code::ErrorCode;
use kbroker::protocol::messages::add_partitions_to_txn::{
    AddPartitionsToTxnRequest, AddPartitionsToTxnTopic,
};
use kbroker::protocol::messages::create_topics::{CreateTopicRequest, CreateTopicsRequest};
use kbroker::protocol::messages::end_txn::EndTxnRequest;
use kbroker::protocol::messages::init_producer_id::InitProducerIdRequest;
use kbroker::protocol::messages::join_group::{JoinGroupProtocol, JoinGroupRequest};
use kbroker::protocol::messages::produce::{
    ProduceRequest, ProduceRequestPartitionData, ProduceRequestTopicData,
};
use kbroker::protocol::messages::sync_group::{SyncGroupRequest, SyncGroupRequestAssignment};
use kbroker::txn::TransactionCoordinator;

fn dispatcher_with(min_insync_replicas: i32) -> Dispatcher {
    Dispatcher {
        backend: Arc::new(DirectBackend::new()),
        producer_ids: Arc::new(ProducerIdManager::new()),
        txn_coordinator: Arc::new(TransactionCoordinator::new()),
        produce_waiter: ProduceWaiter::new(),
        groups: Arc::new(ConsumerGroupCoordinator::new()),
        batches: Arc::new(BatchAggregator::new(BatchAggregatorConfig {
            max_size: 3,
            max_bytes: 1 << 20,
            linger: Duration::from_millis(0),
            adaptive_max_size: 10_000,
        })),
        default_ack_timeout_ms: 2000,
        broker_id: 1,
        host: "localhost".into(),
        port: 9092,
        replica_lag_max_messages: 0,
        min_insync_replicas,
    }
}

/// Scenario 1: `CreateTopics({name:"t", partitions:3, rf:1})` on a
/// single-broker cluster.
#[tokio::test]
async fn scenario_create_topic() {
    let d = dispatcher_with(1);

    let resp = d
        .handle_create_topics(CreateTopicsRequest {
            topics: vec![CreateTopicRequest {
                name: "t".into(),
                num_partitions: 3,
                replication_factor: 1,
                assignments: Vec::new(),
                configs: Vec::new(),
            }],
            timeout_ms: 1000,
            validate_only: None,
        })
        .await;
    assert_eq!(resp.topics[0].error_code, None);

    let topics = d.backend.list_topics().await;
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].name, "t");
    assert_eq!(topics[0].partitions.len(), 3);
    for (_, partition) in &topics[0].partitions {
        assert_eq!(partition.replicas(), vec![1]);
        assert_eq!(partition.isr(), vec![1]);
    }
}

/// Scenario 2: creating the same topic twice reports `TopicAlreadyExists`
/// the second time.
#[tokio::test]
async fn scenario_duplicate_topic() {
    let d = dispatcher_with(1);
    let request = || CreateTopicsRequest {
        topics: vec![CreateTopicRequest {
            name: "t".into(),
            num_partitions: 1,
            replication_factor: 1,
            assignments: Vec::new(),
            configs: Vec::new(),
        }],
        timeout_ms: 1000,
        validate_only: None,
    };

    let first = d.handle_create_topics(request()).await;
    assert_eq!(first.topics[0].error_code, None);

    let second = d.handle_create_topics(request()).await;
    assert_eq!(second.topics[0].error_code, Some(ErrorCode::TopicAlreadyExists));
}

/// Scenario 3: `acks=-1` resolves once every ISR member's LEO update pushes
/// the high watermark past the appended offset.
#[tokio::test]
async fn scenario_produce_acks_all_happy_path() {
    let d = dispatcher_with(1);
    d.backend.create_topic("t", 1, vec![1, 2, 3]).await.unwrap();

    let topic = d.backend.get_topic("t").await.unwrap();
    let follower_task = {
        let waiter = d.produce_waiter.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            let partition = topic.partitions.get(&0).unwrap();
            partition.update_follower_leo(2, 1, Instant::now());
            if let Some(hwm) = partition.update_follower_leo(3, 1, Instant::now()) {
                waiter.notify_hwm_advanced("t", 0, hwm);
            }
        })
    };

    let started = Instant::now();
    let resp = d
        .handle_produce(ProduceRequest {
            transactional_id: None,
            acks: -1,
            timeout_ms: 2000,
            topic_data: vec![ProduceRequestTopicData {
                name: "t".into(),
                partition_data: vec![ProduceRequestPartitionData {
                    index: 0,
                    records: vec![1],
                }],
            }],
        })
        .await;
    follower_task.await.unwrap();

    assert_eq!(resp.responses[0].partition_responses[0].error_code, None);
    assert_eq!(resp.responses[0].partition_responses[0].base_offset, 0);
    assert!(started.elapsed() < Duration::from_millis(1000));
}

/// Scenario 4: `acks=-1` with no follower progress times out.
#[tokio::test]
async fn scenario_produce_acks_all_timeout() {
    let d = dispatcher_with(1);
    d.backend.create_topic("t", 1, vec![1, 2, 3]).await.unwrap();

    let started = Instant::now();
    let resp = d
        .handle_produce(ProduceRequest {
            transactional_id: None,
            acks: -1,
            timeout_ms: 500,
            topic_data: vec![ProduceRequestTopicData {
                name: "t".into(),
                partition_data: vec![ProduceRequestPartitionData {
                    index: 0,
                    records: vec![1],
                }],
            }],
        })
        .await;
    let elapsed = started.elapsed();

    assert_eq!(
        resp.responses[0].partition_responses[0].error_code,
        Some(ErrorCode::RequestTimeout)
    );
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(1000));
}

/// Scenario 5: an empty ISR fails `acks=-1` immediately with
/// `NotEnoughReplicas`, without waiting out the produce timeout.
#[tokio::test]
async fn scenario_produce_acks_all_not_enough_replicas() {
    let d = dispatcher_with(1);
    d.backend.create_topic("t", 1, vec![1, 2, 3]).await.unwrap();
    d.backend
        .get_topic("t")
        .await
        .unwrap()
        .partitions
        .get(&0)
        .unwrap()
        .set_isr(Vec::new());

    let started = Instant::now();
    let resp = d
        .handle_produce(ProduceRequest {
            transactional_id: None,
            acks: -1,
            timeout_ms: 1000,
            topic_data: vec![ProduceRequestTopicData {
                name: "t".into(),
                partition_data: vec![ProduceRequestPartitionData {
                    index: 0,
                    records: vec![1],
                }],
            }],
        })
        .await;

    assert_eq!(
        resp.responses[0].partition_responses[0].error_code,
        Some(ErrorCode::NotEnoughReplicas)
    );
    assert!(started.elapsed() < Duration::from_millis(100));
}

/// Scenario 6: a committed transaction fences out the old producer id and
/// epoch for subsequent `AddPartitionsToTxn` calls.
#[tokio::test]
async fn scenario_transaction_commit_sequence() {
    let d = dispatcher_with(1);

    let init = d
        .handle_init_producer_id(InitProducerIdRequest {
            transactional_id: Some("txn1".into()),
            transaction_timeout_ms: 10_000,
            producer_id: None,
            producer_epoch: None,
        })
        .await;
    assert_eq!(init.error_code, None);
    let pid = init.producer_id;
    let epoch = init.producer_epoch;

    let added = d.handle_add_partitions_to_txn(AddPartitionsToTxnRequest {
        transactional_id: "txn1".into(),
        producer_id: pid,
        producer_epoch: epoch,
        topics: vec![AddPartitionsToTxnTopic {
            name: "t".into(),
            partitions: vec![0, 1],
        }],
    });
    for topic in &added.results {
        for partition in &topic.results {
            assert_eq!(partition.error_code, None);
        }
    }

    let ended = d.handle_end_txn(EndTxnRequest {
        transactional_id: "txn1".into(),
        producer_id: pid,
        producer_epoch: epoch,
        committed: true,
    });
    assert_eq!(ended.error_code, None);

    let wrong_pid = d.handle_add_partitions_to_txn(AddPartitionsToTxnRequest {
        transactional_id: "txn1".into(),
        producer_id: pid + 1,
        producer_epoch: epoch,
        topics: vec![AddPartitionsToTxnTopic {
            name: "t".into(),
            partitions: vec![0],
        }],
    });
    assert_eq!(
        wrong_pid.results[0].results[0].error_code,
        Some(ErrorCode::InvalidProducerIdMapping)
    );

    let wrong_epoch = d.handle_add_partitions_to_txn(AddPartitionsToTxnRequest {
        transactional_id: "txn1".into(),
        producer_id: pid,
        producer_epoch: epoch + 1,
        topics: vec![AddPartitionsToTxnTopic {
            name: "t".into(),
            partitions: vec![0],
        }],
    });
    assert_eq!(
        wrong_epoch.results[0].results[0].error_code,
        Some(ErrorCode::InvalidProducerEpoch)
    );
}

/// Scenario 7: two members joining and syncing a group end up `Stable`
/// with their assignments.
#[tokio::test]
async fn scenario_consumer_group_join_sync() {
    let d = dispatcher_with(1);

    let join_a = d
        .handle_join_group(JoinGroupRequest {
            group_id: "g".into(),
            session_timeout_ms: 10_000,
            rebalance_timeout_ms: 10_000,
            member_id: "".into(),
            group_instance_id: None,
            protocol_type: "consumer".into(),
            protocols: vec![JoinGroupProtocol {
                name: "range".into(),
                metadata: Vec::new(),
            }],
        })
        .await;
    assert_eq!(join_a.generation_id, 1);
    assert_eq!(join_a.leader, join_a.member_id);
    assert_eq!(join_a.members.len(), 1);
    let m1 = join_a.member_id.clone();

    let join_b = d
        .handle_join_group(JoinGroupRequest {
            group_id: "g".into(),
            session_timeout_ms: 10_000,
            rebalance_timeout_ms: 10_000,
            member_id: "".into(),
            group_instance_id: None,
            protocol_type: "consumer".into(),
            protocols: vec![JoinGroupProtocol {
                name: "range".into(),
                metadata: Vec::new(),
            }],
        })
        .await;
    assert_eq!(join_b.generation_id, 2);
    assert_eq!(join_b.leader, m1);
    assert_eq!(join_b.members.len(), 2);
    let m2 = join_b.member_id.clone();

    let sync_a = d
        .handle_sync_group(SyncGroupRequest {
            group_id: "g".into(),
            generation_id: 2,
            member_id: m1.clone(),
            group_instance_id: None,
            protocol_type: None,
            protocol_name: None,
            assignments: vec![
                SyncGroupRequestAssignment {
                    member_id: m1.clone(),
                    assignment: b"a1".to_vec(),
                },
                SyncGroupRequestAssignment {
                    member_id: m2.clone(),
                    assignment: b"a2".to_vec(),
                },
            ],
        })
        .await;
    assert_eq!(sync_a.error_code, None);

    let sync_b = d
        .handle_sync_group(SyncGroupRequest {
            group_id: "g".into(),
            generation_id: 2,
            member_id: m2,
            group_instance_id: None,
            protocol_type: None,
            protocol_name: None,
            assignments: Vec::new(),
        })
        .await;
    assert_eq!(sync_b.error_code, None);

    let description = d.groups.describe_group("g").await.unwrap();
    assert_eq!(description.state, "Stable");
}

/// Scenario 8: a batch aggregator configured with `max_size=3` flushes on
/// the third record, not before.
#[tokio::test]
async fn scenario_batch_aggregator_max_size_flush() {
    let d = dispatcher_with(1);
    let record = || Record {
        key: None,
        value: vec![0u8; 8],
    };

    assert!(d.batches.add("t", 0, record(), Instant::now()).is_none());
    assert!(d.batches.add("t", 0, record(), Instant::now()).is_none());
    let flushed = d.batches.add("t", 0, record(), Instant::now());
    assert_eq!(flushed.map(|b| b.len()), Some(3));
}
