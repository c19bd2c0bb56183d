//! Spins up an in-process broker, creates a topic, and keeps producing to
//! each of its partitions on a one-second tick.

use std::sync::Arc;
use std::time::Duration;

use kbroker::broker::{BackendChoice, Broker};
use kbroker::config::BrokerConfig;
use kbroker::protocol::messages::produce::{
    ProduceRequest, ProduceRequestPartitionData, ProduceRequestTopicData,
};

const TOPIC: &str = "test";
const PARTITIONS: i32 = 3;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = BrokerConfig {
        broker_id: 0,
        cluster_brokers: "localhost:9092".to_string(),
        replica_lag_max_ms: 10_000,
        replica_lag_max_messages: 0,
        min_insync_replicas: 1,
        batch_max_size: 1000,
        batch_max_bytes: 1 << 20,
        batch_linger_ms: 5,
        batch_adaptive_max_size: 10_000,
        group_min_session_timeout_ms: 6_000,
        group_max_session_timeout_ms: 300_000,
    };
    let broker = Arc::new(Broker::new(config, BackendChoice::Direct));

    // topic might already exist from a previous run of this demo
    let _ = broker
        .dispatcher
        .backend
        .create_topic(TOPIC, PARTITIONS, vec![0])
        .await;

    for partition in 0..PARTITIONS {
        tokio::spawn(produce_per_partition(broker.clone(), partition));
    }

    tokio::time::sleep(Duration::from_secs(10_000)).await;
}

async fn produce_per_partition(broker: Arc<Broker>, partition: i32) {
    let mut index: u64 = 0;
    loop {
        let value = format!("hello: {partition} {index}").into_bytes();
        let response = broker
            .dispatcher
            .handle_produce(ProduceRequest {
                transactional_id: None,
                acks: 1,
                timeout_ms: 1_000,
                topic_data: vec![ProduceRequestTopicData {
                    name: TOPIC.to_string(),
                    partition_data: vec![ProduceRequestPartitionData {
                        index: partition,
                        records: value,
                    }],
                }],
            })
            .await;

        for topic in response.responses {
            for result in topic.partition_responses {
                match result.error_code {
                    None => println!("partition: {partition}, offset: {}", result.base_offset),
                    Some(err) => println!("partition: {partition} produce failed: {err:?}"),
                }
            }
        }

        index += 1;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
