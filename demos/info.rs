//! Prints every consumer group on an in-process broker, its members, and
//! its committed offsets for every known topic.

use kbroker::broker::{BackendChoice, Broker};
use kbroker::config::BrokerConfig;
use kbroker::protocol::messages::describe_groups::DescribeGroupsRequest;
use kbroker::protocol::messages::list_groups::ListGroupsRequest;
use kbroker::protocol::messages::offset_fetch::{OffsetFetchRequest, OffsetFetchRequestTopic};

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
    let broker = Broker::new(config, BackendChoice::Direct);

    let topics = broker.dispatcher.backend.list_topics().await;
    let group_ids: Vec<String> = broker
        .dispatcher
        .handle_list_groups(ListGroupsRequest {
            states_filter: Vec::new(),
        })
        .await
        .groups
        .into_iter()
        .map(|g| g.group_id)
        .collect();

    if group_ids.is_empty() {
        println!("no groups available");
        return;
    }

    let described = broker
        .dispatcher
        .handle_describe_groups(DescribeGroupsRequest {
            groups: group_ids,
            include_authorized_operations: false,
        })
        .await;

    for group in described.groups {
        println!("GROUP_ID:      {}", group.group_id);
        println!("GROUP_STATE:   {}", group.group_state);
        println!("PROTOCOL_TYPE: {}", group.protocol_type);
        println!("MEMBER:");
        for member in &group.members {
            println!("  MEMBER_ID:         {}", member.member_id);
            println!("  GROUP_INSTANCE_ID: {:?}", member.group_instance_id);
            println!();
        }

        let topic_names = topics
            .iter()
            .map(|t| OffsetFetchRequestTopic {
                name: t.name.clone(),
                partition_indexes: t.partitions.keys().copied().collect(),
            })
            .collect();
        let offsets = broker
            .dispatcher
            .handle_offset_fetch(OffsetFetchRequest {
                group_id: group.group_id,
                topics: Some(topic_names),
                require_stable: None,
            })
            .await;
        for topic in offsets.topics {
            println!("TOPIC:      {}", topic.name);
            for partition in topic.partitions {
                println!(
                    "  COMMITS:  {}/{}",
                    partition.partition_index, partition.committed_offset
                );
            }
        }
        println!();
    }
}
