//! Joins a consumer group against an in-process broker, heartbeats and
//! commits offsets on a tick, and leaves cleanly on SIGINT.

use std::sync::Arc;
use std::time::Duration;

use kbroker::broker::{BackendChoice, Broker};
use kbroker::config::BrokerConfig;
use kbroker::protocol::messages::heartbeat::HeartbeatRequest;
use kbroker::protocol::messages::join_group::{JoinGroupProtocol, JoinGroupRequest};
use kbroker::protocol::messages::leave_group::LeaveGroupRequest;
use kbroker::protocol::messages::offset_commit::{OffsetCommitRequest, PartitionCommit, TopicCommit};
use kbroker::protocol::messages::sync_group::SyncGroupRequest;
use tokio::signal::unix::SignalKind;
use tokio::sync::Notify;

const GROUP: &str = "test";
const TOPIC: &str = "test";

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

    let joined = broker
        .dispatcher
        .handle_join_group(JoinGroupRequest {
            group_id: GROUP.to_string(),
            session_timeout_ms: 10_000,
            rebalance_timeout_ms: 10_000,
            member_id: String::new(),
            group_instance_id: None,
            protocol_type: "consumer".to_string(),
            protocols: vec![JoinGroupProtocol {
                name: "range".to_string(),
                metadata: Vec::new(),
            }],
        })
        .await;
    println!(
        "joined group, member_id: {}, generation: {}, leader: {}",
        joined.member_id, joined.generation_id, joined.leader
    );

    broker
        .dispatcher
        .handle_sync_group(SyncGroupRequest {
            group_id: GROUP.to_string(),
            generation_id: joined.generation_id,
            member_id: joined.member_id.clone(),
            group_instance_id: None,
            protocol_type: None,
            protocol_name: None,
            assignments: Vec::new(),
        })
        .await;

    let shutdown = Arc::new(Notify::new());
    let mut signal = tokio::signal::unix::signal(SignalKind::interrupt()).unwrap();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = signal.recv().await;
        signal_shutdown.notify_waiters();
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(3));
    let mut offset = 0i64;
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = ticker.tick() => {}
        }

        let heartbeat = broker
            .dispatcher
            .handle_heartbeat(HeartbeatRequest {
                group_id: GROUP.to_string(),
                generation_id: joined.generation_id,
                member_id: joined.member_id.clone(),
                group_instance_id: None,
            })
            .await;
        if let Some(err) = heartbeat.error_code {
            println!("heartbeat failed: {err:?}");
            break;
        }

        offset += 1;
        broker
            .dispatcher
            .handle_offset_commit(OffsetCommitRequest {
                group_id: GROUP.to_string(),
                generation_id: joined.generation_id,
                member_id: joined.member_id.clone(),
                retention_time_ms: None,
                group_instance_id: None,
                topics: vec![TopicCommit {
                    name: TOPIC.to_string(),
                    partitions: vec![PartitionCommit {
                        partition_index: 0,
                        committed_offset: offset,
                        commit_timestamp: -1,
                        committed_leader_epoch: -1,
                        committed_metadata: None,
                    }],
                }],
            })
            .await;
        println!("committed {TOPIC}-0 at offset {offset}");
    }

    let left = broker
        .dispatcher
        .handle_leave_group(LeaveGroupRequest {
            group_id: GROUP.to_string(),
            member_id: joined.member_id.clone(),
            members: Vec::new(),
        })
        .await;
    if let Some(err) = left.error_code {
        println!("error while leaving consumer group: {err:?}");
    }
}
