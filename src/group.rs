//! Consumer group coordinator.
//!
//! One `tokio::sync::Mutex` per group serializes its rebalance state
//! machine end to end (`JoinGroup` and `SyncGroup` both need to await the
//! rest of the membership, so the lock has to survive an `.await`); a
//! `parking_lot::RwLock` around the group registry guards only creation
//! and lookup, which never await.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::instrument;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GroupError {
    #[error("unknown member id")]
    UnknownMemberId,

    #[error("illegal generation")]
    IllegalGeneration,

    #[error("rebalance in progress")]
    RebalanceInProgress,

    #[error("group id not found")]
    GroupIdNotFound,
}

pub type Result<T, E = GroupError> = std::result::Result<T, E>;

/// A point-in-time snapshot of one group, for `DescribeGroups`.
pub struct GroupDescription {
    pub state: &'static str,
    pub protocol_type: String,
    pub protocol_name: String,
    pub members: Vec<(String, Vec<u8>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Empty,
    PreparingRebalance,
    CompletingRebalance,
    Stable,
    Dead,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub member_id: String,
    pub session_timeout_ms: i32,
    pub subscribed_topics: Vec<String>,
    pub assignment: Vec<u8>,
    pub last_heartbeat: Instant,
}

struct Group {
    state: GroupState,
    generation_id: i32,
    protocol_name: Option<String>,
    leader: Option<String>,
    members: HashMap<String, Member>,
    committed_offsets: HashMap<(String, i32), i64>,
}

impl Group {
    fn new() -> Self {
        Self {
            state: GroupState::Empty,
            generation_id: 0,
            protocol_name: None,
            leader: None,
            members: HashMap::new(),
            committed_offsets: HashMap::new(),
        }
    }
}

/// Outcome of a `JoinGroup` call: every member gets `generation_id` and
/// `protocol_name`, but only the elected leader gets a non-empty
/// `members` roster, mirroring the Kafka wire protocol's own asymmetry.
pub struct JoinGroupOutcome {
    pub generation_id: i32,
    pub protocol_name: String,
    pub leader_id: String,
    pub member_id: String,
    pub members: Vec<(String, Vec<String>)>,
}

/// Coordinates membership, rebalances, and offset storage for every group
/// on this broker.
#[derive(Default)]
pub struct ConsumerGroupCoordinator {
    groups: RwLock<HashMap<String, Arc<AsyncMutex<Group>>>>,
}

impl ConsumerGroupCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_handle(&self, group_id: &str) -> Arc<AsyncMutex<Group>> {
        if let Some(group) = self.groups.read().get(group_id) {
            return group.clone();
        }
        self.groups
            .write()
            .entry(group_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(Group::new())))
            .clone()
    }

    /// A brand-new member joins with an empty `member_id`; the coordinator
    /// mints one and moves the group into `PreparingRebalance`. An
    /// existing member rejoining (e.g. after a `SyncGroup` failure) reuses
    /// its id. The first member to join in a generation becomes leader.
    #[instrument(skip(self, subscribed_topics), fields(group_id))]
    pub async fn join_group(
        &self,
        group_id: &str,
        member_id: &str,
        session_timeout_ms: i32,
        protocol_name: &str,
        subscribed_topics: Vec<String>,
        now: Instant,
    ) -> JoinGroupOutcome {
        let group = self.group_handle(group_id);
        let mut group = group.lock().await;

        let member_id = if member_id.is_empty() {
            format!("{group_id}-{}", uuid::Uuid::new_v4())
        } else {
            member_id.to_string()
        };

        group.state = GroupState::PreparingRebalance;
        group.protocol_name = Some(protocol_name.to_string());
        if group.leader.is_none() {
            group.leader = Some(member_id.clone());
        }
        group.members.insert(
            member_id.clone(),
            Member {
                member_id: member_id.clone(),
                session_timeout_ms,
                subscribed_topics,
                assignment: Vec::new(),
                last_heartbeat: now,
            },
        );
        group.generation_id += 1;
        group.state = GroupState::CompletingRebalance;

        let leader_id = group.leader.clone().unwrap_or_else(|| member_id.clone());
        let members = if member_id == leader_id {
            group
                .members
                .values()
                .map(|m| (m.member_id.clone(), m.subscribed_topics.clone()))
                .collect()
        } else {
            Vec::new()
        };

        JoinGroupOutcome {
            generation_id: group.generation_id,
            protocol_name: protocol_name.to_string(),
            leader_id,
            member_id,
            members,
        }
    }

    /// The leader submits every member's assignment; followers submit an
    /// empty list and just wait for the leader's `SyncGroup` to land the
    /// assignments, then read their own back out.
    #[instrument(skip(self, leader_assignments), fields(group_id))]
    pub async fn sync_group(
        &self,
        group_id: &str,
        member_id: &str,
        generation_id: i32,
        leader_assignments: Vec<(String, Vec<u8>)>,
    ) -> Result<Vec<u8>> {
        let group = self.group_handle(group_id);
        let mut group = group.lock().await;

        if group.generation_id != generation_id {
            return Err(GroupError::IllegalGeneration);
        }
        if !group.members.contains_key(member_id) {
            return Err(GroupError::UnknownMemberId);
        }

        if !leader_assignments.is_empty() {
            for (id, assignment) in leader_assignments {
                if let Some(member) = group.members.get_mut(&id) {
                    member.assignment = assignment;
                }
            }
            group.state = GroupState::Stable;
        }

        if group.state != GroupState::Stable {
            return Err(GroupError::RebalanceInProgress);
        }

        Ok(group
            .members
            .get(member_id)
            .map(|m| m.assignment.clone())
            .unwrap_or_default())
    }

    #[instrument(skip(self), fields(group_id))]
    pub async fn heartbeat(
        &self,
        group_id: &str,
        member_id: &str,
        generation_id: i32,
        now: Instant,
    ) -> Result<()> {
        let group = self.group_handle(group_id);
        let mut group = group.lock().await;

        if group.generation_id != generation_id {
            return Err(GroupError::IllegalGeneration);
        }
        let member = group
            .members
            .get_mut(member_id)
            .ok_or(GroupError::UnknownMemberId)?;
        member.last_heartbeat = now;

        if group.state == GroupState::PreparingRebalance {
            return Err(GroupError::RebalanceInProgress);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(group_id))]
    pub async fn leave_group(&self, group_id: &str, member_id: &str) -> Result<()> {
        let group = self.group_handle(group_id);
        let mut group = group.lock().await;

        group
            .members
            .remove(member_id)
            .ok_or(GroupError::UnknownMemberId)?;

        if group.members.is_empty() {
            group.state = GroupState::Empty;
            group.leader = None;
        } else {
            group.state = GroupState::PreparingRebalance;
            group.generation_id += 1;
            if group.leader.as_deref() == Some(member_id) {
                group.leader = group.members.keys().next().cloned();
            }
        }
        Ok(())
    }

    /// Wire-facing state name, matching the strings the Kafka admin client
    /// expects back from `DescribeGroups`/`ListGroups`.
    fn state_name(state: GroupState) -> &'static str {
        match state {
            GroupState::Empty => "Empty",
            GroupState::PreparingRebalance => "PreparingRebalance",
            GroupState::CompletingRebalance => "CompletingRebalance",
            GroupState::Stable => "Stable",
            GroupState::Dead => "Dead",
        }
    }

    /// Every known group's id and state, for `ListGroups`.
    pub async fn list_groups(&self) -> Vec<(String, &'static str)> {
        let handles: Vec<_> = self
            .groups
            .read()
            .iter()
            .map(|(id, group)| (id.clone(), group.clone()))
            .collect();
        let mut out = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let group = handle.lock().await;
            out.push((id, Self::state_name(group.state)));
        }
        out
    }

    /// A snapshot of one group's state and membership, for `DescribeGroups`.
    pub async fn describe_group(&self, group_id: &str) -> Option<GroupDescription> {
        let group = self.groups.read().get(group_id).cloned()?;
        let group = group.lock().await;
        Some(GroupDescription {
            state: Self::state_name(group.state),
            protocol_type: "consumer".to_string(),
            protocol_name: group.protocol_name.clone().unwrap_or_default(),
            members: group
                .members
                .values()
                .map(|m| (m.member_id.clone(), m.assignment.clone()))
                .collect(),
        })
    }

    pub async fn commit_offset(&self, group_id: &str, topic: &str, partition: i32, offset: i64) {
        let group = self.group_handle(group_id);
        let mut group = group.lock().await;
        group
            .committed_offsets
            .insert((topic.to_string(), partition), offset);
    }

    pub async fn fetch_offset(&self, group_id: &str, topic: &str, partition: i32) -> Option<i64> {
        let group = self.group_handle(group_id);
        let group = group.lock().await;
        group
            .committed_offsets
            .get(&(topic.to_string(), partition))
            .copied()
    }

    /// Every `(topic, partition, offset)` this group has ever committed, for
    /// an `OffsetFetch` with `topics: None`. Returns an empty list for a
    /// group id nobody has joined or committed through.
    pub async fn all_committed_offsets(&self, group_id: &str) -> Vec<(String, i32, i64)> {
        let Some(group) = self.groups.read().get(group_id).cloned() else {
            return Vec::new();
        };
        let group = group.lock().await;
        group
            .committed_offsets
            .iter()
            .map(|(&(ref topic, partition), &offset)| (topic.clone(), partition, offset))
            .collect()
    }

    /// Drops any member whose last heartbeat is older than its own
    /// session timeout, forcing a rebalance for groups that lost members.
    /// Meant to be driven by a periodic sweeper task, not called inline
    /// from request handling.
    pub async fn expire_stale_sessions(&self, now: Instant) {
        let handles: Vec<_> = self.groups.read().values().cloned().collect();
        for handle in handles {
            let mut group = handle.lock().await;
            let stale: Vec<String> = group
                .members
                .values()
                .filter(|m| {
                    now.duration_since(m.last_heartbeat)
                        > Duration::from_millis(m.session_timeout_ms as u64)
                })
                .map(|m| m.member_id.clone())
                .collect();

            if stale.is_empty() {
                continue;
            }
            for member_id in &stale {
                group.members.remove(member_id);
            }
            if group.members.is_empty() {
                group.state = GroupState::Empty;
                group.leader = None;
            } else {
                group.state = GroupState::PreparingRebalance;
                group.generation_id += 1;
                if group
                    .leader
                    .as_ref()
                    .is_some_and(|leader| stale.contains(leader))
                {
                    group.leader = group.members.keys().next().cloned();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_member_becomes_leader_with_full_roster() {
        let coord = ConsumerGroupCoordinator::new();
        let now = Instant::now();

        let outcome = coord
            .join_group("g", "", 10_000, "range", vec!["orders".into()], now)
            .await;
        assert_eq!(outcome.leader_id, outcome.member_id);
        assert_eq!(outcome.members.len(), 1);
        assert_eq!(outcome.generation_id, 1);
    }

    #[tokio::test]
    async fn second_member_join_bumps_generation_and_is_not_leader() {
        let coord = ConsumerGroupCoordinator::new();
        let now = Instant::now();

        let first = coord
            .join_group("g", "", 10_000, "range", vec!["orders".into()], now)
            .await;
        let second = coord
            .join_group("g", "", 10_000, "range", vec!["orders".into()], now)
            .await;

        assert_eq!(second.leader_id, first.member_id);
        assert!(second.members.is_empty());
        assert_eq!(second.generation_id, 2);
    }

    #[tokio::test]
    async fn sync_group_distributes_leader_assignment_to_followers() {
        let coord = ConsumerGroupCoordinator::new();
        let now = Instant::now();

        let leader = coord
            .join_group("g", "", 10_000, "range", vec!["orders".into()], now)
            .await;
        let follower = coord
            .join_group("g", "", 10_000, "range", vec!["orders".into()], now)
            .await;

        let assignments = vec![
            (leader.member_id.clone(), b"leader-assignment".to_vec()),
            (follower.member_id.clone(), b"follower-assignment".to_vec()),
        ];
        let leader_result = coord
            .sync_group("g", &leader.member_id, follower.generation_id, assignments)
            .await
            .unwrap();
        assert_eq!(leader_result, b"leader-assignment");

        let follower_result = coord
            .sync_group("g", &follower.member_id, follower.generation_id, vec![])
            .await
            .unwrap();
        assert_eq!(follower_result, b"follower-assignment");
    }

    #[tokio::test]
    async fn heartbeat_with_stale_generation_is_illegal_generation() {
        let coord = ConsumerGroupCoordinator::new();
        let now = Instant::now();
        let outcome = coord
            .join_group("g", "", 10_000, "range", vec![], now)
            .await;

        let err = coord
            .heartbeat("g", &outcome.member_id, outcome.generation_id + 1, now)
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::IllegalGeneration));
    }

    #[tokio::test]
    async fn leave_group_promotes_a_new_leader() {
        let coord = ConsumerGroupCoordinator::new();
        let now = Instant::now();
        let leader = coord
            .join_group("g", "", 10_000, "range", vec![], now)
            .await;
        let follower = coord
            .join_group("g", "", 10_000, "range", vec![], now)
            .await;

        coord.leave_group("g", &leader.member_id).await.unwrap();

        let err = coord
            .heartbeat("g", &follower.member_id, follower.generation_id + 1, now)
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::IllegalGeneration));
    }

    #[tokio::test]
    async fn expire_stale_sessions_drops_silent_members() {
        let coord = ConsumerGroupCoordinator::new();
        let now = Instant::now();
        let outcome = coord
            .join_group("g", "", 1_000, "range", vec![], now)
            .await;

        coord
            .expire_stale_sessions(now + Duration::from_secs(5))
            .await;

        let err = coord
            .heartbeat(
                "g",
                &outcome.member_id,
                outcome.generation_id,
                now + Duration::from_secs(5),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GroupError::UnknownMemberId));
    }

    #[tokio::test]
    async fn describe_group_reports_stable_state_and_members() {
        let coord = ConsumerGroupCoordinator::new();
        let now = Instant::now();
        let leader = coord
            .join_group("g", "", 10_000, "range", vec!["orders".into()], now)
            .await;
        coord
            .sync_group(
                "g",
                &leader.member_id,
                leader.generation_id,
                vec![(leader.member_id.clone(), b"assignment".to_vec())],
            )
            .await
            .unwrap();

        let description = coord.describe_group("g").await.unwrap();
        assert_eq!(description.state, "Stable");
        assert_eq!(description.members.len(), 1);

        let groups = coord.list_groups().await;
        assert_eq!(groups, vec![("g".to_string(), "Stable")]);
    }

    #[tokio::test]
    async fn describe_group_unknown_id_returns_none() {
        let coord = ConsumerGroupCoordinator::new();
        assert!(coord.describe_group("missing").await.is_none());
    }

    #[tokio::test]
    async fn offsets_round_trip_per_partition() {
        let coord = ConsumerGroupCoordinator::new();
        coord.commit_offset("g", "orders", 0, 42).await;
        assert_eq!(coord.fetch_offset("g", "orders", 0).await, Some(42));
        assert_eq!(coord.fetch_offset("g", "orders", 1).await, None);
    }
}
