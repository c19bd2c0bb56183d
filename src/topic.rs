//! Topic/partition metadata and the ISR engine.
//!
//! Partition state is guarded by a synchronous `parking_lot::RwLock`: every
//! critical section here is a handful of map lookups and integer compares,
//! never crossing an `.await`, so there is no reason to pay for an async
//! lock.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

#[derive(Debug)]
pub struct Topic {
    /// The name of this topic.
    pub name: String,

    /// Partition information.
    pub partitions: BTreeMap<i32, Partition>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: BTreeMap::new(),
        }
    }
}

/// One partition's replication state.
///
/// `leo` and `hwm` only ever move forward; `isr` only ever shrinks or
/// regrows towards `replicas`, never grows beyond it.
#[derive(Debug)]
pub struct Partition {
    /// The ID of the leader broker.
    pub leader_id: i32,
    state: RwLock<PartitionState>,
}

struct PartitionState {
    replicas: Vec<i32>,
    isr: Vec<i32>,
    follower_leo: HashMap<i32, i64>,
    last_follower_fetch: HashMap<i32, Instant>,
    hwm: i64,
    leo: i64,
    replica_lag_max_ms: i64,
}

impl std::fmt::Debug for PartitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionState")
            .field("replicas", &self.replicas)
            .field("isr", &self.isr)
            .field("hwm", &self.hwm)
            .field("leo", &self.leo)
            .finish()
    }
}

impl Partition {
    pub fn new(leader_id: i32, replicas: Vec<i32>, replica_lag_max_ms: i64) -> Self {
        let isr = replicas.clone();
        Self {
            leader_id,
            state: RwLock::new(PartitionState {
                replicas,
                isr,
                follower_leo: HashMap::new(),
                last_follower_fetch: HashMap::new(),
                hwm: 0,
                leo: 0,
                replica_lag_max_ms,
            }),
        }
    }

    pub fn replicas(&self) -> Vec<i32> {
        self.state.read().replicas.clone()
    }

    pub fn set_replicas(&self, replicas: Vec<i32>) {
        self.state.write().replicas = replicas;
    }

    pub fn isr(&self) -> Vec<i32> {
        self.state.read().isr.clone()
    }

    pub fn set_isr(&self, isr: Vec<i32>) {
        self.state.write().isr = isr;
    }

    pub fn leo(&self) -> i64 {
        self.state.read().leo
    }

    pub fn hwm(&self) -> i64 {
        self.state.read().hwm
    }

    /// Advances the leader's own LEO after an append; does not touch HWM.
    pub fn advance_leo(&self, new_leo: i64) {
        let mut state = self.state.write();
        state.leo = state.leo.max(new_leo);
    }

    pub fn get_follower_leo(&self, replica_id: i32) -> i64 {
        self.state
            .read()
            .follower_leo
            .get(&replica_id)
            .copied()
            .unwrap_or(0)
    }

    /// Records a follower fetch's resulting LEO and timestamp, then
    /// recomputes the high watermark as the minimum LEO across the current
    /// ISR (including the leader itself).
    ///
    /// Returns the new HWM if it advanced, so the caller can notify
    /// [`crate::produce_waiter::ProduceWaiter`].
    pub fn update_follower_leo(&self, replica_id: i32, leo: i64, now: Instant) -> Option<i64> {
        let mut state = self.state.write();
        state.follower_leo.insert(replica_id, leo);
        state.last_follower_fetch.insert(replica_id, now);

        let old_hwm = state.hwm;
        let new_hwm = Self::recompute_hwm(&state);
        if new_hwm > old_hwm {
            state.hwm = new_hwm;
            Some(new_hwm)
        } else {
            None
        }
    }

    /// `min(LEO(r) for r in isr)`, treating an ISR member this partition has
    /// never heard a fetch from yet as LEO `0` rather than skipping it —
    /// otherwise HWM could advance past an offset that member hasn't
    /// actually replicated.
    fn recompute_hwm(state: &PartitionState) -> i64 {
        let leader_id = state.replicas.first().copied();
        let mut min = state.leo;
        for &replica_id in &state.isr {
            if Some(replica_id) == leader_id {
                continue;
            }
            let leo = state.follower_leo.get(&replica_id).copied().unwrap_or(0);
            min = min.min(leo);
        }
        min
    }

    /// Recomputes HWM from the current ISR and LEO state alone, without
    /// recording any follower fetch. The leader's own append can let HWM
    /// advance on its own — e.g. an ISR of just the leader — and nothing
    /// else triggers that case. Returns the resulting HWM either way.
    pub fn advance_hwm_after_append(&self) -> i64 {
        let mut state = self.state.write();
        let new_hwm = Self::recompute_hwm(&state);
        state.hwm = state.hwm.max(new_hwm);
        state.hwm
    }

    /// Drops any replica whose last fetch is older than
    /// `replica_lag_max_ms`, and whose LEO lags the leader's by more than
    /// `replica_lag_max_messages` when that bound is nonzero. Returns the
    /// resulting ISR.
    pub fn recompute_isr(&self, now: Instant, replica_lag_max_messages: i64) -> Vec<i32> {
        let mut state = self.state.write();
        let leader_id = state.replicas.first().copied();
        let max_lag = Duration::from_millis(state.replica_lag_max_ms.max(0) as u64);
        let leo = state.leo;
        let replicas = state.replicas.clone();

        let mut new_isr = Vec::new();
        for replica_id in replicas {
            if Some(replica_id) == leader_id {
                new_isr.push(replica_id);
                continue;
            }
            let last_fetch = state.last_follower_fetch.get(&replica_id).copied();
            let within_time = last_fetch.is_some_and(|t| now.duration_since(t) <= max_lag);
            let within_messages = replica_lag_max_messages <= 0
                || state
                    .follower_leo
                    .get(&replica_id)
                    .is_some_and(|&follower_leo| leo - follower_leo <= replica_lag_max_messages);

            if within_time && within_messages {
                new_isr.push(replica_id);
            }
        }

        state.isr = new_isr.clone();

        let new_hwm = Self::recompute_hwm(&state);
        state.hwm = state.hwm.max(new_hwm);

        new_isr
    }

    pub fn leader(&self) -> i32 {
        self.leader_id
    }
}
