//! Acks-all produce waiters.
//!
//! A producer sending with `acks=-1` blocks until the high watermark has
//! advanced past the offset its batch was appended at. Waiters are kept in
//! a `topic -> partition -> offset -> waiter` tree guarded by a single
//! `parking_lot::Mutex`; the tree itself is cheap to walk, so one lock
//! beats one per partition. The notify side runs as its own task fed by a
//! bounded `mpsc`, so a burst of HWM advances can't starve the register
//! side of the lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::instrument;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WaitError {
    #[error("timed out waiting for acknowledgment")]
    Timeout,

    #[error("produce waiter closed")]
    Closed,
}

pub type Result<T, E = WaitError> = std::result::Result<T, E>;

type PartitionWaiters = BTreeMap<i64, Vec<oneshot::Sender<()>>>;

#[derive(Default)]
struct Tree {
    by_topic: HashMap<String, HashMap<i32, PartitionWaiters>>,
}

struct Advance {
    topic: String,
    partition: i32,
    hwm: i64,
}

/// Wakes `WaitForAck` callers once the high watermark passes their offset.
pub struct ProduceWaiter {
    tree: Mutex<Tree>,
    advances: mpsc::Sender<Advance>,
    closed: AtomicBool,
}

impl ProduceWaiter {
    pub fn new() -> std::sync::Arc<Self> {
        let (tx, mut rx) = mpsc::channel::<Advance>(1024);
        let this = std::sync::Arc::new(Self {
            tree: Mutex::new(Tree::default()),
            advances: tx,
            closed: AtomicBool::new(false),
        });

        let worker = this.clone();
        tokio::spawn(async move {
            while let Some(advance) = rx.recv().await {
                worker.wake_up_to(&advance.topic, advance.partition, advance.hwm);
            }
        });

        this
    }

    fn wake_up_to(&self, topic: &str, partition: i32, hwm: i64) {
        let mut tree = self.tree.lock();
        let Some(partitions) = tree.by_topic.get_mut(topic) else {
            return;
        };
        let Some(waiters) = partitions.get_mut(&partition) else {
            return;
        };

        let ready_offsets: Vec<i64> = waiters
            .range(..=hwm)
            .map(|(offset, _)| *offset)
            .collect();
        for offset in ready_offsets {
            if let Some(senders) = waiters.remove(&offset) {
                for sender in senders {
                    let _ = sender.send(());
                }
            }
        }
    }

    /// Blocks until `offset` is covered by the partition's high watermark,
    /// or `timeout_ms` elapses. `current_hwm` is the caller's most recent
    /// read of the partition's HWM; if it already covers `offset` this
    /// returns immediately without registering a waiter at all, which is
    /// what makes a single-replica ISR's `acks=-1` produce resolve instead
    /// of riding out the full timeout waiting for a HWM advance nothing
    /// will ever signal.
    #[instrument(skip(self), fields(topic, partition, offset))]
    pub async fn wait_for_ack(
        &self,
        topic: &str,
        partition: i32,
        offset: i64,
        current_hwm: i64,
        timeout_ms: u64,
    ) -> Result<()> {
        if current_hwm >= offset {
            return Ok(());
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut tree = self.tree.lock();
            if self.closed.load(Ordering::Acquire) {
                return Err(WaitError::Closed);
            }
            tree.by_topic
                .entry(topic.to_string())
                .or_default()
                .entry(partition)
                .or_default()
                .entry(offset)
                .or_default()
                .push(tx);
        }

        match timeout(Duration::from_millis(timeout_ms), rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(WaitError::Closed),
            Err(_) => Err(WaitError::Timeout),
        }
    }

    /// Called by the ISR engine whenever a partition's high watermark
    /// moves forward.
    pub fn notify_hwm_advanced(&self, topic: &str, partition: i32, hwm: i64) {
        let _ = self.advances.try_send(Advance {
            topic: topic.to_string(),
            partition,
            hwm,
        });
    }

    /// Rejects every pending waiter with [`WaitError::Closed`] and refuses
    /// any further `wait_for_ack` call the same way. Used on shutdown, so
    /// an in-flight `acks=-1` produce doesn't hang past the broker it was
    /// waiting on.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let mut tree = self.tree.lock();
        tree.by_topic.clear();
    }

    /// Total number of callers currently blocked in `wait_for_ack`, across
    /// every topic and partition. Exposed for tests and metrics.
    pub fn waiting_count(&self) -> usize {
        let tree = self.tree.lock();
        tree.by_topic
            .values()
            .flat_map(|partitions| partitions.values())
            .flat_map(|waiters| waiters.values())
            .map(|senders| senders.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn waiter_resolves_once_hwm_passes_its_offset() {
        let waiter = ProduceWaiter::new();
        let w = waiter.clone();
        let handle = tokio::spawn(async move { w.wait_for_ack("orders", 0, 10, 0, 1000).await });

        tokio::task::yield_now().await;
        waiter.notify_hwm_advanced("orders", 0, 10);

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn waiter_times_out_if_hwm_never_advances() {
        let waiter = ProduceWaiter::new();
        let err = waiter.wait_for_ack("orders", 0, 10, 0, 20).await.unwrap_err();
        assert!(matches!(err, WaitError::Timeout));
    }

    #[tokio::test]
    async fn close_rejects_pending_and_future_waiters() {
        let waiter = ProduceWaiter::new();
        let w = waiter.clone();
        let handle = tokio::spawn(async move { w.wait_for_ack("orders", 0, 10, 0, 1000).await });

        tokio::task::yield_now().await;
        assert_eq!(waiter.waiting_count(), 1);
        waiter.close();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, WaitError::Closed));

        let err = waiter.wait_for_ack("orders", 0, 11, 0, 1000).await.unwrap_err();
        assert!(matches!(err, WaitError::Closed));
        assert_eq!(waiter.waiting_count(), 0);
    }

    #[tokio::test]
    async fn waiting_count_tracks_registered_waiters() {
        let waiter = ProduceWaiter::new();
        assert_eq!(waiter.waiting_count(), 0);

        let w = waiter.clone();
        let handle = tokio::spawn(async move { w.wait_for_ack("orders", 0, 10, 0, 1000).await });
        tokio::task::yield_now().await;
        assert_eq!(waiter.waiting_count(), 1);

        waiter.notify_hwm_advanced("orders", 0, 10);
        handle.await.unwrap().unwrap();
        tokio::task::yield_now().await;
        assert_eq!(waiter.waiting_count(), 0);
    }

    #[tokio::test]
    async fn earlier_offsets_wake_on_a_later_hwm() {
        let waiter = ProduceWaiter::new();
        let w = waiter.clone();
        let handle = tokio::spawn(async move { w.wait_for_ack("orders", 0, 3, 0, 1000).await });

        tokio::task::yield_now().await;
        waiter.notify_hwm_advanced("orders", 0, 10);

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn already_covered_offset_resolves_without_registering() {
        let waiter = ProduceWaiter::new();
        waiter.wait_for_ack("orders", 0, 10, 10, 1000).await.unwrap();
        assert_eq!(waiter.waiting_count(), 0);
    }
}
