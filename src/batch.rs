//! Produce batch aggregation.
//!
//! Buffers incoming records per partition and flushes on whichever
//! threshold hits first: record count, byte size, or linger elapsed. Each
//! flush nudges the partition's adaptive target towards its observed size
//! with an exponential moving average (`alpha = 0.2`); the linger loop
//! separately raises that target by 10% every five seconds a partition
//! actually had throughput, capped at `batch_adaptive_max_size`, so a
//! bursty partition converges towards fewer, larger flushes without
//! needing per-partition tuning.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

const ADAPTIVE_ALPHA: f64 = 0.2;
const ADAPTIVE_RAISE_INTERVAL: Duration = Duration::from_secs(5);
const ADAPTIVE_RAISE_FACTOR: f64 = 1.1;

#[derive(Debug, Clone)]
pub struct Record {
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
}

impl Record {
    fn approx_bytes(&self) -> usize {
        self.key.as_ref().map_or(0, Vec::len) + self.value.len()
    }
}

struct PartitionBuffer {
    records: Vec<Record>,
    bytes: usize,
    adaptive_target: f64,
    records_since_raise: usize,
    last_raise: Instant,
    opened_at: Instant,
}

impl PartitionBuffer {
    fn new(initial_target: usize, now: Instant) -> Self {
        Self {
            records: Vec::new(),
            bytes: 0,
            adaptive_target: initial_target as f64,
            records_since_raise: 0,
            last_raise: now,
            opened_at: now,
        }
    }
}

pub struct BatchAggregatorConfig {
    pub max_size: usize,
    pub max_bytes: usize,
    pub linger: Duration,
    pub adaptive_max_size: usize,
}

/// Accumulates records per `(topic, partition)` and flushes full or
/// lingering batches.
pub struct BatchAggregator {
    config: BatchAggregatorConfig,
    buffers: Mutex<HashMap<(String, i32), PartitionBuffer>>,
    closed: AtomicBool,
}

impl BatchAggregator {
    pub fn new(config: BatchAggregatorConfig) -> Self {
        Self {
            config,
            buffers: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Appends a record, returning a ready-to-flush batch if the partition
    /// crossed its count or byte threshold. A no-op returning `None` once
    /// [`Self::close`] has run.
    pub fn add(&self, topic: &str, partition: i32, record: Record, now: Instant) -> Option<Vec<Record>> {
        self.process_batch(topic, partition, vec![record], now)
    }

    /// Appends every record in `records` to the partition's buffer in one
    /// critical section, returning a ready-to-flush batch if the partition
    /// crossed its count or byte threshold partway through or at the end.
    /// A no-op returning `None` once [`Self::close`] has run.
    pub fn process_batch(
        &self,
        topic: &str,
        partition: i32,
        records: Vec<Record>,
        now: Instant,
    ) -> Option<Vec<Record>> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }

        let mut buffers = self.buffers.lock();
        let key = (topic.to_string(), partition);
        let buffer = buffers
            .entry(key)
            .or_insert_with(|| PartitionBuffer::new(self.config.max_size, now));

        let appended = records.len();
        for record in records {
            buffer.bytes += record.approx_bytes();
            buffer.records.push(record);
        }
        buffer.records_since_raise += appended;

        let hit_ceiling = buffer.records.len() >= self.config.max_size
            || buffer.bytes >= self.config.max_bytes
            || buffer.records.len() as f64 >= buffer.adaptive_target;

        if hit_ceiling {
            self.bump_adaptive_target(buffer);
            let records = std::mem::take(&mut buffer.records);
            buffer.bytes = 0;
            buffer.opened_at = now;
            Some(records)
        } else {
            None
        }
    }

    /// Nudges a partition's adaptive target towards its most recently
    /// observed flush size. The every-five-seconds 10% raise lives in
    /// [`Self::update_metrics`], driven by the linger loop rather than by
    /// each individual flush, so a burst of many small flushes in under
    /// five seconds can't ratchet the target up on its own.
    fn bump_adaptive_target(&self, buffer: &mut PartitionBuffer) {
        let observed = buffer.records.len() as f64;
        buffer.adaptive_target =
            ADAPTIVE_ALPHA * observed + (1.0 - ADAPTIVE_ALPHA) * buffer.adaptive_target;
    }

    /// Raises each partition's adaptive target by 10% if it has been
    /// lingering under load: at least `ADAPTIVE_RAISE_INTERVAL` has
    /// elapsed since the last raise, and the partition actually flushed
    /// records in that window (a partition sitting idle gets no raise,
    /// since there's no observed throughput to size the target against).
    /// Called from [`Self::run_linger_loop`]; also usable standalone in
    /// tests.
    pub fn update_metrics(&self, now: Instant) {
        let mut buffers = self.buffers.lock();
        for buffer in buffers.values_mut() {
            let elapsed = now.duration_since(buffer.last_raise);
            if elapsed < ADAPTIVE_RAISE_INTERVAL {
                continue;
            }

            let throughput = buffer.records_since_raise as f64 / elapsed.as_secs_f64();
            if throughput > 0.0 {
                buffer.adaptive_target = (buffer.adaptive_target * ADAPTIVE_RAISE_FACTOR)
                    .min(self.config.adaptive_max_size as f64);
            }
            buffer.records_since_raise = 0;
            buffer.last_raise = now;
        }
    }

    /// Flushes every partition whose buffer has lingered past
    /// `linger_ms`, regardless of whether it has hit a size threshold.
    pub fn flush_lingering(&self, now: Instant) -> Vec<((String, i32), Vec<Record>)> {
        let mut buffers = self.buffers.lock();
        let mut flushed = Vec::new();
        for (key, buffer) in buffers.iter_mut() {
            if buffer.records.is_empty() {
                continue;
            }
            if now.duration_since(buffer.opened_at) >= self.config.linger {
                let records = std::mem::take(&mut buffer.records);
                buffer.bytes = 0;
                buffer.opened_at = now;
                flushed.push((key.clone(), records));
            }
        }
        flushed
    }

    /// Flushes a single partition's buffer unconditionally, used on
    /// shutdown and leader-change handoff.
    pub fn flush_partition(&self, topic: &str, partition: i32) -> Option<Vec<Record>> {
        let mut buffers = self.buffers.lock();
        let buffer = buffers.get_mut(&(topic.to_string(), partition))?;
        if buffer.records.is_empty() {
            return None;
        }
        buffer.bytes = 0;
        Some(std::mem::take(&mut buffer.records))
    }

    /// Flushes every partition unconditionally.
    pub fn flush_all(&self) -> Vec<((String, i32), Vec<Record>)> {
        let mut buffers = self.buffers.lock();
        buffers
            .iter_mut()
            .filter(|(_, b)| !b.records.is_empty())
            .map(|(key, buffer)| {
                buffer.bytes = 0;
                (key.clone(), std::mem::take(&mut buffer.records))
            })
            .collect()
    }

    /// Stops accepting new records and drains whatever every partition
    /// still had buffered. `add`/`process_batch` calls after this return
    /// `None` instead of silently buffering records [`Self::run_linger_loop`]
    /// will never flush.
    pub fn close(&self) -> Vec<((String, i32), Vec<Record>)> {
        self.closed.store(true, Ordering::Release);
        self.flush_all()
    }

    /// Runs until [`Self::close`] is called, waking every `interval` to
    /// raise adaptive targets and flush partitions that have lingered past
    /// their deadline. `on_flush` is handed each flushed partition's
    /// records so the caller can forward them to storage; meant to be
    /// spawned once at startup and left running for the broker's lifetime,
    /// the same way [`crate::broker::Broker::run_session_sweeper`] is.
    pub async fn run_linger_loop<F>(&self, interval: Duration, mut on_flush: F)
    where
        F: FnMut(String, i32, Vec<Record>),
    {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if self.closed.load(Ordering::Acquire) {
                debug!("batch aggregator closed, stopping linger loop");
                return;
            }

            let now = Instant::now();
            self.update_metrics(now);
            for ((topic, partition), records) in self.flush_lingering(now) {
                on_flush(topic, partition, records);
            }
        }
    }
}
