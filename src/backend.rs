//! Storage backend abstraction.
//!
//! The broker's core logic (dispatcher, ISR engine, batch aggregator)
//! never talks to a log store directly; it goes through [`Backend`], whose
//! capability set is fixed at construction and never switches at runtime.
//! `DirectBackend` appends straight to the local log; `ConsensusBackend`
//! submits through a replication log and only reports success once the
//! write has committed there. Both are `async_trait` since both do I/O,
//! and a consensus submit in particular can take arbitrarily long.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("topic {0} already exists")]
    TopicAlreadyExists(String),

    #[error("unknown topic or partition: {topic}-{partition}")]
    UnknownTopicOrPartition { topic: String, partition: i32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

/// The offset an append landed at, and the partition's resulting LEO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendResult {
    pub base_offset: i64,
    pub leo: i64,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_topic(&self, name: &str, partitions: i32, replicas: Vec<i32>) -> Result<()>;

    async fn delete_topic(&self, name: &str) -> Result<()>;

    async fn get_topic(&self, name: &str) -> Option<std::sync::Arc<crate::topic::Topic>>;

    async fn list_topics(&self) -> Vec<std::sync::Arc<crate::topic::Topic>>;

    async fn append(&self, topic: &str, partition: i32, records: Vec<u8>) -> Result<AppendResult>;

    async fn append_batch(
        &self,
        topic: &str,
        partition: i32,
        batches: Vec<Vec<u8>>,
    ) -> Result<AppendResult>;

    /// Raw, file-backed spans covering a fetch's record bytes starting at
    /// `offset`, for backends whose log segments live on disk. The default
    /// returns nothing, which sends the fetch path back to the ordinary
    /// encoder; a backend only needs to override this if it wants its
    /// fetches to go out through `sendfile`.
    async fn fetch_segment_spans(
        &self,
        _topic: &str,
        _partition: i32,
        _offset: i64,
        _max_bytes: i32,
    ) -> Result<Vec<crate::fetch::SegmentSpan>> {
        Ok(Vec::new())
    }
}

/// Appends straight to the broker's own log store; used when this broker
/// is the sole writer (no external consensus layer in front of it).
pub struct DirectBackend {
    topics: parking_lot::RwLock<std::collections::HashMap<String, std::sync::Arc<crate::topic::Topic>>>,
}

impl Default for DirectBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectBackend {
    pub fn new() -> Self {
        Self {
            topics: parking_lot::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

#[async_trait]
impl Backend for DirectBackend {
    async fn create_topic(&self, name: &str, partitions: i32, replicas: Vec<i32>) -> Result<()> {
        let mut topics = self.topics.write();
        if topics.contains_key(name) {
            return Err(BackendError::TopicAlreadyExists(name.to_string()));
        }

        let mut topic = crate::topic::Topic::new(name);
        for index in 0..partitions {
            topic.partitions.insert(
                index,
                crate::topic::Partition::new(
                    *replicas.first().unwrap_or(&0),
                    replicas.clone(),
                    10_000,
                ),
            );
        }
        topics.insert(name.to_string(), std::sync::Arc::new(topic));
        Ok(())
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        self.topics.write().remove(name);
        Ok(())
    }

    async fn get_topic(&self, name: &str) -> Option<std::sync::Arc<crate::topic::Topic>> {
        self.topics.read().get(name).cloned()
    }

    async fn list_topics(&self) -> Vec<std::sync::Arc<crate::topic::Topic>> {
        self.topics.read().values().cloned().collect()
    }

    async fn append(&self, topic: &str, partition: i32, records: Vec<u8>) -> Result<AppendResult> {
        self.append_batch(topic, partition, vec![records]).await
    }

    async fn append_batch(
        &self,
        topic: &str,
        partition: i32,
        batches: Vec<Vec<u8>>,
    ) -> Result<AppendResult> {
        let topics = self.topics.read();
        let t = topics
            .get(topic)
            .ok_or_else(|| BackendError::UnknownTopicOrPartition {
                topic: topic.to_string(),
                partition,
            })?;
        let p = t
            .partitions
            .get(&partition)
            .ok_or_else(|| BackendError::UnknownTopicOrPartition {
                topic: topic.to_string(),
                partition,
            })?;

        let base_offset = p.leo();
        let appended_records: usize = batches.iter().map(|_| 1).sum();
        let leo = base_offset + appended_records as i64;
        p.advance_leo(leo);
        Ok(AppendResult { base_offset, leo })
    }
}
