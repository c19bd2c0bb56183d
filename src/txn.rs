//! Transaction coordinator.
//!
//! One state machine per transactional id, all behind a single
//! `parking_lot::Mutex`: transaction volume is orders of magnitude lower
//! than produce volume, so a single lock never becomes the bottleneck, and
//! it keeps the gating cascade below trivially linearizable.
//!
//! Every entry point runs the same fencing cascade before touching state:
//! unknown transactional id, then producer id mismatch, then epoch
//! mismatch, then state mismatch. Get the order wrong and a fenced-out
//! producer can see `InvalidTxnState` instead of `InvalidProducerEpoch`,
//! which is the wrong signal for a client deciding whether to retry.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use thiserror::Error;

use crate::protocol::error_code::ErrorCode;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TxnError {
    #[error("{0:?}")]
    Wire(ErrorCode),
}

pub type Result<T, E = TxnError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    Empty,
    Ongoing,
    PrepareCommit,
    PrepareAbort,
    CompleteCommit,
    CompleteAbort,
    Dead,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

#[derive(Debug)]
struct Metadata {
    producer_id: i64,
    producer_epoch: i16,
    state: TxnState,
    partitions: HashSet<TopicPartition>,
    pending_group_offset_commits: Vec<String>,
}

impl Metadata {
    fn new(producer_id: i64, producer_epoch: i16) -> Self {
        Self {
            producer_id,
            producer_epoch,
            state: TxnState::Empty,
            partitions: HashSet::new(),
            pending_group_offset_commits: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct TransactionCoordinator {
    by_transactional_id: Mutex<HashMap<String, Metadata>>,
}

impl TransactionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an existing transactional id's metadata, rejecting one
    /// this coordinator has never seen with `InvalidProducerIdMapping`
    /// rather than fabricating a fresh entry for it. Only
    /// [`Self::add_partitions`] is allowed to create metadata lazily: it is
    /// the request that actually opens a transaction, and anything else
    /// arriving for an id with no open transaction is a client error, not
    /// an implicit `Empty` one to fence against.
    fn gate<'a>(
        metas: &'a mut HashMap<String, Metadata>,
        transactional_id: &str,
        producer_id: i64,
        producer_epoch: i16,
        allowed: &[TxnState],
    ) -> Result<&'a mut Metadata> {
        let meta = metas
            .get_mut(transactional_id)
            .ok_or(TxnError::Wire(ErrorCode::InvalidProducerIdMapping))?;
        Self::check_fencing(meta, producer_id, producer_epoch, allowed)
    }

    fn gate_or_create<'a>(
        metas: &'a mut HashMap<String, Metadata>,
        transactional_id: &str,
        producer_id: i64,
        producer_epoch: i16,
        allowed: &[TxnState],
    ) -> Result<&'a mut Metadata> {
        let meta = metas
            .entry(transactional_id.to_string())
            .or_insert_with(|| Metadata::new(producer_id, producer_epoch));
        Self::check_fencing(meta, producer_id, producer_epoch, allowed)
    }

    fn check_fencing(
        meta: &mut Metadata,
        producer_id: i64,
        producer_epoch: i16,
        allowed: &[TxnState],
    ) -> Result<&mut Metadata> {
        if meta.producer_id != producer_id {
            return Err(TxnError::Wire(ErrorCode::InvalidProducerIdMapping));
        }
        if meta.producer_epoch != producer_epoch {
            return Err(TxnError::Wire(ErrorCode::InvalidProducerEpoch));
        }
        if meta.state == TxnState::Dead || !allowed.contains(&meta.state) {
            return Err(TxnError::Wire(ErrorCode::InvalidTxnState));
        }
        Ok(meta)
    }

    /// Registers partitions as part of the current transaction, starting
    /// it if it was `Empty`. Re-adding an already-registered partition is a
    /// no-op, not an error.
    pub fn add_partitions(
        &self,
        transactional_id: &str,
        producer_id: i64,
        producer_epoch: i16,
        partitions: impl IntoIterator<Item = TopicPartition>,
    ) -> Result<()> {
        let mut metas = self.by_transactional_id.lock();
        let meta = Self::gate_or_create(
            &mut metas,
            transactional_id,
            producer_id,
            producer_epoch,
            &[TxnState::Empty, TxnState::Ongoing],
        )?;
        meta.state = TxnState::Ongoing;
        meta.partitions.extend(partitions);
        Ok(())
    }

    pub fn add_offsets_to_txn(
        &self,
        transactional_id: &str,
        producer_id: i64,
        producer_epoch: i16,
        group_id: &str,
    ) -> Result<()> {
        let mut metas = self.by_transactional_id.lock();
        let meta = Self::gate(
            &mut metas,
            transactional_id,
            producer_id,
            producer_epoch,
            &[TxnState::Empty, TxnState::Ongoing],
        )?;
        meta.state = TxnState::Ongoing;
        if !meta
            .pending_group_offset_commits
            .iter()
            .any(|g| g == group_id)
        {
            meta.pending_group_offset_commits.push(group_id.to_string());
        }
        Ok(())
    }

    /// Records that `group_id`'s offsets were committed under this
    /// transaction. Offsets themselves are persisted by the group
    /// coordinator at `TxnOffsetCommit` time; this only confirms the
    /// transaction is still open to cover them; those offsets only become
    /// visible to other consumers once `EndTransaction` commits.
    pub fn commit_offsets_in_transaction(
        &self,
        transactional_id: &str,
        producer_id: i64,
        producer_epoch: i16,
        group_id: &str,
    ) -> Result<()> {
        let metas = self.by_transactional_id.lock();
        let meta = metas
            .get(transactional_id)
            .ok_or(TxnError::Wire(ErrorCode::InvalidProducerIdMapping))?;

        if meta.producer_id != producer_id {
            return Err(TxnError::Wire(ErrorCode::InvalidProducerIdMapping));
        }
        if meta.producer_epoch != producer_epoch {
            return Err(TxnError::Wire(ErrorCode::InvalidProducerEpoch));
        }
        if meta.state != TxnState::Ongoing
            || !meta
                .pending_group_offset_commits
                .iter()
                .any(|g| g == group_id)
        {
            return Err(TxnError::Wire(ErrorCode::InvalidTxnState));
        }
        Ok(())
    }

    /// Moves the transaction to its terminal state and hands back the
    /// partitions the write-marker fanout must cover.
    pub fn end_transaction(
        &self,
        transactional_id: &str,
        producer_id: i64,
        producer_epoch: i16,
        committed: bool,
    ) -> Result<Vec<TopicPartition>> {
        let mut metas = self.by_transactional_id.lock();
        let meta = Self::gate(
            &mut metas,
            transactional_id,
            producer_id,
            producer_epoch,
            &[TxnState::Ongoing],
        )?;

        meta.state = if committed {
            TxnState::PrepareCommit
        } else {
            TxnState::PrepareAbort
        };
        let partitions: Vec<_> = meta.partitions.drain().collect();
        meta.state = if committed {
            TxnState::CompleteCommit
        } else {
            TxnState::CompleteAbort
        };
        meta.pending_group_offset_commits.clear();
        Ok(partitions)
    }
}
