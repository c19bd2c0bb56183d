//! Producer id allocation and epoch fencing.
//!
//! One monotonic counter for the whole broker; every `InitProducerId` call
//! either mints a fresh id or, for a known transactional id, bumps that
//! id's epoch. There is no per-id lock: the whole table sits behind one
//! `parking_lot::Mutex`, and every operation is cheap enough that holding
//! it for the duration is not a contention risk.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

const FIRST_PRODUCER_ID: i64 = 1000;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProducerIdError {
    #[error("producer epoch would overflow for transactional id {transactional_id}")]
    EpochOverflow { transactional_id: String },
}

pub type Result<T, E = ProducerIdError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registration {
    producer_id: i64,
    producer_epoch: i16,
}

#[derive(Debug)]
struct Inner {
    next_producer_id: i64,
    by_transactional_id: HashMap<String, Registration>,
}

/// Hands out producer ids and fences stale producers by bumping epochs.
#[derive(Debug)]
pub struct ProducerIdManager {
    inner: Mutex<Inner>,
}

impl Default for ProducerIdManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProducerIdManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_producer_id: FIRST_PRODUCER_ID,
                by_transactional_id: HashMap::new(),
            }),
        }
    }

    /// Idempotent producers (`transactional_id: None`) always get a brand
    /// new id at epoch 0: there's no earlier registration to fence against.
    /// Transactional producers re-initializing an existing transactional
    /// id instead keep their id and get their epoch bumped, fencing out any
    /// producer still holding the previous epoch.
    pub fn get_or_create_producer_id(
        &self,
        transactional_id: Option<&str>,
    ) -> Result<(i64, i16)> {
        let mut inner = self.inner.lock();

        let Some(transactional_id) = transactional_id else {
            let id = inner.next_producer_id;
            inner.next_producer_id += 1;
            return Ok((id, 0));
        };

        match inner.by_transactional_id.get(transactional_id).copied() {
            Some(reg) => {
                let next_epoch =
                    reg.producer_epoch
                        .checked_add(1)
                        .ok_or_else(|| ProducerIdError::EpochOverflow {
                            transactional_id: transactional_id.to_string(),
                        })?;
                let updated = Registration {
                    producer_id: reg.producer_id,
                    producer_epoch: next_epoch,
                };
                inner
                    .by_transactional_id
                    .insert(transactional_id.to_string(), updated);
                Ok((updated.producer_id, updated.producer_epoch))
            }
            None => {
                let id = inner.next_producer_id;
                inner.next_producer_id += 1;
                inner
                    .by_transactional_id
                    .insert(transactional_id.to_string(), Registration {
                        producer_id: id,
                        producer_epoch: 0,
                    });
                Ok((id, 0))
            }
        }
    }

    /// Whether `(producer_id, producer_epoch)` is still the current epoch
    /// for `transactional_id`, used by the transaction coordinator's
    /// gating cascade.
    pub fn is_current(&self, transactional_id: &str, producer_id: i64, producer_epoch: i16) -> bool {
        self.inner
            .lock()
            .by_transactional_id
            .get(transactional_id)
            .is_some_and(|reg| reg.producer_id == producer_id && reg.producer_epoch == producer_epoch)
    }
}
