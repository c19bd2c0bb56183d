//! Top-level error aggregation.
//!
//! Subsystems get their own `thiserror` enum; this one exists so code that
//! crosses a module boundary (the dispatcher calling into the producer id
//! manager, the transaction coordinator, ...) has a single `Result` type to
//! propagate through, mirroring how `protocol::messages` separates
//! `ReadVersionedError`/`WriteVersionedError` per concern rather than
//! reusing one god enum. Only frame decode failures ever reach a
//! connection driver as a true `Err`; everything else is mapped to a wire
//! [`ErrorCode`](crate::protocol::error_code::ErrorCode) before it leaves
//! the broker.

use thiserror::Error;

use crate::group::GroupError;
use crate::produce_waiter::WaitError;
use crate::protocol::messages::{ReadVersionedError, WriteVersionedError};
use crate::txn::TxnError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BrokerError {
    #[error("failed to decode request: {0}")]
    Decode(#[from] ReadVersionedError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] WriteVersionedError),

    #[error("transaction coordinator error: {0}")]
    Txn(#[from] TxnError),

    #[error("produce wait error: {0}")]
    Wait(#[from] WaitError),

    #[error("consumer group error: {0}")]
    Group(#[from] GroupError),

    #[error("unknown topic or partition: {topic}-{partition}")]
    UnknownTopicOrPartition { topic: String, partition: i32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = BrokerError> = std::result::Result<T, E>;
