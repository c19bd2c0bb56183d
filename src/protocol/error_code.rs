//! Wire-level error codes.
//!
//! Every API response carries `error_code: Option<ErrorCode>` where `None`
//! means `error_code == 0` (`NONE`) on the wire, scoped to the subset of
//! codes this core actually returns.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorCode {
    OffsetOutOfRange,
    UnknownTopicOrPartition,
    NotLeaderForPartition,
    RequestTimeout,
    NotEnoughReplicas,
    TopicAlreadyExists,
    UnsupportedSaslMechanism,
    IllegalGeneration,
    RebalanceInProgress,
    InvalidRequest,
    InvalidProducerEpoch,
    InvalidTxnState,
    InvalidProducerIdMapping,
    SecurityDisabled,
    SaslAuthenticationFailed,
    UnknownMemberId,
    GroupIdNotFound,
    /// Catch-all for codes this core doesn't construct itself but must be
    /// able to round-trip (e.g. read back from a conformance test vector).
    Other(i16),
}

impl ErrorCode {
    pub fn code(self) -> i16 {
        match self {
            Self::OffsetOutOfRange => 1,
            Self::UnknownTopicOrPartition => 3,
            Self::NotLeaderForPartition => 6,
            Self::RequestTimeout => 7,
            Self::NotEnoughReplicas => 19,
            Self::IllegalGeneration => 22,
            Self::RebalanceInProgress => 27,
            Self::UnsupportedSaslMechanism => 33,
            Self::TopicAlreadyExists => 36,
            Self::InvalidRequest => 42,
            Self::InvalidProducerEpoch => 47,
            Self::InvalidTxnState => 48,
            Self::InvalidProducerIdMapping => 49,
            Self::SecurityDisabled => 54,
            Self::SaslAuthenticationFailed => 58,
            Self::UnknownMemberId => 25,
            Self::GroupIdNotFound => 69,
            Self::Other(code) => code,
        }
    }

    /// Maps a wire code back to `None` (`NONE`) or `Some(ErrorCode)`.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(Self::OffsetOutOfRange),
            3 => Some(Self::UnknownTopicOrPartition),
            6 => Some(Self::NotLeaderForPartition),
            7 => Some(Self::RequestTimeout),
            19 => Some(Self::NotEnoughReplicas),
            22 => Some(Self::IllegalGeneration),
            25 => Some(Self::UnknownMemberId),
            27 => Some(Self::RebalanceInProgress),
            33 => Some(Self::UnsupportedSaslMechanism),
            36 => Some(Self::TopicAlreadyExists),
            42 => Some(Self::InvalidRequest),
            47 => Some(Self::InvalidProducerEpoch),
            48 => Some(Self::InvalidTxnState),
            49 => Some(Self::InvalidProducerIdMapping),
            54 => Some(Self::SecurityDisabled),
            58 => Some(Self::SaslAuthenticationFailed),
            69 => Some(Self::GroupIdNotFound),
            other => Some(Self::Other(other)),
        }
    }

    /// Writes `Option<ErrorCode>` as the `int16` the wire expects, `0` for `None`.
    pub fn write_code(code: Option<Self>) -> i16 {
        code.map(Self::code).unwrap_or(0)
    }
}
