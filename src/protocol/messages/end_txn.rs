//! `EndTxn` request and response (API key 26, versions 0..3).
//!
//! Commits or aborts the transaction identified by `(producer_id,
//! producer_epoch)`, driving the transaction state machine's terminal
//! transition.

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct EndTxnRequest {
    pub transactional_id: String,
    pub producer_id: i64,
    pub producer_epoch: i16,

    /// `true` commits, `false` aborts.
    pub committed: bool,
}

impl<R: Read> ReadVersionedType<R> for EndTxnRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 3);
        Ok(Self {
            transactional_id: String::read(reader)?,
            producer_id: i64::read(reader)?,
            producer_epoch: i16::read(reader)?,
            committed: bool::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for EndTxnRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 3);
        self.transactional_id.write(writer)?;
        self.producer_id.write(writer)?;
        self.producer_epoch.write(writer)?;
        self.committed.write(writer)?;
        Ok(())
    }
}

impl RequestBody for EndTxnRequest {
    type ResponseBody = EndTxnResponse;
    const API_KEY: ApiKey = ApiKey::EndTxn;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 3);
}

#[derive(Debug, PartialEq, Eq)]
pub struct EndTxnResponse {
    pub throttle_time_ms: i32,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for EndTxnResponse {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for EndTxnResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        Ok(())
    }
}
