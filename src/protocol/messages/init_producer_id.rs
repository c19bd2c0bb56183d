//! `InitProducerId` request and response (API key 22, versions 0..4).
//!
//! Allocates or fences a producer ID/epoch pair for a transactional or
//! idempotent producer.

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct InitProducerIdRequest {
    /// `None` for an idempotent (non-transactional) producer.
    pub transactional_id: Option<String>,
    pub transaction_timeout_ms: i32,

    /// Added in version 2, used to fence a producer retrying after a
    /// network error without minting a brand-new producer ID.
    pub producer_id: Option<i64>,
    pub producer_epoch: Option<i16>,
}

impl<R: Read> ReadVersionedType<R> for InitProducerIdRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 4);
        Ok(Self {
            transactional_id: Option::<String>::read(reader)?,
            transaction_timeout_ms: i32::read(reader)?,
            producer_id: (v >= 2).then(|| i64::read(reader)).transpose()?,
            producer_epoch: (v >= 2).then(|| i16::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for InitProducerIdRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 4);
        self.transactional_id.write(writer)?;
        self.transaction_timeout_ms.write(writer)?;
        if v >= 2 {
            self.producer_id.unwrap_or(-1).write(writer)?;
            self.producer_epoch.unwrap_or(-1).write(writer)?;
        }
        Ok(())
    }
}

impl RequestBody for InitProducerIdRequest {
    type ResponseBody = InitProducerIdResponse;
    const API_KEY: ApiKey = ApiKey::InitProducerId;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 4);
}

#[derive(Debug, PartialEq, Eq)]
pub struct InitProducerIdResponse {
    pub throttle_time_ms: i32,
    pub error_code: Option<ErrorCode>,
    pub producer_id: i64,
    pub producer_epoch: i16,
}

impl<R: Read> ReadVersionedType<R> for InitProducerIdResponse {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            producer_id: i64::read(reader)?,
            producer_epoch: i16::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for InitProducerIdResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.producer_id.write(writer)?;
        self.producer_epoch.write(writer)?;
        Ok(())
    }
}
