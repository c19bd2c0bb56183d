//! `AddPartitionsToTxn` request and response (API key 24, versions 0..3).
//!
//! Adds partitions to an ongoing transaction so that the transaction
//! coordinator knows which logs need an abort/commit marker at `EndTxn`
//! time.

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    read_versioned_array, write_versioned_array, ReadVersionedError, ReadVersionedType,
    RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct AddPartitionsToTxnTopic {
    pub name: String,
    pub partitions: Vec<i32>,
}

impl<R: Read> ReadVersionedType<R> for AddPartitionsToTxnTopic {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: Vec::<i32>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AddPartitionsToTxnTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        self.partitions.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AddPartitionsToTxnRequest {
    pub transactional_id: String,
    pub producer_id: i64,
    pub producer_epoch: i16,
    pub topics: Vec<AddPartitionsToTxnTopic>,
}

impl<R: Read> ReadVersionedType<R> for AddPartitionsToTxnRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 3);
        Ok(Self {
            transactional_id: String::read(reader)?,
            producer_id: i64::read(reader)?,
            producer_epoch: i16::read(reader)?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AddPartitionsToTxnRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 3);
        self.transactional_id.write(writer)?;
        self.producer_id.write(writer)?;
        self.producer_epoch.write(writer)?;
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}

impl RequestBody for AddPartitionsToTxnRequest {
    type ResponseBody = AddPartitionsToTxnResponse;
    const API_KEY: ApiKey = ApiKey::AddPartitionsToTxn;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 3);
}

#[derive(Debug, PartialEq, Eq)]
pub struct AddPartitionsToTxnPartitionResult {
    pub partition_index: i32,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for AddPartitionsToTxnPartitionResult {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AddPartitionsToTxnPartitionResult {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.partition_index.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AddPartitionsToTxnTopicResult {
    pub name: String,
    pub results: Vec<AddPartitionsToTxnPartitionResult>,
}

impl<R: Read> ReadVersionedType<R> for AddPartitionsToTxnTopicResult {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            results: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AddPartitionsToTxnTopicResult {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        write_versioned_array(writer, version, Some(&self.results))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AddPartitionsToTxnResponse {
    pub throttle_time_ms: i32,
    pub results: Vec<AddPartitionsToTxnTopicResult>,
}

impl<R: Read> ReadVersionedType<R> for AddPartitionsToTxnResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            results: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AddPartitionsToTxnResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        write_versioned_array(writer, version, Some(&self.results))?;
        Ok(())
    }
}
