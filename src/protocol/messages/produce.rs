//! `Produce` request and response (API key 0, versions 0..9).

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::traits::{ReadType, WriteType};

use super::{
    read_versioned_array, write_versioned_array, ReadVersionedError, ReadVersionedType,
    RequestBody, WriteVersionedError, WriteVersionedType,
};

#[derive(Debug, PartialEq, Eq)]
pub struct ProduceRequestPartitionData {
    pub index: i32,

    /// Opaque record-batch bytes. Parsing this (CRC, varints, compression)
    /// is delegated to the log store — out of scope for this core.
    pub records: Vec<u8>,
}

impl<W: Write> WriteVersionedType<W> for ProduceRequestPartitionData {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.index.write(writer)?;
        self.records.write(writer)?;
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for ProduceRequestPartitionData {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            index: i32::read(reader)?,
            records: Vec::<u8>::read(reader)?,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ProduceRequestTopicData {
    pub name: String,
    pub partition_data: Vec<ProduceRequestPartitionData>,
}

impl<W: Write> WriteVersionedType<W> for ProduceRequestTopicData {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        write_versioned_array(writer, version, Some(&self.partition_data))?;
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for ProduceRequestTopicData {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partition_data: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ProduceRequest {
    /// Added in version 3; `None` for non-transactional producers.
    pub transactional_id: Option<String>,

    /// `-1` = all ISR, `0` = no ack required, `1` = leader-only ack.
    pub acks: i16,

    pub timeout_ms: i32,

    pub topic_data: Vec<ProduceRequestTopicData>,
}

impl<W: Write> WriteVersionedType<W> for ProduceRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 9);

        if v >= 3 {
            self.transactional_id.write(writer)?;
        }
        self.acks.write(writer)?;
        self.timeout_ms.write(writer)?;
        write_versioned_array(writer, version, Some(&self.topic_data))?;

        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for ProduceRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 9);

        let transactional_id = if v >= 3 {
            Option::<String>::read(reader)?
        } else {
            None
        };
        let acks = i16::read(reader)?;
        let timeout_ms = i32::read(reader)?;
        let topic_data = read_versioned_array(reader, version)?.unwrap_or_default();

        Ok(Self {
            transactional_id,
            acks,
            timeout_ms,
            topic_data,
        })
    }
}

impl RequestBody for ProduceRequest {
    type ResponseBody = ProduceResponse;
    const API_KEY: ApiKey = ApiKey::Produce;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 9);
}

#[derive(Debug, PartialEq, Eq)]
pub struct ProduceResponsePartition {
    pub index: i32,
    pub error_code: Option<ErrorCode>,
    pub base_offset: i64,

    /// Added in version 2.
    pub log_append_time_ms: Option<i64>,

    /// Added in version 5.
    pub log_start_offset: Option<i64>,
}

impl<R: Read> ReadVersionedType<R> for ProduceResponsePartition {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            index: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            base_offset: i64::read(reader)?,
            log_append_time_ms: (v >= 2).then(|| i64::read(reader)).transpose()?,
            log_start_offset: (v >= 5).then(|| i64::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ProduceResponsePartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.index.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.base_offset.write(writer)?;
        if v >= 2 {
            self.log_append_time_ms.unwrap_or(-1).write(writer)?;
        }
        if v >= 5 {
            self.log_start_offset.unwrap_or(-1).write(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ProduceResponseTopic {
    pub name: String,
    pub partition_responses: Vec<ProduceResponsePartition>,
}

impl<R: Read> ReadVersionedType<R> for ProduceResponseTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partition_responses: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ProduceResponseTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        write_versioned_array(writer, version, Some(&self.partition_responses))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ProduceResponse {
    pub responses: Vec<ProduceResponseTopic>,

    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
}

impl<R: Read> ReadVersionedType<R> for ProduceResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            responses: read_versioned_array(reader, version)?.unwrap_or_default(),
            throttle_time_ms: (v >= 1).then(|| i32::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ProduceResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        write_versioned_array(writer, version, Some(&self.responses))?;
        if v >= 1 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        Ok(())
    }
}
