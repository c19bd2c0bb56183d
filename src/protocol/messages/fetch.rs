//! `Fetch` request and response (API key 1, version 4 only).
//!
//! Only message version 2 record batches ([KIP-98]) are in scope,
//! which is why this core only speaks fetch version 4 and later — earlier
//! versions predate that format. `records` is carried as an opaque blob;
//! parsing `RecordBatch` framing is left to the log store.
//!
//! [KIP-98]: https://cwiki.apache.org/confluence/display/KAFKA/KIP-98+-+Exactly+Once+Delivery+and+Transactional+Messaging

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    read_versioned_array, write_versioned_array, IsolationLevel, ReadVersionedError,
    ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct FetchRequestPartition {
    pub partition: i32,
    pub fetch_offset: i64,
    pub partition_max_bytes: i32,
}

impl<R: Read> ReadVersionedType<R> for FetchRequestPartition {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition: i32::read(reader)?,
            fetch_offset: i64::read(reader)?,
            partition_max_bytes: i32::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for FetchRequestPartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.partition.write(writer)?;
        self.fetch_offset.write(writer)?;
        self.partition_max_bytes.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FetchRequestTopic {
    pub topic: String,
    pub partitions: Vec<FetchRequestPartition>,
}

impl<R: Read> ReadVersionedType<R> for FetchRequestTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            topic: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for FetchRequestTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.topic.write(writer)?;
        write_versioned_array(writer, version, Some(&self.partitions))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// `-1` when the request comes from a normal consumer.
    pub replica_id: i32,
    pub max_wait_ms: i32,
    pub min_bytes: i32,
    pub max_bytes: Option<i32>,
    pub isolation_level: Option<IsolationLevel>,
    pub topics: Vec<FetchRequestTopic>,
}

impl<R: Read> ReadVersionedType<R> for FetchRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v == 4);
        Ok(Self {
            replica_id: i32::read(reader)?,
            max_wait_ms: i32::read(reader)?,
            min_bytes: i32::read(reader)?,
            max_bytes: Some(i32::read(reader)?),
            isolation_level: Some(IsolationLevel::from_i8(i8::read(reader)?)),
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for FetchRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v == 4);
        self.replica_id.write(writer)?;
        self.max_wait_ms.write(writer)?;
        self.min_bytes.write(writer)?;
        self.max_bytes.unwrap_or(i32::MAX).write(writer)?;
        let level: i8 = self.isolation_level.unwrap_or_default().into();
        level.write(writer)?;
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}

impl RequestBody for FetchRequest {
    type ResponseBody = FetchResponse;
    const API_KEY: ApiKey = ApiKey::Fetch;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(4, 4);
}

#[derive(Debug, PartialEq, Eq)]
pub struct FetchResponseAbortedTransaction {
    pub producer_id: i64,
    pub first_offset: i64,
}

impl<R: Read> ReadVersionedType<R> for FetchResponseAbortedTransaction {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            producer_id: i64::read(reader)?,
            first_offset: i64::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for FetchResponseAbortedTransaction {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.producer_id.write(writer)?;
        self.first_offset.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FetchResponsePartition {
    pub partition_index: i32,
    pub error_code: Option<ErrorCode>,
    pub high_watermark: i64,

    /// The last offset whose preceding transactional records have all been
    /// decided (committed or aborted).
    pub last_stable_offset: i64,
    pub aborted_transactions: Vec<FetchResponseAbortedTransaction>,

    /// Opaque `RecordBatch` v2 bytes; parsed by the log store, not here.
    pub records: Vec<u8>,
}

impl<R: Read> ReadVersionedType<R> for FetchResponsePartition {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            high_watermark: i64::read(reader)?,
            last_stable_offset: i64::read(reader)?,
            aborted_transactions: read_versioned_array(reader, version)?.unwrap_or_default(),
            records: Vec::<u8>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for FetchResponsePartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.partition_index.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.high_watermark.write(writer)?;
        self.last_stable_offset.write(writer)?;
        write_versioned_array(writer, version, Some(&self.aborted_transactions))?;
        self.records.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FetchResponseTopic {
    pub topic: String,
    pub partitions: Vec<FetchResponsePartition>,
}

impl<R: Read> ReadVersionedType<R> for FetchResponseTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            topic: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for FetchResponseTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.topic.write(writer)?;
        write_versioned_array(writer, version, Some(&self.partitions))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub throttle_time_ms: i32,
    pub responses: Vec<FetchResponseTopic>,
}

impl<R: Read> ReadVersionedType<R> for FetchResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            responses: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for FetchResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        write_versioned_array(writer, version, Some(&self.responses))?;
        Ok(())
    }
}
