//! `DescribeLogDirs` request and response (API key 35, versions 0..4).
//!
//! Out-of-scope admin API: request/response shape only, this core does
//! not expose its on-disk layout as multiple log directories.

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
pub struct DescribableLogDirTopic {
    pub topic: String,
    pub partitions: Vec<i32>,
}

impl<R: Read> ReadVersionedType<R> for DescribableLogDirTopic {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            topic: String::read(reader)?,
            partitions: Vec::<i32>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribableLogDirTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.topic.write(writer)?;
        self.partitions.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeLogDirsRequest {
    /// `None` requests every log directory's full contents.
    pub topics: Option<Vec<DescribableLogDirTopic>>,
}

impl<R: Read> ReadVersionedType<R> for DescribeLogDirsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 4);
        Ok(Self {
            topics: read_versioned_array(reader, version)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeLogDirsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 4);
        write_versioned_array(writer, version, self.topics.as_deref())?;
        Ok(())
    }
}

impl RequestBody for DescribeLogDirsRequest {
    type ResponseBody = DescribeLogDirsResponse;
    const API_KEY: ApiKey = ApiKey::DescribeLogDirs;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 4);
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeLogDirsPartition {
    pub partition_index: i32,
    pub partition_size: i64,
    pub offset_lag: i64,
    pub is_future_key: bool,
}

impl<R: Read> ReadVersionedType<R> for DescribeLogDirsPartition {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            partition_size: i64::read(reader)?,
            offset_lag: i64::read(reader)?,
            is_future_key: bool::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeLogDirsPartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.partition_index.write(writer)?;
        self.partition_size.write(writer)?;
        self.offset_lag.write(writer)?;
        self.is_future_key.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeLogDirsTopic {
    pub name: String,
    pub partitions: Vec<DescribeLogDirsPartition>,
}

impl<R: Read> ReadVersionedType<R> for DescribeLogDirsTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeLogDirsTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        write_versioned_array(writer, version, Some(&self.partitions))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeLogDirsResult {
    pub error_code: Option<ErrorCode>,
    pub log_dir: String,
    pub topics: Vec<DescribeLogDirsTopic>,
}

impl<R: Read> ReadVersionedType<R> for DescribeLogDirsResult {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            log_dir: String::read(reader)?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeLogDirsResult {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.log_dir.write(writer)?;
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeLogDirsResponse {
    pub throttle_time_ms: i32,
    pub results: Vec<DescribeLogDirsResult>,
}

impl<R: Read> ReadVersionedType<R> for DescribeLogDirsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            results: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeLogDirsResponse {
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
