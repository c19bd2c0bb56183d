//! `OffsetFetch` request and response (API key 9, versions 0..7).

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
pub struct OffsetFetchRequestTopic {
    pub name: String,
    pub partition_indexes: Vec<i32>,
}

impl<R: Read> ReadVersionedType<R> for OffsetFetchRequestTopic {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partition_indexes: Vec::<i32>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for OffsetFetchRequestTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        self.partition_indexes.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct OffsetFetchRequest {
    pub group_id: String,

    /// `None` fetches offsets for every topic the group has committed.
    pub topics: Option<Vec<OffsetFetchRequestTopic>>,

    /// Added in version 7.
    pub require_stable: Option<bool>,
}

impl<R: Read> ReadVersionedType<R> for OffsetFetchRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 7);
        Ok(Self {
            group_id: String::read(reader)?,
            topics: read_versioned_array(reader, version)?,
            require_stable: (v >= 7).then(|| bool::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for OffsetFetchRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 7);
        self.group_id.write(writer)?;
        write_versioned_array(writer, version, self.topics.as_deref())?;
        if v >= 7 {
            self.require_stable.unwrap_or(false).write(writer)?;
        }
        Ok(())
    }
}

impl RequestBody for OffsetFetchRequest {
    type ResponseBody = OffsetFetchResponse;
    const API_KEY: ApiKey = ApiKey::OffsetFetch;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 7);
}

#[derive(Debug, PartialEq, Eq)]
pub struct OffsetFetchResponseTopicPartition {
    pub partition_index: i32,
    pub committed_offset: i64,

    /// Added in version 5.
    pub committed_leader_epoch: i32,
    pub metadata: Option<String>,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for OffsetFetchResponseTopicPartition {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            partition_index: i32::read(reader)?,
            committed_offset: i64::read(reader)?,
            committed_leader_epoch: if v >= 5 { i32::read(reader)? } else { -1 },
            metadata: Option::<String>::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for OffsetFetchResponseTopicPartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.partition_index.write(writer)?;
        self.committed_offset.write(writer)?;
        if v >= 5 {
            self.committed_leader_epoch.write(writer)?;
        }
        self.metadata.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct OffsetFetchResponseTopic {
    pub name: String,
    pub partitions: Vec<OffsetFetchResponseTopicPartition>,
}

impl<R: Read> ReadVersionedType<R> for OffsetFetchResponseTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for OffsetFetchResponseTopic {
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
pub struct OffsetFetchResponse {
    /// Added in version 3.
    pub throttle_time_ms: Option<i32>,
    pub topics: Vec<OffsetFetchResponseTopic>,

    /// Added in version 2.
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for OffsetFetchResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 7);
        Ok(Self {
            throttle_time_ms: (v >= 3).then(|| i32::read(reader)).transpose()?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
            error_code: if v >= 2 {
                ErrorCode::from_code(i16::read(reader)?)
            } else {
                None
            },
        })
    }
}

impl<W: Write> WriteVersionedType<W> for OffsetFetchResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        if v >= 3 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.topics))?;
        if v >= 2 {
            ErrorCode::write_code(self.error_code).write(writer)?;
        }
        Ok(())
    }
}
