//! `CreateTopics` request and response (API key 19, versions 0..5).

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
pub struct CreateTopicAssignment {
    pub partition_index: i32,
    pub broker_ids: Vec<i32>,
}

impl<R: Read> ReadVersionedType<R> for CreateTopicAssignment {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            broker_ids: Vec::<i32>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for CreateTopicAssignment {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.partition_index.write(writer)?;
        self.broker_ids.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CreateTopicConfig {
    pub name: String,
    pub value: Option<String>,
}

impl<R: Read> ReadVersionedType<R> for CreateTopicConfig {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            value: Option::<String>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for CreateTopicConfig {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        self.value.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CreateTopicRequest {
    pub name: String,

    /// -1 means either a manual assignment or the default partition count.
    pub num_partitions: i32,

    /// -1 means either a manual assignment or the default replication factor.
    pub replication_factor: i16,
    pub assignments: Vec<CreateTopicAssignment>,
    pub configs: Vec<CreateTopicConfig>,
}

impl<R: Read> ReadVersionedType<R> for CreateTopicRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            num_partitions: i32::read(reader)?,
            replication_factor: i16::read(reader)?,
            assignments: read_versioned_array(reader, version)?.unwrap_or_default(),
            configs: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for CreateTopicRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        self.num_partitions.write(writer)?;
        self.replication_factor.write(writer)?;
        write_versioned_array(writer, version, Some(&self.assignments))?;
        write_versioned_array(writer, version, Some(&self.configs))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CreateTopicsRequest {
    pub topics: Vec<CreateTopicRequest>,
    pub timeout_ms: i32,

    /// Added in version 1.
    pub validate_only: Option<bool>,
}

impl<R: Read> ReadVersionedType<R> for CreateTopicsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 5);
        Ok(Self {
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
            timeout_ms: i32::read(reader)?,
            validate_only: (v >= 1).then(|| bool::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for CreateTopicsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 5);
        write_versioned_array(writer, version, Some(&self.topics))?;
        self.timeout_ms.write(writer)?;
        if v >= 1 {
            self.validate_only.unwrap_or(false).write(writer)?;
        }
        Ok(())
    }
}

impl RequestBody for CreateTopicsRequest {
    type ResponseBody = CreateTopicsResponse;
    const API_KEY: ApiKey = ApiKey::CreateTopics;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 5);
}

#[derive(Debug, PartialEq, Eq)]
pub struct CreateTopicResponseConfig {
    pub name: String,
    pub value: Option<String>,
    pub read_only: bool,
    pub config_source: i8,
    pub is_sensitive: bool,
}

impl<R: Read> ReadVersionedType<R> for CreateTopicResponseConfig {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            value: Option::<String>::read(reader)?,
            read_only: bool::read(reader)?,
            config_source: i8::read(reader)?,
            is_sensitive: bool::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for CreateTopicResponseConfig {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        self.value.write(writer)?;
        self.read_only.write(writer)?;
        self.config_source.write(writer)?;
        self.is_sensitive.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CreateTopicResponse {
    pub name: String,
    pub error_code: Option<ErrorCode>,

    /// Added in version 1.
    pub error_message: Option<String>,

    /// Added in version 5.
    pub num_partitions: Option<i32>,

    /// Added in version 5.
    pub replication_factor: Option<i16>,

    pub configs: Vec<CreateTopicResponseConfig>,
}

impl<R: Read> ReadVersionedType<R> for CreateTopicResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            name: String::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: if v >= 1 {
                Option::<String>::read(reader)?
            } else {
                None
            },
            num_partitions: (v >= 5).then(|| i32::read(reader)).transpose()?,
            replication_factor: (v >= 5).then(|| i16::read(reader)).transpose()?,
            configs: if v >= 5 {
                read_versioned_array(reader, version)?.unwrap_or_default()
            } else {
                vec![]
            },
        })
    }
}

impl<W: Write> WriteVersionedType<W> for CreateTopicResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.name.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        if v >= 1 {
            self.error_message.write(writer)?;
        }
        if v >= 5 {
            self.num_partitions.unwrap_or(-1).write(writer)?;
            self.replication_factor.unwrap_or(-1).write(writer)?;
            write_versioned_array(writer, version, Some(&self.configs))?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CreateTopicsResponse {
    /// Added in version 2.
    pub throttle_time_ms: Option<i32>,
    pub topics: Vec<CreateTopicResponse>,
}

impl<R: Read> ReadVersionedType<R> for CreateTopicsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            throttle_time_ms: (v >= 2).then(|| i32::read(reader)).transpose()?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for CreateTopicsResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        if v >= 2 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}
