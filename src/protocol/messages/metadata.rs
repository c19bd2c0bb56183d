//! `Metadata` request and response (API key 3, versions 0..4).

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
pub struct MetadataRequestTopic {
    pub name: String,
}

impl<W: Write> WriteVersionedType<W> for MetadataRequestTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for MetadataRequestTopic {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MetadataRequest {
    /// `None` requests metadata for every topic the broker knows about.
    pub topics: Option<Vec<MetadataRequestTopic>>,

    /// Added in version 4.
    pub allow_auto_topic_creation: Option<bool>,
}

impl<W: Write> WriteVersionedType<W> for MetadataRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 4);

        write_versioned_array(writer, version, self.topics.as_deref())?;
        if v >= 4 {
            self.allow_auto_topic_creation.unwrap_or(true).write(writer)?;
        }
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for MetadataRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 4);

        let topics = read_versioned_array(reader, version)?;
        let allow_auto_topic_creation = if v >= 4 {
            Some(bool::read(reader)?)
        } else {
            None
        };

        Ok(Self {
            topics,
            allow_auto_topic_creation,
        })
    }
}

impl RequestBody for MetadataRequest {
    type ResponseBody = MetadataResponse;
    const API_KEY: ApiKey = ApiKey::Metadata;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 4);
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MetadataResponseBroker {
    pub node_id: i32,
    pub host: String,
    pub port: i32,

    /// Added in version 1.
    pub rack: Option<String>,
}

impl<R: Read> ReadVersionedType<R> for MetadataResponseBroker {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            node_id: i32::read(reader)?,
            host: String::read(reader)?,
            port: i32::read(reader)?,
            rack: (v >= 1).then(|| Option::<String>::read(reader)).transpose()?.flatten(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for MetadataResponseBroker {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.node_id.write(writer)?;
        self.host.write(writer)?;
        self.port.write(writer)?;
        if v >= 1 {
            self.rack.write(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MetadataResponsePartition {
    pub error_code: Option<ErrorCode>,
    pub partition_index: i32,
    pub leader_id: i32,
    pub replica_nodes: Vec<i32>,
    pub isr_nodes: Vec<i32>,
}

impl<R: Read> ReadVersionedType<R> for MetadataResponsePartition {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            partition_index: i32::read(reader)?,
            leader_id: i32::read(reader)?,
            replica_nodes: Vec::<i32>::read(reader)?,
            isr_nodes: Vec::<i32>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for MetadataResponsePartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.partition_index.write(writer)?;
        self.leader_id.write(writer)?;
        self.replica_nodes.write(writer)?;
        self.isr_nodes.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MetadataResponseTopic {
    pub error_code: Option<ErrorCode>,
    pub name: String,

    /// Added in version 1.
    pub is_internal: Option<bool>,

    pub partitions: Vec<MetadataResponsePartition>,
}

impl<R: Read> ReadVersionedType<R> for MetadataResponseTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            name: String::read(reader)?,
            is_internal: (v >= 1).then(|| bool::read(reader)).transpose()?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for MetadataResponseTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.name.write(writer)?;
        if v >= 1 {
            self.is_internal.unwrap_or(false).write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.partitions))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MetadataResponse {
    /// Added in version 3.
    pub throttle_time_ms: Option<i32>,

    pub brokers: Vec<MetadataResponseBroker>,

    /// Added in version 2.
    pub cluster_id: Option<String>,

    /// Added in version 1.
    pub controller_id: Option<i32>,

    pub topics: Vec<MetadataResponseTopic>,
}

impl<R: Read> ReadVersionedType<R> for MetadataResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 4);

        let throttle_time_ms = (v >= 3).then(|| i32::read(reader)).transpose()?;
        let brokers = read_versioned_array(reader, version)?.unwrap_or_default();
        let cluster_id = if v >= 2 {
            Option::<String>::read(reader)?
        } else {
            None
        };
        let controller_id = (v >= 1).then(|| i32::read(reader)).transpose()?;
        let topics = read_versioned_array(reader, version)?.unwrap_or_default();

        Ok(Self {
            throttle_time_ms,
            brokers,
            cluster_id,
            controller_id,
            topics,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for MetadataResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 4);

        if v >= 3 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.brokers))?;
        if v >= 2 {
            self.cluster_id.write(writer)?;
        }
        if v >= 1 {
            self.controller_id.unwrap_or(-1).write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}
