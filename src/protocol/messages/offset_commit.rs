//! `OffsetCommit` request and response (API key 8, versions 1..7).

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
pub struct PartitionCommit {
    pub partition_index: i32,
    pub committed_offset: i64,

    /// Removed in version 2.
    pub commit_timestamp: i64,

    /// Added in version 6.
    pub committed_leader_epoch: i32,
    pub committed_metadata: Option<String>,
}

impl<R: Read> ReadVersionedType<R> for PartitionCommit {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            partition_index: i32::read(reader)?,
            committed_offset: i64::read(reader)?,
            commit_timestamp: if v < 2 { i64::read(reader)? } else { -1 },
            committed_leader_epoch: if v >= 6 { i32::read(reader)? } else { -1 },
            committed_metadata: Option::<String>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for PartitionCommit {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.partition_index.write(writer)?;
        self.committed_offset.write(writer)?;
        if v < 2 {
            self.commit_timestamp.write(writer)?;
        }
        if v >= 6 {
            self.committed_leader_epoch.write(writer)?;
        }
        self.committed_metadata.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TopicCommit {
    pub name: String,
    pub partitions: Vec<PartitionCommit>,
}

impl<R: Read> ReadVersionedType<R> for TopicCommit {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for TopicCommit {
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
pub struct OffsetCommitRequest {
    pub group_id: String,
    pub generation_id: i32,
    pub member_id: String,

    /// Added in version 2, removed in version 5.
    pub retention_time_ms: Option<i64>,

    /// Added in version 7.
    pub group_instance_id: Option<String>,
    pub topics: Vec<TopicCommit>,
}

impl<R: Read> ReadVersionedType<R> for OffsetCommitRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v >= 1 && v <= 7);
        Ok(Self {
            group_id: String::read(reader)?,
            generation_id: i32::read(reader)?,
            member_id: String::read(reader)?,
            retention_time_ms: (v >= 2 && v < 5).then(|| i64::read(reader)).transpose()?,
            group_instance_id: if v >= 7 {
                Option::<String>::read(reader)?
            } else {
                None
            },
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for OffsetCommitRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v >= 1 && v <= 7);
        self.group_id.write(writer)?;
        self.generation_id.write(writer)?;
        self.member_id.write(writer)?;
        if v >= 2 && v < 5 {
            self.retention_time_ms.unwrap_or(-1).write(writer)?;
        }
        if v >= 7 {
            self.group_instance_id.write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}

impl RequestBody for OffsetCommitRequest {
    type ResponseBody = OffsetCommitResponse;
    const API_KEY: ApiKey = ApiKey::OffsetCommit;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(1, 7);
}

#[derive(Debug, PartialEq, Eq)]
pub struct PartitionCommitResult {
    pub partition_index: i32,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for PartitionCommitResult {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for PartitionCommitResult {
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
pub struct TopicCommitResult {
    pub name: String,
    pub partitions: Vec<PartitionCommitResult>,
}

impl<R: Read> ReadVersionedType<R> for TopicCommitResult {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for TopicCommitResult {
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
pub struct OffsetCommitResponse {
    /// Added in version 3.
    pub throttle_time_ms: Option<i32>,
    pub topics: Vec<TopicCommitResult>,
}

impl<R: Read> ReadVersionedType<R> for OffsetCommitResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v >= 1 && v <= 7);
        Ok(Self {
            throttle_time_ms: (v >= 3).then(|| i32::read(reader)).transpose()?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for OffsetCommitResponse {
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_v1_roundtrip() {
        let req = OffsetCommitRequest {
            group_id: "foobar".into(),
            generation_id: 0x1122,
            member_id: "cons".into(),
            retention_time_ms: None,
            group_instance_id: None,
            topics: vec![TopicCommit {
                name: "topic".into(),
                partitions: vec![PartitionCommit {
                    partition_index: 0x5221,
                    committed_offset: 0xDEADBEEF,
                    commit_timestamp: -1,
                    committed_leader_epoch: -1,
                    committed_metadata: Some("metadata".into()),
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = OffsetCommitRequest::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn request_v7_roundtrip_with_group_instance_id() {
        let req = OffsetCommitRequest {
            group_id: "foo".into(),
            generation_id: 1,
            member_id: "mid".into(),
            retention_time_ms: None,
            group_instance_id: Some("gid".into()),
            topics: vec![TopicCommit {
                name: "topic".into(),
                partitions: vec![PartitionCommit {
                    partition_index: 1,
                    committed_offset: 12,
                    commit_timestamp: -1,
                    committed_leader_epoch: 4,
                    committed_metadata: Some("meta".into()),
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(7)).unwrap();
        buf.set_position(0);
        let got = OffsetCommitRequest::read_versioned(&mut buf, ApiVersion(7)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_v3_roundtrip() {
        let resp = OffsetCommitResponse {
            throttle_time_ms: Some(0),
            topics: vec![TopicCommitResult {
                name: "topic".into(),
                partitions: vec![PartitionCommitResult {
                    partition_index: 1,
                    error_code: Some(ErrorCode::IllegalGeneration),
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = OffsetCommitResponse::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, resp);
    }
}
