//! `TxnOffsetCommit` request and response (API key 28, versions 0..3).
//!
//! Commits consumer offsets as part of an ongoing transaction; gating
//! strictly requires the transaction to be `Ongoing`. Persistence
//! of the offsets is deferred until the matching `EndTxn` commits.

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
pub struct TxnOffsetCommitRequestPartition {
    pub partition_index: i32,
    pub committed_offset: i64,

    /// Added in version 2.
    pub committed_leader_epoch: i32,
    pub committed_metadata: Option<String>,
}

impl<R: Read> ReadVersionedType<R> for TxnOffsetCommitRequestPartition {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            partition_index: i32::read(reader)?,
            committed_offset: i64::read(reader)?,
            committed_leader_epoch: if v >= 2 { i32::read(reader)? } else { -1 },
            committed_metadata: Option::<String>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for TxnOffsetCommitRequestPartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.partition_index.write(writer)?;
        self.committed_offset.write(writer)?;
        if v >= 2 {
            self.committed_leader_epoch.write(writer)?;
        }
        self.committed_metadata.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TxnOffsetCommitRequestTopic {
    pub name: String,
    pub partitions: Vec<TxnOffsetCommitRequestPartition>,
}

impl<R: Read> ReadVersionedType<R> for TxnOffsetCommitRequestTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for TxnOffsetCommitRequestTopic {
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
pub struct TxnOffsetCommitRequest {
    pub transactional_id: String,
    pub group_id: String,
    pub producer_id: i64,
    pub producer_epoch: i16,

    /// Added in version 3.
    pub generation_id: Option<i32>,
    pub member_id: Option<String>,
    pub group_instance_id: Option<String>,
    pub topics: Vec<TxnOffsetCommitRequestTopic>,
}

impl<R: Read> ReadVersionedType<R> for TxnOffsetCommitRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 3);
        Ok(Self {
            transactional_id: String::read(reader)?,
            group_id: String::read(reader)?,
            producer_id: i64::read(reader)?,
            producer_epoch: i16::read(reader)?,
            generation_id: (v >= 3).then(|| i32::read(reader)).transpose()?,
            member_id: (v >= 3).then(|| String::read(reader)).transpose()?,
            group_instance_id: if v >= 3 {
                Option::<String>::read(reader)?
            } else {
                None
            },
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for TxnOffsetCommitRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 3);
        self.transactional_id.write(writer)?;
        self.group_id.write(writer)?;
        self.producer_id.write(writer)?;
        self.producer_epoch.write(writer)?;
        if v >= 3 {
            self.generation_id.unwrap_or(-1).write(writer)?;
            self.member_id.clone().unwrap_or_default().write(writer)?;
            self.group_instance_id.write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}

impl RequestBody for TxnOffsetCommitRequest {
    type ResponseBody = TxnOffsetCommitResponse;
    const API_KEY: ApiKey = ApiKey::TxnOffsetCommit;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 3);
}

#[derive(Debug, PartialEq, Eq)]
pub struct TxnOffsetCommitResponsePartition {
    pub partition_index: i32,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for TxnOffsetCommitResponsePartition {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for TxnOffsetCommitResponsePartition {
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
pub struct TxnOffsetCommitResponseTopic {
    pub name: String,
    pub partitions: Vec<TxnOffsetCommitResponsePartition>,
}

impl<R: Read> ReadVersionedType<R> for TxnOffsetCommitResponseTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for TxnOffsetCommitResponseTopic {
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
pub struct TxnOffsetCommitResponse {
    pub throttle_time_ms: i32,
    pub topics: Vec<TxnOffsetCommitResponseTopic>,
}

impl<R: Read> ReadVersionedType<R> for TxnOffsetCommitResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for TxnOffsetCommitResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_v0_roundtrip() {
        let req = TxnOffsetCommitRequest {
            transactional_id: "txn-1".into(),
            group_id: "group-a".into(),
            producer_id: 7,
            producer_epoch: 1,
            generation_id: None,
            member_id: None,
            group_instance_id: None,
            topics: vec![TxnOffsetCommitRequestTopic {
                name: "topic".into(),
                partitions: vec![TxnOffsetCommitRequestPartition {
                    partition_index: 0,
                    committed_offset: 100,
                    committed_leader_epoch: -1,
                    committed_metadata: None,
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        buf.set_position(0);
        let got = TxnOffsetCommitRequest::read_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn request_v3_roundtrip_with_generation_and_member() {
        let req = TxnOffsetCommitRequest {
            transactional_id: "txn-1".into(),
            group_id: "group-a".into(),
            producer_id: 7,
            producer_epoch: 1,
            generation_id: Some(4),
            member_id: Some("consumer-1".into()),
            group_instance_id: Some("instance-1".into()),
            topics: vec![TxnOffsetCommitRequestTopic {
                name: "topic".into(),
                partitions: vec![TxnOffsetCommitRequestPartition {
                    partition_index: 0,
                    committed_offset: 100,
                    committed_leader_epoch: 6,
                    committed_metadata: Some("meta".into()),
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = TxnOffsetCommitRequest::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip_invalid_txn_state() {
        let resp = TxnOffsetCommitResponse {
            throttle_time_ms: 0,
            topics: vec![TxnOffsetCommitResponseTopic {
                name: "topic".into(),
                partitions: vec![TxnOffsetCommitResponsePartition {
                    partition_index: 0,
                    error_code: Some(ErrorCode::InvalidTxnState),
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = TxnOffsetCommitResponse::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, resp);
    }
}
