//! `DeleteRecords` request and response (API key 21, versions 0..2).
//!
//! Truncates a partition's log prefix up to `offset`, moving its log
//! start offset forward.

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
pub struct DeleteRecordsRequestPartition {
    pub partition_index: i32,

    /// The new log start offset; `-1` truncates nothing.
    pub offset: i64,
}

impl<R: Read> ReadVersionedType<R> for DeleteRecordsRequestPartition {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            offset: i64::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteRecordsRequestPartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.partition_index.write(writer)?;
        self.offset.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteRecordsRequestTopic {
    pub name: String,
    pub partitions: Vec<DeleteRecordsRequestPartition>,
}

impl<R: Read> ReadVersionedType<R> for DeleteRecordsRequestTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteRecordsRequestTopic {
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
pub struct DeleteRecordsRequest {
    pub topics: Vec<DeleteRecordsRequestTopic>,
    pub timeout_ms: i32,
}

impl<R: Read> ReadVersionedType<R> for DeleteRecordsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 2);
        Ok(Self {
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
            timeout_ms: i32::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteRecordsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 2);
        write_versioned_array(writer, version, Some(&self.topics))?;
        self.timeout_ms.write(writer)?;
        Ok(())
    }
}

impl RequestBody for DeleteRecordsRequest {
    type ResponseBody = DeleteRecordsResponse;
    const API_KEY: ApiKey = ApiKey::DeleteRecords;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 2);
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteRecordsResponsePartition {
    pub partition_index: i32,
    pub low_watermark: i64,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for DeleteRecordsResponsePartition {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            low_watermark: i64::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteRecordsResponsePartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.partition_index.write(writer)?;
        self.low_watermark.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteRecordsResponseTopic {
    pub name: String,
    pub partitions: Vec<DeleteRecordsResponsePartition>,
}

impl<R: Read> ReadVersionedType<R> for DeleteRecordsResponseTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteRecordsResponseTopic {
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
pub struct DeleteRecordsResponse {
    pub throttle_time_ms: i32,
    pub topics: Vec<DeleteRecordsResponseTopic>,
}

impl<R: Read> ReadVersionedType<R> for DeleteRecordsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteRecordsResponse {
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
    fn request_roundtrip() {
        let req = DeleteRecordsRequest {
            topics: vec![DeleteRecordsRequestTopic {
                name: "topic".into(),
                partitions: vec![DeleteRecordsRequestPartition {
                    partition_index: 0,
                    offset: 500,
                }],
            }],
            timeout_ms: 30_000,
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(2)).unwrap();
        buf.set_position(0);
        let got = DeleteRecordsRequest::read_versioned(&mut buf, ApiVersion(2)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip_with_offset_out_of_range() {
        let resp = DeleteRecordsResponse {
            throttle_time_ms: 0,
            topics: vec![DeleteRecordsResponseTopic {
                name: "topic".into(),
                partitions: vec![DeleteRecordsResponsePartition {
                    partition_index: 0,
                    low_watermark: -1,
                    error_code: Some(ErrorCode::OffsetOutOfRange),
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(2)).unwrap();
        buf.set_position(0);
        let got = DeleteRecordsResponse::read_versioned(&mut buf, ApiVersion(2)).unwrap();
        assert_eq!(got, resp);
    }
}
