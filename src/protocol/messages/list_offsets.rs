//! `ListOffsets` request and response (API key 2, versions 0..3).
//!
//! Per [KIP-79] a request can either ask for up to `max_num_offsets` offsets
//! smaller than a timestamp (version 0) or the single offset/timestamp pair
//! at or after it (version 1+). `-1`/`-2` are the special "latest"/"earliest"
//! timestamps.
//!
//! [KIP-79]: https://cwiki.apache.org/confluence/pages/viewpage.action?pageId=65868090

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
pub struct ListOffsetsRequestPartition {
    pub partition_index: i32,

    /// `-1` for the latest offset, `-2` for the earliest.
    pub timestamp: i64,

    /// Removed in version 1.
    pub max_num_offsets: Option<i32>,
}

impl<R: Read> ReadVersionedType<R> for ListOffsetsRequestPartition {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            partition_index: i32::read(reader)?,
            timestamp: i64::read(reader)?,
            max_num_offsets: (v == 0).then(|| i32::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ListOffsetsRequestPartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.partition_index.write(writer)?;
        self.timestamp.write(writer)?;
        if v == 0 {
            self.max_num_offsets.unwrap_or(1).write(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListOffsetsRequestTopic {
    pub name: String,
    pub partitions: Vec<ListOffsetsRequestPartition>,
}

impl<R: Read> ReadVersionedType<R> for ListOffsetsRequestTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ListOffsetsRequestTopic {
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
pub struct ListOffsetsRequest {
    /// `-1` for a normal consumer, the broker ID of the follower otherwise.
    pub replica_id: i32,

    /// Added in version 2.
    pub isolation_level: Option<IsolationLevel>,
    pub topics: Vec<ListOffsetsRequestTopic>,
}

impl<R: Read> ReadVersionedType<R> for ListOffsetsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 3);
        Ok(Self {
            replica_id: i32::read(reader)?,
            isolation_level: (v >= 2)
                .then(|| i8::read(reader).map(IsolationLevel::from_i8))
                .transpose()?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ListOffsetsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 3);
        self.replica_id.write(writer)?;
        if v >= 2 {
            let level: i8 = self.isolation_level.unwrap_or_default().into();
            level.write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}

impl RequestBody for ListOffsetsRequest {
    type ResponseBody = ListOffsetsResponse;
    const API_KEY: ApiKey = ApiKey::ListOffsets;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 3);
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListOffsetsResponsePartition {
    pub partition_index: i32,
    pub error_code: Option<ErrorCode>,

    /// Removed in version 1.
    pub old_style_offsets: Option<Vec<i64>>,

    /// Added in version 1.
    pub timestamp: Option<i64>,

    /// Added in version 1.
    pub offset: Option<i64>,
}

impl<R: Read> ReadVersionedType<R> for ListOffsetsResponsePartition {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            partition_index: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            old_style_offsets: (v < 1).then(|| Vec::<i64>::read(reader)).transpose()?,
            timestamp: (v >= 1).then(|| i64::read(reader)).transpose()?,
            offset: (v >= 1).then(|| i64::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ListOffsetsResponsePartition {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.partition_index.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        if v < 1 {
            self.old_style_offsets.clone().unwrap_or_default().write(writer)?;
        } else {
            self.timestamp.unwrap_or(-1).write(writer)?;
            self.offset.unwrap_or(-1).write(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListOffsetsResponseTopic {
    pub name: String,
    pub partitions: Vec<ListOffsetsResponsePartition>,
}

impl<R: Read> ReadVersionedType<R> for ListOffsetsResponseTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ListOffsetsResponseTopic {
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
pub struct ListOffsetsResponse {
    /// Added in version 2.
    pub throttle_time_ms: Option<i32>,
    pub topics: Vec<ListOffsetsResponseTopic>,
}

impl<R: Read> ReadVersionedType<R> for ListOffsetsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            throttle_time_ms: (v >= 2).then(|| i32::read(reader)).transpose()?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ListOffsetsResponse {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_v0_with_max_num_offsets() {
        let req = ListOffsetsRequest {
            replica_id: -1,
            isolation_level: None,
            topics: vec![ListOffsetsRequestTopic {
                name: "foo".into(),
                partitions: vec![ListOffsetsRequestPartition {
                    partition_index: 4,
                    timestamp: -1,
                    max_num_offsets: Some(2),
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        buf.set_position(0);
        let got = ListOffsetsRequest::read_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn request_v2_roundtrip_with_isolation_level() {
        let req = ListOffsetsRequest {
            replica_id: -1,
            isolation_level: Some(IsolationLevel::ReadCommitted),
            topics: vec![ListOffsetsRequestTopic {
                name: "bar".into(),
                partitions: vec![ListOffsetsRequestPartition {
                    partition_index: 4,
                    timestamp: -2,
                    max_num_offsets: None,
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(2)).unwrap();
        buf.set_position(0);
        let got = ListOffsetsRequest::read_versioned(&mut buf, ApiVersion(2)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_v1_roundtrip() {
        let resp = ListOffsetsResponse {
            throttle_time_ms: None,
            topics: vec![ListOffsetsResponseTopic {
                name: "z".into(),
                partitions: vec![ListOffsetsResponsePartition {
                    partition_index: 2,
                    error_code: None,
                    old_style_offsets: None,
                    timestamp: Some(1477920049286),
                    offset: Some(6),
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = ListOffsetsResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }
}
