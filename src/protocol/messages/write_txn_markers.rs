//! `WriteTxnMarkers` request and response (API key 27, versions 0..1).
//!
//! Sent by the transaction coordinator to the partition leaders holding a
//! transaction's data, instructing them to append a commit or abort
//! control record. Scoped here to intent-level logging; see the Open
//! Questions note on control-record insertion in the design ledger.

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
pub struct WritableTxnMarkerTopic {
    pub name: String,
    pub partition_indexes: Vec<i32>,
}

impl<R: Read> ReadVersionedType<R> for WritableTxnMarkerTopic {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partition_indexes: Vec::<i32>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for WritableTxnMarkerTopic {
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
pub struct WritableTxnMarker {
    pub producer_id: i64,
    pub producer_epoch: i16,

    /// `true` for a commit marker, `false` for an abort marker.
    pub transaction_result: bool,
    pub topics: Vec<WritableTxnMarkerTopic>,
    pub coordinator_epoch: i32,
}

impl<R: Read> ReadVersionedType<R> for WritableTxnMarker {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            producer_id: i64::read(reader)?,
            producer_epoch: i16::read(reader)?,
            transaction_result: bool::read(reader)?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
            coordinator_epoch: i32::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for WritableTxnMarker {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.producer_id.write(writer)?;
        self.producer_epoch.write(writer)?;
        self.transaction_result.write(writer)?;
        write_versioned_array(writer, version, Some(&self.topics))?;
        self.coordinator_epoch.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct WriteTxnMarkersRequest {
    pub markers: Vec<WritableTxnMarker>,
}

impl<R: Read> ReadVersionedType<R> for WriteTxnMarkersRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 1);
        Ok(Self {
            markers: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for WriteTxnMarkersRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 1);
        write_versioned_array(writer, version, Some(&self.markers))?;
        Ok(())
    }
}

impl RequestBody for WriteTxnMarkersRequest {
    type ResponseBody = WriteTxnMarkersResponse;
    const API_KEY: ApiKey = ApiKey::WriteTxnMarkers;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 1);
}

#[derive(Debug, PartialEq, Eq)]
pub struct WriteTxnMarkersPartitionResult {
    pub partition_index: i32,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for WriteTxnMarkersPartitionResult {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            partition_index: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for WriteTxnMarkersPartitionResult {
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
pub struct WriteTxnMarkersTopicResult {
    pub name: String,
    pub partitions: Vec<WriteTxnMarkersPartitionResult>,
}

impl<R: Read> ReadVersionedType<R> for WriteTxnMarkersTopicResult {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            partitions: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for WriteTxnMarkersTopicResult {
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
pub struct WritableTxnMarkerResult {
    pub producer_id: i64,
    pub topics: Vec<WriteTxnMarkersTopicResult>,
}

impl<R: Read> ReadVersionedType<R> for WritableTxnMarkerResult {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            producer_id: i64::read(reader)?,
            topics: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for WritableTxnMarkerResult {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.producer_id.write(writer)?;
        write_versioned_array(writer, version, Some(&self.topics))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct WriteTxnMarkersResponse {
    pub markers: Vec<WritableTxnMarkerResult>,
}

impl<R: Read> ReadVersionedType<R> for WriteTxnMarkersResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            markers: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for WriteTxnMarkersResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        write_versioned_array(writer, version, Some(&self.markers))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_commit_marker_roundtrip() {
        let req = WriteTxnMarkersRequest {
            markers: vec![WritableTxnMarker {
                producer_id: 7,
                producer_epoch: 1,
                transaction_result: true,
                topics: vec![WritableTxnMarkerTopic {
                    name: "topic".into(),
                    partition_indexes: vec![0, 1],
                }],
                coordinator_epoch: 3,
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        buf.set_position(0);
        let got = WriteTxnMarkersRequest::read_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip_with_partition_errors() {
        let resp = WriteTxnMarkersResponse {
            markers: vec![WritableTxnMarkerResult {
                producer_id: 7,
                topics: vec![WriteTxnMarkersTopicResult {
                    name: "topic".into(),
                    partitions: vec![WriteTxnMarkersPartitionResult {
                        partition_index: 0,
                        error_code: None,
                    }],
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        buf.set_position(0);
        let got = WriteTxnMarkersResponse::read_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(got, resp);
    }
}
