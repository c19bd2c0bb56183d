//! `SyncGroup` request and response (API key 14, versions 0..5).

use std::io::{Cursor, Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::consumer_group::ConsumerGroupMemberAssignment;
use crate::protocol::messages::{
    read_versioned_array, write_versioned_array, ReadVersionedError, ReadVersionedType,
    RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct SyncGroupRequestAssignment {
    pub member_id: String,

    /// Opaque on the wire; carries a [`ConsumerGroupMemberAssignment`] for
    /// `protocol_type = "consumer"` groups, stored and returned verbatim by
    /// the broker without interpretation.
    pub assignment: Vec<u8>,
}

impl<W: Write> WriteVersionedType<W> for SyncGroupRequestAssignment {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.member_id.write(writer)?;
        self.assignment.write(writer)?;
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for SyncGroupRequestAssignment {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            member_id: String::read(reader)?,
            assignment: Vec::<u8>::read(reader)?,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct SyncGroupRequest {
    pub group_id: String,
    pub generation_id: i32,
    pub member_id: String,

    /// Added in version 3.
    pub group_instance_id: Option<String>,

    /// Added in version 5.
    pub protocol_type: Option<String>,

    /// Added in version 5.
    pub protocol_name: Option<String>,

    /// Populated only in the leader's request; empty for followers.
    pub assignments: Vec<SyncGroupRequestAssignment>,
}

impl<W: Write> WriteVersionedType<W> for SyncGroupRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        self.group_id.write(writer)?;
        self.generation_id.write(writer)?;
        self.member_id.write(writer)?;
        if v >= 3 {
            self.group_instance_id.write(writer)?;
        }
        if v >= 5 {
            self.protocol_type.write(writer)?;
            self.protocol_name.write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.assignments))?;

        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for SyncGroupRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        let group_id = String::read(reader)?;
        let generation_id = i32::read(reader)?;
        let member_id = String::read(reader)?;
        let group_instance_id = if v >= 3 {
            Option::<String>::read(reader)?
        } else {
            None
        };
        let (protocol_type, protocol_name) = if v >= 5 {
            (
                Option::<String>::read(reader)?,
                Option::<String>::read(reader)?,
            )
        } else {
            (None, None)
        };
        let assignments = read_versioned_array(reader, version)?.unwrap_or_default();

        Ok(Self {
            group_id,
            generation_id,
            member_id,
            group_instance_id,
            protocol_type,
            protocol_name,
            assignments,
        })
    }
}

impl RequestBody for SyncGroupRequest {
    type ResponseBody = SyncGroupResponse;
    const API_KEY: ApiKey = ApiKey::SyncGroup;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 5);
}

#[derive(Debug, PartialEq, Eq)]
pub struct SyncGroupResponse {
    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
    pub error_code: Option<ErrorCode>,

    /// Added in version 5.
    pub protocol_type: Option<String>,

    /// Added in version 5.
    pub protocol_name: Option<String>,

    pub assignment: ConsumerGroupMemberAssignment,
}

impl<R: Read> ReadVersionedType<R> for SyncGroupResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        let throttle_time_ms = (v >= 1).then(|| i32::read(reader)).transpose()?;
        let error_code = ErrorCode::from_code(i16::read(reader)?);
        let (protocol_type, protocol_name) = if v >= 5 {
            (
                Option::<String>::read(reader)?,
                Option::<String>::read(reader)?,
            )
        } else {
            (None, None)
        };

        let buf = Vec::<u8>::read(reader)?;
        let assignment = if buf.is_empty() {
            ConsumerGroupMemberAssignment {
                version: 0,
                assigned_partitions: vec![],
                user_data: vec![],
            }
        } else {
            ConsumerGroupMemberAssignment::read(&mut Cursor::new(buf))?
        };

        Ok(Self {
            throttle_time_ms,
            error_code,
            protocol_type,
            protocol_name,
            assignment,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for SyncGroupResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        if v >= 1 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        ErrorCode::write_code(self.error_code).write(writer)?;
        if v >= 5 {
            self.protocol_type.write(writer)?;
            self.protocol_name.write(writer)?;
        }
        let encoded = self.assignment.encode()?;
        encoded.write(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_v0_no_assignments() {
        let req = SyncGroupRequest {
            group_id: "foo".to_string(),
            generation_id: 66051,
            member_id: "baz".to_string(),
            group_instance_id: None,
            protocol_type: None,
            protocol_name: None,
            assignments: vec![],
        };
        let want = [
            0, 3, b'f', b'o', b'o',
            0x00, 0x01, 0x02, 0x03,
            0, 3, b'b', b'a', b'z',
            0, 0, 0, 0,
        ];

        let mut buf = Vec::new();
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(buf, want);
    }

    #[test]
    fn request_v3_roundtrip_with_group_instance_id() {
        let req = SyncGroupRequest {
            group_id: "foo".to_string(),
            generation_id: 0x00010203,
            member_id: "baz".to_string(),
            group_instance_id: Some("gid".into()),
            protocol_type: None,
            protocol_name: None,
            assignments: vec![SyncGroupRequestAssignment {
                member_id: "baz".to_string(),
                assignment: vec![b'f', b'o', b'o'],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = SyncGroupRequest::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip() {
        let resp = SyncGroupResponse {
            throttle_time_ms: Some(0),
            error_code: None,
            protocol_type: None,
            protocol_name: None,
            assignment: ConsumerGroupMemberAssignment {
                version: 0,
                assigned_partitions: vec![crate::protocol::messages::consumer_group::TopicPartition {
                    topic: "one".to_string(),
                    partitions: vec![0, 2, 4],
                }],
                user_data: vec![0x01, 0x02, 0x03],
            },
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = SyncGroupResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }

    #[test]
    fn response_with_error_has_empty_assignment() {
        let resp = SyncGroupResponse {
            throttle_time_ms: None,
            error_code: Some(ErrorCode::RebalanceInProgress),
            protocol_type: None,
            protocol_name: None,
            assignment: ConsumerGroupMemberAssignment {
                version: 0,
                assigned_partitions: vec![],
                user_data: vec![],
            },
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        buf.set_position(0);
        let got = SyncGroupResponse::read_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(got, resp);
    }
}
