//! `JoinGroup` request and response (API key 11, versions 0..5).

use std::io::{Cursor, Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::consumer_group::ConsumerGroupMemberMetadata;
use crate::protocol::messages::{
    read_versioned_array, write_versioned_array, ReadVersionedError, ReadVersionedType,
    RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

/// One protocol a member supports, e.g. `name = "range"` or `"roundrobin"`.
#[derive(Debug, PartialEq, Eq)]
pub struct JoinGroupProtocol {
    pub name: String,
    pub metadata: Vec<u8>,
}

impl<W: Write> WriteVersionedType<W> for JoinGroupProtocol {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        self.metadata.write(writer)?;
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for JoinGroupProtocol {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            metadata: Vec::<u8>::read(reader)?,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct JoinGroupRequest {
    pub group_id: String,

    /// The coordinator treats the member as dead if no heartbeat arrives
    /// within this many milliseconds.
    pub session_timeout_ms: i32,

    /// Added in version 1. How long the coordinator waits for every member
    /// to rejoin during a rebalance.
    pub rebalance_timeout_ms: i32,

    /// Empty on a member's first join; assigned by the coordinator thereafter.
    pub member_id: String,

    /// Added in version 5.
    pub group_instance_id: Option<String>,

    pub protocol_type: String,
    pub protocols: Vec<JoinGroupProtocol>,
}

impl<W: Write> WriteVersionedType<W> for JoinGroupRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        self.group_id.write(writer)?;
        self.session_timeout_ms.write(writer)?;
        if v >= 1 {
            self.rebalance_timeout_ms.write(writer)?;
        }
        self.member_id.write(writer)?;
        if v >= 5 {
            self.group_instance_id.write(writer)?;
        }
        self.protocol_type.write(writer)?;
        write_versioned_array(writer, version, Some(&self.protocols))?;

        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for JoinGroupRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        let group_id = String::read(reader)?;
        let session_timeout_ms = i32::read(reader)?;
        let rebalance_timeout_ms = if v >= 1 {
            i32::read(reader)?
        } else {
            session_timeout_ms
        };
        let member_id = String::read(reader)?;
        let group_instance_id = if v >= 5 {
            Option::<String>::read(reader)?
        } else {
            None
        };
        let protocol_type = String::read(reader)?;
        let protocols = read_versioned_array(reader, version)?.unwrap_or_default();

        Ok(Self {
            group_id,
            session_timeout_ms,
            rebalance_timeout_ms,
            member_id,
            group_instance_id,
            protocol_type,
            protocols,
        })
    }
}

impl RequestBody for JoinGroupRequest {
    type ResponseBody = JoinGroupResponse;
    const API_KEY: ApiKey = ApiKey::JoinGroup;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 5);
}

#[derive(Debug, PartialEq, Eq)]
pub struct JoinGroupResponseMember {
    pub member_id: String,

    /// Added in version 5.
    pub group_instance_id: Option<String>,

    /// Opaque on the wire (`BYTES`); decoded here for handlers and tests
    /// that need to inspect subscribed topics.
    pub metadata: ConsumerGroupMemberMetadata,
}

impl<R: Read> ReadVersionedType<R> for JoinGroupResponseMember {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;

        let member_id = String::read(reader)?;
        let group_instance_id = if v >= 5 {
            Option::<String>::read(reader)?
        } else {
            None
        };
        let buf = Vec::<u8>::read(reader)?;
        let metadata = ConsumerGroupMemberMetadata::read(&mut Cursor::new(buf))?;

        Ok(Self {
            member_id,
            group_instance_id,
            metadata,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for JoinGroupResponseMember {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.member_id.write(writer)?;
        if v >= 5 {
            self.group_instance_id.write(writer)?;
        }
        let encoded = self.metadata.encode()?;
        encoded.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct JoinGroupResponse {
    /// Added in version 2.
    pub throttle_time_ms: Option<i32>,
    pub error_code: Option<ErrorCode>,
    pub generation_id: i32,
    pub protocol_name: String,
    pub leader: String,
    pub member_id: String,

    /// Non-empty only in the response delivered to the elected leader.
    pub members: Vec<JoinGroupResponseMember>,
}

impl<R: Read> ReadVersionedType<R> for JoinGroupResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        Ok(Self {
            throttle_time_ms: (v >= 2).then(|| i32::read(reader)).transpose()?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            generation_id: i32::read(reader)?,
            protocol_name: String::read(reader)?,
            leader: String::read(reader)?,
            member_id: String::read(reader)?,
            members: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for JoinGroupResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        if v >= 2 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.generation_id.write(writer)?;
        self.protocol_name.write(writer)?;
        self.leader.write(writer)?;
        self.member_id.write(writer)?;
        write_versioned_array(writer, version, Some(&self.members))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_v0_no_protocols() {
        let req = JoinGroupRequest {
            group_id: "TestGroup".to_string(),
            session_timeout_ms: 100,
            rebalance_timeout_ms: 100,
            member_id: "".to_string(),
            group_instance_id: None,
            protocol_type: "consumer".to_string(),
            protocols: vec![],
        };
        let want = [
            0u8, 9, b'T', b'e', b's', b't', b'G', b'r', b'o', b'u', b'p',
            0, 0, 0, 100,
            0, 0,
            0, 8, b'c', b'o', b'n', b's', b'u', b'm', b'e', b'r',
            0, 0, 0, 0,
        ];

        let mut buf = Vec::new();
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(buf, want);
    }

    #[test]
    fn request_v5_roundtrip_with_group_instance_id() {
        let req = JoinGroupRequest {
            group_id: "TestGroup".to_string(),
            session_timeout_ms: 100,
            rebalance_timeout_ms: 200,
            member_id: "OneProtocol".to_string(),
            group_instance_id: Some("gid".into()),
            protocol_type: "consumer".to_string(),
            protocols: vec![JoinGroupProtocol {
                name: "one".to_string(),
                metadata: vec![0x01, 0x02, 0x03],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(5)).unwrap();
        buf.set_position(0);
        let got = JoinGroupRequest::read_versioned(&mut buf, ApiVersion(5)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_with_leader_member_roundtrip() {
        let resp = JoinGroupResponse {
            throttle_time_ms: Some(0),
            error_code: None,
            generation_id: 66051,
            protocol_name: "protocol".to_string(),
            leader: "foo".to_string(),
            member_id: "foo".to_string(),
            members: vec![JoinGroupResponseMember {
                member_id: "foo".to_string(),
                group_instance_id: None,
                metadata: ConsumerGroupMemberMetadata {
                    version: 0,
                    topics: vec!["one".into(), "two".into()],
                    user_data: vec![0x01, 0x02, 0x03],
                    owned_partitions: vec![],
                    generation_id: -1,
                    rack_id: None,
                },
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(2)).unwrap();
        buf.set_position(0);
        let got = JoinGroupResponse::read_versioned(&mut buf, ApiVersion(2)).unwrap();
        assert_eq!(got, resp);
    }

    #[test]
    fn response_with_error_has_no_members() {
        let resp = JoinGroupResponse {
            throttle_time_ms: None,
            error_code: Some(ErrorCode::Other(23)),
            generation_id: 0,
            protocol_name: "".to_string(),
            leader: "".to_string(),
            member_id: "".to_string(),
            members: vec![],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        buf.set_position(0);
        let got = JoinGroupResponse::read_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(got, resp);
    }
}
