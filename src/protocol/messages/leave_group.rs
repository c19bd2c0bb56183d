//! `LeaveGroup` request and response (API key 13, versions 0..5).

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    read_versioned_array, write_versioned_array, ReadVersionedError, ReadVersionedType,
    RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

/// One leaving member identity, added in version 3 to support leaving a
/// group on behalf of several static members in a single request.
#[derive(Debug, PartialEq, Eq)]
pub struct LeaveGroupRequestMember {
    pub member_id: String,
    pub group_instance_id: Option<String>,
}

impl<W: Write> WriteVersionedType<W> for LeaveGroupRequestMember {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.member_id.write(writer)?;
        self.group_instance_id.write(writer)?;
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for LeaveGroupRequestMember {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            member_id: String::read(reader)?,
            group_instance_id: Option::<String>::read(reader)?,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct LeaveGroupRequest {
    pub group_id: String,

    /// Removed in version 3 in favor of `members`.
    pub member_id: String,

    /// Added in version 3.
    pub members: Vec<LeaveGroupRequestMember>,
}

impl<W: Write> WriteVersionedType<W> for LeaveGroupRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        self.group_id.write(writer)?;
        if v < 3 {
            self.member_id.write(writer)?;
        } else {
            write_versioned_array(writer, version, Some(&self.members))?;
        }

        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for LeaveGroupRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        let group_id = String::read(reader)?;
        let (member_id, members) = if v < 3 {
            (String::read(reader)?, vec![])
        } else {
            (
                String::new(),
                read_versioned_array(reader, version)?.unwrap_or_default(),
            )
        };

        Ok(Self {
            group_id,
            member_id,
            members,
        })
    }
}

impl RequestBody for LeaveGroupRequest {
    type ResponseBody = LeaveGroupResponse;
    const API_KEY: ApiKey = ApiKey::LeaveGroup;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 5);
}

#[derive(Debug, PartialEq, Eq)]
pub struct LeaveGroupResponseMember {
    pub member_id: String,
    pub group_instance_id: Option<String>,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for LeaveGroupResponseMember {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            member_id: String::read(reader)?,
            group_instance_id: Option::<String>::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for LeaveGroupResponseMember {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.member_id.write(writer)?;
        self.group_instance_id.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct LeaveGroupResponse {
    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
    pub error_code: Option<ErrorCode>,

    /// Added in version 3.
    pub members: Vec<LeaveGroupResponseMember>,
}

impl<R: Read> ReadVersionedType<R> for LeaveGroupResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 5);

        let throttle_time_ms = (v >= 1).then(|| i32::read(reader)).transpose()?;
        let error_code = ErrorCode::from_code(i16::read(reader)?);
        let members = if v >= 3 {
            read_versioned_array(reader, version)?.unwrap_or_default()
        } else {
            vec![]
        };

        Ok(Self {
            throttle_time_ms,
            error_code,
            members,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for LeaveGroupResponse {
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
        if v >= 3 {
            write_versioned_array(writer, version, Some(&self.members))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_v0_single_member() {
        let req = LeaveGroupRequest {
            group_id: "foo".to_string(),
            member_id: "bar".to_string(),
            members: vec![],
        };
        let want = [0, 3, b'f', b'o', b'o', 0, 3, b'b', b'a', b'r'];

        let mut buf = Vec::new();
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(buf, want);
    }

    #[test]
    fn request_v3_multiple_members_roundtrip() {
        let req = LeaveGroupRequest {
            group_id: "foo".to_string(),
            member_id: String::new(),
            members: vec![
                LeaveGroupRequestMember {
                    member_id: "mid1".to_string(),
                    group_instance_id: None,
                },
                LeaveGroupRequestMember {
                    member_id: "mid2".to_string(),
                    group_instance_id: Some("gid".into()),
                },
            ],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = LeaveGroupRequest::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_v3_per_member_errors_roundtrip() {
        let resp = LeaveGroupResponse {
            throttle_time_ms: Some(100),
            error_code: None,
            members: vec![
                LeaveGroupResponseMember {
                    member_id: "mid1".to_string(),
                    group_instance_id: None,
                    error_code: None,
                },
                LeaveGroupResponseMember {
                    member_id: "mid2".to_string(),
                    group_instance_id: Some("gid".into()),
                    error_code: Some(ErrorCode::UnknownMemberId),
                },
            ],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = LeaveGroupResponse::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, resp);
    }
}
