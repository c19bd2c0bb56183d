//! `DescribeGroups` request and response (API key 15, versions 0..4).

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    read_versioned_array, ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError,
    WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeGroupsRequest {
    pub groups: Vec<String>,

    /// Added in version 3.
    pub include_authorized_operations: bool,
}

impl<W: Write> WriteVersionedType<W> for DescribeGroupsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.groups.write(writer)?;
        if v >= 3 {
            self.include_authorized_operations.write(writer)?;
        }
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for DescribeGroupsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            groups: Vec::<String>::read(reader)?,
            include_authorized_operations: if v >= 3 {
                bool::read(reader)?
            } else {
                false
            },
        })
    }
}

impl RequestBody for DescribeGroupsRequest {
    type ResponseBody = DescribeGroupsResponse;
    const API_KEY: ApiKey = ApiKey::DescribeGroups;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 4);
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeGroupsResponseGroupMember {
    pub member_id: String,

    /// Added in version 4.
    pub group_instance_id: Option<String>,

    pub client_id: String,
    pub client_host: String,
    pub member_metadata: Vec<u8>,
    pub member_assignment: Vec<u8>,
}

impl<R: Read> ReadVersionedType<R> for DescribeGroupsResponseGroupMember {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            member_id: String::read(reader)?,
            group_instance_id: if v >= 4 {
                Option::<String>::read(reader)?
            } else {
                None
            },
            client_id: String::read(reader)?,
            client_host: String::read(reader)?,
            member_metadata: Vec::<u8>::read(reader)?,
            member_assignment: Vec::<u8>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeGroupsResponseGroupMember {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.member_id.write(writer)?;
        if v >= 4 {
            self.group_instance_id.write(writer)?;
        }
        self.client_id.write(writer)?;
        self.client_host.write(writer)?;
        self.member_metadata.write(writer)?;
        self.member_assignment.write(writer)?;
        Ok(())
    }
}

/// Mirrors the coordinator's rebalance state machine: one of
/// `Empty`, `PreparingRebalance`, `CompletingRebalance`, `Stable`, `Dead`.
#[derive(Debug, PartialEq, Eq)]
pub struct DescribeGroupsResponseGroup {
    pub error_code: Option<ErrorCode>,
    pub group_id: String,
    pub group_state: String,
    pub protocol_type: String,
    pub protocol_data: String,
    pub members: Vec<DescribeGroupsResponseGroupMember>,

    /// Added in version 3.
    pub authorized_operations: Option<i32>,
}

impl<R: Read> ReadVersionedType<R> for DescribeGroupsResponseGroup {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            group_id: String::read(reader)?,
            group_state: String::read(reader)?,
            protocol_type: String::read(reader)?,
            protocol_data: String::read(reader)?,
            members: read_versioned_array(reader, version)?.unwrap_or_default(),
            authorized_operations: (v >= 3).then(|| i32::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeGroupsResponseGroup {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.group_id.write(writer)?;
        self.group_state.write(writer)?;
        self.protocol_type.write(writer)?;
        self.protocol_data.write(writer)?;
        crate::protocol::messages::write_versioned_array(writer, version, Some(&self.members))?;
        if v >= 3 {
            self.authorized_operations.unwrap_or(i32::MIN).write(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeGroupsResponse {
    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
    pub groups: Vec<DescribeGroupsResponseGroup>,
}

impl<R: Read> ReadVersionedType<R> for DescribeGroupsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            throttle_time_ms: (v >= 1).then(|| i32::read(reader)).transpose()?,
            groups: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeGroupsResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        if v >= 1 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        crate::protocol::messages::write_versioned_array(writer, version, Some(&self.groups))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_v3_roundtrip() {
        let req = DescribeGroupsRequest {
            groups: vec!["foo".to_string(), "bar".to_string()],
            include_authorized_operations: true,
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = DescribeGroupsRequest::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip_with_members() {
        let resp = DescribeGroupsResponse {
            throttle_time_ms: Some(0),
            groups: vec![
                DescribeGroupsResponseGroup {
                    error_code: None,
                    group_id: "foo".to_string(),
                    group_state: "Stable".to_string(),
                    protocol_type: "consumer".to_string(),
                    protocol_data: "range".to_string(),
                    members: vec![DescribeGroupsResponseGroupMember {
                        member_id: "id".to_string(),
                        group_instance_id: None,
                        client_id: "client".to_string(),
                        client_host: "localhost".to_string(),
                        member_metadata: vec![0x01, 0x02, 0x03],
                        member_assignment: vec![0x04, 0x05, 0x06],
                    }],
                    authorized_operations: None,
                },
                DescribeGroupsResponseGroup {
                    error_code: Some(ErrorCode::Other(30)),
                    group_id: "".to_string(),
                    group_state: "".to_string(),
                    protocol_type: "".to_string(),
                    protocol_data: "".to_string(),
                    members: vec![],
                    authorized_operations: None,
                },
            ],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = DescribeGroupsResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }
}
