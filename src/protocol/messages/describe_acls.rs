//! `DescribeAcls` request and response (API key 29).
//!
//! Out-of-scope admin API: request/response shape only, no ACL store
//! backs it in this core.

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
pub struct DescribeAclsRequest {
    pub resource_type: i8,
    pub resource_name: Option<String>,
    pub pattern_type_filter: i8,
    pub principal_filter: Option<String>,
    pub host_filter: Option<String>,
    pub operation: i8,
    pub permission_type: i8,
}

impl<R: Read> ReadVersionedType<R> for DescribeAclsRequest {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            resource_type: i8::read(reader)?,
            resource_name: Option::<String>::read(reader)?,
            pattern_type_filter: i8::read(reader)?,
            principal_filter: Option::<String>::read(reader)?,
            host_filter: Option::<String>::read(reader)?,
            operation: i8::read(reader)?,
            permission_type: i8::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeAclsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.resource_type.write(writer)?;
        self.resource_name.write(writer)?;
        self.pattern_type_filter.write(writer)?;
        self.principal_filter.write(writer)?;
        self.host_filter.write(writer)?;
        self.operation.write(writer)?;
        self.permission_type.write(writer)?;
        Ok(())
    }
}

impl RequestBody for DescribeAclsRequest {
    type ResponseBody = DescribeAclsResponse;
    const API_KEY: ApiKey = ApiKey::DescribeAcls;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 1);
}

#[derive(Debug, PartialEq, Eq)]
pub struct AclDescription {
    pub principal: String,
    pub host: String,
    pub operation: i8,
    pub permission_type: i8,
}

impl<R: Read> ReadVersionedType<R> for AclDescription {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            principal: String::read(reader)?,
            host: String::read(reader)?,
            operation: i8::read(reader)?,
            permission_type: i8::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AclDescription {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.principal.write(writer)?;
        self.host.write(writer)?;
        self.operation.write(writer)?;
        self.permission_type.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeAclsResource {
    pub resource_type: i8,
    pub resource_name: String,
    pub pattern_type: i8,
    pub acls: Vec<AclDescription>,
}

impl<R: Read> ReadVersionedType<R> for DescribeAclsResource {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            resource_type: i8::read(reader)?,
            resource_name: String::read(reader)?,
            pattern_type: i8::read(reader)?,
            acls: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeAclsResource {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.resource_type.write(writer)?;
        self.resource_name.write(writer)?;
        self.pattern_type.write(writer)?;
        write_versioned_array(writer, version, Some(&self.acls))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeAclsResponse {
    pub throttle_time_ms: i32,
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub resources: Vec<DescribeAclsResource>,
}

impl<R: Read> ReadVersionedType<R> for DescribeAclsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: Option::<String>::read(reader)?,
            resources: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeAclsResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.error_message.write(writer)?;
        write_versioned_array(writer, version, Some(&self.resources))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_roundtrip() {
        let req = DescribeAclsRequest {
            resource_type: 2,
            resource_name: Some("topic".into()),
            pattern_type_filter: 3,
            principal_filter: None,
            host_filter: None,
            operation: 1,
            permission_type: 3,
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = DescribeAclsRequest::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip() {
        let resp = DescribeAclsResponse {
            throttle_time_ms: 0,
            error_code: None,
            error_message: None,
            resources: vec![DescribeAclsResource {
                resource_type: 2,
                resource_name: "topic".into(),
                pattern_type: 3,
                acls: vec![AclDescription {
                    principal: "User:alice".into(),
                    host: "*".into(),
                    operation: 3,
                    permission_type: 3,
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = DescribeAclsResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }
}
