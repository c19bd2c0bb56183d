//! `DeleteAcls` request and response (API key 31).
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
pub struct DeleteAclsFilter {
    pub resource_type_filter: i8,
    pub resource_name_filter: Option<String>,
    pub pattern_type_filter: i8,
    pub principal_filter: Option<String>,
    pub host_filter: Option<String>,
    pub operation: i8,
    pub permission_type: i8,
}

impl<R: Read> ReadVersionedType<R> for DeleteAclsFilter {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            resource_type_filter: i8::read(reader)?,
            resource_name_filter: Option::<String>::read(reader)?,
            pattern_type_filter: i8::read(reader)?,
            principal_filter: Option::<String>::read(reader)?,
            host_filter: Option::<String>::read(reader)?,
            operation: i8::read(reader)?,
            permission_type: i8::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteAclsFilter {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.resource_type_filter.write(writer)?;
        self.resource_name_filter.write(writer)?;
        self.pattern_type_filter.write(writer)?;
        self.principal_filter.write(writer)?;
        self.host_filter.write(writer)?;
        self.operation.write(writer)?;
        self.permission_type.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteAclsRequest {
    pub filters: Vec<DeleteAclsFilter>,
}

impl<R: Read> ReadVersionedType<R> for DeleteAclsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            filters: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteAclsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        write_versioned_array(writer, version, Some(&self.filters))?;
        Ok(())
    }
}

impl RequestBody for DeleteAclsRequest {
    type ResponseBody = DeleteAclsResponse;
    const API_KEY: ApiKey = ApiKey::DeleteAcls;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 1);
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteAclsMatchingAcl {
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub resource_type: i8,
    pub resource_name: String,
    pub pattern_type: i8,
    pub principal: String,
    pub host: String,
    pub operation: i8,
    pub permission_type: i8,
}

impl<R: Read> ReadVersionedType<R> for DeleteAclsMatchingAcl {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: Option::<String>::read(reader)?,
            resource_type: i8::read(reader)?,
            resource_name: String::read(reader)?,
            pattern_type: i8::read(reader)?,
            principal: String::read(reader)?,
            host: String::read(reader)?,
            operation: i8::read(reader)?,
            permission_type: i8::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteAclsMatchingAcl {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.error_message.write(writer)?;
        self.resource_type.write(writer)?;
        self.resource_name.write(writer)?;
        self.pattern_type.write(writer)?;
        self.principal.write(writer)?;
        self.host.write(writer)?;
        self.operation.write(writer)?;
        self.permission_type.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteAclsFilterResult {
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub matching_acls: Vec<DeleteAclsMatchingAcl>,
}

impl<R: Read> ReadVersionedType<R> for DeleteAclsFilterResult {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: Option::<String>::read(reader)?,
            matching_acls: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteAclsFilterResult {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.error_message.write(writer)?;
        write_versioned_array(writer, version, Some(&self.matching_acls))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteAclsResponse {
    pub throttle_time_ms: i32,
    pub filter_results: Vec<DeleteAclsFilterResult>,
}

impl<R: Read> ReadVersionedType<R> for DeleteAclsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            filter_results: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteAclsResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        write_versioned_array(writer, version, Some(&self.filter_results))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_roundtrip() {
        let req = DeleteAclsRequest {
            filters: vec![DeleteAclsFilter {
                resource_type_filter: 2,
                resource_name_filter: Some("topic".into()),
                pattern_type_filter: 3,
                principal_filter: None,
                host_filter: None,
                operation: 1,
                permission_type: 3,
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = DeleteAclsRequest::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip_with_matching_acl() {
        let resp = DeleteAclsResponse {
            throttle_time_ms: 0,
            filter_results: vec![DeleteAclsFilterResult {
                error_code: None,
                error_message: None,
                matching_acls: vec![DeleteAclsMatchingAcl {
                    error_code: None,
                    error_message: None,
                    resource_type: 2,
                    resource_name: "topic".into(),
                    pattern_type: 3,
                    principal: "User:bob".into(),
                    host: "*".into(),
                    operation: 3,
                    permission_type: 3,
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = DeleteAclsResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }
}
