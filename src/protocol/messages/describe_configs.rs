//! `DescribeConfigs` request and response (API key 32, versions 0..4).
//!
//! Out-of-scope admin API: request/response shape only, no config store
//! backs it beyond the per-topic `configs` recorded at `CreateTopics`
//! time.

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
pub struct DescribeConfigsResource {
    pub resource_type: i8,
    pub resource_name: String,

    /// `None` requests every known config key for this resource.
    pub configuration_keys: Option<Vec<String>>,
}

impl<R: Read> ReadVersionedType<R> for DescribeConfigsResource {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            resource_type: i8::read(reader)?,
            resource_name: String::read(reader)?,
            configuration_keys: Option::<Vec<String>>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeConfigsResource {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.resource_type.write(writer)?;
        self.resource_name.write(writer)?;
        self.configuration_keys.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeConfigsRequest {
    pub resources: Vec<DescribeConfigsResource>,

    /// Added in version 1.
    pub include_synonyms: Option<bool>,

    /// Added in version 3.
    pub include_documentation: Option<bool>,
}

impl<R: Read> ReadVersionedType<R> for DescribeConfigsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 4);
        Ok(Self {
            resources: read_versioned_array(reader, version)?.unwrap_or_default(),
            include_synonyms: (v >= 1).then(|| bool::read(reader)).transpose()?,
            include_documentation: (v >= 3).then(|| bool::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeConfigsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 4);
        write_versioned_array(writer, version, Some(&self.resources))?;
        if v >= 1 {
            self.include_synonyms.unwrap_or(false).write(writer)?;
        }
        if v >= 3 {
            self.include_documentation.unwrap_or(false).write(writer)?;
        }
        Ok(())
    }
}

impl RequestBody for DescribeConfigsRequest {
    type ResponseBody = DescribeConfigsResponse;
    const API_KEY: ApiKey = ApiKey::DescribeConfigs;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 4);
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeConfigsResourceConfig {
    pub name: String,
    pub value: Option<String>,
    pub read_only: bool,
    pub is_default: bool,
    pub is_sensitive: bool,
}

impl<R: Read> ReadVersionedType<R> for DescribeConfigsResourceConfig {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            value: Option::<String>::read(reader)?,
            read_only: bool::read(reader)?,
            is_default: bool::read(reader)?,
            is_sensitive: bool::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeConfigsResourceConfig {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        self.value.write(writer)?;
        self.read_only.write(writer)?;
        self.is_default.write(writer)?;
        self.is_sensitive.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeConfigsResult {
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub resource_type: i8,
    pub resource_name: String,
    pub configs: Vec<DescribeConfigsResourceConfig>,
}

impl<R: Read> ReadVersionedType<R> for DescribeConfigsResult {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: Option::<String>::read(reader)?,
            resource_type: i8::read(reader)?,
            resource_name: String::read(reader)?,
            configs: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeConfigsResult {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.error_message.write(writer)?;
        self.resource_type.write(writer)?;
        self.resource_name.write(writer)?;
        write_versioned_array(writer, version, Some(&self.configs))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DescribeConfigsResponse {
    pub throttle_time_ms: i32,
    pub results: Vec<DescribeConfigsResult>,
}

impl<R: Read> ReadVersionedType<R> for DescribeConfigsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            results: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DescribeConfigsResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        write_versioned_array(writer, version, Some(&self.results))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_v0_roundtrip() {
        let req = DescribeConfigsRequest {
            resources: vec![DescribeConfigsResource {
                resource_type: 2,
                resource_name: "topic".into(),
                configuration_keys: None,
            }],
            include_synonyms: None,
            include_documentation: None,
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        buf.set_position(0);
        let got = DescribeConfigsRequest::read_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn request_v3_roundtrip_with_synonyms_and_documentation() {
        let req = DescribeConfigsRequest {
            resources: vec![DescribeConfigsResource {
                resource_type: 2,
                resource_name: "topic".into(),
                configuration_keys: Some(vec!["retention.ms".into()]),
            }],
            include_synonyms: Some(true),
            include_documentation: Some(true),
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = DescribeConfigsRequest::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip() {
        let resp = DescribeConfigsResponse {
            throttle_time_ms: 0,
            results: vec![DescribeConfigsResult {
                error_code: None,
                error_message: None,
                resource_type: 2,
                resource_name: "topic".into(),
                configs: vec![DescribeConfigsResourceConfig {
                    name: "retention.ms".into(),
                    value: Some("604800000".into()),
                    read_only: false,
                    is_default: true,
                    is_sensitive: false,
                }],
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        buf.set_position(0);
        let got = DescribeConfigsResponse::read_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert_eq!(got, resp);
    }
}
