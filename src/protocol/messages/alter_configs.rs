//! `AlterConfigs` request and response (API key 33, versions 0..2).
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
pub struct AlterableConfig {
    pub name: String,
    pub value: Option<String>,
}

impl<R: Read> ReadVersionedType<R> for AlterableConfig {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            name: String::read(reader)?,
            value: Option::<String>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AlterableConfig {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.name.write(writer)?;
        self.value.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AlterConfigsResource {
    pub resource_type: i8,
    pub resource_name: String,
    pub configs: Vec<AlterableConfig>,
}

impl<R: Read> ReadVersionedType<R> for AlterConfigsResource {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            resource_type: i8::read(reader)?,
            resource_name: String::read(reader)?,
            configs: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AlterConfigsResource {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.resource_type.write(writer)?;
        self.resource_name.write(writer)?;
        write_versioned_array(writer, version, Some(&self.configs))?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AlterConfigsRequest {
    pub resources: Vec<AlterConfigsResource>,
    pub validate_only: bool,
}

impl<R: Read> ReadVersionedType<R> for AlterConfigsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 2);
        Ok(Self {
            resources: read_versioned_array(reader, version)?.unwrap_or_default(),
            validate_only: bool::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AlterConfigsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 2);
        write_versioned_array(writer, version, Some(&self.resources))?;
        self.validate_only.write(writer)?;
        Ok(())
    }
}

impl RequestBody for AlterConfigsRequest {
    type ResponseBody = AlterConfigsResponse;
    const API_KEY: ApiKey = ApiKey::AlterConfigs;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 2);
}

#[derive(Debug, PartialEq, Eq)]
pub struct AlterConfigsResourceResponse {
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub resource_type: i8,
    pub resource_name: String,
}

impl<R: Read> ReadVersionedType<R> for AlterConfigsResourceResponse {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: Option::<String>::read(reader)?,
            resource_type: i8::read(reader)?,
            resource_name: String::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AlterConfigsResourceResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.error_message.write(writer)?;
        self.resource_type.write(writer)?;
        self.resource_name.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AlterConfigsResponse {
    pub throttle_time_ms: i32,
    pub responses: Vec<AlterConfigsResourceResponse>,
}

impl<R: Read> ReadVersionedType<R> for AlterConfigsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            responses: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AlterConfigsResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        write_versioned_array(writer, version, Some(&self.responses))?;
        Ok(())
    }
}
