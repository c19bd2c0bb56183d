//! `DeleteTopics` request and response (API key 20, versions 0..5).

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
pub struct DeleteTopicsRequest {
    pub topic_names: Vec<String>,
    pub timeout_ms: i32,
}

impl<R: Read> ReadVersionedType<R> for DeleteTopicsRequest {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            topic_names: Vec::<String>::read(reader)?,
            timeout_ms: i32::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteTopicsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.topic_names.write(writer)?;
        self.timeout_ms.write(writer)?;
        Ok(())
    }
}

impl RequestBody for DeleteTopicsRequest {
    type ResponseBody = DeleteTopicsResponse;
    const API_KEY: ApiKey = ApiKey::DeleteTopics;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 5);
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteTopicsResponseTopic {
    pub name: String,
    pub error_code: Option<ErrorCode>,

    /// Added in version 5.
    pub error_message: Option<String>,
}

impl<R: Read> ReadVersionedType<R> for DeleteTopicsResponseTopic {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            name: String::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: if v >= 5 {
                Option::<String>::read(reader)?
            } else {
                None
            },
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteTopicsResponseTopic {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.name.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        if v >= 5 {
            self.error_message.write(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeleteTopicsResponse {
    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
    pub responses: Vec<DeleteTopicsResponseTopic>,
}

impl<R: Read> ReadVersionedType<R> for DeleteTopicsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            throttle_time_ms: (v >= 1).then(|| i32::read(reader)).transpose()?,
            responses: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for DeleteTopicsResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        if v >= 1 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        write_versioned_array(writer, version, Some(&self.responses))?;
        Ok(())
    }
}
