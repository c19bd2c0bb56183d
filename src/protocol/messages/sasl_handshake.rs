//! `SaslHandshake` request and response (API key 17, version 1 only).

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct SaslHandshakeRequest {
    /// e.g. `PLAIN`, `SCRAM-SHA-256`.
    pub mechanism: String,
}

impl<R: Read> ReadVersionedType<R> for SaslHandshakeRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 == 1);
        Ok(Self {
            mechanism: String::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for SaslHandshakeRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 == 1);
        self.mechanism.write(writer)?;
        Ok(())
    }
}

impl RequestBody for SaslHandshakeRequest {
    type ResponseBody = SaslHandshakeResponse;
    const API_KEY: ApiKey = ApiKey::SaslHandshake;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(1, 1);
}

#[derive(Debug, PartialEq, Eq)]
pub struct SaslHandshakeResponse {
    pub error_code: Option<ErrorCode>,
    pub mechanisms: Vec<String>,
}

impl<R: Read> ReadVersionedType<R> for SaslHandshakeResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 == 1);
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            mechanisms: Vec::<String>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for SaslHandshakeResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 == 1);
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.mechanisms.write(writer)?;
        Ok(())
    }
}
