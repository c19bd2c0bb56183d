//! `SaslAuthenticate` request and response (API key 36, versions 0..1).

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct SaslAuthenticateRequest {
    pub auth_bytes: Vec<u8>,
}

impl<R: Read> ReadVersionedType<R> for SaslAuthenticateRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 1);
        Ok(Self {
            auth_bytes: Vec::<u8>::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for SaslAuthenticateRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 1);
        self.auth_bytes.write(writer)?;
        Ok(())
    }
}

impl RequestBody for SaslAuthenticateRequest {
    type ResponseBody = SaslAuthenticateResponse;
    const API_KEY: ApiKey = ApiKey::SaslAuthenticate;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 1);
}

#[derive(Debug, PartialEq, Eq)]
pub struct SaslAuthenticateResponse {
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub auth_bytes: Vec<u8>,

    /// Added in version 1.
    pub session_lifetime_ms: Option<i64>,
}

impl<R: Read> ReadVersionedType<R> for SaslAuthenticateResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 1);
        Ok(Self {
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: Option::<String>::read(reader)?,
            auth_bytes: Vec::<u8>::read(reader)?,
            session_lifetime_ms: (v >= 1).then(|| i64::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for SaslAuthenticateResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 1);
        ErrorCode::write_code(self.error_code).write(writer)?;
        self.error_message.write(writer)?;
        self.auth_bytes.write(writer)?;
        if v >= 1 {
            self.session_lifetime_ms.unwrap_or(0).write(writer)?;
        }
        Ok(())
    }
}
