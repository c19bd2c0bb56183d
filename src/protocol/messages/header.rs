//! Request/response envelope.
//!
//! The header format here is fixed (not versioned per-API like the
//! body): `apiKey, apiVersion, correlationID, clientID` on the way in,
//! `correlationID` only on the way out — no header-level error code.

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::ApiVersion;
use crate::protocol::traits::{ReadError, ReadType, WriteError, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct RequestHeader {
    /// The API key of this request.
    pub request_api_key: ApiKey,

    /// The API version of this request.
    pub request_api_version: ApiVersion,

    /// The correlation ID of this request, echoed back verbatim.
    pub correlation_id: i32,

    /// The client ID string, possibly absent.
    pub client_id: Option<String>,
}

impl<R: Read> ReadType<R> for RequestHeader {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            request_api_key: ApiKey::from(i16::read(reader)?),
            request_api_version: ApiVersion(i16::read(reader)?),
            correlation_id: i32::read(reader)?,
            client_id: Option::<String>::read(reader)?,
        })
    }
}

impl<W: Write> WriteType<W> for RequestHeader {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        i16::from(self.request_api_key).write(writer)?;
        self.request_api_version.0.write(writer)?;
        self.correlation_id.write(writer)?;
        self.client_id.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ResponseHeader {
    /// The correlation ID of this response.
    pub correlation_id: i32,
}

impl<R: Read> ReadType<R> for ResponseHeader {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            correlation_id: i32::read(reader)?,
        })
    }
}

impl<W: Write> WriteType<W> for ResponseHeader {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.correlation_id.write(writer)
    }
}
