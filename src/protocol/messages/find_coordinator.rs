//! `FindCoordinator` request and response (API key 10, versions 0..3).
//!
//! This core colocates the group coordinator and the
//! transaction coordinator with the broker itself (no partition-based
//! coordinator election), so the response always names this node.

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorType {
    Group,
    Transaction,
}

impl CoordinatorType {
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Group => 0,
            Self::Transaction => 1,
        }
    }

    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            0 => Some(Self::Group),
            1 => Some(Self::Transaction),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FindCoordinatorRequest {
    pub key: String,
    pub key_type: CoordinatorType,
}

impl<W: Write> WriteVersionedType<W> for FindCoordinatorRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 3);
        self.key.write(writer)?;
        self.key_type.as_i8().write(writer)?;
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for FindCoordinatorRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 3);
        let key = String::read(reader)?;
        let key_type = CoordinatorType::from_i8(i8::read(reader)?).unwrap_or(CoordinatorType::Group);
        Ok(Self { key, key_type })
    }
}

impl RequestBody for FindCoordinatorRequest {
    type ResponseBody = FindCoordinatorResponse;
    const API_KEY: ApiKey = ApiKey::FindCoordinator;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 3);
}

#[derive(Debug, PartialEq, Eq)]
pub struct FindCoordinatorResponse {
    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
    pub error_code: Option<ErrorCode>,

    /// Added in version 1.
    pub error_message: Option<String>,

    pub node_id: i32,
    pub host: String,
    pub port: i32,
}

impl<R: Read> ReadVersionedType<R> for FindCoordinatorResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            throttle_time_ms: (v >= 1).then(|| i32::read(reader)).transpose()?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            error_message: if v >= 1 {
                Option::<String>::read(reader)?
            } else {
                None
            },
            node_id: i32::read(reader)?,
            host: String::read(reader)?,
            port: i32::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for FindCoordinatorResponse {
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
        if v >= 1 {
            self.error_message.write(writer)?;
        }
        self.node_id.write(writer)?;
        self.host.write(writer)?;
        self.port.write(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_roundtrip_transaction() {
        let req = FindCoordinatorRequest {
            key: "transactionid".to_string(),
            key_type: CoordinatorType::Transaction,
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = FindCoordinatorRequest::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_no_error_roundtrip() {
        let resp = FindCoordinatorResponse {
            throttle_time_ms: Some(0),
            error_code: None,
            error_message: None,
            node_id: 7,
            host: "host".to_string(),
            port: 9092,
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = FindCoordinatorResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }

    #[test]
    fn response_error_roundtrip() {
        let resp = FindCoordinatorResponse {
            throttle_time_ms: Some(100),
            error_code: Some(ErrorCode::Other(15)),
            error_message: Some("kaboom".into()),
            node_id: -1,
            host: "".to_string(),
            port: -1,
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = FindCoordinatorResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }
}
