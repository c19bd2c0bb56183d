//! `ApiVersions` request and response (API key 18, versions 0..3).

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
pub struct ApiVersionsRequest {
    /// Added in version 3.
    pub client_software_name: Option<String>,

    /// Added in version 3.
    pub client_software_version: Option<String>,
}

impl<R: Read> ReadVersionedType<R> for ApiVersionsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 3);
        Ok(Self {
            client_software_name: (v >= 3).then(|| String::read(reader)).transpose()?,
            client_software_version: (v >= 3).then(|| String::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ApiVersionsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 3);
        if v >= 3 {
            self.client_software_name
                .clone()
                .unwrap_or_default()
                .write(writer)?;
            self.client_software_version
                .clone()
                .unwrap_or_default()
                .write(writer)?;
        }
        Ok(())
    }
}

impl RequestBody for ApiVersionsRequest {
    type ResponseBody = ApiVersionsResponse;
    const API_KEY: ApiKey = ApiKey::ApiVersions;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 3);
}

#[derive(Debug, PartialEq, Eq)]
pub struct ApiVersionsResponseApiKey {
    pub api_key: ApiKey,
    pub min_version: ApiVersion,
    pub max_version: ApiVersion,
}

impl<R: Read> ReadVersionedType<R> for ApiVersionsResponseApiKey {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            api_key: ApiKey::from(i16::read(reader)?),
            min_version: ApiVersion(i16::read(reader)?),
            max_version: ApiVersion(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ApiVersionsResponseApiKey {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        i16::from(self.api_key).write(writer)?;
        self.min_version.0.write(writer)?;
        self.max_version.0.write(writer)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ApiVersionsResponse {
    pub error_code: Option<ErrorCode>,
    pub api_keys: Vec<ApiVersionsResponseApiKey>,

    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
}

impl<R: Read> ReadVersionedType<R> for ApiVersionsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 3);
        let error_code = ErrorCode::from_code(i16::read(reader)?);
        let api_keys = read_versioned_array(reader, version)?.unwrap_or_default();
        let throttle_time_ms = (v >= 1).then(|| i32::read(reader)).transpose()?;
        Ok(Self {
            error_code,
            api_keys,
            throttle_time_ms,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ApiVersionsResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 3);
        ErrorCode::write_code(self.error_code).write(writer)?;
        write_versioned_array(writer, version, Some(&self.api_keys))?;
        if v >= 1 {
            self.throttle_time_ms.unwrap_or(0).write(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_v0_no_client_software() {
        let req = ApiVersionsRequest {
            client_software_name: None,
            client_software_version: None,
        };

        let mut buf = Vec::new();
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn request_v3_roundtrip() {
        let req = ApiVersionsRequest {
            client_software_name: Some("producer-lib".to_string()),
            client_software_version: Some("1.0.0".to_string()),
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = ApiVersionsRequest::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_roundtrip() {
        let resp = ApiVersionsResponse {
            error_code: None,
            api_keys: vec![ApiVersionsResponseApiKey {
                api_key: ApiKey::Metadata,
                min_version: ApiVersion(0),
                max_version: ApiVersion(9),
            }],
            throttle_time_ms: Some(0),
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = ApiVersionsResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }
}
