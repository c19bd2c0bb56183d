//! `Heartbeat` request and response (API key 12, versions 0..4).

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct HeartbeatRequest {
    pub group_id: String,
    pub generation_id: i32,
    pub member_id: String,

    /// Added in version 3.
    pub group_instance_id: Option<String>,
}

impl<W: Write> WriteVersionedType<W> for HeartbeatRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        assert!(v <= 4);

        self.group_id.write(writer)?;
        self.generation_id.write(writer)?;
        self.member_id.write(writer)?;
        if v >= 3 {
            self.group_instance_id.write(writer)?;
        }

        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for HeartbeatRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        assert!(v <= 4);

        let group_id = String::read(reader)?;
        let generation_id = i32::read(reader)?;
        let member_id = String::read(reader)?;
        let group_instance_id = if v >= 3 {
            Option::<String>::read(reader)?
        } else {
            None
        };

        Ok(Self {
            group_id,
            generation_id,
            member_id,
            group_instance_id,
        })
    }
}

impl RequestBody for HeartbeatRequest {
    type ResponseBody = HeartbeatResponse;
    const API_KEY: ApiKey = ApiKey::Heartbeat;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 4);
}

#[derive(Debug, PartialEq, Eq)]
pub struct HeartbeatResponse {
    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for HeartbeatResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            throttle_time_ms: (v >= 1).then(|| i32::read(reader)).transpose()?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for HeartbeatResponse {
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_roundtrip_v3() {
        let req = HeartbeatRequest {
            group_id: "g".into(),
            generation_id: 5,
            member_id: "m".into(),
            group_instance_id: Some("instance-1".into()),
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(3)).unwrap();
        buf.set_position(0);
        let got = HeartbeatRequest::read_versioned(&mut buf, ApiVersion(3)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_rebalance_in_progress() {
        let resp = HeartbeatResponse {
            throttle_time_ms: Some(0),
            error_code: Some(ErrorCode::RebalanceInProgress),
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = HeartbeatResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got.error_code, Some(ErrorCode::RebalanceInProgress));
    }
}
