//! `ListGroups` request and response (API key 16, versions 0..4).

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
pub struct ListGroupsRequest {
    /// Added in version 4; empty means "all states".
    pub states_filter: Vec<String>,
}

impl<W: Write> WriteVersionedType<W> for ListGroupsRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        if version.0 >= 4 {
            self.states_filter.write(writer)?;
        }
        Ok(())
    }
}

impl<R: Read> ReadVersionedType<R> for ListGroupsRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let states_filter = if version.0 >= 4 {
            Vec::<String>::read(reader)?
        } else {
            vec![]
        };
        Ok(Self { states_filter })
    }
}

impl RequestBody for ListGroupsRequest {
    type ResponseBody = ListGroupsResponse;
    const API_KEY: ApiKey = ApiKey::ListGroups;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 4);
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListGroupsResponseGroup {
    pub group_id: String,
    pub protocol_type: String,

    /// Added in version 4.
    pub group_state: Option<String>,
}

impl<R: Read> ReadVersionedType<R> for ListGroupsResponseGroup {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            group_id: String::read(reader)?,
            protocol_type: String::read(reader)?,
            group_state: (v >= 4).then(|| String::read(reader)).transpose()?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ListGroupsResponseGroup {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        let v = version.0;
        self.group_id.write(writer)?;
        self.protocol_type.write(writer)?;
        if v >= 4 {
            self.group_state
                .clone()
                .unwrap_or_default()
                .write(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ListGroupsResponse {
    /// Added in version 1.
    pub throttle_time_ms: Option<i32>,
    pub error_code: Option<ErrorCode>,
    pub groups: Vec<ListGroupsResponseGroup>,
}

impl<R: Read> ReadVersionedType<R> for ListGroupsResponse {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        let v = version.0;
        Ok(Self {
            throttle_time_ms: (v >= 1).then(|| i32::read(reader)).transpose()?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
            groups: read_versioned_array(reader, version)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for ListGroupsResponse {
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
        write_versioned_array(writer, version, Some(&self.groups))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_v4_roundtrip_with_states_filter() {
        let req = ListGroupsRequest {
            states_filter: vec!["Empty".to_string()],
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(4)).unwrap();
        buf.set_position(0);
        let got = ListGroupsRequest::read_versioned(&mut buf, ApiVersion(4)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn request_v0_ignores_states_filter() {
        let req = ListGroupsRequest {
            states_filter: vec!["Empty".to_string()],
        };

        let mut buf = Vec::new();
        req.write_versioned(&mut buf, ApiVersion(0)).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn response_roundtrip() {
        let resp = ListGroupsResponse {
            throttle_time_ms: Some(0),
            error_code: None,
            groups: vec![ListGroupsResponseGroup {
                group_id: "foo".to_string(),
                protocol_type: "consumer".to_string(),
                group_state: Some("Stable".to_string()),
            }],
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(4)).unwrap();
        buf.set_position(0);
        let got = ListGroupsResponse::read_versioned(&mut buf, ApiVersion(4)).unwrap();
        assert_eq!(got, resp);
    }
}
