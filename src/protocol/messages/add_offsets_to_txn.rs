//! `AddOffsetsToTxn` request and response (API key 25, versions 0..3).
//!
//! Registers the `__consumer_offsets` partition owned by `group_id` as
//! part of the transaction, so a subsequent `TxnOffsetCommit` is covered
//! by the same atomic commit/abort.

use std::io::{Read, Write};

use crate::protocol::api_key::ApiKey;
use crate::protocol::api_version::{ApiVersion, ApiVersionRange};
use crate::protocol::error_code::ErrorCode;
use crate::protocol::messages::{
    ReadVersionedError, ReadVersionedType, RequestBody, WriteVersionedError, WriteVersionedType,
};
use crate::protocol::traits::{ReadType, WriteType};

#[derive(Debug, PartialEq, Eq)]
pub struct AddOffsetsToTxnRequest {
    pub transactional_id: String,
    pub producer_id: i64,
    pub producer_epoch: i16,
    pub group_id: String,
}

impl<R: Read> ReadVersionedType<R> for AddOffsetsToTxnRequest {
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError> {
        assert!(version.0 <= 3);
        Ok(Self {
            transactional_id: String::read(reader)?,
            producer_id: i64::read(reader)?,
            producer_epoch: i16::read(reader)?,
            group_id: String::read(reader)?,
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AddOffsetsToTxnRequest {
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        assert!(version.0 <= 3);
        self.transactional_id.write(writer)?;
        self.producer_id.write(writer)?;
        self.producer_epoch.write(writer)?;
        self.group_id.write(writer)?;
        Ok(())
    }
}

impl RequestBody for AddOffsetsToTxnRequest {
    type ResponseBody = AddOffsetsToTxnResponse;
    const API_KEY: ApiKey = ApiKey::AddOffsetsToTxn;
    const API_VERSION_RANGE: ApiVersionRange = ApiVersionRange::new(0, 3);
}

#[derive(Debug, PartialEq, Eq)]
pub struct AddOffsetsToTxnResponse {
    pub throttle_time_ms: i32,
    pub error_code: Option<ErrorCode>,
}

impl<R: Read> ReadVersionedType<R> for AddOffsetsToTxnResponse {
    fn read_versioned(reader: &mut R, _version: ApiVersion) -> Result<Self, ReadVersionedError> {
        Ok(Self {
            throttle_time_ms: i32::read(reader)?,
            error_code: ErrorCode::from_code(i16::read(reader)?),
        })
    }
}

impl<W: Write> WriteVersionedType<W> for AddOffsetsToTxnResponse {
    fn write_versioned(
        &self,
        writer: &mut W,
        _version: ApiVersion,
    ) -> Result<(), WriteVersionedError> {
        self.throttle_time_ms.write(writer)?;
        ErrorCode::write_code(self.error_code).write(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_roundtrip() {
        let req = AddOffsetsToTxnRequest {
            transactional_id: "txn-1".into(),
            producer_id: 7,
            producer_epoch: 0,
            group_id: "group-a".into(),
        };

        let mut buf = Cursor::new(Vec::new());
        req.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = AddOffsetsToTxnRequest::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, req);
    }

    #[test]
    fn response_rejects_non_ongoing_transaction() {
        let resp = AddOffsetsToTxnResponse {
            throttle_time_ms: 0,
            error_code: Some(ErrorCode::InvalidTxnState),
        };

        let mut buf = Cursor::new(Vec::new());
        resp.write_versioned(&mut buf, ApiVersion(1)).unwrap();
        buf.set_position(0);
        let got = AddOffsetsToTxnResponse::read_versioned(&mut buf, ApiVersion(1)).unwrap();
        assert_eq!(got, resp);
    }
}
