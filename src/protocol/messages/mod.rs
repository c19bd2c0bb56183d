//! Per-API request/response codecs.
//!
//! Every file in this module corresponds to one API key this broker core
//! supports. Each request type implements [`WriteVersionedType`] (the
//! dispatcher never writes requests, but the codec is symmetric and tests
//! exercise both directions) and [`RequestBody`]; each response type
//! implements [`ReadVersionedType`] for the same reason, plus
//! [`WriteVersionedType`] since the dispatcher does write responses back.

use std::io::{Read, Write};

use thiserror::Error;

use super::api_key::ApiKey;
use super::api_version::{ApiVersion, ApiVersionRange};
use super::traits::{ReadError, ReadType, WriteError, WriteType};

pub mod add_offsets_to_txn;
pub mod add_partitions_to_txn;
pub mod alter_configs;
pub mod api_versions;
pub mod consumer_group;
pub mod create_acls;
pub mod create_topics;
pub mod delete_acls;
pub mod delete_records;
pub mod delete_topics;
pub mod describe_acls;
pub mod describe_configs;
pub mod describe_groups;
pub mod describe_log_dirs;
pub mod end_txn;
pub mod fetch;
pub mod find_coordinator;
pub mod header;
pub mod heartbeat;
pub mod init_producer_id;
pub mod join_group;
pub mod leave_group;
pub mod list_groups;
pub mod list_offsets;
pub mod metadata;
pub mod offset_commit;
pub mod offset_fetch;
pub mod produce;
pub mod sasl_authenticate;
pub mod sasl_handshake;
pub mod sync_group;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod txn_offset_commit;
pub mod write_txn_markers;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReadVersionedError {
    #[error(transparent)]
    ReadError(#[from] ReadError),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(ApiVersion),
}

pub trait ReadVersionedType<R>: Sized
where
    R: Read,
{
    fn read_versioned(reader: &mut R, version: ApiVersion) -> Result<Self, ReadVersionedError>;
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WriteVersionedError {
    #[error(transparent)]
    WriteError(#[from] WriteError),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(ApiVersion),
}

pub trait WriteVersionedType<W>: Sized
where
    W: Write,
{
    fn write_versioned(
        &self,
        writer: &mut W,
        version: ApiVersion,
    ) -> Result<(), WriteVersionedError>;
}

/// Visibility of in-flight transactional records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    ReadUncommitted,
    ReadCommitted,
}

impl From<IsolationLevel> for i8 {
    fn from(level: IsolationLevel) -> Self {
        match level {
            IsolationLevel::ReadUncommitted => 0,
            IsolationLevel::ReadCommitted => 1,
        }
    }
}

impl IsolationLevel {
    pub fn from_i8(v: i8) -> Self {
        match v {
            1 => Self::ReadCommitted,
            _ => Self::ReadUncommitted,
        }
    }
}

/// Associates a request type with its API key, supported version range, and
/// response type.
pub trait RequestBody {
    type ResponseBody;

    const API_KEY: ApiKey;
    const API_VERSION_RANGE: ApiVersionRange;
}

/// Reads a non-nullable array of versioned elements.
pub fn read_versioned_array<R, T>(
    reader: &mut R,
    version: ApiVersion,
) -> Result<Option<Vec<T>>, ReadVersionedError>
where
    R: Read,
    T: ReadVersionedType<R>,
{
    let len = i32::read(reader).map_err(ReadVersionedError::from)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    let mut out = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        out.push(T::read_versioned(reader, version)?);
    }
    Ok(Some(out))
}

/// Writes a (possibly-null) array of versioned elements.
pub fn write_versioned_array<W, T>(
    writer: &mut W,
    version: ApiVersion,
    items: Option<&[T]>,
) -> Result<(), WriteVersionedError>
where
    W: Write,
    T: WriteVersionedType<W>,
{
    match items {
        Some(items) => {
            let len = i32::try_from(items.len())
                .map_err(WriteError::from)
                .map_err(WriteVersionedError::from)?;
            len.write(writer)
                .map_err(WriteVersionedError::from)?;
            for item in items {
                item.write_versioned(writer, version)?;
            }
            Ok(())
        }
        None => (-1i32)
            .write(writer)
            .map_err(WriteVersionedError::from),
    }
}
