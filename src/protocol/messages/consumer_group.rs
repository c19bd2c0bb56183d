//! Embedded "consumer" protocol metadata/assignment payloads.
//!
//! `JoinGroupResponseMember.metadata` and `SyncGroupRequestAssignment.assignment`
//! are opaque `BYTES` as far as the group-membership wire protocol is
//! concerned — but for `protocol_type = "consumer"` those bytes carry this
//! well-known sub-encoding, which the broker stores and returns verbatim
//! without interpreting; these types exist for handlers/tests that need to
//! build or inspect them.

use std::io::{Cursor, Read, Write};

use crate::protocol::primitives::{read_array, write_array};
use crate::protocol::traits::{ReadError, ReadType, WriteError, WriteType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerGroupMemberMetadata {
    pub version: i16,
    pub topics: Vec<String>,
    pub user_data: Vec<u8>,
    /// Added in version 1.
    pub owned_partitions: Vec<TopicPartition>,
    /// Added in version 2.
    pub generation_id: i32,
    /// Added in version 3.
    pub rack_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPartition {
    pub topic: String,
    pub partitions: Vec<i32>,
}

impl<R: Read> ReadType<R> for TopicPartition {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            topic: String::read(reader)?,
            partitions: read_array(reader)?,
        })
    }
}

impl<W: Write> WriteType<W> for TopicPartition {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.topic.write(writer)?;
        write_array(writer, &self.partitions)?;
        Ok(())
    }
}

impl<R: Read> ReadType<R> for ConsumerGroupMemberMetadata {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let version = i16::read(reader)?;
        let topics = read_array(reader)?;
        let user_data = Option::<Vec<u8>>::read(reader)?.unwrap_or_default();
        let owned_partitions = if version >= 1 {
            read_array(reader)?
        } else {
            vec![]
        };
        let generation_id = if version >= 2 { i32::read(reader)? } else { -1 };
        let rack_id = if version >= 3 {
            Option::<String>::read(reader)?
        } else {
            None
        };

        Ok(Self {
            version,
            topics,
            user_data,
            owned_partitions,
            generation_id,
            rack_id,
        })
    }
}

impl<W: Write> WriteType<W> for ConsumerGroupMemberMetadata {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.version.write(writer)?;
        write_array(writer, &self.topics)?;
        Some(self.user_data.clone()).write(writer)?;

        if self.version >= 1 {
            write_array(writer, &self.owned_partitions)?;
        }
        if self.version >= 2 {
            self.generation_id.write(writer)?;
        }
        if self.version >= 3 {
            self.rack_id.write(writer)?;
        }

        Ok(())
    }
}

impl ConsumerGroupMemberMetadata {
    /// Decodes the embedded metadata from a raw `JoinGroupRequestProtocol.metadata` blob.
    pub fn decode(bytes: &[u8]) -> Result<Self, ReadError> {
        let mut cursor = Cursor::new(bytes);
        Self::read(&mut cursor)
    }

    /// Encodes this metadata into the raw blob carried in `JoinGroupRequestProtocol.metadata`.
    pub fn encode(&self) -> Result<Vec<u8>, WriteError> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerGroupMemberAssignment {
    pub version: i16,
    pub assigned_partitions: Vec<TopicPartition>,
    pub user_data: Vec<u8>,
}

impl<R: Read> ReadType<R> for ConsumerGroupMemberAssignment {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        Ok(Self {
            version: i16::read(reader)?,
            assigned_partitions: read_array(reader)?,
            user_data: Option::<Vec<u8>>::read(reader)?.unwrap_or_default(),
        })
    }
}

impl<W: Write> WriteType<W> for ConsumerGroupMemberAssignment {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        self.version.write(writer)?;
        write_array(writer, &self.assigned_partitions)?;
        Some(self.user_data.clone()).write(writer)?;
        Ok(())
    }
}

impl ConsumerGroupMemberAssignment {
    pub fn decode(bytes: &[u8]) -> Result<Self, ReadError> {
        let mut cursor = Cursor::new(bytes);
        Self::read(&mut cursor)
    }

    pub fn encode(&self) -> Result<Vec<u8>, WriteError> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_roundtrip_v0() {
        let meta = ConsumerGroupMemberMetadata {
            version: 0,
            topics: vec!["one".into(), "two".into()],
            user_data: vec![1, 2, 3],
            owned_partitions: vec![],
            generation_id: -1,
            rack_id: None,
        };

        let encoded = meta.encode().unwrap();
        let decoded = ConsumerGroupMemberMetadata::decode(&encoded).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn assignment_roundtrip() {
        let assignment = ConsumerGroupMemberAssignment {
            version: 0,
            assigned_partitions: vec![TopicPartition {
                topic: "t".into(),
                partitions: vec![0, 1, 2],
            }],
            user_data: vec![],
        };

        let encoded = assignment.encode().unwrap();
        let decoded = ConsumerGroupMemberAssignment::decode(&encoded).unwrap();
        assert_eq!(decoded, assignment);
    }
}
