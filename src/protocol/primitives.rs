//! Primitive wire types.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_types>
//!
//! This covers the normative subset used by the broker core: big-endian
//! fixed-width integers, length-prefixed strings/bytes, and arrays.
//! Record-batch framing (varints, CRC, compression) lives in the log
//! store, which is an external collaborator for this crate.

use std::io::{Read, Write};

use super::traits::{ReadError, ReadType, WriteError, WriteType};

impl<R: Read> ReadType<R> for bool {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0] != 0)
    }
}

impl<W: Write> WriteType<W> for bool {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        Ok(writer.write_all(&[*self as u8])?)
    }
}

impl<R: Read> ReadType<R> for i8 {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(i8::from_be_bytes(buf))
    }
}

impl<W: Write> WriteType<W> for i8 {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        Ok(writer.write_all(&self.to_be_bytes())?)
    }
}

impl<R: Read> ReadType<R> for i16 {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }
}

impl<W: Write> WriteType<W> for i16 {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        Ok(writer.write_all(&self.to_be_bytes())?)
    }
}

impl<R: Read> ReadType<R> for i32 {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }
}

impl<W: Write> WriteType<W> for i32 {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        Ok(writer.write_all(&self.to_be_bytes())?)
    }
}

impl<R: Read> ReadType<R> for i64 {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }
}

impl<W: Write> WriteType<W> for i64 {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        Ok(writer.write_all(&self.to_be_bytes())?)
    }
}

/// `STRING`: `int16` length followed by that many bytes of UTF-8. Never null
/// — see `Option<String>` for the nullable variant.
impl<R: Read> ReadType<R> for String {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let len = i16::read(reader)?;
        if len < 0 {
            return Err(ReadError::Malformed(
                format!("non-nullable string has negative length {len}").into(),
            ));
        }
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|e| ReadError::Malformed(Box::new(e)))
    }
}

impl<W: Write> WriteType<W> for String {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        let len = i16::try_from(self.len())?;
        len.write(writer)?;
        Ok(writer.write_all(self.as_bytes())?)
    }
}

/// `NULLABLE_STRING`: same as `STRING` but `length = -1` denotes `None`.
impl<R: Read> ReadType<R> for Option<String> {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let len = i16::read(reader)?;
        if len < 0 {
            return Ok(None);
        }
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf)?;
        String::from_utf8(buf)
            .map(Some)
            .map_err(|e| ReadError::Malformed(Box::new(e)))
    }
}

impl<W: Write> WriteType<W> for Option<String> {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        match self {
            Some(s) => s.write(writer),
            None => (-1i16).write(writer),
        }
    }
}

/// `BYTES`: `int32` length followed by that many raw bytes. Never null.
impl<R: Read> ReadType<R> for Vec<u8> {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let len = i32::read(reader)?;
        if len < 0 {
            return Err(ReadError::Malformed(
                format!("non-nullable bytes has negative length {len}").into(),
            ));
        }
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<W: Write> WriteType<W> for Vec<u8> {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        let len = i32::try_from(self.len())?;
        len.write(writer)?;
        Ok(writer.write_all(self)?)
    }
}

/// `NULLABLE_BYTES`: `length = -1` denotes `None`.
impl<R: Read> ReadType<R> for Option<Vec<u8>> {
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let len = i32::read(reader)?;
        if len < 0 {
            return Ok(None);
        }
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf)?;
        Ok(Some(buf))
    }
}

impl<W: Write> WriteType<W> for Option<Vec<u8>> {
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        match self {
            Some(b) => b.write(writer),
            None => (-1i32).write(writer),
        }
    }
}

/// Reads a non-nullable `ARRAY` of `T`.
pub fn read_array<R, T>(reader: &mut R) -> Result<Vec<T>, ReadError>
where
    R: Read,
    T: ReadType<R>,
{
    let len = i32::read(reader)?;
    if len < 0 {
        return Err(ReadError::Malformed("array length is negative".into()));
    }
    let len = len as usize;
    let mut out = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        out.push(T::read(reader)?);
    }
    Ok(out)
}

/// Reads a `NULLABLE_ARRAY`: `count = -1` denotes `None`.
pub fn read_nullable_array<R, T>(reader: &mut R) -> Result<Option<Vec<T>>, ReadError>
where
    R: Read,
    T: ReadType<R>,
{
    let len = i32::read(reader)?;
    if len < 0 {
        return Ok(None);
    }
    let len = len as usize;
    let mut out = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        out.push(T::read(reader)?);
    }
    Ok(Some(out))
}

/// Writes a non-nullable `ARRAY` of `T`.
pub fn write_array<W, T>(writer: &mut W, items: &[T]) -> Result<(), WriteError>
where
    W: Write,
    T: WriteType<W>,
{
    let len = i32::try_from(items.len())?;
    len.write(writer)?;
    for item in items {
        item.write(writer)?;
    }
    Ok(())
}

/// Writes a `NULLABLE_ARRAY`: `None` is encoded as `count = -1`.
pub fn write_nullable_array<W, T>(writer: &mut W, items: Option<&[T]>) -> Result<(), WriteError>
where
    W: Write,
    T: WriteType<W>,
{
    match items {
        Some(items) => write_array(writer, items),
        None => Ok((-1i32).write(writer)?),
    }
}
