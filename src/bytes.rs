//! Utilities for decoding from and encoding into bytes.
//!
//! This module defines the zero-copy (de)serialization traits [`ToBytes`] and [`FromBytes`], as
//! well as the helper types [`ByteWriter`] and [`ByteReader`], which wrap a `&mut [u8]` or `&[u8]`
//! and offer convenience methods for reading and writing values.
//!
//! RLE headers, trailers and protocol-type fields are all transmitted in network byte order
//! (big-endian), so the numeric helpers here read and write big-endian values, unlike a
//! little-endian link layer.

use crate::Error;
use core::{cmp, mem};

/// Wrapper around a byte slice that can be used to encode data into bytes.
///
/// All `write_*` methods on this type return `Error::Eof` when the underlying buffer slice is
/// full.
pub struct ByteWriter<'a>(&'a mut [u8]);

impl<'a> ByteWriter<'a> {
    /// Creates a writer that will write to `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        ByteWriter(buf)
    }

    /// Consumes `self` and returns the part of the contained buffer that has not yet been written
    /// to.
    pub fn into_rest(self) -> &'a mut [u8] {
        self.0
    }

    /// Returns the raw buffer this `ByteWriter` would write to.
    pub fn rest(&mut self) -> &mut [u8] {
        self.0
    }

    /// Skips the given number of bytes in the output data without writing anything there.
    pub fn skip(&mut self, bytes: usize) -> Result<(), Error> {
        if self.space_left() < bytes {
            Err(Error::Eof)
        } else {
            let this = mem::replace(&mut self.0, &mut []);
            self.0 = &mut this[bytes..];
            Ok(())
        }
    }

    /// Creates and returns another `ByteWriter` that can write to the next `len` bytes in the
    /// buffer, advancing `self` past the split-off region.
    #[must_use = "data from ByteWriter will contain garbage if not used (use skip() if this is intended)"]
    pub fn split_off(&mut self, len: usize) -> Result<Self, Error> {
        if self.space_left() < len {
            Err(Error::Eof)
        } else {
            let this = mem::replace(&mut self.0, &mut []);
            let (head, tail) = this.split_at_mut(len);
            self.0 = tail;
            Ok(ByteWriter::new(head))
        }
    }

    /// Returns the number of bytes that can be written to `self` until it is full.
    pub fn space_left(&self) -> usize {
        self.0.len()
    }

    /// Writes all bytes from `other` to `self`.
    ///
    /// Returns `Error::Eof` when `self` does not have enough space left to fit `other`. In that
    /// case, `self` is not modified.
    pub fn write_slice(&mut self, other: &[u8]) -> Result<(), Error> {
        if self.space_left() < other.len() {
            Err(Error::Eof)
        } else {
            self.0[..other.len()].copy_from_slice(other);
            let this = mem::replace(&mut self.0, &mut []);
            self.0 = &mut this[other.len()..];
            Ok(())
        }
    }

    /// Writes as many bytes as can fit from `other` into `self`, returning the number written.
    pub fn write_slice_truncate(&mut self, other: &[u8]) -> usize {
        let num = cmp::min(self.space_left(), other.len());
        self.write_slice(&other[..num]).unwrap();
        num
    }

    /// Writes a single byte to `self`.
    pub fn write_u8(&mut self, byte: u8) -> Result<(), Error> {
        self.write_slice(&[byte])
    }

    /// Writes a `u16` to `self` in network (big-endian) byte order.
    pub fn write_u16_be(&mut self, value: u16) -> Result<(), Error> {
        self.write_slice(&value.to_be_bytes())
    }

    /// Writes a `u32` to `self` in network (big-endian) byte order.
    pub fn write_u32_be(&mut self, value: u32) -> Result<(), Error> {
        self.write_slice(&value.to_be_bytes())
    }
}

/// Allows reading values from a borrowed byte slice.
pub struct ByteReader<'a>(&'a [u8]);

impl<'a> ByteReader<'a> {
    /// Creates a new `ByteReader` that will read from the given byte slice.
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteReader(bytes)
    }

    /// Returns a reference to the raw bytes in `self`, without advancing `self`.
    pub fn as_raw_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// Consumes `self` and returns the part of the contained buffer that has not yet been read.
    pub fn into_rest(self) -> &'a [u8] {
        self.0
    }

    /// Skips the given number of bytes in the input data without inspecting them.
    pub fn skip(&mut self, bytes: usize) -> Result<(), Error> {
        if self.bytes_left() < bytes {
            Err(Error::Eof)
        } else {
            self.0 = &self.0[bytes..];
            Ok(())
        }
    }

    /// Creates and returns another `ByteReader` that will read from the next `len` bytes in the
    /// buffer, advancing `self` past the split-off region.
    #[must_use = "data from ByteReader will be ignored if not used (use skip() if this is intended)"]
    pub fn split_off(&mut self, len: usize) -> Result<Self, Error> {
        if self.bytes_left() < len {
            Err(Error::Eof)
        } else {
            let (head, tail) = (&self.0[..len], &self.0[len..]);
            self.0 = tail;
            Ok(ByteReader::new(head))
        }
    }

    /// Returns the number of bytes that can still be read from `self`.
    pub fn bytes_left(&self) -> usize {
        self.0.len()
    }

    /// Returns whether `self` is at the end of the underlying buffer (EOF).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a byte slice of length `len` from `self`.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if self.bytes_left() < len {
            Err(Error::Eof)
        } else {
            let slice = &self.0[..len];
            self.0 = &self.0[len..];
            Ok(slice)
        }
    }

    /// Reads the remaining bytes from `self`.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = self.0;
        self.0 = &[];
        rest
    }

    /// Reads a single byte from `self`.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let slice = self.read_slice(1)?;
        Ok(slice[0])
    }

    /// Reads a `u16` from `self` in network (big-endian) byte order.
    pub fn read_u16_be(&mut self) -> Result<u16, Error> {
        let slice = self.read_slice(2)?;
        Ok(u16::from_be_bytes([slice[0], slice[1]]))
    }

    /// Reads a `u32` from `self` in network (big-endian) byte order.
    pub fn read_u32_be(&mut self) -> Result<u32, Error> {
        let slice = self.read_slice(4)?;
        Ok(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
    }
}

/// Trait for encoding a value into a byte buffer.
pub trait ToBytes {
    /// Converts `self` to bytes and writes them into `writer`, advancing `writer` past the
    /// encoded value.
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error>;
}

/// Trait for decoding values from a byte slice.
pub trait FromBytes<'a>: Sized {
    /// Decodes a `Self` from a byte slice, advancing `bytes` past the data that was read.
    fn from_bytes(bytes: &mut ByteReader<'a>) -> Result<Self, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_be() {
        let mut buf = [0u8; 8];
        {
            let mut w = ByteWriter::new(&mut buf);
            w.write_u16_be(0x0102).unwrap();
            w.write_u32_be(0x0304_0506).unwrap();
        }
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_u16_be().unwrap(), 0x0102);
        assert_eq!(r.read_u32_be().unwrap(), 0x0304_0506);
    }

    #[test]
    fn writer_reports_eof() {
        let mut buf = [0u8; 1];
        let mut w = ByteWriter::new(&mut buf);
        assert_eq!(w.write_u16_be(1), Err(Error::Eof));
    }

    #[test]
    fn reader_reports_eof() {
        let buf = [0u8; 1];
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_u16_be(), Err(Error::Eof));
    }
}
