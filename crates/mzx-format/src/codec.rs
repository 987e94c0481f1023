//! Little-endian primitives over in-memory buffers.
//!
//! Every container in this crate works on a fully buffered file, so
//! reads go through [`ByteReader`], a bounds-checked cursor over a
//! byte slice. Writers append to a `Vec<u8>` and backpatch absolute
//! positions after the fact, mirroring how the on-disk layouts were
//! produced originally.

use crate::error::WorldError;

/// Bounds-checked little-endian cursor over a byte slice.
#[derive(Clone, Copy, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Jump to an absolute position.
    pub fn seek(&mut self, pos: usize) -> Result<(), WorldError> {
        if pos > self.data.len() {
            return Err(WorldError::invalid(format!(
                "seek to {pos} past end of file ({})",
                self.data.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), WorldError> {
        self.take(n).map(|_| ())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], WorldError> {
        if self.remaining() < n {
            return Err(WorldError::invalid(format!(
                "read of {n} bytes at offset {} past end of file ({})",
                self.pos,
                self.data.len()
            )));
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    /// Read one byte.
    pub fn u8(&mut self) -> Result<u8, WorldError> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian u16.
    pub fn u16(&mut self) -> Result<u16, WorldError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian u32.
    pub fn u32(&mut self) -> Result<u32, WorldError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian i32.
    pub fn i32(&mut self) -> Result<i32, WorldError> {
        Ok(self.u32()? as i32)
    }

    /// Read `n` bytes into an owned vector.
    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>, WorldError> {
        Ok(self.take(n)?.to_vec())
    }
}

/// Append a little-endian u16.
pub fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian u32.
pub fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Append a little-endian i32.
pub fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Overwrite a previously reserved u32 at `pos`.
pub fn patch_u32(out: &mut [u8], pos: usize, v: u32) {
    out[pos..pos + 4].copy_from_slice(&v.to_le_bytes());
}

/// Append `name` NUL-padded to exactly `width` bytes, truncating if
/// needed and always leaving a terminating NUL.
pub fn put_padded(out: &mut Vec<u8>, name: &[u8], width: usize) {
    let n = name.len().min(width - 1);
    out.extend_from_slice(&name[..n]);
    out.resize(out.len() + (width - n), 0);
}

/// The printable prefix of a NUL-padded fixed field.
pub fn trim_padded(field: &[u8]) -> &[u8] {
    match field.iter().position(|&b| b == 0) {
        Some(n) => &field[..n],
        None => field,
    }
}
