//! Tag/length/value property records used by the zip container.
//!
//! A record is a u16 tag, a u32 payload length, and the payload, all
//! little-endian. A bare u16 of 0 terminates a stream. Tags with bit
//! 15 set only appear in savegames.
//!
//! Reading is deliberately permissive: [`PropIter`] yields well-formed
//! records and simply stops at the terminator, the end of the buffer,
//! or any truncation. Strict structural checking is a separate pass
//! ([`check_required`]) run by the validators before anything is
//! loaded.

use crate::codec::{put_u16, put_u32};
use crate::error::WorldError;

/// Bytes in a record header (tag + length).
pub const PROP_HEADER_SIZE: usize = 6;

/// Terminator tag.
pub const PROP_EOF: u16 = 0;

/// Bit marking a tag as savegame-only.
pub const PROP_SAVEGAME: u16 = 0x8000;

/// Appends property records to a byte buffer.
#[derive(Debug, Default)]
pub struct PropWriter {
    buf: Vec<u8>,
}

impl PropWriter {
    /// Empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&mut self, tag: u16, len: u32) {
        put_u16(&mut self.buf, tag);
        put_u32(&mut self.buf, len);
    }

    /// Write a one-byte property.
    pub fn prop_c(&mut self, tag: u16, v: u8) {
        self.header(tag, 1);
        self.buf.push(v);
    }

    /// Write a two-byte property.
    pub fn prop_w(&mut self, tag: u16, v: u16) {
        self.header(tag, 2);
        put_u16(&mut self.buf, v);
    }

    /// Write a four-byte property.
    pub fn prop_d(&mut self, tag: u16, v: u32) {
        self.header(tag, 4);
        put_u32(&mut self.buf, v);
    }

    /// Write a raw payload property.
    pub fn prop_s(&mut self, tag: u16, v: &[u8]) {
        self.header(tag, v.len() as u32);
        self.buf.extend_from_slice(v);
    }

    /// Reserve a zero-filled payload of `len` bytes, returning the
    /// offset of the payload so the caller can fill it in place.
    pub fn prop_v(&mut self, tag: u16, len: usize) -> usize {
        self.header(tag, len as u32);
        let pos = self.buf.len();
        self.buf.resize(pos + len, 0);
        pos
    }

    /// Mutable access for filling a reserved payload.
    pub fn payload_mut(&mut self, pos: usize, len: usize) -> &mut [u8] {
        &mut self.buf[pos..pos + len]
    }

    /// Write the terminator and return the finished buffer.
    pub fn finish(mut self) -> Vec<u8> {
        put_u16(&mut self.buf, PROP_EOF);
        self.buf
    }
}

/// One record yielded by [`PropIter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prop<'a> {
    /// Record tag.
    pub tag: u16,
    /// Record payload.
    pub payload: &'a [u8],
}

impl Prop<'_> {
    /// Decode the payload as an integer of its own width.
    ///
    /// Widths other than 1, 2, and 4 read as 0, matching the original
    /// permissive loaders.
    pub fn int(&self) -> i32 {
        match self.payload {
            [a] => *a as i32,
            [a, b] => u16::from_le_bytes([*a, *b]) as i32,
            [a, b, c, d] => i32::from_le_bytes([*a, *b, *c, *d]),
            _ => 0,
        }
    }

    /// [`Prop::int`] truncated to a byte.
    pub fn byte(&self) -> u8 {
        self.int() as u8
    }

    /// [`Prop::int`] truncated to a word.
    pub fn word(&self) -> u16 {
        self.int() as u16
    }

    /// Whether the tag is savegame-only.
    pub fn is_savegame(&self) -> bool {
        self.tag & PROP_SAVEGAME != 0
    }
}

/// Permissive forward iterator over a property stream.
#[derive(Clone, Copy, Debug)]
pub struct PropIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PropIter<'a> {
    /// Iterator over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for PropIter<'a> {
    type Item = Prop<'a>;

    fn next(&mut self) -> Option<Prop<'a>> {
        let rest = &self.data[self.pos..];
        if rest.len() < 2 {
            return None;
        }
        let tag = u16::from_le_bytes([rest[0], rest[1]]);
        if tag == PROP_EOF || rest.len() < PROP_HEADER_SIZE {
            return None;
        }
        let len = u32::from_le_bytes([rest[2], rest[3], rest[4], rest[5]]) as usize;
        if rest.len() - PROP_HEADER_SIZE < len {
            return None;
        }
        let payload = &rest[PROP_HEADER_SIZE..PROP_HEADER_SIZE + len];
        self.pos += PROP_HEADER_SIZE + len;
        Some(Prop { tag, payload })
    }
}

/// A required record in a strict check list.
#[derive(Clone, Copy, Debug)]
pub struct Required {
    /// Tag that must appear.
    pub tag: u16,
    /// Exact payload length, when the format fixes it.
    pub len: Option<u32>,
}

impl Required {
    /// Required tag with a fixed payload length.
    pub const fn fixed(tag: u16, len: u32) -> Self {
        Self {
            tag,
            len: Some(len),
        }
    }

    /// Required tag whose payload length varies.
    pub const fn any(tag: u16) -> Self {
        Self { tag, len: None }
    }
}

/// Strict structural check of a property stream.
///
/// Walks the stream once, consuming `required` in order. Tags below
/// the one currently expected are skipped; a tag above it fails
/// immediately, since streams are tag-ordered and a greater tag means
/// the expected one is absent. A required tag with the wrong length
/// also fails. Used by validators before any state is built.
pub fn check_required(data: &[u8], required: &[Required], what: &str) -> Result<(), WorldError> {
    let mut want = required.iter();
    let mut cur = want.next();
    for prop in PropIter::new(data) {
        let Some(req) = cur else { break };
        if prop.tag > req.tag {
            return Err(WorldError::invalid(format!(
                "{what}: missing property {:#06x}",
                req.tag
            )));
        }
        if prop.tag == req.tag {
            if let Some(len) = req.len {
                if prop.payload.len() as u32 != len {
                    return Err(WorldError::invalid(format!(
                        "{what}: property {:#06x} has length {} (wanted {len})",
                        prop.tag,
                        prop.payload.len()
                    )));
                }
            }
            cur = want.next();
        }
    }
    if let Some(req) = cur {
        return Err(WorldError::invalid(format!(
            "{what}: missing property {:#06x}",
            req.tag
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_byte_layout() {
        let mut w = PropWriter::new();
        w.prop_c(0x6241, b'X');
        assert_eq!(w.buf, [b'A', b'b', 0x01, 0, 0, 0, b'X']);

        let mut w = PropWriter::new();
        w.prop_w(0x6241, 0x1234);
        assert_eq!(w.buf, [b'A', b'b', 0x02, 0, 0, 0, 0x34, 0x12]);

        let mut w = PropWriter::new();
        w.prop_d(0x6241, 0x12345678);
        assert_eq!(w.buf, [b'A', b'b', 0x04, 0, 0, 0, 0x78, 0x56, 0x34, 0x12]);

        let mut w = PropWriter::new();
        w.prop_s(0x6241, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(w.buf, [b'A', b'b', 0x08, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn reserved_payload_is_zero_filled_and_patchable() {
        let mut w = PropWriter::new();
        let pos = w.prop_v(0x0001, 5);
        assert_eq!(&w.buf[pos..], &[0; 5]);
        w.payload_mut(pos, 5).copy_from_slice(b"value");
        let out = w.finish();
        assert_eq!(out, [0x01, 0x00, 0x05, 0, 0, 0, b'v', b'a', b'l', b'u', b'e', 0, 0]);
    }

    #[test]
    fn iterator_stops_at_terminator() {
        let input = [
            0x01, 0x00, 0x05, 0x00, 0x00, 0x00, b'A', b'B', b'C', b'D', b'E', //
            0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF, //
            0x00, 0x00,
        ];
        let mut it = PropIter::new(&input);
        let p = it.next().unwrap();
        assert_eq!((p.tag, p.payload), (0x0001, &b"ABCDE"[..]));
        let p = it.next().unwrap();
        assert_eq!((p.tag, p.payload), (0x0002, &[0xFF][..]));
        assert!(it.next().is_none());
    }

    #[test]
    fn iterator_stops_on_truncation() {
        let input = [
            0x01, 0x00, 0x05, 0x00, 0x00, 0x00, b'A', b'B', b'C', b'D', b'E',
        ];
        // Truncated header.
        let mut it = PropIter::new(&input[..4]);
        assert!(it.next().is_none());
        // Truncated payload.
        let mut it = PropIter::new(&input[..PROP_HEADER_SIZE + 2]);
        assert!(it.next().is_none());
    }

    #[test]
    fn int_widths() {
        let input = [
            0x00, 0xff, 0x00, 0x00, 0x00, 0x00, //
            0x01, 0x01, 0x01, 0x00, 0x00, 0x00, b'a', //
            0x02, 0x02, 0x02, 0x00, 0x00, 0x00, b'b', b'b', //
            0x03, 0x03, 0x03, 0x00, 0x00, 0x00, b'c', b'c', b'c', //
            0x04, 0x04, 0x04, 0x00, 0x00, 0x00, b'd', b'd', b'd', b'd', //
            0x05, 0x05, 0x05, 0x00, 0x00, 0x00, b'e', b'e', b'e', b'e', b'e', //
            0x00, 0x00,
        ];
        let expected: &[(u16, usize, i32)] = &[
            (0xff00, 0, 0),
            (0x0101, 1, b'a' as i32),
            (0x0202, 2, ((b'b' as i32) << 8) | b'b' as i32),
            (0x0303, 3, 0),
            (
                0x0404,
                4,
                ((b'd' as i32) << 24) | ((b'd' as i32) << 16) | ((b'd' as i32) << 8) | b'd' as i32,
            ),
            (0x0505, 5, 0),
        ];
        let mut it = PropIter::new(&input);
        for &(tag, len, value) in expected {
            let p = it.next().unwrap();
            assert_eq!(p.tag, tag);
            assert_eq!(p.payload.len(), len);
            assert_eq!(p.int(), value);
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn strict_check_enforces_order_and_length() {
        let mut w = PropWriter::new();
        w.prop_c(0x0001, 1);
        w.prop_w(0x0004, 4); // unknown to the list, skipped
        w.prop_w(0x0007, 7);
        let data = w.finish();

        let ok = [Required::fixed(0x0001, 1), Required::fixed(0x0007, 2)];
        assert!(check_required(&data, &ok, "test").is_ok());

        // A reversed list leaves its second entry unsatisfied.
        let reversed = [Required::any(0x0007), Required::any(0x0001)];
        assert!(check_required(&data, &reversed, "test").is_err());

        let missing = [Required::any(0x0009)];
        let err = check_required(&data, &missing, "test").unwrap_err();
        assert!(err.to_string().contains("0x0009"));

        let wrong_len = [Required::fixed(0x0001, 4)];
        assert!(check_required(&data, &wrong_len, "test").is_err());
    }

    #[test]
    fn strict_check_rejects_tags_past_the_expected_one() {
        // 0x0003 arrives while 0x0002 is still pending, so the stream
        // is out of order even though both tags are present.
        let mut w = PropWriter::new();
        w.prop_c(0x0003, 3);
        w.prop_c(0x0002, 2);
        w.prop_c(0x0003, 3);
        let data = w.finish();
        let list = [Required::any(0x0002), Required::any(0x0003)];
        let err = check_required(&data, &list, "test").unwrap_err();
        assert!(err.to_string().contains("0x0002"));

        // An unknown greater tag is just as fatal: ordered streams
        // never place one before the expected tag.
        let mut w = PropWriter::new();
        w.prop_c(0x0005, 5);
        w.prop_c(0x0002, 2);
        let data = w.finish();
        assert!(check_required(&data, &[Required::any(0x0002)], "test").is_err());
    }

    proptest::proptest! {
        #[test]
        fn written_streams_parse_back(
            records in proptest::collection::vec(
                (1u16..0x7fff, proptest::collection::vec(proptest::prelude::any::<u8>(), 0..32)),
                0..20,
            )
        ) {
            let mut w = PropWriter::new();
            for (tag, payload) in &records {
                w.prop_s(*tag, payload);
            }
            let data = w.finish();
            let read: Vec<_> = PropIter::new(&data)
                .map(|p| (p.tag, p.payload.to_vec()))
                .collect();
            proptest::prop_assert_eq!(read, records);
        }
    }
}
