//! RefPack (QFS) decompressor.
//!
//! RefPack is the byte-oriented LZ77 variant used for compressed package
//! entries. A stream starts with a small header:
//!
//! - 2 bytes: flags and magic (`0x10 0xFB`, or `0x11 0xFB` with an extended
//!   header)
//! - 3 bytes: uncompressed length, big-endian
//! - 3 bytes: present only when bit 0 of the first byte is set
//!
//! followed by a sequence of opcodes. Each opcode copies up to a few literal
//! bytes from the input and then (except for the literal-only forms) repeats
//! bytes already produced:
//!
//! | opcode | literals | match length | match distance | control bytes |
//! |--------|----------|--------------|----------------|---------------|
//! | `0xxxxxxx` | `op & 3` | `((op & 0x1C) >> 2) + 3` | `((op >> 5) << 8) + a + 1` | 2 |
//! | `10xxxxxx` | `a >> 6` | `(op & 0x3F) + 4` | `(a & 0x3F) * 256 + b + 1` | 3 |
//! | `110xxxxx` | `op & 3` | `((op >> 2) & 3) * 256 + c + 5` | `((op & 0x10) << 12) + 256 * a + b + 1` | 4 |
//! | `111xxxxx` | `(op & 0x1F) * 4 + 4` | - | - | 1 |
//!
//! An opcode of `0xFC` or above ends the stream after copying `op & 3`
//! trailing literals.

use crate::format::reader::ByteReader;
use crate::{Error, Result};

/// Second byte of every RefPack stream.
pub const MAGIC: u8 = 0xFB;

/// Flag bit selecting the 8-byte stream header.
const FLAG_EXTENDED_HEADER: u8 = 0x01;

/// Opcodes at or above this value terminate the stream.
const TERMINATOR: u8 = 0xFC;

/// The fixed header at the start of a RefPack stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// The flag byte (`0x10` or `0x11` in practice).
    pub flags: u8,
    /// Uncompressed length declared by the stream.
    pub uncompressed_size: usize,
    /// Offset of the first opcode.
    pub data_offset: usize,
}

impl StreamHeader {
    /// Parses the stream header.
    ///
    /// The magic byte is not validated here; callers that need to recognise
    /// a stream should use [`super::unwrap_entry`].
    pub fn parse(input: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(input);
        let flags = r.read_u8()?;
        r.skip(1)?;
        let size = r.read_array::<3>()?;
        let uncompressed_size = u32::from_be_bytes([0, size[0], size[1], size[2]]) as usize;
        let data_offset = if flags & FLAG_EXTENDED_HEADER != 0 { 8 } else { 5 };
        if input.len() < data_offset {
            return Err(Error::truncated(r.position(), data_offset - r.position(), r.remaining()));
        }
        Ok(Self {
            flags,
            uncompressed_size,
            data_offset,
        })
    }
}

/// A decoded opcode: literal count plus an optional `(length, distance)`
/// back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Op {
    literals: usize,
    copy: Option<(usize, usize)>,
}

/// Number of control bytes (opcode included) for an opcode.
fn control_len(op: u8) -> usize {
    if op & 0x80 == 0 {
        2
    } else if op & 0x40 == 0 {
        3
    } else if op & 0x20 == 0 {
        4
    } else {
        1
    }
}

fn classify(ctrl: &[u8]) -> Op {
    let op = ctrl[0];
    let byte = |i: usize| ctrl[i] as usize;
    match ctrl.len() {
        2 => Op {
            literals: (op & 0x03) as usize,
            copy: Some((
                (((op & 0x1C) >> 2) as usize) + 3,
                (((op >> 5) as usize) << 8) + byte(1) + 1,
            )),
        },
        3 => Op {
            literals: (byte(1) >> 6) & 0x03,
            copy: Some((
                (op & 0x3F) as usize + 4,
                (byte(1) & 0x3F) * 256 + byte(2) + 1,
            )),
        },
        4 => Op {
            literals: (op & 0x03) as usize,
            copy: Some((
                ((op >> 2) & 0x03) as usize * 256 + byte(3) + 5,
                (((op & 0x10) as usize) << 12) + 256 * byte(1) + byte(2) + 1,
            )),
        },
        _ => Op {
            literals: (op & 0x1F) as usize * 4 + 4,
            copy: None,
        },
    }
}

/// Output buffer bounded by the declared size.
struct Output {
    buf: Vec<u8>,
    limit: usize,
}

impl Output {
    fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(limit),
            limit,
        }
    }

    fn ensure_room(&self, n: usize, at: usize) -> Result<()> {
        if self.buf.len() + n > self.limit {
            return Err(Error::CorruptStream {
                key: None,
                offset: at as u64,
                reason: format!(
                    "output overrun: {} + {} bytes exceeds declared size {}",
                    self.buf.len(),
                    n,
                    self.limit
                ),
            });
        }
        Ok(())
    }

    fn literal(&mut self, bytes: &[u8], at: usize) -> Result<()> {
        self.ensure_room(bytes.len(), at)?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Repeats `length` bytes starting `distance` bytes back.
    ///
    /// Copies one byte at a time: when `distance < length` the source range
    /// runs into bytes written by this same copy.
    fn back_ref(&mut self, length: usize, distance: usize, at: usize) -> Result<()> {
        if distance > self.buf.len() {
            return Err(Error::CorruptStream {
                key: None,
                offset: at as u64,
                reason: format!(
                    "back-reference distance {} exceeds {} bytes of output",
                    distance,
                    self.buf.len()
                ),
            });
        }
        self.ensure_room(length, at)?;
        let start = self.buf.len() - distance;
        for i in 0..length {
            let byte = self.buf[start + i];
            self.buf.push(byte);
        }
        Ok(())
    }
}

/// Decompresses a RefPack stream.
///
/// If `expected_size` is given (typically from the package's compression
/// directory) and differs from the size declared in the stream header,
/// decoding is not attempted.
///
/// # Errors
///
/// - [`Error::SizeMismatch`] if `expected_size` disagrees with the header.
/// - [`Error::TruncatedData`] if the input ends inside an opcode or its
///   literals, or the stream ends before the declared size is produced.
/// - [`Error::CorruptStream`] if a back-reference points before the start of
///   the output or the output would exceed the declared size.
pub fn decode(input: &[u8], expected_size: Option<usize>) -> Result<Vec<u8>> {
    let header = StreamHeader::parse(input)?;
    match expected_size {
        Some(expected) if expected != header.uncompressed_size => {
            return Err(Error::SizeMismatch {
                key: None,
                declared: header.uncompressed_size,
                expected,
            });
        }
        _ => {}
    }

    let mut out = Output::with_limit(header.uncompressed_size);
    let mut r = ByteReader::at(input, header.data_offset);

    while !r.is_empty() {
        let at = r.position();
        let op = r.peek_bytes(1)?[0];

        if op >= TERMINATOR {
            r.skip(1)?;
            let tail = r.read_bytes((op & 0x03) as usize)?;
            out.literal(tail, at)?;
            break;
        }

        let ctrl = r.read_bytes(control_len(op))?;
        let step = classify(ctrl);
        let literals = r.read_bytes(step.literals)?;
        out.literal(literals, at)?;
        if let Some((length, distance)) = step.copy {
            out.back_ref(length, distance, at)?;
        }
    }

    if out.buf.len() < header.uncompressed_size {
        return Err(Error::TruncatedData {
            key: None,
            offset: r.position() as u64,
            needed: header.uncompressed_size,
            available: out.buf.len(),
        });
    }

    log::trace!(
        "refpack: {} -> {} bytes",
        input.len(),
        header.uncompressed_size
    );
    Ok(out.buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(size: u32, body: &[u8]) -> Vec<u8> {
        let be = size.to_be_bytes();
        let mut data = vec![0x10, MAGIC, be[1], be[2], be[3]];
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_overlapping_back_reference() {
        // one literal 'A', then repeat 10 bytes from distance 1
        let data = stream(11, &[0x1D, 0x00, 0x41, 0xFC]);
        let out = decode(&data, None).unwrap();
        assert_eq!(out, vec![0x41; 11]);
    }

    #[test]
    fn test_three_byte_form() {
        let data = stream(8, &[0xE0, b'a', b'b', b'c', b'd', 0x80, 0x00, 0x03, 0xFC]);
        assert_eq!(decode(&data, None).unwrap(), b"abcdabcd");
    }

    #[test]
    fn test_four_byte_form() {
        let data = stream(9, &[0xE0, b'a', b'b', b'c', b'd', 0xC0, 0x00, 0x03, 0x00, 0xFC]);
        assert_eq!(decode(&data, None).unwrap(), b"abcdabcda");
    }

    #[test]
    fn test_terminator_literals() {
        let data = stream(6, &[0xE0, b'a', b'b', b'c', b'd', 0xFE, b'y', b'z']);
        assert_eq!(decode(&data, None).unwrap(), b"abcdyz");
    }

    #[test]
    fn test_stream_without_terminator() {
        let data = stream(4, &[0xE0, b'w', b'x', b'y', b'z']);
        assert_eq!(decode(&data, None).unwrap(), b"wxyz");
    }

    #[test]
    fn test_extended_header_offset() {
        let mut data = vec![0x11, MAGIC, 0x00, 0x00, 0x02, 0xAA, 0xBB, 0xCC];
        data.extend_from_slice(&[0xFE, b'o', b'k']);
        assert_eq!(decode(&data, None).unwrap(), b"ok");
    }

    #[test]
    fn test_size_mismatch_checked_first() {
        // body is garbage; the mismatch must be reported before decoding
        let data = stream(100, &[0x00]);
        match decode(&data, Some(109)) {
            Err(Error::SizeMismatch {
                declared, expected, ..
            }) => {
                assert_eq!(declared, 100);
                assert_eq!(expected, 109);
            }
            other => panic!("expected SizeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_short_output_is_truncation() {
        let data = stream(20, &[0xE0, b'a', b'b', b'c', b'd', 0xFC]);
        match decode(&data, None) {
            Err(Error::TruncatedData {
                needed, available, ..
            }) => {
                assert_eq!(needed, 20);
                assert_eq!(available, 4);
            }
            other => panic!("expected TruncatedData, got {:?}", other),
        }
    }

    #[test]
    fn test_input_ends_mid_opcode() {
        let data = stream(8, &[0xE0, b'a', b'b', b'c', b'd', 0x80, 0x00]);
        assert!(matches!(
            decode(&data, None),
            Err(Error::TruncatedData { offset: 10, .. })
        ));
    }

    #[test]
    fn test_input_ends_mid_literal() {
        let data = stream(8, &[0xE1, b'a', b'b']);
        assert!(matches!(decode(&data, None), Err(Error::TruncatedData { .. })));
    }

    #[test]
    fn test_distance_before_start() {
        let data = stream(10, &[0x1D, 0x05, 0x41, 0xFC]);
        assert!(matches!(decode(&data, None), Err(Error::CorruptStream { .. })));
    }

    #[test]
    fn test_output_overrun() {
        let data = stream(5, &[0x1D, 0x00, 0x41, 0xFC]);
        assert!(matches!(decode(&data, None), Err(Error::CorruptStream { .. })));
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            decode(&[0x10, MAGIC, 0x00], None),
            Err(Error::TruncatedData { .. })
        ));
        assert!(matches!(
            decode(&[0x11, MAGIC, 0x00, 0x00, 0x01, 0x00], None),
            Err(Error::TruncatedData { .. })
        ));
    }

    #[test]
    fn test_empty_payload() {
        let data = stream(0, &[0xFC]);
        assert!(decode(&data, Some(0)).unwrap().is_empty());
    }
}
