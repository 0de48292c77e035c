//! Wire-level access for validation
//!
//! Big-endian field reads that never panic: every read is bounds checked and
//! reports `None` when the field does not fit. The common OpenFlow header is
//! parsed zero-copy.

use byteorder::{BigEndian, ByteOrder};
use zerocopy::byteorder::{BigEndian as Be, U16, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Ref, Unaligned};

/// Smallest legal message: the common header alone
pub const OF_MESSAGE_MIN_LENGTH: usize = 8;

/// Variable-length matches are padded to this many bytes
pub const OF_MATCH_ALIGNMENT: usize = 8;

/// Common header carried by every OpenFlow message (8 bytes)
///
/// ```text
/// ┌─────────┬──────┬────────┬─────┐
/// │ version │ type │ length │ xid │
/// │ u8      │ u8   │ u16    │ u32 │
/// └─────────┴──────┴────────┴─────┘
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes, Unaligned)]
pub struct OfHeader {
    pub version: u8,
    pub msg_type: u8,
    pub length: U16<Be>,
    pub xid: U32<Be>,
}

impl OfHeader {
    pub const SIZE: usize = 8;

    pub fn new(version: u8, msg_type: u8, length: u16, xid: u32) -> Self {
        Self {
            version,
            msg_type,
            length: U16::new(length),
            xid: U32::new(xid),
        }
    }

    /// Total message length claimed by the header
    pub fn length(&self) -> u16 {
        self.length.get()
    }
}

/// Borrow the header from the front of `buf`
pub fn parse_header(buf: &[u8]) -> Option<&OfHeader> {
    Ref::<_, OfHeader>::new_from_prefix(buf).map(|(header, _)| header.into_ref())
}

pub fn read_u16(buf: &[u8], offset: usize) -> Option<u16> {
    buf.get(offset..offset.checked_add(2)?).map(BigEndian::read_u16)
}

pub fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset.checked_add(4)?).map(BigEndian::read_u32)
}

/// Read an unsigned field of 1, 2 or 4 bytes
pub fn read_uint(buf: &[u8], offset: usize, width: u8) -> Option<u32> {
    match width {
        1 => buf.get(offset).map(|&b| u32::from(b)),
        2 => read_u16(buf, offset).map(u32::from),
        4 => read_u32(buf, offset),
        _ => None,
    }
}

/// Encoded size of a variable-length match whose length field reads `length`
pub fn match_bytes(length: u16) -> usize {
    let length = length as usize;
    length.div_ceil(OF_MATCH_ALIGNMENT) * OF_MATCH_ALIGNMENT
}

/// Largest value a discriminator field of `width` bytes can carry
pub fn max_for_width(width: u8) -> u32 {
    match width {
        1 => u8::MAX as u32,
        2 => u16::MAX as u32,
        _ => u32::MAX,
    }
}
