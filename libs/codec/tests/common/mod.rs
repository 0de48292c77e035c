//! Wire fixtures shared by the integration tests

#![allow(dead_code)]

use codec::wire::{match_bytes, OfHeader};
use zerocopy::AsBytes;

/// Header plus `body`, with the header length set to the total
pub fn message(version: u8, msg_type: u8, body: &[u8]) -> Vec<u8> {
    let len = u16::try_from(OfHeader::SIZE + body.len()).expect("message fits u16 length");
    let mut buf = OfHeader::new(version, msg_type, len, 0x1234_5678)
        .as_bytes()
        .to_vec();
    buf.extend_from_slice(body);
    buf
}

/// TLV16 element: type, total length, body
pub fn tlv(tag: u16, body: &[u8]) -> Vec<u8> {
    let mut out = tag.to_be_bytes().to_vec();
    out.extend_from_slice(&((body.len() + 4) as u16).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// 1.3 output action (16 bytes)
pub fn action_output_v13(port: u32) -> Vec<u8> {
    let mut body = port.to_be_bytes().to_vec();
    body.extend_from_slice(&[0xff, 0xe5]);
    body.extend_from_slice(&[0u8; 6]);
    tlv(0, &body)
}

/// 1.0 output action (8 bytes)
pub fn action_output_v10(port: u16) -> Vec<u8> {
    let mut body = port.to_be_bytes().to_vec();
    body.extend_from_slice(&[0, 0]);
    tlv(0, &body)
}

pub fn goto_table(table_id: u8) -> Vec<u8> {
    tlv(1, &[table_id, 0, 0, 0])
}

pub fn apply_actions(actions: &[u8]) -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(actions);
    tlv(4, &body)
}

/// OXM-style match: type 1, `length` covering header and `oxm`, padded to 8
pub fn match_v3(length: u16, oxm: &[u8]) -> Vec<u8> {
    let mut out = 1u16.to_be_bytes().to_vec();
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(oxm);
    out.resize(match_bytes(length).max(out.len()), 0);
    out
}

/// 1.3 flow_add: 40 fixed bytes after the header, then match, then instructions
pub fn flow_add_v13(matched: &[u8], instructions: &[u8]) -> Vec<u8> {
    let mut body = vec![0u8; 40];
    // command (offset 25 in the message) = add
    body[25 - 8] = 0;
    body[26 - 8..28 - 8].copy_from_slice(&60u16.to_be_bytes());
    body.extend_from_slice(matched);
    body.extend_from_slice(instructions);
    message(4, 14, &body)
}

/// 1.0 packet_out with `actions_len` written as given
pub fn packet_out_v10(actions_len: u16, actions: &[u8], data: &[u8]) -> Vec<u8> {
    let mut body = 0xffff_ffffu32.to_be_bytes().to_vec();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&actions_len.to_be_bytes());
    body.extend_from_slice(actions);
    body.extend_from_slice(data);
    message(1, 13, &body)
}

/// 1.1+ packet_out; the last two pad bytes are written separately from
/// `actions_len`
pub fn packet_out_v13(actions_len: u16, pad_tail: u16, actions: &[u8], data: &[u8]) -> Vec<u8> {
    let mut body = 0xffff_ffffu32.to_be_bytes().to_vec();
    body.extend_from_slice(&1u32.to_be_bytes());
    body.extend_from_slice(&actions_len.to_be_bytes());
    body.extend_from_slice(&[0u8; 4]);
    body.extend_from_slice(&pad_tail.to_be_bytes());
    body.extend_from_slice(actions);
    body.extend_from_slice(data);
    message(4, 13, &body)
}
