// SPDX-License-Identifier: Apache-2.0

//! Self-delimiting binary frame format for durable segments.
//!
//! Each record is written as:
//!
//! ```text
//! [u32 len BE][u8 tag][payload][u32 crc32 BE]
//! ```
//!
//! `len` is the byte length of `tag` plus `payload` (not including itself
//! or the trailing checksum). `tag` discriminates [`Tuple::Data`] from
//! [`Tuple::Barrier`]. The length prefix lets a reader detect a torn
//! trailing write with a short read instead of attempting to interpret
//! partial bytes as a record, and the checksum catches corruption of an
//! otherwise complete frame.

use crate::node::NodeId;
use crate::tuple::{BarrierTuple, DataTuple, Tuple};
use std::io::{self, Read, Write};

const TAG_DATA: u8 = 0;
const TAG_BARRIER: u8 = 1;

/// Outcome of attempting to read one frame from a reader positioned at a
/// record boundary.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete, checksum-valid tuple.
    Tuple(Tuple),
    /// The reader was already at a clean end of stream (zero bytes read
    /// where a length prefix was expected).
    Eof,
    /// Fewer bytes were available than the frame declared; a trailing
    /// write was torn by a crash. Per policy this is only legal at the
    /// true end of the stream.
    Torn,
}

/// Encodes `tuple` as a single self-delimiting frame.
#[must_use]
pub fn encode(tuple: &Tuple) -> Vec<u8> {
    let mut body = Vec::new();
    match tuple {
        Tuple::Data(d) => {
            body.push(TAG_DATA);
            encode_node_id(&mut body, &d.producer);
            body.extend_from_slice(&d.seq.to_be_bytes());
            body.extend_from_slice(&(d.payload.len() as u32).to_be_bytes());
            body.extend_from_slice(&d.payload);
        }
        Tuple::Barrier(b) => {
            body.push(TAG_BARRIER);
            encode_node_id(&mut body, &b.producer);
            body.extend_from_slice(&b.version.to_be_bytes());
        }
    }

    let crc = crc32fast::hash(&body);
    let mut frame = Vec::with_capacity(4 + body.len() + 4);
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

/// Writes `tuple` to `w` as a single frame.
pub fn write_tuple<W: Write>(w: &mut W, tuple: &Tuple) -> io::Result<()> {
    w.write_all(&encode(tuple))
}

fn encode_node_id(out: &mut Vec<u8>, id: &NodeId) {
    out.extend_from_slice(&id.index().to_be_bytes());
    let name = id.name().as_bytes();
    out.extend_from_slice(&(name.len() as u16).to_be_bytes());
    out.extend_from_slice(name);
}

/// Reads one frame from `r`. See [`ReadOutcome`] for the three outcomes.
///
/// # Errors
///
/// Returns an error with the message `"corrupt"` (callers should translate
/// this into [`crate::WindowError::CorruptSegment`] with segment context)
/// when a complete frame's checksum does not match its payload.
pub fn read_frame<R: Read>(r: &mut R) -> io::Result<ReadOutcome> {
    let mut len_buf = [0u8; 4];
    match read_exact_or_eof(r, &mut len_buf)? {
        FillOutcome::Empty => return Ok(ReadOutcome::Eof),
        FillOutcome::Partial => return Ok(ReadOutcome::Torn),
        FillOutcome::Full => {}
    }
    let len = u32::from_be_bytes(len_buf) as usize;

    let mut body = vec![0u8; len];
    if !body.is_empty() {
        match read_exact_or_eof(r, &mut body)? {
            FillOutcome::Full => {}
            FillOutcome::Empty | FillOutcome::Partial => return Ok(ReadOutcome::Torn),
        }
    }

    let mut crc_buf = [0u8; 4];
    match read_exact_or_eof(r, &mut crc_buf)? {
        FillOutcome::Full => {}
        FillOutcome::Empty | FillOutcome::Partial => return Ok(ReadOutcome::Torn),
    }
    let expected_crc = u32::from_be_bytes(crc_buf);
    let actual_crc = crc32fast::hash(&body);
    if actual_crc != expected_crc {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt"));
    }

    decode_body(&body).map(ReadOutcome::Tuple)
}

fn decode_body(body: &[u8]) -> io::Result<Tuple> {
    let bad = || io::Error::new(io::ErrorKind::InvalidData, "corrupt");
    if body.is_empty() {
        return Err(bad());
    }
    let tag = body[0];
    let mut cursor = &body[1..];

    let producer = decode_node_id(&mut cursor).ok_or_else(bad)?;

    match tag {
        TAG_DATA => {
            if cursor.len() < 8 {
                return Err(bad());
            }
            let (seq_bytes, rest) = cursor.split_at(8);
            let seq = u64::from_be_bytes(seq_bytes.try_into().map_err(|_| bad())?);
            if rest.len() < 4 {
                return Err(bad());
            }
            let (len_bytes, payload) = rest.split_at(4);
            let payload_len = u32::from_be_bytes(len_bytes.try_into().map_err(|_| bad())?) as usize;
            if payload.len() != payload_len {
                return Err(bad());
            }
            Ok(Tuple::Data(DataTuple {
                producer,
                seq,
                payload: payload.to_vec(),
            }))
        }
        TAG_BARRIER => {
            if cursor.len() != 8 {
                return Err(bad());
            }
            let version = u64::from_be_bytes(cursor.try_into().map_err(|_| bad())?);
            Ok(Tuple::Barrier(BarrierTuple { producer, version }))
        }
        _ => Err(bad()),
    }
}

fn decode_node_id(cursor: &mut &[u8]) -> Option<NodeId> {
    if cursor.len() < 6 {
        return None;
    }
    let (index_bytes, rest) = cursor.split_at(4);
    let index = u32::from_be_bytes(index_bytes.try_into().ok()?);
    let (name_len_bytes, rest) = rest.split_at(2);
    let name_len = u16::from_be_bytes(name_len_bytes.try_into().ok()?) as usize;
    if rest.len() < name_len {
        return None;
    }
    let (name_bytes, rest) = rest.split_at(name_len);
    let name = std::str::from_utf8(name_bytes).ok()?.to_owned();
    *cursor = rest;
    Some(NodeId::new(index, name))
}

enum FillOutcome {
    Full,
    Partial,
    Empty,
}

/// Fills `buf` from `r`, distinguishing a clean zero-byte EOF from a short
/// read that leaves `buf` partially filled.
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<FillOutcome> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(if filled == 0 {
        FillOutcome::Empty
    } else if filled == buf.len() {
        FillOutcome::Full
    } else {
        FillOutcome::Partial
    })
}
