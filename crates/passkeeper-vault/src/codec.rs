//! Tag-length-value codec for the record sequence.
//!
//! The wire format is a restricted DER subset:
//!
//! ```text
//! SEQUENCE (0x30, constructed)          — the whole vault payload
//!   SET (0x31, constructed)             — one record
//!     [0] primitive  service bytes
//!     [1] primitive  login bytes
//!     [2] primitive  password bytes
//!     [16] primitive comment bytes
//!   SET …
//! ```
//!
//! Lengths use the DER short form below 128 and the minimal long form above.
//! Only single-byte identifiers exist on this wire — every tag is below 31.
//!
//! Encoding is strict and canonical: non-empty cells only, role order,
//! all-empty records skipped. Decoding is deliberately lenient inside the
//! outer frame — unknown context-specific tags are reserved for future cells
//! and skipped, damage is contained to the record it occurs in, and
//! duplicated role tags concatenate into their cell. The lenient paths are
//! pinned by tests; the outer frame itself must span the payload exactly.

use crate::error::VaultError;
use crate::record::{CellRole, Record, RecordSet};

const CLASS_MASK: u8 = 0xC0;
const CLASS_CONTEXT: u8 = 0x80;
const CONSTRUCTED: u8 = 0x20;
const TAG_MASK: u8 = 0x1F;

/// Universal constructed SEQUENCE — the outer frame.
const SEQUENCE_IDENT: u8 = CONSTRUCTED | 16;

/// Universal constructed SET — one record frame.
const RECORD_IDENT: u8 = CONSTRUCTED | 17;

// ---------------------------------------------------------------------------
// Frame primitives
// ---------------------------------------------------------------------------

struct Frame {
    identifier: u8,
    len: usize,
}

impl Frame {
    const fn is_context_specific(&self) -> bool {
        self.identifier & CLASS_MASK == CLASS_CONTEXT
    }

    const fn tag(&self) -> u32 {
        (self.identifier & TAG_MASK) as u32
    }
}

/// Bytes needed for the big-endian long-form value of `len`.
// len >= 0x80 here, so at least one byte is produced and the shift count
// stays below usize::BITS.
#[allow(clippy::arithmetic_side_effects)]
const fn long_form_bytes(len: usize) -> usize {
    (((usize::BITS - len.leading_zeros()) + 7) / 8) as usize
}

/// Total header size (identifier + length octets) for a body of `len` bytes.
#[allow(clippy::arithmetic_side_effects)] // bounded by 2 + size_of::<usize>()
const fn header_len(len: usize) -> usize {
    if len < 0x80 {
        2
    } else {
        2 + long_form_bytes(len)
    }
}

#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
fn push_header(out: &mut Vec<u8>, identifier: u8, len: usize) {
    out.push(identifier);
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let count = long_form_bytes(len);
        out.push(0x80 | count as u8);
        let mut shift = count * 8;
        while shift > 0 {
            shift -= 8;
            out.push(((len >> shift) & 0xFF) as u8);
        }
    }
}

/// Parse one identifier + length header, advancing `cursor` past it.
///
/// Returns `None` on truncation, a multi-byte tag, an indefinite length, or
/// a length that does not fit in `usize` — all treated as damage by callers.
fn read_frame(data: &[u8], cursor: &mut usize) -> Option<Frame> {
    let identifier = *data.get(*cursor)?;
    let mut pos = cursor.checked_add(1)?;
    if identifier & TAG_MASK == TAG_MASK {
        return None;
    }

    let first = *data.get(pos)?;
    pos = pos.checked_add(1)?;
    let len = if first < 0x80 {
        usize::from(first)
    } else {
        let count = usize::from(first & 0x7F);
        if count == 0 || count > core::mem::size_of::<usize>() {
            return None;
        }
        let mut value = 0usize;
        for _ in 0..count {
            let byte = *data.get(pos)?;
            pos = pos.checked_add(1)?;
            if value > (usize::MAX >> 8) {
                return None;
            }
            #[allow(clippy::arithmetic_side_effects)] // guarded above
            {
                value = (value << 8) | usize::from(byte);
            }
        }
        value
    };

    *cursor = pos;
    Some(Frame { identifier, len })
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Size of one record frame, or 0 when the record is all-empty (skipped).
fn record_frame_len(record: &Record) -> usize {
    let mut inner = 0usize;
    for role in CellRole::ALL {
        let cell = record.cell(role);
        if !cell.is_empty() {
            inner = inner
                .saturating_add(header_len(cell.len()))
                .saturating_add(cell.len());
        }
    }
    if inner == 0 {
        0
    } else {
        header_len(inner).saturating_add(inner)
    }
}

#[allow(clippy::cast_possible_truncation)] // role tags are below 31
fn encode_record_into(record: &Record, out: &mut Vec<u8>) {
    let mut inner = 0usize;
    for role in CellRole::ALL {
        let cell = record.cell(role);
        if !cell.is_empty() {
            inner = inner
                .saturating_add(header_len(cell.len()))
                .saturating_add(cell.len());
        }
    }
    if inner == 0 {
        return;
    }
    push_header(out, RECORD_IDENT, inner);
    for role in CellRole::ALL {
        let cell = record.cell(role);
        if !cell.is_empty() {
            push_header(out, CLASS_CONTEXT | role.tag() as u8, cell.len());
            out.extend_from_slice(cell);
        }
    }
}

/// Encode one record as a standalone frame. `None` when the record is
/// all-empty and therefore not persisted.
#[must_use]
pub fn encode_record(record: &Record) -> Option<Vec<u8>> {
    let frame_len = record_frame_len(record);
    if frame_len == 0 {
        return None;
    }
    let mut out = Vec::with_capacity(frame_len);
    encode_record_into(record, &mut out);
    Some(out)
}

/// Encode the whole record set as one outer sequence frame.
///
/// Two passes: sizes first, then emission. A mismatch between the two is a
/// codec defect and surfaces as [`VaultError::Serialize`] rather than a
/// corrupt file.
///
/// # Errors
///
/// Returns [`VaultError::Serialize`] if the computed and written sizes
/// disagree or the sequence does not fit in memory arithmetic.
pub fn encode_records(set: &RecordSet) -> Result<Vec<u8>, VaultError> {
    let mut body_len = 0usize;
    for record in set {
        body_len = body_len
            .checked_add(record_frame_len(record))
            .ok_or_else(|| VaultError::Serialize("record sequence size overflow".into()))?;
    }
    let total = header_len(body_len)
        .checked_add(body_len)
        .ok_or_else(|| VaultError::Serialize("record sequence size overflow".into()))?;

    let mut out = Vec::with_capacity(total);
    push_header(&mut out, SEQUENCE_IDENT, body_len);
    for record in set {
        encode_record_into(record, &mut out);
    }

    if out.len() != total {
        return Err(VaultError::Serialize(format!(
            "expected {total} bytes, wrote {}",
            out.len()
        )));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parse one record frame. Damage never fails the call: a bad record header
/// skips the rest of the payload, a bad cell stops cell parsing, and the
/// cells recovered so far are returned either way.
fn decode_record(data: &[u8], cursor: &mut usize, end: usize) -> Record {
    let mut record = Record::default();

    let Some(frame) = read_frame(data, cursor) else {
        *cursor = end;
        return record;
    };
    if frame.identifier != RECORD_IDENT || frame.len > end.saturating_sub(*cursor) {
        *cursor = end;
        return record;
    }
    let record_end = cursor.saturating_add(frame.len);

    while *cursor < record_end {
        let Some(cell) = read_frame(data, cursor) else {
            break;
        };
        if !cell.is_context_specific() {
            break;
        }
        if cell.len > record_end.saturating_sub(*cursor) {
            break;
        }
        let body_end = cursor.saturating_add(cell.len);
        if let Some(role) = CellRole::from_tag(cell.tag()) {
            // Duplicated role tags concatenate — accepted leniency.
            record.cell_mut(role).extend_from_slice(&data[*cursor..body_end]);
        }
        *cursor = body_end;
    }

    *cursor = record_end;
    record
}

/// Decode a decrypted payload into records.
///
/// The outer sequence frame must be well-formed and span the payload
/// exactly; everything inside it is parsed leniently and all-empty records
/// are dropped.
///
/// # Errors
///
/// Returns [`VaultError::Structure`] when the outer frame is missing, has
/// the wrong identifier, or does not cover the whole payload.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<Record>, VaultError> {
    let mut cursor = 0usize;
    let Some(outer) = read_frame(bytes, &mut cursor) else {
        return Err(VaultError::Structure(
            "missing or malformed outer sequence header".into(),
        ));
    };
    if outer.identifier != SEQUENCE_IDENT {
        return Err(VaultError::Structure(format!(
            "unexpected outer frame identifier 0x{:02x}",
            outer.identifier
        )));
    }
    let end = cursor
        .checked_add(outer.len)
        .ok_or_else(|| VaultError::Structure("outer sequence length overflow".into()))?;
    if end != bytes.len() {
        return Err(VaultError::Structure(
            "outer sequence does not span the payload".into(),
        ));
    }

    let mut records = Vec::new();
    while cursor < end {
        let record = decode_record(bytes, &mut cursor, end);
        if !record.is_empty() {
            records.push(record);
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
