//! Wire codec for claim record batches.
//!
//! The ledger returns `vector<DailyClaimInfo>` in BCS: a ULEB128 element
//! count followed by the records, each laid out as
//!
//! ```text
//! u8            day_of_week
//! u64 LE        amount_claimed
//! u64 LE        timestamp
//! uleb128 + []  verse_reference
//! u64 LE        claim_day
//! u64 LE        streak_at_claim
//! ```
//!
//! Every read takes the current offset and returns the value together with
//! the offset just past it. Reads never go out of bounds: running off the end
//! of the buffer is `DecodeError::TruncatedRecord`.

use crate::constants::MIN_ENCODED_RECORD_LEN;
use crate::errors::{DecodeError, DecodeResult};
use crate::record::ClaimRecord;

// ============================================================================
// Primitive Readers
// ============================================================================

/// Read a ULEB128 integer.
///
/// Any number of continuation bytes is accepted as long as the bits beyond
/// the 64th are zero; a value that needs more than 64 bits is malformed.
pub fn read_uleb128(buf: &[u8], offset: usize) -> DecodeResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    let mut pos = offset;

    loop {
        let byte = *buf
            .get(pos)
            .ok_or_else(|| DecodeError::truncated(pos, 1, buf.len()))?;
        pos += 1;

        let payload = u64::from(byte & 0x7f);
        if shift >= 64 {
            if payload != 0 {
                return Err(DecodeError::malformed_length(offset, "ULEB128 value exceeds 64 bits"));
            }
        } else if shift == 63 && payload > 1 {
            return Err(DecodeError::malformed_length(offset, "ULEB128 value exceeds 64 bits"));
        } else {
            value |= payload << shift;
        }

        if byte & 0x80 == 0 {
            return Ok((value, pos));
        }
        shift = shift.saturating_add(7);
    }
}

/// Read a single byte
pub fn read_u8(buf: &[u8], offset: usize) -> DecodeResult<(u8, usize)> {
    let byte = *buf
        .get(offset)
        .ok_or_else(|| DecodeError::truncated(offset, 1, buf.len()))?;
    Ok((byte, offset + 1))
}

/// Read a little-endian u64
pub fn read_u64(buf: &[u8], offset: usize) -> DecodeResult<(u64, usize)> {
    let end = offset
        .checked_add(8)
        .ok_or_else(|| DecodeError::truncated(offset, 8, buf.len()))?;
    let bytes: [u8; 8] = buf
        .get(offset..end)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| DecodeError::truncated(offset, 8, buf.len()))?;
    Ok((u64::from_le_bytes(bytes), end))
}

/// Read a ULEB128-length-prefixed byte vector
pub fn read_bytes(buf: &[u8], offset: usize) -> DecodeResult<(Vec<u8>, usize)> {
    let (len, start) = read_uleb128(buf, offset)?;
    let len = usize::try_from(len)
        .map_err(|_| DecodeError::malformed_length(offset, "vector length does not fit in usize"))?;
    let end = start
        .checked_add(len)
        .ok_or_else(|| DecodeError::malformed_length(offset, "vector end overflows usize"))?;
    let data = buf
        .get(start..end)
        .ok_or_else(|| DecodeError::truncated(start, len, buf.len()))?;
    Ok((data.to_vec(), end))
}

// ============================================================================
// Record Decoding
// ============================================================================

/// Decode one record starting at `offset`
pub fn decode_claim_record(buf: &[u8], offset: usize) -> DecodeResult<(ClaimRecord, usize)> {
    let (day_of_week, offset) = read_u8(buf, offset)?;
    let (amount_claimed, offset) = read_u64(buf, offset)?;
    let (timestamp, offset) = read_u64(buf, offset)?;
    let (verse_reference, offset) = read_bytes(buf, offset)?;
    let (claim_day, offset) = read_u64(buf, offset)?;
    let (streak_at_claim, offset) = read_u64(buf, offset)?;

    let record = ClaimRecord {
        day_of_week,
        amount_claimed,
        timestamp,
        verse_reference,
        claim_day,
        streak_at_claim,
    };
    Ok((record, offset))
}

/// Decode a count-prefixed batch of records.
///
/// An empty buffer means "no records" and decodes to an empty vector.
/// Bytes after the last record are ignored.
pub fn decode_claim_records(buf: &[u8]) -> DecodeResult<Vec<ClaimRecord>> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }

    let (count, mut offset) = read_uleb128(buf, 0)?;

    // Never trust the prefix for the allocation size
    let plausible = (buf.len() - offset) / MIN_ENCODED_RECORD_LEN;
    let capacity = usize::try_from(count).map_or(plausible, |count| count.min(plausible));
    let mut records = Vec::with_capacity(capacity);

    for _ in 0..count {
        let (record, next) = decode_claim_record(buf, offset)?;
        records.push(record);
        offset = next;
    }

    Ok(records)
}

// ============================================================================
// Encoding
// ============================================================================

/// Append a ULEB128 integer
pub fn write_uleb128(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Append a length-prefixed byte vector
pub fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    write_uleb128(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Append one record in wire layout
pub fn encode_claim_record(out: &mut Vec<u8>, record: &ClaimRecord) {
    out.push(record.day_of_week);
    out.extend_from_slice(&record.amount_claimed.to_le_bytes());
    out.extend_from_slice(&record.timestamp.to_le_bytes());
    write_bytes(out, &record.verse_reference);
    out.extend_from_slice(&record.claim_day.to_le_bytes());
    out.extend_from_slice(&record.streak_at_claim.to_le_bytes());
}

/// Encode a count-prefixed batch, the inverse of `decode_claim_records`
pub fn encode_claim_records(records: &[ClaimRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + records.len() * (MIN_ENCODED_RECORD_LEN + 16));
    write_uleb128(&mut out, records.len() as u64);
    for record in records {
        encode_claim_record(&mut out, record);
    }
    out
}
