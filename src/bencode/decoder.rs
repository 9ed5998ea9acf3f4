use super::{BencodeDict, BencodeValue};
use crate::error::{ResumeError, Result};
use bytes::Bytes;
use std::collections::btree_map::Entry;
use tracing::debug;

/// Most lists/dicts that may be open at once; the root container is the first
pub const MAX_DEPTH: usize = 1000;

/// Decode bencoded data into a BencodeValue.
///
/// The whole buffer must hold exactly one value; bytes after it are an error.
pub fn decode(data: &[u8]) -> Result<BencodeValue> {
    let mut pos = 0;
    let value = decode_value(data, &mut pos, 0)?;

    if pos != data.len() {
        return Err(ResumeError::malformed(
            pos,
            format!("{} trailing bytes after root value", data.len() - pos),
        ));
    }

    Ok(value)
}

/// `depth` counts the containers enclosing the value at `pos`
fn decode_value(data: &[u8], pos: &mut usize, depth: usize) -> Result<BencodeValue> {
    let Some(&token) = data.get(*pos) else {
        return Err(ResumeError::malformed(*pos, "unexpected end of input"));
    };

    if matches!(token, b'l' | b'd') && depth >= MAX_DEPTH {
        return Err(ResumeError::NestingTooDeep {
            offset: *pos,
            max_depth: MAX_DEPTH,
        });
    }

    match token {
        b'i' => decode_integer(data, pos),
        b'l' => decode_list(data, pos, depth),
        b'd' => decode_dict(data, pos, depth),
        b'0'..=b'9' => decode_string(data, pos).map(BencodeValue::String),
        c => Err(ResumeError::malformed(
            *pos,
            format!("invalid bencode token 0x{:02x}", c),
        )),
    }
}

fn decode_integer(data: &[u8], pos: &mut usize) -> Result<BencodeValue> {
    *pos += 1; // Skip 'i'

    let start = *pos;
    while *pos < data.len() && data[*pos] != b'e' {
        *pos += 1;
    }

    if *pos >= data.len() {
        return Err(ResumeError::malformed(*pos, "unterminated integer"));
    }

    let num = parse_integer(&data[start..*pos])
        .map_err(|reason| ResumeError::malformed(start, reason))?;

    *pos += 1; // Skip 'e'

    Ok(BencodeValue::Integer(num))
}

fn parse_integer(raw: &[u8]) -> std::result::Result<i64, String> {
    let digits = raw.strip_prefix(b"-").unwrap_or(raw);

    if digits.is_empty() {
        return Err("empty integer".to_string());
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(format!(
            "invalid integer digits '{}'",
            String::from_utf8_lossy(raw)
        ));
    }
    if digits[0] == b'0' && (digits.len() > 1 || digits.len() != raw.len()) {
        return Err(format!(
            "disallowed leading zero in '{}'",
            String::from_utf8_lossy(raw)
        ));
    }

    // Only ASCII digits and an optional sign remain at this point
    std::str::from_utf8(raw)
        .map_err(|_| "invalid integer".to_string())?
        .parse::<i64>()
        .map_err(|_| format!("integer '{}' out of range", String::from_utf8_lossy(raw)))
}

fn decode_string(data: &[u8], pos: &mut usize) -> Result<Bytes> {
    let start = *pos;
    while *pos < data.len() && data[*pos].is_ascii_digit() {
        *pos += 1;
    }

    match data.get(*pos) {
        Some(&b':') => {}
        Some(&c) => {
            return Err(ResumeError::malformed(
                *pos,
                format!("invalid byte 0x{:02x} in string length", c),
            ))
        }
        None => return Err(ResumeError::malformed(*pos, "unterminated string length")),
    }

    if *pos == start {
        return Err(ResumeError::malformed(start, "missing string length"));
    }

    let len = std::str::from_utf8(&data[start..*pos])
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| ResumeError::malformed(start, "string length out of range"))?;

    *pos += 1; // Skip ':'

    let remaining = data.len() - *pos;
    if len > remaining {
        return Err(ResumeError::malformed(
            start,
            format!("string length {} exceeds remaining {} bytes", len, remaining),
        ));
    }

    let string = Bytes::copy_from_slice(&data[*pos..*pos + len]);
    *pos += len;

    Ok(string)
}

fn decode_list(data: &[u8], pos: &mut usize, depth: usize) -> Result<BencodeValue> {
    *pos += 1; // Skip 'l'

    let mut list = Vec::new();

    while *pos < data.len() && data[*pos] != b'e' {
        list.push(decode_value(data, pos, depth + 1)?);
    }

    if *pos >= data.len() {
        return Err(ResumeError::malformed(*pos, "unterminated list"));
    }

    *pos += 1; // Skip 'e'

    Ok(BencodeValue::List(list))
}

fn decode_dict(data: &[u8], pos: &mut usize, depth: usize) -> Result<BencodeValue> {
    *pos += 1; // Skip 'd'

    let mut dict = BencodeDict::new();

    while *pos < data.len() && data[*pos] != b'e' {
        // Keys must be strings
        if !data[*pos].is_ascii_digit() {
            return Err(ResumeError::malformed(
                *pos,
                "dictionary key must be a byte string",
            ));
        }
        let key_offset = *pos;
        let key = decode_string(data, pos)?;
        let value = decode_value(data, pos, depth + 1)?;

        // First occurrence wins
        match dict.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(slot) => {
                debug!(
                    "Ignoring duplicate dictionary key '{}' at byte {}",
                    String::from_utf8_lossy(slot.key()),
                    key_offset
                );
            }
        }
    }

    if *pos >= data.len() {
        return Err(ResumeError::malformed(*pos, "unterminated dictionary"));
    }

    *pos += 1; // Skip 'e'

    Ok(BencodeValue::Dict(dict))
}
