//! Binary framing for watched keys and values.
//!
//! The key record is `table_id (u64, big-endian)` followed by one
//! length-prefixed frame per key; the value record is
//! `version (i64, big-endian)` followed by length-prefixed `value` and
//! `extend` frames. Both directions are pure functions and must round-trip
//! byte-exact: the encoded key record doubles as the registry's index
//! address, so any asymmetry here corrupts index lookups.

use crate::CodecError;


const TABLE_ID_LEN: usize = 8;
const VERSION_LEN: usize = 8;
const FRAME_PREFIX_LEN: usize = 4;

/// Encodes a table id and its watched keys into one key record.
///
/// Deterministic and injective for any non-empty key sequence.
///
/// # Examples
/// ```
/// use key_watch::{decode_key, encode_key};
///
/// let buf = encode_key(42, &["foo", "bar"]).unwrap();
/// let (table_id, keys) = decode_key(&buf).unwrap();
/// assert_eq!(table_id, 42);
/// assert_eq!(keys, vec![b"foo".to_vec(), b"bar".to_vec()]);
/// ```
pub fn encode_key<K: AsRef<[u8]>>(
    table_id: u64,
    keys: &[K],
) -> std::result::Result<Vec<u8>, CodecError> {
    if keys.is_empty() {
        return Err(CodecError::EmptyKeys);
    }
    let payload: usize = keys.iter().map(|k| FRAME_PREFIX_LEN + k.as_ref().len()).sum();
    let mut buf = Vec::with_capacity(TABLE_ID_LEN + payload);
    buf.extend_from_slice(&table_id.to_be_bytes());
    for key in keys {
        put_frame(&mut buf, key.as_ref())?;
    }
    Ok(buf)
}

/// Decodes a key record back into `(table_id, keys)`.
///
/// Fails with [`CodecError::MalformedInput`] on a truncated buffer, a
/// length prefix exceeding the remaining bytes, or a partial trailing
/// frame. Output is never partially populated on failure.
pub fn decode_key(buf: &[u8]) -> std::result::Result<(u64, Vec<Vec<u8>>), CodecError> {
    let mut pos = 0;
    let table_id = take_fixed(buf, &mut pos, TABLE_ID_LEN, "truncated table id")?;
    let table_id = u64::from_be_bytes(table_id.try_into().expect("Guaranteed safe after length check"));

    let mut keys = Vec::new();
    while pos < buf.len() {
        keys.push(take_frame(buf, &mut pos)?.to_vec());
    }
    if keys.is_empty() {
        return Err(CodecError::EmptyKeys);
    }
    Ok((table_id, keys))
}

/// Encodes a value record: signed version, value bytes and opaque extend
/// metadata. The full `i64` range is supported, including the negative
/// sentinels the storage layer uses for deleted keys.
pub fn encode_value(
    version: i64,
    value: &[u8],
    extend: &[u8],
) -> std::result::Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(VERSION_LEN + 2 * FRAME_PREFIX_LEN + value.len() + extend.len());
    buf.extend_from_slice(&version.to_be_bytes());
    put_frame(&mut buf, value)?;
    put_frame(&mut buf, extend)?;
    Ok(buf)
}

/// Decodes a value record back into `(version, value, extend)`.
pub fn decode_value(buf: &[u8]) -> std::result::Result<(i64, Vec<u8>, Vec<u8>), CodecError> {
    let mut pos = 0;
    let version = take_fixed(buf, &mut pos, VERSION_LEN, "truncated version")?;
    let version = i64::from_be_bytes(version.try_into().expect("Guaranteed safe after length check"));

    let value = take_frame(buf, &mut pos)?.to_vec();
    let extend = take_frame(buf, &mut pos)?.to_vec();
    if pos != buf.len() {
        return Err(CodecError::MalformedInput("trailing bytes after extend frame"));
    }
    Ok((version, value, extend))
}

fn put_frame(
    buf: &mut Vec<u8>,
    bytes: &[u8],
) -> std::result::Result<(), CodecError> {
    let len = u32::try_from(bytes.len()).map_err(|_| CodecError::MalformedInput("frame exceeds u32 length prefix"))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

fn take_frame<'a>(
    buf: &'a [u8],
    pos: &mut usize,
) -> std::result::Result<&'a [u8], CodecError> {
    let prefix = take_fixed(buf, pos, FRAME_PREFIX_LEN, "truncated length prefix")?;
    let len = u32::from_be_bytes(prefix.try_into().expect("Guaranteed safe after length check")) as usize;
    take_fixed(buf, pos, len, "length prefix exceeds remaining bytes")
}

fn take_fixed<'a>(
    buf: &'a [u8],
    pos: &mut usize,
    len: usize,
    truncated: &'static str,
) -> std::result::Result<&'a [u8], CodecError> {
    let end = pos
        .checked_add(len)
        .filter(|end| *end <= buf.len())
        .ok_or(CodecError::MalformedInput(truncated))?;
    let bytes = &buf[*pos..end];
    *pos = end;
    Ok(bytes)
}
