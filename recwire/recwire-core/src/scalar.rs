//! Byte-level codec for scalar field kinds.

use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{DataType, Value, error::ScalarError};

/// Decode `raw`, which holds exactly the bytes belonging to one field.
///
/// Integer kinds require `raw` to be at least their canonical width; text is
/// NUL-trimmed on the right and decoded as UTF-8, replacing invalid sequences.
pub fn read_scalar(data_type: DataType, mut raw: Bytes) -> Result<Value, ScalarError> {
    let actual = raw.len();
    let truncated = |expected| ScalarError::Truncated {
        data_type,
        expected,
        actual,
    };

    Ok(match data_type {
        DataType::Byte => Value::U8(raw.try_get_u8().map_err(|_| truncated(1))?),
        DataType::Word => Value::U16(raw.try_get_u16().map_err(|_| truncated(2))?),
        DataType::Dword => Value::U32(raw.try_get_u32().map_err(|_| truncated(4))?),
        DataType::Qword => Value::U64(raw.try_get_u64().map_err(|_| truncated(8))?),
        DataType::WordLe => Value::U16(raw.try_get_u16_le().map_err(|_| truncated(2))?),
        DataType::DwordLe => Value::U32(raw.try_get_u32_le().map_err(|_| truncated(4))?),
        DataType::QwordLe => Value::U64(raw.try_get_u64_le().map_err(|_| truncated(8))?),
        DataType::Bytes => Value::Bytes(raw),
        DataType::Bcd8421 => Value::String(Arc::from(decode_bcd(&raw))),
        DataType::String => {
            let end = raw.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            Value::String(Arc::from(String::from_utf8_lossy(&raw[..end])))
        }
        DataType::Obj | DataType::List => return Err(ScalarError::NotScalar(data_type)),
    })
}

/// Encode `value` as `data_type`.
///
/// With `length = Some(n)` exactly `n` bytes are written: byte arrays and text
/// are zero-padded on the right, BCD digits are zero-padded on the left.
/// With `None` the value is written at its natural size.
pub fn write_scalar(
    data_type: DataType,
    value: &Value,
    length: Option<usize>,
    buf: &mut BytesMut,
) -> Result<(), ScalarError> {
    match data_type {
        DataType::Byte => buf.put_u8(value.try_u8()?),
        DataType::Word => buf.put_u16(value.try_u16()?),
        DataType::Dword => buf.put_u32(value.try_u32()?),
        DataType::Qword => buf.put_u64(value.try_u64()?),
        DataType::WordLe => buf.put_u16_le(value.try_u16()?),
        DataType::DwordLe => buf.put_u32_le(value.try_u32()?),
        DataType::QwordLe => buf.put_u64_le(value.try_u64()?),
        DataType::Bytes => put_padded(value.try_bytes()?, length, buf)?,
        DataType::String => put_padded(value.try_str()?.as_bytes(), length, buf)?,
        DataType::Bcd8421 => {
            let packed = encode_bcd(value.try_str()?, length)?;
            buf.put_slice(&packed);
        }
        DataType::Obj | DataType::List => return Err(ScalarError::NotScalar(data_type)),
    }
    Ok(())
}

fn put_padded(data: &[u8], length: Option<usize>, buf: &mut BytesMut) -> Result<(), ScalarError> {
    match length {
        Some(limit) if data.len() > limit => Err(ScalarError::TooLong {
            limit,
            actual: data.len(),
        }),
        Some(limit) => {
            buf.put_slice(data);
            buf.put_bytes(0, limit - data.len());
            Ok(())
        }
        None => {
            buf.put_slice(data);
            Ok(())
        }
    }
}

fn decode_bcd(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len() * 2);
    for b in raw {
        for nibble in [b >> 4, b & 0x0f] {
            // Nibbles above 9 are not valid BCD but are kept as hex digits so
            // that re-encoding reproduces the original bytes.
            out.push(char::from_digit(u32::from(nibble), 16).unwrap_or('0'));
        }
    }
    out
}

fn encode_bcd(digits: &str, length: Option<usize>) -> Result<Vec<u8>, ScalarError> {
    let count = digits.chars().count();
    let width = match length {
        Some(bytes) if count > bytes * 2 => {
            return Err(ScalarError::TooLong {
                limit: bytes * 2,
                actual: count,
            });
        }
        Some(bytes) => bytes * 2,
        None => count + count % 2,
    };

    let mut nibbles = Vec::with_capacity(width);
    nibbles.resize(width - count, 0u8);
    for ch in digits.chars() {
        let n = ch.to_digit(16).ok_or(ScalarError::InvalidBcdDigit(ch))?;
        nibbles.push(n as u8);
    }

    Ok(nibbles
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}
