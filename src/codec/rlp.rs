//! Recursive length-prefix encoding of nested byte arrays.

use crate::error::DecodingError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(value.into())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RlpItem::Bytes(bytes) => Some(bytes),
            RlpItem::List(_) => None,
        }
    }
}

pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

pub fn encode_list(items: &[RlpItem]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        encode_into(item, &mut payload);
    }
    let mut out = length_prefix(payload.len(), 0xc0);
    out.extend_from_slice(&payload);
    out
}

fn encode_into(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(bytes) => {
            if bytes.len() == 1 && bytes[0] < 0x80 {
                out.push(bytes[0]);
            } else {
                out.extend_from_slice(&length_prefix(bytes.len(), 0x80));
                out.extend_from_slice(bytes);
            }
        }
        RlpItem::List(items) => out.extend_from_slice(&encode_list(items)),
    }
}

fn length_prefix(len: usize, offset: u8) -> Vec<u8> {
    if len <= 55 {
        return vec![offset + len as u8];
    }
    let len_bytes: Vec<u8> = len
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|b| *b == 0)
        .collect();
    let mut out = Vec::with_capacity(1 + len_bytes.len());
    out.push(offset + 55 + len_bytes.len() as u8);
    out.extend_from_slice(&len_bytes);
    out
}

/// Decode a single item that must span the whole input.
pub fn decode(data: &[u8]) -> Result<RlpItem, DecodingError> {
    if data.is_empty() {
        return Err(DecodingError::Rlp("empty input".to_string()));
    }
    let (item, consumed) = decode_item(data)?;
    if consumed != data.len() {
        return Err(DecodingError::Rlp(format!(
            "trailing data: consumed {} of {} bytes",
            consumed,
            data.len()
        )));
    }
    Ok(item)
}

fn decode_item(data: &[u8]) -> Result<(RlpItem, usize), DecodingError> {
    let prefix = *data
        .first()
        .ok_or_else(|| DecodingError::Rlp("data too short".to_string()))?;

    match prefix {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![prefix]), 1)),
        0x80..=0xb7 => {
            let len = (prefix - 0x80) as usize;
            let body = slice(data, 1, len)?;
            if len == 1 && body[0] < 0x80 {
                return Err(DecodingError::Rlp("non-canonical single byte".to_string()));
            }
            Ok((RlpItem::Bytes(body.to_vec()), 1 + len))
        }
        0xb8..=0xbf => {
            let len_of_len = (prefix - 0xb7) as usize;
            let len = read_length(data, len_of_len)?;
            let body = slice(data, 1 + len_of_len, len)?;
            Ok((RlpItem::Bytes(body.to_vec()), 1 + len_of_len + len))
        }
        0xc0..=0xf7 => {
            let len = (prefix - 0xc0) as usize;
            let items = decode_children(slice(data, 1, len)?)?;
            Ok((RlpItem::List(items), 1 + len))
        }
        0xf8..=0xff => {
            let len_of_len = (prefix - 0xf7) as usize;
            let len = read_length(data, len_of_len)?;
            let items = decode_children(slice(data, 1 + len_of_len, len)?)?;
            Ok((RlpItem::List(items), 1 + len_of_len + len))
        }
    }
}

fn decode_children(mut payload: &[u8]) -> Result<Vec<RlpItem>, DecodingError> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, consumed) = decode_item(payload)?;
        items.push(item);
        payload = &payload[consumed..];
    }
    Ok(items)
}

fn read_length(data: &[u8], len_of_len: usize) -> Result<usize, DecodingError> {
    let bytes = slice(data, 1, len_of_len)?;
    if bytes[0] == 0 {
        return Err(DecodingError::Rlp("length has leading zero".to_string()));
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(DecodingError::Rlp("length overflow".to_string()));
    }
    let len = bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
    if len <= 55 {
        return Err(DecodingError::Rlp("non-canonical long length".to_string()));
    }
    Ok(len)
}

fn slice(data: &[u8], start: usize, len: usize) -> Result<&[u8], DecodingError> {
    let end = start
        .checked_add(len)
        .ok_or_else(|| DecodingError::Rlp("length overflow".to_string()))?;
    data.get(start..end)
        .ok_or_else(|| DecodingError::Rlp(format!("data too short: need {} bytes, have {}", end, data.len())))
}
