//! Minimal ASN.1 DER encoding for a two-integer ECDSA signature
//! (`SEQUENCE { INTEGER r, INTEGER s }`). Hand-rolled rather than pulled
//! from a general ASN.1 crate because the shape is fixed and tiny, and the
//! spec's canonicalisation rule (no leading zero bytes except the single
//! sign-guard byte) is easiest to verify against an explicit implementation.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DerError {
    #[error("raw signature must be exactly 64 bytes (r||s), got {0}")]
    WrongLength(usize),

    #[error("malformed DER signature")]
    Malformed,
}

fn encode_integer(component: &[u8]) -> Vec<u8> {
    let mut bytes = component;
    while bytes.len() > 1 && bytes[0] == 0 && bytes[1] & 0x80 == 0 {
        bytes = &bytes[1..];
    }

    let mut value = Vec::with_capacity(bytes.len() + 1);
    if bytes[0] & 0x80 != 0 {
        value.push(0x00);
    }
    value.extend_from_slice(bytes);

    let mut out = vec![0x02, value.len() as u8];
    out.extend_from_slice(&value);
    out
}

/// Re-encode a raw `r||s` (64-byte) ECDSA-P256 signature as ASN.1 DER.
pub fn raw_to_der(raw: &[u8]) -> Result<Vec<u8>, DerError> {
    if raw.len() != 64 {
        return Err(DerError::WrongLength(raw.len()));
    }

    let r = encode_integer(&raw[0..32]);
    let s = encode_integer(&raw[32..64]);

    let mut sequence_body = Vec::with_capacity(r.len() + s.len());
    sequence_body.extend_from_slice(&r);
    sequence_body.extend_from_slice(&s);

    let mut out = Vec::with_capacity(sequence_body.len() + 2);
    out.push(0x30);
    encode_length(&mut out, sequence_body.len());
    out.extend_from_slice(&sequence_body);

    Ok(out)
}

fn encode_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let len_bytes = len.to_be_bytes();
        let first_nonzero = len_bytes.iter().position(|&b| b != 0).unwrap_or(len_bytes.len() - 1);
        let trimmed = &len_bytes[first_nonzero..];
        out.push(0x80 | trimmed.len() as u8);
        out.extend_from_slice(trimmed);
    }
}

fn read_length(data: &[u8], pos: &mut usize) -> Result<usize, DerError> {
    let first = *data.get(*pos).ok_or(DerError::Malformed)?;
    *pos += 1;

    if first & 0x80 == 0 {
        return Ok(first as usize);
    }

    let n = (first & 0x7f) as usize;
    let bytes = data.get(*pos..*pos + n).ok_or(DerError::Malformed)?;
    *pos += n;

    let mut len = 0usize;
    for b in bytes {
        len = (len << 8) | (*b as usize);
    }
    Ok(len)
}

/// Parse a DER-encoded ECDSA signature back into fixed-width `r||s` (each
/// zero-padded to 32 bytes).
pub fn der_to_raw(der: &[u8]) -> Result<[u8; 64], DerError> {
    let mut pos = 0;
    if der.first() != Some(&0x30) {
        return Err(DerError::Malformed);
    }
    pos += 1;

    let _seq_len = read_length(der, &mut pos)?;

    if der.get(pos) != Some(&0x02) {
        return Err(DerError::Malformed);
    }
    pos += 1;
    let r_len = read_length(der, &mut pos)?;
    let r_bytes = der.get(pos..pos + r_len).ok_or(DerError::Malformed)?;
    pos += r_len;

    if der.get(pos) != Some(&0x02) {
        return Err(DerError::Malformed);
    }
    pos += 1;
    let s_len = read_length(der, &mut pos)?;
    let s_bytes = der.get(pos..pos + s_len).ok_or(DerError::Malformed)?;

    let mut out = [0u8; 64];
    copy_right_aligned(&mut out[0..32], r_bytes)?;
    copy_right_aligned(&mut out[32..64], s_bytes)?;
    Ok(out)
}

fn copy_right_aligned(dest: &mut [u8], src: &[u8]) -> Result<(), DerError> {
    let src = src.strip_prefix(&[0u8]).unwrap_or(src);
    if src.len() > dest.len() {
        return Err(DerError::Malformed);
    }
    let offset = dest.len() - src.len();
    dest[offset..].copy_from_slice(src);
    Ok(())
}

#[cfg(test)]
#[path = "./der.test.rs"]
mod tests;
