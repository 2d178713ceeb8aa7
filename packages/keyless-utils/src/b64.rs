use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

/// Standard (padded) base64 of raw bytes.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    STANDARD.encode(data)
}

/// Standard base64, applied twice. Rekor's `payload` and
/// `signatures[].sig` fields both need this.
pub fn encode_double(data: impl AsRef<[u8]>) -> String {
    STANDARD.encode(STANDARD.encode(data))
}

pub fn decode(data: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(data)
}

/// Unpadded base64url decode, as used by the JWT segments and by the
/// `zpm` provenance flow's own JWT payload decoding.
pub fn decode_url_no_pad(data: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(data)
}

pub fn decode_no_pad(data: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD_NO_PAD.decode(data)
}
