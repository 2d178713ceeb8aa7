//! PEM scraping helpers. These are deliberately minimal string operations
//! rather than a full PEM/ASN.1 parser — every call site here only ever
//! needs to pull bytes out of a single well-known block.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PemError {
    #[error("no PEM block found between BEGIN/END markers")]
    NoBlockFound,

    #[error("invalid base64 in PEM block ({0})")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Extract the first PEM-encoded object of the given label (e.g.
/// `"CERTIFICATE"`) and return its raw bytes (base64-decoded).
pub fn extract_der(pem: &str, label: &str) -> Result<Vec<u8>, PemError> {
    let body = extract_body(pem, label)?;
    Ok(crate::b64::decode(body.as_bytes())?)
}

/// Extract the first PEM block of the given label verbatim, markers
/// included — for callers that need to re-embed or single-base64-encode
/// the PEM text itself rather than its decoded bytes.
pub fn extract_block(pem: &str, label: &str) -> Result<String, PemError> {
    let begin = format!("-----BEGIN {}-----", label);
    let end = format!("-----END {}-----", label);

    let start = pem.find(&begin).ok_or(PemError::NoBlockFound)?;
    let end_start = pem[start..].find(&end).ok_or(PemError::NoBlockFound)?;
    let block_end = start + end_start + end.len();

    Ok(pem[start..block_end].to_string())
}

/// Extract the first PEM block of the given label, returned as the clean
/// (no line breaks) base64 body text — not decoded.
pub fn extract_body(pem: &str, label: &str) -> Result<String, PemError> {
    let begin = format!("-----BEGIN {}-----", label);
    let end = format!("-----END {}-----", label);

    let start = pem.find(&begin).ok_or(PemError::NoBlockFound)?;
    let body_start = start + begin.len();
    let body_end = pem[body_start..].find(&end).ok_or(PemError::NoBlockFound)?;

    let raw_body = &pem[body_start..body_start + body_end];
    Ok(raw_body.chars().filter(|c| !c.is_whitespace()).collect())
}

/// Some gateways re-escape a response body that already contained escaped
/// newlines; undo that once before scraping the certificate out of it.
pub fn unescape_literal_newlines(body: &str) -> String {
    body.replace("\\r\\n", "\n").replace("\\n", "\n").replace("\\r", "\r")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_certificate_block() {
        let pem = "-----BEGIN CERTIFICATE-----\nAAAA\nBBBB\n-----END CERTIFICATE-----\n-----BEGIN CERTIFICATE-----\nCCCC\n-----END CERTIFICATE-----\n";
        let body = extract_body(pem, "CERTIFICATE").unwrap();
        assert_eq!(body, "AAAABBBB");
    }

    #[test]
    fn extracts_first_block_verbatim_with_markers() {
        let pem = "-----BEGIN CERTIFICATE-----\nAAAA\nBBBB\n-----END CERTIFICATE-----\n-----BEGIN CERTIFICATE-----\nCCCC\n-----END CERTIFICATE-----\n";
        let block = extract_block(pem, "CERTIFICATE").unwrap();
        assert_eq!(block, "-----BEGIN CERTIFICATE-----\nAAAA\nBBBB\n-----END CERTIFICATE-----");
    }

    #[test]
    fn missing_block_is_an_error() {
        assert!(extract_body("no pem here", "CERTIFICATE").is_err());
    }

    #[test]
    fn unescapes_doubly_escaped_newlines() {
        let body = "-----BEGIN CERTIFICATE-----\\nAAAA\\n-----END CERTIFICATE-----\\n";
        let unescaped = unescape_literal_newlines(body);
        assert!(unescaped.contains('\n'));
        assert!(!unescaped.contains("\\n"));
    }
}
