//! Webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body, using the
//! secret supplied at hook registration, and declares the digest in the
//! `X-Hub-Signature-256` header as `sha256=<lowercase hex>`.
//!
//! Verification fails closed: an absent, malformed, or wrong-algorithm
//! header is simply an invalid signature, never an error or a panic.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parses a `sha256=<hex>` header value into the declared digest bytes.
///
/// Returns `None` when the prefix is missing, the algorithm is not sha256,
/// or the hex is invalid.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_digest = header.strip_prefix("sha256=")?;
    hex::decode(hex_digest).ok()
}

/// Computes the HMAC-SHA256 digest of `payload` keyed by `secret`.
///
/// Used by tests to construct valid signature headers.
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a digest as a `sha256=<hex>` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies a declared signature against the payload and shared secret.
///
/// Pure function over its inputs. The digest comparison is constant-time
/// (via the HMAC library) to avoid timing side channels.
pub fn verify(secret: &[u8], payload: &[u8], signature_header: &str) -> bool {
    let declared = match parse_signature_header(signature_header) {
        Some(digest) => digest,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&declared).is_ok()
}
