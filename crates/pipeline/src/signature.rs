//! Webhook delivery authentication.
//!
//! GitHub signs every delivery with HMAC-SHA256 over the raw request body,
//! keyed by the shared webhook secret, and sends the digest as
//! `X-Hub-Signature-256: sha256=<hex>`. Verification recomputes the digest and
//! compares in constant time via [`hmac::Mac::verify_slice`].

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

const DIGEST_LEN: usize = 32;

fn keyed_mac(secret: &[u8]) -> Result<HmacSha256, SignatureError> {
    // HMAC accepts keys of any length; the error arm is unreachable in practice.
    HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Mismatch)
}

/// Computes the `sha256=<hex>` signature of `body` under `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(body);
    Ok(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Checks that `claimed` is the signature of `body` under `secret`.
///
/// A missing header is a failure, never "no signature needed". The comparison
/// of digests is constant-time.
///
/// # Errors
///
/// - [`SignatureError::Missing`] when `claimed` is `None`.
/// - [`SignatureError::Malformed`] when the header is not `sha256=` followed by
///   64 hex digits.
/// - [`SignatureError::Mismatch`] when the digest does not match.
pub fn verify_signature(
    secret: &[u8],
    body: &[u8],
    claimed: Option<&str>,
) -> Result<(), SignatureError> {
    let claimed = claimed.ok_or(SignatureError::Missing)?;
    let digest_hex = claimed
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureError::Malformed)?;
    let digest = hex::decode(digest_hex).map_err(|_| SignatureError::Malformed)?;
    if digest.len() != DIGEST_LEN {
        return Err(SignatureError::Malformed);
    }

    let mut mac = keyed_mac(secret)?;
    mac.update(body);
    mac.verify_slice(&digest)
        .map_err(|_| SignatureError::Mismatch)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
