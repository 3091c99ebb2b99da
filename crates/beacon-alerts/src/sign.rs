//! Request signing for group robot webhooks.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AlertError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Computes the robot signature for `timestamp` (unix seconds).
///
/// The HMAC-SHA256 key is `"{timestamp}\n{secret}"` and the signed message is
/// empty; the digest is base64-encoded with the standard alphabet.
///
/// # Errors
///
/// Returns `AlertError::Configuration` if the MAC cannot be keyed.
pub fn sign(secret: &str, timestamp: i64) -> Result<String> {
    let key = format!("{timestamp}\n{secret}");
    let mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| AlertError::configuration(format!("cannot key signature: {e}")))?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
