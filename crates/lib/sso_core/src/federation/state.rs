//! OAuth `state` parameter (CSRF token) generation and verification.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::auth::AuthError;

/// Random bytes per state value.
const STATE_BYTES: usize = 24;

/// Generate a cryptographic state parameter.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Check the state echoed by the provider against the one issued at
/// initiation. A missing or empty value on either side never matches.
pub fn verify_state(issued: Option<&str>, supplied: &str) -> Result<(), AuthError> {
    match issued {
        Some(issued)
            if !issued.is_empty() && bool::from(issued.as_bytes().ct_eq(supplied.as_bytes())) =>
        {
            Ok(())
        }
        _ => Err(AuthError::InvalidState),
    }
}
