//! Request signing for the AliExpress open-platform gateway.
//!
//! The signature is an HMAC-SHA256 over every request parameter (system and
//! business) sorted by name and concatenated as `name` + `value`, keyed with
//! the app secret and rendered as uppercase hex. REST-style API names (those
//! containing `/`) are prepended to the payload; dotted method names are not.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AliexpressError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGN_METHOD: &str = "sha256";

/// Computes the `sign` parameter for a request.
///
/// # Errors
///
/// Returns [`AliexpressError::Signing`] if the HMAC cannot be keyed.
pub fn sign_request(
    app_secret: &str,
    api_name: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, AliexpressError> {
    let mut payload = String::new();
    if api_name.contains('/') {
        payload.push_str(api_name);
    }
    for (name, value) in params {
        payload.push_str(name);
        payload.push_str(value);
    }

    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|e| AliexpressError::Signing(e.to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}
