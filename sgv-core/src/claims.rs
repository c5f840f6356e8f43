//! User identifier extraction from provider session tokens.
//!
//! Providers hand back a JWT after login and do not agree on which claim
//! carries the account id. Candidate keys are tried in a fixed priority order
//! and the first usable value wins.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};
use thiserror::Error;

/// Claim keys that may carry the user id, highest priority first.
pub const USER_ID_CLAIMS: [&str; 5] = ["userId", "user_id", "uid", "id", "sub"];

/// Errors that can occur while reading token claims.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// Token is not `header.payload[.signature]`.
    #[error("invalid token format")]
    Format,

    /// Payload segment is not unpadded base64url.
    #[error("invalid token payload: {0}")]
    Payload(String),

    /// Payload is not a JSON object.
    #[error("invalid token claims: {0}")]
    Claims(String),

    /// None of [`USER_ID_CLAIMS`] holds a usable value.
    #[error("token does not contain a supported user ID claim")]
    MissingUserId,
}

/// Extract the user id from a JWT's payload claims.
///
/// The signature is not verified; the token came straight from the provider's
/// login response.
pub fn user_id_from_token(token: &str) -> Result<String, ClaimError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next()) {
        (Some(_), Some(payload)) => payload,
        _ => return Err(ClaimError::Format),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ClaimError::Payload(e.to_string()))?;
    let claims: Map<String, Value> =
        serde_json::from_slice(&bytes).map_err(|e| ClaimError::Claims(e.to_string()))?;

    user_id_from_claims(&claims).ok_or(ClaimError::MissingUserId)
}

/// Pick the user id out of decoded claims.
///
/// Strings must be non-empty; numbers are rendered as base-10 integers.
pub fn user_id_from_claims(claims: &Map<String, Value>) -> Option<String> {
    USER_ID_CLAIMS
        .iter()
        .filter_map(|key| claims.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => i.to_string(),
                None => (n.as_f64().unwrap_or_default() as i64).to_string(),
            }),
            _ => None,
        })
}
