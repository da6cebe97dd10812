//! Bearer token minting and validation.
//!
//! The validation side is weak on purpose: the signature is never verified
//! and `exp` is never checked, so any structurally well-formed token is
//! taken at face value.

use crate::error::AppError;
use crate::models::TokenClaims;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Signing secret, hardcoded in source like the rest of the lab fixtures
pub const TOKEN_SECRET: &str = "credit-api-lab-secret";

/// Lifetime stamped into `exp` at mint time
const TOKEN_TTL_HOURS: i64 = 1;

/// Strip the `Bearer ` prefix from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Mint an HS256 token for a user
pub fn issue_token(user_id: &str) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: (now + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TOKEN_SECRET.as_bytes()),
    )?;
    Ok(token)
}

/// Extract the user id from a bearer token.
///
/// Returns `None` only for tokens that do not parse as a JWT at all.
/// Expired tokens and tokens signed with the wrong key both pass.
pub fn validate_and_extract_user_id(token: &str) -> Option<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation.insecure_disable_signature_validation();

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(TOKEN_SECRET.as_bytes()),
        &validation,
    )
    .map(|data| data.claims.sub)
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issued_token_round_trips() {
        let token = issue_token("U1001").unwrap();
        assert_eq!(validate_and_extract_user_id(&token), Some("U1001".to_string()));
    }

    #[test]
    fn test_expired_token_still_validates() {
        let claims = TokenClaims {
            sub: "U1002".to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp() as usize,
            iat: (chrono::Utc::now() - chrono::Duration::hours(3)).timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TOKEN_SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(validate_and_extract_user_id(&token), Some("U1002".to_string()));
    }

    #[test]
    fn test_token_signed_with_wrong_key_still_validates() {
        let claims = TokenClaims {
            sub: "U1001".to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
            iat: chrono::Utc::now().timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"not-the-real-secret"),
        )
        .unwrap();

        assert_eq!(validate_and_extract_user_id(&token), Some("U1001".to_string()));
    }

    #[test]
    fn test_minimal_forged_payload_validates() {
        // A payload carrying nothing but a subject is enough.
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "ghost"}),
            &EncodingKey::from_secret(b"whatever"),
        )
        .unwrap();

        assert_eq!(validate_and_extract_user_id(&token), Some("ghost".to_string()));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert_eq!(validate_and_extract_user_id("not-a-token"), None);
        assert_eq!(validate_and_extract_user_id("a.b.c"), None);
        assert_eq!(validate_and_extract_user_id(""), None);
    }

    #[test]
    fn test_bearer_prefix_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("bearer abc123"), None);
    }
}
