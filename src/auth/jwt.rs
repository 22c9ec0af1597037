//! JWT token generation and validation
//!
//! Tokens are HS256-signed and carry the account ID, profile ID, email, and
//! role so handlers can gate operations without a profile lookup. The
//! token_version claim lets a credential change invalidate all outstanding
//! tokens for an account.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::schemas::Role;
use crate::types::BridgewayError;

/// Claims embedded in every Bridgeway token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID (hex ObjectId)
    pub sub: String,
    /// Profile ID (hex ObjectId)
    pub profile_id: String,
    pub email: String,
    pub role: Role,
    /// Must match the account's current token_version
    pub token_version: i32,
    /// Issued-at (seconds since epoch)
    pub iat: u64,
    /// Expiry (seconds since epoch)
    pub exp: u64,
}

/// Result of verifying a token
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

/// Issues and verifies Bridgeway session tokens
#[derive(Clone)]
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    /// Generate a token, returning it with the expiry timestamp
    pub fn generate_token(
        &self,
        account_id: &str,
        profile_id: &str,
        email: &str,
        role: Role,
        token_version: i32,
    ) -> Result<(String, u64), BridgewayError> {
        let now = Utc::now().timestamp() as u64;
        let exp = now + self.expiry_seconds;

        let claims = Claims {
            sub: account_id.to_string(),
            profile_id: profile_id.to_string(),
            email: email.to_string(),
            role,
            token_version,
            iat: now,
            exp,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| BridgewayError::Auth(format!("Failed to sign token: {}", e)))?;

        Ok((token, exp))
    }

    /// Verify a token's signature and expiry
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(data) => TokenValidationResult {
                valid: true,
                claims: Some(data.claims),
                error: None,
            },
            Err(e) => TokenValidationResult {
                valid: false,
                claims: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ").map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> JwtValidator {
        JwtValidator::new("test-secret", 3600)
    }

    #[test]
    fn test_token_round_trip() {
        let jwt = validator();
        let (token, exp) = jwt
            .generate_token("acct1", "prof1", "kid@example.com", Role::Youth, 1)
            .unwrap();
        assert!(exp > Utc::now().timestamp() as u64);

        let result = jwt.verify_token(&token);
        assert!(result.valid);
        let claims = result.claims.unwrap();
        assert_eq!(claims.sub, "acct1");
        assert_eq!(claims.profile_id, "prof1");
        assert_eq!(claims.role, Role::Youth);
        assert_eq!(claims.token_version, 1);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = validator()
            .generate_token("acct1", "prof1", "kid@example.com", Role::Youth, 1)
            .unwrap();

        let other = JwtValidator::new("different-secret", 3600);
        let result = other.verify_token(&token);
        assert!(!result.valid);
        assert!(result.claims.is_none());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = validator().verify_token("not.a.token");
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
