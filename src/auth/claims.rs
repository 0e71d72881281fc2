/// JWT Claims structure
///
/// One claim set serves both token kinds. Access tokens additionally carry
/// the user's display name and admin flag; refresh tokens leave them out.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Distinguishes access tokens from refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as string)
    pub sub: String,
    /// Issuer, the configured domain
    pub iss: String,
    /// Audience, the configured domain
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub typ: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
}

impl Claims {
    pub fn access(user_id: i64, name: &str, is_admin: bool, domain: &str, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iss: domain.to_string(),
            aud: domain.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            typ: TokenKind::Access,
            name: Some(name.to_string()),
            admin: Some(is_admin),
        }
    }

    pub fn refresh(user_id: i64, domain: &str, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iss: domain.to_string(),
            aud: domain.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            typ: TokenKind::Refresh,
            name: None,
            admin: None,
        }
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().map_err(|_| AuthError::TokenInvalid)
    }

    pub fn is_admin(&self) -> bool {
        self.admin.unwrap_or(false)
    }

    /// Seconds until expiry; negative once expired
    pub fn remaining_seconds(&self) -> i64 {
        self.exp - chrono::Utc::now().timestamp()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_seconds() < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_claims_carry_profile() {
        let claims = Claims::access(7, "Admin", true, "example.com", 900);

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.iss, "example.com");
        assert_eq!(claims.aud, "example.com");
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(claims.name.as_deref(), Some("Admin"));
        assert!(claims.is_admin());
        assert!(!claims.is_expired());
    }

    #[test]
    fn refresh_claims_omit_profile_fields() {
        let claims = Claims::refresh(7, "example.com", 86400);
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["typ"], "refresh");
        assert!(json.get("name").is_none());
        assert!(json.get("admin").is_none());
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_user_id_extraction() {
        let claims = Claims::refresh(42, "example.com", 60);
        assert_eq!(claims.user_id().unwrap(), 42);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::refresh(42, "example.com", 60);
        claims.sub = "not-a-number".to_string();

        assert_eq!(claims.user_id().unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn remaining_seconds_goes_negative_after_expiry() {
        let claims = Claims::refresh(1, "example.com", -5);
        assert!(claims.remaining_seconds() < 0);
        assert!(claims.is_expired());
    }
}
