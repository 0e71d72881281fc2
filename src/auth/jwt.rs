/// JWT Token Issuing and Verification
///
/// `TokenService` is built once from `JwtSettings` and shared read-only
/// between workers. It mints access/refresh pairs and verifies presented
/// tokens against the configured secret and domain.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Serialize;

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AuthError, CryptoError, PolicyError};
use crate::models::User;

/// Access + refresh token pair returned to clients
#[derive(Debug, Serialize, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(settings: JwtSettings) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());
        Self {
            settings,
            encoding_key,
            decoding_key,
        }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// Mint a fresh access/refresh pair for `user`
    ///
    /// # Errors
    /// Returns `CryptoError::TokenSigning` if either token cannot be signed
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, CryptoError> {
        let access = Claims::access(
            user.id,
            &user.name,
            user.is_admin,
            &self.settings.domain,
            self.settings.access_token_expiry,
        );
        let refresh = Claims::refresh(
            user.id,
            &self.settings.domain,
            self.settings.refresh_token_expiry,
        );

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    /// Sign an arbitrary claim set with HS256
    pub fn sign(&self, claims: &Claims) -> Result<String, CryptoError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CryptoError::TokenSigning(e.to_string()))
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenKind::Refresh)
    }

    /// A refresh token is only exchanged once at most `refresh_window`
    /// seconds remain at `now` (Unix seconds). Returns the remaining time.
    pub fn check_refresh_window(&self, claims: &Claims, now: i64) -> Result<i64, PolicyError> {
        let remaining = claims.exp - now;
        if remaining > self.settings.refresh_window {
            return Err(PolicyError::RefreshTooEarly(remaining));
        }
        Ok(remaining)
    }

    /// Validate signature, expiry, issuer and token kind
    ///
    /// Only the HMAC family is accepted, whatever the token header claims.
    /// Expiry is checked before the issuer so an expired token always reports
    /// `TokenExpired`.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.set_issuer(&[&self.settings.domain]);
        validation.set_audience(&[&self.settings.domain]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let error = match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
                    _ => AuthError::TokenInvalid,
                };
                tracing::debug!(reason = %e, "JWT rejected");
                error
            })?;

        if claims.typ != kind {
            tracing::debug!(expected = ?kind, found = ?claims.typ, "JWT used as the wrong kind");
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::RefreshDelivery;

    fn settings(secret: &str, domain: &str) -> JwtSettings {
        JwtSettings {
            secret: secret.to_string(),
            domain: domain.to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 86400,
            refresh_window: 30,
            refresh_delivery: RefreshDelivery::Body,
        }
    }

    fn service() -> TokenService {
        TokenService::new(settings(
            "2dce505d96a53c5768052ee90f3df2055657518dad489160df9913f66042e160",
            "example.com",
        ))
    }

    fn admin() -> User {
        User {
            id: 1,
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: String::new(),
            is_admin: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn issued_pair_verifies_with_same_settings() {
        let service = service();
        let pair = service.issue_pair(&admin()).expect("Failed to issue tokens");

        let access = service.verify_access(&pair.access_token).expect("access token rejected");
        assert_eq!(access.sub, "1");
        assert_eq!(access.iss, "example.com");
        assert_eq!(access.name.as_deref(), Some("Admin"));
        assert!(access.is_admin());
        let lifetime = access.exp - access.iat;
        assert_eq!(lifetime, 900);

        let refresh = service.verify_refresh(&pair.refresh_token).expect("refresh token rejected");
        assert_eq!(refresh.sub, "1");
        assert_eq!(refresh.exp - refresh.iat, 86400);
    }

    #[test]
    fn different_secret_is_rejected() {
        let pair = service().issue_pair(&admin()).unwrap();
        let other = TokenService::new(settings("another-secret", "example.com"));

        assert_eq!(
            other.verify_access(&pair.access_token).unwrap_err(),
            AuthError::TokenInvalid
        );
    }

    #[test]
    fn different_domain_is_rejected() {
        let pair = service().issue_pair(&admin()).unwrap();
        let other = TokenService::new(settings(
            "2dce505d96a53c5768052ee90f3df2055657518dad489160df9913f66042e160",
            "evil.example.org",
        ));

        assert_eq!(
            other.verify_access(&pair.access_token).unwrap_err(),
            AuthError::IssuerMismatch
        );
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let service = service();
        let mut claims = Claims::access(1, "Admin", true, "example.com", 900);
        claims.exp = chrono::Utc::now().timestamp() - 10;
        let token = service.sign(&claims).unwrap();

        assert_eq!(service.verify_access(&token).unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn expired_token_with_wrong_issuer_still_reports_expiry() {
        let service = service();
        let mut claims = Claims::access(1, "Admin", true, "elsewhere.com", 900);
        claims.exp = chrono::Utc::now().timestamp() - 10;
        let token = service.sign(&claims).unwrap();

        assert_eq!(service.verify_access(&token).unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = service();
        let pair = service.issue_pair(&admin()).unwrap();

        let tampered = format!("{}X", pair.access_token);
        assert_eq!(service.verify_access(&tampered).unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let service = service();
        let pair = service.issue_pair(&admin()).unwrap();
        let payload = pair.access_token.split('.').nth(1).unwrap();

        // {"alg":"none","typ":"JWT"}
        let forged = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", payload);
        assert_eq!(service.verify_access(&forged).unwrap_err(), AuthError::TokenInvalid);
    }

    #[test]
    fn other_hmac_algorithms_are_accepted() {
        let service = service();
        let claims = Claims::access(1, "Admin", true, "example.com", 900);
        let token = encode(&Header::new(Algorithm::HS512), &claims, &service.encoding_key).unwrap();

        assert!(service.verify_access(&token).is_ok());
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let service = service();
        let pair = service.issue_pair(&admin()).unwrap();

        assert_eq!(
            service.verify_access(&pair.refresh_token).unwrap_err(),
            AuthError::TokenInvalid
        );
        assert_eq!(
            service.verify_refresh(&pair.access_token).unwrap_err(),
            AuthError::TokenInvalid
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            service().verify_access("invalid.token.here").unwrap_err(),
            AuthError::TokenInvalid
        );
    }

    #[test]
    fn refresh_window_boundary_is_inclusive() {
        let tokens = service();
        let now = 1_700_000_000;
        let mut claims = Claims::refresh(1, "example.com", 0);

        claims.exp = now + 30;
        assert_eq!(tokens.check_refresh_window(&claims, now), Ok(30));

        claims.exp = now + 31;
        assert_eq!(
            tokens.check_refresh_window(&claims, now),
            Err(PolicyError::RefreshTooEarly(31))
        );
    }
}
