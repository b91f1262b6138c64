//! Bearer-token issuance and validation.

use crate::types::AuthError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Display name.
    pub name: String,
    /// Session the token was issued for.
    pub session_id: String,
    /// Role names held at issuance.
    pub roles: Vec<String>,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Result of validating a token. Expiry is a distinguishable outcome so the
/// session-expiry coupling can act on the recovered claims.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub claims: Claims,
    pub expired: bool,
}

impl ValidatedToken {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.claims.sub).map_err(|_| AuthError::InvalidToken)
    }

    pub fn session_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.claims.session_id).map_err(|_| AuthError::InvalidToken)
    }
}

/// Signs and verifies HS256 access tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    token_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: String, audience: String, token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            issuer,
            audience,
            token_ttl,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Issue a token for a user/session pair. Returns the encoded token and
    /// its expiry instant.
    pub fn issue(
        &self,
        user_id: Uuid,
        display_name: &str,
        session_id: Uuid,
        roles: Vec<String>,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            name: display_name.to_string(),
            session_id: session_id.to_string(),
            roles,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AuthError::TokenCreationFailed(err.to_string()))?;

        Ok((token, expires_at))
    }

    /// Verify signature, issuer, and audience with zero clock-skew leeway.
    ///
    /// An expired signature is not a hard failure: the claims are recovered
    /// with the expiry check disabled and returned with `expired = true`.
    /// Any other failure is an invalid token.
    pub fn validate(&self, token: &str) -> Result<ValidatedToken, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(ValidatedToken {
                claims: data.claims,
                expired: false,
            }),
            Err(err) if *err.kind() == jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                let mut lenient = Validation::new(Algorithm::HS256);
                lenient.leeway = 0;
                lenient.validate_exp = false;
                lenient.set_issuer(&[&self.issuer]);
                lenient.set_audience(&[&self.audience]);

                let data = decode::<Claims>(token, &self.decoding_key, &lenient)
                    .map_err(|_| AuthError::InvalidToken)?;
                Ok(ValidatedToken {
                    claims: data.claims,
                    expired: true,
                })
            }
            Err(_) => Err(AuthError::InvalidToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer_with_ttl(ttl: Duration) -> TokenIssuer {
        TokenIssuer::new(
            "test-secret",
            "gymops".to_string(),
            "gymops-clients".to_string(),
            ttl,
        )
    }

    #[test]
    fn issue_and_validate_round_trip() {
        let issuer = issuer_with_ttl(Duration::hours(1));
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let (token, expires_at) = issuer
            .issue(user_id, "Sara Ahmadi", session_id, vec!["admin".to_string()])
            .unwrap();
        assert!(expires_at > Utc::now());

        let validated = issuer.validate(&token).unwrap();
        assert!(!validated.expired);
        assert_eq!(validated.user_id().unwrap(), user_id);
        assert_eq!(validated.session_id().unwrap(), session_id);
        assert_eq!(validated.claims.roles, vec!["admin".to_string()]);
        assert_eq!(validated.claims.name, "Sara Ahmadi");
    }

    #[test]
    fn expired_token_is_distinguishable_from_invalid() {
        let issuer = issuer_with_ttl(Duration::seconds(-60));
        let user_id = Uuid::new_v4();
        let (token, _) = issuer
            .issue(user_id, "Sara", Uuid::new_v4(), vec![])
            .unwrap();

        let validated = issuer.validate(&token).unwrap();
        assert!(validated.expired);
        assert_eq!(validated.user_id().unwrap(), user_id);

        assert!(matches!(
            issuer.validate("garbage.token.value").unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn wrong_secret_is_invalid_not_expired() {
        let issuer = issuer_with_ttl(Duration::hours(1));
        let (token, _) = issuer
            .issue(Uuid::new_v4(), "Sara", Uuid::new_v4(), vec![])
            .unwrap();

        let other = TokenIssuer::new(
            "different-secret",
            "gymops".to_string(),
            "gymops-clients".to_string(),
            Duration::hours(1),
        );
        assert!(matches!(
            other.validate(&token).unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}
