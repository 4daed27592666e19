//! Access token verification.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, Identity},
};

/// Resolves a connection's credential to an identity. Called once per
/// connection; the result is trusted for the connection's lifetime.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> AuthResult<Identity>;
}

/// HS256 shared-secret JWT verification
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier
    ///
    /// # Arguments
    ///
    /// * `secret` - Shared HMAC secret
    /// * `require_exp` - Reject tokens without an `exp` claim
    pub fn new(secret: &str, require_exp: bool) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Issuers may stamp an audience we have no list for.
        validation.validate_aud = false;
        if require_exp {
            validation.set_required_spec_claims(&["exp"]);
        } else {
            validation.set_required_spec_claims::<&str>(&[]);
        }
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> AuthResult<Identity> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let token_data =
            decode::<AccessTokenClaims>(token, &self.key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::JwtError(e),
                }
            })?;

        let identity = Identity::from(token_data.claims);
        if identity.player_id.as_str().is_empty() {
            return Err(AuthError::MissingIdentity);
        }
        Ok(identity)
    }
}

/// Sign an access token with a shared secret (HS256)
pub fn sign_access_token(secret: &str, claims: &AccessTokenClaims) -> AuthResult<String> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::PlayerId;
    use crate::net::messages::WireId;

    const SECRET: &str = "test_secret_that_is_long_enough_1234";

    fn claims(user_id: WireId, exp: Option<i64>) -> AccessTokenClaims {
        AccessTokenClaims {
            user_id,
            username: Some("Ann".to_string()),
            exp,
            iat: None,
        }
    }

    fn in_an_hour() -> Option<i64> {
        Some(chrono::Utc::now().timestamp() + 3600)
    }

    #[test]
    fn test_valid_token_resolves_identity() {
        let token =
            sign_access_token(SECRET, &claims(WireId::Text("u1".into()), in_an_hour())).unwrap();
        let identity = JwtVerifier::new(SECRET, true).verify(&token).unwrap();
        assert_eq!(identity.player_id, PlayerId::from("u1"));
        assert_eq!(identity.display_name(), "Ann");
    }

    #[test]
    fn test_numeric_user_id() {
        let token = sign_access_token(SECRET, &claims(WireId::Number(77), in_an_hour())).unwrap();
        let identity = JwtVerifier::new(SECRET, true).verify(&token).unwrap();
        assert_eq!(identity.player_id, PlayerId::from("77"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token =
            sign_access_token(SECRET, &claims(WireId::Text("u1".into()), in_an_hour())).unwrap();
        let result = JwtVerifier::new("another_secret_that_is_long_enough", true).verify(&token);
        assert!(matches!(result, Err(AuthError::JwtError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let past = Some(chrono::Utc::now().timestamp() - 3600);
        let token = sign_access_token(SECRET, &claims(WireId::Text("u1".into()), past)).unwrap();
        let result = JwtVerifier::new(SECRET, true).verify(&token);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_exp_requirement_is_configurable() {
        let token = sign_access_token(SECRET, &claims(WireId::Text("u1".into()), None)).unwrap();
        assert!(JwtVerifier::new(SECRET, true).verify(&token).is_err());
        assert!(JwtVerifier::new(SECRET, false).verify(&token).is_ok());
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = JwtVerifier::new(SECRET, true).verify("");
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_blank_user_id_rejected() {
        let token =
            sign_access_token(SECRET, &claims(WireId::Text("  ".into()), in_an_hour())).unwrap();
        let result = JwtVerifier::new(SECRET, true).verify(&token);
        assert!(matches!(result, Err(AuthError::MissingIdentity)));
    }
}
