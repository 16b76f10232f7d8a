use crate::config::Config;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within a JWT (JSON Web Token).
///
/// Tokens have carried the user id under `_id` or `userId` depending on who issued
/// them; both are accepted and tokens issued here carry both.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub legacy_user_id: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default)]
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

impl Claims {
    /// The user id, whichever claim name it was stored under.
    pub fn subject(&self) -> Option<&str> {
        fn present(claim: &Option<String>) -> Option<&str> {
            claim.as_deref().filter(|id| !id.is_empty())
        }
        present(&self.legacy_user_id).or_else(|| present(&self.user_id))
    }
}

/// The verified caller of a request. Downstream code only ever sees this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
}

/// Signs and verifies bearer tokens with the server-held secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl)
    }

    /// Generates a JWT for a given user ID, valid for the configured lifetime.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalServerError("Token lifetime overflow".into()))?;

        let subject = user_id.to_string();
        let claims = Claims {
            legacy_user_id: Some(subject.clone()),
            user_id: Some(subject),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a JWT string and resolves the caller's identity.
    ///
    /// Returns `AppError::InvalidToken` if the token is malformed, its signature is invalid,
    /// or it has expired, and `AppError::Unauthorized` if it verifies but names no user.
    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(format!("Invalid token: {}", e)))?;

        let user_id = claims
            .subject()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| AppError::Unauthorized("Invalid token - missing user id".into()))?;

        Ok(Identity { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_for_tokens";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::hours(1))
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> usize {
        (Utc::now() + Duration::hours(1)).timestamp() as usize
    }

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();
        let identity = tokens.verify(&token).unwrap();
        assert_eq!(identity.user_id, user_id);
    }

    #[test]
    fn test_either_claim_name_is_accepted() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let legacy = Claims {
            legacy_user_id: Some(user_id.to_string()),
            user_id: None,
            iat: 0,
            exp: future_exp(),
        };
        assert_eq!(tokens.verify(&sign(&legacy, SECRET)).unwrap().user_id, user_id);

        let current = Claims {
            legacy_user_id: None,
            user_id: Some(user_id.to_string()),
            iat: 0,
            exp: future_exp(),
        };
        assert_eq!(tokens.verify(&sign(&current, SECRET)).unwrap().user_id, user_id);

        // An empty `_id` falls through to `userId`.
        let blank_legacy = Claims {
            legacy_user_id: Some(String::new()),
            user_id: Some(user_id.to_string()),
            iat: 0,
            exp: future_exp(),
        };
        assert_eq!(tokens.verify(&sign(&blank_legacy, SECRET)).unwrap().user_id, user_id);
    }

    #[test]
    fn test_token_without_identity_claim_is_rejected() {
        let anonymous = Claims {
            legacy_user_id: None,
            user_id: None,
            iat: 0,
            exp: future_exp(),
        };

        match service().verify(&sign(&anonymous, SECRET)) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("missing user id")),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_token_expiration() {
        let expired = Claims {
            legacy_user_id: Some(Uuid::new_v4().to_string()),
            user_id: None,
            iat: 0,
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        };

        match service().verify(&sign(&expired, SECRET)) {
            Err(AppError::InvalidToken(msg)) => {
                assert!(msg.contains("Invalid token: ExpiredSignature"))
            }
            other => panic!("Token should have been invalid due to expiration: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let claims = Claims {
            legacy_user_id: Some(Uuid::new_v4().to_string()),
            user_id: None,
            iat: 0,
            exp: future_exp(),
        };
        let token_signed_with_other_secret = sign(&claims, "a_completely_different_secret");

        match service().verify(&token_signed_with_other_secret) {
            Err(AppError::InvalidToken(msg)) => {
                assert!(msg.contains("Invalid token: InvalidSignature"))
            }
            other => panic!("Token should have been invalid due to signature: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert!(matches!(
            service().verify("not-a-jwt"),
            Err(AppError::InvalidToken(_))
        ));
    }
}
