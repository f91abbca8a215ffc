/// Authentication service - token issuance and verification
use crate::error::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,  // User id
    pub iat: i64, // Issued at
    pub exp: i64, // Expiration time
}

impl AuthService {
    pub fn new(secret: &str, expiration_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiration: Duration::days(expiration_days as i64),
        }
    }

    /// Issue a signed token for a user
    pub fn issue_token(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            id: user_id,
            iat: now.timestamp(),
            exp: (now + self.token_expiration).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify signature and expiry and decode the claims
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(token_data.claims)
    }

    /// The user id a valid token was issued for
    pub fn user_id(&self, token: &str) -> Result<i64> {
        Ok(self.verify_token(token)?.id)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("token_expiration", &self.token_expiration)
            .finish_non_exhaustive()
    }
}
