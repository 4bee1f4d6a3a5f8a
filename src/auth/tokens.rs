use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Signs and verifies bearer tokens with a shared HMAC secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], algorithm: Algorithm, lifetime_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    pub fn from_config(auth: &AuthConfig) -> anyhow::Result<Self> {
        let algorithm = Algorithm::from_str(&auth.jwt_algorithm)
            .map_err(|_| anyhow::anyhow!("unknown JWT algorithm {}", auth.jwt_algorithm))?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            anyhow::bail!(
                "JWT algorithm {} needs a key pair; only HS256/HS384/HS512 are supported",
                auth.jwt_algorithm
            );
        }

        let secret = match auth.jwt_secret {
            Some(ref secret) if !secret.is_empty() => secret.clone(),
            _ => {
                tracing::warn!(
                    "No JWT secret configured; using a random one. Bearer tokens will not survive a restart."
                );
                let bytes: [u8; 32] = rand::thread_rng().gen();
                hex::encode(bytes)
            }
        };

        Ok(Self::new(secret.as_bytes(), algorithm, auth.token_minutes))
    }

    pub fn issue(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding)
    }

    /// Checks signature, algorithm and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}
