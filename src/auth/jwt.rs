use axum::extract::FromRef;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// A signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Signs HS256 session tokens with the configured key.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: i32) -> Result<IssuedToken, TokenError> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + self.ttl;
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, exp = claims.exp, "jwt signed");
        Ok(IssuedToken { token, expires_at })
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&JwtConfig {
            secret: secret.into(),
            ttl_minutes: 60 * 24,
        })
    }

    fn decode_with(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
    }

    #[test]
    fn issued_token_carries_user_id_and_24h_expiry() {
        let before = OffsetDateTime::now_utc().unix_timestamp();
        let issued = issuer("dev-secret").issue(42).expect("sign");
        let claims = decode_with("dev-secret", &issued.token).expect("decode");

        assert_eq!(claims.user_id, 42);
        let expected = before + 24 * 60 * 60;
        assert!((claims.exp - expected).abs() <= 5, "exp {} vs {}", claims.exp, expected);
        assert_eq!(claims.exp, issued.expires_at.unix_timestamp());
        assert!(claims.iat >= before);
    }

    #[test]
    fn token_does_not_verify_under_another_key() {
        let issued = issuer("key-one").issue(1).expect("sign");
        assert!(decode_with("key-two", &issued.token).is_err());
    }

    #[test]
    fn ttl_follows_config() {
        let short = TokenIssuer::new(&JwtConfig {
            secret: "k".into(),
            ttl_minutes: 5,
        });
        let before = OffsetDateTime::now_utc();
        let issued = short.issue(7).expect("sign");
        let after = OffsetDateTime::now_utc();
        assert!(issued.expires_at >= before + Duration::minutes(5));
        assert!(issued.expires_at <= after + Duration::minutes(5));
    }
}
