//! Bearer tokens
//!
//! Tokens are HS256 JWT compact strings (`header.payload.signature`, base64url
//! without padding) carrying the user id and login.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as B64URL};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::AuthConfig;
use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub login: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Signs and verifies bearer tokens with a shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    ttl_secs: Option<i64>,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer. `ttl_hours` of `None` issues tokens without expiry
    pub fn new(secret: impl AsRef<[u8]>, ttl_hours: Option<u64>) -> Result<Self> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(Error::Config("token secret must not be empty".to_string()));
        }
        let ttl_secs = match ttl_hours {
            Some(hours) => Some(
                i64::try_from(hours)
                    .ok()
                    .and_then(|h| h.checked_mul(3600))
                    .ok_or_else(|| Error::Config(format!("token TTL of {hours} hours is too large")))?,
            ),
            None => None,
        };
        Ok(Self { secret, ttl_secs })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(&config.token_secret, config.token_ttl_hours)
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Config(format!("invalid token secret: {}", e)))
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: &str, login: &str) -> Result<String> {
        self.issue_at(user_id, login, Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: &str, login: &str, iat: i64) -> Result<String> {
        let claims = Claims {
            user_id: user_id.to_string(),
            login: login.to_string(),
            iat,
            exp: self.ttl_secs.map(|ttl| iat.saturating_add(ttl)),
        };

        let signing_input = format!(
            "{}.{}",
            B64URL.encode(HEADER),
            B64URL.encode(serde_json::to_vec(&claims)?)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = B64URL.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims> {
        let invalid = |msg: &str| Error::InvalidToken(msg.to_string());

        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| invalid("malformed token"))?;
        let (header, payload) = signing_input
            .split_once('.')
            .ok_or_else(|| invalid("malformed token"))?;

        let signature = B64URL
            .decode(signature)
            .map_err(|_| invalid("malformed signature"))?;
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("signature mismatch"))?;

        let header: serde_json::Value = B64URL
            .decode(header)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or_else(|| invalid("malformed header"))?;
        if header.get("alg").and_then(|a| a.as_str()) != Some("HS256") {
            return Err(invalid("unsupported algorithm"));
        }

        let claims: Claims = B64URL
            .decode(payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or_else(|| invalid("malformed payload"))?;

        if claims.exp.is_some_and(|exp| exp <= now) {
            return Err(invalid("token expired"));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new("test-secret", None).unwrap();
        let token = issuer.issue("user-1", "alice").unwrap();

        assert_eq!(token.split('.').count(), 3);
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.login, "alice");
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let issuer = TokenIssuer::new("test-secret", None).unwrap();
        let token = issuer.issue("user-1", "alice").unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged = B64URL.encode(r#"{"userId":"user-2","login":"mallory","iat":0}"#);
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert!(matches!(issuer.verify(&tampered), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn test_rejects_other_secret() {
        let issuer = TokenIssuer::new("test-secret", None).unwrap();
        let other = TokenIssuer::new("other-secret", None).unwrap();
        let token = other.issue("user-1", "alice").unwrap();

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let issuer = TokenIssuer::new("test-secret", None).unwrap();
        assert!(issuer.verify("").is_err());
        assert!(issuer.verify("abc").is_err());
        assert!(issuer.verify("a.b.c").is_err());
    }

    #[test]
    fn test_expiry() {
        let issuer = TokenIssuer::new("test-secret", Some(1)).unwrap();
        let token = issuer.issue_at("user-1", "alice", 1_000).unwrap();

        let claims = issuer.verify_at(&token, 1_000 + 3_599).unwrap();
        assert_eq!(claims.exp, Some(1_000 + 3_600));
        assert!(matches!(
            issuer.verify_at(&token, 1_000 + 3_600),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        assert!(matches!(TokenIssuer::new("s", Some(u64::MAX)), Err(Error::Config(_))));
        assert!(matches!(
            TokenIssuer::new("s", Some(i64::MAX as u64 / 3600 + 1)),
            Err(Error::Config(_))
        ));

        let longest = TokenIssuer::new("s", Some(i64::MAX as u64 / 3600)).unwrap();
        let token = longest.issue_at("user-1", "alice", 1_000).unwrap();
        assert!(longest.verify_at(&token, 2_000).is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenIssuer::new("", None), Err(Error::Config(_))));
    }
}
