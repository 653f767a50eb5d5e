//! Self-contained session tokens.
//!
//! A token is `base64url(claims) "." base64url(tag)` where `claims` is the
//! bincode encoding of [`SessionClaims`] and `tag` is a keyed BLAKE3 MAC over
//! those bytes. The MAC key is derived from the server secret and salt, so
//! nothing is stored server-side: validation is a MAC check plus an expiry
//! comparison. Tokens are signed, not encrypted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::constants::{KDF_CONTEXT_SESSION_KEY, TOKEN_TTL_SECS};

/// Fixed lifetime of an issued token.
pub fn token_ttl() -> Duration {
    Duration::seconds(TOKEN_TTL_SECS)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub username: String,
    /// Unix timestamp (seconds) at which the token stops being valid.
    pub expires_at: i64,
}

/// Why a token was not accepted. Callers outside this module only ever see
/// "no identity"; the reason is kept for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenRejection {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

#[derive(Clone)]
pub struct TokenService {
    key: [u8; 32],
}

impl TokenService {
    pub fn new(secret: &str, salt: &str) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_SESSION_KEY);
        // length-prefix the secret so ("ab", "c") and ("a", "bc") differ
        hasher.update(&(secret.len() as u64).to_le_bytes());
        hasher.update(secret.as_bytes());
        hasher.update(salt.as_bytes());
        Self {
            key: *hasher.finalize().as_bytes(),
        }
    }

    pub fn issue(&self, username: &str) -> String {
        self.issue_at(username, Utc::now())
    }

    /// Issue a token for `username` that expires [`token_ttl`] after `now`.
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> String {
        let claims = SessionClaims {
            username: username.to_string(),
            expires_at: (now + token_ttl()).timestamp(),
        };
        // Serializing a String and an i64 cannot fail.
        let payload = bincode::serialize(&claims).unwrap_or_default();
        let tag = blake3::keyed_hash(&self.key, &payload);

        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(tag.as_bytes())
        )
    }

    pub fn validate(&self, token: &str) -> Option<String> {
        self.validate_at(token, Utc::now())
    }

    /// Returns the username carried by a valid, unexpired token, or `None`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        match self.check(token, now) {
            Ok(claims) => Some(claims.username),
            Err(rejection) => {
                debug!(reason = %rejection, "Session token rejected");
                None
            }
        }
    }

    /// Full verification with the rejection reason. The signature is checked
    /// before the payload is decoded.
    pub fn check(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenRejection> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(TokenRejection::Malformed)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenRejection::Malformed)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| TokenRejection::Malformed)?;

        let expected = blake3::keyed_hash(&self.key, &payload);
        if tag.len() != blake3::OUT_LEN || tag.as_slice().ct_eq(&expected.as_bytes()[..]).unwrap_u8() != 1 {
            return Err(TokenRejection::BadSignature);
        }

        let claims: SessionClaims =
            bincode::deserialize(&payload).map_err(|_| TokenRejection::Malformed)?;

        if now.timestamp() >= claims.expires_at {
            return Err(TokenRejection::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("mysecret", "mysalt")
    }

    #[test]
    fn test_token_roundtrip() {
        let tokens = service();
        for username in ["admin", "", "ünïcødé", "a.b.c"] {
            let token = tokens.issue(username);
            assert_eq!(tokens.validate(&token).as_deref(), Some(username));
        }
    }

    #[test]
    fn test_token_expires_after_ttl() {
        let tokens = service();
        let issued = Utc::now();
        let token = tokens.issue_at("admin", issued);

        let just_before = issued + token_ttl() - Duration::seconds(1);
        assert_eq!(tokens.validate_at(&token, just_before).as_deref(), Some("admin"));

        let after = issued + token_ttl() + Duration::seconds(1);
        assert_eq!(tokens.validate_at(&token, after), None);
        assert_eq!(tokens.check(&token, after), Err(TokenRejection::Expired));
    }

    #[test]
    fn test_token_invalid_exactly_at_expiry() {
        let tokens = service();
        let issued = Utc::now();
        let token = tokens.issue_at("admin", issued);
        assert_eq!(tokens.validate_at(&token, issued + token_ttl()), None);
    }

    #[test]
    fn test_any_changed_character_invalidates() {
        let tokens = service();
        let token = tokens.issue("admin");

        for i in 0..token.len() {
            let mut chars: Vec<char> = token.chars().collect();
            chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
            let tampered: String = chars.into_iter().collect();
            assert_eq!(tokens.validate(&tampered), None, "tampered at {i}");
        }
    }

    #[test]
    fn test_forged_payload_rejected() {
        let tokens = service();
        let token = tokens.issue("admin");
        let (_, tag) = token.split_once('.').unwrap();

        let forged_claims = SessionClaims {
            username: "root".to_string(),
            expires_at: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(bincode::serialize(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{tag}");

        assert_eq!(
            tokens.check(&forged, Utc::now()),
            Err(TokenRejection::BadSignature)
        );
    }

    #[test]
    fn test_other_secret_or_salt_rejected() {
        let token = service().issue("admin");
        assert_eq!(TokenService::new("othersecret", "mysalt").validate(&token), None);
        assert_eq!(TokenService::new("mysecret", "othersalt").validate(&token), None);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service();
        let now = Utc::now();
        assert_eq!(tokens.check("", now), Err(TokenRejection::Malformed));
        assert_eq!(tokens.check("no-dot", now), Err(TokenRejection::Malformed));
        assert_eq!(tokens.check("!!.??", now), Err(TokenRejection::Malformed));
        assert_eq!(tokens.validate("a.b.c"), None);
    }
}
