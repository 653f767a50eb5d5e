//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
//! with a random per-password salt and an optional server-wide pepper fed in
//! as the Argon2 secret. Because the cost parameters travel inside the hash,
//! a stored hash can be compared against the current parameters and upgraded
//! after a successful login (see [`CredentialVerifier::needs_rehash`]).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::error::PasswordError;

const ALGORITHM: Algorithm = Algorithm::Argon2id;
const VERSION: Version = Version::V0x13;

#[derive(Clone)]
pub struct CredentialVerifier {
    params: Params,
    pepper: Option<Vec<u8>>,
}

impl CredentialVerifier {
    /// Verifier using the recommended Argon2id costs.
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self {
            params: Params::DEFAULT,
            pepper,
        }
    }

    /// Verifier with explicit costs (memory in KiB, iterations, lanes).
    pub fn with_params(
        m_cost: u32,
        t_cost: u32,
        p_cost: u32,
        pepper: Option<Vec<u8>>,
    ) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params, pepper })
    }

    fn argon2(&self) -> Result<Argon2<'_>, PasswordError> {
        match &self.pepper {
            Some(pepper) => Argon2::new_with_secret(pepper, ALGORITHM, VERSION, self.params.clone())
                .map_err(|e| PasswordError::InvalidParams(e.to_string())),
            None => Ok(Argon2::new(ALGORITHM, VERSION, self.params.clone())),
        }
    }

    /// Hash a plaintext password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Returns `true` only if `password` matches `hash`. Malformed hashes
    /// and mismatches both yield `false`.
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        let Ok(argon2) = self.argon2() else {
            return false;
        };
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    }

    /// Returns `true` when `hash` was produced with an algorithm, version or
    /// cost parameters other than the current ones. Unparseable hashes
    /// always need a rehash.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };

        if parsed.algorithm != ALGORITHM.ident() {
            return true;
        }
        if parsed.version != Some(VERSION as u32) {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .field("peppered", &self.pepper.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap(pepper: Option<Vec<u8>>) -> CredentialVerifier {
        CredentialVerifier::with_params(8, 1, 1, pepper).unwrap()
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let verifier = cheap(None);
        let hash = verifier.hash("hunter2").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verifier.verify(&hash, "hunter2"));
        assert!(!verifier.verify(&hash, "hunter3"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let verifier = cheap(None);
        let a = verifier.hash("same").unwrap();
        let b = verifier.hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        let verifier = cheap(None);
        assert!(!verifier.verify("not-a-hash", "password"));
        assert!(!verifier.verify("", "password"));
        assert!(verifier.needs_rehash("not-a-hash"));
    }

    #[test]
    fn test_pepper_is_required_to_verify() {
        let peppered = cheap(Some(b"server-pepper".to_vec()));
        let plain = cheap(None);

        let hash = peppered.hash("secret").unwrap();
        assert!(peppered.verify(&hash, "secret"));
        assert!(!plain.verify(&hash, "secret"));
    }

    #[test]
    fn test_current_params_need_no_rehash() {
        let verifier = cheap(None);
        let hash = verifier.hash("pw").unwrap();
        assert!(!verifier.needs_rehash(&hash));
    }

    #[test]
    fn test_stale_params_need_rehash() {
        let old = cheap(None);
        let current = CredentialVerifier::with_params(16, 2, 1, None).unwrap();

        let hash = old.hash("pw").unwrap();
        assert!(current.needs_rehash(&hash));
        // a stale hash still verifies under the new parameters
        assert!(current.verify(&hash, "pw"));
    }

    #[test]
    fn test_other_algorithm_or_version_needs_rehash() {
        let current = cheap(None);
        let params = Params::new(8, 1, 1, None).unwrap();
        let salt = SaltString::generate(&mut OsRng);

        let argon2i = Argon2::new(Algorithm::Argon2i, VERSION, params.clone())
            .hash_password(b"pw", &salt)
            .unwrap()
            .to_string();
        assert!(argon2i.starts_with("$argon2i$"));
        assert!(current.needs_rehash(&argon2i));

        let old_version = Argon2::new(ALGORITHM, Version::V0x10, params)
            .hash_password(b"pw", &salt)
            .unwrap()
            .to_string();
        assert!(old_version.contains("v=16"));
        assert!(current.needs_rehash(&old_version));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(CredentialVerifier::with_params(0, 0, 0, None).is_err());
    }
}
