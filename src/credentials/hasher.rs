//! bcrypt password hashing.
//!
//! Hashes are salted, so two hashes of the same password never compare equal;
//! always check a password with [`PasswordHasher::verify`].

use super::error::HashingError;
use tracing::debug;

/// Work factor used by the site's registration endpoint.
pub const DEFAULT_COST: u32 = 10;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Stored in place of a hash for accounts whose password has not been set yet.
///
/// The leading `!` can never start bcrypt output, so this value fails every
/// verification instead of being a weak password.
pub const PLACEHOLDER_HASH: &str = "!unset: set the password via /register or bhumi reset-password";

/// True when `hash` is the "no password yet" marker.
#[must_use]
pub fn is_placeholder(hash: &str) -> bool {
    hash.starts_with('!')
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Build a hasher with the given bcrypt cost.
    ///
    /// # Errors
    /// Returns [`HashingError::InvalidCost`] when `cost` is outside `4..=31`.
    pub fn new(cost: u32) -> Result<Self, HashingError> {
        if !(4..=31).contains(&cost) {
            return Err(HashingError::InvalidCost(cost));
        }

        Ok(Self { cost })
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `plaintext` with a fresh random salt.
    ///
    /// # Errors
    /// Fails for empty input, input longer than 72 bytes, or a bcrypt failure.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        if plaintext.is_empty() {
            return Err(HashingError::EmptyInput);
        }

        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(HashingError::TooLong(plaintext.len()));
        }

        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// A stored value that is not a bcrypt hash (the placeholder included)
    /// never matches.
    #[must_use]
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        if is_placeholder(stored_hash) {
            return false;
        }

        match bcrypt::verify(plaintext, stored_hash) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("stored hash is not a valid bcrypt hash: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4).unwrap()
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(PasswordHasher::default().cost(), DEFAULT_COST);
    }

    #[test]
    fn test_invalid_cost() {
        assert!(matches!(
            PasswordHasher::new(3),
            Err(HashingError::InvalidCost(3))
        ));
        assert!(matches!(
            PasswordHasher::new(32),
            Err(HashingError::InvalidCost(32))
        ));
        assert!(PasswordHasher::new(4).is_ok());
    }

    #[test]
    fn test_same_password_hashes_differ_but_both_verify() {
        let hasher = hasher();
        let first = hasher.hash("correct horse").unwrap();
        let second = hasher.hash("correct horse").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("correct horse", &first));
        assert!(hasher.verify("correct horse", &second));
        assert!(!hasher.verify("battery staple", &first));
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let hash = hasher().hash("plain-secret").unwrap();
        assert!(!hash.contains("plain-secret"));
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(hasher().hash(""), Err(HashingError::EmptyInput)));
    }

    #[test]
    fn test_long_password_rejected() {
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(
            hasher().hash(&long),
            Err(HashingError::TooLong(73))
        ));
        assert!(hasher().hash(&"x".repeat(MAX_PASSWORD_BYTES)).is_ok());
    }

    #[test]
    fn test_placeholder_never_verifies() {
        let hasher = hasher();
        assert!(is_placeholder(PLACEHOLDER_HASH));
        for guess in ["", "admin123", "password", PLACEHOLDER_HASH, "!unset"] {
            assert!(!hasher.verify(guess, PLACEHOLDER_HASH));
        }
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        let hasher = hasher();
        // truncated bcrypt-looking marker
        assert!(!hasher.verify("admin123", "$2b$10$rQZ5Q9h5h5h5h5h5h5h5h5"));
        assert!(!hasher.verify("admin123", "admin123"));
    }
}
