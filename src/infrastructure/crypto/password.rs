//! Password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Verify a password against a stored bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash_password("sonnenschein").unwrap();
        assert_ne!(h, "sonnenschein");
        assert!(verify_password("sonnenschein", &h).unwrap());
        assert!(!verify_password("regen", &h).unwrap());
    }
}
