//! Password hashing (bcrypt).

use crate::error::Result;

/// bcrypt work factor. Matches the original deployment's cost.
const BCRYPT_COST: u32 = 10;

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> Result<String> {
    Ok(bcrypt::hash(plain, BCRYPT_COST)?)
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(plain, hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }
}
